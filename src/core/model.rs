use crate::config::toml_config::ModelConfig;
use crate::core::forest::{ForestParams, RandomForest};
use crate::core::metrics::{mean_std, r2_score, rmse};
use crate::core::preprocess::Preprocessor;
use crate::domain::model::{CarRecord, TrainingMetrics};
use crate::utils::error::{ProjectError, Result};
use crate::utils::validation::Validate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MIN_TRAINING_ROWS: usize = 10;

/// Preprocessing and forest fitted together, plus how well they scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarPriceModel {
    pub preprocessor: Preprocessor,
    pub forest: RandomForest,
    pub metrics: TrainingMetrics,
    pub trained_at: chrono::DateTime<chrono::Utc>,
}

impl CarPriceModel {
    pub fn predict(&self, record: &CarRecord) -> f64 {
        self.forest.predict(&self.preprocessor.transform(record))
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parses and checks that preprocessor and trees fit together.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let model: Self = serde_json::from_slice(bytes)?;
        model.validate()?;
        Ok(model)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ProjectError::DataNotFound {
                path: path.display().to_string(),
                hint: "train a model first".to_string(),
            },
            _ => ProjectError::IoError(e),
        })?;
        Self::from_json(&bytes)
    }
}

impl Validate for CarPriceModel {
    fn validate(&self) -> Result<()> {
        self.preprocessor.validate()?;
        self.forest.validate()
    }
}

impl From<&ModelConfig> for ForestParams {
    fn from(config: &ModelConfig) -> Self {
        Self {
            n_estimators: config.n_estimators,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            random_state: config.random_state,
            n_jobs: config.n_jobs,
        }
    }
}

/// Shuffled split; the test side gets `ceil(test_size * n)` rows.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((test_size * n as f64).ceil() as usize).min(n.saturating_sub(1));
    let train = indices.split_off(n_test);
    (train, indices)
}

/// Contiguous folds; the first `n % k` folds hold one extra row.
pub fn k_fold(n: usize, k: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
    let k = k.clamp(1, n.max(1));
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;

    for fold in 0..k {
        let size = n / k + usize::from(fold < n % k);
        let validation: Vec<usize> = (start..start + size).collect();
        let train: Vec<usize> = (0..start).chain(start + size..n).collect();
        folds.push((train, validation));
        start += size;
    }
    folds
}

fn fit(records: &[&CarRecord], params: &ForestParams) -> (Preprocessor, RandomForest) {
    let preprocessor = Preprocessor::fit(records);
    let x = preprocessor.transform_all(records);
    let y: Vec<f64> = records.iter().filter_map(|r| r.price).collect();
    let forest = RandomForest::fit(&x, &y, params);
    (preprocessor, forest)
}

fn evaluate(
    preprocessor: &Preprocessor,
    forest: &RandomForest,
    records: &[&CarRecord],
) -> (Vec<f64>, Vec<f64>) {
    let actual = records.iter().filter_map(|r| r.price).collect();
    let predicted = forest.predict_all(&preprocessor.transform_all(records));
    (actual, predicted)
}

/// RMSE of each cross-validation fold over `records`.
pub fn cross_validate(records: &[&CarRecord], folds: usize, params: &ForestParams) -> Vec<f64> {
    k_fold(records.len(), folds)
        .into_iter()
        .map(|(train_idx, val_idx)| {
            let train: Vec<&CarRecord> = train_idx.iter().map(|&i| records[i]).collect();
            let validation: Vec<&CarRecord> = val_idx.iter().map(|&i| records[i]).collect();
            let (pre, forest) = fit(&train, params);
            let (actual, predicted) = evaluate(&pre, &forest, &validation);
            rmse(&actual, &predicted)
        })
        .collect()
}

/// Drops priceless rows, cross-validates on the training split, fits on it
/// and scores the held-out rows.
pub fn train(records: &[CarRecord], config: &ModelConfig) -> Result<CarPriceModel> {
    let usable: Vec<&CarRecord> = records.iter().filter(|r| r.price.is_some()).collect();
    if usable.len() < MIN_TRAINING_ROWS {
        return Err(ProjectError::InsufficientData {
            required: MIN_TRAINING_ROWS,
            found: usable.len(),
        });
    }

    let params = ForestParams::from(config);
    let (train_idx, test_idx) = train_test_split(usable.len(), config.test_size, config.random_state);
    let train_set: Vec<&CarRecord> = train_idx.iter().map(|&i| usable[i]).collect();
    let test_set: Vec<&CarRecord> = test_idx.iter().map(|&i| usable[i]).collect();

    tracing::info!(
        "Running quick CV ({} folds) on {} training rows...",
        config.cv_folds,
        train_set.len()
    );
    let cv_scores = cross_validate(&train_set, config.cv_folds, &params);
    let (cv_rmse_mean, cv_rmse_std) = mean_std(&cv_scores);
    tracing::info!("CV RMSE: {:.2} ± {:.2}", cv_rmse_mean, cv_rmse_std);

    tracing::info!("Fitting model on full training set...");
    let (preprocessor, forest) = fit(&train_set, &params);
    let (actual, predicted) = evaluate(&preprocessor, &forest, &test_set);

    let metrics = TrainingMetrics {
        cv_rmse_mean,
        cv_rmse_std,
        test_rmse: rmse(&actual, &predicted),
        test_r2: r2_score(&actual, &predicted),
        train_rows: train_set.len(),
        test_rows: test_set.len(),
    };

    Ok(CarPriceModel {
        preprocessor,
        forest,
        metrics,
        trained_at: chrono::Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic(n: usize) -> Vec<CarRecord> {
        (0..n)
            .map(|i| {
                let hp = 100.0 + 10.0 * i as f64;
                CarRecord {
                    company: Some(if i % 2 == 0 { "A" } else { "B" }.to_string()),
                    fuel_type: Some("Petrol".to_string()),
                    horsepower: Some(hp),
                    seats: Some(4.0),
                    price: Some(hp * 100.0),
                    ..Default::default()
                }
            })
            .collect()
    }

    fn small_config() -> ModelConfig {
        ModelConfig {
            n_estimators: 10,
            n_jobs: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_train_test_split_sizes() {
        let (train, test) = train_test_split(10, 0.2, 42);
        assert_eq!(test.len(), 2);
        assert_eq!(train.len(), 8);

        let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
        all.sort();
        assert_eq!(all, (0..10).collect::<Vec<_>>());

        assert_eq!(train_test_split(10, 0.2, 42), (train, test));
        assert_eq!(train_test_split(11, 0.2, 1).1.len(), 3);
    }

    #[test]
    fn test_k_fold_partitions() {
        let folds = k_fold(8, 3);
        let sizes: Vec<usize> = folds.iter().map(|(_, v)| v.len()).collect();
        assert_eq!(sizes, vec![3, 3, 2]);
        assert_eq!(folds[1].1, vec![3, 4, 5]);
        assert_eq!(folds[1].0, vec![0, 1, 2, 6, 7]);
    }

    #[test]
    fn test_train_requires_ten_priced_rows() {
        let mut records = synthetic(12);
        for r in records.iter_mut().take(3) {
            r.price = None;
        }
        let err = train(&records, &small_config()).unwrap_err();
        assert!(matches!(
            err,
            ProjectError::InsufficientData {
                required: 10,
                found: 9
            }
        ));
    }

    #[test]
    fn test_train_fits_monotonic_relation() {
        let records = synthetic(40);
        let model = train(&records, &small_config()).unwrap();

        assert_eq!(model.metrics.train_rows, 32);
        assert_eq!(model.metrics.test_rows, 8);
        assert!(model.metrics.test_r2 > 0.8, "r2 = {}", model.metrics.test_r2);

        let cheap = model.predict(&records[1]);
        let pricey = model.predict(&records[38]);
        assert!(cheap < pricey);
    }

    #[test]
    fn test_model_json_round_trip_predicts_the_same() {
        let records = synthetic(20);
        let model = train(&records, &small_config()).unwrap();

        let restored = CarPriceModel::from_json(&model.to_json().unwrap()).unwrap();
        let (before, after) = (model.predict(&records[5]), restored.predict(&records[5]));
        assert!((before - after).abs() <= 1e-6 * before.abs().max(1.0));
        assert_eq!(restored.metrics.train_rows, model.metrics.train_rows);
    }

    #[test]
    fn test_load_missing_model() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = CarPriceModel::load(dir.path().join("none.json")).unwrap_err();
        assert!(matches!(err, ProjectError::DataNotFound { .. }));
    }

    #[test]
    fn test_load_rejects_inconsistent_model() {
        let records = synthetic(20);
        let model = train(&records, &small_config()).unwrap();
        let mut value: serde_json::Value = serde_json::from_slice(&model.to_json().unwrap()).unwrap();

        value["forest"]["trees"][0]["nodes"] = serde_json::json!([]);
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

        let err = CarPriceModel::load(&path).unwrap_err();
        assert!(matches!(err, ProjectError::ProcessingError { .. }));

        value["preprocessor"]["medians"] = serde_json::json!([]);
        let err = CarPriceModel::from_json(&serde_json::to_vec(&value).unwrap()).unwrap_err();
        assert!(matches!(err, ProjectError::ProcessingError { .. }));
    }
}
