use crate::core::eda::median;
use crate::domain::model::CarRecord;
use crate::utils::error::{ProjectError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const NUMERIC_FEATURES: [&str; 5] = ["horsepower", "cc", "perf_sec", "torque", "seats"];
pub const CATEGORICAL_FEATURES: [&str; 2] = ["company", "fuel_type"];
pub const MISSING_CATEGORY: &str = "missing";

fn categorical_values(record: &CarRecord) -> [&str; 2] {
    [
        record.company.as_deref().unwrap_or(MISSING_CATEGORY),
        record.fuel_type.as_deref().unwrap_or(MISSING_CATEGORY),
    ]
}

/// Median imputation and standard scaling for the numeric features,
/// one-hot encoding for the categorical ones. Categories unseen during
/// fitting encode as all zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    medians: Vec<f64>,
    means: Vec<f64>,
    scales: Vec<f64>,
    categories: Vec<Vec<String>>,
}

impl Preprocessor {
    pub fn fit(records: &[&CarRecord]) -> Self {
        let mut medians = Vec::with_capacity(NUMERIC_FEATURES.len());
        let mut means = Vec::with_capacity(NUMERIC_FEATURES.len());
        let mut scales = Vec::with_capacity(NUMERIC_FEATURES.len());

        for feature in NUMERIC_FEATURES {
            let present: Vec<f64> = records.iter().filter_map(|r| r.numeric(feature)).collect();
            let fill = median(&present).unwrap_or(0.0);

            let imputed: Vec<f64> = records
                .iter()
                .map(|r| r.numeric(feature).unwrap_or(fill))
                .collect();
            let n = imputed.len().max(1) as f64;
            let mean = imputed.iter().sum::<f64>() / n;
            let variance = imputed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();

            medians.push(fill);
            means.push(mean);
            scales.push(if std > 0.0 { std } else { 1.0 });
        }

        let mut seen: [BTreeSet<String>; 2] = Default::default();
        for record in records {
            for (set, value) in seen.iter_mut().zip(categorical_values(record)) {
                set.insert(value.to_string());
            }
        }
        let categories = seen.into_iter().map(|s| s.into_iter().collect()).collect();

        Self {
            medians,
            means,
            scales,
            categories,
        }
    }

    pub fn n_features(&self) -> usize {
        NUMERIC_FEATURES.len() + self.categories.iter().map(Vec::len).sum::<usize>()
    }

    pub fn transform(&self, record: &CarRecord) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.n_features());

        for (i, feature) in NUMERIC_FEATURES.iter().enumerate() {
            let value = record.numeric(feature).unwrap_or(self.medians[i]);
            row.push((value - self.means[i]) / self.scales[i]);
        }

        for (known, value) in self.categories.iter().zip(categorical_values(record)) {
            let hit = known.binary_search_by(|c| c.as_str().cmp(value)).ok();
            row.extend((0..known.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }));
        }

        row
    }

    pub fn transform_all(&self, records: &[&CarRecord]) -> Vec<Vec<f64>> {
        records.iter().map(|r| self.transform(r)).collect()
    }
}

impl Validate for Preprocessor {
    fn validate(&self) -> Result<()> {
        let n = NUMERIC_FEATURES.len();
        for (name, values) in [
            ("medians", &self.medians),
            ("means", &self.means),
            ("scales", &self.scales),
        ] {
            if values.len() != n {
                return Err(ProjectError::ProcessingError {
                    message: format!("preprocessor {} has {} entries, expected {}", name, values.len(), n),
                });
            }
        }
        if self.categories.len() != CATEGORICAL_FEATURES.len() {
            return Err(ProjectError::ProcessingError {
                message: format!(
                    "preprocessor has {} category lists, expected {}",
                    self.categories.len(),
                    CATEGORICAL_FEATURES.len()
                ),
            });
        }
        if self.categories.iter().any(|c| c.windows(2).any(|w| w[0] >= w[1])) {
            return Err(ProjectError::ProcessingError {
                message: "preprocessor categories must be sorted and unique".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car(company: Option<&str>, fuel: Option<&str>, horsepower: Option<f64>) -> CarRecord {
        CarRecord {
            company: company.map(str::to_string),
            fuel_type: fuel.map(str::to_string),
            horsepower,
            ..Default::default()
        }
    }

    #[test]
    fn test_fit_imputes_and_scales() {
        let records = vec![
            car(Some("BMW"), Some("Petrol"), Some(100.0)),
            car(Some("AUDI"), None, Some(300.0)),
            car(Some("BMW"), Some("Diesel"), None),
        ];
        let refs: Vec<&CarRecord> = records.iter().collect();
        let pre = Preprocessor::fit(&refs);

        // horsepower: median 200 fills the gap -> [100, 300, 200], mean 200
        let row = pre.transform(&records[2]);
        assert_eq!(row[0], 0.0);
        // a column with no values at all scales by 1
        assert_eq!(row[1], 0.0);

        // 2 companies + 3 fuel categories (Diesel, Petrol, missing)
        assert_eq!(pre.n_features(), 5 + 2 + 3);
        assert_eq!(row.len(), pre.n_features());
    }

    #[test]
    fn test_one_hot_encoding() {
        let records = vec![
            car(Some("BMW"), Some("Petrol"), Some(1.0)),
            car(Some("AUDI"), None, Some(2.0)),
        ];
        let refs: Vec<&CarRecord> = records.iter().collect();
        let pre = Preprocessor::fit(&refs);

        // categories are sorted: [AUDI, BMW], [Petrol, missing]
        let row = pre.transform(&records[0]);
        assert_eq!(&row[5..], &[0.0, 1.0, 1.0, 0.0]);

        let row = pre.transform(&records[1]);
        assert_eq!(&row[5..], &[1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unknown_category_encodes_as_zeros() {
        let records = vec![car(Some("BMW"), Some("Petrol"), Some(1.0))];
        let refs: Vec<&CarRecord> = records.iter().collect();
        let pre = Preprocessor::fit(&refs);

        let unseen = car(Some("TESLA"), Some("Electric"), Some(1.0));
        let row = pre.transform(&unseen);
        assert!(row[5..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_validate_rejects_short_vectors() {
        let records = vec![car(Some("BMW"), Some("Petrol"), Some(1.0))];
        let refs: Vec<&CarRecord> = records.iter().collect();
        let fitted = Preprocessor::fit(&refs);
        assert!(fitted.validate().is_ok());

        let mut broken = fitted.clone();
        broken.medians.clear();
        assert!(matches!(broken.validate(), Err(ProjectError::ProcessingError { .. })));

        let mut broken = fitted;
        broken.categories.pop();
        assert!(broken.validate().is_err());
    }
}
