use crate::app::pipelines::{dataset_key, load_dataset};
use crate::config::ProjectConfig;
use crate::core::model::{train, CarPriceModel};
use crate::domain::model::CarRecord;
use crate::domain::ports::{Pipeline, Storage};
use crate::utils::error::{ProjectError, Result};
use std::path::Path;

pub struct TrainPipeline<S: Storage> {
    storage: S,
    config: ProjectConfig,
}

impl<S: Storage> TrainPipeline<S> {
    pub fn new(storage: S, config: ProjectConfig) -> Self {
        Self { storage, config }
    }

    fn model_key(&self) -> String {
        Path::new(&self.config.paths.models_dir)
            .join(&self.config.model.model_file)
            .to_string_lossy()
            .into_owned()
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for TrainPipeline<S> {
    type Output = CarPriceModel;

    fn name(&self) -> &str {
        "train"
    }

    async fn extract(&self) -> Result<Vec<CarRecord>> {
        load_dataset(&self.storage, &dataset_key(&self.config)).await
    }

    async fn transform(&self, data: Vec<CarRecord>) -> Result<CarPriceModel> {
        let model_config = self.config.model.clone();
        // tree fitting is CPU bound; keep it off the async workers
        tokio::task::spawn_blocking(move || train(&data, &model_config))
            .await
            .map_err(|e| ProjectError::ProcessingError {
                message: format!("training task failed: {}", e),
            })?
    }

    async fn load(&self, model: CarPriceModel) -> Result<String> {
        let metrics = &model.metrics;
        tracing::info!("Test RMSE: {:.2}", metrics.test_rmse);
        tracing::info!("Test R^2: {:.3}", metrics.test_r2);

        let key = self.model_key();
        self.storage.write_file(&key, &model.to_json()?).await?;
        Ok(self.storage.locate(&key))
    }
}
