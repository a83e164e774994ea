pub mod eda_pipeline;
pub mod train_pipeline;

pub use eda_pipeline::EdaPipeline;
pub use train_pipeline::TrainPipeline;

use crate::config::ProjectConfig;
use crate::core::dataset::{decode_latin1, parse_cars};
use crate::domain::model::CarRecord;
use crate::domain::ports::Storage;
use crate::utils::error::{ProjectError, Result};
use std::path::Path;

/// Storage-relative path of the cars dataset.
pub(crate) fn dataset_key(config: &ProjectConfig) -> String {
    Path::new(&config.paths.data_dir)
        .join(&config.paths.dataset_file)
        .to_string_lossy()
        .into_owned()
}

pub(crate) async fn load_dataset<S: Storage>(storage: &S, key: &str) -> Result<Vec<CarRecord>> {
    let bytes = match storage.read_file(key).await {
        Ok(bytes) => bytes,
        Err(ProjectError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ProjectError::DataNotFound {
                path: storage.locate(key),
                hint: "download the dataset or set paths.dataset_file".to_string(),
            });
        }
        Err(e) => return Err(e),
    };

    tracing::debug!("Read {} bytes from {}", bytes.len(), storage.locate(key));
    parse_cars(&decode_latin1(&bytes))
}
