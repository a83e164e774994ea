pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::ProjectConfig;

pub use adapters::{KaggleClient, KaggleCredentials, LocalStorage};
pub use app::pipelines::{EdaPipeline, TrainPipeline};
pub use crate::core::{engine::PipelineEngine, greeting::greet, model::CarPriceModel};
pub use domain::model::CarRecord;
pub use utils::error::{ProjectError, Result};
