pub mod cleaning;
pub mod dataset;
pub mod eda;
pub mod engine;
pub mod forest;
pub mod game;
pub mod greeting;
pub mod metrics;
pub mod model;
pub mod preprocess;

pub use crate::domain::model::CarRecord;
pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
