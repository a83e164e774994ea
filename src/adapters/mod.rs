// Adapters layer: concrete implementations for external systems.

pub mod kaggle;
pub mod storage;

pub use kaggle::{KaggleClient, KaggleCredentials};
pub use storage::LocalStorage;
