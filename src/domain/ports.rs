use crate::domain::model::CarRecord;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Human-readable location of `path` inside this storage.
    fn locate(&self, path: &str) -> String;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Output: Send;

    fn name(&self) -> &str;
    async fn extract(&self) -> Result<Vec<CarRecord>>;
    async fn transform(&self, data: Vec<CarRecord>) -> Result<Self::Output>;
    async fn load(&self, output: Self::Output) -> Result<String>;
}
