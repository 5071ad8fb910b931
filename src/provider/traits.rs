use crate::model::{FetchRequest, ProviderError};

#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    async fn fetch(&self, req: &FetchRequest) -> Result<String, ProviderError>;
}
