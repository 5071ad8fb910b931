use crate::model::{FetchRequest, ProviderError};
use crate::provider::traits::Provider;

use reqwest::Client;
use std::time::Duration;

pub struct ProviderImpl {
    pub client: Client,
}

impl ProviderImpl {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) CoindashBot/0.1")
            .timeout(Duration::from_secs(15))
            .build()
            .expect("failed to build http client");

        Self { client }
    }

    fn build_url(&self, req: &FetchRequest) -> String {
        format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{}?range={}d&interval=1d",
            req.ticker, req.days
        )
    }
}

#[async_trait::async_trait]
impl Provider for ProviderImpl {
    async fn fetch(&self, req: &FetchRequest) -> Result<String, ProviderError> {
        let url = self.build_url(req);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))
    }
}
