use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::service::ComputationService;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use wtsplit_protocol::{
    CodesRequest, CodesResponse, ExportRequest, SuggestRequest, SuggestResponse, CODES_PATH,
    EXPORT_PATH, SUGGEST_PATH,
};

/// [`ComputationService`] over HTTP/JSON.
///
/// Requests carry no timeout; a slow K-S run simply keeps the session pending.
#[derive(Debug, Clone)]
pub struct HttpComputationService {
    client: Client,
    base_url: String,
}

impl HttpComputationService {
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        log::info!("POST {url}");

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            log::warn!("POST {url} failed with {status}");
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ComputationService for HttpComputationService {
    async fn suggest_breakpoints(
        &self,
        request: &SuggestRequest,
    ) -> Result<SuggestResponse, ServiceError> {
        self.post(SUGGEST_PATH, request).await
    }

    async fn derive_codes(&self, request: &CodesRequest) -> Result<CodesResponse, ServiceError> {
        self.post(CODES_PATH, request).await
    }

    async fn export_diagnostics(
        &self,
        request: &ExportRequest,
    ) -> Result<serde_json::Value, ServiceError> {
        self.post(EXPORT_PATH, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_without_double_slash() {
        let service = HttpComputationService::new(&ServiceConfig {
            base_url: "http://localhost:5000/".into(),
        })
        .unwrap();
        assert_eq!(service.base_url(), "http://localhost:5000");
        assert_eq!(
            service.url(SUGGEST_PATH),
            "http://localhost:5000/postprocessing/breakpoints/suggest"
        );
    }
}
