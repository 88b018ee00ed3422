use crate::analysis::session::{AnalysisEngine, EngineFactory};
use crate::analysis::{EngineConfig, EngineResponse, Paper};
use crate::error::EngineError;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    config: &'a EngineConfig,
    paper: &'a Paper,
}

/// Engine handle for an analysis service reached over HTTP.
///
/// The service is stateless: the configuration from the last `initialize` travels
/// with every analysis request as `{"config": ..., "paper": ...}` and the service
/// answers with an [`EngineResponse`] document.
pub struct RemoteEngine {
    client: reqwest::Client,
    endpoint: String,
    config: RwLock<Option<EngineConfig>>,
}

impl RemoteEngine {
    pub fn new(client: reqwest::Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            config: RwLock::new(None),
        }
    }
}

#[async_trait]
impl AnalysisEngine for RemoteEngine {
    async fn initialize(&self, config: &EngineConfig) -> Result<(), EngineError> {
        *self.config.write().await = Some(config.clone());
        Ok(())
    }

    async fn analyze(&self, paper: &Paper) -> Result<EngineResponse, EngineError> {
        let config = self.config.read().await;
        let config = config.as_ref().ok_or(EngineError::Uninitialized)?;

        let response = self
            .client
            .post(&self.endpoint)
            .json(&AnalyzeRequest { config, paper })
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Rejected(format!("{}: {}", status, body.trim())));
        }

        response
            .json::<EngineResponse>()
            .await
            .map_err(|e| EngineError::Rejected(format!("unreadable response: {}", e)))
    }
}

/// Creates [`RemoteEngine`] handles sharing one HTTP client
pub struct RemoteEngineFactory {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteEngineFactory {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }
}

impl EngineFactory for RemoteEngineFactory {
    fn create(&self) -> Result<Arc<dyn AnalysisEngine>, EngineError> {
        if reqwest::Url::parse(&self.endpoint).is_err() {
            return Err(EngineError::Construction(format!(
                "invalid engine endpoint {}",
                self.endpoint
            )));
        }
        Ok(Arc::new(RemoteEngine::new(self.client.clone(), &self.endpoint)))
    }
}
