//! Remote normalise binding
//!
//! [`RemoteNormalise`] wraps an engine and sends normalise requests to the
//! lab service instead, for deployments where the service owns the canonical
//! configuration format. Everything else is delegated to the inner engine.

use super::{ComponentKind, ComputeEngine, EngineError, EngineResult, ExecutionReport};
use crate::session::output::OutputLog;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

pub struct RemoteNormalise<E> {
    inner: E,
    client: Client,
    endpoint: Url,
}

impl<E: ComputeEngine> RemoteNormalise<E> {
    /// Wrap `inner`, posting normalise requests to `<origin>/normalise`
    pub fn new(inner: E, origin: &Url, timeout: Duration) -> EngineResult<Self> {
        let endpoint = origin
            .join("/normalise")
            .map_err(|e| EngineError::Load(format!("invalid service origin: {}", e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Load(e.to_string()))?;
        Ok(Self {
            inner,
            client,
            endpoint,
        })
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

#[async_trait]
impl<E: ComputeEngine> ComputeEngine for RemoteNormalise<E> {
    fn version(&self) -> String {
        self.inner.version()
    }

    fn list_components(&self, kind: ComponentKind) -> Vec<String> {
        self.inner.list_components(kind)
    }

    fn insert_component(
        &self,
        kind: ComponentKind,
        name: &str,
        config: &str,
    ) -> EngineResult<Option<String>> {
        self.inner.insert_component(kind, name, config)
    }

    async fn normalise(&self, config: &str) -> EngineResult<String> {
        tracing::debug!("Normalising via {}", self.endpoint);
        let response = self
            .client
            .post(self.endpoint.clone())
            .body(config.to_string())
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        if status != StatusCode::OK {
            return Err(EngineError::Transport(format!(
                "Request failed with status: {}",
                status.as_u16()
            )));
        }
        Ok(body)
    }

    async fn compile(&self, config: &str, log: &OutputLog) -> EngineResult<()> {
        self.inner.compile(config, log).await
    }

    async fn execute(&self, input: &str, log: &OutputLog) -> EngineResult<ExecutionReport> {
        self.inner.execute(input, log).await
    }
}
