//! Share service client
//!
//! Uploads the current input and configuration to the lab service, which
//! answers with an opaque id. The shareable link is `<origin>/l/<id>`.

use crate::config::AppConfig;
use crate::error::{LabError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Request body of `POST /share`
#[derive(Debug, Clone, Serialize)]
pub struct ShareBundle<'a> {
    pub input: &'a str,
    pub config: &'a str,
}

#[async_trait]
pub trait ShareService: Send + Sync {
    /// Upload a session and return its shareable URL
    async fn share(&self, input: &str, config: &str) -> Result<Url>;
}

/// HTTP implementation against the lab service
pub struct HttpShareService {
    client: Client,
    origin: Url,
}

impl HttpShareService {
    pub fn new(origin: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, origin })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.service_origin()?, config.service.timeout())
    }

    /// Shareable URL for a saved session id
    pub fn link_for(&self, id: &str) -> Url {
        let mut url = self.origin.clone();
        url.set_path(&format!("/l/{}", id));
        url.set_query(None);
        url.set_fragment(None);
        url
    }

    fn endpoint(&self) -> Result<Url> {
        self.origin
            .join("/share")
            .map_err(|e| LabError::Transport(format!("invalid service origin: {}", e)))
    }
}

#[async_trait]
impl ShareService for HttpShareService {
    async fn share(&self, input: &str, config: &str) -> Result<Url> {
        let endpoint = self.endpoint()?;
        tracing::debug!("Sharing session via {}", endpoint);

        let response = self
            .client
            .post(endpoint)
            .json(&ShareBundle { input, config })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(LabError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let id = body.trim();
        if id.is_empty() {
            return Err(LabError::Transport(
                "share service returned an empty id".to_string(),
            ));
        }
        Ok(self.link_for(id))
    }
}
