use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use vigil_core::{ClassificationService, Frame, FrameClassification, ServiceConfig};

use crate::http::{build_client, endpoint, ResponseExt};

#[derive(Debug, Deserialize)]
struct ClassificationReply {
    status: FrameClassification,
}

/// Classification service reached over HTTP (`POST /api/webcam/`)
pub struct HttpClassifier {
    client: Client,
    url: String,
}

impl HttpClassifier {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            url: endpoint(api_url, "/api/webcam/"),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        Self::new(&config.api_url, config.request_timeout())
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ClassificationService for HttpClassifier {
    async fn classify(&self, frame: &Frame) -> Result<FrameClassification> {
        let body = json!({ "image": frame.to_data_url() });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .context("Failed to send frame to classification service")?
            .ensure_success("Classification")
            .await?;

        let reply: ClassificationReply = response
            .json()
            .await
            .context("Failed to parse classification response")?;

        log::debug!("Classification service replied {}", reply.status);
        Ok(reply.status)
    }
}
