//! Person-detection service client.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use sleuth_models::Detection;

use crate::error::{MlClientError, MlClientResult};

/// Default per-request timeout for detection calls.
pub const DEFAULT_DETECT_TIMEOUT: Duration = Duration::from_secs(25);

/// Client for the person-detection service.
#[derive(Debug, Clone)]
pub struct DetectorClient {
    base_url: String,
    client: Client,
}

/// `POST /detect` response envelope.
#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[allow(dead_code)]
    status: String,
    results: DetectResults,
}

#[derive(Debug, Deserialize)]
struct DetectResults {
    #[serde(default)]
    all_detections: Vec<Detection>,
    #[serde(default)]
    person_count: u32,
}

/// Detector `GET /health` projection.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorHealth {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
}

impl DetectorClient {
    /// Create a client with the default 25 s request timeout.
    pub fn new(base_url: impl Into<String>) -> MlClientResult<Self> {
        Self::with_timeout(base_url, DEFAULT_DETECT_TIMEOUT)
    }

    /// Create a client with an explicit request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> MlClientResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Detect persons in a PNG-encoded frame.
    ///
    /// Returns the raw detection list; callers filter on
    /// [`Detection::is_person`] when `show_all_objects` is set.
    pub async fn detect(
        &self,
        png: Vec<u8>,
        confidence: f32,
        show_all_objects: bool,
    ) -> MlClientResult<Vec<Detection>> {
        let part = Part::bytes(png)
            .file_name("frame.png")
            .mime_str("image/png")?;
        let form = Form::new()
            .part("file", part)
            .text("confidence", confidence.to_string())
            .text("show_all_objects", show_all_objects.to_string());

        let response = self
            .client
            .post(format!("{}/detect", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MlClientError::unexpected_status("/detect", status, body));
        }

        let body: DetectResponse = response.json().await?;
        debug!(
            detections = body.results.all_detections.len(),
            persons = body.results.person_count,
            "Detection response received"
        );
        Ok(body.results.all_detections)
    }

    /// Probe the detector's health endpoint.
    pub async fn health(&self) -> MlClientResult<DetectorHealth> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MlClientError::unexpected_status("/health", status, body));
        }

        Ok(response.json().await?)
    }
}
