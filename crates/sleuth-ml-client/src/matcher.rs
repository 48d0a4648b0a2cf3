//! Clothing-similarity service client.
//!
//! The matcher owns target feature vectors; registration is an idempotent
//! upsert keyed by target ID.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use sleuth_models::TargetMatch;

use crate::error::{MlClientError, MlClientResult};

/// Default per-request timeout for matching calls.
pub const DEFAULT_MATCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the clothing-similarity service.
#[derive(Debug, Clone)]
pub struct MatcherClient {
    base_url: String,
    client: Client,
}

/// `POST /register_person` response.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterTargetResponse {
    pub status: String,
    #[serde(default)]
    pub feature_dimension: u32,
}

/// `POST /identify_person` response.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentifyResponse {
    #[serde(default)]
    pub matches: Vec<TargetMatch>,
    #[serde(default)]
    pub matches_found: u32,
}

/// `GET /registered_persons` response.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredTargets {
    #[serde(default)]
    pub person_ids: Vec<String>,
    #[serde(default)]
    pub total_persons: u32,
}

impl MatcherClient {
    /// Create a client with the default 15 s request timeout.
    pub fn new(base_url: impl Into<String>) -> MlClientResult<Self> {
        Self::with_timeout(base_url, DEFAULT_MATCH_TIMEOUT)
    }

    /// Create a client with an explicit request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> MlClientResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Register (upsert) a target's clothing features from a PNG image.
    pub async fn register_target(
        &self,
        target_id: &str,
        png: Vec<u8>,
    ) -> MlClientResult<RegisterTargetResponse> {
        let part = Part::bytes(png)
            .file_name(format!("{target_id}.png"))
            .mime_str("image/png")?;
        let form = Form::new()
            .text("person_id", target_id.to_string())
            .part("file", part);

        let response = self
            .client
            .post(format!("{}/register_person", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MlClientError::unexpected_status(
                "/register_person",
                status,
                body,
            ));
        }

        Ok(response.json().await?)
    }

    /// Compare a person crop against all registered targets.
    pub async fn identify(&self, png: Vec<u8>, threshold: f64) -> MlClientResult<IdentifyResponse> {
        let part = Part::bytes(png)
            .file_name("crop.png")
            .mime_str("image/png")?;
        let form = Form::new()
            .part("file", part)
            .text("threshold", threshold.to_string());

        let response = self
            .client
            .post(format!("{}/identify_person", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MlClientError::unexpected_status(
                "/identify_person",
                status,
                body,
            ));
        }

        let body: IdentifyResponse = response.json().await?;
        debug!(matches = body.matches_found, "Identify response received");
        Ok(body)
    }

    /// List the IDs of all registered targets.
    pub async fn list_targets(&self) -> MlClientResult<RegisteredTargets> {
        let response = self
            .client
            .get(format!("{}/registered_persons", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MlClientError::unexpected_status(
                "/registered_persons",
                status,
                body,
            ));
        }

        Ok(response.json().await?)
    }

    /// Remove a registered target.
    pub async fn delete_target(&self, target_id: &str) -> MlClientResult<()> {
        let response = self
            .client
            .delete(format!("{}/person/{}", self.base_url, target_id))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MlClientError::unexpected_status("/person", status, body));
        }

        Ok(())
    }
}
