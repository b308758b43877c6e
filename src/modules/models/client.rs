//! `reqwest`-backed client for the Thingiverse REST API.

use std::time::Duration;

use ane_kernel::settings::{ApiToken, CatalogSettings};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Url;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::models::{Thing, ThingImage};

/// Page size requested from `/popular`. Not configurable by callers.
pub const POPULAR_PAGE_SIZE: u32 = 12;

/// Longest upstream error body kept for diagnostics.
const MAX_ERROR_BODY: usize = 2048;

/// Errors that can occur while talking to the catalog provider.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No credential was configured; upstream was not contacted.
    #[error("Thingiverse Token is missing")]
    MissingToken,
    /// Upstream answered with a non-success status.
    #[error("upstream returned status {status}")]
    Upstream { status: u16, body: String },
    #[error("upstream request timed out")]
    Timeout(#[source] reqwest::Error),
    #[error("upstream request failed")]
    Transport(#[source] reqwest::Error),
    /// Upstream answered 2xx with a body we cannot use.
    #[error("invalid upstream payload: {0}")]
    InvalidPayload(String),
    #[error("invalid catalog configuration: {0}")]
    InvalidConfig(String),
}

impl CatalogError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::Timeout(err)
        } else {
            CatalogError::Transport(err)
        }
    }
}

/// Thin wrapper over the three upstream endpoints the storefront uses.
#[derive(Debug, Clone)]
pub struct ThingiverseClient {
    base_url: Url,
    token: Option<ApiToken>,
    http: reqwest::Client,
}

impl ThingiverseClient {
    /// Build a client from settings. The token is captured once here.
    pub fn new(settings: &CatalogSettings) -> Result<Self, CatalogError> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| {
            CatalogError::InvalidConfig(format!("base_url '{}': {}", settings.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::InvalidConfig(format!(
                "base_url '{}' cannot carry a path",
                settings.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(settings.user_agent.as_str())
            .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| CatalogError::InvalidConfig(e.to_string()))?;

        debug!(
            base_url = %base_url,
            has_token = settings.token.is_some(),
            timeout_ms = settings.timeout_ms,
            "building Thingiverse HTTP client"
        );

        Ok(Self {
            base_url,
            token: settings.token.clone(),
            http,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Fail before any network I/O when no credential is configured.
    pub fn ensure_token(&self) -> Result<&ApiToken, CatalogError> {
        self.token.as_ref().ok_or(CatalogError::MissingToken)
    }

    /// `GET /popular?page={page}&per_page=12`
    pub async fn popular(&self, page: u64) -> Result<Vec<Thing>, CatalogError> {
        let mut url = self.endpoint(&["popular"])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &POPULAR_PAGE_SIZE.to_string());

        let payload: serde_json::Value = self.get_json(url).await?;
        if !payload.is_array() {
            return Err(CatalogError::InvalidPayload(format!(
                "expected an array of things, got {}",
                json_kind(&payload)
            )));
        }

        serde_json::from_value(payload).map_err(|e| CatalogError::InvalidPayload(e.to_string()))
    }

    /// `GET /things/{id}`
    pub async fn thing(&self, id: &str) -> Result<Thing, CatalogError> {
        let url = self.endpoint(&["things", id])?;
        self.get_json(url).await
    }

    /// `GET /things/{id}/images`
    pub async fn thing_images(&self, id: &str) -> Result<Vec<ThingImage>, CatalogError> {
        let url = self.endpoint(&["things", id, "images"])?;
        self.get_json(url).await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidConfig("base_url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        let token = self.ensure_token()?;

        debug!(url = %url, token = %token.preview(), "fetching from Thingiverse");

        let response = self
            .http
            .get(url)
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(CatalogError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_at_char_boundary(&mut body, MAX_ERROR_BODY);
            return Err(CatalogError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(CatalogError::from_reqwest)?;
        serde_json::from_slice(&bytes).map_err(|e| CatalogError::InvalidPayload(e.to_string()))
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn truncate_at_char_boundary(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}
