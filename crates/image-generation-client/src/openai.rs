//! OpenAI streaming image edit client (`POST /images/edits` with `stream=true`).

use std::time::Duration;

use async_openai::config::{Config, OpenAIConfig};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::error::GenerationError;
use crate::mask_token;
use crate::sse::{partial_results, ApiErrorBody};
use crate::{GenerationClient, PartialResultStream};

pub const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";
/// Partial previews requested before the final image; the API accepts 0..=3.
pub const DEFAULT_PARTIAL_IMAGES: u8 = 2;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Longest silence tolerated between two reads of the response, stream included.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 120;

/// Streaming image edit client for the OpenAI Images API.
#[derive(Clone)]
pub struct OpenAIImageEditClient {
    http: reqwest::Client,
    config: OpenAIConfig,
    model: String,
    partial_images: u8,
    connect_timeout: Duration,
    read_timeout: Duration,
    api_key_for_logging: String,
}

impl OpenAIImageEditClient {
    /// Creates a client with the default API base.
    pub fn new(api_key: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key.clone());
        Self::with_config(config, api_key)
    }

    /// Creates a client against a custom base URL (proxies and OpenAI-compatible services).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.clone())
            .with_api_base(base_url);
        Self::with_config(config, api_key)
    }

    fn with_config(config: OpenAIConfig, api_key: String) -> Self {
        let connect_timeout = Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS);
        let read_timeout = Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS);
        Self {
            http: build_http_client(connect_timeout, read_timeout),
            config,
            model: DEFAULT_IMAGE_MODEL.to_string(),
            partial_images: DEFAULT_PARTIAL_IMAGES,
            connect_timeout,
            read_timeout,
            api_key_for_logging: api_key,
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_partial_images(mut self, partial_images: u8) -> Self {
        self.partial_images = partial_images;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self.http = build_http_client(self.connect_timeout, self.read_timeout);
        self
    }

    /// Bounds each read, not the whole stream: a stalled connection fails, a long edit that keeps
    /// sending events does not.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self.http = build_http_client(self.connect_timeout, self.read_timeout);
        self
    }

    fn build_form(
        &self,
        image: Vec<u8>,
        extension: &str,
        prompt: &str,
    ) -> Result<Form, GenerationError> {
        let part = Part::bytes(image)
            .file_name(format!("source{}", extension))
            .mime_str(mime_for_extension(extension))
            .map_err(|e| GenerationError::Connection(format!("invalid request: {}", e)))?;
        Ok(Form::new()
            .text("model", self.model.clone())
            .text("prompt", prompt.to_string())
            .text("stream", "true")
            .text("partial_images", self.partial_images.to_string())
            .part("image[]", part))
    }
}

fn build_http_client(connect_timeout: Duration, read_timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .read_timeout(read_timeout)
        .build()
        .unwrap_or_else(|e| {
            error!(error = %e, "Failed to build HTTP client with timeouts, using defaults");
            reqwest::Client::new()
        })
}

/// Mime type the service expects for a staged file extension; unknown extensions are sent as JPEG.
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        ".png" => "image/png",
        ".webp" => "image/webp",
        ".gif" => "image/gif",
        _ => "image/jpeg",
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

/// Maps a non-2xx response to a failure kind, preferring the service's own message.
pub(crate) fn error_for_status(status: StatusCode, body: &str) -> GenerationError {
    let message = serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .and_then(|r| r.error.message.or(r.error.code))
        .unwrap_or_else(|| format!("HTTP {}: {}", status, body.chars().take(200).collect::<String>()));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationError::Auth(message),
        _ => GenerationError::RemoteRejected(message),
    }
}

#[async_trait]
impl GenerationClient for OpenAIImageEditClient {
    #[instrument(skip(self, image, prompt), fields(image_len = image.len()))]
    async fn stream_edit(
        &self,
        image: Vec<u8>,
        extension: &str,
        prompt: &str,
    ) -> Result<PartialResultStream, GenerationError> {
        info!(
            model = %self.model,
            partial_images = self.partial_images,
            prompt_preview = %prompt.chars().take(100).collect::<String>(),
            api_key = %mask_token(&self.api_key_for_logging),
            "OpenAI image edit stream request"
        );

        let form = self.build_form(image, extension, prompt)?;
        let response = self
            .http
            .post(self.config.url("/images/edits"))
            .headers(self.config.headers())
            .multipart(form)
            .send()
            .await
            .map_err(|e| GenerationError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = error_for_status(status, &body);
            error!(status = %status, error = %err, "OpenAI image edit request failed");
            return Err(err);
        }

        info!(status = %status, "OpenAI image edit stream opened");
        Ok(partial_results(response.bytes_stream().boxed()))
    }
}
