//! # Upstream Speech API Client
//!
//! Thin reqwest wrapper around the two upstream endpoints this service
//! depends on. The client holds only the connection pool; per-request
//! settings (base URL, key, models) come from the current `SpeechConfig`
//! snapshot so runtime config updates take effect immediately.

use crate::config::SpeechConfig;
use crate::error::{AppError, AppResult};
use crate::speech::types::{SynthesisRequest, Transcription};
use reqwest::multipart;
use std::time::Duration;
use tracing::{debug, info};

/// Maximum number of upstream body characters echoed into error messages.
const ERROR_BODY_SNIPPET_LEN: usize = 200;

/// HTTP client for the upstream OpenAI-compatible speech API.
///
/// ## Thread Safety:
/// `reqwest::Client` is internally reference-counted, so `SpeechClient` is
/// shared across handlers behind a plain `Arc` with no locking.
pub struct SpeechClient {
    http: reqwest::Client,
}

impl SpeechClient {
    /// Create a new client with a generous timeout.
    ///
    /// Transcribing a 50MB upload can legitimately take a while upstream, so
    /// the timeout covers the whole round-trip rather than just connecting.
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { http }
    }

    /// Submit an audio file to the upstream transcription endpoint.
    ///
    /// ## Parameters:
    /// - **config**: Current speech configuration snapshot
    /// - **audio**: Raw bytes of the uploaded audio file
    /// - **filename**: Original upload filename (upstream uses the extension
    ///   to detect the container format)
    ///
    /// ## Errors:
    /// Non-2xx upstream responses become `AppError::Upstream` carrying the
    /// status and a snippet of the upstream body; transport failures convert
    /// via `From<reqwest::Error>`.
    pub async fn transcribe(
        &self,
        config: &SpeechConfig,
        audio: Vec<u8>,
        filename: &str,
    ) -> AppResult<Transcription> {
        let url = endpoint_url(&config.api_base_url, "audio/transcriptions");
        debug!(url = %url, bytes = audio.len(), "Submitting audio for transcription");

        let file_part = multipart::Part::bytes(audio)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| AppError::Internal(format!("Failed to build multipart body: {}", e)))?;

        let form = multipart::Form::new()
            .text("model", config.transcription_model.clone())
            .part("file", file_part);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&config.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "transcription request failed: {} {}",
                status,
                snippet(&body)
            )));
        }

        let transcription = response.json::<Transcription>().await?;
        info!(chars = transcription.text.len(), "Upstream transcription succeeded");
        Ok(transcription)
    }

    /// Submit text to the upstream speech synthesis endpoint and return the
    /// raw audio bytes (MP3 by default upstream).
    pub async fn synthesize(
        &self,
        config: &SpeechConfig,
        request: &SynthesisRequest,
    ) -> AppResult<Vec<u8>> {
        let url = endpoint_url(&config.api_base_url, "audio/speech");
        debug!(url = %url, voice = %request.voice, chars = request.input.len(), "Submitting text for synthesis");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "synthesis request failed: {} {}",
                status,
                snippet(&body)
            )));
        }

        let audio = response.bytes().await?;
        info!(bytes = audio.len(), "Upstream synthesis succeeded");
        Ok(audio.to_vec())
    }
}

impl Default for SpeechClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Join the configured base URL with an endpoint path, tolerating a trailing
/// slash in the configured value.
fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Truncate an upstream error body to a loggable snippet on a char boundary.
fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(ERROR_BODY_SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_joins_cleanly() {
        assert_eq!(
            endpoint_url("https://api.openai.com/v1", "audio/speech"),
            "https://api.openai.com/v1/audio/speech"
        );
        // Trailing slash in config shouldn't produce a double slash
        assert_eq!(
            endpoint_url("https://api.openai.com/v1/", "audio/transcriptions"),
            "https://api.openai.com/v1/audio/transcriptions"
        );
    }

    #[test]
    fn test_snippet_truncates_long_bodies() {
        let long = "x".repeat(500);
        let out = snippet(&long);
        assert!(out.len() < 500);
        assert!(out.ends_with("..."));

        // Short bodies come through unchanged
        assert_eq!(snippet(" short \n"), "short");
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        let multibyte = "é".repeat(300);
        let out = snippet(&multibyte);
        assert!(out.ends_with("..."));
        // Must not panic or split a codepoint
        assert!(out.chars().count() <= ERROR_BODY_SNIPPET_LEN + 3);
    }
}
