//! # Configuration Management
//!
//! This module handles loading and managing application configuration from multiple sources:
//! - TOML configuration files (config.toml)
//! - Environment variables (with APP_ prefix)
//! - Default values (built into the code)
//!
//! ## Configuration Groups:
//! - **server**: Bind address for the HTTP server
//! - **speech**: Upstream speech API (base URL, key, model names, default voice)
//! - **storage**: Directories for uploaded samples, fingerprints, and capture chunks
//! - **capture**: Simulated microphone capture behavior
//! - **limits**: Request size and text length caps
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Environment variables (APP_SERVER_HOST, OPENAI_API_KEY, etc.)
//! 2. Configuration file (config.toml)
//! 3. Default values (defined in the Default impl)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Main application configuration that contains all settings.
///
/// ## Why separate config structs:
/// Breaking configuration into logical groups (server, speech, storage, ...)
/// makes it easier to understand and maintain as the application grows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub speech: SpeechConfig,
    pub storage: StorageConfig,
    pub capture: CaptureConfig,
    pub limits: LimitsConfig,
}

/// Server-specific configuration settings.
///
/// ## Common values:
/// - `host = "127.0.0.1"`: Only accept connections from localhost (development)
/// - `host = "0.0.0.0"`: Accept connections from any IP address (production)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Upstream speech API configuration.
///
/// ## Fields:
/// - `api_base_url`: OpenAI-compatible API root (e.g., "https://api.openai.com/v1")
/// - `api_key`: Bearer token for the upstream API (normally set via OPENAI_API_KEY)
/// - `transcription_model`: Model used for speech-to-text (e.g., "whisper-1")
/// - `speech_model`: Model used for text-to-speech (e.g., "tts-1")
/// - `default_voice`: Voice used when a /speak request doesn't name one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    pub api_base_url: String,
    pub api_key: String,
    pub transcription_model: String,
    pub speech_model: String,
    pub default_voice: String,
}

/// Filesystem storage configuration.
///
/// All three directories are created on demand and never cleaned up; the
/// service only ever appends files (uploaded samples, fingerprints, and
/// simulated capture chunks).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for transcription spool files and synthesized output
    pub recordings_dir: String,
    /// Directory for stored voice samples, named by fingerprint id
    pub fingerprints_dir: String,
    /// Directory for simulated microphone capture chunks
    pub capture_dir: String,
}

/// Simulated microphone capture configuration.
///
/// ## Fields:
/// - `enabled`: Start the capture loop automatically at server startup
/// - `chunk_seconds`: Duration of each silent placeholder chunk
/// - `sample_rate`: Sample rate of the placeholder audio (Hz)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub enabled: bool,
    pub chunk_seconds: u64,
    pub sample_rate: u32,
}

/// Request limit configuration.
///
/// ## Tuning guidelines:
/// - `max_upload_bytes` bounds multipart audio uploads (transcribe, clone-voice)
/// - `max_speak_chars` bounds text sent to the synthesis endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub max_upload_bytes: usize,
    pub max_speak_chars: usize,
}

/// Provides default configuration values.
///
/// ## Why defaults matter:
/// Default values ensure the application can start even if no configuration
/// file exists. The directory defaults mirror the paths the service has
/// always used, so existing deployments keep their data.
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),  // Localhost only (safe for development)
                port: 8080,
            },
            speech: SpeechConfig {
                api_base_url: "https://api.openai.com/v1".to_string(),
                api_key: String::new(),  // Must come from OPENAI_API_KEY or config.toml
                transcription_model: "whisper-1".to_string(),
                speech_model: "tts-1".to_string(),
                default_voice: "alloy".to_string(),
            },
            storage: StorageConfig {
                recordings_dir: "/tmp/audio_recordings".to_string(),
                fingerprints_dir: "/tmp/voice_fingerprints".to_string(),
                capture_dir: "/tmp/mic_recordings".to_string(),
            },
            capture: CaptureConfig {
                enabled: false,      // Capture only starts when asked to
                chunk_seconds: 5,    // 5 second silent chunks
                sample_rate: 16000,  // 16kHz placeholder audio
            },
            limits: LimitsConfig {
                max_upload_bytes: 50 * 1024 * 1024,  // 50MB audio uploads
                max_speak_chars: 4096,               // Matches upstream TTS input limit
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources in priority order.
    ///
    /// ## Configuration Loading Process:
    /// 1. Start with built-in defaults
    /// 2. Override with values from config.toml (if it exists)
    /// 3. Override with environment variables prefixed with APP_
    /// 4. Handle special cases for HOST, PORT, and OPENAI_API_KEY
    ///
    /// ## Environment Variable Examples:
    /// - `APP_SERVER_HOST=0.0.0.0`: Override server host
    /// - `APP_SERVER_PORT=3000`: Override server port
    /// - `HOST=0.0.0.0` / `PORT=3000`: Special cases for deployment platforms
    /// - `OPENAI_API_KEY=sk-...`: Upstream API key (conventional variable name)
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            // 1. Start with defaults - converts our Default impl to config format
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // 2. Load from config.toml file (if it exists)
            .add_source(config::File::with_name("config").required(false))
            // 3. Load from environment variables with APP_ prefix
            .add_source(config::Environment::with_prefix("APP").separator("_"));

        // Handle special environment variables used by deployment platforms
        // and the conventional OPENAI_API_KEY variable.
        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        if let Ok(key) = env::var("OPENAI_API_KEY") {
            settings = settings.set_override("speech.api_key", key)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// ## What this checks:
    /// - Server port is not 0 (port 0 is reserved and can't be used)
    /// - Upstream base URL and default voice are non-empty
    /// - Size limits and capture timing are non-zero
    ///
    /// ## Why validate:
    /// Catching configuration errors early prevents runtime failures and
    /// provides clear error messages about what's wrong. Note that an empty
    /// API key is allowed here: every upstream request would fail with 401,
    /// but the cloning and management endpoints still work without one.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.speech.api_base_url.is_empty() {
            return Err(anyhow::anyhow!("Speech API base URL cannot be empty"));
        }

        if self.speech.default_voice.is_empty() {
            return Err(anyhow::anyhow!("Default voice cannot be empty"));
        }

        if self.limits.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("Max upload size must be greater than 0"));
        }

        if self.limits.max_speak_chars == 0 {
            return Err(anyhow::anyhow!("Max speak length must be greater than 0"));
        }

        if self.capture.chunk_seconds == 0 {
            return Err(anyhow::anyhow!("Capture chunk duration must be greater than 0"));
        }

        if self.capture.sample_rate == 0 {
            return Err(anyhow::anyhow!("Capture sample rate must be greater than 0"));
        }

        Ok(())
    }

    /// Update configuration from a JSON string (used for runtime config updates).
    ///
    /// ## Partial updates:
    /// This method allows updating only some fields, not the entire
    /// configuration. For example, `{"speech": {"default_voice": "nova"}}`
    /// changes only the default voice. The API key, storage directories, and
    /// capture settings are deliberately not updatable at runtime; the capture
    /// loop reads its settings once at startup, so those require a restart.
    pub fn update_from_json(&mut self, json_str: &str) -> Result<()> {
        let partial_config: serde_json::Value = serde_json::from_str(json_str)?;

        // Update server configuration if provided
        if let Some(server) = partial_config.get("server") {
            if let Some(host) = server.get("host").and_then(|v| v.as_str()) {
                self.server.host = host.to_string();
            }
            if let Some(port) = server.get("port").and_then(|v| v.as_u64()) {
                self.server.port = port as u16;
            }
        }

        // Update speech configuration if provided
        if let Some(speech) = partial_config.get("speech") {
            if let Some(model) = speech.get("transcription_model").and_then(|v| v.as_str()) {
                self.speech.transcription_model = model.to_string();
            }
            if let Some(model) = speech.get("speech_model").and_then(|v| v.as_str()) {
                self.speech.speech_model = model.to_string();
            }
            if let Some(voice) = speech.get("default_voice").and_then(|v| v.as_str()) {
                self.speech.default_voice = voice.to_string();
            }
        }

        // Update limit configuration if provided
        if let Some(limits) = partial_config.get("limits") {
            if let Some(bytes) = limits.get("max_upload_bytes").and_then(|v| v.as_u64()) {
                self.limits.max_upload_bytes = bytes as usize;
            }
            if let Some(chars) = limits.get("max_speak_chars").and_then(|v| v.as_u64()) {
                self.limits.max_speak_chars = chars as usize;
            }
        }

        // Validate the updated configuration to ensure it's still valid
        self.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that the default configuration is valid and has expected values.
    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.speech.transcription_model, "whisper-1");
        assert_eq!(config.speech.default_voice, "alloy");
        // Ensure the default config passes validation
        assert!(config.validate().is_ok());
    }

    /// Test that validation catches invalid configurations.
    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.server.port = 0;  // Invalid port
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.speech.default_voice.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.limits.max_upload_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.capture.chunk_seconds = 0;
        assert!(config.validate().is_err());
    }

    /// Test that runtime configuration updates work correctly.
    #[test]
    fn test_config_update() {
        let mut config = AppConfig::default();
        let json = r#"{"speech": {"default_voice": "nova"}, "limits": {"max_speak_chars": 2048}}"#;
        assert!(config.update_from_json(json).is_ok());
        assert_eq!(config.speech.default_voice, "nova");
        assert_eq!(config.limits.max_speak_chars, 2048);
        // Other fields should remain unchanged
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.speech.speech_model, "tts-1");
    }

    /// Capture settings are read once at startup by the capture loop, so a
    /// runtime update must not pretend to change them.
    #[test]
    fn test_config_update_ignores_capture() {
        let mut config = AppConfig::default();
        let json = r#"{"capture": {"enabled": true, "chunk_seconds": 60}}"#;
        assert!(config.update_from_json(json).is_ok());
        assert!(!config.capture.enabled);
        assert_eq!(config.capture.chunk_seconds, 5);
    }

    /// Test that an update leaving the config invalid is rejected.
    #[test]
    fn test_config_update_rejects_invalid() {
        let mut config = AppConfig::default();
        let json = r#"{"limits": {"max_speak_chars": 0}}"#;
        assert!(config.update_from_json(json).is_err());
    }
}
