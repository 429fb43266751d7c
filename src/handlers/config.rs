use crate::{error::AppError, state::AppState};
use actix_web::{web, HttpResponse};
use serde_json::json;

/// Render the configuration tree for API responses.
///
/// The API key itself is never echoed back; only whether one is configured
/// (same convention the debug-environment endpoint family uses for tokens).
fn config_json(config: &crate::config::AppConfig) -> serde_json::Value {
    json!({
        "server": {
            "host": config.server.host,
            "port": config.server.port
        },
        "speech": {
            "api_base_url": config.speech.api_base_url,
            "api_key": if config.speech.api_key.is_empty() { "not set" } else { "set" },
            "transcription_model": config.speech.transcription_model,
            "speech_model": config.speech.speech_model,
            "default_voice": config.speech.default_voice
        },
        "storage": {
            "recordings_dir": config.storage.recordings_dir,
            "fingerprints_dir": config.storage.fingerprints_dir,
            "capture_dir": config.storage.capture_dir
        },
        "capture": {
            "enabled": config.capture.enabled,
            "chunk_seconds": config.capture.chunk_seconds,
            "sample_rate": config.capture.sample_rate
        },
        "limits": {
            "max_upload_bytes": config.limits.max_upload_bytes,
            "max_speak_chars": config.limits.max_speak_chars
        }
    })
}

pub async fn get_config(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let config = state.get_config();

    Ok(HttpResponse::Ok().json(json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "config": config_json(&config)
    })))
}

pub async fn update_config(
    state: web::Data<AppState>,
    body: web::Json<serde_json::Value>,
) -> Result<HttpResponse, AppError> {
    let json_str = serde_json::to_string(&body.into_inner())?;

    let mut current_config = state.get_config();
    current_config.update_from_json(&json_str)?;

    state
        .update_config(current_config.clone())
        .map_err(AppError::ValidationError)?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Configuration updated successfully",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "updated_config": config_json(&current_config)
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_api_key_is_redacted() {
        let mut config = AppConfig::default();
        config.speech.api_key = "sk-secret".to_string();

        let rendered = config_json(&config);
        assert_eq!(rendered["speech"]["api_key"], "set");
        assert!(!rendered.to_string().contains("sk-secret"));

        config.speech.api_key.clear();
        let rendered = config_json(&config);
        assert_eq!(rendered["speech"]["api_key"], "not set");
    }
}
