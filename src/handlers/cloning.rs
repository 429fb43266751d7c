//! # Voice Cloning REST API Handlers
//!
//! Simulated voice-cloning endpoints. Uploaded samples are fingerprinted and
//! stored; "cloned" speech is placeholder audio from the synth module. No
//! authentication or consent verification happens here (intentional fixture
//! behavior).
//!
//! ## Available Endpoints:
//! - `POST /clone-voice` - Store a voice sample and return its fingerprint id
//! - `GET /api/v1/clone-voice/samples` - List stored sample ids
//! - `POST /api/v1/clone-voice/speak` - Generate simulated cloned speech

use crate::cloning::store::is_valid_sample_id;
use crate::cloning::{synth, FingerprintStore, VoiceFingerprint};
use crate::error::{AppError, AppResult};
use crate::handlers::speech::read_audio_field;
use crate::state::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

/// Request body for simulated cloned speech.
#[derive(Debug, Deserialize)]
pub struct CloneSpeakRequest {
    /// Fingerprint id of a previously stored sample
    pub sample_id: String,
    /// Text to "speak" in the cloned voice
    pub text: String,
}

/// Store an uploaded voice sample for cloning.
///
/// ## Endpoint: `POST /clone-voice`
///
/// ## Request:
/// Multipart form data with an audio file field named "sample".
///
/// ## Response:
/// ```json
/// {
///   "status": "ok",
///   "sample_id": "3f2a9c0d11e45b67",
///   "message": "Voice sample stored. Cloning setup simulated.",
///   "timestamp": "2025-01-01T12:00:00Z"
/// }
/// ```
///
/// The sample is fingerprinted, written unencrypted to the fingerprints
/// directory, and kept forever. Any bytes are accepted; non-WAV uploads are
/// fingerprinted over their raw content.
pub async fn clone_voice(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let config = state.get_config();

    let upload = read_audio_field(&mut payload, "sample", config.limits.max_upload_bytes).await?;

    let fingerprint = VoiceFingerprint::from_wav_bytes(&upload.data);
    let store = FingerprintStore::new(&config.storage.fingerprints_dir);
    store.store_sample(&fingerprint, &upload.data)?;

    state.record_sample_stored();

    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "sample_id": fingerprint.sample_id(),
        "message": "Voice sample stored. Cloning setup simulated.",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// List the ids of all stored voice samples.
///
/// ## Endpoint: `GET /api/v1/clone-voice/samples`
pub async fn list_voice_samples(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let config = state.get_config();
    let store = FingerprintStore::new(&config.storage.fingerprints_dir);

    let samples = store.list_ids()?;

    Ok(HttpResponse::Ok().json(json!({
        "samples": samples,
        "count": samples.len(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Generate simulated speech in a previously cloned voice.
///
/// ## Endpoint: `POST /api/v1/clone-voice/speak`
///
/// ## Request Body:
/// ```json
/// { "sample_id": "3f2a9c0d11e45b67", "text": "Hello in a borrowed voice" }
/// ```
///
/// ## Response:
/// A placeholder WAV (`audio/wav`), low-amplitude noise sized from the text
/// at roughly 50ms per character, capped at 30 seconds. The referenced
/// sample must exist; its content doesn't influence the output.
pub async fn clone_speak(
    state: web::Data<AppState>,
    request: web::Json<CloneSpeakRequest>,
) -> AppResult<HttpResponse> {
    let config = state.get_config();

    if !is_valid_sample_id(&request.sample_id) {
        return Err(AppError::ValidationError(format!(
            "Invalid sample id: '{}'",
            request.sample_id
        )));
    }

    let text = request.text.trim();
    if text.is_empty() {
        return Err(AppError::ValidationError("Text cannot be empty".to_string()));
    }
    if text.chars().count() > config.limits.max_speak_chars {
        return Err(AppError::ValidationError(format!(
            "Text too long: {} chars (max: {})",
            text.chars().count(),
            config.limits.max_speak_chars
        )));
    }

    let store = FingerprintStore::new(&config.storage.fingerprints_dir);
    if !store.contains(&request.sample_id) {
        return Err(AppError::NotFound(format!(
            "No voice sample with id '{}'",
            request.sample_id
        )));
    }

    let audio = synth::generate_placeholder_speech(text)?;

    info!(
        sample_id = %request.sample_id,
        duration_s = synth::estimated_duration_seconds(text),
        "Simulated cloned speech generated"
    );

    Ok(HttpResponse::Ok()
        .content_type("audio/wav")
        .body(audio))
}
