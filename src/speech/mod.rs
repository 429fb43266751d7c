//! # Upstream Speech API Module
//!
//! Handles all communication with the third-party OpenAI-compatible speech
//! API. This service does no signal processing of its own: audio uploads are
//! relayed to the upstream transcription endpoint and synthesis requests are
//! relayed to the upstream speech endpoint.
//!
//! ## Key Components:
//! - **SpeechClient**: reqwest-based client with bearer auth and multipart upload
//! - **Wire Types**: Request/response bodies for the two upstream endpoints
//!
//! ## Upstream Endpoints Used:
//! - `POST {base_url}/audio/transcriptions` - multipart (`file`, `model`), returns `{"text": ...}`
//! - `POST {base_url}/audio/speech` - JSON (`model`, `voice`, `input`), returns raw audio bytes

pub mod client;    // HTTP client for the upstream API
pub mod types;     // Wire types for upstream requests/responses

pub use client::SpeechClient;
pub use types::{SynthesisRequest, Transcription};
