//! Wire types for the upstream speech API.
//!
//! These mirror the OpenAI audio API request and response bodies; unknown
//! response fields are ignored so minor upstream additions don't break
//! deserialization.

use serde::{Deserialize, Serialize};

/// Response body of the upstream transcription endpoint.
///
/// The upstream returns more fields for verbose formats, but the default
/// `json` response format only guarantees `text`, which is all this service
/// relays.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Transcription {
    pub text: String,
}

/// Request body for the upstream speech synthesis endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisRequest {
    /// Synthesis model name (e.g., "tts-1")
    pub model: String,
    /// Voice preset (e.g., "alloy", "nova")
    pub voice: String,
    /// Text to synthesize
    pub input: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcription_deserializes_with_extra_fields() {
        let json = r#"{"text": "hello world", "duration": 1.5, "language": "en"}"#;
        let transcription: Transcription = serde_json::from_str(json).unwrap();
        assert_eq!(transcription.text, "hello world");
    }

    #[test]
    fn test_synthesis_request_serialization() {
        let request = SynthesisRequest {
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            input: "Hello there".to_string(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "tts-1");
        assert_eq!(value["voice"], "alloy");
        assert_eq!(value["input"], "Hello there");
    }
}
