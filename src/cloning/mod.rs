//! # Voice Cloning Module
//!
//! Implements the simulated voice-cloning pipeline: fingerprinting uploaded
//! samples, storing them on disk, and generating placeholder "cloned" speech.
//! No neural inference happens here; the fingerprint is a hash over the
//! decoded sample data and the synthesized output is low-amplitude noise.
//!
//! ## Key Components:
//! - **VoiceFingerprint**: SHA-256 over decoded WAV sample data, truncated hex id
//! - **FingerprintStore**: Directory-backed sample storage, one file per fingerprint
//! - **Placeholder Synthesis**: Noise WAV generation sized from the input text
//!
//! ## Storage Layout:
//! Samples land in the configured fingerprints directory as
//! `{sample_id}.wav`, where `sample_id` is the first 16 hex characters of the
//! fingerprint. Files are written once and never cleaned up.

pub mod fingerprint;    // Voice fingerprint extraction
pub mod store;          // Sample storage by fingerprint id
pub mod synth;          // Simulated cloned speech generation

pub use fingerprint::VoiceFingerprint;
pub use store::FingerprintStore;
