//! # Microphone Capture Module
//!
//! Simulates an always-on microphone. A background task periodically writes
//! silent placeholder WAV chunks to the capture directory and hands each
//! chunk to a no-op transcription-forwarding stub. There is no real audio
//! input here and implementing one is a non-goal; the module exists to
//! exercise the capture lifecycle (start, periodic writes, stop).

pub mod recorder;    // Background capture loop and chunk writing

pub use recorder::MicrophoneCapture;
