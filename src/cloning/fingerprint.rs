//! # Voice Fingerprint Extraction
//!
//! Computes a stable identifier for an uploaded voice sample. A real cloning
//! system would derive neural speaker embeddings here; this fixture hashes
//! the decoded sample data instead, which is deterministic and cheap while
//! still keying storage by audio content rather than filename.

use byteorder::{LittleEndian, WriteBytesExt};
use sha2::{Digest, Sha256};
use std::io::Cursor;

/// Number of hex characters in a sample id (64 bits of the digest).
pub const SAMPLE_ID_LEN: usize = 16;

/// A voice fingerprint: the SHA-256 digest of a sample's decoded audio data.
///
/// ## Hashing Rules:
/// - Parseable WAV uploads are decoded first and the digest covers the
///   little-endian sample bytes, so the same audio re-encoded with different
///   WAV metadata (e.g., extra chunks) fingerprints identically.
/// - Uploads that don't parse as WAV are hashed as raw bytes; the service
///   accepts any sample without validation (intentional fixture behavior).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceFingerprint {
    digest: [u8; 32],
}

impl VoiceFingerprint {
    /// Extract a fingerprint from an uploaded audio file.
    pub fn from_wav_bytes(data: &[u8]) -> Self {
        let mut cursor = Cursor::new(data);
        match wav::read(&mut cursor) {
            Ok((_header, track)) => Self {
                digest: hash_samples(&track),
            },
            // Not parseable WAV: fingerprint the raw bytes instead
            Err(_) => Self::from_raw_bytes(data),
        }
    }

    /// Fingerprint arbitrary bytes directly.
    pub fn from_raw_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self {
            digest: hasher.finalize().into(),
        }
    }

    /// Short identifier used as the storage filename stem.
    ///
    /// Always exactly `SAMPLE_ID_LEN` lowercase hex characters.
    pub fn sample_id(&self) -> String {
        self.to_hex()[..SAMPLE_ID_LEN].to_string()
    }

    /// Full digest as lowercase hex.
    pub fn to_hex(&self) -> String {
        self.digest
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }
}

/// Hash the decoded samples as little-endian bytes.
///
/// The `Sha256` hasher implements `std::io::Write`, so the byteorder
/// extension methods feed it directly without an intermediate buffer.
/// Writes to a hasher cannot fail.
fn hash_samples(track: &wav::BitDepth) -> [u8; 32] {
    let mut hasher = Sha256::new();
    match track {
        wav::BitDepth::Eight(samples) => hasher.update(samples),
        wav::BitDepth::Sixteen(samples) => {
            for &sample in samples {
                let _ = hasher.write_i16::<LittleEndian>(sample);
            }
        }
        wav::BitDepth::TwentyFour(samples) => {
            for &sample in samples {
                let _ = hasher.write_i32::<LittleEndian>(sample);
            }
        }
        wav::BitDepth::ThirtyTwoFloat(samples) => {
            for &sample in samples {
                let _ = hasher.write_f32::<LittleEndian>(sample);
            }
        }
        wav::BitDepth::Empty => {}
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a minimal valid 16-bit mono WAV in memory.
    fn wav_bytes(samples: &[i16]) -> Vec<u8> {
        let header = wav::Header::new(wav::header::WAV_FORMAT_PCM, 1, 16000, 16);
        let mut cursor = Cursor::new(Vec::new());
        wav::write(header, &wav::BitDepth::Sixteen(samples.to_vec()), &mut cursor).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let data = wav_bytes(&[0, 100, -100, 32767]);
        let a = VoiceFingerprint::from_wav_bytes(&data);
        let b = VoiceFingerprint::from_wav_bytes(&data);
        assert_eq!(a, b);
        assert_eq!(a.sample_id(), b.sample_id());
    }

    #[test]
    fn test_different_audio_different_fingerprint() {
        let a = VoiceFingerprint::from_wav_bytes(&wav_bytes(&[1, 2, 3, 4]));
        let b = VoiceFingerprint::from_wav_bytes(&wav_bytes(&[4, 3, 2, 1]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_sample_id_format() {
        let fingerprint = VoiceFingerprint::from_raw_bytes(b"not a wav file");
        let id = fingerprint.sample_id();
        assert_eq!(id.len(), SAMPLE_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_non_wav_falls_back_to_raw_hash() {
        let data = b"definitely not audio";
        let from_wav_path = VoiceFingerprint::from_wav_bytes(data);
        let from_raw = VoiceFingerprint::from_raw_bytes(data);
        assert_eq!(from_wav_path, from_raw);
    }

    #[test]
    fn test_full_hex_digest_length() {
        let fingerprint = VoiceFingerprint::from_raw_bytes(b"x");
        // SHA-256 digest is 32 bytes = 64 hex chars
        assert_eq!(fingerprint.to_hex().len(), 64);
    }
}
