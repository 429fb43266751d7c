//! # Voice Sample Storage
//!
//! Directory-backed storage for uploaded voice samples, keyed by fingerprint
//! id. Samples are stored unencrypted and never cleaned up; both are
//! intentional properties of this fixture.

use crate::cloning::fingerprint::{VoiceFingerprint, SAMPLE_ID_LEN};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Filesystem store mapping `sample_id` to a `.wav` file.
pub struct FingerprintStore {
    dir: PathBuf,
}

impl FingerprintStore {
    /// Create a store rooted at the given directory.
    ///
    /// The directory itself is created lazily on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store an uploaded sample under its fingerprint id.
    ///
    /// Returns the path the sample was written to. Re-uploading the same
    /// audio overwrites the existing file with identical content, so the
    /// operation is idempotent.
    pub fn store_sample(&self, fingerprint: &VoiceFingerprint, data: &[u8]) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let sample_id = fingerprint.sample_id();
        let path = self.path_for(&sample_id);
        fs::write(&path, data)?;

        info!(sample_id = %sample_id, bytes = data.len(), "Voice sample stored");
        Ok(path)
    }

    /// Check whether a sample with this id exists.
    pub fn contains(&self, sample_id: &str) -> bool {
        is_valid_sample_id(sample_id) && self.path_for(sample_id).is_file()
    }

    /// Path a sample id maps to (whether or not it exists).
    pub fn path_for(&self, sample_id: &str) -> PathBuf {
        self.dir.join(format!("{}.wav", sample_id))
    }

    /// List the ids of all stored samples.
    ///
    /// An absent directory means nothing has been stored yet, which is an
    /// empty list rather than an error.
    pub fn list_ids(&self) -> io::Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if let Some(id) = sample_id_from_path(&entry.path()) {
                ids.push(id);
            }
        }

        ids.sort();
        Ok(ids)
    }
}

/// A well-formed sample id is exactly the truncated lowercase hex digest
/// produced by `VoiceFingerprint::sample_id`. Anything else (including path
/// separators) is rejected before touching the filesystem.
pub fn is_valid_sample_id(sample_id: &str) -> bool {
    sample_id.len() == SAMPLE_ID_LEN
        && sample_id
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}

/// Extract a sample id from a stored file path, filtering out anything that
/// isn't a well-formed `{id}.wav` entry.
fn sample_id_from_path(path: &Path) -> Option<String> {
    if path.extension()?.to_str()? != "wav" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if is_valid_sample_id(stem) {
        Some(stem.to_string())
    } else {
        None
    }
}
