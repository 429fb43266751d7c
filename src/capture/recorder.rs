//! # Simulated Capture Loop
//!
//! The capture loop is a tokio task gated on an atomic running flag, the same
//! shutdown pattern the server itself uses. Each iteration writes one silent
//! chunk, invokes the forwarding stub, and sleeps for the chunk duration.
//! There is no backpressure or coordination beyond the flag.

use crate::config::CaptureConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Handle to the simulated microphone capture.
///
/// ## Thread Safety:
/// Cloning shares the same underlying flag and counters, so the HTTP
/// handlers and the background task all observe one capture state.
#[derive(Clone)]
pub struct MicrophoneCapture {
    config: CaptureConfig,
    output_dir: PathBuf,
    running: Arc<AtomicBool>,
    chunks_written: Arc<AtomicU64>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl MicrophoneCapture {
    /// Create a capture handle in the stopped state.
    pub fn new(config: CaptureConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
            running: Arc::new(AtomicBool::new(false)),
            chunks_written: Arc::new(AtomicU64::new(0)),
            task: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the background capture loop.
    ///
    /// Returns false (and does nothing) if capture is already running.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        // swap returns the previous value; true means a loop is already live
        if self.running.swap(true, Ordering::SeqCst) {
            return false;
        }

        let running = Arc::clone(&self.running);
        let chunks_written = Arc::clone(&self.chunks_written);
        let output_dir = self.output_dir.clone();
        let config = self.config.clone();

        info!(dir = %output_dir.display(), chunk_seconds = config.chunk_seconds, "Starting simulated microphone capture");

        let handle = tokio::spawn(async move {
            let mut chunk_index = chunks_written.load(Ordering::SeqCst);
            while running.load(Ordering::SeqCst) {
                match write_silent_chunk(&output_dir, chunk_index, &config) {
                    Ok(path) => {
                        chunk_index += 1;
                        chunks_written.store(chunk_index, Ordering::SeqCst);
                        forward_to_transcription(&path);
                    }
                    Err(e) => {
                        error!("Failed to write capture chunk: {}", e);
                    }
                }

                tokio::time::sleep(std::time::Duration::from_secs(config.chunk_seconds)).await;
            }
            debug!("Capture loop exited");
        });

        *self.task.lock().unwrap() = Some(handle);
        true
    }

    /// Stop the capture loop.
    ///
    /// Returns false if capture wasn't running. The background task is
    /// aborted rather than joined; the loop spends nearly all its time
    /// sleeping, so there is no meaningful work to wait for.
    pub fn stop(&self) -> bool {
        if !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }

        if let Some(handle) = self.task.lock().unwrap().take() {
            handle.abort();
        }

        info!("Stopped simulated microphone capture");
        true
    }

    /// Whether the capture loop is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of chunks written since the process started.
    pub fn chunks_written(&self) -> u64 {
        self.chunks_written.load(Ordering::SeqCst)
    }

    /// Directory chunks are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Write one silent placeholder chunk as `recording_{index:06}.wav`.
///
/// The chunk is zero-valued 16-bit mono PCM at the configured sample rate,
/// standing in for real microphone input.
pub fn write_silent_chunk(dir: &Path, index: u64, config: &CaptureConfig) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create capture directory {}", dir.display()))?;

    let sample_count = (config.sample_rate as u64 * config.chunk_seconds) as usize;
    let samples = vec![0i16; sample_count];

    let path = dir.join(format!("recording_{:06}.wav", index));
    let header = wav::Header::new(wav::header::WAV_FORMAT_PCM, 1, config.sample_rate, 16);
    let mut file = fs::File::create(&path)
        .with_context(|| format!("Failed to create chunk file {}", path.display()))?;
    wav::write(header, &wav::BitDepth::Sixteen(samples), &mut file)
        .context("Failed to encode capture chunk")?;

    debug!(path = %path.display(), "Wrote silent capture chunk");
    Ok(path)
}

/// Forwarding stub. A real implementation would submit the chunk to the
/// transcription pipeline; the fixture only records that the hook ran.
fn forward_to_transcription(path: &Path) {
    debug!(path = %path.display(), "Capture chunk ready for transcription (stub, not forwarded)");
}
