//! # Application State Management
//!
//! This module manages shared state that needs to be accessed by multiple HTTP request handlers
//! simultaneously.
//!
//! ## The Arc<RwLock<T>> Pattern:
//! - **Arc**: Multiple ownership (many HTTP handlers can hold a reference)
//! - **RwLock**: Multiple readers OR one writer at a time (but not both)
//! - **T**: The actual data type being protected
//!
//! Multiple requests can read the config simultaneously, but only one can
//! update it; the same goes for the metrics counters every request touches.

use crate::capture::MicrophoneCapture;
use crate::config::AppConfig;
use crate::speech::SpeechClient;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// The main application state that's shared across all HTTP request handlers.
///
/// ## Thread Safety Pattern:
/// All mutable data sits behind Arc<RwLock<T>>. The speech client and capture
/// handle carry their own internal synchronization and are shared directly.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration (can be updated at runtime)
    pub config: Arc<RwLock<AppConfig>>,

    /// Request and domain metrics (constantly being updated by requests)
    pub metrics: Arc<RwLock<AppMetrics>>,

    /// HTTP client for the upstream speech API (connection pool, no mutable state)
    pub speech: Arc<SpeechClient>,

    /// Simulated microphone capture (start/stop controlled via the API)
    pub capture: MicrophoneCapture,

    /// When the server started (never changes, so no Arc<RwLock> needed)
    pub start_time: Instant,
}

/// Performance and domain metrics collected across all HTTP requests.
///
/// ## Why these metrics matter:
/// - **request_count / error_count**: Load and reliability monitoring
/// - **transcriptions_completed / syntheses_completed**: Upstream API usage
/// - **voice_samples_stored**: Growth of the fingerprint directory
/// - **endpoint_metrics**: Per-endpoint statistics for performance analysis
#[derive(Debug, Default)]
pub struct AppMetrics {
    /// Total number of HTTP requests processed since server start
    pub request_count: u64,

    /// Total number of errors encountered since server start
    pub error_count: u64,

    /// Successful transcriptions relayed from the upstream API
    pub transcriptions_completed: u64,

    /// Successful speech syntheses relayed from the upstream API
    pub syntheses_completed: u64,

    /// Voice samples fingerprinted and stored to disk
    pub voice_samples_stored: u64,

    /// Detailed metrics for each API endpoint (keyed by "METHOD /path")
    pub endpoint_metrics: HashMap<String, EndpointMetric>,
}

/// Detailed performance metrics for a specific API endpoint.
#[derive(Debug, Default, Clone)]
pub struct EndpointMetric {
    /// Number of requests to this specific endpoint
    pub request_count: u64,

    /// Total time spent processing all requests to this endpoint (milliseconds)
    pub total_duration_ms: u64,

    /// Number of errors that occurred for this endpoint
    pub error_count: u64,
}

impl AppState {
    /// Create a new AppState with the given configuration.
    ///
    /// The capture handle is created stopped; `main` decides whether to start
    /// it based on `config.capture.enabled`.
    pub fn new(config: AppConfig) -> Self {
        let capture = MicrophoneCapture::new(config.capture.clone(), config.storage.capture_dir.clone());
        Self {
            config: Arc::new(RwLock::new(config)),
            metrics: Arc::new(RwLock::new(AppMetrics::default())),
            speech: Arc::new(SpeechClient::new()),
            capture,
            start_time: Instant::now(),
        }
    }

    /// Get a copy of the current configuration.
    ///
    /// Cloning releases the read lock immediately, so other threads aren't
    /// blocked while the caller works with the snapshot.
    pub fn get_config(&self) -> AppConfig {
        self.config.read().unwrap().clone()
    }

    /// Update the configuration with validation.
    ///
    /// Configuration is validated before updating so the shared config is
    /// always in a valid state.
    pub fn update_config(&self, new_config: AppConfig) -> Result<(), String> {
        match new_config.validate() {
            Ok(_) => {
                *self.config.write().unwrap() = new_config;
                Ok(())
            }
            Err(e) => Err(e.to_string()),
        }
    }

    /// Increment the total request counter (called by middleware for every request).
    pub fn increment_request_count(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.request_count += 1;
    }

    /// Increment the total error counter (called when any request fails).
    pub fn increment_error_count(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.error_count += 1;
    }

    /// Record that a transcription round-trip to the upstream API succeeded.
    pub fn record_transcription(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.transcriptions_completed += 1;
    }

    /// Record that a speech synthesis round-trip to the upstream API succeeded.
    pub fn record_synthesis(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.syntheses_completed += 1;
    }

    /// Record that a voice sample was fingerprinted and written to disk.
    pub fn record_sample_stored(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.voice_samples_stored += 1;
    }

    /// Record detailed metrics for a specific endpoint.
    ///
    /// ## Parameters:
    /// - **endpoint**: The API endpoint (e.g., "POST /transcribe")
    /// - **duration_ms**: How long the request took to process (in milliseconds)
    /// - **is_error**: Whether this request resulted in an error
    pub fn record_endpoint_request(&self, endpoint: &str, duration_ms: u64, is_error: bool) {
        let mut metrics = self.metrics.write().unwrap();

        let endpoint_metric = metrics.endpoint_metrics.entry(endpoint.to_string()).or_default();

        endpoint_metric.request_count += 1;
        endpoint_metric.total_duration_ms += duration_ms;

        if is_error {
            endpoint_metric.error_count += 1;
        }
    }

    /// Get a snapshot of current metrics (used for the /metrics endpoint).
    ///
    /// Takes a read lock and clones so the lock isn't held while the HTTP
    /// response is being generated.
    pub fn get_metrics_snapshot(&self) -> AppMetrics {
        let metrics = self.metrics.read().unwrap();
        AppMetrics {
            request_count: metrics.request_count,
            error_count: metrics.error_count,
            transcriptions_completed: metrics.transcriptions_completed,
            syntheses_completed: metrics.syntheses_completed,
            voice_samples_stored: metrics.voice_samples_stored,
            endpoint_metrics: metrics.endpoint_metrics.clone(),
        }
    }

    /// Get server uptime in seconds.
    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl EndpointMetric {
    /// Calculate the average response time for this endpoint.
    pub fn average_duration_ms(&self) -> f64 {
        if self.request_count > 0 {
            self.total_duration_ms as f64 / self.request_count as f64
        } else {
            0.0
        }
    }

    /// Calculate the error rate for this endpoint as a fraction (0.0 to 1.0).
    pub fn error_rate(&self) -> f64 {
        if self.request_count > 0 {
            self.error_count as f64 / self.request_count as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_counters() {
        let state = AppState::new(AppConfig::default());
        state.record_transcription();
        state.record_transcription();
        state.record_synthesis();
        state.record_sample_stored();

        let snapshot = state.get_metrics_snapshot();
        assert_eq!(snapshot.transcriptions_completed, 2);
        assert_eq!(snapshot.syntheses_completed, 1);
        assert_eq!(snapshot.voice_samples_stored, 1);
    }

    #[test]
    fn test_endpoint_metrics() {
        let state = AppState::new(AppConfig::default());
        state.record_endpoint_request("POST /transcribe", 100, false);
        state.record_endpoint_request("POST /transcribe", 300, true);

        let snapshot = state.get_metrics_snapshot();
        let metric = &snapshot.endpoint_metrics["POST /transcribe"];
        assert_eq!(metric.request_count, 2);
        assert_eq!(metric.average_duration_ms(), 200.0);
        assert_eq!(metric.error_rate(), 0.5);
    }

    #[test]
    fn test_update_config_rejects_invalid() {
        let state = AppState::new(AppConfig::default());
        let mut bad = AppConfig::default();
        bad.server.port = 0;
        assert!(state.update_config(bad).is_err());
        // Original config untouched
        assert_eq!(state.get_config().server.port, 8080);
    }
}
