//! # Audio API Backend - Main Application Entry Point
//!
//! HTTP service exposing speech-to-text, text-to-speech, and a simulated
//! voice-cloning endpoint, backed entirely by an upstream OpenAI-compatible
//! speech API. There is no local signal processing: audio is relayed
//! upstream or stored to disk.
//!
//! ## Application Architecture:
//! - **config**: Application configuration (TOML files + environment variables)
//! - **state**: Shared application state and metrics
//! - **speech**: Client for the upstream transcription/synthesis API
//! - **cloning**: Voice fingerprinting, sample storage, placeholder synthesis
//! - **capture**: Simulated always-on microphone capture
//! - **health**: System health monitoring endpoints
//! - **middleware**: Request logging and metrics collection
//! - **handlers**: HTTP request handlers for API endpoints
//! - **error**: Custom error types and HTTP error responses
//!
//! This repository is a vulnerability-testing fixture: it deliberately omits
//! rate limiting, abuse detection, consent checks, and encryption-at-rest,
//! and it logs full transcripts. Do not deploy it anywhere real.

mod capture;     // Simulated microphone capture (capture/ directory)
mod cloning;     // Voice fingerprinting and storage (cloning/ directory)
mod config;      // Configuration management (config.rs)
mod error;       // Error handling types (error.rs)
mod handlers;    // HTTP request handlers (handlers/ directory)
mod health;      // Health check endpoints (health.rs)
mod middleware;  // Custom middleware (middleware/ directory)
mod speech;      // Upstream speech API client (speech/ directory)
mod state;       // Application state management (state.rs)

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use config::AppConfig;
use state::AppState;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Global shutdown signal set by the signal handlers and polled by main.
static SHUTDOWN_SIGNAL: AtomicBool = AtomicBool::new(false);

/// The main application entry point.
///
/// ## What this function does:
/// 1. **Loads configuration** from files and environment variables
/// 2. **Sets up logging** for debugging and monitoring
/// 3. **Creates shared application state** that all requests can access
/// 4. **Optionally starts the simulated capture loop**
/// 5. **Configures the HTTP server** with middleware and routes
/// 6. **Handles graceful shutdown** when receiving system signals
#[actix_web::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load()?;
    config.validate()?;

    info!("Starting audio-api-backend v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded: {}:{}", config.server.host, config.server.port);
    info!("Upstream speech API: {}", config.speech.api_base_url);
    if config.speech.api_key.is_empty() {
        info!("No upstream API key configured; transcribe/speak requests will fail upstream");
    }

    let app_state = AppState::new(config.clone());
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    // Simulated always-on microphone: starts at boot only when configured
    if config.capture.enabled {
        app_state.capture.start();
    }

    setup_signal_handlers();

    info!("Starting HTTP server on {}", bind_addr);

    let server_state = app_state.clone();
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(server_state.clone()))
            .wrap(cors)
            .wrap(middleware::MetricsMiddleware)
            .wrap(middleware::RequestLogging)
            // Primary audio API (original public contract, root-level paths)
            .route("/health", web::get().to(health::health_check))
            .route("/transcribe", web::post().to(handlers::transcribe))
            .route("/speak", web::post().to(handlers::speak))
            .route("/clone-voice", web::post().to(handlers::clone_voice))
            // Management API under /api/v1
            .service(
                web::scope("/api/v1")
                    .route("/health", web::get().to(health::health_check))
                    .route("/metrics", web::get().to(health::detailed_metrics))
                    .route("/config", web::get().to(handlers::get_config))
                    .route("/config", web::put().to(handlers::update_config))
                    .route("/clone-voice/samples", web::get().to(handlers::list_voice_samples))
                    .route("/clone-voice/speak", web::post().to(handlers::clone_speak))
                    .route("/capture/start", web::post().to(handlers::start_capture))
                    .route("/capture/stop", web::post().to(handlers::stop_capture))
                    .route("/capture/status", web::get().to(handlers::capture_status)),
            )
    })
    .bind(&bind_addr)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    // Wait for either the server to finish OR a shutdown signal
    tokio::select! {
        result = server_task => {
            match result {
                Ok(server_result) => {
                    if let Err(e) = server_result {
                        error!("Server error: {}", e);
                    }
                }
                Err(e) => {
                    error!("Server task error: {}", e);
                }
            }
        }
        _ = wait_for_shutdown() => {
            info!("Shutdown signal received, stopping server...");
            app_state.capture.stop();
            server_handle.stop(true).await;
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// Initialize the tracing (logging) system for the application.
///
/// ## Environment Variables:
/// - `RUST_LOG`: Controls what gets logged (e.g., "debug", "audio_api_backend=debug")
/// - If not set, defaults to "audio_api_backend=debug,actix_web=info"
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "audio_api_backend=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

/// Set up signal handlers for graceful shutdown.
///
/// Listens for SIGTERM and SIGINT; whichever arrives first sets the global
/// shutdown flag, which lets the server finish in-flight requests before
/// stopping.
fn setup_signal_handlers() {
    tokio::spawn(async {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler");
        let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
            .expect("Failed to install SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }

        SHUTDOWN_SIGNAL.store(true, Ordering::SeqCst);
    });
}

/// Wait for the shutdown signal to be set.
///
/// Simple polling with a 100ms sleep; the flag is only ever flipped once at
/// process shutdown, so nothing fancier is needed.
async fn wait_for_shutdown() {
    while !SHUTDOWN_SIGNAL.load(Ordering::SeqCst) {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }
}
