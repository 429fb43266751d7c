//! # Capture Management REST API Handlers
//!
//! Start, stop, and inspect the simulated microphone capture loop.
//!
//! ## Available Endpoints:
//! - `POST /api/v1/capture/start` - Start the background capture loop
//! - `POST /api/v1/capture/stop` - Stop the background capture loop
//! - `GET /api/v1/capture/status` - Current capture state

use crate::error::AppResult;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;

/// Start the simulated capture loop.
///
/// Starting an already-running capture is not an error; the response just
/// reports that nothing changed.
pub async fn start_capture(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let started = state.capture.start();

    Ok(HttpResponse::Ok().json(json!({
        "status": if started { "started" } else { "already_running" },
        "output_dir": state.capture.output_dir().display().to_string(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Stop the simulated capture loop.
pub async fn stop_capture(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let stopped = state.capture.stop();

    Ok(HttpResponse::Ok().json(json!({
        "status": if stopped { "stopped" } else { "not_running" },
        "chunks_written": state.capture.chunks_written(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Report the current capture state.
pub async fn capture_status(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let config = state.get_config();

    Ok(HttpResponse::Ok().json(json!({
        "running": state.capture.is_running(),
        "chunks_written": state.capture.chunks_written(),
        "output_dir": state.capture.output_dir().display().to_string(),
        "chunk_seconds": config.capture.chunk_seconds,
        "sample_rate": config.capture.sample_rate,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_capture_lifecycle_over_http() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage.capture_dir = tmp.path().to_str().unwrap().to_string();
        let state = AppState::new(config);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/capture/start", web::post().to(start_capture))
                .route("/capture/stop", web::post().to(stop_capture))
                .route("/capture/status", web::get().to(capture_status)),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri("/capture/start").to_request(),
        )
        .await;
        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "started");

        // Second start reports already_running
        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri("/capture/start").to_request(),
        )
        .await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "already_running");

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/capture/status").to_request(),
        )
        .await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["running"], true);

        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri("/capture/stop").to_request(),
        )
        .await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "stopped");
    }
}
