use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;
use std::path::Path;
use std::process;

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let metrics = state.get_metrics_snapshot();
    let config = state.get_config();
    let uptime_seconds = state.get_uptime_seconds();

    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds,
        "service": {
            "name": "audio-api-backend",
            "version": env!("CARGO_PKG_VERSION"),
            "host": config.server.host,
            "port": config.server.port
        },
        "metrics": {
            "total_requests": metrics.request_count,
            "total_errors": metrics.error_count,
            "error_rate": if metrics.request_count > 0 {
                metrics.error_count as f64 / metrics.request_count as f64
            } else {
                0.0
            },
            "transcriptions_completed": metrics.transcriptions_completed,
            "syntheses_completed": metrics.syntheses_completed,
            "voice_samples_stored": metrics.voice_samples_stored
        },
        "upstream": {
            "api_base_url": config.speech.api_base_url,
            "api_key": if config.speech.api_key.is_empty() { "not set" } else { "set" },
            "transcription_model": config.speech.transcription_model,
            "speech_model": config.speech.speech_model
        },
        "capture": {
            "running": state.capture.is_running(),
            "chunks_written": state.capture.chunks_written()
        },
        "memory": get_memory_info()
    }))
}

pub async fn detailed_metrics(state: web::Data<AppState>) -> HttpResponse {
    let metrics = state.get_metrics_snapshot();
    let config = state.get_config();
    let uptime_seconds = state.get_uptime_seconds();

    let mut endpoint_stats = Vec::new();
    for (endpoint, metric) in metrics.endpoint_metrics.iter() {
        endpoint_stats.push(json!({
            "endpoint": endpoint,
            "request_count": metric.request_count,
            "error_count": metric.error_count,
            "error_rate": metric.error_rate(),
            "average_duration_ms": metric.average_duration_ms(),
            "total_duration_ms": metric.total_duration_ms
        }));
    }

    HttpResponse::Ok().json(json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds,
        "overall": {
            "total_requests": metrics.request_count,
            "total_errors": metrics.error_count,
            "error_rate": if metrics.request_count > 0 {
                metrics.error_count as f64 / metrics.request_count as f64
            } else {
                0.0
            },
            "requests_per_second": if uptime_seconds > 0 {
                metrics.request_count as f64 / uptime_seconds as f64
            } else {
                0.0
            },
            "transcriptions_completed": metrics.transcriptions_completed,
            "syntheses_completed": metrics.syntheses_completed,
            "voice_samples_stored": metrics.voice_samples_stored
        },
        "endpoints": endpoint_stats,
        "storage": get_storage_info(&config),
        "memory": get_memory_info()
    }))
}

fn get_memory_info() -> serde_json::Value {
    let pid = process::id();

    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string(format!("/proc/{}/status", pid)) {
            let mut vm_rss = 0;
            let mut vm_size = 0;

            for line in status.lines() {
                if line.starts_with("VmRSS:") {
                    if let Some(kb_str) = line.split_whitespace().nth(1) {
                        vm_rss = kb_str.parse::<u64>().unwrap_or(0) * 1024;
                    }
                } else if line.starts_with("VmSize:") {
                    if let Some(kb_str) = line.split_whitespace().nth(1) {
                        vm_size = kb_str.parse::<u64>().unwrap_or(0) * 1024;
                    }
                }
            }

            return json!({
                "resident_memory_bytes": vm_rss,
                "virtual_memory_bytes": vm_size,
                "available": true
            });
        }
    }

    json!({
        "resident_memory_bytes": 0,
        "virtual_memory_bytes": 0,
        "available": false,
        "note": "Memory info not available on this platform"
    })
}

fn get_storage_info(config: &crate::config::AppConfig) -> serde_json::Value {
    let dirs = [
        ("recordings", &config.storage.recordings_dir),
        ("fingerprints", &config.storage.fingerprints_dir),
        ("capture", &config.storage.capture_dir),
    ];

    let mut storage = serde_json::Map::new();
    for (name, dir) in dirs {
        let path = Path::new(dir);
        let file_count = std::fs::read_dir(path)
            .map(|entries| entries.count())
            .unwrap_or(0);

        storage.insert(
            name.to_string(),
            json!({
                "path": dir,
                "exists": path.is_dir(),
                "file_count": file_count
            }),
        );
    }

    serde_json::Value::Object(storage)
}
