use crate::state::AppState;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    web, Error,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    time::Instant,
};

/// Per-request metrics collection.
///
/// Increments the global request counter on the way in and records the
/// endpoint, duration, and error outcome on the way out. Reads of the
/// metrics endpoint itself are excluded so a scrape doesn't shift the
/// numbers it reports.
pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService { service }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let path = req.uri().path().to_string();
        let endpoint = format!("{} {}", req.method(), path);
        let record = !is_metrics_scrape(&path);

        if record {
            if let Some(app_state) = req.app_data::<web::Data<AppState>>() {
                app_state.increment_request_count();
            }
        }

        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;
            let duration_ms = start_time.elapsed().as_millis() as u64;

            let is_error = match &result {
                Ok(response) => counts_as_error(response.status()),
                Err(_) => true,
            };

            if record {
                if let Ok(response) = &result {
                    if let Some(app_state) = response.request().app_data::<web::Data<AppState>>() {
                        app_state.record_endpoint_request(&endpoint, duration_ms, is_error);

                        if is_error {
                            app_state.increment_error_count();
                        }
                    }
                }
            }

            result
        })
    }
}

/// Reading the metrics endpoint must not change the metrics being read.
fn is_metrics_scrape(path: &str) -> bool {
    path.ends_with("/metrics")
}

/// 4xx counts as an error alongside 5xx: for this service a client error
/// almost always means a malformed audio upload or synthesis request, which
/// is exactly what the error counters exist to surface.
fn counts_as_error(status: StatusCode) -> bool {
    status.is_client_error() || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use actix_web::{App, HttpResponse};

    #[test]
    fn test_error_status_policy() {
        assert!(!counts_as_error(StatusCode::OK));
        assert!(!counts_as_error(StatusCode::FOUND));
        assert!(counts_as_error(StatusCode::BAD_REQUEST));
        assert!(counts_as_error(StatusCode::NOT_FOUND));
        assert!(counts_as_error(StatusCode::BAD_GATEWAY));
    }

    #[test]
    fn test_metrics_scrape_detection() {
        assert!(is_metrics_scrape("/api/v1/metrics"));
        assert!(!is_metrics_scrape("/transcribe"));
        assert!(!is_metrics_scrape("/api/v1/config"));
    }

    #[actix_web::test]
    async fn test_counts_requests_but_not_metrics_scrapes() {
        let state = AppState::new(AppConfig::default());
        let app = actix_web::test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .wrap(MetricsMiddleware)
                .route(
                    "/boom",
                    web::get().to(|| async { HttpResponse::BadRequest().finish() }),
                )
                .route(
                    "/api/v1/metrics",
                    web::get().to(|| async { HttpResponse::Ok().finish() }),
                ),
        )
        .await;

        let req = actix_web::test::TestRequest::get().uri("/boom").to_request();
        actix_web::test::call_service(&app, req).await;

        let snapshot = state.get_metrics_snapshot();
        assert_eq!(snapshot.request_count, 1);
        assert_eq!(snapshot.error_count, 1);
        assert_eq!(snapshot.endpoint_metrics["GET /boom"].error_count, 1);

        // A metrics scrape leaves the counters untouched
        let req = actix_web::test::TestRequest::get()
            .uri("/api/v1/metrics")
            .to_request();
        actix_web::test::call_service(&app, req).await;

        let snapshot = state.get_metrics_snapshot();
        assert_eq!(snapshot.request_count, 1);
        assert!(!snapshot.endpoint_metrics.contains_key("GET /api/v1/metrics"));
    }
}
