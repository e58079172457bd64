use std::collections::HashSet;
use std::sync::Arc;

use axum::Router;
use axum::middleware;
use http::header;
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::{
    ServiceBuilderExt,
    cors::{AllowOrigin, Any, CorsLayer},
    propagate_header::PropagateHeaderLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_docs::ApiDoc;
use crate::audit::AuditSink;
use crate::config::Config;
use crate::extractor::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};
use crate::middleware::http_logger::http_logger;
use crate::routes;
use crate::services::{
    AllocationService, AttendanceService, BatchService, CompletionBackfill, InterviewService,
    ScheduleService, ScoredRecordService,
};

/// Shared handles for every router. Services are cheap to clone behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub batches: Arc<BatchService>,
    pub allocations: Arc<AllocationService>,
    pub schedule: Arc<ScheduleService>,
    pub attendance: Arc<AttendanceService>,
    pub scored_records: Arc<ScoredRecordService>,
    pub interviews: Arc<InterviewService>,
    pub backfill: Arc<CompletionBackfill>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            batches: Arc::new(BatchService::new(db.clone(), audit.clone())),
            allocations: Arc::new(AllocationService::new(db.clone(), audit.clone())),
            schedule: Arc::new(ScheduleService::new(db.clone(), audit.clone())),
            attendance: Arc::new(AttendanceService::new(db.clone(), audit.clone())),
            scored_records: Arc::new(ScoredRecordService::new(db.clone(), audit.clone())),
            interviews: Arc::new(InterviewService::new(db.clone(), audit.clone())),
            backfill: Arc::new(CompletionBackfill::new(db.clone(), audit)),
            db,
        }
    }
}

fn cors_layer(cors_allowed_origins: &str) -> CorsLayer {
    let allowed_headers = [
        header::CONTENT_TYPE,
        header::AUTHORIZATION,
        header::ACCEPT,
        header::ACCEPT_LANGUAGE,
        header::HeaderName::from_static(ACTOR_ID_HEADER),
        header::HeaderName::from_static(ACTOR_ROLE_HEADER),
    ];

    let allowed_methods = [
        http::Method::GET,
        http::Method::POST,
        http::Method::PUT,
        http::Method::DELETE,
        http::Method::PATCH,
        http::Method::OPTIONS,
    ];

    if cors_allowed_origins == "*" {
        // Credentials cannot be combined with a wildcard origin.
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(allowed_methods)
            .allow_headers(allowed_headers)
            .allow_credentials(false)
    } else {
        let allowed_origins: HashSet<String> = cors_allowed_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let origins: Vec<http::HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(allowed_methods)
            .allow_headers(allowed_headers)
            .allow_credentials(true)
    }
}

pub fn create_app(state: AppState, config: &Config) -> Router {
    let mut router = Router::new()
        .merge(routes::health::create_route())
        .merge(routes::batches::create_route())
        .merge(routes::allocations::create_route())
        .merge(routes::schedule::create_route())
        .merge(routes::attendance::create_route())
        .merge(routes::scored_records::create_route())
        .merge(routes::interviews::create_route())
        .merge(routes::maintenance::create_route())
        .with_state(state);

    if config.swagger_enabled {
        let swagger_ui =
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());
        router = router.merge(swagger_ui);
    }

    let sensitive_headers: Arc<[_]> = vec![header::AUTHORIZATION, header::COOKIE].into();

    // from_fn middleware is layered on the router; ServiceBuilder only takes tower layers.
    let router = router.layer(middleware::from_fn(http_logger));

    let middleware = ServiceBuilder::new()
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(PropagateHeaderLayer::new(header::HeaderName::from_static(
            "x-request-id",
        )))
        .sensitive_request_headers(sensitive_headers.clone())
        .sensitive_response_headers(sensitive_headers)
        .compression();

    router.layer(middleware)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::test_support::{memory_sink, seed_selected_candidate, setup_test_db};

    fn test_config() -> Config {
        Config {
            port: 0,
            swagger_enabled: false,
            log_level: "info".to_string(),
            database_url: "sqlite::memory:".to_string(),
            app_env: "test".to_string(),
            cors_allowed_origins: "*".to_string(),
            audit_buffer_size: 16,
        }
    }

    async fn test_app() -> (Router, DatabaseConnection) {
        let db = setup_test_db().await;
        let state = AppState::new(db.clone(), memory_sink());
        (create_app(state, &test_config()), db)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(ACTOR_ID_HEADER, "coordinator-1")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_database_up() {
        let (app, _db) = test_app().await;

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["database"], "up");
    }

    #[tokio::test]
    async fn test_mutation_without_actor_is_unauthorized() {
        let (app, _db) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/batches")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({
                            "name": "B",
                            "start_date": "2025-01-06",
                            "approx_close_date": "2025-03-28"
                        }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_second_active_allocation_is_conflict() {
        let (app, db) = test_app().await;
        let candidate = seed_selected_candidate(&db, "Asha", None).await;

        let mut batch_ids = Vec::new();
        for name in ["Morning", "Evening"] {
            let response = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/api/v1/batches",
                    json!({
                        "name": name,
                        "start_date": "2025-01-06",
                        "approx_close_date": "2025-03-28",
                        "status": "running"
                    }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
            let body = body_json(response).await;
            batch_ids.push(body["external_id"].as_str().unwrap().to_string());
        }

        let first = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/allocations",
                json!({"batch_id": batch_ids[0], "candidate_id": candidate.external_id}),
            ))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app
            .oneshot(json_request(
                "POST",
                "/api/v1/allocations",
                json!({"batch_id": batch_ids[1], "candidate_id": candidate.external_id}),
            ))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(second).await["kind"], "conflict");
    }

    #[tokio::test]
    async fn test_unknown_batch_is_not_found() {
        let (app, _db) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/batches/00000000-0000-0000-0000-000000000000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
