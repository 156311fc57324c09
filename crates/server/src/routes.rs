use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use common::types::Health;
use configs::HttpConfig;
use service::books::BookRepository;
use service::storage::StoreState;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::metrics;
use crate::openapi::ApiDoc;

pub mod books;

/// Shared handler state.
#[derive(Clone)]
pub struct ServerState {
    pub books: Arc<dyn BookRepository>,
}

impl ServerState {
    pub fn new(books: Arc<dyn BookRepository>) -> Self {
        Self { books }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "OK", body = crate::openapi::HealthResponse))
)]
pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

/// 200 once the collection is loaded, 503 while loading or after a failed load.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Collection loaded"),
        (status = 503, description = "Collection not loaded")
    )
)]
pub async fn readiness(State(state): State<ServerState>) -> (StatusCode, Json<Health>) {
    let current = state.books.status();
    let code = if current == StoreState::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(Health::with_status(current.name())))
}

/// Build the full application router: books CRUD, health checks, metrics, docs and static files
pub fn build_router(state: ServerState, cors: CorsLayer, http: &HttpConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/books", get(books::list).post(books::create))
        .route("/books/:id", get(books::get).put(books::replace).delete(books::delete));

    if http.docs {
        router = router
            .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    router
        .fallback_service(ServeDir::new(&http.static_dir))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
