pub mod auth;
pub mod dashboard;
pub mod dto;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod uploads;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;
use dto::MessageResponse;
use state::AppState;

pub use middleware::require_auth;
pub use rest::ApiDoc;

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

async fn root_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "AI Mock Interview API is running".to_string(),
    })
}

/// Builds the complete application router: public and protected API routes,
/// stored media, and the Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let config = app_state.config.clone();

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(root_handler))
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/voice/status", get(uploads::voice_status_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/resume/upload", post(uploads::resume_upload_handler))
        .route("/voice/upload", post(uploads::voice_upload_handler))
        .route("/interviews/start", post(rest::start_session_handler))
        .route("/interviews/answer", post(rest::submit_answer_handler))
        .route("/interviews/end", post(rest::end_session_handler))
        .route("/interviews/{id}", get(rest::get_session_handler))
        .route("/interviews/{id}/report", get(rest::session_report_handler))
        .route("/dashboard/stats", get(dashboard::dashboard_stats_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(
            config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES,
        ))
        .with_state(app_state);

    Ok(Router::new()
        .merge(api_router)
        .nest_service("/media", ServeDir::new(&config.storage_root))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}
