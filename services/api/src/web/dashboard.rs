//! services/api/src/web/dashboard.rs

use axum::{extract::State, Extension, Json};
use interview_core::domain::User;
use std::sync::Arc;

use crate::error::ApiError;
use crate::web::dto::DashboardResponse;
use crate::web::state::AppState;

/// Aggregated progress across all of the caller's sessions.
#[utoipa::path(
    get,
    path = "/dashboard/stats",
    tag = "dashboard",
    responses(
        (status = 200, description = "Dashboard aggregates", body = DashboardResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = []))
)]
pub async fn dashboard_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let stats = state.aggregation.dashboard(user.user_id).await?;
    Ok(Json(stats.into()))
}
