use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};

use crate::{auth_middleware::Caller, error::ApiError, server::AppState};

pub fn schedule_router() -> Router<AppState> {
    Router::new().route(
        "/api/schedules/{schedule_id}",
        get(get_schedule_handler).delete(delete_schedule_handler),
    )
}

/// Open to anyone. With a valid token the view says whether the caller owns it.
async fn get_schedule_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(schedule_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let schedule = state
        .service
        .get_schedule(caller.identity(), &schedule_id)
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "schedule": schedule })))
}

async fn delete_schedule_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(schedule_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .service
        .delete_schedule(caller.identity(), &schedule_id)
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "schedule deleted",
    })))
}
