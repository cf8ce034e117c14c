use {
    agenda_scheduling::SignupRequest,
    axum::{
        Json, Router,
        extract::{Path, State, rejection::JsonRejection},
        http::StatusCode,
        response::IntoResponse,
        routing::{get, post},
    },
};

use crate::{auth_middleware::Caller, error::ApiError, server::AppState};

pub fn user_router() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(signup_handler))
        .route(
            "/api/users/{user_id}",
            get(user_exists_handler).delete(delete_user_handler),
        )
        .route("/api/users/{user_id}/schedules", get(user_schedules_handler))
        .route("/api/users/{user_id}/export", get(export_user_handler))
}

async fn signup_handler(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let outcome = state.service.signup(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "user": outcome.user,
            "default_calendar": outcome.default_calendar,
        })),
    ))
}

async fn user_exists_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let existence = state.service.user_exists(&user_id).await?;
    Ok(Json(existence))
}

async fn delete_user_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.delete_user(caller.identity(), &user_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn user_schedules_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let schedules = state
        .service
        .list_schedules_for_user(caller.identity(), &user_id)
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "user_id": user_id,
        "schedules": schedules,
    })))
}

async fn export_user_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let export = state.service.export_user(caller.identity(), &user_id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "user_info": export.user_info,
        "statistics": export.statistics,
        "data": {
            "calendars": export.calendars,
            "schedules": export.schedules,
        },
    })))
}
