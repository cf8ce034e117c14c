use {
    agenda_scheduling::{CalendarRequest, ScheduleRequest},
    axum::{
        Json, Router,
        extract::{Path, State, rejection::JsonRejection},
        http::StatusCode,
        response::IntoResponse,
        routing::{delete, get},
    },
};

use crate::{auth_middleware::Caller, error::ApiError, server::AppState};

pub fn calendar_router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/calendars",
            get(list_calendars_handler).post(create_calendar_handler),
        )
        .route("/api/calendars/{code}", delete(delete_calendar_handler))
        .route("/api/calendars/{code}/exists", get(calendar_exists_handler))
        .route(
            "/api/calendars/{code}/schedules",
            get(calendar_schedules_handler).post(create_schedule_handler),
        )
}

async fn list_calendars_handler(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse, ApiError> {
    let calendars = state.service.list_calendars(caller.identity()).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "calendars": calendars,
    })))
}

async fn create_calendar_handler(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<CalendarRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let calendar = state
        .service
        .create_calendar(caller.identity(), req)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "calendar": calendar })),
    ))
}

async fn calendar_exists_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.service.calendar_exists(&code).await?))
}

async fn delete_calendar_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .service
        .delete_calendar(caller.identity(), &code)
        .await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn calendar_schedules_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let schedules = state
        .service
        .list_schedules_for_calendar(caller.identity(), &code)
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "calendar_code": code,
        "schedules": schedules,
    })))
}

async fn create_schedule_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(code): Path<String>,
    body: Result<Json<ScheduleRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let schedule = state
        .service
        .create_schedule(caller.identity(), &code, req)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "schedule": schedule })),
    ))
}
