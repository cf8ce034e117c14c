use {
    agenda_scheduling::LoginRequest,
    axum::{
        Json, Router,
        extract::{State, rejection::JsonRejection},
        response::IntoResponse,
        routing::post,
    },
};

use crate::{auth_middleware::Caller, error::ApiError, server::AppState};

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", post(logout_handler))
}

async fn login_handler(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let outcome = state.service.login(req).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "token": outcome.token,
        "user": outcome.user,
    })))
}

/// Tokens are the whole session, so there is nothing to drop server-side.
async fn logout_handler(caller: Caller) -> impl IntoResponse {
    if let Some(identity) = caller.identity() {
        tracing::debug!(user_id = %identity.user_id, "logout");
    }
    Json(serde_json::json!({ "success": true, "message": "logged out" }))
}
