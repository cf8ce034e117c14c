//! HTTP gateway for the agenda scheduling service.
//!
//! JSON over axum. Callers authenticate with `Authorization: Bearer <token>`
//! where the token comes from `POST /api/auth/login`.

pub mod auth_middleware;
pub mod auth_routes;
pub mod calendar_routes;
pub mod error;
pub mod schedule_routes;
pub mod server;
pub mod user_routes;
