use axum::{
    Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use crate::handler::auth::AuthenticatedUser;
use crate::handler::errors::ErrorResponse;
use crate::repository::sqlx_impl::PgUserRepository;
use crate::services::user_service::{AuthResponse, LoginRequest, RegisterRequest, UserService};

type UserSvc = UserService<PgUserRepository>;

/// POST /api/register
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid registration data")
    ),
    tag = "auth"
)]
pub async fn register_api(
    Extension(service): Extension<Arc<UserSvc>>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    match service.register(payload).await {
        Ok(auth) => (StatusCode::CREATED, Json(auth)).into_response(),
        Err(e) => ErrorResponse::bad_request(&e.to_string()).into_response(),
    }
}

/// POST /api/login
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login_api(
    Extension(service): Extension<Arc<UserSvc>>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    match service.login(payload.identity, payload.password).await {
        Ok(auth) => Json(auth).into_response(),
        Err(e) => ErrorResponse::unauthorized(&e.to_string()).into_response(),
    }
}

/// GET /api/me
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "The authenticated user"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me_api(Extension(user): Extension<AuthenticatedUser>) -> impl IntoResponse {
    Json(serde_json::json!({
        "user_id": user.user_id,
        "email": user.email,
        "username": user.username,
        "groups": user.groups,
    }))
}
