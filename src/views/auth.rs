use axum::{
    extract::{Extension, Form},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect},
};
use std::sync::Arc;
use tera::Context;

use crate::repository::sqlx_impl::PgUserRepository;
use crate::services::user_service::{RegisterRequest, UserService};

type UserServiceType = UserService<PgUserRepository>;

#[derive(serde::Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(serde::Deserialize)]
pub struct LoginForm {
    pub identity: String,
    pub password: String,
}

fn session_cookie(token: &str) -> HeaderMap {
    let cookie_value = format!(
        "jwt_token={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600"
    );
    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::SET_COOKIE,
        axum::http::HeaderValue::from_str(&cookie_value).expect("valid cookie"),
    );
    headers
}

/// GET /register
pub async fn register_page(Extension(tmpl): Extension<tera::Tera>) -> impl IntoResponse {
    let mut ctx = Context::new();
    ctx.insert("title", "Register");
    let body = tmpl.render("register.html", &ctx).unwrap();
    Html(body)
}

/// POST /register
pub async fn register_post(
    Extension(service): Extension<Arc<UserServiceType>>,
    Extension(tmpl): Extension<tera::Tera>,
    Form(payload): Form<RegisterForm>,
) -> impl IntoResponse {
    let req = RegisterRequest {
        email: payload.email,
        username: payload.username,
        password: payload.password,
    };

    match service.register(req).await {
        Ok(auth_response) => {
            let headers = session_cookie(&auth_response.token);
            (StatusCode::SEE_OTHER, headers, Redirect::to("/organizations")).into_response()
        }
        Err(e) => {
            let mut ctx = Context::new();
            ctx.insert("title", "Register");
            ctx.insert("error", &format!("{}", e));
            let body = tmpl.render("register.html", &ctx).unwrap();
            (StatusCode::BAD_REQUEST, Html(body)).into_response()
        }
    }
}

/// GET /login
pub async fn login_page(Extension(tmpl): Extension<tera::Tera>) -> impl IntoResponse {
    let mut ctx = Context::new();
    ctx.insert("title", "Login");
    let body = tmpl.render("login.html", &ctx).unwrap();
    Html(body)
}

/// POST /login
pub async fn login_post(
    Extension(service): Extension<Arc<UserServiceType>>,
    Extension(tmpl): Extension<tera::Tera>,
    Form(payload): Form<LoginForm>,
) -> impl IntoResponse {
    match service.login(payload.identity, payload.password).await {
        Ok(auth_response) => {
            let headers = session_cookie(&auth_response.token);
            (StatusCode::SEE_OTHER, headers, Redirect::to("/organizations")).into_response()
        }
        Err(e) => {
            let mut ctx = Context::new();
            ctx.insert("title", "Login");
            ctx.insert("error", &format!("{}", e));
            let body = tmpl.render("login.html", &ctx).unwrap();
            (StatusCode::UNAUTHORIZED, Html(body)).into_response()
        }
    }
}

/// GET /logout
pub async fn logout() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::SET_COOKIE,
        axum::http::HeaderValue::from_static("jwt_token=; Path=/; HttpOnly; Max-Age=0"),
    );
    (StatusCode::SEE_OTHER, headers, Redirect::to("/login")).into_response()
}
