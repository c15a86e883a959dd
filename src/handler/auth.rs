use axum::{
    extract::{Extension, Request},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::constants::ORGANIZATIONS_ADMIN_GROUP;
use crate::domain::organization::Organization;
use crate::handler::errors::ErrorResponse;
use crate::services::jwt_service::{Claims, JwtService};

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub email: String,
    pub username: String,
    pub groups: Vec<String>,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub.parse().unwrap_or(0),
            email: claims.email,
            username: claims.username,
            groups: claims.groups,
        }
    }
}

/// Whether the user may manage every organization in the directory, not
/// just the ones they own.
pub fn is_organizations_admin(user: &AuthenticatedUser) -> bool {
    user.groups.iter().any(|g| g == ORGANIZATIONS_ADMIN_GROUP)
}

/// Owner-or-admin check shared by the update, delete, opening-hours and
/// rooms-available handlers. Admins pass for any organization.
pub fn can_manage(user: &AuthenticatedUser, organization: &Organization) -> bool {
    is_organizations_admin(user) || organization.owner_id == user.user_id
}

/// Middleware that requires JWT authentication
pub async fn require_auth(
    Extension(jwt_service): Extension<Arc<JwtService>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_bearer_token(&headers) {
        Some(token) => token,
        None => {
            return ErrorResponse::unauthorized("Missing authorization header").into_response();
        }
    };

    match jwt_service.verify_token(&token) {
        Ok(claims) => {
            let user = AuthenticatedUser::from(claims);
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(_) => ErrorResponse::unauthorized("Invalid or expired token").into_response(),
    }
}

/// Extract Bearer token from Authorization header or cookies
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && auth_str.starts_with("Bearer ")
        && auth_str.len() > 7
    {
        return Some(auth_str[7..].to_string());
    }

    if let Some(cookie_header) = headers.get("cookie")
        && let Ok(cookie_str) = cookie_header.to_str()
    {
        for cookie in cookie_str.split(';') {
            let cookie = cookie.trim();

            if let Some(token_value) = cookie.strip_prefix("jwt_token=")
                && !token_value.is_empty()
            {
                return Some(token_value.to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user(user_id: i64, groups: Vec<&str>) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id,
            email: "owner@example.com".to_string(),
            username: "owner".to_string(),
            groups: groups.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn test_extract_bearer_token_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer test123"));

        let token = extract_bearer_token(&headers);
        assert_eq!(token, Some("test123".to_string()));
    }

    #[test]
    fn test_extract_bearer_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("jwt_token=test123; other=value"),
        );

        let token = extract_bearer_token(&headers);
        assert_eq!(token, Some("test123".to_string()));
    }

    #[test]
    fn test_extract_bearer_token_empty_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("jwt_token="));

        let token = extract_bearer_token(&headers);
        assert_eq!(token, None);
    }

    #[test]
    fn test_extract_bearer_token_invalid_format() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc123"));

        let token = extract_bearer_token(&headers);
        assert_eq!(token, None);
    }

    #[test]
    fn test_is_organizations_admin() {
        assert!(is_organizations_admin(&user(
            1,
            vec![ORGANIZATIONS_ADMIN_GROUP]
        )));
        assert!(!is_organizations_admin(&user(1, vec![])));
        assert!(!is_organizations_admin(&user(1, vec!["other_group"])));
    }

    #[test]
    fn test_can_manage_owner_or_admin() {
        let org = crate::test_support::organization(10, "Corner Bakery", 1, 5);

        assert!(can_manage(&user(5, vec![]), &org));
        assert!(!can_manage(&user(6, vec![]), &org));
        assert!(can_manage(&user(6, vec![ORGANIZATIONS_ADMIN_GROUP]), &org));
    }
}
