use anyhow::{Result, anyhow};
use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString},
};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordVerifier};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::constants::MIN_PASSWORD_LENGTH;
use crate::repository::{NewUser, UserRepository};
use crate::services::jwt_service::JwtService;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub user_id: i64,
    pub external_id: Uuid,
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "username")]
    pub username: String,
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Email address or username.
    pub identity: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(Clone)]
pub struct UserService<U: UserRepository> {
    pub user_repo: Arc<U>,
    pub jwt_service: Arc<JwtService>,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(user_repo: Arc<U>, jwt_service: Arc<JwtService>) -> Self {
        Self {
            user_repo,
            jwt_service,
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse> {
        let email_re = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex");
        if !email_re.is_match(&req.email) {
            return Err(anyhow!("invalid email address"));
        }
        if req.username.trim().is_empty() {
            return Err(anyhow!("username cannot be empty"));
        }
        if req.password.len() < MIN_PASSWORD_LENGTH {
            return Err(anyhow!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            ));
        }
        if self.user_repo.find_by_email(&req.email).await?.is_some() {
            return Err(anyhow!("email already registered"));
        }
        if self
            .user_repo
            .find_by_username(&req.username)
            .await?
            .is_some()
        {
            return Err(anyhow!("username already taken"));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| anyhow!("failed to hash password: {}", e))?
            .to_string();

        let user = self
            .user_repo
            .insert_user(NewUser {
                external_id: Uuid::new_v4(),
                email: req.email,
                username: req.username,
                password_hash,
            })
            .await?;

        let groups: Vec<String> = Vec::new();
        let token =
            self.jwt_service
                .generate_token(user.user_id, &user.email, &user.username, groups.clone())?;

        Ok(AuthResponse {
            user: UserResponse {
                user_id: user.user_id,
                external_id: user.external_id,
                email: user.email,
                username: user.username,
                groups,
            },
            token,
        })
    }

    /// Logs in by email or username; the error message does not reveal
    /// which of the two was wrong.
    pub async fn login(&self, identity: String, password: String) -> Result<AuthResponse> {
        let user = if identity.contains('@') {
            self.user_repo.find_by_email(&identity).await?
        } else {
            self.user_repo.find_by_username(&identity).await?
        };
        let user = user.ok_or_else(|| anyhow!("invalid credentials"))?;

        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| anyhow!("corrupt password hash: {}", e))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| anyhow!("invalid credentials"))?;

        let groups: Vec<String> = self
            .user_repo
            .get_user_groups(user.user_id)
            .await?
            .into_iter()
            .map(|g| g.name)
            .collect();

        let token =
            self.jwt_service
                .generate_token(user.user_id, &user.email, &user.username, groups.clone())?;

        Ok(AuthResponse {
            user: UserResponse {
                user_id: user.user_id,
                external_id: user.external_id,
                email: user.email,
                username: user.username,
                groups,
            },
            token,
        })
    }

    pub async fn get_user_email(&self, user_id: i64) -> Result<Option<String>> {
        Ok(self
            .user_repo
            .find_by_id(user_id)
            .await?
            .map(|u| u.email))
    }
}
