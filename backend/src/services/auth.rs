//! Authentication service for manager accounts and worker invite logins

use std::sync::Arc;

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::token_store::{generate_token, Principal, TokenStore};
use shared::validation::{validate_email, validate_invite_code, validate_password};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    tokens: Arc<dyn TokenStore>,
    token_expiry: i64,
}

/// Input for registering a manager account
#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Input for manager login
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Input for worker login via invite code
#[derive(Debug, Deserialize)]
pub struct WorkerLoginInput {
    pub invite_code: String,
}

/// Session issued after a successful login
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub actor: SessionActor,
}

/// Who the session was issued to
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionActor {
    Manager {
        user_id: Uuid,
        name: String,
        email: String,
        is_admin: bool,
    },
    Worker {
        worker_id: Uuid,
        shop_id: Uuid,
        first_name: String,
    },
}

/// Manager account row
#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub is_admin: bool,
}

/// Public view of a manager account
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct InviteRow {
    worker_id: Uuid,
    shop_id: Uuid,
    expires_at: DateTime<Utc>,
    first_name: String,
    is_active: bool,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, tokens: Arc<dyn TokenStore>, config: &Config) -> Self {
        Self {
            db,
            tokens,
            token_expiry: config.auth.token_expiry,
        }
    }

    /// Register a new manager account
    pub async fn register(&self, input: RegisterInput) -> AppResult<UserProfile> {
        if let Err(msg) = validate_email(&input.email) {
            return Err(AppError::validation(
                "email",
                msg,
                "Barua pepe si sahihi",
            ));
        }
        if let Err(msg) = validate_password(&input.password) {
            return Err(AppError::validation(
                "password",
                msg,
                "Nenosiri lazima liwe na herufi 8 au zaidi",
            ));
        }
        if input.name.trim().is_empty() {
            return Err(AppError::validation(
                "name",
                "Name is required",
                "Jina linahitajika",
            ));
        }

        let existing = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(&input.email)
        .fetch_one(&self.db)
        .await?;

        if existing {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO users (email, password_hash, name, is_admin)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, is_admin, created_at
            "#,
        )
        .bind(&input.email)
        .bind(&password_hash)
        .bind(input.name.trim())
        .bind(input.is_admin)
        .fetch_one(&self.db)
        .await?;

        Ok(profile)
    }

    /// Authenticate a manager with email and password
    pub async fn login(&self, input: LoginInput) -> AppResult<SessionResponse> {
        let user = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, name, is_admin FROM users WHERE email = $1",
        )
        .bind(&input.email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        let valid = verify(&input.password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let token = generate_token();
        self.tokens.put(
            &token,
            Principal::Manager { user_id: user.id },
            self.token_expiry,
        );

        Ok(SessionResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_expiry,
            actor: SessionActor::Manager {
                user_id: user.id,
                name: user.name,
                email: user.email,
                is_admin: user.is_admin,
            },
        })
    }

    /// Authenticate a worker with an invite code
    pub async fn worker_login(&self, input: WorkerLoginInput) -> AppResult<SessionResponse> {
        let code = input.invite_code.trim().to_uppercase();
        if validate_invite_code(&code).is_err() {
            return Err(AppError::validation(
                "invite_code",
                "Invite code must be 8 uppercase alphanumeric characters",
                "Namba ya mwaliko lazima iwe herufi kubwa au tarakimu 8",
            ));
        }

        let invite = sqlx::query_as::<_, InviteRow>(
            r#"
            SELECT it.worker_id, it.shop_id, it.expires_at, w.first_name, w.is_active
            FROM invite_tokens it
            JOIN workers w ON w.id = it.worker_id
            WHERE it.code = $1
            "#,
        )
        .bind(&code)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidToken)?;

        if invite.expires_at <= Utc::now() {
            return Err(AppError::InviteExpired);
        }

        if !invite.is_active {
            return Err(AppError::Unauthorized {
                message: "Worker account is deactivated".to_string(),
                message_sw: "Akaunti ya mfanyakazi imesitishwa".to_string(),
            });
        }

        let token = generate_token();
        self.tokens.put(
            &token,
            Principal::Worker {
                worker_id: invite.worker_id,
                shop_id: invite.shop_id,
            },
            self.token_expiry,
        );

        Ok(SessionResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_expiry,
            actor: SessionActor::Worker {
                worker_id: invite.worker_id,
                shop_id: invite.shop_id,
                first_name: invite.first_name,
            },
        })
    }

    /// Invalidate a session token
    pub fn logout(&self, token: &str) {
        self.tokens.delete(token);
    }

    /// Fetch the profile for a manager account
    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<UserProfile> {
        sqlx::query_as::<_, UserProfile>(
            "SELECT id, email, name, is_admin, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))
    }
}
