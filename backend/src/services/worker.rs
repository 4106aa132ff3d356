//! Worker management service
//!
//! Workers belong to one shop and log in with single-use-style invite codes
//! generated by their managers.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::Actor;
use shared::validation::validate_tz_phone;

/// Worker service
#[derive(Clone)]
pub struct WorkerService {
    db: PgPool,
    invite_expiry: i64,
}

/// Worker record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Worker {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone_number: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a worker
#[derive(Debug, Deserialize)]
pub struct CreateWorkerInput {
    pub shop_id: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone_number: String,
}

/// Input for updating a worker
#[derive(Debug, Deserialize)]
pub struct UpdateWorkerInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: Option<bool>,
}

/// An active invite code for a worker
#[derive(Debug, Serialize, FromRow)]
pub struct InviteToken {
    pub id: Uuid,
    pub worker_id: Uuid,
    pub shop_id: Uuid,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

const INVITE_CODE_LEN: usize = 8;
const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate an 8-character uppercase alphanumeric invite code
fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..INVITE_CODE_ALPHABET.len());
            INVITE_CODE_ALPHABET[idx] as char
        })
        .collect()
}

impl WorkerService {
    /// Create a new WorkerService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            invite_expiry: config.auth.invite_expiry,
        }
    }

    /// Create a worker for a shop the actor manages
    pub async fn create_worker(&self, actor: &Actor, input: CreateWorkerInput) -> AppResult<Worker> {
        if !actor.can_manage(input.shop_id) {
            return Err(AppError::InsufficientPermissions);
        }

        if input.first_name.trim().is_empty() {
            return Err(AppError::validation(
                "first_name",
                "First name is required",
                "Jina la kwanza linahitajika",
            ));
        }

        if let Err(msg) = validate_tz_phone(&input.phone_number) {
            return Err(AppError::validation(
                "phone_number",
                msg,
                "Namba ya simu si sahihi",
            ));
        }

        let shop_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM shops WHERE id = $1)",
        )
        .bind(input.shop_id)
        .fetch_one(&self.db)
        .await?;

        if !shop_exists {
            return Err(AppError::NotFound("Shop".to_string()));
        }

        let phone_taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM workers WHERE shop_id = $1 AND phone_number = $2)",
        )
        .bind(input.shop_id)
        .bind(&input.phone_number)
        .fetch_one(&self.db)
        .await?;

        if phone_taken {
            return Err(AppError::DuplicateEntry("phone_number".to_string()));
        }

        let worker = sqlx::query_as::<_, Worker>(
            r#"
            INSERT INTO workers (shop_id, first_name, last_name, phone_number)
            VALUES ($1, $2, $3, $4)
            RETURNING id, shop_id, first_name, last_name, phone_number, is_active,
                      created_at, updated_at
            "#,
        )
        .bind(input.shop_id)
        .bind(input.first_name.trim())
        .bind(&input.last_name)
        .bind(&input.phone_number)
        .fetch_one(&self.db)
        .await?;

        Ok(worker)
    }

    /// List workers across the shops visible to the actor
    pub async fn list_workers(&self, actor: &Actor, shop_id: Option<Uuid>) -> AppResult<Vec<Worker>> {
        let visible = actor.visible_shops();

        let workers = sqlx::query_as::<_, Worker>(
            r#"
            SELECT id, shop_id, first_name, last_name, phone_number, is_active,
                   created_at, updated_at
            FROM workers
            WHERE ($1::uuid[] IS NULL OR shop_id = ANY($1))
              AND ($2::uuid IS NULL OR shop_id = $2)
            ORDER BY first_name, last_name
            "#,
        )
        .bind(visible)
        .bind(shop_id)
        .fetch_all(&self.db)
        .await?;

        Ok(workers)
    }

    /// Get a single worker, scoped to the actor
    pub async fn get_worker(&self, actor: &Actor, worker_id: Uuid) -> AppResult<Worker> {
        let worker = sqlx::query_as::<_, Worker>(
            r#"
            SELECT id, shop_id, first_name, last_name, phone_number, is_active,
                   created_at, updated_at
            FROM workers
            WHERE id = $1
            "#,
        )
        .bind(worker_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Worker".to_string()))?;

        if actor
            .visible_shops()
            .is_some_and(|shops| !shops.contains(&worker.shop_id))
        {
            return Err(AppError::NotFound("Worker".to_string()));
        }

        Ok(worker)
    }

    /// Update a worker; managers of the worker's shop only
    pub async fn update_worker(
        &self,
        actor: &Actor,
        worker_id: Uuid,
        input: UpdateWorkerInput,
    ) -> AppResult<Worker> {
        let existing = self.get_worker(actor, worker_id).await?;

        if !actor.can_manage(existing.shop_id) {
            return Err(AppError::InsufficientPermissions);
        }

        let phone_number = input.phone_number.unwrap_or(existing.phone_number);
        if let Err(msg) = validate_tz_phone(&phone_number) {
            return Err(AppError::validation(
                "phone_number",
                msg,
                "Namba ya simu si sahihi",
            ));
        }

        let worker = sqlx::query_as::<_, Worker>(
            r#"
            UPDATE workers
            SET first_name = $1, last_name = $2, phone_number = $3, is_active = $4,
                updated_at = NOW()
            WHERE id = $5
            RETURNING id, shop_id, first_name, last_name, phone_number, is_active,
                      created_at, updated_at
            "#,
        )
        .bind(input.first_name.unwrap_or(existing.first_name))
        .bind(input.last_name.or(existing.last_name))
        .bind(&phone_number)
        .bind(input.is_active.unwrap_or(existing.is_active))
        .bind(worker_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::DuplicateEntry("phone_number".to_string())
            }
            _ => AppError::DatabaseError(e),
        })?;

        Ok(worker)
    }

    /// Delete a worker; ledger entries they recorded keep a NULL worker
    /// reference
    pub async fn delete_worker(&self, actor: &Actor, worker_id: Uuid) -> AppResult<()> {
        let existing = self.get_worker(actor, worker_id).await?;

        if !actor.can_manage(existing.shop_id) {
            return Err(AppError::InsufficientPermissions);
        }

        let result = sqlx::query("DELETE FROM workers WHERE id = $1")
            .bind(worker_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Worker".to_string()));
        }

        Ok(())
    }

    /// Issue (or reissue) an invite code for a worker
    ///
    /// A worker has at most one active invite; generating a new one replaces
    /// any previous code.
    pub async fn create_invite(&self, actor: &Actor, worker_id: Uuid) -> AppResult<InviteToken> {
        let worker = self.get_worker(actor, worker_id).await?;

        if !actor.can_manage(worker.shop_id) {
            return Err(AppError::InsufficientPermissions);
        }

        let created_by = match actor {
            Actor::Manager { user_id, .. } => Some(*user_id),
            Actor::Worker { .. } => None,
        };

        let code = generate_invite_code();
        let expires_at = Utc::now() + Duration::seconds(self.invite_expiry);

        let invite = sqlx::query_as::<_, InviteToken>(
            r#"
            INSERT INTO invite_tokens (worker_id, shop_id, created_by, code, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (worker_id)
            DO UPDATE SET code = EXCLUDED.code, expires_at = EXCLUDED.expires_at,
                          created_by = EXCLUDED.created_by, created_at = NOW()
            RETURNING id, worker_id, shop_id, code, expires_at, created_at
            "#,
        )
        .bind(worker.id)
        .bind(worker.shop_id)
        .bind(created_by)
        .bind(&code)
        .bind(expires_at)
        .fetch_one(&self.db)
        .await?;

        Ok(invite)
    }

    /// Get the active invite for a worker, if any
    pub async fn get_invite(&self, actor: &Actor, worker_id: Uuid) -> AppResult<InviteToken> {
        let worker = self.get_worker(actor, worker_id).await?;

        if !actor.can_manage(worker.shop_id) {
            return Err(AppError::InsufficientPermissions);
        }

        sqlx::query_as::<_, InviteToken>(
            r#"
            SELECT id, worker_id, shop_id, code, expires_at, created_at
            FROM invite_tokens
            WHERE worker_id = $1 AND expires_at > NOW()
            "#,
        )
        .bind(worker_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invite".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::validation::validate_invite_code;

    #[test]
    fn test_generated_codes_are_valid() {
        for _ in 0..100 {
            let code = generate_invite_code();
            assert!(validate_invite_code(&code).is_ok(), "bad code: {}", code);
        }
    }

    #[test]
    fn test_generated_codes_vary() {
        let codes: std::collections::HashSet<String> =
            (0..50).map(|_| generate_invite_code()).collect();
        assert!(codes.len() > 1);
    }
}
