//! Storage traits and the PostgreSQL store
//!
//! Provides principal and hidden gem persistence using SQLx and PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{DarshanError, GemDraft, GemOwner, GemPatch, HiddenGem, NewUser, Result, User};

const SCHEMA: &str = include_str!("../migrations/0001_init.sql");

/// Trait for principal storage
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new principal; fails with `Conflict` if the email is taken
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Exact (case-sensitive) email lookup
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
}

/// Trait for hidden gem storage
#[async_trait]
pub trait GemRepository: Send + Sync {
    /// All gems, newest first
    async fn list_gems(&self) -> Result<Vec<HiddenGem>>;

    async fn get_gem(&self, id: Uuid) -> Result<Option<HiddenGem>>;

    async fn find_gem_by_name(&self, name: &str) -> Result<Option<HiddenGem>>;

    /// Create a gem owned by `owner`
    async fn create_gem(&self, owner: Uuid, draft: &GemDraft) -> Result<HiddenGem>;

    /// Apply a partial update; `None` if the gem does not exist
    async fn update_gem(&self, id: Uuid, patch: &GemPatch) -> Result<Option<HiddenGem>>;

    /// Delete a gem; `false` if it did not exist
    async fn delete_gem(&self, id: Uuid) -> Result<bool>;
}

/// PostgreSQL store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store connection
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| DarshanError::DatabaseError(format!("PostgreSQL connection failed: {e}")))?;

        Ok(Self { pool })
    }

    /// Create tables and indexes if they do not exist
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| DarshanError::DatabaseError(format!("Schema bootstrap failed: {e}")))?;
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

/// User row from database
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

/// Hidden gem row joined with its owner's email
#[derive(Debug, FromRow)]
struct GemRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    description: Option<String>,
    address: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    email: String,
}

impl From<GemRow> for HiddenGem {
    fn from(row: GemRow) -> Self {
        HiddenGem {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            description: row.description,
            address: row.address,
            lat: row.lat,
            lng: row.lng,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
            user: GemOwner { email: row.email },
        }
    }
}

const GEM_COLUMNS: &str = "g.id, g.user_id, g.name, g.description, g.address, g.lat, g.lng, \
                           g.image, g.created_at, g.updated_at, u.email";

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (id, email, password_hash, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DarshanError::Conflict("Email already registered".to_string())
            } else {
                DarshanError::DatabaseError(format!("Failed to create user: {e}"))
            }
        })?;

        Ok(row.into())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DarshanError::DatabaseError(format!("Failed to fetch user: {e}")))?;

        Ok(row.map(User::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, email, password_hash, created_at FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DarshanError::DatabaseError(format!("Failed to fetch user: {e}")))?;

        Ok(row.map(User::from))
    }
}

#[async_trait]
impl GemRepository for PgStore {
    async fn list_gems(&self) -> Result<Vec<HiddenGem>> {
        let rows: Vec<GemRow> = sqlx::query_as(&format!(
            "SELECT {GEM_COLUMNS} FROM hidden_gems g JOIN users u ON u.id = g.user_id \
             ORDER BY g.created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DarshanError::DatabaseError(format!("Failed to list hidden gems: {e}")))?;

        Ok(rows.into_iter().map(HiddenGem::from).collect())
    }

    async fn get_gem(&self, id: Uuid) -> Result<Option<HiddenGem>> {
        let row: Option<GemRow> = sqlx::query_as(&format!(
            "SELECT {GEM_COLUMNS} FROM hidden_gems g JOIN users u ON u.id = g.user_id \
             WHERE g.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DarshanError::DatabaseError(format!("Failed to get hidden gem: {e}")))?;

        Ok(row.map(HiddenGem::from))
    }

    async fn find_gem_by_name(&self, name: &str) -> Result<Option<HiddenGem>> {
        let row: Option<GemRow> = sqlx::query_as(&format!(
            "SELECT {GEM_COLUMNS} FROM hidden_gems g JOIN users u ON u.id = g.user_id \
             WHERE g.name = $1 LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DarshanError::DatabaseError(format!("Failed to find hidden gem: {e}")))?;

        Ok(row.map(HiddenGem::from))
    }

    async fn create_gem(&self, owner: Uuid, draft: &GemDraft) -> Result<HiddenGem> {
        let row: GemRow = sqlx::query_as(&format!(
            r#"
            WITH g AS (
                INSERT INTO hidden_gems (
                    id, user_id, name, description, address, lat, lng, image,
                    created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
                RETURNING *
            )
            SELECT {GEM_COLUMNS} FROM g JOIN users u ON u.id = g.user_id
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.address)
        .bind(draft.lat)
        .bind(draft.lng)
        .bind(&draft.image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DarshanError::DatabaseError(format!("Failed to create hidden gem: {e}")))?;

        Ok(row.into())
    }

    async fn update_gem(&self, id: Uuid, patch: &GemPatch) -> Result<Option<HiddenGem>> {
        let row: Option<GemRow> = sqlx::query_as(&format!(
            r#"
            WITH g AS (
                UPDATE hidden_gems SET
                    name = COALESCE($2, name),
                    description = COALESCE($3, description),
                    address = COALESCE($4, address),
                    lat = COALESCE($5, lat),
                    lng = COALESCE($6, lng),
                    image = COALESCE($7, image),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {GEM_COLUMNS} FROM g JOIN users u ON u.id = g.user_id
            "#
        ))
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(&patch.address)
        .bind(patch.lat)
        .bind(patch.lng)
        .bind(&patch.image)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DarshanError::DatabaseError(format!("Failed to update hidden gem: {e}")))?;

        Ok(row.map(HiddenGem::from))
    }

    async fn delete_gem(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM hidden_gems WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DarshanError::DatabaseError(format!("Failed to delete hidden gem: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}
