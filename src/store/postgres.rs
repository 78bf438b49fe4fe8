//! PostgreSQL user store backed by sqlx.
//!
//! # Responsibilities
//! - Open the connection pool and create the `users` table on startup
//! - Map rows to [`User`] and sqlx errors to [`StoreError`]
//!
//! Every statement filters on `deleted_at IS NULL`, so soft-deleted rows
//! behave exactly like missing ones.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::model::{RecordMeta, User, UserId, UserInput};
use crate::store::{StoreError, UserStore};

const MIGRATIONS: [&str; 2] = [
    r#"CREATE TABLE IF NOT EXISTS users (
        id          BIGSERIAL PRIMARY KEY,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        deleted_at  TIMESTAMPTZ NULL,
        username    TEXT NOT NULL,
        first_name  TEXT NOT NULL,
        last_name   TEXT NOT NULL,
        email       TEXT NOT NULL,
        phone       TEXT NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_users_deleted_at ON users (deleted_at)",
];

const COLUMNS: &str =
    "id, created_at, updated_at, deleted_at, username, first_name, last_name, email, phone";

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            meta: RecordMeta {
                id: UserId(row.id),
                created_at: row.created_at,
                updated_at: row.updated_at,
                deleted_at: row.deleted_at,
            },
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
        }
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        other => StoreError::Database(other.to_string()),
    }
}

/// User store over a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool using the database settings.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.dsn)
            .await
            .map_err(map_sqlx_error)?;

        tracing::info!(
            max_connections = config.max_connections,
            "PostgreSQL pool connected"
        );
        Ok(Self::new(pool))
    }

    /// Create the schema if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in MIGRATIONS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        }
        tracing::info!("Database schema is up to date");
        Ok(())
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn create(&self, input: UserInput) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (username, first_name, last_name, email, phone) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(input.username)
            .bind(input.first_name)
            .bind(input.last_name)
            .bind(input.email)
            .bind(input.phone)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn find_by_id(&self, id: UserId) -> Result<User, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");
        let row: UserRow = sqlx::query_as(&sql)
            .bind(i64::from(id))
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn update_fields(&self, existing: &User, fields: UserInput) -> Result<User, StoreError> {
        let sql = format!(
            "UPDATE users SET username = $2, first_name = $3, last_name = $4, email = $5, \
             phone = $6, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {COLUMNS}"
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(i64::from(existing.id()))
            .bind(fields.username)
            .bind(fields.first_name)
            .bind(fields.last_name)
            .bind(fields.email)
            .bind(fields.phone)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn delete_by_id(&self, id: UserId) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(i64::from(id))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        tracing::debug!(user_id = %id, rows = result.rows_affected(), "Soft-deleted user");
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
