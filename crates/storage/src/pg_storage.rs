//! PostgreSQL storage backend using sqlx.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mailtriage_core::{Email, EmailType, ListParams, NewEmail};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use crate::error::StorageError;
use crate::pg_migrations::run_pg_migrations;
use crate::traits::EmailStore;

const EMAIL_COLUMNS: &str = "id, from_address, from_name, to_address, title, body_text, \
                             body_html, sent_at, read_status, email_type, email_result";

#[derive(Clone, Debug)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new().max_connections(8).connect(database_url).await?;
        run_pg_migrations(&pool).await?;
        tracing::info!("PgStorage initialized");
        Ok(Self { pool })
    }
}

fn row_to_email(row: &PgRow) -> Result<Email, StorageError> {
    let email_type: String = row.try_get("email_type")?;
    let read_status: i16 = row.try_get("read_status")?;
    let sent_at: DateTime<Utc> = row.try_get("sent_at")?;
    Ok(Email {
        id: row.try_get("id")?,
        from_address: row.try_get("from_address")?,
        from_name: row.try_get("from_name")?,
        to_address: row.try_get("to_address")?,
        title: row.try_get("title")?,
        body_text: row.try_get("body_text")?,
        body_html: row.try_get("body_html")?,
        sent_at,
        read_status: u8::from(read_status != 0),
        email_type: email_type.parse::<EmailType>()?,
        email_result: row.try_get("email_result")?,
    })
}

/// Appends the WHERE clause shared by `list` and `count`.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, params: &ListParams) {
    builder.push(" WHERE TRUE");
    if let Some(status) = params.read_status {
        builder.push(" AND read_status = ").push_bind(i16::from(status));
    }
    if !params.email_types.is_empty() {
        let types: Vec<String> = params.email_types.iter().map(|t| t.as_str().to_owned()).collect();
        builder.push(" AND email_type = ANY(").push_bind(types).push(")");
    }
    if !params.recipients.is_empty() {
        builder.push(" AND to_address = ANY(").push_bind(params.recipients.clone()).push(")");
    }
}

#[async_trait]
impl EmailStore for PgStorage {
    async fn list(&self, params: &ListParams) -> Result<Vec<Email>, StorageError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {EMAIL_COLUMNS} FROM emails"));
        push_filters(&mut builder, params);
        builder
            .push(" ORDER BY sent_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(params.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(params.offset).unwrap_or(i64::MAX));
        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_email).collect()
    }

    async fn count(&self, params: &ListParams) -> Result<u64, StorageError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM emails");
        push_filters(&mut builder, params);
        let total: i64 = builder.build().fetch_one(&self.pool).await?.try_get(0)?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn set_read_status(&self, id: i64, is_read: bool) -> Result<bool, StorageError> {
        let result = sqlx::query("UPDATE emails SET read_status = $1 WHERE id = $2")
            .bind(i16::from(is_read))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        let result =
            sqlx::query("DELETE FROM emails WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn batch_delete(&self, ids: &[i64]) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM emails WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn update_result(
        &self,
        id: i64,
        email_result: Option<&str>,
        email_type: EmailType,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query("UPDATE emails SET email_result = $1, email_type = $2 WHERE id = $3")
            .bind(email_result)
            .bind(email_type.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn recipients(&self) -> Result<Vec<String>, StorageError> {
        let rows = sqlx::query("SELECT DISTINCT to_address FROM emails ORDER BY to_address")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| row.try_get("to_address").map_err(StorageError::from)).collect()
    }

    async fn insert(&self, email: NewEmail) -> Result<Email, StorageError> {
        let row = sqlx::query(&format!(
            "INSERT INTO emails (from_address, from_name, to_address, title, body_text, \
             body_html, sent_at, email_type, email_result) \
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, NOW()), $8, $9) \
             RETURNING {EMAIL_COLUMNS}"
        ))
        .bind(&email.from_address)
        .bind(&email.from_name)
        .bind(&email.to_address)
        .bind(&email.title)
        .bind(&email.body_text)
        .bind(&email.body_html)
        .bind(email.sent_at)
        .bind(email.email_type.as_str())
        .bind(&email.email_result)
        .fetch_one(&self.pool)
        .await?;
        row_to_email(&row)
    }
}
