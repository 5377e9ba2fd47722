//! PostgreSQL schema for the email store.

use sqlx::PgPool;

use crate::error::StorageError;

/// Run all PostgreSQL migrations.
pub async fn run_pg_migrations(pool: &PgPool) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS emails (
            id BIGSERIAL PRIMARY KEY,
            from_address TEXT NOT NULL,
            from_name TEXT,
            to_address TEXT NOT NULL,
            title TEXT NOT NULL,
            body_text TEXT,
            body_html TEXT,
            sent_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            read_status SMALLINT NOT NULL DEFAULT 0,
            email_type TEXT NOT NULL DEFAULT 'none',
            email_result TEXT
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| StorageError::Migration(e.to_string()))?;

    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_emails_sent ON emails (sent_at DESC, id DESC)",
        "CREATE INDEX IF NOT EXISTS idx_emails_to ON emails (to_address)",
        "CREATE INDEX IF NOT EXISTS idx_emails_read ON emails (read_status)",
    ] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| StorageError::Migration(e.to_string()))?;
    }

    tracing::info!("PostgreSQL email schema ready");
    Ok(())
}
