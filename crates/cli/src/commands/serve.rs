use std::sync::Arc;

use anyhow::Result;
use mailtriage_http::{AppState, create_router};
use mailtriage_notify::{Notifier, TelegramCredentials, TelegramNotifier};
use mailtriage_service::EmailService;
use mailtriage_storage::StorageBackend;

fn memory_storage() -> StorageBackend {
    tracing::info!("Using in-memory storage; data is lost on exit");
    StorageBackend::new_memory()
}

#[cfg(feature = "postgres")]
async fn open_storage() -> Result<StorageBackend> {
    let Some(url) = mailtriage_core::env_non_empty("DATABASE_URL") else {
        return Ok(memory_storage());
    };
    let storage = StorageBackend::new_postgres(&url).await?;
    tracing::info!("Connected to PostgreSQL");
    Ok(storage)
}

#[cfg(not(feature = "postgres"))]
async fn open_storage() -> Result<StorageBackend> {
    if mailtriage_core::env_non_empty("DATABASE_URL").is_some() {
        tracing::warn!("DATABASE_URL is set but this build lacks the postgres feature");
    }
    Ok(memory_storage())
}

fn notifier() -> Option<Arc<dyn Notifier>> {
    let Some(credentials) = TelegramCredentials::from_env() else {
        tracing::info!("Telegram credentials not set, ingest notifications disabled");
        return None;
    };
    match TelegramNotifier::new(credentials) {
        Ok(notifier) => Some(Arc::new(notifier)),
        Err(e) => {
            tracing::warn!("Failed to initialize Telegram notifier: {}", e);
            None
        },
    }
}

pub(crate) async fn run(port: u16, host: String) -> Result<()> {
    let storage = Arc::new(open_storage().await?);
    tracing::info!(backend = storage.kind(), "Storage ready");
    let email_service = Arc::new(EmailService::new(storage, notifier()));
    let router = create_router(Arc::new(AppState { email_service }));

    let addr = format!("{host}:{port}");
    tracing::info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
