use anyhow::Result;
use mailtriage_client::{CacheEvent, ClientConfig, TriageClient};
use mailtriage_core::FilterSet;

pub(crate) async fn run(base_url: String, filters: FilterSet) -> Result<()> {
    let client = TriageClient::connect(ClientConfig::from_env(base_url))?;
    let cache = client.cache();
    let signature = cache.set_active(&filters);
    let mut subscription = cache.subscribe(&signature);
    let refresh = client.start_refresh();
    tracing::info!(%signature, "watching; press Ctrl-C to stop");

    cache.request_next_page(&signature).await?;
    loop {
        tokio::select! {
            event = subscription.next_event() => {
                let Some(event) = event else { break };
                if matches!(event, CacheEvent::Invalidated { .. }) {
                    cache.request_next_page(&signature).await?;
                    continue;
                }
                if let Some(snapshot) = cache.snapshot(&signature) {
                    println!(
                        "{:?}: {} loaded of {}",
                        event,
                        snapshot.items.len(),
                        snapshot.total.map_or_else(|| "?".to_owned(), |t| t.to_string())
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    refresh.shutdown().await;
    Ok(())
}
