use anyhow::Result;
use mailtriage_client::{ClientConfig, TriageClient};
use mailtriage_core::FilterSet;

pub(crate) async fn run(base_url: String, filters: FilterSet, pages: usize) -> Result<()> {
    let client = TriageClient::connect(ClientConfig::from_env(base_url))?;
    let cache = client.cache();
    let signature = cache.set_active(&filters);

    for _ in 0..pages {
        if !cache.has_next_page(&signature) {
            break;
        }
        cache.request_next_page(&signature).await?;
    }

    if let Some(snapshot) = cache.snapshot(&signature) {
        tracing::info!(
            loaded = snapshot.loaded_count,
            total = ?snapshot.total,
            more = snapshot.has_next_page,
            "{}",
            signature
        );
        println!("{}", serde_json::to_string_pretty(&snapshot.items)?);
    }
    Ok(())
}
