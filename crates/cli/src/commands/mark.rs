use anyhow::Result;
use mailtriage_client::{ClientConfig, TriageClient};

pub(crate) async fn run(base_url: String, id: i64, is_read: bool) -> Result<()> {
    let client = TriageClient::connect(ClientConfig::from_env(base_url))?;
    client.mutations().mark(id, is_read).await?;
    println!("Email {id} marked {}", if is_read { "read" } else { "unread" });
    Ok(())
}
