use anyhow::Result;
use mailtriage_client::{ClientConfig, TriageClient};

pub(crate) async fn run(base_url: String) -> Result<()> {
    let client = TriageClient::connect(ClientConfig::from_env(base_url))?;
    let recipients = client.recipients().get().await?;
    println!("{}", serde_json::to_string_pretty(&recipients)?);
    Ok(())
}
