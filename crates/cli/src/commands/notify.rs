use anyhow::{Context, Result};
use mailtriage_notify::{TelegramCredentials, TelegramNotifier};

pub(crate) async fn run(message: &str) -> Result<()> {
    let credentials = TelegramCredentials::from_env().context(
        "MAILTRIAGE_TELEGRAM_BOT_TOKEN and MAILTRIAGE_TELEGRAM_CHAT_ID environment variables must be set",
    )?;
    let notifier = TelegramNotifier::new(credentials)?;
    match notifier.send(message).await? {
        Some(message_id) => println!("Sent message {message_id}"),
        None => println!("Sent"),
    }
    Ok(())
}
