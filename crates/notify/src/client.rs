use std::sync::Arc;
use std::time::Duration;

use mailtriage_core::{Email, NOTIFY_TIMEOUT_SECS, env_non_empty};
use serde::{Deserialize, Serialize};

use crate::Notifier;
use crate::error::NotifyError;

/// Public Telegram Bot API endpoint.
pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

/// Bot credentials. Both parts are required for delivery.
#[derive(Clone, Default)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("bot_token", &"***")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl TelegramCredentials {
    /// Reads `MAILTRIAGE_TELEGRAM_BOT_TOKEN` and `MAILTRIAGE_TELEGRAM_CHAT_ID`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let bot_token = env_non_empty("MAILTRIAGE_TELEGRAM_BOT_TOKEN")?;
        let chat_id = env_non_empty("MAILTRIAGE_TELEGRAM_CHAT_ID")?;
        Some(Self { bot_token, chat_id })
    }

    fn is_complete(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    #[serde(default)]
    result: Option<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

/// Sends HTML-formatted messages to a Telegram chat.
#[derive(Clone, Debug)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    credentials: Arc<TelegramCredentials>,
    api_base: String,
    timeout: Duration,
}

impl TelegramNotifier {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(credentials: TelegramCredentials) -> Result<Self, NotifyError> {
        let client =
            reqwest::Client::builder().build().map_err(|e| NotifyError::ClientInit(e.to_string()))?;
        Ok(Self {
            client,
            credentials: Arc::new(credentials),
            api_base: DEFAULT_TELEGRAM_API.to_owned(),
            timeout: Duration::from_secs(NOTIFY_TIMEOUT_SECS),
        })
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_owned();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// One delivery attempt, bounded by the configured timeout.
    ///
    /// Returns the Telegram message id when the API reports one.
    pub async fn send(&self, message: &str) -> Result<Option<i64>, NotifyError> {
        if !self.credentials.is_complete() {
            return Err(NotifyError::MissingCredentials);
        }
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.credentials.bot_token);
        let payload =
            SendMessage { chat_id: &self.credentials.chat_id, text: message, parse_mode: "HTML" };

        let response = tokio::time::timeout(self.timeout, self.client.post(url).json(&payload).send())
            .await
            .map_err(|_| NotifyError::Timeout(self.timeout))??;

        let status = response.status();
        if !status.is_success() {
            let body =
                response.text().await.unwrap_or_else(|_| "Could not read error body".to_owned());
            return Err(NotifyError::HttpStatus { code: status.as_u16(), body });
        }

        let sent: SendMessageResponse = response.json().await?;
        Ok(sent.result.map(|m| m.message_id))
    }

    /// Delivery attempt whose outcome is only logged.
    pub async fn deliver(&self, message: &str) {
        match self.send(message).await {
            Ok(message_id) => {
                tracing::info!(?message_id, "Telegram message sent");
            },
            Err(e) => {
                tracing::error!(error = %e, "Telegram notification failed");
            },
        }
    }
}

impl Notifier for TelegramNotifier {
    fn notify(&self, message: String) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no async runtime, dropping notification");
            return;
        };
        let this = self.clone();
        runtime.spawn(async move { this.deliver(&message).await });
    }
}

/// Escapes the characters Telegram's HTML parse mode treats as markup.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

/// Summary sent when a message with an extracted result is ingested.
#[must_use]
pub fn format_ingest_message(email: &Email) -> String {
    let sender = email.from_name.as_deref().unwrap_or(&email.from_address);
    let mut text = format!(
        "<b>{}</b>\nFrom: {}\nTo: {}",
        escape_html(&email.title),
        escape_html(sender),
        escape_html(&email.to_address),
    );
    if let Some(result) = email.actionable_result() {
        text.push_str(&format!("\n{}: <code>{}</code>", email.email_type, escape_html(result)));
    }
    text
}
