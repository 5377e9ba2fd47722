//! Remote adapters: page fetching and the mutation endpoints.

use std::time::Duration;

use async_trait::async_trait;
use mailtriage_core::{Email, EmailType, Envelope, ListParams, Signature};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{FetchError, RemoteError};

/// One page as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub items: Vec<Email>,
    pub total: u64,
}

/// Requests a single page of a filtered collection. Implementations hold no
/// per-signature state.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(
        &self,
        signature: &Signature,
        offset: u64,
        limit: u32,
    ) -> Result<FetchedPage, FetchError>;
}

/// Server calls that confirm a mutation.
#[async_trait]
pub trait EmailRemote: Send + Sync {
    async fn mark(&self, id: i64, is_read: bool) -> Result<(), RemoteError>;

    async fn delete(&self, id: i64) -> Result<(), RemoteError>;

    /// Returns how many emails the server actually removed.
    async fn batch_delete(&self, ids: &[i64]) -> Result<u64, RemoteError>;

    async fn update_result(
        &self,
        id: i64,
        email_result: Option<&str>,
        email_type: EmailType,
    ) -> Result<(), RemoteError>;

    async fn recipients(&self) -> Result<Vec<String>, RemoteError>;
}

#[derive(Serialize)]
struct BatchDeleteBody<'a> {
    ids: &'a [i64],
}

#[derive(serde::Deserialize)]
struct BatchDeleteData {
    deleted: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBody<'a> {
    id: i64,
    email_result: Option<&'a str>,
    email_type: EmailType,
}

/// Client for the `/api/email/*` endpoints.
#[derive(Debug, Clone)]
pub struct HttpEmailApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEmailApi {
    /// `timeout` bounds every request, including mutations.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { client, base_url })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/email/{endpoint}", self.base_url)
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Envelope<T>, RemoteError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|env| env.message)
                .unwrap_or(body);
            return Err(RemoteError::Status { status: status.as_u16(), message });
        }
        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| RemoteError::Envelope(e.to_string()))?;
        if !envelope.success {
            return Err(RemoteError::Status {
                status: envelope.status,
                message: envelope.message.unwrap_or_default(),
            });
        }
        Ok(envelope)
    }

    async fn expect_data<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        Self::read_envelope(response)
            .await?
            .data
            .ok_or_else(|| RemoteError::Envelope("missing data".to_owned()))
    }
}

#[async_trait]
impl PageFetcher for HttpEmailApi {
    async fn fetch(
        &self,
        signature: &Signature,
        offset: u64,
        limit: u32,
    ) -> Result<FetchedPage, FetchError> {
        let params = ListParams::for_page(signature, offset, limit);
        let response = self
            .client
            .get(self.url("list"))
            .query(&params.to_query_pairs())
            .send()
            .await
            .map_err(RemoteError::from)?;
        let envelope: Envelope<Vec<Email>> = Self::read_envelope(response).await?;
        let total = envelope
            .meta
            .map(|meta| meta.total)
            .ok_or_else(|| RemoteError::Envelope("missing meta.total".to_owned()))?;
        Ok(FetchedPage { items: envelope.data.unwrap_or_default(), total })
    }
}

#[async_trait]
impl EmailRemote for HttpEmailApi {
    async fn mark(&self, id: i64, is_read: bool) -> Result<(), RemoteError> {
        let is_read = if is_read { "1" } else { "0" };
        let response = self
            .client
            .post(self.url("mark"))
            .query(&[("id", id.to_string().as_str()), ("is_read", is_read)])
            .send()
            .await?;
        Self::read_envelope::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), RemoteError> {
        let response =
            self.client.post(self.url("delete")).query(&[("id", id)]).send().await?;
        Self::read_envelope::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn batch_delete(&self, ids: &[i64]) -> Result<u64, RemoteError> {
        let response = self
            .client
            .post(self.url("batch-delete"))
            .json(&BatchDeleteBody { ids })
            .send()
            .await?;
        let data: BatchDeleteData = Self::expect_data(response).await?;
        Ok(data.deleted)
    }

    async fn update_result(
        &self,
        id: i64,
        email_result: Option<&str>,
        email_type: EmailType,
    ) -> Result<(), RemoteError> {
        let response = self
            .client
            .post(self.url("update"))
            .json(&UpdateBody { id, email_result, email_type })
            .send()
            .await?;
        Self::read_envelope::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn recipients(&self) -> Result<Vec<String>, RemoteError> {
        let response = self.client.get(self.url("recipients")).send().await?;
        Self::expect_data(response).await
    }
}
