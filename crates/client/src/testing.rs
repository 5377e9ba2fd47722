//! In-process stand-in for the dashboard API, shared by the client tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use mailtriage_core::{Email, EmailType, ListParams, READ, Signature, UNREAD};
use tokio::sync::Semaphore;

use crate::error::{FetchError, RemoteError};
use crate::fetcher::{EmailRemote, FetchedPage, PageFetcher};

/// Holds calls while closed; each `release` lets one call through.
pub(crate) struct Gate {
    closed: AtomicBool,
    permits: Semaphore,
}

impl Gate {
    fn new() -> Self {
        Self { closed: AtomicBool::new(false), permits: Semaphore::new(0) }
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub(crate) fn release(&self, calls: usize) {
        self.permits.add_permits(calls);
    }

    async fn pass(&self) {
        if self.closed.load(Ordering::SeqCst) {
            if let Ok(permit) = self.permits.acquire().await {
                permit.forget();
            }
        }
    }
}

/// Odd ids are unread, even ids are read; newest (highest id) first.
pub(crate) fn email(id: i64) -> Email {
    Email {
        id,
        from_address: "noreply@example.com".to_owned(),
        from_name: None,
        to_address: if id % 3 == 0 { "c@example.com" } else { "a@example.com" }.to_owned(),
        title: format!("Message {id}"),
        body_text: None,
        body_html: None,
        sent_at: Utc.timestamp_opt(1_700_000_000 + id, 0).unwrap(),
        read_status: if id % 2 == 0 { READ } else { UNREAD },
        email_type: EmailType::AuthLink,
        email_result: Some(format!("https://example.com/login/{id}")),
    }
}

pub(crate) struct FakeServer {
    emails: Mutex<Vec<Email>>,
    pub(crate) fetch_gate: Gate,
    pub(crate) remote_gate: Gate,
    pub(crate) fail_fetch: AtomicBool,
    pub(crate) fail_remote: AtomicBool,
    pub(crate) fetch_calls: AtomicUsize,
    pub(crate) remote_calls: AtomicUsize,
}

impl FakeServer {
    pub(crate) fn with_count(count: i64) -> Self {
        Self {
            emails: Mutex::new((1..=count).map(email).collect()),
            fetch_gate: Gate::new(),
            remote_gate: Gate::new(),
            fail_fetch: AtomicBool::new(false),
            fail_remote: AtomicBool::new(false),
            fetch_calls: AtomicUsize::new(0),
            remote_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn insert(&self, email: Email) {
        self.emails.lock().unwrap().push(email);
    }

    pub(crate) fn remove_where(&self, predicate: impl Fn(&Email) -> bool) {
        self.emails.lock().unwrap().retain(|e| !predicate(e));
    }

    pub(crate) fn get(&self, id: i64) -> Option<Email> {
        self.emails.lock().unwrap().iter().find(|e| e.id == id).cloned()
    }

    async fn remote_call(&self) -> Result<(), RemoteError> {
        self.remote_calls.fetch_add(1, Ordering::SeqCst);
        self.remote_gate.pass().await;
        if self.fail_remote.load(Ordering::SeqCst) {
            return Err(RemoteError::Status { status: 500, message: "internal server error".to_owned() });
        }
        Ok(())
    }

    fn modify(&self, id: i64, change: impl FnOnce(&mut Email)) -> Result<(), RemoteError> {
        let mut emails = self.emails.lock().unwrap();
        let email = emails
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| RemoteError::Status { status: 404, message: "Email not found".to_owned() })?;
        change(email);
        Ok(())
    }
}

#[async_trait]
impl PageFetcher for FakeServer {
    async fn fetch(
        &self,
        signature: &Signature,
        offset: u64,
        limit: u32,
    ) -> Result<FetchedPage, FetchError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetch_gate.pass().await;
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(RemoteError::Status { status: 500, message: "internal server error".to_owned() }
                .into());
        }
        let params = ListParams::for_page(signature, offset, limit);
        let mut matched: Vec<Email> =
            self.emails.lock().unwrap().iter().filter(|e| params.matches(e)).cloned().collect();
        matched.sort_by(|a, b| b.sent_at.cmp(&a.sent_at).then(b.id.cmp(&a.id)));
        let total = matched.len() as u64;
        let items = matched.into_iter().skip(offset as usize).take(limit as usize).collect();
        Ok(FetchedPage { items, total })
    }
}

#[async_trait]
impl EmailRemote for FakeServer {
    async fn mark(&self, id: i64, is_read: bool) -> Result<(), RemoteError> {
        self.remote_call().await?;
        self.modify(id, |e| e.read_status = if is_read { READ } else { UNREAD })
    }

    async fn delete(&self, id: i64) -> Result<(), RemoteError> {
        self.remote_call().await?;
        self.modify(id, |_| ())?;
        self.remove_where(|e| e.id == id);
        Ok(())
    }

    async fn batch_delete(&self, ids: &[i64]) -> Result<u64, RemoteError> {
        self.remote_call().await?;
        let mut emails = self.emails.lock().unwrap();
        let before = emails.len();
        emails.retain(|e| !ids.contains(&e.id));
        Ok((before - emails.len()) as u64)
    }

    async fn update_result(
        &self,
        id: i64,
        email_result: Option<&str>,
        email_type: EmailType,
    ) -> Result<(), RemoteError> {
        self.remote_call().await?;
        self.modify(id, |e| {
            e.email_result = email_result.map(ToOwned::to_owned);
            e.email_type = email_type;
        })
    }

    async fn recipients(&self) -> Result<Vec<String>, RemoteError> {
        self.remote_call().await?;
        let mut recipients: Vec<String> =
            self.emails.lock().unwrap().iter().map(|e| e.to_address.clone()).collect();
        recipients.sort();
        recipients.dedup();
        Ok(recipients)
    }
}
