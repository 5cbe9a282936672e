use anyhow::{Context, Result, bail};
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::auth::token_manager::Session;
use crate::gmail::types::{ListMessagesResponse, Message, MessageRef, OutgoingMessage, SentMessage};

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Headers requested when fetching a candidate.
const METADATA_HEADERS: [&str; 4] = ["Subject", "From", "Reply-To", "Message-ID"];

/// The three mail provider operations the job needs.
pub trait MailApi {
    fn list_messages(&self, query: &str, max_results: u32) -> Result<Vec<MessageRef>>;
    fn get_message(&self, id: &str) -> Result<Message>;
    fn send_message(&self, message: &OutgoingMessage) -> Result<SentMessage>;
}

pub struct GmailClient {
    http: Client,
    base_url: String,
    session: Session,
}

impl GmailClient {
    pub fn new(session: Session) -> Result<Self> {
        Self::with_base_url(session, GMAIL_API_BASE)
    }

    pub fn with_base_url(session: Session, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("trial_followup/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    fn call<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T> {
        let res = req
            .bearer_auth(&self.session.access_token)
            .send()
            .with_context(|| format!("{what}: request failed"))?;
        let status = res.status();
        let text = res.text().unwrap_or_default();
        log::debug!("{what}: HTTP {status}");
        if !status.is_success() {
            bail!("{what} failed: {status} ({text})");
        }
        serde_json::from_str(&text).with_context(|| format!("{what}: unexpected response body"))
    }
}

impl MailApi for GmailClient {
    fn list_messages(&self, query: &str, max_results: u32) -> Result<Vec<MessageRef>> {
        let req = self
            .http
            .get(format!("{}/messages", self.base_url))
            .query(&[("q", query), ("maxResults", max_results.to_string().as_str())]);
        let list: ListMessagesResponse = self.call(req, "list messages")?;
        if list.next_page_token.is_some() {
            log::info!("more than {max_results} matches; only the first page is processed");
        }
        Ok(list.messages.unwrap_or_default())
    }

    fn get_message(&self, id: &str) -> Result<Message> {
        let mut params = vec![("format", "metadata")];
        params.extend(METADATA_HEADERS.iter().map(|h| ("metadataHeaders", *h)));
        let req = self
            .http
            .get(format!("{}/messages/{id}", self.base_url))
            .query(&params);
        self.call(req, &format!("get message {id}"))
    }

    fn send_message(&self, message: &OutgoingMessage) -> Result<SentMessage> {
        let req = self
            .http
            .post(format!("{}/messages/send", self.base_url))
            .json(message);
        self.call(req, "send message")
    }
}
