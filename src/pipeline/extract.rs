//! Eligibility checks for a fetched candidate.
//!
//! Each step either hands back the value it validated or a [`Skip`] saying why
//! the message gets no reply. Skips are never errors: the run moves on.

use anyhow::Result;
use regex::Regex;
use thiserror::Error;

use crate::gmail::types::Message;
use crate::mail::decoders::{Mailbox, decode_mime_words, first_mailbox};
use crate::store::repo::RepliedIds;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Skip {
    #[error("already replied to {0}")]
    AlreadyReplied(String),
    #[error("no Subject header")]
    NoSubject,
    #[error("subject is itself a reply: {0}")]
    IsReply(String),
    #[error("no username in subject: {0}")]
    NoUsername(String),
    #[error("no Reply-To or From address in email: {0}")]
    NoAddress(String),
    #[error("missing Message-ID or thread ID, cannot reply: {0}")]
    NoThreading(String),
}

impl Skip {
    /// Skips that point at unexpected mail rather than routine filtering.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Skip::NoUsername(_) | Skip::NoAddress(_) | Skip::NoThreading(_)
        )
    }
}

/// A candidate that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eligible {
    /// Provider id, the dedupe key.
    pub id: String,
    pub thread_id: String,
    /// RFC 5322 Message-ID of the original, echoed for threading.
    pub message_id: String,
    pub subject: String,
    pub username: String,
    pub reply_to: Mailbox,
}

pub struct Extractor {
    username_re: Regex,
}

impl Extractor {
    pub fn new(subject_phrase: &str) -> Result<Self> {
        let pattern = format!(r"{} (.+)", regex::escape(subject_phrase.trim()));
        Ok(Self {
            username_re: Regex::new(&pattern)?,
        })
    }

    /// Text after the phrase up to the end of the line, trimmed.
    pub fn username(&self, subject: &str) -> Option<String> {
        self.username_re
            .captures(subject)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|u| !u.is_empty())
    }

    pub fn check(&self, msg: &Message) -> Result<Eligible, Skip> {
        let subject = subject(msg)?;
        not_a_reply(&subject)?;
        let username = self
            .username(&subject)
            .ok_or_else(|| Skip::NoUsername(subject.clone()))?;
        let reply_to = reply_target(msg).ok_or_else(|| Skip::NoAddress(subject.clone()))?;
        let (message_id, thread_id) =
            threading(msg).ok_or_else(|| Skip::NoThreading(subject.clone()))?;

        Ok(Eligible {
            id: msg.id.clone(),
            thread_id,
            message_id,
            subject,
            username,
            reply_to,
        })
    }
}

pub fn not_replied(id: &str, replied: &RepliedIds) -> Result<(), Skip> {
    if replied.contains(id) {
        return Err(Skip::AlreadyReplied(id.to_string()));
    }
    Ok(())
}

fn subject(msg: &Message) -> Result<String, Skip> {
    msg.header("Subject")
        .map(|s| decode_mime_words(s).trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(Skip::NoSubject)
}

fn not_a_reply(subject: &str) -> Result<(), Skip> {
    let is_reply = subject
        .get(..3)
        .is_some_and(|p| p.eq_ignore_ascii_case("re:"));
    if is_reply {
        return Err(Skip::IsReply(subject.to_string()));
    }
    Ok(())
}

/// Reply-To wins over From; an unparseable Reply-To falls through to From.
fn reply_target(msg: &Message) -> Option<Mailbox> {
    ["Reply-To", "From"]
        .iter()
        .filter_map(|h| msg.header(h))
        .find_map(first_mailbox)
}

fn threading(msg: &Message) -> Option<(String, String)> {
    let message_id = msg
        .header("Message-ID")
        .map(str::trim)
        .filter(|s| !s.is_empty())?;
    let thread_id = msg.thread_id.as_deref().filter(|s| !s.is_empty())?;
    Some((message_id.to_string(), thread_id.to_string()))
}
