use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::config::RunConfig;
use crate::gmail::client::MailApi;
use crate::gmail::types::MessageRef;
use crate::pipeline::compose::ReplyDraft;
use crate::pipeline::extract::{Extractor, Skip, not_replied};
use crate::query::{MAX_RESULTS, build_query};
use crate::store::repo::{RepliedIds, ReplyStore};

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub now: DateTime<Utc>,
    /// Compose replies but neither send them nor touch the store.
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            now: Utc::now(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub candidates: usize,
    pub sent: usize,
    pub skipped: usize,
    /// Fetch, compose or send failures; these are retried next run.
    pub failed: usize,
    pub dry_run: usize,
}

enum Outcome {
    Sent,
    Skipped(Skip),
    Failed,
    DryRun,
}

/// One pass over the inbox: query, filter, reply, record.
///
/// Auth and listing problems as well as store failures abort the run; anything
/// going wrong with a single message only costs that message.
pub fn run_once(
    api: &dyn MailApi,
    store: &dyn ReplyStore,
    cfg: &RunConfig,
    opts: RunOptions,
) -> Result<RunReport> {
    println!("Run started at: {}", opts.now.format("%Y-%m-%d %H:%M:%S"));

    let extractor = Extractor::new(&cfg.subject_phrase)?;
    let mut replied = store.load().context("loading replied message ids")?;
    log::debug!("{} message ids already replied to", replied.len());

    let query = build_query(&cfg.subject_phrase, cfg.lookback_days, opts.now);
    log::info!("query: {query}");
    let refs = api
        .list_messages(&query, MAX_RESULTS)
        .context("listing candidate messages")?;

    let mut report = RunReport::default();
    if refs.is_empty() {
        println!("No matching emails.");
        return Ok(report);
    }

    for r in &refs {
        report.candidates += 1;
        match process(api, &extractor, cfg, &replied, r, opts.dry_run) {
            Outcome::Sent => {
                report.sent += 1;
                replied.insert(r.id.clone());
                // a delivered email cannot be taken back, record it right away
                persist(store, &replied)?;
                println!("Reply recorded.");
            }
            Outcome::Skipped(skip) => {
                report.skipped += 1;
                if skip.is_warning() {
                    log::warn!("skipping {}: {skip}", r.id);
                }
                println!("Skipping {}: {skip}", r.id);
            }
            Outcome::Failed => report.failed += 1,
            Outcome::DryRun => report.dry_run += 1,
        }
    }

    if !opts.dry_run {
        persist(store, &replied)?;
    }

    println!(
        "Done: {} candidates, {} sent, {} skipped, {} failed",
        report.candidates, report.sent, report.skipped, report.failed
    );
    Ok(report)
}

fn persist(store: &dyn ReplyStore, replied: &RepliedIds) -> Result<()> {
    store
        .save(replied)
        .context("saving replied message ids; replies sent in this run may be repeated")
}

fn process(
    api: &dyn MailApi,
    extractor: &Extractor,
    cfg: &RunConfig,
    replied: &RepliedIds,
    r: &MessageRef,
    dry_run: bool,
) -> Outcome {
    if let Err(skip) = not_replied(&r.id, replied) {
        return Outcome::Skipped(skip);
    }

    let msg = match api.get_message(&r.id) {
        Ok(m) => m,
        Err(e) => {
            log::warn!("could not fetch message {}: {e:#}", r.id);
            println!("Could not fetch {}, will retry next run.", r.id);
            return Outcome::Failed;
        }
    };

    let candidate = match extractor.check(&msg) {
        Ok(c) => c,
        Err(skip) => return Outcome::Skipped(skip),
    };

    println!("\nSubject: {}", candidate.subject);
    println!("Reply-To: {}", candidate.reply_to);
    println!("Username: {}", candidate.username);

    let draft = ReplyDraft::new(&candidate, cfg);
    let outgoing = match draft.encode() {
        Ok(o) => o,
        Err(e) => {
            log::warn!("could not compose reply to {}: {e:#}", r.id);
            return Outcome::Failed;
        }
    };

    if dry_run {
        println!("Dry run, not sending reply to: {}", draft.to);
        return Outcome::DryRun;
    }

    println!("Sending reply to: {}", draft.to);
    match api.send_message(&outgoing) {
        Ok(sent) => {
            log::info!("sent {} in thread {}", sent.id, outgoing.thread_id);
            println!("Sent reply to: {}", draft.to);
            Outcome::Sent
        }
        Err(e) => {
            log::warn!("send to {} failed: {e:#}", draft.to);
            println!("Sending to {} failed, will retry next run.", draft.to);
            Outcome::Failed
        }
    }
}
