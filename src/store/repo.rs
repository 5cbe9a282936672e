use anyhow::Result;
use std::collections::HashSet;

/// Message ids that already received a reply.
pub type RepliedIds = HashSet<String>;

/// Durable home of the replied-to set. Loaded once per run, saved whole.
pub trait ReplyStore {
    /// A store that was never written yields an empty set.
    fn load(&self) -> Result<RepliedIds>;
    /// Replace the persisted set with `ids`.
    fn save(&self, ids: &RepliedIds) -> Result<()>;
}
