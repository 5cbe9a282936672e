pub mod json_file;
pub mod repo;
pub mod sqlite;

use anyhow::Result;
use std::path::Path;

use crate::config::StoreKind;
use json_file::JsonFileStore;
use repo::ReplyStore;
use sqlite::SqliteStore;

/// Open the configured backend at `path`.
pub fn open_store(kind: StoreKind, path: &Path) -> Result<Box<dyn ReplyStore>> {
    let store: Box<dyn ReplyStore> = match kind {
        StoreKind::Json => Box::new(JsonFileStore::new(path)),
        StoreKind::Sqlite => Box::new(SqliteStore::open(path)?),
    };
    Ok(store)
}
