use anyhow::Result;
use rusqlite::{Connection, params};

use crate::store::repo::{RepliedIds, ReplyStore};

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &std::path::Path) -> Result<Self> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS replied (
                message_id  TEXT PRIMARY KEY
            );
            "#,
        )?;
        Ok(())
    }
}

impl ReplyStore for SqliteStore {
    fn load(&self) -> Result<RepliedIds> {
        let mut stmt = self.conn.prepare(r#"SELECT message_id FROM replied"#)?;
        let mut rows = stmt.query([])?;
        let mut out = RepliedIds::new();
        while let Some(r) = rows.next()? {
            out.insert(r.get(0)?);
        }
        Ok(out)
    }

    fn save(&self, ids: &RepliedIds) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(r#"DELETE FROM replied"#, [])?;
        {
            let mut stmt = tx.prepare(r#"INSERT INTO replied (message_id) VALUES (?1)"#)?;
            for id in ids {
                stmt.execute(params![id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
