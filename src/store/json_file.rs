use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::store::repo::{RepliedIds, ReplyStore};

/// JSON array of message ids on disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ReplyStore for JsonFileStore {
    fn load(&self) -> Result<RepliedIds> {
        if !self.path.exists() {
            return Ok(RepliedIds::new());
        }
        let s = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let ids: Vec<String> = serde_json::from_str(&s)
            .with_context(|| format!("{} is not a JSON array of ids", self.path.display()))?;
        Ok(ids.into_iter().collect())
    }

    fn save(&self, ids: &RepliedIds) -> Result<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }

        let mut sorted: Vec<&String> = ids.iter().collect();
        sorted.sort();

        // write aside, then rename over the old file
        let tmp = self.tmp_path();
        fs::write(&tmp, serde_json::to_string(&sorted)?)
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> RepliedIds {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn missing_file_is_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("replied.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_yields_same_set() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/replied.json"));
        let set = ids(&["18c2", "18a1", "18b9"]);

        store.save(&set).unwrap();

        assert_eq!(store.load().unwrap(), set);
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn save_overwrites_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("replied.json"));

        store.save(&ids(&["a", "b"])).unwrap();
        store.save(&ids(&["c"])).unwrap();

        assert_eq!(store.load().unwrap(), ids(&["c"]));
        let raw = fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, r#"["c"]"#);
    }

    #[test]
    fn reads_files_written_by_older_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replied.json");
        fs::write(&path, r#"["x1", "x2", "x1"]"#).unwrap();

        assert_eq!(JsonFileStore::new(&path).load().unwrap(), ids(&["x1", "x2"]));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replied.json");
        fs::write(&path, "{not json").unwrap();

        assert!(JsonFileStore::new(&path).load().is_err());
    }
}
