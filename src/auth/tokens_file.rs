use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Non-secret token metadata cached between runs.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokensFile {
    pub access_token: Option<String>,
    pub expires_at_epoch: Option<i64>, // epoch seconds
}

impl TokensFile {
    /// The cached access token, if it is still valid at `now`.
    pub fn valid_at(self, now: i64) -> Option<String> {
        match (self.access_token, self.expires_at_epoch) {
            (Some(at), Some(exp)) if now < exp => Some(at),
            _ => None,
        }
    }
}

pub fn default_tokens_path() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("trial_followup");
    fs::create_dir_all(&dir)?;
    Ok(dir.join("tokens.json"))
}

pub fn save_tokens(path: &Path, access_token: &str, expires_at_epoch: i64) -> Result<()> {
    let tf = TokensFile {
        access_token: Some(access_token.to_string()),
        expires_at_epoch: Some(expires_at_epoch),
    };
    fs::write(path, serde_json::to_string_pretty(&tf)?)?;
    Ok(())
}

/// Load the tokens file if present
pub fn load_tokens(path: &Path) -> Result<Option<TokensFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&s)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_token_only_used_before_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        assert!(load_tokens(&path).unwrap().is_none());

        save_tokens(&path, "ya29.token", 1_000).unwrap();

        let cached = load_tokens(&path).unwrap().unwrap();
        assert_eq!(cached.valid_at(999).as_deref(), Some("ya29.token"));

        let cached = load_tokens(&path).unwrap().unwrap();
        assert_eq!(cached.valid_at(1_000), None);
    }
}
