use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8080/callback";

const DEFAULT_TEMPLATE: &str = "Hi {username},

This is Bunty from Bili Plugins.

We saw that your trial of this plugin has ended.
Was the plugin useful for you?

If not, we would like to know if something is missing that we could add to our plugin.

Please let us know. Any feedback would be appreciated.

Thank You.
Bili Plugins
Website: https://biliplugins.com/
Twitter(X): https://twitter.com/bili_plugins/
";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub client_id: String,
    pub user_email: Option<String>,
    pub redirect_uri: Option<String>,
    /// Where the replied-to message ids live. Defaults next to this file.
    pub replied_path: Option<String>,
    #[serde(default)]
    pub store: StoreKind,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Json,
    Sqlite,
}

/// Knobs of a single batch run.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RunConfig {
    pub lookback_days: u32,
    pub subject_phrase: String,
    /// Reply body; `{username}` is replaced with the extracted name.
    pub template: String,
    pub test_mode: bool,
    pub test_recipient: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            lookback_days: 7,
            subject_phrase: "Trial expired by".to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            test_mode: false,
            test_recipient: "yourtestemail@example.com".to_string(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lookback_days == 0 {
            bail!("run.lookback_days must be at least 1");
        }
        if self.subject_phrase.trim().is_empty() {
            bail!("run.subject_phrase must not be empty");
        }
        if !self.template.contains("{username}") {
            bail!("run.template must contain a {{username}} placeholder");
        }
        if self.test_mode && self.test_recipient.trim().is_empty() {
            bail!("run.test_recipient must be set when run.test_mode is on");
        }
        Ok(())
    }
}

impl Config {
    pub fn user_email(&self) -> Result<String> {
        self.user_email
            .clone()
            .ok_or_else(|| anyhow!("user_email not set in config"))
    }

    pub fn redirect_uri(&self) -> String {
        self.redirect_uri
            .clone()
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string())
    }
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("trial_followup"))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("config.toml");
    Ok(p)
}

pub fn default_replied_path(kind: StoreKind) -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    match kind {
        StoreKind::Json => p.push("replied.json"),
        StoreKind::Sqlite => p.push("replied.db"),
    }
    Ok(p)
}

pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        // create a template config for users to edit
        let sample = Config {
            client_id: "YOUR_CLIENT_ID.apps.googleusercontent.com".to_string(),
            user_email: Some("you@example.com".to_string()),
            redirect_uri: Some(DEFAULT_REDIRECT_URI.to_string()),
            replied_path: None,
            store: StoreKind::Json,
            run: RunConfig::default(),
        };
        let tom = toml::to_string_pretty(&sample)?;
        fs::write(&path, tom)?;
        return Err(anyhow::anyhow!(
            "Created template config at {}; edit it and run again",
            path.display()
        ));
    }
    let s = fs::read_to_string(path)?;
    parse_config(&s)
}

pub fn parse_config(s: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(s)?;
    cfg.run.validate()?;
    Ok(cfg)
}

pub fn resolve_replied_path(cfg: &Config) -> Result<PathBuf> {
    if let Some(p) = &cfg.replied_path {
        Ok(PathBuf::from(p))
    } else {
        default_replied_path(cfg.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_section_defaults_to_builtin_constants() {
        let cfg = parse_config(
            r#"
            client_id = "abc.apps.googleusercontent.com"
            user_email = "me@example.com"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.store, StoreKind::Json);
        assert_eq!(cfg.run, RunConfig::default());
        assert_eq!(cfg.run.lookback_days, 7);
        assert!(cfg.run.template.starts_with("Hi {username},"));
        assert_eq!(cfg.redirect_uri(), DEFAULT_REDIRECT_URI);
    }

    #[test]
    fn partial_run_section_keeps_other_defaults() {
        let cfg = parse_config(
            r#"
            client_id = "abc"
            store = "sqlite"

            [run]
            test_mode = true
            test_recipient = "qa@example.com"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.store, StoreKind::Sqlite);
        assert!(cfg.run.test_mode);
        assert_eq!(cfg.run.test_recipient, "qa@example.com");
        assert_eq!(cfg.run.subject_phrase, "Trial expired by");
        assert!(cfg.user_email().is_err());
    }

    #[test]
    fn rejects_template_without_placeholder() {
        let err = parse_config(
            r#"
            client_id = "abc"

            [run]
            template = "Hello there"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("{username}"));
    }

    #[test]
    fn rejects_zero_lookback() {
        let run = RunConfig {
            lookback_days: 0,
            ..RunConfig::default()
        };
        assert!(run.validate().is_err());
    }

    #[test]
    fn rejects_test_mode_without_recipient() {
        let run = RunConfig {
            test_mode: true,
            test_recipient: "  ".to_string(),
            ..RunConfig::default()
        };
        assert!(run.validate().is_err());
    }
}
