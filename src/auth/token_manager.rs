use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::{oauth, token_store, tokens_file};
use crate::config::Config;

/// Assumed lifetime when Google omits `expires_in`.
const FALLBACK_LIFETIME_SECS: i64 = 3500;

/// An authenticated handle for the mail API.
#[derive(Clone)]
pub struct Session {
    pub access_token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct TokenManager {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub user_email: String,
    pub tokens_path: PathBuf,
}

impl TokenManager {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let client_id = cfg.client_id.clone();
        let client_secret = token_store::load_client_secret(&client_id)?
            .or_else(|| std::env::var("OAUTH_CLIENT_SECRET").ok());

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri: cfg.redirect_uri(),
            user_email: cfg.user_email()?,
            tokens_path: tokens_file::default_tokens_path()?,
        })
    }

    /// Returns a valid session: cached token, then refresh, then interactive PKCE.
    pub fn authenticate(&self) -> Result<Session> {
        self.access_token()
            .map(|access_token| Session { access_token })
            .context("authentication with the mail provider failed")
    }

    fn access_token(&self) -> Result<String> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;

        if let Some(at) = tokens_file::load_tokens(&self.tokens_path)?.and_then(|tf| tf.valid_at(now))
        {
            log::debug!("using cached access token");
            return Ok(at);
        }

        let refreshed = match token_store::load_refresh_token(&self.user_email)? {
            Some(rt) => {
                log::info!("refreshing access token for {}", self.user_email);
                match oauth::refresh_access_token(&self.client_id, self.client_secret.as_deref(), &rt)
                {
                    Ok(t) => Some(t),
                    Err(e) => {
                        log::warn!("refresh failed: {e:#}, falling back to interactive auth");
                        None
                    }
                }
            }
            None => None,
        };

        let tokens = match refreshed {
            Some(t) => t,
            None => {
                println!("Running interactive OAuth flow for {}...", self.user_email);
                oauth::perform_pkce_flow(
                    &self.client_id,
                    self.client_secret.as_deref(),
                    &self.redirect_uri,
                )?
            }
        };

        // keyring failures are not fatal, the next run just re-authorizes
        if let Some(rt) = &tokens.refresh_token
            && let Err(e) = token_store::save_refresh_token(&self.user_email, rt)
        {
            log::warn!("could not store refresh token in keyring: {e}");
        }

        let exp = tokens
            .expires_in
            .map(|s| now + s as i64)
            .unwrap_or(now + FALLBACK_LIFETIME_SECS);
        tokens_file::save_tokens(&self.tokens_path, &tokens.access_token, exp)?;
        Ok(tokens.access_token)
    }
}
