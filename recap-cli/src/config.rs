//! Credential loading.
//!
//! Secrets come from the environment only (optionally via a `.env` file),
//! never from command line arguments.

use anyhow::{Context, Result};

/// Environment variable holding the chat (IRC) OAuth token.
const CHAT_TOKEN_VAR: &str = "RECAP_CHAT_TOKEN";
/// Environment variable holding the registered application client id.
const CLIENT_ID_VAR: &str = "RECAP_CLIENT_ID";
/// Environment variable holding the Helix API access token.
const API_TOKEN_VAR: &str = "RECAP_API_TOKEN";

#[derive(Debug, Clone)]
pub struct Credentials {
    pub chat_token: String,
    pub client_id: String,
    pub api_token: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            chat_token: require(CHAT_TOKEN_VAR)?,
            client_id: require(CLIENT_ID_VAR)?,
            api_token: require(API_TOKEN_VAR)?,
        })
    }
}

fn require(var: &str) -> Result<String> {
    let value = std::env::var(var).with_context(|| format!("missing environment variable {var}"))?;
    if value.trim().is_empty() {
        anyhow::bail!("environment variable {var} is empty");
    }
    Ok(value)
}
