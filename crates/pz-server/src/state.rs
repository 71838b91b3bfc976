use std::sync::Arc;

use pz_core::config::DiscordConfig;
use pz_core::oracle::Oracle;

use crate::discord::{DiscordError, SignatureVerifier};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub oracle: Arc<Oracle>,
    /// `None` disables `/discord/interactions`.
    pub discord: Option<SignatureVerifier>,
}

impl AppState {
    pub fn new(oracle: Arc<Oracle>) -> Self {
        Self {
            oracle,
            discord: None,
        }
    }

    pub fn with_discord(mut self, verifier: SignatureVerifier) -> Self {
        self.discord = Some(verifier);
        self
    }

    /// Enable Discord interactions when a public key is configured.
    pub fn from_config(oracle: Arc<Oracle>, discord: &DiscordConfig) -> Result<Self, DiscordError> {
        let state = Self::new(oracle);
        match discord.public_key.as_deref() {
            Some(key) => Ok(state.with_discord(SignatureVerifier::from_hex(key)?)),
            None => Ok(state),
        }
    }
}
