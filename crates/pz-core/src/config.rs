use crate::error::{PzError, Result};
use crate::store::Backend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "protocol-zero.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// DatabaseConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres://…` for the hosted backend, `sqlite:…` or a file path for
    /// the embedded one. Unset means the embedded default file.
    #[serde(default, skip_serializing)]
    pub url: Option<String>,
}

impl DatabaseConfig {
    pub fn backend(&self) -> Result<Backend> {
        match self.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => Backend::from_url(url),
            None => Ok(Backend::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// ProgressionConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_resist_xp")]
    pub resist_xp: i64,
    #[serde(default = "default_streak_bonus_xp")]
    pub streak_bonus_xp: i64,
    #[serde(default = "default_streak_bonus_cap")]
    pub streak_bonus_cap: i64,
    #[serde(default)]
    pub relapse_xp: i64,
    #[serde(default = "default_xp_per_level")]
    pub xp_per_level: i64,
}

fn default_cooldown_secs() -> u64 {
    60
}

fn default_resist_xp() -> i64 {
    10
}

fn default_streak_bonus_xp() -> i64 {
    2
}

fn default_streak_bonus_cap() -> i64 {
    5
}

fn default_xp_per_level() -> i64 {
    100
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
            resist_xp: default_resist_xp(),
            streak_bonus_xp: default_streak_bonus_xp(),
            streak_bonus_cap: default_streak_bonus_cap(),
            relapse_xp: 0,
            xp_per_level: default_xp_per_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// DiscordConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token, only needed to register slash commands.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    #[serde(default)]
    pub application_id: Option<String>,
    /// Hex-encoded Ed25519 key used to verify interaction requests.
    #[serde(default)]
    pub public_key: Option<String>,
}

// ---------------------------------------------------------------------------
// NarratorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarratorConfig {
    #[serde(default = "default_narrator_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_narrator_enabled() -> bool {
    true
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

/// Keeps a decorated reply inside Discord's three-second interaction window.
fn default_timeout_ms() -> u64 {
    2500
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            enabled: default_narrator_enabled(),
            api_key: None,
            model: default_model(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl NarratorConfig {
    /// The API key, if narration is enabled and a non-blank key is set.
    pub fn active_key(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub progression: ProgressionConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub narrator: NarratorConfig,
}

impl Config {
    /// Load the YAML file (explicit path, else `protocol-zero.yaml` in the
    /// working directory when present, else defaults) and apply process
    /// environment overrides on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(&fallback)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            PzError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(data)?)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(port) = get("PZ_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| PzError::InvalidConfig(format!("PZ_PORT is not a port: {port}")))?;
        }
        if let Some(secs) = get("PZ_COOLDOWN_SECS") {
            self.progression.cooldown_secs = secs.trim().parse().map_err(|_| {
                PzError::InvalidConfig(format!("PZ_COOLDOWN_SECS is not a number: {secs}"))
            })?;
        }
        if let Some(token) = get("DISCORD_TOKEN") {
            self.discord.token = Some(token);
        }
        if let Some(id) = get("DISCORD_APPLICATION_ID") {
            self.discord.application_id = Some(id);
        }
        if let Some(key) = get("DISCORD_PUBLIC_KEY") {
            self.discord.public_key = Some(key);
        }
        if let Some(key) = get("GEMINI_API_KEY") {
            self.narrator.api_key = Some(key);
        }
        if let Some(model) = get("GEMINI_MODEL") {
            self.narrator.model = model;
        }
        Ok(())
    }

    /// Check the configuration for problems. Errors make the config unusable;
    /// warnings only disable optional features.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut out = Vec::new();
        let mut error = |message: String| {
            out.push(ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
        };

        if self.progression.xp_per_level <= 0 {
            error("progression.xp_per_level must be positive".into());
        }
        if self.progression.resist_xp < 0
            || self.progression.relapse_xp < 0
            || self.progression.streak_bonus_xp < 0
            || self.progression.streak_bonus_cap < 0
        {
            error("progression XP values must not be negative".into());
        }
        if let Err(e) = self.database.backend() {
            error(e.to_string());
        }

        let mut warn = |message: &str| {
            out.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: message.to_string(),
            })
        };
        if self.discord.public_key.is_none() {
            warn("DISCORD_PUBLIC_KEY not set: Discord interactions endpoint disabled");
        }
        if self.narrator.enabled && self.narrator.active_key().is_none() {
            warn("GEMINI_API_KEY not set: verdicts will not be narrated");
        }
        out
    }

    /// First validation error, if any.
    pub fn ensure_valid(&self) -> Result<()> {
        match self
            .validate()
            .into_iter()
            .find(|w| w.level == WarnLevel::Error)
        {
            Some(w) => Err(PzError::InvalidConfig(w.message)),
            None => Ok(()),
        }
    }
}
