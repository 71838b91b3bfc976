use thiserror::Error;

#[derive(Debug, Error)]
pub enum PzError {
    #[error("unknown outcome '{0}': expected 'resisted' or 'relapsed'")]
    UnknownOutcome(String),

    #[error("invalid user: {0}")]
    InvalidUser(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("cooldown active: try again in {remaining_secs}s")]
    CooldownActive { remaining_secs: u64 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("narration failed: {0}")]
    Narration(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Postgres(#[from] sqlx::Error),

    #[error(transparent)]
    Gemini(#[from] gemini_client::GeminiError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PzError>;
