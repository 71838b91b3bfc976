//! Discord over HTTP interactions: Discord POSTs each slash command to
//! `/discord/interactions`, signed with the application's Ed25519 key, and
//! the reply goes back in the response body. No gateway connection.

pub mod interaction;
pub mod register;
pub mod verify;

pub use interaction::{respond, Interaction, InteractionResponse};
pub use register::{commands, register_commands, DISCORD_API_BASE};
pub use verify::SignatureVerifier;

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("invalid Discord public key: {0}")]
    InvalidPublicKey(String),

    #[error("malformed request signature")]
    MalformedSignature,

    #[error("request signature does not match")]
    BadSignature,

    #[error("Discord API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
