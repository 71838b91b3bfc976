use serde_json::{json, Value};

use super::DiscordError;

pub const DISCORD_API_BASE: &str = "https://discord.com";

const CHAT_INPUT: u8 = 1;
const OPTION_USER: u8 = 6;

/// Global slash command definitions.
pub fn commands() -> Value {
    json!([
        {
            "name": "oracle",
            "type": CHAT_INPUT,
            "description": "Confess a relapse and receive your penance",
        },
        {
            "name": "resist",
            "type": CHAT_INPUT,
            "description": "Report a craving you resisted",
        },
        {
            "name": "profile",
            "type": CHAT_INPUT,
            "description": "Show XP, level and streaks",
            "options": [{
                "name": "user",
                "type": OPTION_USER,
                "description": "Whose profile to show (defaults to you)",
                "required": false,
            }],
        },
        {
            "name": "leaderboard",
            "type": CHAT_INPUT,
            "description": "The most disciplined users",
        },
    ])
}

/// Bulk-overwrite the application's global commands. Returns how many
/// commands Discord now reports.
pub async fn register_commands(
    http: &reqwest::Client,
    base_url: &str,
    application_id: &str,
    token: &str,
) -> Result<usize, DiscordError> {
    let url = format!(
        "{}/api/v10/applications/{}/commands",
        base_url.trim_end_matches('/'),
        application_id
    );
    let resp = http
        .put(&url)
        .header(reqwest::header::AUTHORIZATION, format!("Bot {token}"))
        .json(&commands())
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(DiscordError::Api {
            status: status.as_u16(),
            body,
        });
    }
    let registered: Vec<Value> = resp.json().await?;
    tracing::info!(count = registered.len(), "registered Discord commands");
    Ok(registered.len())
}
