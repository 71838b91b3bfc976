use pz_core::oracle::{Judgement, Oracle};
use pz_core::progression::Profile;
use pz_core::types::{Outcome, UserRef};
use pz_core::PzError;
use serde::{Deserialize, Serialize};

pub const PING: u8 = 1;
pub const APPLICATION_COMMAND: u8 = 2;

const PONG: u8 = 1;
const CHANNEL_MESSAGE: u8 = 4;
const EPHEMERAL: u64 = 1 << 6;

const LEADERBOARD_SIZE: i64 = 5;

// ---------------------------------------------------------------------------
// Incoming
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub data: Option<CommandData>,
    /// Present in guilds.
    #[serde(default)]
    pub member: Option<Member>,
    /// Present in DMs.
    #[serde(default)]
    pub user: Option<User>,
}

impl Interaction {
    pub fn invoker(&self) -> Option<&User> {
        self.member
            .as_ref()
            .and_then(|m| m.user.as_ref())
            .or(self.user.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandData {
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

impl CommandData {
    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.name == name)
            .and_then(|o| o.value.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.global_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

// ---------------------------------------------------------------------------
// Outgoing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseData {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind: PONG,
            data: None,
        }
    }

    pub fn message(content: impl Into<String>) -> Self {
        Self {
            kind: CHANNEL_MESSAGE,
            data: Some(ResponseData {
                content: content.into(),
                flags: None,
            }),
        }
    }

    /// Visible only to the invoking user.
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            kind: CHANNEL_MESSAGE,
            data: Some(ResponseData {
                content: content.into(),
                flags: Some(EPHEMERAL),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub async fn respond(oracle: &Oracle, interaction: Interaction) -> InteractionResponse {
    match interaction.kind {
        PING => InteractionResponse::pong(),
        APPLICATION_COMMAND => command(oracle, &interaction).await,
        other => {
            tracing::debug!(kind = other, "ignoring unsupported interaction type");
            InteractionResponse::ephemeral("The Oracle does not understand this request.")
        }
    }
}

async fn command(oracle: &Oracle, interaction: &Interaction) -> InteractionResponse {
    let Some(data) = interaction.data.as_ref() else {
        return InteractionResponse::ephemeral("Missing command data.");
    };
    let Some(invoker) = interaction.invoker() else {
        return InteractionResponse::ephemeral("The Oracle cannot tell who you are.");
    };
    let user = match UserRef::new(&invoker.id, Some(invoker.display_name())) {
        Ok(user) => user,
        Err(e) => return InteractionResponse::ephemeral(e.to_string()),
    };

    match data.name.as_str() {
        "oracle" => judge(oracle, &user, Outcome::Relapsed).await,
        "resist" => judge(oracle, &user, Outcome::Resisted).await,
        "profile" => {
            let target = data.option_str("user").unwrap_or(&user.id);
            match oracle.profile(target).await {
                Ok(profile) => InteractionResponse::message(profile_reply(&profile)),
                Err(PzError::UserNotFound(_)) => InteractionResponse::ephemeral(
                    "No record yet. Use /resist or /oracle to begin.",
                ),
                Err(e) => unavailable(e),
            }
        }
        "leaderboard" => match oracle.leaderboard(LEADERBOARD_SIZE).await {
            Ok(top) => InteractionResponse::message(leaderboard_reply(&top)),
            Err(e) => unavailable(e),
        },
        other => InteractionResponse::ephemeral(format!("Unknown command `/{other}`.")),
    }
}

async fn judge(oracle: &Oracle, user: &UserRef, outcome: Outcome) -> InteractionResponse {
    match oracle.judge(user, outcome).await {
        Ok(judgement) => InteractionResponse::message(verdict_reply(&judgement)),
        Err(PzError::CooldownActive { remaining_secs }) => InteractionResponse::ephemeral(
            format!("The Oracle is resting. Try again in {remaining_secs}s."),
        ),
        Err(e) => unavailable(e),
    }
}

fn unavailable(e: PzError) -> InteractionResponse {
    tracing::error!(error = %e, "Discord command failed");
    InteractionResponse::ephemeral("The Oracle is unavailable right now.")
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

pub fn verdict_reply(judgement: &Judgement) -> String {
    let p = &judgement.progress;
    let mut line = format!(
        "`+{} XP | Level {} | Streak {}`",
        p.xp_awarded, p.level, judgement.profile.streak
    );
    if p.leveled_up {
        line.push_str(&format!(" **LEVEL UP! {} -> {}**", p.previous_level, p.level));
    }
    format!("**The Oracle Speaks:**\n{}\n{}", judgement.message(), line)
}

pub fn profile_reply(profile: &Profile) -> String {
    format!(
        "**{}**: Level {} ({} XP)\nStreak {} (best {}) | Resisted {} | Relapsed {}",
        profile.display_name,
        profile.level,
        profile.xp,
        profile.streak,
        profile.best_streak,
        profile.resisted_total,
        profile.relapsed_total,
    )
}

pub fn leaderboard_reply(top: &[Profile]) -> String {
    if top.is_empty() {
        return "The leaderboard is empty. Nobody has faced the Oracle yet.".to_string();
    }
    let mut out = String::from("**Leaderboard**");
    for (rank, p) in top.iter().enumerate() {
        out.push_str(&format!(
            "\n{}. {} | Level {} | {} XP | best streak {}",
            rank + 1,
            p.display_name,
            p.level,
            p.xp,
            p.best_streak
        ));
    }
    out
}
