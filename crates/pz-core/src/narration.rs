//! Optional LLM flavor text for verdicts.
//!
//! Narration decorates a verdict that has already been decided and stored.
//! It never changes the penance.

use async_trait::async_trait;
use gemini_client::GeminiClient;

use crate::config::NarratorConfig;
use crate::error::{PzError, Result};
use crate::types::Outcome;

/// Hard cap on narration length asked of the model.
pub const MAX_WORDS: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationRequest {
    pub user_name: String,
    pub outcome: Outcome,
    pub headline: String,
    pub streak: i64,
    pub failure_streak: i64,
}

impl NarrationRequest {
    pub fn system_prompt(&self) -> String {
        format!(
            "You are Loki, the mischievous god presiding over Protocol Zero, a discipline \
             game. Reply with exactly one sentence of at most {MAX_WORDS} words. No emoji, \
             no quotation marks, no lists."
        )
    }

    pub fn prompt(&self) -> String {
        match self.outcome {
            Outcome::Relapsed => format!(
                "{name} gave in to a craving (relapse number {n} in a row). Their assigned \
                 penance is: {headline}. Insult them in one witty sentence. Do not change, \
                 soften or replace the penance.",
                name = self.user_name,
                n = self.failure_streak,
                headline = self.headline,
            ),
            Outcome::Resisted => format!(
                "{name} resisted a craving and is on a streak of {n}. Grudgingly praise \
                 them in one sentence.",
                name = self.user_name,
                n = self.streak,
            ),
        }
    }
}

/// Turns a verdict into a line of flavor text.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, request: &NarrationRequest) -> Result<String>;
}

/// Trim model output to a single clean line capped at [`MAX_WORDS`].
pub fn clean(text: &str) -> Option<String> {
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())?
        .trim_matches('"');
    let words: Vec<&str> = line.split_whitespace().take(MAX_WORDS).collect();
    if words.is_empty() {
        return None;
    }
    Some(words.join(" "))
}

// ---------------------------------------------------------------------------
// GeminiNarrator
// ---------------------------------------------------------------------------

pub struct GeminiNarrator {
    client: GeminiClient,
    model: String,
}

impl GeminiNarrator {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Build a narrator when the config enables one and carries a key.
    pub fn from_config(config: &NarratorConfig) -> Result<Option<Self>> {
        let Some(key) = config.active_key() else {
            return Ok(None);
        };
        let client = GeminiClient::new(key, None)?;
        Ok(Some(Self::new(client, config.model.clone())))
    }
}

#[async_trait]
impl Narrator for GeminiNarrator {
    async fn narrate(&self, request: &NarrationRequest) -> Result<String> {
        let raw = self
            .client
            .generate(&self.model, Some(&request.system_prompt()), &request.prompt())
            .await?;
        clean(&raw).ok_or_else(|| PzError::Narration("model returned only whitespace".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(outcome: Outcome) -> NarrationRequest {
        NarrationRequest {
            user_name: "Ariel".into(),
            outcome,
            headline: "[BRUTAL] 100 Burpees.".into(),
            streak: 4,
            failure_streak: 2,
        }
    }

    #[test]
    fn relapse_prompt_quotes_penance_and_forbids_changes() {
        let prompt = request(Outcome::Relapsed).prompt();
        assert!(prompt.contains("Ariel"));
        assert!(prompt.contains("[BRUTAL] 100 Burpees."));
        assert!(prompt.contains("relapse number 2"));
        assert!(prompt.contains("Do not change"));
    }

    #[test]
    fn resist_prompt_mentions_streak_not_penance() {
        let prompt = request(Outcome::Resisted).prompt();
        assert!(prompt.contains("streak of 4"));
        assert!(!prompt.contains("Burpees"));
    }

    #[test]
    fn prompts_are_deterministic() {
        assert_eq!(
            request(Outcome::Relapsed).prompt(),
            request(Outcome::Relapsed).prompt()
        );
        assert!(request(Outcome::Resisted)
            .system_prompt()
            .contains("at most 30 words"));
    }

    #[test]
    fn clean_takes_first_line_and_caps_words() {
        assert_eq!(
            clean("\n  \"Pathetic, truly.\"  \nsecond line").as_deref(),
            Some("Pathetic, truly.")
        );
        let long = "word ".repeat(50);
        assert_eq!(clean(&long).unwrap().split(' ').count(), MAX_WORDS);
        assert_eq!(clean("   \n \n"), None);
    }

    #[test]
    fn narrator_requires_enabled_key() {
        let mut config = NarratorConfig::default();
        assert!(GeminiNarrator::from_config(&config).unwrap().is_none());

        config.api_key = Some("k".into());
        assert!(GeminiNarrator::from_config(&config).unwrap().is_some());

        config.enabled = false;
        assert!(GeminiNarrator::from_config(&config).unwrap().is_none());
    }
}
