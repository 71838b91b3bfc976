//! The oracle: turns a craving report into a stored, scored verdict.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};

use crate::config::Config;
use crate::error::{PzError, Result};
use crate::narration::{GeminiNarrator, NarrationRequest, Narrator};
use crate::progression::{Profile, Progress, Rules};
use crate::store::{
    self, HourlyDistribution, InteractionRecord, NewInteraction, OutcomeCounts, Store,
    VerdictCount,
};
use crate::types::{format_timestamp, Outcome, UserRef};
use crate::verdict::Verdict;

/// Upper bound for history and leaderboard page sizes.
pub const MAX_LIMIT: i64 = 100;

const EVENT_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Judgement {
    pub interaction_id: i64,
    pub verdict: Verdict,
    pub profile: Profile,
    pub progress: Progress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor: Option<String>,
}

impl Judgement {
    /// Verdict headline, then the flavor line when there is one.
    pub fn message(&self) -> String {
        match &self.flavor {
            Some(flavor) => format!("{}\n{}", self.verdict.headline(), flavor),
            None => self.verdict.headline(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: i64,
    pub resisted: i64,
    pub relapsed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub stats: Stats,
    pub recent: Vec<InteractionRecord>,
    pub verdicts: Vec<VerdictCount>,
    pub leaderboard: Vec<Profile>,
    pub hourly: HourlyDistribution,
}

// ---------------------------------------------------------------------------
// Oracle
// ---------------------------------------------------------------------------

pub struct Oracle {
    store: Arc<dyn Store>,
    rules: Rules,
    narrator: Option<Arc<dyn Narrator>>,
    narrator_timeout: Duration,
    gate: Mutex<()>,
    events: broadcast::Sender<i64>,
}

impl Oracle {
    pub fn new(store: Arc<dyn Store>, rules: Rules) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            rules,
            narrator: None,
            narrator_timeout: Duration::from_millis(2500),
            gate: Mutex::new(()),
            events,
        }
    }

    pub fn with_narrator(mut self, narrator: Arc<dyn Narrator>, timeout: Duration) -> Self {
        self.narrator = Some(narrator);
        self.narrator_timeout = timeout;
        self
    }

    /// Open the configured store and wire up narration if a key is present.
    pub async fn open(config: &Config) -> Result<Self> {
        let store = store::open(&config.database.backend()?).await?;
        let oracle = Self::new(store, Rules::new(config.progression.clone()));
        match GeminiNarrator::from_config(&config.narrator)? {
            Some(narrator) => {
                tracing::info!(model = %config.narrator.model, "narration enabled");
                Ok(oracle.with_narrator(
                    Arc::new(narrator),
                    Duration::from_millis(config.narrator.timeout_ms),
                ))
            }
            None => Ok(oracle),
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Receives the id of every committed interaction.
    pub fn subscribe(&self) -> broadcast::Receiver<i64> {
        self.events.subscribe()
    }

    pub async fn judge(&self, user: &UserRef, outcome: Outcome) -> Result<Judgement> {
        self.judge_at(user, outcome, Utc::now()).await
    }

    pub async fn judge_at(
        &self,
        user: &UserRef,
        outcome: Outcome,
        now: DateTime<Utc>,
    ) -> Result<Judgement> {
        let (interaction_id, verdict, profile, progress) = {
            let _gate = self.gate.lock().await;

            let mut profile = self
                .store
                .load_profile(&user.id)
                .await?
                .unwrap_or_else(|| Profile::new(user));
            profile.display_name = user.name.clone();
            self.rules.check_cooldown(&profile, now)?;

            let progress = self.rules.apply(&mut profile, outcome, now);
            let verdict = {
                let mut rng = rand::thread_rng();
                Verdict::draw(outcome, profile.failure_streak, &mut rng)
            };

            let interaction = NewInteraction {
                user_id: profile.user_id.clone(),
                user_name: profile.display_name.clone(),
                outcome,
                verdict: verdict.headline(),
                severity: verdict.severity,
                xp_awarded: progress.xp_awarded,
                created_at: format_timestamp(now),
            };
            let id = self.store.commit(&profile, &interaction).await?;
            (id, verdict, profile, progress)
        };

        // No subscribers is fine.
        let _ = self.events.send(interaction_id);
        tracing::debug!(
            user = %profile.user_id,
            outcome = %outcome,
            interaction_id,
            xp = progress.xp_awarded,
            "interaction recorded"
        );

        let flavor = self.narrate(&profile, &verdict).await;
        Ok(Judgement {
            interaction_id,
            verdict,
            profile,
            progress,
            flavor,
        })
    }

    async fn narrate(&self, profile: &Profile, verdict: &Verdict) -> Option<String> {
        let narrator = self.narrator.as_ref()?;
        let request = NarrationRequest {
            user_name: profile.display_name.clone(),
            outcome: verdict.outcome,
            headline: verdict.headline(),
            streak: profile.streak,
            failure_streak: profile.failure_streak,
        };
        match tokio::time::timeout(self.narrator_timeout, narrator.narrate(&request)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(Ok(_)) => {
                tracing::warn!("narrator returned no text, using plain verdict");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "narration failed, using plain verdict");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.narrator_timeout.as_millis() as u64,
                    "narration timed out, using plain verdict"
                );
                None
            }
        }
    }

    pub async fn profile(&self, user_id: &str) -> Result<Profile> {
        self.store
            .load_profile(user_id.trim())
            .await?
            .ok_or_else(|| PzError::UserNotFound(user_id.trim().to_string()))
    }

    pub async fn stats(&self) -> Result<Stats> {
        let total = self.store.total_count().await?;
        let OutcomeCounts { resisted, relapsed } = self.store.outcome_counts().await?;
        Ok(Stats {
            total,
            resisted,
            relapsed,
        })
    }

    pub async fn history(&self, limit: i64) -> Result<Vec<InteractionRecord>> {
        self.store.recent_history(clamp_limit(limit)).await
    }

    pub async fn verdicts(&self) -> Result<Vec<VerdictCount>> {
        self.store.verdict_counts().await
    }

    pub async fn leaderboard(&self, limit: i64) -> Result<Vec<Profile>> {
        self.store.leaderboard(clamp_limit(limit)).await
    }

    pub async fn hourly(&self) -> Result<HourlyDistribution> {
        self.store.hourly_distribution().await
    }

    pub async fn dashboard(
        &self,
        history_limit: i64,
        leaderboard_limit: i64,
    ) -> Result<DashboardSnapshot> {
        Ok(DashboardSnapshot {
            stats: self.stats().await?,
            recent: self.history(history_limit).await?,
            verdicts: self.verdicts().await?,
            leaderboard: self.leaderboard(leaderboard_limit).await?,
            hourly: self.hourly().await?,
        })
    }
}

pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_LIMIT)
}
