//! XP, level and streak bookkeeping.
//!
//! Everything here is pure: callers pass `now` in and persist the mutated
//! [`Profile`] themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ProgressionConfig;
use crate::error::{PzError, Result};
use crate::types::{Outcome, UserRef};

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub display_name: String,
    pub xp: i64,
    pub level: i64,
    /// Consecutive resists.
    pub streak: i64,
    pub best_streak: i64,
    /// Consecutive relapses.
    pub failure_streak: i64,
    pub resisted_total: i64,
    pub relapsed_total: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_event_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// A user who has never submitted anything.
    pub fn new(user: &UserRef) -> Self {
        Self {
            user_id: user.id.clone(),
            display_name: user.name.clone(),
            xp: 0,
            level: 1,
            streak: 0,
            best_streak: 0,
            failure_streak: 0,
            resisted_total: 0,
            relapsed_total: 0,
            last_event_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// What one accepted submission did to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub xp_awarded: i64,
    pub previous_level: i64,
    pub level: i64,
    pub leveled_up: bool,
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Rules {
    config: ProgressionConfig,
}

impl Rules {
    pub fn new(config: ProgressionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    pub fn level_for_xp(&self, xp: i64) -> i64 {
        let per_level = self.config.xp_per_level.max(1);
        1 + xp.max(0) / per_level
    }

    /// Seconds left before `profile` may submit again, or `None` if free.
    pub fn cooldown_remaining(&self, profile: &Profile, now: DateTime<Utc>) -> Option<u64> {
        let cooldown = self.config.cooldown_secs;
        if cooldown == 0 {
            return None;
        }
        let last = profile.last_event_at?;
        let elapsed_ms = (now - last).num_milliseconds().max(0) as u64;
        let cooldown_ms = cooldown.saturating_mul(1000);
        if elapsed_ms >= cooldown_ms {
            return None;
        }
        let remaining_ms = cooldown_ms - elapsed_ms;
        Some(remaining_ms.div_ceil(1000).max(1))
    }

    pub fn check_cooldown(&self, profile: &Profile, now: DateTime<Utc>) -> Result<()> {
        match self.cooldown_remaining(profile, now) {
            Some(remaining_secs) => Err(PzError::CooldownActive { remaining_secs }),
            None => Ok(()),
        }
    }

    /// XP a resist earns when it brings the streak to `streak`.
    pub fn resist_xp(&self, streak: i64) -> i64 {
        let bonus_steps = (streak - 1).clamp(0, self.config.streak_bonus_cap.max(0));
        self.config.resist_xp + self.config.streak_bonus_xp * bonus_steps
    }

    /// Apply `outcome` to `profile`. Does not check the cooldown.
    pub fn apply(&self, profile: &mut Profile, outcome: Outcome, now: DateTime<Utc>) -> Progress {
        let previous_level = profile.level;

        let xp_awarded = match outcome {
            Outcome::Resisted => {
                profile.streak += 1;
                profile.best_streak = profile.best_streak.max(profile.streak);
                profile.failure_streak = 0;
                profile.resisted_total += 1;
                self.resist_xp(profile.streak)
            }
            Outcome::Relapsed => {
                profile.streak = 0;
                profile.failure_streak += 1;
                profile.relapsed_total += 1;
                self.config.relapse_xp.max(0)
            }
        };

        profile.xp += xp_awarded;
        profile.level = self.level_for_xp(profile.xp);
        profile.last_event_at = Some(now);

        Progress {
            xp_awarded,
            previous_level,
            level: profile.level,
            leveled_up: profile.level > previous_level,
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new(ProgressionConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn fresh() -> Profile {
        Profile::new(&UserRef::new("u1", Some("Ariel")).unwrap())
    }

    #[test]
    fn new_profile_starts_at_level_one() {
        let p = fresh();
        assert_eq!(p.level, 1);
        assert_eq!(p.xp, 0);
        assert!(p.last_event_at.is_none());
        assert_eq!(p.resisted_total + p.relapsed_total, 0);
    }

    #[test]
    fn resist_grows_streak_and_bonus() {
        let rules = Rules::default();
        let mut p = fresh();

        let awarded: Vec<i64> = (0..8)
            .map(|i| {
                rules
                    .apply(&mut p, Outcome::Resisted, t0() + Duration::hours(i))
                    .xp_awarded
            })
            .collect();

        // 10 base, +2 per prior streak step, capped after five steps.
        assert_eq!(awarded, vec![10, 12, 14, 16, 18, 20, 20, 20]);
        assert_eq!(p.streak, 8);
        assert_eq!(p.best_streak, 8);
        assert_eq!(p.resisted_total, 8);
        assert_eq!(p.xp, 130);
        assert_eq!(p.level, 2);
    }

    #[test]
    fn relapse_resets_streak_but_keeps_best_and_xp() {
        let rules = Rules::default();
        let mut p = fresh();
        rules.apply(&mut p, Outcome::Resisted, t0());
        rules.apply(&mut p, Outcome::Resisted, t0() + Duration::hours(1));
        let xp_before = p.xp;

        let progress = rules.apply(&mut p, Outcome::Relapsed, t0() + Duration::hours(2));

        assert_eq!(progress.xp_awarded, 0);
        assert_eq!(p.xp, xp_before);
        assert_eq!(p.streak, 0);
        assert_eq!(p.best_streak, 2);
        assert_eq!(p.failure_streak, 1);
        assert_eq!(p.relapsed_total, 1);
    }

    #[test]
    fn resist_clears_failure_streak() {
        let rules = Rules::default();
        let mut p = fresh();
        rules.apply(&mut p, Outcome::Relapsed, t0());
        rules.apply(&mut p, Outcome::Relapsed, t0() + Duration::hours(1));
        assert_eq!(p.failure_streak, 2);

        rules.apply(&mut p, Outcome::Resisted, t0() + Duration::hours(2));
        assert_eq!(p.failure_streak, 0);
        assert_eq!(p.streak, 1);
    }

    #[test]
    fn level_up_is_reported_once() {
        let rules = Rules::new(ProgressionConfig {
            xp_per_level: 20,
            ..ProgressionConfig::default()
        });
        let mut p = fresh();

        let first = rules.apply(&mut p, Outcome::Resisted, t0());
        assert!(!first.leveled_up);
        assert_eq!(first.level, 1);

        let second = rules.apply(&mut p, Outcome::Resisted, t0() + Duration::hours(1));
        assert!(second.leveled_up);
        assert_eq!(second.previous_level, 1);
        assert_eq!(second.level, 2);
    }

    #[test]
    fn negative_bonus_cap_means_no_bonus() {
        let rules = Rules::new(ProgressionConfig {
            streak_bonus_cap: -3,
            ..ProgressionConfig::default()
        });
        assert_eq!(rules.resist_xp(1), 10);
        assert_eq!(rules.resist_xp(6), 10);
    }

    #[test]
    fn negative_relapse_xp_never_reduces_xp() {
        let rules = Rules::new(ProgressionConfig {
            relapse_xp: -50,
            ..ProgressionConfig::default()
        });
        let mut p = fresh();
        rules.apply(&mut p, Outcome::Resisted, t0());
        let progress = rules.apply(&mut p, Outcome::Relapsed, t0() + Duration::hours(1));
        assert_eq!(progress.xp_awarded, 0);
        assert_eq!(p.xp, 10);
    }

    #[test]
    fn level_for_xp_is_linear() {
        let rules = Rules::default();
        assert_eq!(rules.level_for_xp(0), 1);
        assert_eq!(rules.level_for_xp(99), 1);
        assert_eq!(rules.level_for_xp(100), 2);
        assert_eq!(rules.level_for_xp(250), 3);
        assert_eq!(rules.level_for_xp(-5), 1);
    }

    #[test]
    fn cooldown_blocks_rapid_submissions() {
        let rules = Rules::default();
        let mut p = fresh();
        rules.apply(&mut p, Outcome::Relapsed, t0());

        let err = rules
            .check_cooldown(&p, t0() + Duration::seconds(15))
            .unwrap_err();
        assert!(matches!(err, PzError::CooldownActive { remaining_secs: 45 }));

        assert!(rules.check_cooldown(&p, t0() + Duration::seconds(60)).is_ok());
    }

    #[test]
    fn cooldown_rounds_partial_seconds_up() {
        let rules = Rules::default();
        let mut p = fresh();
        rules.apply(&mut p, Outcome::Relapsed, t0());

        let remaining = rules.cooldown_remaining(&p, t0() + Duration::milliseconds(59_500));
        assert_eq!(remaining, Some(1));
    }

    #[test]
    fn future_last_event_counts_as_just_now() {
        let rules = Rules::default();
        let mut p = fresh();
        p.last_event_at = Some(t0() + Duration::minutes(10));
        assert_eq!(rules.cooldown_remaining(&p, t0()), Some(60));
    }

    #[test]
    fn zero_cooldown_disables_guard() {
        let rules = Rules::new(ProgressionConfig {
            cooldown_secs: 0,
            ..ProgressionConfig::default()
        });
        let mut p = fresh();
        rules.apply(&mut p, Outcome::Relapsed, t0());
        assert!(rules.check_cooldown(&p, t0()).is_ok());
    }

    #[test]
    fn first_submission_has_no_cooldown() {
        let rules = Rules::default();
        assert!(rules.check_cooldown(&fresh(), t0()).is_ok());
    }
}
