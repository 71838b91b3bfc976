//! Penance tiers, streak-keyed tier weights, and the praise pool.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::Severity;

const MILD: &[&str] = &[
    "Drink a glass of water.",
    "Take 3 deep breaths.",
    "Stretch for 1 minute.",
];

const STANDARD: &[&str] = &[
    "20 Push-ups. Now.",
    "Wall Sit (60 seconds).",
    "Write 'I have no discipline' 10 times.",
    "Clean your toilet.",
];

const BRUTAL: &[&str] = &[
    "Cold Shower (2 minutes).",
    "100 Burpees.",
    "Donate $10 to a charity you hate.",
    "Call your mother and tell her you love her (but don't explain why).",
];

const PRAISE: &[&str] = &[
    "The craving knocked. Nobody answered.",
    "Discipline logged. The Oracle is mildly impressed.",
    "Another wave survived. Keep your guard up.",
    "You held the line. Loki is disappointed.",
    "Willpower +1. Do not get cocky.",
];

/// Tier weights `[mild, standard, brutal]`, in percent, for each streak band.
/// Indexed by [`streak_band`].
const WEIGHTS: [[u32; 3]; 3] = [[60, 35, 5], [20, 60, 20], [5, 35, 60]];

/// Tasks belonging to `severity`.
pub fn tasks(severity: Severity) -> &'static [&'static str] {
    match severity {
        Severity::Mild => MILD,
        Severity::Standard => STANDARD,
        Severity::Brutal => BRUTAL,
    }
}

pub fn praise_pool() -> &'static [&'static str] {
    PRAISE
}

/// Band of the weight table for a failure streak (0–1, 2–3, 4+).
pub fn streak_band(failure_streak: i64) -> usize {
    match failure_streak {
        i64::MIN..=1 => 0,
        2..=3 => 1,
        _ => 2,
    }
}

pub fn weights(failure_streak: i64) -> [u32; 3] {
    WEIGHTS[streak_band(failure_streak)]
}

/// Map a uniform roll in `[0, 1)` to a severity through the cumulative weights.
pub fn severity_for_roll(failure_streak: i64, roll: f64) -> Severity {
    let w = weights(failure_streak);
    let total: u32 = w.iter().sum();
    let point = roll.clamp(0.0, 1.0) * f64::from(total);

    let mut cumulative = 0.0;
    for (severity, weight) in Severity::all().iter().zip(w) {
        cumulative += f64::from(weight);
        if point < cumulative {
            return *severity;
        }
    }
    Severity::Brutal
}

// ---------------------------------------------------------------------------
// Penance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penance {
    pub severity: Severity,
    pub task: String,
}

impl Penance {
    /// Deterministic selection: `index` wraps around the tier.
    pub fn select(failure_streak: i64, roll: f64, index: usize) -> Self {
        let severity = severity_for_roll(failure_streak, roll);
        let pool = tasks(severity);
        Self {
            severity,
            task: pool[index % pool.len()].to_string(),
        }
    }

    pub fn draw<R: Rng + ?Sized>(failure_streak: i64, rng: &mut R) -> Self {
        let roll: f64 = rng.gen();
        let severity = severity_for_roll(failure_streak, roll);
        let index = rng.gen_range(0..tasks(severity).len());
        Self::select(failure_streak, roll, index)
    }
}

pub fn draw_praise<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    PRAISE[rng.gen_range(0..PRAISE.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn every_band_sums_to_one_hundred() {
        for row in WEIGHTS {
            assert_eq!(row.iter().sum::<u32>(), 100);
        }
    }

    #[test]
    fn streak_bands() {
        assert_eq!(streak_band(0), 0);
        assert_eq!(streak_band(1), 0);
        assert_eq!(streak_band(2), 1);
        assert_eq!(streak_band(3), 1);
        assert_eq!(streak_band(4), 2);
        assert_eq!(streak_band(40), 2);
    }

    #[test]
    fn middle_band_is_the_classic_roll() {
        // 0.2 and 0.8 were the thresholds of the fixed oracle roll.
        assert_eq!(severity_for_roll(2, 0.0), Severity::Mild);
        assert_eq!(severity_for_roll(2, 0.19), Severity::Mild);
        assert_eq!(severity_for_roll(2, 0.2), Severity::Standard);
        assert_eq!(severity_for_roll(2, 0.79), Severity::Standard);
        assert_eq!(severity_for_roll(2, 0.8), Severity::Brutal);
        assert_eq!(severity_for_roll(2, 0.999), Severity::Brutal);
    }

    #[test]
    fn first_offense_is_mostly_mild() {
        assert_eq!(severity_for_roll(1, 0.59), Severity::Mild);
        assert_eq!(severity_for_roll(1, 0.6), Severity::Standard);
        assert_eq!(severity_for_roll(1, 0.96), Severity::Brutal);
    }

    #[test]
    fn chronic_failure_is_mostly_brutal() {
        assert_eq!(severity_for_roll(7, 0.04), Severity::Mild);
        assert_eq!(severity_for_roll(7, 0.3), Severity::Standard);
        assert_eq!(severity_for_roll(7, 0.4), Severity::Brutal);
    }

    #[test]
    fn out_of_range_rolls_are_clamped() {
        assert_eq!(severity_for_roll(2, -3.0), Severity::Mild);
        assert_eq!(severity_for_roll(2, 1.0), Severity::Brutal);
        assert_eq!(severity_for_roll(2, 42.0), Severity::Brutal);
    }

    #[test]
    fn select_wraps_index_within_tier() {
        let p = Penance::select(1, 0.0, 4);
        assert_eq!(p.severity, Severity::Mild);
        assert_eq!(p.task, "Take 3 deep breaths.");
    }

    #[test]
    fn draw_always_yields_a_task_from_its_tier() {
        let mut rng = StdRng::seed_from_u64(7);
        for streak in 0..10 {
            let p = Penance::draw(streak, &mut rng);
            assert!(tasks(p.severity).contains(&p.task.as_str()));
        }
    }

    #[test]
    fn draw_distribution_tracks_band_weights() {
        let mut rng = StdRng::seed_from_u64(42);
        let brutal = (0..2000)
            .filter(|_| Penance::draw(9, &mut rng).severity == Severity::Brutal)
            .count();
        // 60% expected; a generous window keeps this stable across seeds.
        assert!((1000..1400).contains(&brutal), "brutal draws: {brutal}");
    }

    #[test]
    fn praise_comes_from_the_pool() {
        let mut rng = StdRng::seed_from_u64(1);
        let line = draw_praise(&mut rng);
        assert!(praise_pool().contains(&line));
    }
}
