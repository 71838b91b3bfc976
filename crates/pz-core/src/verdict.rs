use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::penance::{draw_praise, Penance};
use crate::types::{Outcome, Severity};

/// The oracle's answer to one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    pub text: String,
}

impl Verdict {
    pub fn penance(penance: Penance) -> Self {
        Self {
            outcome: Outcome::Relapsed,
            severity: Some(penance.severity),
            text: penance.task,
        }
    }

    pub fn praise(text: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Resisted,
            severity: None,
            text: text.into(),
        }
    }

    /// Draw a verdict. `failure_streak` must already include this relapse.
    pub fn draw<R: Rng + ?Sized>(outcome: Outcome, failure_streak: i64, rng: &mut R) -> Self {
        match outcome {
            Outcome::Relapsed => Self::penance(Penance::draw(failure_streak, rng)),
            Outcome::Resisted => Self::praise(draw_praise(rng)),
        }
    }

    /// `[SEVERITY] task` for penance, the bare text for praise.
    pub fn headline(&self) -> String {
        match self.severity {
            Some(severity) => format!("[{}] {}", severity.label(), self.text),
            None => self.text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::penance::{praise_pool, tasks};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn penance_headline_carries_severity_label() {
        let v = Verdict::penance(Penance {
            severity: Severity::Brutal,
            task: "100 Burpees.".into(),
        });
        assert_eq!(v.headline(), "[BRUTAL] 100 Burpees.");
        assert_eq!(v.outcome, Outcome::Relapsed);
    }

    #[test]
    fn praise_headline_is_plain() {
        let v = Verdict::praise("Well held.");
        assert_eq!(v.headline(), "Well held.");
        assert!(v.severity.is_none());
    }

    #[test]
    fn draw_matches_outcome() {
        let mut rng = StdRng::seed_from_u64(3);

        let relapse = Verdict::draw(Outcome::Relapsed, 1, &mut rng);
        let severity = relapse.severity.expect("relapse has a severity");
        assert!(tasks(severity).contains(&relapse.text.as_str()));

        let resist = Verdict::draw(Outcome::Resisted, 0, &mut rng);
        assert!(resist.severity.is_none());
        assert!(praise_pool().contains(&resist.text.as_str()));
    }

    #[test]
    fn praise_serializes_without_severity() {
        let json = serde_json::to_value(Verdict::praise("ok")).unwrap();
        assert_eq!(json["outcome"], "resisted");
        assert!(json.get("severity").is_none());
    }
}
