use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PzError;

/// Storage format for every timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const MAX_USER_ID_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Resisted,
    Relapsed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Resisted => "resisted",
            Outcome::Relapsed => "relapsed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Outcome {
    type Err = PzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resist" | "resisted" | "win" | "success" => Ok(Outcome::Resisted),
            "relapse" | "relapsed" | "fail" | "failure" | "gave-in" | "gave_in" => {
                Ok(Outcome::Relapsed)
            }
            _ => Err(PzError::UnknownOutcome(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Mild,
    Standard,
    Brutal,
}

impl Severity {
    pub fn all() -> &'static [Severity] {
        &[Severity::Mild, Severity::Standard, Severity::Brutal]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Standard => "standard",
            Severity::Brutal => "brutal",
        }
    }

    /// Upper-case label used in verdict headlines.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Mild => "MILD",
            Severity::Standard => "STANDARD",
            Severity::Brutal => "BRUTAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = PzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mild" => Ok(Severity::Mild),
            "standard" => Ok(Severity::Standard),
            "brutal" => Ok(Severity::Brutal),
            _ => Err(PzError::Database(format!("unknown severity '{s}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// UserRef
// ---------------------------------------------------------------------------

/// Who submitted an interaction: a stable id plus a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    pub name: String,
}

impl UserRef {
    /// Validate and normalize. An empty name falls back to the id.
    pub fn new(id: impl AsRef<str>, name: Option<&str>) -> crate::Result<Self> {
        let id = id.as_ref().trim();
        if id.is_empty() {
            return Err(PzError::InvalidUser("user id must not be empty".into()));
        }
        if id.chars().count() > MAX_USER_ID_LEN {
            return Err(PzError::InvalidUser(format!(
                "user id longer than {MAX_USER_ID_LEN} characters"
            )));
        }
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(id);
        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> crate::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| PzError::InvalidTimestamp(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn outcome_parses_aliases() {
        assert_eq!("resist".parse::<Outcome>().unwrap(), Outcome::Resisted);
        assert_eq!(" WIN ".parse::<Outcome>().unwrap(), Outcome::Resisted);
        assert_eq!("gave-in".parse::<Outcome>().unwrap(), Outcome::Relapsed);
        assert_eq!("Relapsed".parse::<Outcome>().unwrap(), Outcome::Relapsed);
    }

    #[test]
    fn outcome_rejects_garbage() {
        let err = "maybe".parse::<Outcome>().unwrap_err();
        assert!(matches!(err, PzError::UnknownOutcome(s) if s == "maybe"));
    }

    #[test]
    fn severity_labels_are_upper_case() {
        assert_eq!(Severity::Mild.label(), "MILD");
        assert_eq!(Severity::Brutal.to_string(), "brutal");
        assert_eq!("standard".parse::<Severity>().unwrap(), Severity::Standard);
    }

    #[test]
    fn user_ref_trims_and_defaults_name() {
        let u = UserRef::new("  1234 ", None).unwrap();
        assert_eq!(u.id, "1234");
        assert_eq!(u.name, "1234");

        let named = UserRef::new("1234", Some("  Ariel ")).unwrap();
        assert_eq!(named.name, "Ariel");

        let blank_name = UserRef::new("1234", Some("   ")).unwrap();
        assert_eq!(blank_name.name, "1234");
    }

    #[test]
    fn user_ref_rejects_empty_and_long_ids() {
        assert!(matches!(
            UserRef::new("   ", None),
            Err(PzError::InvalidUser(_))
        ));
        let long = "x".repeat(65);
        assert!(matches!(
            UserRef::new(&long, None),
            Err(PzError::InvalidUser(_))
        ));
        assert!(UserRef::new("x".repeat(64), None).is_ok());
    }

    #[test]
    fn timestamp_round_trips_at_second_precision() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let s = format_timestamp(ts);
        assert_eq!(s, "2026-01-02 03:04:05");
        assert_eq!(parse_timestamp(&s).unwrap(), ts);
    }

    #[test]
    fn bad_timestamp_is_an_error() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(PzError::InvalidTimestamp(_))
        ));
    }
}
