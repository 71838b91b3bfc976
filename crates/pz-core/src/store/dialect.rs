//! SQL shared by both backends.
//!
//! Statements are written once with bare `?` placeholders and rendered per
//! dialect: numbered `?N` for SQLite, `$N` for PostgreSQL.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
        }
    }

    /// Replace each bare `?` outside single-quoted literals with this
    /// dialect's numbered placeholder.
    pub fn render(self, sql: &str) -> String {
        let mut out = String::with_capacity(sql.len() + 8);
        let mut n = 0;
        let mut in_literal = false;
        for c in sql.chars() {
            match c {
                '\'' => {
                    in_literal = !in_literal;
                    out.push(c);
                }
                '?' if !in_literal => {
                    n += 1;
                    match self {
                        Dialect::Sqlite => out.push('?'),
                        Dialect::Postgres => out.push('$'),
                    }
                    out.push_str(&n.to_string());
                }
                _ => out.push(c),
            }
        }
        out
    }

    fn id_column(self) -> &'static str {
        match self {
            Dialect::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
            Dialect::Postgres => "id BIGSERIAL PRIMARY KEY",
        }
    }

    /// Idempotent schema, one statement per entry.
    pub fn schema(self) -> Vec<String> {
        vec![
            "CREATE TABLE IF NOT EXISTS users (
                user_id         TEXT PRIMARY KEY,
                display_name    TEXT NOT NULL,
                xp              BIGINT NOT NULL DEFAULT 0,
                level           BIGINT NOT NULL DEFAULT 1,
                streak          BIGINT NOT NULL DEFAULT 0,
                best_streak     BIGINT NOT NULL DEFAULT 0,
                failure_streak  BIGINT NOT NULL DEFAULT 0,
                resisted_total  BIGINT NOT NULL DEFAULT 0,
                relapsed_total  BIGINT NOT NULL DEFAULT 0,
                last_event_at   TEXT
            )"
            .to_string(),
            format!(
                "CREATE TABLE IF NOT EXISTS interactions (
                {},
                user_id     TEXT NOT NULL,
                user_name   TEXT NOT NULL,
                outcome     TEXT NOT NULL,
                verdict     TEXT NOT NULL,
                severity    TEXT,
                xp_awarded  BIGINT NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL
            )",
                self.id_column()
            ),
            "CREATE INDEX IF NOT EXISTS idx_interactions_created_at ON interactions(created_at)"
                .to_string(),
            "CREATE INDEX IF NOT EXISTS idx_interactions_user_id ON interactions(user_id)"
                .to_string(),
        ]
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

pub(crate) const SELECT_PROFILE: &str = "SELECT user_id, display_name, xp, level, streak, best_streak, \
     failure_streak, resisted_total, relapsed_total, last_event_at \
     FROM users WHERE user_id = ?";

pub(crate) const UPSERT_PROFILE: &str = "INSERT INTO users (user_id, display_name, xp, level, streak, \
     best_streak, failure_streak, resisted_total, relapsed_total, last_event_at) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
     ON CONFLICT (user_id) DO UPDATE SET \
     display_name = excluded.display_name, xp = excluded.xp, level = excluded.level, \
     streak = excluded.streak, best_streak = excluded.best_streak, \
     failure_streak = excluded.failure_streak, resisted_total = excluded.resisted_total, \
     relapsed_total = excluded.relapsed_total, last_event_at = excluded.last_event_at";

pub(crate) const INSERT_INTERACTION: &str = "INSERT INTO interactions \
     (user_id, user_name, outcome, verdict, severity, xp_awarded, created_at) \
     VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id";

pub(crate) const TOTAL_COUNT: &str = "SELECT COUNT(*) FROM interactions";

pub(crate) const OUTCOME_COUNTS: &str =
    "SELECT outcome, COUNT(*) FROM interactions GROUP BY outcome";

pub(crate) const RECENT_HISTORY: &str = "SELECT id, user_id, user_name, outcome, verdict, severity, \
     xp_awarded, created_at FROM interactions ORDER BY id DESC LIMIT ?";

pub(crate) const VERDICT_COUNTS: &str = "SELECT verdict, COUNT(*) AS n FROM interactions \
     WHERE outcome = 'relapsed' GROUP BY verdict ORDER BY n DESC, verdict ASC";

pub(crate) const LEADERBOARD: &str = "SELECT user_id, display_name, xp, level, streak, best_streak, \
     failure_streak, resisted_total, relapsed_total, last_event_at \
     FROM users ORDER BY xp DESC, best_streak DESC, user_id ASC LIMIT ?";

pub(crate) const HOURLY: &str = "SELECT CAST(SUBSTR(created_at, 12, 2) AS BIGINT) AS hour, COUNT(*) \
     FROM interactions GROUP BY hour ORDER BY hour";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_placeholders_are_numbered() {
        assert_eq!(
            Dialect::Sqlite.render("SELECT * FROM t WHERE a = ? AND b = ?"),
            "SELECT * FROM t WHERE a = ?1 AND b = ?2"
        );
    }

    #[test]
    fn postgres_placeholders_use_dollar() {
        assert_eq!(
            Dialect::Postgres.render("INSERT INTO t (a, b, c) VALUES (?, ?, ?)"),
            "INSERT INTO t (a, b, c) VALUES ($1, $2, $3)"
        );
    }

    #[test]
    fn question_marks_inside_literals_are_kept() {
        assert_eq!(
            Dialect::Postgres.render("SELECT '?' , x FROM t WHERE y = ?"),
            "SELECT '?' , x FROM t WHERE y = $1"
        );
    }

    #[test]
    fn statement_placeholder_counts() {
        let count = |sql: &str| Dialect::Postgres.render(sql).matches('$').count();
        assert_eq!(count(UPSERT_PROFILE), 10);
        assert_eq!(count(INSERT_INTERACTION), 7);
        assert_eq!(count(SELECT_PROFILE), 1);
        assert_eq!(count(RECENT_HISTORY), 1);
        assert_eq!(count(LEADERBOARD), 1);
        assert_eq!(count(HOURLY), 0);
        assert_eq!(count(VERDICT_COUNTS), 0);
    }

    #[test]
    fn schema_differs_only_in_id_column() {
        let sqlite = Dialect::Sqlite.schema();
        let postgres = Dialect::Postgres.schema();
        assert_eq!(sqlite.len(), postgres.len());
        assert!(sqlite[1].contains("AUTOINCREMENT"));
        assert!(postgres[1].contains("BIGSERIAL"));
        assert_eq!(sqlite[0], postgres[0]);
        assert_eq!(sqlite[2..], postgres[2..]);
    }
}
