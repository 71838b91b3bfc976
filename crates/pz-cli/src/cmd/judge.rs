use anyhow::Context;
use pz_core::config::Config;
use pz_core::oracle::{Judgement, Oracle};
use pz_core::types::{Outcome, UserRef};
use serde::Serialize;

use crate::output::print_json;

#[derive(Serialize)]
struct JudgementOutput<'a> {
    message: String,
    #[serde(flatten)]
    judgement: &'a Judgement,
}

pub fn run(
    config: &Config,
    outcome: Outcome,
    user_id: &str,
    name: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let user = UserRef::new(user_id, name)?;
    let judgement = super::block_on(async {
        let oracle = Oracle::open(config).await.context("failed to open store")?;
        oracle.judge(&user, outcome).await.map_err(anyhow::Error::from)
    })??;

    if json {
        return print_json(&JudgementOutput {
            message: judgement.message(),
            judgement: &judgement,
        });
    }

    println!("{}", judgement.message());
    let p = &judgement.progress;
    let mut line = format!(
        "+{} XP | Level {} | Streak {} (best {})",
        p.xp_awarded, p.level, judgement.profile.streak, judgement.profile.best_streak
    );
    if p.leveled_up {
        line.push_str(&format!(" | LEVEL UP! {} -> {}", p.previous_level, p.level));
    }
    println!("{line}");
    Ok(())
}
