use anyhow::Context;
use pz_core::config::Config;
use pz_core::oracle::Oracle;
use pz_core::progression::Profile;

use crate::output::{print_json, print_table};

async fn open(config: &Config) -> anyhow::Result<Oracle> {
    Oracle::open(config).await.context("failed to open store")
}

pub fn profile(config: &Config, id: &str, json: bool) -> anyhow::Result<()> {
    let profile = super::block_on(async {
        let oracle = open(config).await?;
        oracle.profile(id).await.map_err(anyhow::Error::from)
    })??;
    if json {
        return print_json(&profile);
    }

    let last = profile
        .last_event_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".into());
    println!("{} ({})", profile.display_name, profile.user_id);
    println!("  level:          {}", profile.level);
    println!("  xp:             {}", profile.xp);
    println!("  streak:         {} (best {})", profile.streak, profile.best_streak);
    println!("  failure streak: {}", profile.failure_streak);
    println!(
        "  resisted:       {} / relapsed: {}",
        profile.resisted_total, profile.relapsed_total
    );
    println!("  last event:     {last}");
    Ok(())
}

pub fn stats(config: &Config, json: bool) -> anyhow::Result<()> {
    let stats = super::block_on(async {
        let oracle = open(config).await?;
        oracle.stats().await.map_err(anyhow::Error::from)
    })??;
    if json {
        return print_json(&stats);
    }
    println!("total:    {}", stats.total);
    println!("resisted: {}", stats.resisted);
    println!("relapsed: {}", stats.relapsed);
    Ok(())
}

pub fn history(config: &Config, limit: i64, json: bool) -> anyhow::Result<()> {
    let rows = super::block_on(async {
        let oracle = open(config).await?;
        oracle.history(limit).await.map_err(anyhow::Error::from)
    })??;
    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No interactions recorded.");
        return Ok(());
    }
    let table = rows
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.created_at.clone(),
                r.user_name.clone(),
                r.outcome.to_string(),
                r.severity.map(|s| s.label().to_string()).unwrap_or_default(),
                r.verdict.clone(),
            ]
        })
        .collect();
    print_table(&["ID", "TIME (UTC)", "USER", "OUTCOME", "SEVERITY", "VERDICT"], table);
    Ok(())
}

pub fn leaderboard(config: &Config, limit: i64, json: bool) -> anyhow::Result<()> {
    let top = super::block_on(async {
        let oracle = open(config).await?;
        oracle.leaderboard(limit).await.map_err(anyhow::Error::from)
    })??;
    if json {
        return print_json(&top);
    }
    if top.is_empty() {
        println!("No profiles yet.");
        return Ok(());
    }
    print_table(
        &["#", "USER", "LEVEL", "XP", "STREAK", "BEST"],
        top.iter().enumerate().map(|(i, p)| leaderboard_row(i, p)).collect(),
    );
    Ok(())
}

fn leaderboard_row(index: usize, p: &Profile) -> Vec<String> {
    vec![
        (index + 1).to_string(),
        p.display_name.clone(),
        p.level.to_string(),
        p.xp.to_string(),
        p.streak.to_string(),
        p.best_streak.to_string(),
    ]
}

pub fn hourly(config: &Config, json: bool) -> anyhow::Result<()> {
    let hours = super::block_on(async {
        let oracle = open(config).await?;
        oracle.hourly().await.map_err(anyhow::Error::from)
    })??;
    if json {
        return print_json(&hours);
    }
    let peak = hours.iter().copied().max().unwrap_or(0).max(1);
    for (hour, count) in hours.iter().enumerate() {
        let bar = "#".repeat(((count * 40) / peak) as usize);
        println!("{hour:02}:00  {count:>5}  {bar}");
    }
    Ok(())
}
