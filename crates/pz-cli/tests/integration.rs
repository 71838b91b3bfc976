#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn pz(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("protocol-zero").unwrap();
    cmd.current_dir(dir.path())
        .env("DATABASE_URL", format!("sqlite:{}", dir.path().join("pz.db").display()))
        .env("PZ_COOLDOWN_SECS", "0")
        .env_remove("PZ_CONFIG")
        .env_remove("GEMINI_API_KEY")
        .env_remove("DISCORD_TOKEN")
        .env_remove("DISCORD_APPLICATION_ID")
        .env_remove("DISCORD_PUBLIC_KEY");
    cmd
}

fn json_output(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).unwrap()
}

// ---------------------------------------------------------------------------
// basics
// ---------------------------------------------------------------------------

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    pz(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("relapse"))
        .stdout(predicate::str::contains("leaderboard"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn migrate_creates_database() {
    let dir = TempDir::new().unwrap();
    pz(&dir)
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Schema ready on sqlite"));
    assert!(dir.path().join("pz.db").exists());

    // Idempotent.
    pz(&dir).arg("migrate").assert().success();
}

#[test]
fn unsupported_database_url_fails() {
    let dir = TempDir::new().unwrap();
    pz(&dir)
        .env("DATABASE_URL", "mysql://root@localhost/pz")
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported database URL scheme"));
}

// ---------------------------------------------------------------------------
// resist / relapse
// ---------------------------------------------------------------------------

#[test]
fn resist_awards_xp() {
    let dir = TempDir::new().unwrap();
    pz(&dir)
        .args(["resist", "--user", "u1", "--name", "Ariel"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+10 XP | Level 1 | Streak 1"));

    let profile = json_output(pz(&dir).args(["profile", "u1", "--json"]));
    assert_eq!(profile["xp"], 10);
    assert_eq!(profile["display_name"], "Ariel");
}

#[test]
fn relapse_prints_penance_with_severity() {
    let dir = TempDir::new().unwrap();
    let out = json_output(pz(&dir).args(["relapse", "--user", "u1", "--json"]));
    let severity = out["verdict"]["severity"].as_str().unwrap().to_uppercase();
    assert!(out["message"]
        .as_str()
        .unwrap()
        .starts_with(&format!("[{severity}]")));
    assert_eq!(out["profile"]["failure_streak"], 1);
}

#[test]
fn cooldown_rejects_second_submission() {
    let dir = TempDir::new().unwrap();
    pz(&dir)
        .env("PZ_COOLDOWN_SECS", "60")
        .args(["relapse", "--user", "u1"])
        .assert()
        .success();
    pz(&dir)
        .env("PZ_COOLDOWN_SECS", "60")
        .args(["resist", "--user", "u1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cooldown active"));

    let stats = json_output(pz(&dir).args(["stats", "--json"]));
    assert_eq!(stats["total"], 1);
}

#[test]
fn blank_user_is_rejected() {
    let dir = TempDir::new().unwrap();
    pz(&dir)
        .args(["resist", "--user", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid user"));
}

// ---------------------------------------------------------------------------
// queries
// ---------------------------------------------------------------------------

#[test]
fn unknown_profile_fails() {
    let dir = TempDir::new().unwrap();
    pz(&dir)
        .args(["profile", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("user not found: ghost"));
}

#[test]
fn stats_history_and_leaderboard() {
    let dir = TempDir::new().unwrap();
    pz(&dir).args(["resist", "--user", "a", "--name", "Ariel"]).assert().success();
    pz(&dir).args(["resist", "--user", "a", "--name", "Ariel"]).assert().success();
    pz(&dir).args(["relapse", "--user", "b", "--name", "Loki"]).assert().success();

    let stats = json_output(pz(&dir).args(["stats", "--json"]));
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["resisted"], 2);
    assert_eq!(stats["relapsed"], 1);

    pz(&dir)
        .args(["history", "--limit", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Loki"))
        .stdout(predicate::str::contains("relapsed"));

    let top = json_output(pz(&dir).args(["leaderboard", "--json"]));
    assert_eq!(top[0]["user_id"], "a");
    assert_eq!(top[0]["xp"], 22);

    let hours = json_output(pz(&dir).args(["hourly", "--json"]));
    assert_eq!(hours.as_array().unwrap().len(), 24);
}

#[test]
fn empty_history_says_so() {
    let dir = TempDir::new().unwrap();
    pz(&dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No interactions recorded."));
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

#[test]
fn config_file_tunes_progression() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("protocol-zero.yaml"),
        "progression:\n  resist_xp: 25\n",
    )
    .unwrap();

    let out = json_output(pz(&dir).args(["resist", "--user", "u1", "--json"]));
    assert_eq!(out["progress"]["xp_awarded"], 25);
}

#[test]
fn invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.yaml");
    std::fs::write(&path, "progression:\n  xp_per_level: 0\n").unwrap();

    pz(&dir)
        .env("PZ_CONFIG", &path)
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("xp_per_level"));
}

// ---------------------------------------------------------------------------
// external services
// ---------------------------------------------------------------------------

#[test]
fn models_require_api_key() {
    let dir = TempDir::new().unwrap();
    pz(&dir)
        .arg("models")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY is not set"));
}

#[test]
fn discord_register_requires_token() {
    let dir = TempDir::new().unwrap();
    pz(&dir)
        .args(["discord", "register"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DISCORD_TOKEN is not set"));
}
