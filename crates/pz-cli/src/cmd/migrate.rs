use anyhow::Context;
use pz_core::config::Config;

use crate::output::print_json;

pub fn run(config: &Config, json: bool) -> anyhow::Result<()> {
    let backend = config.database.backend()?;
    let dialect = super::block_on(async {
        pz_core::store::open(&backend)
            .await
            .map(|store| store.dialect())
            .context("migration failed")
    })??;

    if json {
        return print_json(&serde_json::json!({
            "backend": backend.describe(),
            "dialect": dialect.name(),
            "migrated": true,
        }));
    }
    println!("Schema ready on {}", backend.describe());
    Ok(())
}
