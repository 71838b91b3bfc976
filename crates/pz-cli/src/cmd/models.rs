use anyhow::{anyhow, Context};
use gemini_client::GeminiClient;
use pz_core::config::Config;

use crate::output::{print_json, print_table};

/// List models the configured key can use for generation.
pub fn run(config: &Config, all: bool, json: bool) -> anyhow::Result<()> {
    let key = config
        .narrator
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| anyhow!("GEMINI_API_KEY is not set"))?;
    let client = GeminiClient::new(key, None)?;

    let mut models = super::block_on(client.list_models())?.context("failed to list models")?;
    if !all {
        models.retain(|m| m.supports_generate());
    }

    if json {
        return print_json(&models);
    }
    if models.is_empty() {
        println!("No models available to this key.");
        return Ok(());
    }
    let rows = models
        .iter()
        .map(|m| {
            let marker = if m.id() == config.narrator.model { "*" } else { "" };
            vec![
                marker.to_string(),
                m.id().to_string(),
                m.display_name.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["", "MODEL", "DISPLAY NAME"], rows);
    Ok(())
}
