use anyhow::{anyhow, Context};
use clap::Subcommand;
use pz_core::config::Config;
use pz_server::discord::{register_commands, DISCORD_API_BASE};

use crate::output::print_json;

#[derive(Subcommand)]
pub enum DiscordSubcommand {
    /// Register the slash commands globally (replaces existing ones)
    Register {
        /// Discord API base URL
        #[arg(long, default_value = DISCORD_API_BASE, hide = true)]
        api_base: String,
    },
}

pub fn run(config: &Config, subcmd: DiscordSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        DiscordSubcommand::Register { api_base } => register(config, &api_base, json),
    }
}

fn register(config: &Config, api_base: &str, json: bool) -> anyhow::Result<()> {
    let token = config
        .discord
        .token
        .as_deref()
        .ok_or_else(|| anyhow!("DISCORD_TOKEN is not set"))?;
    let app_id = config
        .discord
        .application_id
        .as_deref()
        .ok_or_else(|| anyhow!("DISCORD_APPLICATION_ID is not set"))?;

    let http = reqwest::Client::new();
    let count = super::block_on(register_commands(&http, api_base, app_id, token))?
        .context("command registration failed")?;

    if json {
        return print_json(&serde_json::json!({ "registered": count }));
    }
    println!("Registered {count} slash commands for application {app_id}");
    Ok(())
}
