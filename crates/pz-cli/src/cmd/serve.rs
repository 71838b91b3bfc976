use std::sync::Arc;

use anyhow::Context;
use pz_core::config::{Config, WarnLevel};
use pz_core::oracle::Oracle;
use pz_server::AppState;

pub fn run(config: &Config, port: Option<u16>, open_browser: bool) -> anyhow::Result<()> {
    for warning in config.validate() {
        if warning.level == WarnLevel::Warning {
            tracing::warn!("{}", warning.message);
        }
    }

    let host = config.server.host.clone();
    let port = port.unwrap_or(config.server.port);

    super::block_on(async move {
        let oracle = Arc::new(Oracle::open(config).await.context("failed to open store")?);
        let state = AppState::from_config(oracle, &config.discord)?;
        if state.discord.is_some() {
            tracing::info!("Discord interactions enabled at /discord/interactions");
        }

        let listener = tokio::net::TcpListener::bind(format!("{host}:{port}"))
            .await
            .with_context(|| format!("cannot bind {host}:{port}"))?;

        tokio::select! {
            res = pz_server::serve(state, listener, open_browser) => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                Ok(())
            }
        }
    })?
}
