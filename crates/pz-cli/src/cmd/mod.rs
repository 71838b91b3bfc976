pub mod discord;
pub mod judge;
pub mod migrate;
pub mod models;
pub mod query;
pub mod serve;

use std::future::Future;

/// Run `fut` to completion on a fresh multi-threaded runtime.
pub fn block_on<F: Future>(fut: F) -> anyhow::Result<F::Output> {
    let rt = tokio::runtime::Runtime::new()?;
    Ok(rt.block_on(fut))
}
