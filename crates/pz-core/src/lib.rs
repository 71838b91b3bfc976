pub mod config;
pub mod error;
pub mod narration;
pub mod oracle;
pub mod penance;
pub mod progression;
pub mod store;
pub mod types;
pub mod verdict;

pub use error::{PzError, Result};
