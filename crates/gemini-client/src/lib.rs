//! `gemini-client`: a small async driver for Google's Gemini REST API.
//!
//! Only the two calls Protocol Zero needs are covered:
//!
//! ```text
//! GeminiClient
//!     ├── generate(model, system, prompt)  → POST /v1beta/models/{model}:generateContent
//!     └── list_models()                    → GET  /v1beta/models (paged)
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use gemini_client::GeminiClient;
//!
//! let client = GeminiClient::new(std::env::var("GEMINI_API_KEY")?, None)?;
//! let text = client
//!     .generate("gemini-2.0-flash", Some("Be terse."), "Say hello.")
//!     .await?;
//! println!("{text}");
//! ```

pub mod client;
pub mod error;
pub mod types;

pub use client::{GeminiClient, DEFAULT_BASE_URL};
pub use error::GeminiError;
pub use types::ModelInfo;

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, GeminiError>;
