//! Common utilities and shared types for quill.
//!
//! - **Configuration**: application settings via [`Config`]
//! - **Error handling**: the error taxonomy via [`AppError`] and [`AppResult`]
//! - **Storage**: where uploaded post images are written ([`StorageBackend`])
//! - **Tokens**: opaque bearer tokens for API authentication
//!
//! # Example
//!
//! ```no_run
//! use quill_common::{AppResult, Config};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     println!("listening on {}:{}", config.server.host, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod storage;
pub mod token;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use storage::{
    InMemoryStorage, LocalStorage, POST_IMAGE_DIR, StorageBackend, StoredFile, available_key,
    storage_key,
};
pub use token::generate_token;
