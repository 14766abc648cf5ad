#![allow(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod loader;
pub mod upload;

pub use client::FormClient;
pub use config::{ApiConfig, BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use error::ClientError;
pub use loader::{LoadOutcome, SchemaLoader};
pub use upload::{FileUploader, upload_field, upload_session_files};
