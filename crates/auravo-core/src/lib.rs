//! Shared data model, configuration and error type for Auravo.

pub mod config;
pub mod data_uri;
pub mod error;
pub mod types;

pub use config::AuravoConfig;
pub use data_uri::DataUri;
pub use error::{AuravoError, Result};
pub use types::*;
