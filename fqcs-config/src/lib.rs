//! Shared configuration library for the FQCS console.
//!
//! Settings are composed from built-in defaults, an optional TOML file, an
//! optional `.env` file and `FQCS_*` environment variables, in increasing
//! order of precedence. The console binary is the only consumer today, but
//! keeping the rules here gives tests a single source of truth for
//! defaults and validation.

pub mod constants;
pub mod loader;
pub mod models;
pub mod util;

pub use loader::{AppConfigLoad, AppConfigLoader, error::ConfigLoadError};
pub use models::{
    AppConfig, AuthSettings, CaptureSettings, ConfigMetadata,
    DetectionSettings,
};
