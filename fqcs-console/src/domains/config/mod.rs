//! Active detection configuration: storage, loading and saving.

pub mod errors;
pub mod loader;
pub mod store;

pub use errors::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, select_main};
pub use store::{ActiveConfiguration, ConfigEvent, ConfigStore, ConfigSubscription};
