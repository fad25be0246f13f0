//! Session authentication: credential storage, timing and lifecycle.

pub mod errors;
pub mod manager;
pub mod schedule;
pub mod storage;
pub mod types;

pub use errors::{AuthError, AuthResult};
pub use manager::{TOKEN_GROUP, TokenLifecycleManager, TokenSettings};
pub use schedule::{ActionKind, ExpiryWindow, ScheduledAction};
pub use storage::CredentialStorage;
pub use types::{CredentialStore, LoginOutcome, SessionEvent};
