//! Orchestration core of the FQCS operator console.
//!
//! - [`domains::auth`]: credential storage and the refresh/expiry timer.
//! - [`domains::capture`]: the fixed-period camera frame pump.
//! - [`domains::ui`]: screens and the navigation state machine that binds
//!   the pump to the active screen.
//! - [`domains::config`]: asynchronous load/save of detection profiles.
//! - [`app`]: the single-task interactive loop tying them together.

pub mod app;
pub mod domains;
pub mod infrastructure;
