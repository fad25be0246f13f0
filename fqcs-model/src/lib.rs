//! Core data model definitions shared across FQCS crates.
#![allow(missing_docs)]

pub mod credential;
pub mod detection;
pub mod profile;

pub use credential::{Credential, ROLE_DEVICE};
pub use detection::{DetectedBox, Frame, PairOutcome, SampleImages};
pub use profile::{ColorSettings, ProfileRecord};
