//! Trait surfaces for the collaborators the console drives but never
//! implements: the detection backend and the camera device.

pub mod camera;
pub mod detection;

/// Frequently used traits for orchestration crates.
pub mod prelude {
    pub use super::camera::{CameraDevice, CameraError};
    pub use super::detection::{
        DetectionError, DetectionManager, DetectionManagerFactory,
        DetectionResult,
    };
}
