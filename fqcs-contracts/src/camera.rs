//! Camera device capability.

use fqcs_model::Frame;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("Camera {index} not available: {reason}")]
    Unavailable { index: u32, reason: String },

    #[error("Camera I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A frame source. `read` returning `None` is a normal condition (device
/// warming up, dropped frame) and never an error.
pub trait CameraDevice: Send {
    fn open(&mut self, index: u32) -> Result<(), CameraError>;

    fn is_open(&self) -> bool;

    fn read(&mut self) -> Option<Frame>;

    fn release(&mut self) {}
}
