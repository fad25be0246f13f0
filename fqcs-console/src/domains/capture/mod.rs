pub mod scheduler;

pub use scheduler::{CaptureBinding, CaptureScheduler, FrameConsumer, SharedConsumer};
