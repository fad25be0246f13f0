//! Fixed-period frame pump.
//!
//! While armed, each tick reads one frame from the camera and hands it to
//! the bound consumer before the next tick is awaited. A slow consumer
//! stretches the period; frames are never queued.

use std::sync::Arc;
use std::time::Duration;

use fqcs_contracts::camera::{CameraDevice, CameraError};
use fqcs_model::Frame;
use log::{debug, info};
use parking_lot::Mutex;
use tokio::time::{Interval, MissedTickBehavior};

/// Receiver of captured frames, declared by screens that show the camera.
pub trait FrameConsumer: Send {
    fn on_frame(&mut self, frame: &Frame);
}

pub type SharedConsumer = Arc<Mutex<dyn FrameConsumer>>;

/// Which consumer the pump feeds, if any.
#[derive(Clone, Default)]
pub struct CaptureBinding {
    pub active: bool,
    pub consumer: Option<SharedConsumer>,
}

impl CaptureBinding {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn bound(consumer: SharedConsumer) -> Self {
        Self {
            active: true,
            consumer: Some(consumer),
        }
    }

    /// Binding derived from a screen's optional consumer.
    pub fn for_consumer(consumer: Option<SharedConsumer>) -> Self {
        consumer.map_or_else(Self::idle, Self::bound)
    }

    /// Whether this binding feeds exactly `consumer` (or nothing, for
    /// `None`).
    pub fn is_bound_to(&self, consumer: Option<&SharedConsumer>) -> bool {
        match (&self.consumer, consumer) {
            (Some(bound), Some(other)) => Arc::ptr_eq(bound, other),
            (None, None) => true,
            _ => false,
        }
    }
}

impl std::fmt::Debug for CaptureBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureBinding")
            .field("active", &self.active)
            .field("has_consumer", &self.consumer.is_some())
            .finish()
    }
}

pub struct CaptureScheduler {
    device: Box<dyn CameraDevice>,
    camera_index: Option<u32>,
    binding: CaptureBinding,
    period: Duration,
    armed: bool,
    ticker: Option<Interval>,
    delivered: u64,
}

impl std::fmt::Debug for CaptureScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureScheduler")
            .field("camera_index", &self.camera_index)
            .field("device_open", &self.device.is_open())
            .field("binding", &self.binding)
            .field("period", &self.period)
            .field("armed", &self.armed)
            .field("delivered", &self.delivered)
            .finish()
    }
}

impl CaptureScheduler {
    pub fn new(device: Box<dyn CameraDevice>, period: Duration) -> Self {
        Self {
            device,
            camera_index: None,
            binding: CaptureBinding::idle(),
            period,
            armed: false,
            ticker: None,
            delivered: 0,
        }
    }

    /// Switch to camera `index`, releasing the current one first.
    pub fn open_device(&mut self, index: u32) -> Result<(), CameraError> {
        if self.device.is_open() {
            self.device.release();
        }
        self.camera_index = None;
        self.device.open(index)?;
        self.camera_index = Some(index);
        info!("[Capture] Camera {index} opened");
        Ok(())
    }

    pub fn camera_index(&self) -> Option<u32> {
        self.camera_index
    }

    pub fn is_device_open(&self) -> bool {
        self.device.is_open()
    }

    /// Arm or disarm the pump. Arming an armed pump keeps its schedule;
    /// disarming always drops it.
    pub fn control(&mut self, active: bool) {
        if active {
            if !self.armed {
                debug!("[Capture] Pump armed at {:?}", self.period);
            }
            self.armed = true;
        } else {
            if self.armed {
                debug!("[Capture] Pump disarmed");
            }
            self.armed = false;
            self.ticker = None;
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn binding(&self) -> &CaptureBinding {
        &self.binding
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Frames handed to consumers since construction.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub(crate) fn rebind(&mut self, binding: CaptureBinding) {
        self.binding = binding;
    }

    /// Wait for the next tick. Never completes while disarmed, so it can
    /// sit in a `select!` unconditionally.
    pub async fn next_tick(&mut self) {
        if !self.armed {
            std::future::pending::<()>().await;
            return;
        }
        let period = self.period;
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        ticker.tick().await;
    }

    /// Run one tick: read a frame and deliver it synchronously. Returns
    /// whether a frame was delivered; every skip reason is a quiet no-op.
    pub fn tick(&mut self) -> bool {
        if !self.armed || !self.binding.active || !self.device.is_open() {
            return false;
        }
        let Some(consumer) = self.binding.consumer.as_ref() else {
            return false;
        };
        let Some(frame) = self.device.read() else {
            return false;
        };
        consumer.lock().on_frame(&frame);
        self.delivered += 1;
        true
    }
}

impl Drop for CaptureScheduler {
    fn drop(&mut self) {
        if self.device.is_open() {
            self.device.release();
        }
    }
}
