//! Screens that show the live camera and run detection on each frame.

use std::sync::Arc;

use fqcs_contracts::detection::{DetectionError, DetectionResult};
use fqcs_model::Frame;
use log::{debug, warn};
use parking_lot::Mutex;

use crate::domains::capture::{FrameConsumer, SharedConsumer};
use crate::domains::config::{ActiveConfiguration, ConfigStore, ConfigSubscription};
use crate::domains::ui::screen::Screen;
use crate::domains::ui::types::ScreenState;

/// How much of the detection chain a camera screen runs per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraStage {
    /// Box extraction only.
    Boxes,
    /// Box extraction with per-box sizes.
    Measurement,
    /// Box extraction followed by grouping and left/right pairing.
    Pairing,
}

impl CameraStage {
    pub fn for_screen(state: ScreenState) -> Option<Self> {
        match state {
            ScreenState::DetectionConfig | ScreenState::AsymConfig => Some(Self::Boxes),
            ScreenState::Measurement => Some(Self::Measurement),
            ScreenState::TestDetectPair
            | ScreenState::ColorCalibration
            | ScreenState::ErrorDetect
            | ScreenState::Progress => Some(Self::Pairing),
            ScreenState::Home | ScreenState::ColorPreprocess => None,
        }
    }
}

/// What the last frame produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameReport {
    /// No configuration, or one without a main profile.
    NoProfile,
    Boxes { count: usize },
    Sizes { sizes: Vec<(f32, f32)> },
    Pairs { boxes: usize, groups: usize, paired: bool },
    Failed(String),
}

/// Frame consumer for a camera screen.
#[derive(Debug)]
pub struct CameraView {
    stage: CameraStage,
    store: ConfigStore,
    frames: u64,
    last: Option<FrameReport>,
    warned: bool,
}

impl CameraView {
    pub fn new(stage: CameraStage, store: ConfigStore) -> Self {
        Self {
            stage,
            store,
            frames: 0,
            last: None,
            warned: false,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_report(&self) -> Option<&FrameReport> {
        self.last.as_ref()
    }

    /// Drop state derived from the previous configuration.
    pub fn reset(&mut self) {
        self.last = None;
        self.warned = false;
    }

    fn analyse(
        &self,
        config: &ActiveConfiguration,
        frame: &Frame,
    ) -> DetectionResult<FrameReport> {
        let Some(profile) = config.main() else {
            return Ok(FrameReport::NoProfile);
        };
        let manager = &config.manager;
        let boxes = manager.extract_boxes(profile, frame)?;

        Ok(match self.stage {
            CameraStage::Boxes => FrameReport::Boxes { count: boxes.len() },
            CameraStage::Measurement => FrameReport::Sizes {
                sizes: boxes.iter().map(|b| b.size).collect(),
            },
            CameraStage::Pairing => {
                let outcome = manager.detect_groups_and_pair(profile, &boxes, frame)?;
                FrameReport::Pairs {
                    boxes: boxes.len(),
                    groups: outcome.groups,
                    paired: outcome.is_paired(),
                }
            }
        })
    }
}

impl FrameConsumer for CameraView {
    fn on_frame(&mut self, frame: &Frame) {
        self.frames += 1;
        let report = match self.store.current() {
            None => FrameReport::NoProfile,
            Some(config) => match self.analyse(&config, frame) {
                Ok(report) => report,
                Err(e) => {
                    // Runs every tick; warn once per configuration.
                    if !self.warned {
                        if matches!(e, DetectionError::BackendUnavailable) {
                            debug!("[Capture] {e}");
                        } else {
                            warn!("[Capture] Frame analysis failed: {e}");
                        }
                        self.warned = true;
                    }
                    FrameReport::Failed(e.to_string())
                }
            },
        };
        self.last = Some(report);
    }
}

/// A screen whose only content is a camera view.
#[derive(Debug)]
pub struct CameraScreen {
    state: ScreenState,
    view: Arc<Mutex<CameraView>>,
    subscription: ConfigSubscription,
}

impl CameraScreen {
    pub fn new(state: ScreenState, stage: CameraStage, store: &ConfigStore) -> Self {
        Self {
            state,
            view: Arc::new(Mutex::new(CameraView::new(stage, store.clone()))),
            subscription: store.subscribe(),
        }
    }

    /// Camera screen with the stage the console uses for `state`.
    pub fn for_state(state: ScreenState, store: &ConfigStore) -> Option<Self> {
        CameraStage::for_screen(state).map(|stage| Self::new(state, stage, store))
    }

    pub fn view(&self) -> Arc<Mutex<CameraView>> {
        Arc::clone(&self.view)
    }
}

impl Screen for CameraScreen {
    fn state(&self) -> ScreenState {
        self.state
    }

    fn frame_consumer(&self) -> Option<SharedConsumer> {
        let consumer: SharedConsumer = self.view.clone();
        Some(consumer)
    }

    fn sync_config(&mut self) {
        if self.subscription.take_pending() {
            self.view.lock().reset();
        }
    }

    fn status(&self) -> String {
        let view = self.view.lock();
        match view.last_report() {
            Some(report) => format!("{} [{} frames] {report:?}", self.state, view.frames()),
            None => format!("{} [{} frames]", self.state, view.frames()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumer_identity_is_stable() {
        let store = ConfigStore::new();
        let screen = CameraScreen::for_state(ScreenState::Measurement, &store)
            .expect("camera screen");
        let a = screen.frame_consumer().expect("consumer");
        let b = screen.frame_consumer().expect("consumer");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn frames_without_configuration_report_no_profile() {
        let store = ConfigStore::new();
        let mut view = CameraView::new(CameraStage::Pairing, store);
        view.on_frame(&Frame::new(2, 2));
        assert_eq!(view.frames(), 1);
        assert_eq!(view.last_report(), Some(&FrameReport::NoProfile));
    }

    #[test]
    fn home_and_color_preprocess_have_no_camera() {
        let store = ConfigStore::new();
        assert!(CameraScreen::for_state(ScreenState::Home, &store).is_none());
        assert!(CameraScreen::for_state(ScreenState::ColorPreprocess, &store).is_none());
    }
}
