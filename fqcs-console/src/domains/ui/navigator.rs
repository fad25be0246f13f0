//! Screen state machine and capture rebinding.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info, warn};

use crate::domains::auth::TokenLifecycleManager;
use crate::domains::capture::{CaptureBinding, CaptureScheduler};
use crate::domains::ui::screen::{Screen, ScreenInput};
use crate::domains::ui::types::{ScreenState, Transition, Trigger};

use ScreenState::*;

const CONSOLE_EDGES: &[(ScreenState, Trigger, ScreenState)] = &[
    (Home, Trigger::EditConfig, DetectionConfig),
    (Home, Trigger::StartMeasurement, Progress),
    (DetectionConfig, Trigger::Back, Home),
    (DetectionConfig, Trigger::Next, Measurement),
    (Measurement, Trigger::Back, DetectionConfig),
    (Measurement, Trigger::Next, TestDetectPair),
    (TestDetectPair, Trigger::Back, Measurement),
    (TestDetectPair, Trigger::Next, ColorPreprocess),
    (ColorPreprocess, Trigger::Back, TestDetectPair),
    (ColorPreprocess, Trigger::Next, AsymConfig),
    (AsymConfig, Trigger::Back, ColorPreprocess),
    (AsymConfig, Trigger::Next, ColorCalibration),
    (ColorCalibration, Trigger::Back, AsymConfig),
    (ColorCalibration, Trigger::Next, ErrorDetect),
    (ErrorDetect, Trigger::Back, ColorCalibration),
    (ErrorDetect, Trigger::Next, Progress),
    (Progress, Trigger::Finish, Home),
    (Progress, Trigger::Back, Home),
];

/// Static `(screen, trigger) -> screen` table.
#[derive(Debug, Clone)]
pub struct NavigationGraph {
    edges: HashMap<(ScreenState, Trigger), ScreenState>,
}

impl NavigationGraph {
    pub fn new(edges: &[(ScreenState, Trigger, ScreenState)]) -> Self {
        Self {
            edges: edges
                .iter()
                .map(|&(from, trigger, to)| ((from, trigger), to))
                .collect(),
        }
    }

    /// The operator console's screen flow.
    pub fn console() -> Self {
        Self::new(CONSOLE_EDGES)
    }

    pub fn target(&self, from: ScreenState, trigger: Trigger) -> Option<ScreenState> {
        self.edges.get(&(from, trigger)).copied()
    }

    pub fn edges(&self) -> impl Iterator<Item = (ScreenState, Trigger, ScreenState)> + '_ {
        self.edges
            .iter()
            .map(|(&(from, trigger), &to)| (from, trigger, to))
    }
}

/// Owns the screens and the capture pump; the only place a binding changes.
pub struct ScreenNavigator {
    graph: NavigationGraph,
    current: ScreenState,
    screens: BTreeMap<ScreenState, Box<dyn Screen>>,
    capture: CaptureScheduler,
    tokens: TokenLifecycleManager,
}

impl std::fmt::Debug for ScreenNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenNavigator")
            .field("current", &self.current)
            .field("screens", &self.screens.keys().collect::<Vec<_>>())
            .field("capture", &self.capture)
            .finish_non_exhaustive()
    }
}

impl ScreenNavigator {
    /// Build a navigator starting on Home. Screens missing from `screens`
    /// are treated as consumer-less placeholders.
    pub fn new(
        graph: NavigationGraph,
        screens: Vec<Box<dyn Screen>>,
        capture: CaptureScheduler,
        tokens: TokenLifecycleManager,
    ) -> Self {
        let screens = screens
            .into_iter()
            .map(|screen| (screen.state(), screen))
            .collect();
        let mut navigator = Self {
            graph,
            current: Home,
            screens,
            capture,
            tokens,
        };
        navigator.rebind();
        navigator
    }

    pub fn current(&self) -> ScreenState {
        self.current
    }

    pub fn graph(&self) -> &NavigationGraph {
        &self.graph
    }

    pub fn capture(&self) -> &CaptureScheduler {
        &self.capture
    }

    pub fn capture_mut(&mut self) -> &mut CaptureScheduler {
        &mut self.capture
    }

    pub fn screen(&self, state: ScreenState) -> Option<&dyn Screen> {
        self.screens.get(&state).map(|screen| screen.as_ref())
    }

    pub fn current_screen(&self) -> Option<&dyn Screen> {
        self.screen(self.current)
    }

    pub async fn apply(&mut self, trigger: Trigger) -> Transition {
        match trigger {
            Trigger::Exit => {
                info!("[Navigator] Exit requested on {}", self.current);
                Transition::Exit
            }
            Trigger::Logout => {
                if let Err(e) = self.tokens.log_out().await {
                    warn!("[Navigator] Logout did not complete cleanly: {e}");
                }
                let from = self.current;
                self.move_to(Home);
                Transition::LoggedOut { from }
            }
            Trigger::Capture => {
                if !self.capture.binding().active {
                    debug!("[Navigator] capture ignored, {} has no camera", self.current);
                    return Transition::Ignored;
                }
                self.capture.control(true);
                Transition::CaptureToggled { armed: true }
            }
            Trigger::StopCapture => {
                self.capture.control(false);
                Transition::CaptureToggled { armed: false }
            }
            _ => match self.graph.target(self.current, trigger) {
                Some(to) => {
                    let from = self.current;
                    self.move_to(to);
                    info!("[Navigator] {from} --{trigger}--> {to}");
                    Transition::Moved { from, to }
                }
                None => {
                    debug!("[Navigator] {trigger} ignored on {}", self.current);
                    Transition::Ignored
                }
            },
        }
    }

    /// Forward input to the current screen.
    pub fn input(&mut self, input: &ScreenInput) -> bool {
        let handled = self
            .screens
            .get_mut(&self.current)
            .is_some_and(|screen| screen.handle_input(input));
        if !handled {
            debug!("[Navigator] {input:?} not handled by {}", self.current);
        }
        handled
    }

    /// Let every screen pick up published configuration changes.
    pub fn sync_screens(&mut self) {
        for screen in self.screens.values_mut() {
            screen.sync_config();
        }
    }

    fn move_to(&mut self, to: ScreenState) {
        self.current = to;
        self.rebind();
        if let Some(screen) = self.screens.get_mut(&to) {
            screen.on_activate();
        }
    }

    fn rebind(&mut self) {
        let consumer = self
            .screens
            .get(&self.current)
            .and_then(|screen| screen.frame_consumer());
        let armed = consumer.is_some();
        self.capture.rebind(CaptureBinding::for_consumer(consumer));
        self.capture.control(armed);
    }
}
