//! Screen capability surface seen by the navigator.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use thiserror::Error;

use crate::domains::capture::SharedConsumer;
use crate::domains::ui::types::ScreenState;

/// One console screen.
///
/// A screen that shows the camera returns the same consumer every time
/// [`Screen::frame_consumer`] is called; it is created with the screen.
pub trait Screen: Send {
    fn state(&self) -> ScreenState;

    fn frame_consumer(&self) -> Option<SharedConsumer> {
        None
    }

    /// Called after the navigator made this screen current.
    fn on_activate(&mut self) {}

    /// Reload presentation state if the configuration changed since the
    /// last call. Runs for every screen, visible or not.
    fn sync_config(&mut self) {}

    /// Operator input aimed at this screen. Returns whether it was handled.
    fn handle_input(&mut self, _input: &ScreenInput) -> bool {
        false
    }

    /// One-line status for the driver prompt.
    fn status(&self) -> String {
        self.state().to_string()
    }
}

/// Color preprocessing sliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slider {
    Blur,
    BrightnessLeft,
    BrightnessRight,
    ContrastLeft,
    ContrastRight,
    Saturation,
}

impl Slider {
    pub const ALL: [Slider; 6] = [
        Slider::Blur,
        Slider::BrightnessLeft,
        Slider::BrightnessRight,
        Slider::ContrastLeft,
        Slider::ContrastRight,
        Slider::Saturation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Slider::Blur => "blur",
            Slider::BrightnessLeft => "brightness-left",
            Slider::BrightnessRight => "brightness-right",
            Slider::ContrastLeft => "contrast-left",
            Slider::ContrastRight => "contrast-right",
            Slider::Saturation => "saturation",
        }
    }

    /// Tick positions the slider can take.
    pub fn range(self) -> RangeInclusive<i32> {
        match self {
            Slider::Blur => 0..=100,
            Slider::BrightnessLeft | Slider::BrightnessRight => 0..=30,
            Slider::ContrastLeft | Slider::ContrastRight => -50..=50,
            Slider::Saturation => -50..=50,
        }
    }

    pub fn clamp(self, position: i32) -> i32 {
        let range = self.range();
        position.clamp(*range.start(), *range.end())
    }
}

impl fmt::Display for Slider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown slider {0:?}")]
pub struct UnknownSlider(pub String);

impl FromStr for Slider {
    type Err = UnknownSlider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Slider::ALL
            .into_iter()
            .find(|slider| slider.name() == s)
            .ok_or_else(|| UnknownSlider(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenInput {
    /// Move a slider to an integer tick position.
    Slider(Slider, i32),
    Resize { width: u32, height: u32 },
}
