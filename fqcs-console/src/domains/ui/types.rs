use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Console screens. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScreenState {
    Home,
    DetectionConfig,
    Measurement,
    TestDetectPair,
    ColorPreprocess,
    AsymConfig,
    ColorCalibration,
    ErrorDetect,
    Progress,
}

impl ScreenState {
    pub const ALL: [ScreenState; 9] = [
        ScreenState::Home,
        ScreenState::DetectionConfig,
        ScreenState::Measurement,
        ScreenState::TestDetectPair,
        ScreenState::ColorPreprocess,
        ScreenState::AsymConfig,
        ScreenState::ColorCalibration,
        ScreenState::ErrorDetect,
        ScreenState::Progress,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScreenState::Home => "Home",
            ScreenState::DetectionConfig => "DetectionConfig",
            ScreenState::Measurement => "Measurement",
            ScreenState::TestDetectPair => "TestDetectPair",
            ScreenState::ColorPreprocess => "ColorPreprocess",
            ScreenState::AsymConfig => "AsymConfig",
            ScreenState::ColorCalibration => "ColorCalibration",
            ScreenState::ErrorDetect => "ErrorDetect",
            ScreenState::Progress => "Progress",
        }
    }
}

impl fmt::Display for ScreenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named operator actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Back,
    Next,
    EditConfig,
    StartMeasurement,
    Finish,
    /// Re-arm the pump on a camera screen.
    Capture,
    /// Pause the pump without leaving the screen.
    StopCapture,
    Logout,
    Exit,
}

impl Trigger {
    pub const ALL: [Trigger; 9] = [
        Trigger::Back,
        Trigger::Next,
        Trigger::EditConfig,
        Trigger::StartMeasurement,
        Trigger::Finish,
        Trigger::Capture,
        Trigger::StopCapture,
        Trigger::Logout,
        Trigger::Exit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Trigger::Back => "back",
            Trigger::Next => "next",
            Trigger::EditConfig => "editConfig",
            Trigger::StartMeasurement => "startMeasurement",
            Trigger::Finish => "finish",
            Trigger::Capture => "capture",
            Trigger::StopCapture => "stopCapture",
            Trigger::Logout => "logout",
            Trigger::Exit => "exit",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown trigger {0:?}")]
pub struct UnknownTrigger(pub String);

impl FromStr for Trigger {
    type Err = UnknownTrigger;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Trigger::ALL
            .into_iter()
            .find(|trigger| trigger.name() == s)
            .ok_or_else(|| UnknownTrigger(s.to_string()))
    }
}

/// Outcome of applying one trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved { from: ScreenState, to: ScreenState },
    /// No edge for the trigger on the current screen.
    Ignored,
    CaptureToggled { armed: bool },
    LoggedOut { from: ScreenState },
    Exit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_names_round_trip() {
        for trigger in Trigger::ALL {
            assert_eq!(trigger.name().parse::<Trigger>(), Ok(trigger));
        }
    }

    #[test]
    fn trigger_parse_is_case_sensitive() {
        assert!("EditConfig".parse::<Trigger>().is_err());
        assert!("".parse::<Trigger>().is_err());
    }
}
