//! Screens and navigation.

pub mod navigator;
pub mod screen;
pub mod types;
pub mod views;

pub use navigator::{NavigationGraph, ScreenNavigator};
pub use screen::{Screen, ScreenInput, Slider};
pub use types::{ScreenState, Transition, Trigger};
