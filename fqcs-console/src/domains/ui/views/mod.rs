//! Concrete console screens.

pub mod camera;
pub mod color_preprocess;
pub mod home;

pub use camera::{CameraScreen, CameraStage, CameraView, FrameReport};
pub use color_preprocess::{ColorPreprocessScreen, Preview, SliderPositions};
pub use home::HomeScreen;

use crate::domains::auth::TokenLifecycleManager;
use crate::domains::config::ConfigLoader;
use crate::domains::ui::screen::Screen;
use crate::domains::ui::types::ScreenState;

/// One instance of every console screen.
pub fn console_screens(
    loader: &ConfigLoader,
    tokens: &TokenLifecycleManager,
) -> Vec<Box<dyn Screen>> {
    let store = loader.store();
    ScreenState::ALL
        .into_iter()
        .filter_map(|state| -> Option<Box<dyn Screen>> {
            match state {
                ScreenState::Home => Some(Box::new(HomeScreen::new(store, tokens.clone()))),
                ScreenState::ColorPreprocess => {
                    Some(Box::new(ColorPreprocessScreen::new(loader.clone())))
                }
                camera => CameraScreen::for_state(camera, store)
                    .map(|screen| Box::new(screen) as Box<dyn Screen>),
            }
        })
        .collect()
}
