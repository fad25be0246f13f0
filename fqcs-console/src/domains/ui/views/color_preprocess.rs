//! Color preprocessing screen: slider state over the main profile's color
//! settings and a preview of the sample pair.

use fqcs_model::{ColorSettings, Frame};
use log::{debug, warn};

use crate::domains::config::{ActiveConfiguration, ConfigLoader, ConfigSubscription};
use crate::domains::ui::screen::{Screen, ScreenInput, Slider};
use crate::domains::ui::types::ScreenState;

pub const BLUR_STEP: f64 = 0.01;
pub const SATURATION_STEP: f64 = 0.5;
pub const BRIGHTNESS_STEP: f64 = 0.1;
pub const CONTRAST_STEP: i32 = 5;

/// Widths and heights offered for the preprocessing resize.
pub const RESIZE_CHOICES: [u32; 6] = [32, 64, 128, 256, 512, 1024];

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Integer slider positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SliderPositions {
    pub blur: i32,
    pub brightness_left: i32,
    pub brightness_right: i32,
    pub contrast_left: i32,
    pub contrast_right: i32,
    pub saturation: i32,
}

impl SliderPositions {
    pub fn from_settings(color: &ColorSettings) -> Self {
        Self {
            blur: (color.blur_val / BLUR_STEP).round() as i32,
            brightness_left: (color.alpha_l / BRIGHTNESS_STEP).round() as i32,
            brightness_right: (color.alpha_r / BRIGHTNESS_STEP).round() as i32,
            contrast_left: (f64::from(color.beta_l) / f64::from(CONTRAST_STEP)).round() as i32,
            contrast_right: (f64::from(color.beta_r) / f64::from(CONTRAST_STEP)).round() as i32,
            saturation: (f64::from(color.sat_adj) / SATURATION_STEP).round() as i32,
        }
    }

    pub fn get(&self, slider: Slider) -> i32 {
        match slider {
            Slider::Blur => self.blur,
            Slider::BrightnessLeft => self.brightness_left,
            Slider::BrightnessRight => self.brightness_right,
            Slider::ContrastLeft => self.contrast_left,
            Slider::ContrastRight => self.contrast_right,
            Slider::Saturation => self.saturation,
        }
    }

    /// Move `slider` and write the matching value into `color`. Positions
    /// outside [`Slider::range`] stop at the nearest end.
    pub fn set(&mut self, slider: Slider, position: i32, color: &mut ColorSettings) {
        let position = slider.clamp(position);
        let value = f64::from(position);
        match slider {
            Slider::Blur => {
                self.blur = position;
                color.blur_val = round_to(value * BLUR_STEP, 2);
            }
            Slider::BrightnessLeft => {
                self.brightness_left = position;
                color.alpha_l = round_to(value * BRIGHTNESS_STEP, 1);
            }
            Slider::BrightnessRight => {
                self.brightness_right = position;
                color.alpha_r = round_to(value * BRIGHTNESS_STEP, 1);
            }
            Slider::ContrastLeft => {
                self.contrast_left = position;
                color.beta_l = position * CONTRAST_STEP;
            }
            Slider::ContrastRight => {
                self.contrast_right = position;
                color.beta_r = position * CONTRAST_STEP;
            }
            Slider::Saturation => {
                self.saturation = position;
                // Truncates toward zero.
                color.sat_adj = round_to(value * SATURATION_STEP, 1) as i32;
            }
        }
    }
}

/// Preprocessed sample pair, or why there is none.
#[derive(Debug, Clone)]
pub enum Preview {
    Unavailable,
    Ready { left: Frame, right: Frame },
    Failed(String),
}

#[derive(Debug)]
pub struct ColorPreprocessScreen {
    loader: ConfigLoader,
    subscription: ConfigSubscription,
    sliders: SliderPositions,
    img_size: (u32, u32),
    preview: Preview,
}

impl ColorPreprocessScreen {
    pub fn new(loader: ConfigLoader) -> Self {
        let subscription = loader.store().subscribe();
        let mut screen = Self {
            loader,
            subscription,
            sliders: SliderPositions::default(),
            img_size: ColorSettings::default().img_size,
            preview: Preview::Unavailable,
        };
        screen.load_cfg();
        screen
    }

    pub fn sliders(&self) -> SliderPositions {
        self.sliders
    }

    pub fn img_size(&self) -> (u32, u32) {
        self.img_size
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    /// Reset presentation state from the published configuration.
    pub fn load_cfg(&mut self) {
        let color = self
            .loader
            .store()
            .current()
            .and_then(|config| config.main().map(|main| main.color_cfg))
            .unwrap_or_default();
        self.sliders = SliderPositions::from_settings(&color);
        self.img_size = color.img_size;
    }

    /// Recompute the preview of both samples with the current settings.
    pub fn view_image(&mut self) {
        self.preview = match self.loader.store().current() {
            Some(config) => render_preview(&config),
            None => Preview::Unavailable,
        };
    }

    fn edit_color<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut SliderPositions, &mut ColorSettings),
    {
        let Some(mut profile) = self
            .loader
            .store()
            .current()
            .and_then(|config| config.main().cloned())
        else {
            warn!("[ColorPreprocess] No main profile to edit");
            return;
        };

        edit(&mut self.sliders, &mut profile.color_cfg);
        self.img_size = profile.color_cfg.img_size;
        match self.loader.update_main(profile) {
            Ok(_) => self.view_image(),
            Err(e) => warn!("[ColorPreprocess] Could not apply edit: {e}"),
        }
    }
}

fn render_preview(config: &ActiveConfiguration) -> Preview {
    let (Some(left), Some(right)) = (&config.samples.left, &config.samples.right) else {
        return Preview::Unavailable;
    };
    let Some(profile) = config.main() else {
        return Preview::Unavailable;
    };

    let processed = config
        .manager
        .preprocess(profile, left, true)
        .and_then(|left| {
            config
                .manager
                .preprocess(profile, right, false)
                .map(|right| (left, right))
        });
    match processed {
        Ok((left, right)) => Preview::Ready { left, right },
        Err(e) => {
            debug!("[ColorPreprocess] Preview failed: {e}");
            Preview::Failed(e.to_string())
        }
    }
}

impl Screen for ColorPreprocessScreen {
    fn state(&self) -> ScreenState {
        ScreenState::ColorPreprocess
    }

    fn on_activate(&mut self) {
        self.view_image();
    }

    fn sync_config(&mut self) {
        if self.subscription.take_pending() {
            self.load_cfg();
            self.view_image();
        }
    }

    fn handle_input(&mut self, input: &ScreenInput) -> bool {
        match *input {
            ScreenInput::Slider(slider, position) => {
                if slider.clamp(position) != position {
                    debug!("[ColorPreprocess] {slider} position {position} outside {:?}", slider.range());
                }
                self.edit_color(|sliders, color| sliders.set(slider, position, color));
            }
            ScreenInput::Resize { width, height } => {
                if !(RESIZE_CHOICES.contains(&width) && RESIZE_CHOICES.contains(&height)) {
                    warn!(
                        "[ColorPreprocess] Resize {width}x{height} not offered, choose from {RESIZE_CHOICES:?}"
                    );
                    return true;
                }
                self.edit_color(|_, color| color.img_size = (width, height));
            }
        }
        true
    }

    fn status(&self) -> String {
        let preview = match &self.preview {
            Preview::Unavailable => "no preview available".to_string(),
            Preview::Ready { left, right } => format!(
                "preview {}x{} / {}x{}",
                left.width(),
                left.height(),
                right.width(),
                right.height()
            ),
            Preview::Failed(reason) => format!("preview failed: {reason}"),
        };
        format!(
            "ColorPreprocess {:?} size {:?}: {preview}",
            self.sliders, self.img_size
        )
    }
}
