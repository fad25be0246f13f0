//! Detection profile records stored in a configuration folder.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One detection profile as enumerated by a detection manager.
///
/// Only the fields the console reasons about are typed; everything else
/// the vision backend stores is carried through `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub name: String,
    #[serde(default)]
    pub is_main: bool,
    /// Model weights, relative to the configuration folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
    #[serde(default)]
    pub color_cfg: ColorSettings,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProfileRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_main: false,
            model_path: None,
            color_cfg: ColorSettings::default(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn main(mut self) -> Self {
        self.is_main = true;
        self
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }
}

/// Color-difference preprocessing parameters, per side where relevant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    /// Resize target as `(width, height)`.
    pub img_size: (u32, u32),
    pub blur_val: f64,
    /// Brightness gain, left side.
    pub alpha_l: f64,
    /// Brightness gain, right side.
    pub alpha_r: f64,
    /// Contrast offset, left side.
    pub beta_l: i32,
    /// Contrast offset, right side.
    pub beta_r: i32,
    pub sat_adj: i32,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            img_size: (32, 64),
            blur_val: 0.05,
            alpha_l: 1.0,
            alpha_r: 1.0,
            beta_l: 0,
            beta_r: 0,
            sat_adj: 0,
        }
    }
}
