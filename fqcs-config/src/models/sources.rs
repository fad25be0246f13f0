use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::env;
use crate::loader::error::ConfigLoadError;
use crate::util::{bool_var, non_empty, number_var, path_var};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev: Option<bool>,
    #[serde(default)]
    pub auth: FileAuthConfig,
    #[serde(default)]
    pub capture: FileCaptureConfig,
    #[serde(default)]
    pub detection: FileDetectionConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileAuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_token_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_s: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileCaptureConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_root: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileDetectionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_folder: Option<PathBuf>,
}

/// Overrides read from `FQCS_*` variables.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub dev: Option<bool>,
    pub api_url: Option<String>,
    pub token_path: Option<PathBuf>,
    pub dev_token_path: Option<PathBuf>,
    pub request_timeout_s: Option<u64>,
    pub capture_period_ms: Option<u64>,
    pub camera_index: Option<u32>,
    pub camera_root: Option<PathBuf>,
    pub config_folder: Option<PathBuf>,
}

impl EnvConfig {
    pub fn gather<F>(lookup: F) -> Result<Self, ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            dev: bool_var(&lookup, env::DEV)?,
            api_url: non_empty(&lookup, env::API_URL),
            token_path: path_var(&lookup, env::TOKEN_PATH),
            dev_token_path: path_var(&lookup, env::DEV_TOKEN_PATH),
            request_timeout_s: number_var(&lookup, env::REQUEST_TIMEOUT_S)?,
            capture_period_ms: number_var(&lookup, env::CAPTURE_PERIOD_MS)?,
            camera_index: number_var(&lookup, env::CAMERA_INDEX)?,
            camera_root: path_var(&lookup, env::CAMERA_ROOT),
            config_folder: path_var(&lookup, env::CONFIG_FOLDER),
        })
    }
}
