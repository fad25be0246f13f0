pub mod sources;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;

use crate::constants::{
    CAMERA_DIR_NAME, DEFAULT_API_URL, DEFAULT_CAPTURE_PERIOD_MS,
    DEFAULT_REQUEST_TIMEOUT_S, DEV_TOKEN_FILE_NAME, TOKEN_FILE_NAME,
};

/// Effective console configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Development mode: no token scheduling, canned login.
    pub dev: bool,
    pub auth: AuthSettings,
    pub capture: CaptureSettings,
    pub detection: DetectionSettings,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub api_url: String,
    /// Persisted credential file.
    pub token_path: PathBuf,
    /// Credential returned by the development-mode login.
    pub dev_token_path: PathBuf,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    pub period: Duration,
    /// Camera opened at start-up, if any.
    pub camera_index: Option<u32>,
    /// Directory backing the folder camera.
    pub camera_root: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionSettings {
    /// Profile folder loaded at start-up, if any.
    pub config_folder: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let dirs = project_dirs();
        let data_dir = dirs
            .as_ref()
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let config_dir = dirs
            .as_ref()
            .map(|d| d.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            dev: false,
            auth: AuthSettings {
                api_url: DEFAULT_API_URL.to_string(),
                token_path: data_dir.join(TOKEN_FILE_NAME),
                dev_token_path: config_dir.join(DEV_TOKEN_FILE_NAME),
                request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_S),
            },
            capture: CaptureSettings {
                period: Duration::from_millis(DEFAULT_CAPTURE_PERIOD_MS),
                camera_index: None,
                camera_root: data_dir.join(CAMERA_DIR_NAME),
            },
            detection: DetectionSettings::default(),
            metadata: ConfigMetadata::default(),
        }
    }
}

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "fqcs", "console")
}

/// Default location of the TOML file, when the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join(crate::constants::CONFIG_FILE_NAME))
}

/// Resolve `path` against `base` unless it is already absolute.
pub(crate) fn resolve_relative(base: Option<&Path>, path: PathBuf) -> PathBuf {
    match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path,
    }
}
