//! Composition of defaults, TOML file, `.env` and environment variables.

pub mod error;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use url::Url;

use crate::constants::CAPTURE_PERIOD_RANGE_MS;
use crate::models::sources::{EnvConfig, FileConfig};
use crate::models::{AppConfig, ConfigMetadata, default_config_path, resolve_relative};
use error::ConfigLoadError;

/// Result of a successful load.
#[derive(Debug, Clone)]
pub struct AppConfigLoad {
    pub config: AppConfig,
}

impl AppConfigLoad {
    pub fn into_config(self) -> AppConfig {
        self.config
    }
}

/// Builder for loading [`AppConfig`].
#[derive(Debug, Clone)]
pub struct AppConfigLoader {
    config_path: Option<PathBuf>,
    env_file: Option<PathBuf>,
    use_dotenv: bool,
}

impl Default for AppConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfigLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_file: None,
            use_dotenv: true,
        }
    }

    /// Use an explicit TOML file. Unlike the default location, an explicit
    /// file must exist.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    pub fn without_dotenv(mut self) -> Self {
        self.use_dotenv = false;
        self
    }

    /// Load using the process environment.
    pub fn load(&self) -> Result<AppConfigLoad, ConfigLoadError> {
        let env_file_loaded = self.load_env_file()?;
        let mut load = self.load_with(|key| std::env::var(key).ok())?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Load using `lookup` in place of the process environment.
    pub fn load_with<F>(&self, lookup: F) -> Result<AppConfigLoad, ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (file, file_path) = self.read_file()?;
        let env = EnvConfig::gather(lookup)?;

        let mut config = AppConfig::default();
        let base = file_path.as_deref().and_then(Path::parent);
        apply_file(&mut config, file, base);
        apply_env(&mut config, env);
        validate(&config)?;

        config.metadata = ConfigMetadata {
            config_path: file_path,
            env_file_loaded: false,
        };
        debug!(
            "config resolved: dev={} api_url={} period={:?}",
            config.dev, config.auth.api_url, config.capture.period
        );
        Ok(AppConfigLoad { config })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        if !self.use_dotenv {
            return Ok(false);
        }
        match &self.env_file {
            Some(path) => dotenvy::from_path(path)
                .map(|_| true)
                .map_err(|source| ConfigLoadError::EnvFile {
                    path: path.clone(),
                    source,
                }),
            None => Ok(dotenvy::dotenv().is_ok()),
        }
    }

    fn read_file(&self) -> Result<(FileConfig, Option<PathBuf>), ConfigLoadError> {
        let (path, required) = match &self.config_path {
            Some(path) => (path.clone(), true),
            None => match default_config_path() {
                Some(path) => (path, false),
                None => return Ok((FileConfig::default(), None)),
            },
        };

        if !path.exists() {
            if required {
                return Err(ConfigLoadError::MissingConfigFile { path });
            }
            return Ok((FileConfig::default(), None));
        }

        let raw = fs::read_to_string(&path).map_err(|source| {
            ConfigLoadError::Io {
                path: path.clone(),
                source,
            }
        })?;
        let file = toml::from_str::<FileConfig>(&raw).map_err(|source| {
            ConfigLoadError::Parse {
                path: path.clone(),
                source,
            }
        })?;
        info!("loaded config file {}", path.display());
        Ok((file, Some(path)))
    }
}

fn apply_file(config: &mut AppConfig, file: FileConfig, base: Option<&Path>) {
    if let Some(dev) = file.dev {
        config.dev = dev;
    }

    let auth = file.auth;
    if let Some(api_url) = auth.api_url {
        config.auth.api_url = api_url;
    }
    if let Some(path) = auth.token_path {
        config.auth.token_path = resolve_relative(base, path);
    }
    if let Some(path) = auth.dev_token_path {
        config.auth.dev_token_path = resolve_relative(base, path);
    }
    if let Some(secs) = auth.request_timeout_s {
        config.auth.request_timeout = Duration::from_secs(secs);
    }

    let capture = file.capture;
    if let Some(ms) = capture.period_ms {
        config.capture.period = Duration::from_millis(ms);
    }
    if capture.camera_index.is_some() {
        config.capture.camera_index = capture.camera_index;
    }
    if let Some(root) = capture.camera_root {
        config.capture.camera_root = resolve_relative(base, root);
    }

    if let Some(folder) = file.detection.config_folder {
        config.detection.config_folder = Some(resolve_relative(base, folder));
    }
}

fn apply_env(config: &mut AppConfig, env: EnvConfig) {
    if let Some(dev) = env.dev {
        config.dev = dev;
    }
    if let Some(api_url) = env.api_url {
        config.auth.api_url = api_url;
    }
    if let Some(path) = env.token_path {
        config.auth.token_path = path;
    }
    if let Some(path) = env.dev_token_path {
        config.auth.dev_token_path = path;
    }
    if let Some(secs) = env.request_timeout_s {
        config.auth.request_timeout = Duration::from_secs(secs);
    }
    if let Some(ms) = env.capture_period_ms {
        config.capture.period = Duration::from_millis(ms);
    }
    if env.camera_index.is_some() {
        config.capture.camera_index = env.camera_index;
    }
    if let Some(root) = env.camera_root {
        config.capture.camera_root = root;
    }
    if env.config_folder.is_some() {
        config.detection.config_folder = env.config_folder;
    }
}

fn validate(config: &AppConfig) -> Result<(), ConfigLoadError> {
    let period_ms = config.capture.period.as_millis() as u64;
    if !CAPTURE_PERIOD_RANGE_MS.contains(&period_ms) {
        return Err(ConfigLoadError::InvalidValue {
            key: "capture.period_ms",
            value: period_ms.to_string(),
            reason: "must be between 1 and 1000 milliseconds",
        });
    }

    Url::parse(&config.auth.api_url).map_err(|source| {
        ConfigLoadError::InvalidApiUrl {
            value: config.auth.api_url.clone(),
            source,
        }
    })?;
    Ok(())
}
