use std::path::PathBuf;

use fqcs_contracts::detection::DetectionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Detection backend error: {0}")]
    Detection(#[from] DetectionError),

    #[error("No configuration loaded")]
    NoConfiguration,

    #[error("No config provided")]
    NoProfiles,

    #[error("No main profile in the active configuration")]
    NoMainProfile,

    #[error("Load of {} superseded by a later load", path.display())]
    Superseded { path: PathBuf },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
