//! Detection backend capability.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use fqcs_model::{DetectedBox, Frame, PairOutcome, ProfileRecord, SampleImages};
use thiserror::Error;

/// Errors surfaced by a detection backend.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed profile {path}: {source}")]
    MalformedProfile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Profile {0} has no model")]
    MissingModel(String),

    #[error("No model loaded for profile {0}")]
    ModelNotLoaded(String),

    #[error("No vision backend attached")]
    BackendUnavailable,

    #[error("Detection failed: {0}")]
    Backend(String),
}

pub type DetectionResult<T> = Result<T, DetectionError>;

/// Operations the console calls on a detection backend bound to one
/// configuration folder.
///
/// Implementations own their loaded model; `load_model` may take a while
/// and is awaited without blocking the interactive loop.
#[async_trait]
pub trait DetectionManager: Send + Sync {
    /// Folder this manager was opened on.
    fn config_folder(&self) -> &Path;

    /// Reference images for previews. Missing images are `None` fields,
    /// not errors.
    fn load_sample_images(&self) -> DetectionResult<SampleImages>;

    /// Profiles in the folder, in the manager's enumeration order.
    fn get_configs(&self) -> DetectionResult<Vec<ProfileRecord>>;

    async fn load_model(&self, profile: &ProfileRecord) -> DetectionResult<()>;

    /// Write `profiles` into `folder` in the manager's own format.
    fn save_config(
        &self,
        folder: &Path,
        profiles: &[ProfileRecord],
    ) -> DetectionResult<()>;

    fn extract_boxes(
        &self,
        profile: &ProfileRecord,
        frame: &Frame,
    ) -> DetectionResult<Vec<DetectedBox>>;

    fn detect_groups_and_pair(
        &self,
        profile: &ProfileRecord,
        boxes: &[DetectedBox],
        frame: &Frame,
    ) -> DetectionResult<PairOutcome>;

    fn preprocess(
        &self,
        profile: &ProfileRecord,
        frame: &Frame,
        is_left: bool,
    ) -> DetectionResult<Frame>;
}

/// Creates a manager for a chosen configuration folder.
pub trait DetectionManagerFactory: Send + Sync {
    fn open(&self, folder: &Path) -> DetectionResult<Arc<dyn DetectionManager>>;
}

impl<F> DetectionManagerFactory for F
where
    F: Fn(&Path) -> DetectionResult<Arc<dyn DetectionManager>> + Send + Sync,
{
    fn open(&self, folder: &Path) -> DetectionResult<Arc<dyn DetectionManager>> {
        self(folder)
    }
}
