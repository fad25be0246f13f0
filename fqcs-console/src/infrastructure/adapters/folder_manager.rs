//! Detection manager backed by a plain configuration folder.
//!
//! Layout:
//!
//! ```text
//! <folder>/
//!   00-main.json        one ProfileRecord per file, enumerated by file name
//!   01-backup.json
//!   samples/left.png    optional sample pair, any format `image` reads
//!   samples/right.png
//!   models/...          model files referenced by `model_path`
//! ```
//!
//! Profile bookkeeping and model loading live here. Vision operations need
//! a backend and report [`DetectionError::BackendUnavailable`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use fqcs_contracts::detection::{
    DetectionError, DetectionManager, DetectionManagerFactory, DetectionResult,
};
use fqcs_model::{DetectedBox, Frame, PairOutcome, ProfileRecord, SampleImages};
use log::{debug, info};
use parking_lot::Mutex;

pub const SAMPLES_DIR: &str = "samples";
pub const SAMPLE_LEFT_STEM: &str = "left";
pub const SAMPLE_RIGHT_STEM: &str = "right";
const PROFILE_EXTENSION: &str = "json";

#[derive(Debug, Clone, PartialEq, Eq)]
struct LoadedModel {
    profile: String,
    bytes: usize,
}

#[derive(Debug)]
pub struct FolderDetectionManager {
    folder: PathBuf,
    model: Mutex<Option<LoadedModel>>,
}

impl FolderDetectionManager {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            model: Mutex::new(None),
        }
    }

    /// Name of the profile whose model is loaded, if any.
    pub fn loaded_profile(&self) -> Option<String> {
        self.model.lock().as_ref().map(|model| model.profile.clone())
    }

    pub fn loaded_model_size(&self) -> Option<usize> {
        self.model.lock().as_ref().map(|model| model.bytes)
    }

    fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DetectionError + '_ {
        move |source| DetectionError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn profile_files(folder: &Path) -> DetectionResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(folder).map_err(Self::io_error(folder))? {
            let path = entry.map_err(Self::io_error(folder))?.path();
            if path.is_file()
                && path.extension().is_some_and(|ext| ext == PROFILE_EXTENSION)
            {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn find_sample(dir: &Path, stem: &str) -> DetectionResult<Option<Frame>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_error(dir)(e)),
        };

        let mut candidates: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_stem().is_some_and(|s| s == stem)
                    && image::ImageFormat::from_path(path).is_ok()
            })
            .collect();
        candidates.sort();

        match candidates.first() {
            Some(path) => Ok(Some(image::open(path)?.to_rgb8())),
            None => Ok(None),
        }
    }

    fn require_model(&self, profile: &ProfileRecord) -> DetectionResult<()> {
        match self.model.lock().as_ref() {
            Some(model) if model.profile == profile.name => Ok(()),
            _ => Err(DetectionError::ModelNotLoaded(profile.name.clone())),
        }
    }
}

/// File name a profile is saved under; the index keeps enumeration order.
pub fn profile_file_name(index: usize, profile: &ProfileRecord) -> String {
    let name: String = profile
        .name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{index:02}-{name}.{PROFILE_EXTENSION}")
}

#[async_trait]
impl DetectionManager for FolderDetectionManager {
    fn config_folder(&self) -> &Path {
        &self.folder
    }

    fn load_sample_images(&self) -> DetectionResult<SampleImages> {
        let dir = self.folder.join(SAMPLES_DIR);
        Ok(SampleImages {
            left: Self::find_sample(&dir, SAMPLE_LEFT_STEM)?,
            right: Self::find_sample(&dir, SAMPLE_RIGHT_STEM)?,
        })
    }

    fn get_configs(&self) -> DetectionResult<Vec<ProfileRecord>> {
        Self::profile_files(&self.folder)?
            .into_iter()
            .map(|path| {
                let raw = fs::read_to_string(&path).map_err(Self::io_error(&path))?;
                serde_json::from_str(&raw)
                    .map_err(|source| DetectionError::MalformedProfile { path, source })
            })
            .collect()
    }

    async fn load_model(&self, profile: &ProfileRecord) -> DetectionResult<()> {
        let relative = profile
            .model_path
            .as_ref()
            .ok_or_else(|| DetectionError::MissingModel(profile.name.clone()))?;
        let path = self.folder.join(relative);

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(Self::io_error(&path))?;
        info!(
            "[ConfigLoader] Model for {} loaded ({} bytes)",
            profile.name,
            bytes.len()
        );
        *self.model.lock() = Some(LoadedModel {
            profile: profile.name.clone(),
            bytes: bytes.len(),
        });
        Ok(())
    }

    fn save_config(&self, folder: &Path, profiles: &[ProfileRecord]) -> DetectionResult<()> {
        fs::create_dir_all(folder).map_err(Self::io_error(folder))?;

        // The folder holds exactly the saved set afterwards.
        for stale in Self::profile_files(folder)? {
            fs::remove_file(&stale).map_err(Self::io_error(&stale))?;
        }

        for (index, profile) in profiles.iter().enumerate() {
            let path = folder.join(profile_file_name(index, profile));
            let json = serde_json::to_string_pretty(profile).map_err(|source| {
                DetectionError::MalformedProfile {
                    path: path.clone(),
                    source,
                }
            })?;
            fs::write(&path, json).map_err(Self::io_error(&path))?;
        }
        debug!(
            "[ConfigLoader] Wrote {} profile file(s) to {}",
            profiles.len(),
            folder.display()
        );
        Ok(())
    }

    fn extract_boxes(
        &self,
        profile: &ProfileRecord,
        _frame: &Frame,
    ) -> DetectionResult<Vec<DetectedBox>> {
        self.require_model(profile)?;
        Err(DetectionError::BackendUnavailable)
    }

    fn detect_groups_and_pair(
        &self,
        profile: &ProfileRecord,
        _boxes: &[DetectedBox],
        _frame: &Frame,
    ) -> DetectionResult<PairOutcome> {
        self.require_model(profile)?;
        Err(DetectionError::BackendUnavailable)
    }

    fn preprocess(
        &self,
        _profile: &ProfileRecord,
        _frame: &Frame,
        _is_left: bool,
    ) -> DetectionResult<Frame> {
        Err(DetectionError::BackendUnavailable)
    }
}

/// Opens a [`FolderDetectionManager`] for existing directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct FolderManagerFactory;

impl DetectionManagerFactory for FolderManagerFactory {
    fn open(&self, folder: &Path) -> DetectionResult<Arc<dyn DetectionManager>> {
        if !folder.is_dir() {
            return Err(DetectionError::Io {
                path: folder.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "configuration folder does not exist",
                ),
            });
        }
        Ok(Arc::new(FolderDetectionManager::new(folder)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_profile(folder: &Path, file: &str, profile: &ProfileRecord) {
        fs::write(
            folder.join(file),
            serde_json::to_string_pretty(profile).expect("json"),
        )
        .expect("write profile");
    }

    #[test]
    fn profiles_enumerate_in_file_name_order() {
        let dir = tempdir().expect("tempdir");
        write_profile(dir.path(), "b.json", &ProfileRecord::new("second"));
        write_profile(dir.path(), "a.json", &ProfileRecord::new("first").main());
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let manager = FolderDetectionManager::new(dir.path());
        let names: Vec<_> = manager
            .get_configs()
            .expect("configs")
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["first", "second"]);
    }

    #[test]
    fn malformed_profile_names_the_file() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("bad.json"), "{").expect("write");

        let err = FolderDetectionManager::new(dir.path())
            .get_configs()
            .unwrap_err();
        match err {
            DetectionError::MalformedProfile { path, .. } => {
                assert!(path.ends_with("bad.json"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_samples_are_not_an_error() {
        let dir = tempdir().expect("tempdir");
        let samples = FolderDetectionManager::new(dir.path())
            .load_sample_images()
            .expect("samples");
        assert!(samples.left.is_none());
        assert!(samples.right.is_none());
    }

    #[test]
    fn sample_pair_is_read_from_samples_dir() {
        let dir = tempdir().expect("tempdir");
        let samples_dir = dir.path().join(SAMPLES_DIR);
        fs::create_dir_all(&samples_dir).expect("mkdir");
        Frame::new(3, 2).save(samples_dir.join("left.png")).expect("left");
        Frame::new(5, 4).save(samples_dir.join("right.png")).expect("right");

        let samples = FolderDetectionManager::new(dir.path())
            .load_sample_images()
            .expect("samples");
        assert!(samples.is_complete());
        assert_eq!(samples.right.expect("right").dimensions(), (5, 4));
    }

    #[tokio::test]
    async fn model_load_gates_vision_calls() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("model.bin"), [1u8, 2, 3]).expect("model");
        let profile = ProfileRecord::new("main").main().with_model_path("model.bin");
        let manager = FolderDetectionManager::new(dir.path());
        let frame = Frame::new(1, 1);

        assert!(matches!(
            manager.extract_boxes(&profile, &frame),
            Err(DetectionError::ModelNotLoaded(_))
        ));
        manager.load_model(&profile).await.expect("load");
        assert_eq!(manager.loaded_profile().as_deref(), Some("main"));
        assert_eq!(manager.loaded_model_size(), Some(3));
        assert!(matches!(
            manager.extract_boxes(&profile, &frame),
            Err(DetectionError::BackendUnavailable)
        ));
    }

    #[tokio::test]
    async fn profile_without_model_path_is_reported() {
        let dir = tempdir().expect("tempdir");
        let err = FolderDetectionManager::new(dir.path())
            .load_model(&ProfileRecord::new("bare").main())
            .await
            .unwrap_err();
        assert!(matches!(err, DetectionError::MissingModel(name) if name == "bare"));
    }

    #[test]
    fn save_replaces_profile_files_and_keeps_order() {
        let source = tempdir().expect("tempdir");
        let target = tempdir().expect("tempdir");
        write_profile(target.path(), "zz-old.json", &ProfileRecord::new("old"));

        let profiles = vec![
            ProfileRecord::new("line a").main(),
            ProfileRecord::new("line b"),
        ];
        let manager = FolderDetectionManager::new(source.path());
        manager.save_config(target.path(), &profiles).expect("save");

        let reread = FolderDetectionManager::new(target.path())
            .get_configs()
            .expect("configs");
        assert_eq!(reread, profiles);
        assert!(target.path().join("00-line_a.json").exists());
    }

    #[test]
    fn factory_rejects_missing_folder() {
        let dir = tempdir().expect("tempdir");
        assert!(FolderManagerFactory.open(&dir.path().join("absent")).is_err());
        assert!(FolderManagerFactory.open(dir.path()).is_ok());
    }
}
