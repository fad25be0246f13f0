//! Camera device that replays the images of a directory.
//!
//! Camera `n` is `<root>/<n>/`. Index 0 falls back to `<root>` itself when
//! it has no `0` subdirectory, so a flat folder of frames works as the
//! default camera.

use std::fs;
use std::path::{Path, PathBuf};

use fqcs_contracts::camera::{CameraDevice, CameraError};
use fqcs_model::Frame;
use log::{debug, warn};

#[derive(Debug)]
pub struct FolderCamera {
    root: PathBuf,
    frames: Vec<Frame>,
    cursor: usize,
    open: bool,
}

impl FolderCamera {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            frames: Vec::new(),
            cursor: 0,
            open: false,
        }
    }

    fn camera_dir(&self, index: u32) -> Option<PathBuf> {
        let dir = self.root.join(index.to_string());
        if dir.is_dir() {
            Some(dir)
        } else if index == 0 && self.root.is_dir() {
            Some(self.root.clone())
        } else {
            None
        }
    }

    fn decode_dir(dir: &Path) -> Result<Vec<Frame>, CameraError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && image::ImageFormat::from_path(path).is_ok())
            .collect();
        paths.sort();

        let mut frames = Vec::with_capacity(paths.len());
        for path in paths {
            match image::open(&path) {
                Ok(image) => frames.push(image.to_rgb8()),
                Err(e) => warn!("[Capture] Skipping unreadable frame {}: {e}", path.display()),
            }
        }
        Ok(frames)
    }
}

impl CameraDevice for FolderCamera {
    fn open(&mut self, index: u32) -> Result<(), CameraError> {
        let dir = self.camera_dir(index).ok_or_else(|| CameraError::Unavailable {
            index,
            reason: format!("no frame directory under {}", self.root.display()),
        })?;

        let frames = Self::decode_dir(&dir)?;
        if frames.is_empty() {
            return Err(CameraError::Unavailable {
                index,
                reason: format!("{} contains no images", dir.display()),
            });
        }

        debug!("[Capture] Camera {index}: {} frame(s) from {}", frames.len(), dir.display());
        self.frames = frames;
        self.cursor = 0;
        self.open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn read(&mut self) -> Option<Frame> {
        if !self.open {
            return None;
        }
        let frame = self.frames.get(self.cursor)?.clone();
        self.cursor = (self.cursor + 1) % self.frames.len();
        Some(frame)
    }

    fn release(&mut self) {
        self.open = false;
        self.frames.clear();
        self.cursor = 0;
    }
}
