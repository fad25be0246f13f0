#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use fqcs_console::domains::auth::errors::NetworkError;
use fqcs_console::domains::auth::{
    AuthResult, CredentialStorage, LoginOutcome, TokenLifecycleManager, TokenSettings,
};
use fqcs_console::domains::capture::CaptureScheduler;
use fqcs_console::domains::config::{ConfigLoader, ConfigStore};
use fqcs_console::domains::ui::views::console_screens;
use fqcs_console::domains::ui::{NavigationGraph, ScreenNavigator};
use fqcs_console::infrastructure::services::LoginClient;
use fqcs_console::infrastructure::task_groups::ThreadGroupRegistry;
use fqcs_contracts::camera::{CameraDevice, CameraError};
use fqcs_contracts::detection::{
    DetectionError, DetectionManager, DetectionManagerFactory, DetectionResult,
};
use fqcs_model::{Credential, DetectedBox, Frame, PairOutcome, ProfileRecord, SampleImages};
use parking_lot::Mutex;

pub const TICK: Duration = Duration::from_millis(20);

/// Camera that always has a frame once opened.
#[derive(Debug, Default, Clone)]
pub struct FakeCamera {
    pub reads: Arc<AtomicUsize>,
    open: bool,
}

impl CameraDevice for FakeCamera {
    fn open(&mut self, index: u32) -> Result<(), CameraError> {
        if index > 3 {
            return Err(CameraError::Unavailable {
                index,
                reason: "unplugged".into(),
            });
        }
        self.open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn read(&mut self) -> Option<Frame> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Some(Frame::new(8, 8))
    }

    fn release(&mut self) {
        self.open = false;
    }
}

/// In-memory detection manager recording what the console asks of it.
#[derive(Debug)]
pub struct FakeDetectionManager {
    pub folder: PathBuf,
    pub profiles: Vec<ProfileRecord>,
    pub samples: bool,
    pub model_delay: Duration,
    pub fail_model: bool,
    pub model_loads: Mutex<Vec<String>>,
    pub saved: Mutex<Vec<(PathBuf, usize)>>,
}

impl FakeDetectionManager {
    pub fn new(folder: impl Into<PathBuf>, profiles: Vec<ProfileRecord>) -> Self {
        Self {
            folder: folder.into(),
            profiles,
            samples: false,
            model_delay: Duration::ZERO,
            fail_model: false,
            model_loads: Mutex::new(Vec::new()),
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn with_samples(mut self) -> Self {
        self.samples = true;
        self
    }

    pub fn with_model_delay(mut self, delay: Duration) -> Self {
        self.model_delay = delay;
        self
    }

    pub fn failing_model(mut self) -> Self {
        self.fail_model = true;
        self
    }

    pub fn model_loads(&self) -> Vec<String> {
        self.model_loads.lock().clone()
    }
}

#[async_trait]
impl DetectionManager for FakeDetectionManager {
    fn config_folder(&self) -> &Path {
        &self.folder
    }

    fn load_sample_images(&self) -> DetectionResult<SampleImages> {
        if !self.samples {
            return Ok(SampleImages::default());
        }
        Ok(SampleImages {
            left: Some(Frame::new(16, 8)),
            right: Some(Frame::new(16, 8)),
        })
    }

    fn get_configs(&self) -> DetectionResult<Vec<ProfileRecord>> {
        Ok(self.profiles.clone())
    }

    async fn load_model(&self, profile: &ProfileRecord) -> DetectionResult<()> {
        if !self.model_delay.is_zero() {
            tokio::time::sleep(self.model_delay).await;
        }
        if self.fail_model {
            return Err(DetectionError::MissingModel(profile.name.clone()));
        }
        self.model_loads.lock().push(profile.name.clone());
        Ok(())
    }

    fn save_config(&self, folder: &Path, profiles: &[ProfileRecord]) -> DetectionResult<()> {
        self.saved.lock().push((folder.to_path_buf(), profiles.len()));
        Ok(())
    }

    fn extract_boxes(
        &self,
        _profile: &ProfileRecord,
        _frame: &Frame,
    ) -> DetectionResult<Vec<DetectedBox>> {
        Ok(vec![
            DetectedBox {
                center: (2.0, 2.0),
                size: (1.0, 2.0),
                angle: 0.0,
            },
            DetectedBox {
                center: (6.0, 2.0),
                size: (1.0, 2.0),
                angle: 0.0,
            },
        ])
    }

    fn detect_groups_and_pair(
        &self,
        _profile: &ProfileRecord,
        boxes: &[DetectedBox],
        frame: &Frame,
    ) -> DetectionResult<PairOutcome> {
        Ok(PairOutcome {
            groups: boxes.len() / 2,
            left: Some(frame.clone()),
            right: Some(frame.clone()),
        })
    }

    fn preprocess(
        &self,
        profile: &ProfileRecord,
        _frame: &Frame,
        _is_left: bool,
    ) -> DetectionResult<Frame> {
        let (width, height) = profile.color_cfg.img_size;
        Ok(Frame::new(width, height))
    }
}

/// Factory handing out prepared managers by folder.
#[derive(Default)]
pub struct FakeFactory {
    managers: Mutex<Vec<Arc<FakeDetectionManager>>>,
    pub opened: AtomicUsize,
}

impl FakeFactory {
    pub fn with(manager: FakeDetectionManager) -> Arc<Self> {
        let factory = Self::default();
        factory.add(manager);
        Arc::new(factory)
    }

    pub fn add(&self, manager: FakeDetectionManager) -> Arc<FakeDetectionManager> {
        let manager = Arc::new(manager);
        self.managers.lock().push(Arc::clone(&manager));
        manager
    }

    pub fn manager(&self, folder: &Path) -> Option<Arc<FakeDetectionManager>> {
        self.managers
            .lock()
            .iter()
            .find(|m| m.folder == folder)
            .cloned()
    }
}

impl DetectionManagerFactory for FakeFactory {
    fn open(&self, folder: &Path) -> DetectionResult<Arc<dyn DetectionManager>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        match self.manager(folder) {
            Some(manager) => Ok(manager),
            None => Err(DetectionError::Io {
                path: folder.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such folder"),
            }),
        }
    }
}

/// Login service with scripted answers.
#[derive(Debug, Default)]
pub struct FakeLogin {
    pub refreshed: Mutex<Option<Credential>>,
    pub accepted: Mutex<Option<Credential>>,
    pub refresh_calls: AtomicUsize,
}

#[async_trait]
impl LoginClient for FakeLogin {
    async fn login(
        &self,
        _api_url: &str,
        _username: &str,
        _password: &str,
    ) -> AuthResult<LoginOutcome> {
        Ok(match self.accepted.lock().clone() {
            Some(credential) => LoginOutcome::Accepted(credential),
            None => LoginOutcome::Rejected {
                reason: "invalid credentials".into(),
            },
        })
    }

    async fn refresh(&self, _api_url: &str, _refresh_token: &str) -> AuthResult<Credential> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refreshed
            .lock()
            .clone()
            .ok_or_else(|| NetworkError::Status {
                status: 401,
                message: "refresh token revoked".into(),
            }
            .into())
    }
}

pub fn token_manager(dir: &Path, dev_mode: bool, login: Arc<FakeLogin>) -> TokenLifecycleManager {
    TokenLifecycleManager::new(
        TokenSettings {
            dev_mode,
            api_url: "http://localhost:5000".into(),
            dev_token_path: dir.join("dev_token.json"),
        },
        CredentialStorage::new(dir.join("token.json")),
        ThreadGroupRegistry::new(),
        login,
    )
}

pub fn config_loader(factory: Arc<FakeFactory>) -> ConfigLoader {
    ConfigLoader::new(factory, ConfigStore::new())
}

/// Navigator over the full console screen set with an open fake camera.
pub fn navigator(
    loader: &ConfigLoader,
    tokens: &TokenLifecycleManager,
    camera: FakeCamera,
) -> ScreenNavigator {
    let mut capture = CaptureScheduler::new(Box::new(camera), TICK);
    capture.open_device(0).expect("open fake camera");
    ScreenNavigator::new(
        NavigationGraph::console(),
        console_screens(loader, tokens),
        capture,
        tokens.clone(),
    )
}

pub fn profiles_with_main() -> Vec<ProfileRecord> {
    vec![
        ProfileRecord::new("backup"),
        ProfileRecord::new("line-1").main().with_model_path("models/line-1.bin"),
        ProfileRecord::new("line-2"),
    ]
}
