//! Process-wide holder of the active detection configuration.
//!
//! The configuration is immutable once published; changes build a new
//! [`ActiveConfiguration`] and swap it in whole. Readers holding an `Arc`
//! from before a swap keep a consistent snapshot.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fqcs_contracts::detection::DetectionManager;
use fqcs_model::{ProfileRecord, SampleImages};
use log::debug;
use tokio::sync::{broadcast, watch};

const CONFIG_EVENT_CAPACITY: usize = 16;

/// Detection manager plus the profiles it enumerated.
#[derive(Clone)]
pub struct ActiveConfiguration {
    pub manager: Arc<dyn DetectionManager>,
    pub current_path: Option<PathBuf>,
    pub profiles: Vec<ProfileRecord>,
    /// Index into `profiles` of the profile whose model was loaded.
    pub main_profile: Option<usize>,
    pub samples: SampleImages,
}

impl std::fmt::Debug for ActiveConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveConfiguration")
            .field("manager_folder", &self.manager.config_folder())
            .field("current_path", &self.current_path)
            .field(
                "profiles",
                &self.profiles.iter().map(|p| &p.name).collect::<Vec<_>>(),
            )
            .field("main_profile", &self.main_profile)
            .field("samples_complete", &self.samples.is_complete())
            .finish()
    }
}

impl ActiveConfiguration {
    pub fn main(&self) -> Option<&ProfileRecord> {
        self.main_profile.and_then(|index| self.profiles.get(index))
    }

    /// Copy with the main profile replaced.
    pub fn with_main(&self, profile: ProfileRecord) -> Option<Self> {
        let index = self.main_profile?;
        let mut next = self.clone();
        *next.profiles.get_mut(index)? = profile;
        Some(next)
    }

    pub fn with_path(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            current_path: Some(path.into()),
            ..self.clone()
        }
    }
}

/// What changed in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEvent {
    /// A folder was loaded.
    Loaded { path: PathBuf },
    /// The same configuration was republished with edits or a new path.
    Updated,
}

#[derive(Clone)]
pub struct ConfigStore {
    current: Arc<watch::Sender<Option<Arc<ActiveConfiguration>>>>,
    events: broadcast::Sender<ConfigEvent>,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("current", &*self.current.borrow())
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        let (events, _) = broadcast::channel(CONFIG_EVENT_CAPACITY);
        Self {
            current: Arc::new(current),
            events,
        }
    }

    pub fn current(&self) -> Option<Arc<ActiveConfiguration>> {
        self.current.borrow().clone()
    }

    pub fn current_path(&self) -> Option<PathBuf> {
        self.current
            .borrow()
            .as_ref()
            .and_then(|config| config.current_path.clone())
    }

    /// Swap in `config` and notify subscribers.
    pub fn publish(
        &self,
        config: ActiveConfiguration,
        event: ConfigEvent,
    ) -> Arc<ActiveConfiguration> {
        let config = Arc::new(config);
        self.current.send_replace(Some(Arc::clone(&config)));
        // No subscribers is fine.
        let _ = self.events.send(event);
        debug!(
            "[ConfigLoader] Published configuration for {:?}",
            config.current_path.as_deref().map(Path::display)
        );
        config
    }

    pub fn subscribe(&self) -> ConfigSubscription {
        ConfigSubscription {
            receiver: self.events.subscribe(),
        }
    }
}

/// One subscriber's view of configuration events.
#[derive(Debug)]
pub struct ConfigSubscription {
    receiver: broadcast::Receiver<ConfigEvent>,
}

impl ConfigSubscription {
    /// Drain pending events. Returns whether any arrived since the last
    /// call; lagging counts as having missed an update.
    pub fn take_pending(&mut self) -> bool {
        let mut seen = false;
        loop {
            match self.receiver.try_recv() {
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => {
                    seen = true
                }
                Err(broadcast::error::TryRecvError::Empty)
                | Err(broadcast::error::TryRecvError::Closed) => break,
            }
        }
        seen
    }

    /// Wait for the next event.
    pub async fn changed(&mut self) -> Option<ConfigEvent> {
        match self.receiver.recv().await {
            Ok(event) => Some(event),
            Err(broadcast::error::RecvError::Lagged(_)) => Some(ConfigEvent::Updated),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}
