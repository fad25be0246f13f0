//! Load/save pipeline for detection configuration folders.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fqcs_contracts::detection::DetectionManagerFactory;
use fqcs_model::{ProfileRecord, SampleImages};
use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::domains::config::errors::{ConfigError, ConfigResult};
use crate::domains::config::store::{
    ActiveConfiguration, ConfigEvent, ConfigStore,
};

#[derive(Clone)]
pub struct ConfigLoader {
    factory: Arc<dyn DetectionManagerFactory>,
    store: ConfigStore,
    /// Sequence number of the most recently started load.
    latest_load: Arc<Mutex<u64>>,
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// First profile flagged main, in enumeration order.
pub fn select_main(profiles: &[ProfileRecord]) -> Option<usize> {
    let mut flagged = profiles
        .iter()
        .enumerate()
        .filter(|(_, profile)| profile.is_main);
    let (index, chosen) = flagged.next()?;
    let others = flagged.count();
    if others > 0 {
        warn!(
            "[ConfigLoader] {others} more profile(s) flagged main, using {}",
            chosen.name
        );
    }
    Some(index)
}

impl ConfigLoader {
    pub fn new(factory: Arc<dyn DetectionManagerFactory>, store: ConfigStore) -> Self {
        Self {
            factory,
            store,
            latest_load: Arc::new(Mutex::new(0)),
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Open `folder`, load its main model and publish the result.
    ///
    /// On any error the previously published configuration stays in place.
    /// Only the most recently started load publishes; one overtaken by a
    /// later call returns [`ConfigError::Superseded`].
    pub async fn load(&self, folder: &Path) -> ConfigResult<Arc<ActiveConfiguration>> {
        let ticket = {
            let mut latest = self.latest_load.lock();
            *latest += 1;
            *latest
        };
        info!("[ConfigLoader] Loading configuration from {}", folder.display());
        let manager = self.factory.open(folder)?;

        let samples = manager.load_sample_images().unwrap_or_else(|e| {
            warn!("[ConfigLoader] Sample images unavailable: {e}");
            SampleImages::default()
        });
        if !samples.is_complete() {
            debug!("[ConfigLoader] No complete sample pair, previews disabled");
        }

        let profiles = manager.get_configs()?;
        let main_profile = select_main(&profiles);
        match main_profile.and_then(|index| profiles.get(index)) {
            Some(main) => {
                debug!("[ConfigLoader] Loading model for profile {}", main.name);
                manager.load_model(main).await?;
            }
            None => info!(
                "[ConfigLoader] No main profile among {} profile(s), no model loaded",
                profiles.len()
            ),
        }

        let config = ActiveConfiguration {
            manager,
            current_path: Some(folder.to_path_buf()),
            profiles,
            main_profile,
            samples,
        };
        let published = {
            let latest = self.latest_load.lock();
            if *latest != ticket {
                debug!(
                    "[ConfigLoader] Dropping {}, load {} started after it",
                    folder.display(),
                    *latest
                );
                return Err(ConfigError::Superseded {
                    path: folder.to_path_buf(),
                });
            }
            self.store.publish(
                config,
                ConfigEvent::Loaded {
                    path: folder.to_path_buf(),
                },
            )
        };
        info!(
            "[ConfigLoader] Loaded {} profile(s) from {}",
            published.profiles.len(),
            folder.display()
        );
        Ok(published)
    }

    /// Load the folder picked by a chooser. `None` means the operator
    /// cancelled and is not an error.
    pub async fn load_chosen(
        &self,
        choice: Option<PathBuf>,
    ) -> ConfigResult<Option<Arc<ActiveConfiguration>>> {
        match choice {
            Some(folder) => self.load(&folder).await.map(Some),
            None => {
                debug!("[ConfigLoader] Load cancelled");
                Ok(None)
            }
        }
    }

    /// Write the active profiles into `folder` and republish with it as the
    /// current path.
    pub fn save(&self, folder: &Path) -> ConfigResult<Arc<ActiveConfiguration>> {
        let current = self.store.current().ok_or(ConfigError::NoConfiguration)?;
        if current.profiles.is_empty() {
            return Err(ConfigError::NoProfiles);
        }

        current.manager.save_config(folder, &current.profiles)?;
        info!(
            "[ConfigLoader] Saved {} profile(s) to {}",
            current.profiles.len(),
            folder.display()
        );
        Ok(self
            .store
            .publish(current.with_path(folder), ConfigEvent::Updated))
    }

    /// Republish with the main profile replaced by `profile`.
    pub fn update_main(
        &self,
        profile: ProfileRecord,
    ) -> ConfigResult<Arc<ActiveConfiguration>> {
        let current = self.store.current().ok_or(ConfigError::NoConfiguration)?;
        let next = current.with_main(profile).ok_or(ConfigError::NoMainProfile)?;
        Ok(self.store.publish(next, ConfigEvent::Updated))
    }
}
