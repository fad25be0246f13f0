use std::path::PathBuf;

use crate::domains::auth::TokenLifecycleManager;
use crate::domains::config::{ConfigStore, ConfigSubscription};
use crate::domains::ui::screen::Screen;
use crate::domains::ui::types::ScreenState;

/// Landing screen. No camera.
#[derive(Debug)]
pub struct HomeScreen {
    store: ConfigStore,
    subscription: ConfigSubscription,
    tokens: TokenLifecycleManager,
    loaded_path: Option<PathBuf>,
}

impl HomeScreen {
    pub fn new(store: &ConfigStore, tokens: TokenLifecycleManager) -> Self {
        Self {
            store: store.clone(),
            subscription: store.subscribe(),
            tokens,
            loaded_path: store.current_path(),
        }
    }

    pub fn loaded_path(&self) -> Option<&PathBuf> {
        self.loaded_path.as_ref()
    }
}

impl Screen for HomeScreen {
    fn state(&self) -> ScreenState {
        ScreenState::Home
    }

    fn sync_config(&mut self) {
        if self.subscription.take_pending() {
            self.loaded_path = self.store.current_path();
        }
    }

    fn status(&self) -> String {
        let session = match self.tokens.current_credential() {
            Some(_) if self.tokens.is_device_account() => "device session".to_string(),
            Some(c) => format!("signed in ({}…)", c.access_token_preview()),
            None => "signed out".to_string(),
        };
        let config = self
            .loaded_path
            .as_ref()
            .map_or_else(|| "no configuration".to_string(), |p| p.display().to_string());
        format!("Home: {session}, {config}")
    }
}
