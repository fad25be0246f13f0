//! Wiring of the production console from loaded settings.

use std::sync::Arc;

use fqcs_config::AppConfig;
use log::{info, warn};

use crate::app::{Console, ConsoleError};
use crate::domains::auth::{CredentialStorage, TokenLifecycleManager, TokenSettings};
use crate::domains::capture::CaptureScheduler;
use crate::domains::config::{ConfigLoader, ConfigStore};
use crate::domains::ui::views::console_screens;
use crate::domains::ui::{NavigationGraph, ScreenNavigator};
use crate::infrastructure::adapters::{FolderCamera, FolderManagerFactory};
use crate::infrastructure::services::HttpLoginClient;
use crate::infrastructure::task_groups::ThreadGroupRegistry;

/// Build the console for `config`: restore the session, open the
/// configured camera and queue the configured profile folder.
///
/// A corrupt token file or an unavailable camera is logged and the console
/// starts without them.
pub async fn build_console(config: &AppConfig) -> Result<Console, ConsoleError> {
    let login = Arc::new(HttpLoginClient::new(config.auth.request_timeout)?);
    let tokens = TokenLifecycleManager::new(
        TokenSettings {
            dev_mode: config.dev,
            api_url: config.auth.api_url.clone(),
            dev_token_path: config.auth.dev_token_path.clone(),
        },
        CredentialStorage::new(&config.auth.token_path),
        ThreadGroupRegistry::new(),
        login,
    );
    if config.dev {
        info!("Development mode: token scheduling disabled");
    }

    match tokens.initialize().await {
        Ok(true) => {
            tokens.check_token();
        }
        Ok(false) => {}
        Err(e) => warn!("[TokenLifecycle] Ignoring unreadable token file: {e}"),
    }

    let loader = ConfigLoader::new(Arc::new(FolderManagerFactory), ConfigStore::new());

    let mut capture = CaptureScheduler::new(
        Box::new(FolderCamera::new(&config.capture.camera_root)),
        config.capture.period,
    );
    if let Some(index) = config.capture.camera_index
        && let Err(e) = capture.open_device(index)
    {
        warn!("[Capture] Starting without a camera: {e}");
    }

    let navigator = ScreenNavigator::new(
        NavigationGraph::console(),
        console_screens(&loader, &tokens),
        capture,
        tokens.clone(),
    );

    let mut console = Console::new(navigator, tokens, loader);
    if let Some(folder) = &config.detection.config_folder {
        console.start_load(folder.clone());
    }
    Ok(console)
}
