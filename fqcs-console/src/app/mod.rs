//! The interactive loop.
//!
//! One task owns the navigator, the capture pump and the pending
//! configuration loads. Each turn handles exactly one of: an operator
//! command, a finished load, a session event or a capture tick. Model
//! loads are polled by the same loop, so ticks keep flowing while a load
//! is outstanding.

pub mod bootstrap;
pub mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use log::{debug, info, warn};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

use crate::domains::auth::{AuthError, LoginOutcome, SessionEvent, TokenLifecycleManager};
use crate::domains::config::{ActiveConfiguration, ConfigError, ConfigLoader, ConfigResult};
use crate::domains::ui::{ScreenNavigator, Transition, Trigger};
use commands::Command;

pub use bootstrap::build_console;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Authentication setup failed: {0}")]
    Auth(#[from] AuthError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Exit,
}

/// What one loop turn handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Command,
    Loaded,
    Session,
    Tick,
    Exit,
}

type PendingLoad = BoxFuture<'static, (PathBuf, ConfigResult<Arc<ActiveConfiguration>>)>;

pub struct Console {
    navigator: ScreenNavigator,
    tokens: TokenLifecycleManager,
    loader: ConfigLoader,
    session_events: broadcast::Receiver<SessionEvent>,
    pending_loads: FuturesUnordered<PendingLoad>,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("navigator", &self.navigator)
            .field("tokens", &self.tokens)
            .field("pending_loads", &self.pending_loads.len())
            .finish_non_exhaustive()
    }
}

impl Console {
    pub fn new(
        navigator: ScreenNavigator,
        tokens: TokenLifecycleManager,
        loader: ConfigLoader,
    ) -> Self {
        let session_events = tokens.subscribe();
        Self {
            navigator,
            tokens,
            loader,
            session_events,
            pending_loads: FuturesUnordered::new(),
        }
    }

    pub fn navigator(&self) -> &ScreenNavigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut ScreenNavigator {
        &mut self.navigator
    }

    pub fn loader(&self) -> &ConfigLoader {
        &self.loader
    }

    pub fn pending_loads(&self) -> usize {
        self.pending_loads.len()
    }

    pub fn status_line(&self) -> String {
        let screen = self
            .navigator
            .current_screen()
            .map_or_else(|| self.navigator.current().to_string(), |s| s.status());
        let capture = self.navigator.capture();
        let pump = if capture.is_armed() { "armed" } else { "idle" };
        let loading = if self.pending_loads.is_empty() { "" } else { " (loading)" };
        format!("{screen} | capture {pump}{loading}")
    }

    /// Queue a configuration load. It completes on a later loop turn.
    pub fn start_load(&mut self, folder: PathBuf) {
        let loader = self.loader.clone();
        self.pending_loads.push(Box::pin(async move {
            let result = loader.load(&folder).await;
            (folder, result)
        }));
    }

    pub async fn handle(&mut self, command: Command) -> Step {
        match command {
            Command::Trigger(trigger) => {
                if self.navigator.apply(trigger).await == Transition::Exit {
                    return Step::Exit;
                }
            }
            Command::OpenCamera(index) => {
                if let Err(e) = self.navigator.capture_mut().open_device(index) {
                    warn!("[Capture] {e}");
                }
            }
            Command::LoadConfig(Some(folder)) => self.start_load(folder),
            Command::LoadConfig(None) | Command::SaveConfig(None) => {
                debug!("Folder choice cancelled");
            }
            Command::SaveConfig(Some(folder)) => {
                if let Err(e) = self.loader.save(&folder) {
                    warn!("[ConfigLoader] Save to {} failed: {e}", folder.display());
                }
            }
            Command::Login { username, password } => {
                match self.tokens.sign_in(&username, &password).await {
                    Ok(LoginOutcome::Accepted(_)) => info!("Signed in as {username}"),
                    Ok(LoginOutcome::Rejected { reason }) => {
                        warn!("Login rejected: {reason}")
                    }
                    Err(e) => warn!("Login failed: {e}"),
                }
            }
            Command::Input(input) => {
                self.navigator.input(&input);
            }
            Command::Status => {}
        }
        Step::Continue
    }

    fn finish_load(&mut self, folder: PathBuf, result: ConfigResult<Arc<ActiveConfiguration>>) {
        match result {
            Ok(config) => debug!(
                "[ConfigLoader] {} ready with main profile {:?}",
                folder.display(),
                config.main().map(|p| &p.name)
            ),
            Err(e @ ConfigError::Superseded { .. }) => debug!("[ConfigLoader] {e}"),
            Err(e) => warn!(
                "[ConfigLoader] Error loading config from {}: {e}",
                folder.display()
            ),
        }
    }

    async fn on_session_event(&mut self, event: Result<SessionEvent, broadcast::error::RecvError>) {
        match event {
            Ok(SessionEvent::LoggedOut { forced: true }) => {
                info!("Session ended, returning to Home");
                self.navigator.apply(Trigger::Logout).await;
            }
            Ok(event) => debug!("Session event {event:?}"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                // A missed forced logout still leaves the session cleared.
                if !self.tokens.is_logged_in() {
                    self.navigator.apply(Trigger::Logout).await;
                }
                debug!("Skipped {skipped} session event(s)");
            }
            Err(broadcast::error::RecvError::Closed) => {}
        }
    }

    /// Run one loop turn.
    pub async fn turn(&mut self, commands: &mut mpsc::Receiver<Command>) -> Turn {
        let turn = tokio::select! {
            command = commands.recv() => match command {
                Some(command) => match self.handle(command).await {
                    Step::Continue => Turn::Command,
                    Step::Exit => Turn::Exit,
                },
                None => Turn::Exit,
            },
            Some((folder, result)) = self.pending_loads.next(), if !self.pending_loads.is_empty() => {
                self.finish_load(folder, result);
                Turn::Loaded
            }
            event = self.session_events.recv() => {
                self.on_session_event(event).await;
                Turn::Session
            }
            _ = self.navigator.capture_mut().next_tick() => {
                self.navigator.capture_mut().tick();
                Turn::Tick
            }
        };
        self.navigator.sync_screens();
        turn
    }

    /// Drive the loop until exit or until the command source closes,
    /// reporting status after every turn that was not a capture tick.
    pub async fn run<F>(mut self, mut commands: mpsc::Receiver<Command>, mut report: F)
    where
        F: FnMut(&str),
    {
        report(&self.status_line());
        loop {
            match self.turn(&mut commands).await {
                Turn::Exit => break,
                Turn::Tick => {}
                Turn::Command | Turn::Loaded | Turn::Session => report(&self.status_line()),
            }
        }
        self.tokens.registry().cancel_all();
        info!("Console stopped");
    }
}
