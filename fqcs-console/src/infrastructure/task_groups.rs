//! Group-keyed table of cancellable delayed tasks.
//!
//! Each group holds at most one live task. Registering into an occupied
//! group cancels the previous task under the same lock that installs the
//! new one, so observers never see two live tasks for one label.
//!
//! A task that reaches its deadline must claim its slot before running.
//! Cancellation removes the slot, so a task cancelled at the same moment it
//! fires finds nothing to claim and exits without side effects.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use log::debug;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
struct GroupEntry {
    id: u64,
    token: CancellationToken,
    /// Deadline reached and slot claimed; the task body is running.
    fired: bool,
    join: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    groups: Mutex<HashMap<String, GroupEntry>>,
    next_id: AtomicU64,
}

impl RegistryInner {
    fn claim(&self, group: &str, id: u64) -> bool {
        let mut groups = self.groups.lock();
        match groups.get_mut(group) {
            Some(entry) if entry.id == id && !entry.token.is_cancelled() => {
                entry.fired = true;
                true
            }
            _ => false,
        }
    }

    fn finish(&self, group: &str, id: u64) {
        let mut groups = self.groups.lock();
        if groups.get(group).is_some_and(|entry| entry.id == id) {
            groups.remove(group);
        }
    }

    fn cancel_matching(&self, group: &str, id: Option<u64>) -> bool {
        let mut groups = self.groups.lock();
        let matches = groups
            .get(group)
            .is_some_and(|entry| id.is_none_or(|id| entry.id == id));
        if !matches {
            return false;
        }
        let Some(entry) = groups.remove(group) else {
            return false;
        };
        entry.token.cancel();
        if !entry.fired {
            entry.join.abort();
        }
        debug!("[TaskGroups] cancelled task {} in group {group}", entry.id);
        true
    }
}

/// Registry of named background tasks, shared by cloning.
#[derive(Debug, Clone, Default)]
pub struct ThreadGroupRegistry {
    inner: Arc<RegistryInner>,
}

impl ThreadGroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay` unless cancelled first, replacing any task
    /// already registered under `group`.
    ///
    /// The task receives its cancellation token so long-running bodies can
    /// check it before committing results. Must be called from within a
    /// Tokio runtime.
    pub fn register<F, Fut>(
        &self,
        group: &str,
        delay: Duration,
        task: F,
    ) -> TaskHandle
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();

        let mut groups = self.inner.groups.lock();
        if let Some(previous) = groups.remove(group) {
            previous.token.cancel();
            if !previous.fired {
                previous.join.abort();
            }
            debug!(
                "[TaskGroups] task {} in group {group} superseded by {id}",
                previous.id
            );
        }

        let weak = Arc::downgrade(&self.inner);
        let task_token = token.clone();
        let task_group = group.to_string();
        let join = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = task_token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if !inner.claim(&task_group, id) {
                return;
            }
            task(task_token).await;
            inner.finish(&task_group, id);
        });

        groups.insert(
            group.to_string(),
            GroupEntry {
                id,
                token: token.clone(),
                fired: false,
                join,
            },
        );
        debug!("[TaskGroups] registered task {id} in group {group} firing in {delay:?}");

        TaskHandle {
            group: group.to_string(),
            id,
            token,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Cancel whatever is registered under `group`. Returns whether a task
    /// was cancelled; calling it on an empty group is a no-op.
    pub fn cancel(&self, group: &str) -> bool {
        self.inner.cancel_matching(group, None)
    }

    /// Cancel every group, used at shutdown.
    pub fn cancel_all(&self) {
        let drained: Vec<_> = self.inner.groups.lock().drain().collect();
        for (group, entry) in drained {
            entry.token.cancel();
            entry.join.abort();
            debug!("[TaskGroups] shutdown cancelled task {} in group {group}", entry.id);
        }
    }

    /// Number of live tasks in `group`: zero or one.
    pub fn live_count(&self, group: &str) -> usize {
        usize::from(self.inner.groups.lock().contains_key(group))
    }

    /// Whether `group` has a task still waiting for its deadline.
    pub fn is_pending(&self, group: &str) -> bool {
        self.inner
            .groups
            .lock()
            .get(group)
            .is_some_and(|entry| !entry.fired)
    }
}

/// Handle to one registered task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    group: String,
    id: u64,
    token: CancellationToken,
    registry: Weak<RegistryInner>,
}

impl TaskHandle {
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Cancel this task only; a newer task in the same group is untouched.
    pub fn cancel(&self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.cancel_matching(&self.group, Some(self.id));
        }
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
