//! Daemon lifecycle states.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// Where a daemon run currently is.
///
/// ```text
/// Init → Configuring → Starting → Running → ShuttingDown → Terminated
///                         └──────────────────────┘ (construction failed)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Init,
    Configuring,
    Starting,
    Running,
    ShuttingDown,
    Terminated,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Init => "init",
            LifecycleState::Configuring => "configuring",
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::ShuttingDown => "shutting_down",
            LifecycleState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Forward-only state holder shared with observers.
#[derive(Debug)]
pub struct StateTracker {
    history: Mutex<Vec<LifecycleState>>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self {
            history: Mutex::new(vec![LifecycleState::Init]),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LifecycleState>> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current(&self) -> LifecycleState {
        self.lock().last().copied().unwrap_or(LifecycleState::Init)
    }

    /// Every state entered so far, in order.
    pub fn history(&self) -> Vec<LifecycleState> {
        self.lock().clone()
    }

    /// Move to `next`. Backward moves are ignored.
    pub fn advance(&self, next: LifecycleState) {
        let mut history = self.lock();
        if history.last().is_some_and(|current| next <= *current) {
            return;
        }
        history.push(next);
        tracing::debug!(state = %next, "Lifecycle state changed");
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}
