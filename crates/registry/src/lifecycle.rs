//! Registry lifecycle state.

use std::sync::atomic::{AtomicU8, Ordering};

const RUNNING: u8 = 0;
const SHUT_DOWN: u8 = 1;

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Serving requests.
    Running,
    /// The store has been released; operations short-circuit.
    ShutDown,
}

/// One-way `Running -> ShutDown` transition shared by all callers.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self { state: AtomicU8::new(RUNNING) }
    }

    pub(crate) fn state(&self) -> LifecycleState {
        match self.state.load(Ordering::Acquire) {
            RUNNING => LifecycleState::Running,
            _ => LifecycleState::ShutDown,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// Moves to `ShutDown`. Returns `true` only for the caller that made the
    /// transition.
    pub(crate) fn begin_shutdown(&self) -> bool {
        self.state.swap(SHUT_DOWN, Ordering::AcqRel) == RUNNING
    }
}
