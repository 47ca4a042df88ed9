//! Window matching - find the window a freshly spawned emulator opened

use std::collections::HashSet;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::platform::{WindowHandle, WindowId, WindowSystem};

/// Top-level windows that existed before the emulator was started
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowSnapshot {
    Available(HashSet<WindowId>),
    /// The platform cannot enumerate windows
    Unavailable,
}

impl WindowSnapshot {
    pub fn capture(system: &dyn WindowSystem) -> Result<Self> {
        if !system.can_enumerate() {
            return Ok(Self::Unavailable);
        }
        let ids: HashSet<WindowId> = system.list_windows()?.into_iter().map(|w| w.id).collect();
        debug!("Captured {} windows via {}", ids.len(), system.name());
        Ok(Self::Available(ids))
    }

    pub fn contains(&self, id: WindowId) -> bool {
        match self {
            Self::Available(ids) => ids.contains(&id),
            Self::Unavailable => false,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// State of a running match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchState {
    Searching,
    Found(WindowHandle),
    TimedOut,
}

/// Final result of [`WindowMatcher::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Found(WindowHandle),
    TimedOut,
    /// Windows could not be enumerated; the grace period was waited out
    Unverified,
}

/// Polls the window list for a new window whose title starts with a prefix
pub struct WindowMatcher<'a> {
    system: &'a dyn WindowSystem,
    prefix: String,
    timeout: Duration,
    interval: Duration,
    grace: Duration,
}

impl<'a> WindowMatcher<'a> {
    pub fn new(system: &'a dyn WindowSystem, prefix: impl Into<String>) -> Self {
        Self {
            system,
            prefix: prefix.into(),
            timeout: Duration::from_millis(5000),
            interval: Duration::from_millis(50),
            grace: Duration::from_millis(5000),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether `window` is a candidate: new since the snapshot and titled
    /// like the emulator
    pub fn qualifies(&self, window: &WindowHandle, snapshot: &WindowSnapshot) -> bool {
        !snapshot.contains(window.id) && window.title.starts_with(&self.prefix)
    }

    /// One poll iteration. A failing window list counts as "nothing found".
    pub fn poll_once(&self, snapshot: &WindowSnapshot, started: Instant) -> MatchState {
        match self.system.list_windows() {
            Ok(windows) => {
                if let Some(window) = windows.into_iter().find(|w| self.qualifies(w, snapshot)) {
                    return MatchState::Found(window);
                }
            }
            Err(e) => warn!("Listing windows via {} failed: {:#}", self.system.name(), e),
        }

        if started.elapsed() >= self.timeout {
            MatchState::TimedOut
        } else {
            MatchState::Searching
        }
    }

    /// Poll until a window is found or the timeout has fully elapsed.
    ///
    /// Without window enumeration this only waits the grace period.
    pub fn run(&self, snapshot: &WindowSnapshot) -> MatchOutcome {
        if !snapshot.is_available() || !self.system.can_enumerate() {
            info!(
                "Window matching unsupported on {}, waiting {:?}",
                self.system.name(),
                self.grace
            );
            thread::sleep(self.grace);
            return MatchOutcome::Unverified;
        }

        let started = Instant::now();
        loop {
            match self.poll_once(snapshot, started) {
                MatchState::Found(window) => {
                    info!(
                        "Found window {} '{}' after {:?}",
                        window.id,
                        window.title,
                        started.elapsed()
                    );
                    return MatchOutcome::Found(window);
                }
                MatchState::TimedOut => {
                    warn!("No '{}' window within {:?}", self.prefix, self.timeout);
                    return MatchOutcome::TimedOut;
                }
                MatchState::Searching => thread::sleep(self.interval),
            }
        }
    }
}
