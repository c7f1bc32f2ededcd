//! Bookkeeping for the independent background asset loads.

use std::fmt;

use instant::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Environment,
    Model,
    Lut,
    MarkerSprite,
}

impl AssetKind {
    pub const ALL: [AssetKind; 4] = [
        AssetKind::Environment,
        AssetKind::Model,
        AssetKind::Lut,
        AssetKind::MarkerSprite,
    ];
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AssetKind::Environment => "environment",
            AssetKind::Model => "model",
            AssetKind::Lut => "lut",
            AssetKind::MarkerSprite => "marker sprite",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Ready,
    Failed(String),
    /// Still running past the timeout. The load is not cancelled and may
    /// turn `Ready` or `Failed` later.
    TimedOut,
}

impl LoadState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, LoadState::Pending)
    }
}

#[derive(Clone, Debug)]
struct Entry {
    kind: AssetKind,
    path: String,
    state: LoadState,
    started: Instant,
}

#[derive(Clone, Debug)]
pub struct AssetTracker {
    entries: Vec<Entry>,
    timeout: Duration,
}

impl AssetTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            entries: Vec::new(),
            timeout,
        }
    }

    /// Register a load that starts now. Re-registering resets its state.
    pub fn start(&mut self, kind: AssetKind, path: &str) {
        self.start_at(kind, path, Instant::now());
    }

    pub fn start_at(&mut self, kind: AssetKind, path: &str, now: Instant) {
        log::info!("loading {kind} from {path}");
        let entry = Entry {
            kind,
            path: path.to_string(),
            state: LoadState::Pending,
            started: now,
        };
        match self.entries.iter_mut().find(|e| e.kind == kind) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn finish(&mut self, kind: AssetKind, result: Result<(), String>) {
        let Some(entry) = self.entries.iter_mut().find(|e| e.kind == kind) else {
            log::warn!("{kind} finished loading but was never started");
            return;
        };
        let elapsed = entry.started.elapsed();
        entry.state = match result {
            Ok(()) => {
                log::info!("{kind} ready after {:.2?} ({})", elapsed, entry.path);
                LoadState::Ready
            }
            Err(e) => {
                log::error!("{kind} failed to load from {}: {e}", entry.path);
                LoadState::Failed(e)
            }
        };
    }

    /// Flag loads pending for longer than the timeout; returns the newly
    /// flagged ones.
    pub fn check_timeouts(&mut self, now: Instant) -> Vec<AssetKind> {
        let mut flagged = Vec::new();
        for entry in self.entries.iter_mut() {
            if entry.state == LoadState::Pending
                && now >= entry.started
                && now - entry.started >= self.timeout
            {
                log::warn!(
                    "{} still loading after {:?} ({})",
                    entry.kind,
                    self.timeout,
                    entry.path
                );
                entry.state = LoadState::TimedOut;
                flagged.push(entry.kind);
            }
        }
        flagged
    }

    pub fn state(&self, kind: AssetKind) -> Option<&LoadState> {
        self.entries
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| &e.state)
    }

    pub fn is_ready(&self, kind: AssetKind) -> bool {
        self.state(kind) == Some(&LoadState::Ready)
    }

    /// True once every registered load is ready, failed or timed out.
    pub fn all_settled(&self) -> bool {
        self.entries.iter().all(|e| e.state.is_settled())
    }

    pub fn pending(&self) -> impl Iterator<Item = AssetKind> + '_ {
        self.entries
            .iter()
            .filter(|e| e.state == LoadState::Pending)
            .map(|e| e.kind)
    }
}
