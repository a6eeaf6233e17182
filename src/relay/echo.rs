use std::time::{Duration, Instant};

use crate::models::Snapshot;

/// Recognizes clipboard changes caused by this process's own writes
///
/// When the writer applies a snapshot, the platform reports an ownership change
/// and the monitor would send the same content straight back. The guard
/// remembers the last applied snapshot for a short window and flags captures
/// whose every entry matches it.
#[derive(Debug)]
pub struct EchoGuard {
    window: Duration,
    last_applied: Option<(Snapshot, Instant)>,
}

impl EchoGuard {
    pub fn new(window: Duration) -> Self {
        EchoGuard {
            window,
            last_applied: None,
        }
    }

    /// A guard that never suppresses anything
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        !self.window.is_zero()
    }

    /// Remember a snapshot this process just applied
    pub fn record(&mut self, applied: Snapshot) {
        self.record_at(applied, Instant::now());
    }

    pub fn record_at(&mut self, applied: Snapshot, now: Instant) {
        if self.is_enabled() {
            self.last_applied = Some((applied, now));
        }
    }

    /// Check if `captured` is the echo of the last applied snapshot
    pub fn is_echo(&self, captured: &Snapshot) -> bool {
        self.is_echo_at(captured, Instant::now())
    }

    pub fn is_echo_at(&self, captured: &Snapshot, now: Instant) -> bool {
        match &self.last_applied {
            Some((applied, at)) => {
                now.saturating_duration_since(*at) <= self.window && captured.is_covered_by(applied)
            }
            None => false,
        }
    }
}

impl Default for EchoGuard {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}
