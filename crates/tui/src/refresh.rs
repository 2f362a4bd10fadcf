use std::time::{Duration, Instant};

/// Orders concurrent fetches. Only the response to the most recently issued
/// request is applied; anything older is stale.
#[derive(Debug, Default)]
pub struct RefreshGate {
    issued: u64,
}

impl RefreshGate {
    /// Starts a new request and returns its generation.
    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.issued
    }

    /// Makes every in-flight request stale, e.g. when leaving a view.
    pub fn invalidate(&mut self) {
        self.issued += 1;
    }
}

/// Periodic refresh trigger, driven by the render loop's clock.
#[derive(Debug, Clone)]
pub struct AutoRefresh {
    interval: Duration,
    enabled: bool,
    last: Option<Instant>,
}

impl AutoRefresh {
    pub fn new(interval: Duration, enabled: bool) -> Self {
        Self {
            interval,
            enabled,
            last: None,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn toggle(&mut self, now: Instant) -> bool {
        self.enabled = !self.enabled;
        self.last = Some(now);
        self.enabled
    }

    /// Restarts the countdown; called whenever a fetch is issued.
    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }

    /// True when a refresh is due. Never fires while disabled.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.enabled {
            return false;
        }
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
