// Per-ship cooldown tracking
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

/// Holds a single "not before" instant per ship. It has no notion of which
/// action caused the cooldown; the newest `arm` always wins.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    expiries: Mutex<HashMap<String, Instant>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.expiries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets expiry = now + `remaining_seconds`, replacing any previous value.
    pub fn arm(&self, ship_symbol: &str, remaining_seconds: u64) {
        let now = Instant::now();
        let cooldown_until = now + Duration::from_secs(remaining_seconds);

        self.entries()
            .insert(ship_symbol.to_string(), cooldown_until);

        info!(
            ship = ship_symbol,
            remaining_seconds, "⏳ cooldown armed"
        );
    }

    pub fn clear(&self, ship_symbol: &str) {
        if self.entries().remove(ship_symbol).is_some() {
            debug!(ship = ship_symbol, "cooldown cleared");
        }
    }

    pub fn expiry(&self, ship_symbol: &str) -> Option<Instant> {
        self.entries().get(ship_symbol).copied()
    }

    /// Zero when the ship is ready or has never been armed.
    pub fn remaining(&self, ship_symbol: &str) -> Duration {
        match self.expiry(ship_symbol) {
            Some(until) => until.saturating_duration_since(Instant::now()),
            None => Duration::ZERO,
        }
    }

    pub fn is_ready(&self, ship_symbol: &str) -> bool {
        self.remaining(ship_symbol).is_zero()
    }

    /// Suspends the calling task until the ship is ready. The expiry is
    /// re-read after every sleep so a re-arm during the wait is honoured.
    /// Dropping the future abandons the wait without side effects.
    pub async fn wait_ready(&self, ship_symbol: &str) {
        while let Some(until) = self.expiry(ship_symbol) {
            if until <= Instant::now() {
                break;
            }
            debug!(ship = ship_symbol, "waiting for cooldown");
            sleep_until(until).await;
        }
    }

    /// Ships still cooling down, shortest remaining first.
    pub fn active(&self) -> Vec<(String, Duration)> {
        let now = Instant::now();
        let mut active: Vec<(String, Duration)> = self
            .entries()
            .iter()
            .filter(|(_, until)| **until > now)
            .map(|(ship, until)| (ship.clone(), until.saturating_duration_since(now)))
            .collect();

        active.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        active
    }

    /// Drops entries whose expiry has passed; returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries();
        let initial_count = entries.len();
        entries.retain(|_, until| *until > now);
        initial_count - entries.len()
    }

    /// Copy of the raw expiries, for comparisons.
    pub fn snapshot(&self) -> HashMap<String, Instant> {
        self.entries().clone()
    }
}
