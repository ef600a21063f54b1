//! Cooldown gate armed by HTTP 429 responses.
//!
//! One gate belongs to one [`Client`](crate::Client). While it is blocked every
//! request fails fast with [`JwPlatformError::RateLimitBlocked`]; a timer
//! reopens it once the server-provided reset time has passed.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::bus::{BusEvent, EventBus, Pattern};
use crate::errors::{JwPlatformError, Result};

/// Cooldown used when the server does not give a usable reset time.
pub const DEFAULT_RESET_SECONDS: u64 = 61;

/// Seconds to wait for the server's rate-limit window to reset.
///
/// Falls back to [`DEFAULT_RESET_SECONDS`] when `reset_at` is missing or not in
/// the future.
pub fn reset_seconds(reset_at: Option<i64>, now_unix: i64) -> u64 {
    match reset_at.map(|reset| reset.saturating_sub(now_unix)) {
        Some(secs) if secs > 0 => secs as u64,
        _ => DEFAULT_RESET_SECONDS,
    }
}

#[derive(Debug, Default)]
struct GateState {
    blocked_until: Option<Instant>,
    /// Bumped on every block so a stale timer cannot reopen a newer block.
    generation: u64,
}

pub struct RateLimitGate {
    state: Mutex<GateState>,
    bus: Option<Arc<dyn EventBus>>,
}

impl RateLimitGate {
    pub fn new(bus: Option<Arc<dyn EventBus>>) -> Self {
        Self {
            state: Mutex::new(GateState::default()),
            bus,
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        // The state is two plain fields, so a poisoned lock is still consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self.lock().blocked_until, Some(until) if Instant::now() < until)
    }

    /// When the current block lifts, if any.
    pub fn blocked_until(&self) -> Option<Instant> {
        self.lock().blocked_until
    }

    /// Fail with `RateLimitBlocked` (and warn the bus) if the gate is closed.
    pub fn check(&self, path: &str) -> Result<()> {
        if !self.is_blocked() {
            return Ok(());
        }

        warn!("Rejected request for {} while rate limit block is in effect", path);
        self.notify(
            Pattern::warn(),
            "attempted a request while JWPlayer rate limit blocking in effect",
        );
        Err(JwPlatformError::RateLimitBlocked {
            path: path.to_string(),
        })
    }

    /// Close the gate after a 429 and schedule it to reopen.
    ///
    /// Returns the cooldown applied (`reset_seconds + 1`). Must be called from
    /// within a tokio runtime.
    pub fn block(self: &Arc<Self>, reset_at: Option<i64>, now_unix: i64) -> Duration {
        let cooldown = Duration::from_secs(reset_seconds(reset_at, now_unix) + 1);

        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.blocked_until = Some(Instant::now() + cooldown);
            state.generation
        };
        info!("Rate limit timeout set for {:?}", cooldown);

        let gate = Arc::clone(self);
        tokio::spawn(async move {
            sleep(cooldown).await;
            gate.unblock(generation);
        });

        cooldown
    }

    fn unblock(&self, generation: u64) {
        {
            let mut state = self.lock();
            if state.generation != generation {
                return;
            }
            state.blocked_until = None;
        }
        info!("Rate limit block has been lifted");
        self.notify(Pattern::info(), "JWPlayer rate limit block has been lifted");
    }

    fn notify(&self, pattern: Pattern, message: &str) {
        if let Some(bus) = &self.bus {
            bus.broadcast(pattern, BusEvent::message(message));
        }
    }
}

impl std::fmt::Debug for RateLimitGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitGate")
            .field("state", &*self.lock())
            .field("has_bus", &self.bus.is_some())
            .finish()
    }
}
