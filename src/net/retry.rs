//! Bounded polling.
//!
//! Collaborators that come up asynchronously (an embedding server still
//! loading its model, a renderer waiting on a window) are polled a fixed
//! number of times before the caller gives up.

use std::fmt::Display;
use std::time::Duration;

use serde::Deserialize;

use crate::error::RoomError;

/// How many times to try and how long to wait between tries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub interval_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            interval_ms: 100,
        }
    }
}

impl RetryPolicy {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Call `op` until it succeeds or the attempts run out. The final failure
    /// becomes [`RoomError::Init`].
    pub fn poll<T, E, F>(&self, what: &str, mut op: F) -> Result<T, RoomError>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        self.poll_with_sleep(what, &mut op, std::thread::sleep)
    }

    fn poll_with_sleep<T, E, F, S>(&self, what: &str, op: &mut F, mut sleep: S) -> Result<T, RoomError>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
        S: FnMut(Duration),
    {
        let attempts = self.attempts.max(1);
        let mut last = String::new();
        for attempt in 1..=attempts {
            match op(attempt) {
                Ok(value) => {
                    if attempt > 1 {
                        log::info!("{what}: ready after {attempt} attempts");
                    }
                    return Ok(value);
                }
                Err(e) => {
                    log::debug!("{what}: attempt {attempt}/{attempts} failed: {e}");
                    last = e.to_string();
                    if attempt < attempts {
                        sleep(self.interval());
                    }
                }
            }
        }
        log::warn!("{what}: giving up after {attempts} attempts: {last}");
        Err(RoomError::Init {
            attempts,
            reason: format!("{what}: {last}"),
        })
    }
}
