//! Per-item retry state machine with exponential backoff
//!
//! Every item walks through [`AttemptState`]:
//!
//! ```text
//! Attempting(0) --fail--> Attempting(1) --fail--> ... --fail--> Exhausted { stage }
//!       |                       |
//!       +--------ok--------------+----------------------------> Succeeded
//! ```
//!
//! The state machine holds no I/O; the fetch task drives it and sleeps for
//! [`backoff_delay`] between attempts.

use crate::config::RetryConfig;
use crate::types::AssetKind;
use rand::Rng;
use std::time::Duration;

/// Position of an item in its retry sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptState {
    /// About to run (or running) the attempt with this zero-based index
    Attempting(u32),
    /// All three assets were written in one attempt
    Succeeded {
        /// Attempts made, including the successful one
        attempts: u32,
    },
    /// Every allowed attempt failed
    Exhausted {
        /// Stage that failed on the final attempt
        stage: AssetKind,
        /// Attempts made
        attempts: u32,
    },
}

impl AttemptState {
    /// Initial state: first attempt pending
    pub fn start() -> Self {
        AttemptState::Attempting(0)
    }

    /// Transition after the current attempt wrote all assets
    ///
    /// Terminal states are returned unchanged.
    #[must_use]
    pub fn on_success(self) -> Self {
        match self {
            AttemptState::Attempting(n) => AttemptState::Succeeded { attempts: n + 1 },
            terminal => terminal,
        }
    }

    /// Transition after the current attempt failed at `stage`
    ///
    /// Terminal states are returned unchanged, so an exhausted item can never
    /// be pushed back into `Attempting`.
    #[must_use]
    pub fn on_failure(self, stage: AssetKind, max_attempts: u32) -> Self {
        match self {
            AttemptState::Attempting(n) if n + 1 >= max_attempts => AttemptState::Exhausted {
                stage,
                attempts: n + 1,
            },
            AttemptState::Attempting(n) => AttemptState::Attempting(n + 1),
            terminal => terminal,
        }
    }

    /// Whether no further attempts follow
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptState::Attempting(_))
    }
}

/// Delay to wait before the attempt with zero-based index `attempt`
///
/// The first attempt never waits. Later attempts wait
/// `initial_delay * backoff_multiplier^(attempt - 1)`, capped at `max_delay`,
/// optionally jittered.
pub fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    if attempt == 0 || config.initial_delay.is_zero() {
        return Duration::ZERO;
    }

    let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
    let secs = config.initial_delay.as_secs_f64() * config.backoff_multiplier.powi(exponent);
    // Overflowing or out-of-range products saturate to the cap
    let delay = Duration::try_from_secs_f64(secs)
        .map_or(config.max_delay, |delay| delay.min(config.max_delay));

    if config.jitter {
        add_jitter(delay)
    } else {
        delay
    }
}

/// Add random jitter to a delay to prevent thundering herd
///
/// Jitter is uniformly distributed between 0% and 100% of the delay.
/// This means the actual delay will be between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    let jittered_secs = delay.as_secs_f64() * (1.0 + jitter_factor);
    Duration::try_from_secs_f64(jittered_secs).unwrap_or(Duration::MAX)
}
