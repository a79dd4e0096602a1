// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential backoff schedule for the recovery engine's retry loop.

use std::time::Duration;

/// Backoff parameters for retrying a build after applying a fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter_factor: 0.2,
        }
    }
}

impl RetryConfig {
    /// Short delays, few attempts -- for interactive use where a human is
    /// watching and will intervene if automated fixes don't pan out.
    pub fn aggressive() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }

    /// Long delays, many attempts -- for unattended CI-style runs where
    /// giving transient conditions (network, disk) time to clear matters
    /// more than wall-clock speed.
    pub fn patient() -> Self {
        Self {
            max_attempts: 10,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(300),
            backoff_multiplier: 1.8,
            jitter_factor: 0.25,
        }
    }

    /// Delay before the given attempt (1-indexed), capped at `max_delay`
    /// and perturbed by a deterministic jitter derived from the attempt
    /// number so retries from concurrent jobs don't all wake up at once,
    /// without depending on a random source.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let capped = base.min(self.max_delay.as_secs_f64());

        // Golden-ratio offset keeps successive attempts' jitter spread out
        // rather than clustering near the same phase every time.
        const GOLDEN_RATIO_CONJUGATE: f64 = 0.618_034;
        let phase = (f64::from(attempt) * GOLDEN_RATIO_CONJUGATE).fract();
        let jitter = capped * self.jitter_factor * (phase * 2.0 - 1.0);

        Duration::from_secs_f64((capped + jitter).max(0.0))
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
