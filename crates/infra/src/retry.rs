//! Backoff policy for re-running a movement after an optimistic-concurrency conflict.

use std::time::Duration;

/// How the pause between conflict retries grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackoffStrategy {
    Fixed,
    /// base * 2^(retry - 1), capped at `max_delay`.
    #[default]
    Exponential,
    Linear,
}

/// Bounded retry budget for conflicting commits.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = surface the first conflict).
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub strategy: BackoffStrategy,
    /// Fraction (0.0-1.0) of the delay spread around its nominal value, so
    /// writers that collided once do not wake in lockstep.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(500),
            strategy: BackoffStrategy::Exponential,
            jitter: 0.25,
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    pub fn exponential(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            ..Default::default()
        }
    }

    /// Retry immediately, `max_retries` times. Mostly useful in tests.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            strategy: BackoffStrategy::Fixed,
            jitter: 0.0,
        }
    }

    /// Pause before retry number `retry` (1-indexed).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let base_ms = self.base_delay.as_millis() as f64;
        let max_ms = self.max_delay.as_millis() as f64;

        let nominal = match self.strategy {
            BackoffStrategy::Fixed => base_ms,
            BackoffStrategy::Exponential => base_ms * 2_f64.powi(retry.saturating_sub(1).min(30) as i32),
            BackoffStrategy::Linear => base_ms * f64::from(retry),
        }
        .min(max_ms);

        let spread = nominal * self.jitter.clamp(0.0, 1.0);
        let offset = if spread > 0.0 {
            // Deterministic spread in [-1, 1) derived from the retry number.
            let unit = f64::from(retry.wrapping_mul(2_654_435_761) % 1000) / 1000.0;
            spread * (unit * 2.0 - 1.0)
        } else {
            0.0
        };

        Duration::from_millis((nominal + offset).clamp(0.0, max_ms.max(0.0)) as u64)
    }

    /// Whether another retry is allowed after `retries_done` retries.
    pub fn should_retry(&self, retries_done: u32) -> bool {
        retries_done < self.max_retries
    }
}
