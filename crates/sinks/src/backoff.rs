//! Reconnect backoff with jitter
//!
//! After each failed dial the wait grows as `min(wait * 2 + delta, max)`.
//! With jitter enabled the actual sleep is drawn uniformly from
//! `[wait - amp, wait + amp]` with `amp = max(wait / 2, min_amplitude)`,
//! clamped at zero, so a fleet of relays does not reconnect in lockstep.
//! A successful dial resets the wait to zero.

use std::time::Duration;

use rand::Rng;
use relay_config::SenderConfig;

/// Backoff parameters, taken from `[sender]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Added on every failure
    pub delta: Duration,
    /// Upper bound for the base wait
    pub max: Duration,
    pub jitter: bool,
    /// Lower bound for the jitter amplitude
    pub min_amplitude: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self::from(&SenderConfig::default())
    }
}

impl From<&SenderConfig> for BackoffConfig {
    fn from(config: &SenderConfig) -> Self {
        Self {
            delta: config.reconnect_period_delta,
            max: config.max_reconnect_period,
            jitter: config.connection_jitter,
            min_amplitude: config.min_jitter_amplitude,
        }
    }
}

/// Reconnect state of one connection
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    wait: Duration,
    attempts: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            wait: Duration::ZERO,
            attempts: 0,
        }
    }

    /// Base wait before the next dial, without jitter
    #[inline]
    pub fn current(&self) -> Duration {
        self.wait
    }

    /// Failed dials since the last success
    #[inline]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Sleep before the next dial
    ///
    /// A zero wait stays zero: the first dial after a healthy connection
    /// drops is immediate.
    pub fn delay(&self) -> Duration {
        self.delay_with(&mut rand::rng())
    }

    /// `delay()` with a caller-supplied random source
    pub fn delay_with<R: Rng>(&self, rng: &mut R) -> Duration {
        if self.wait.is_zero() || !self.config.jitter {
            return self.wait;
        }

        let amplitude = (self.wait / 2).max(self.config.min_amplitude);
        let amp = amplitude.as_micros().min(i64::MAX as u128) as i64;
        let offset = rng.random_range(-amp..=amp);
        let base = self.wait.as_micros().min(i64::MAX as u128) as i64;

        Duration::from_micros(base.saturating_add(offset).max(0) as u64)
    }

    /// Record a failed dial and grow the wait
    pub fn failure(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
        self.wait = self
            .wait
            .saturating_mul(2)
            .saturating_add(self.config.delta)
            .min(self.config.max);
    }

    /// Record a successful dial
    pub fn success(&mut self) {
        self.attempts = 0;
        self.wait = Duration::ZERO;
    }
}
