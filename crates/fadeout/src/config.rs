//! Fade timing configuration.
//!
//! Three constants drive the whole effect: how long to wait before fading,
//! how often to tick, and how much opacity each tick removes.

use crate::result::{FadeError, FadeResult};
use serde::{Deserialize, Serialize};

/// Default wait before the first tick is scheduled
pub const DEFAULT_INITIAL_DELAY_MS: u32 = 3000;
/// Default time between ticks
pub const DEFAULT_TICK_INTERVAL_MS: u32 = 100;
/// Default opacity removed per tick
pub const DEFAULT_OPACITY_STEP: f64 = 0.1;

/// Tolerance used when comparing opacity against the terminal value
pub const OPACITY_EPSILON: f64 = 1e-9;

/// Smallest accepted step; keeps the tick count bounded
pub const MIN_OPACITY_STEP: f64 = 1e-6;

/// Timing configuration for a fade-out
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeConfig {
    /// Milliseconds to wait before fading starts
    pub initial_delay_ms: u32,
    /// Milliseconds between opacity ticks
    pub tick_interval_ms: u32,
    /// Opacity removed on each tick
    pub opacity_step: f64,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            opacity_step: DEFAULT_OPACITY_STEP,
        }
    }
}

impl FadeConfig {
    /// Create a config with the default timing
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial delay
    #[must_use]
    pub const fn with_initial_delay_ms(mut self, ms: u32) -> Self {
        self.initial_delay_ms = ms;
        self
    }

    /// Set the tick interval
    #[must_use]
    pub const fn with_tick_interval_ms(mut self, ms: u32) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    /// Set the per-tick opacity step
    #[must_use]
    pub fn with_opacity_step(mut self, step: f64) -> Self {
        self.opacity_step = step;
        self
    }

    /// Parse a config from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or the values fail validation
    pub fn from_json(json: &str) -> FadeResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the timing values describe a fade that terminates.
    ///
    /// # Errors
    ///
    /// Returns [`FadeError::InvalidConfig`] describing the first bad field
    pub fn validate(&self) -> FadeResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(FadeError::invalid_config("tick_interval_ms must be > 0"));
        }
        // Browser timers take a signed 32-bit delay
        if i32::try_from(self.initial_delay_ms).is_err() {
            return Err(FadeError::invalid_config(format!(
                "initial_delay_ms must not exceed {}",
                i32::MAX
            )));
        }
        if i32::try_from(self.tick_interval_ms).is_err() {
            return Err(FadeError::invalid_config(format!(
                "tick_interval_ms must not exceed {}",
                i32::MAX
            )));
        }
        let step = self.opacity_step;
        if !step.is_finite() || !(MIN_OPACITY_STEP..=1.0).contains(&step) {
            return Err(FadeError::invalid_config(format!(
                "opacity_step must be within [{MIN_OPACITY_STEP}, 1], got {step}"
            )));
        }
        Ok(())
    }

    /// Number of ticks from fully opaque to fully transparent: `ceil(1 / step)`.
    #[must_use]
    pub fn total_ticks(&self) -> u32 {
        let exact = 1.0 / self.opacity_step;
        (exact - OPACITY_EPSILON).ceil().max(1.0) as u32
    }

    /// Opacity after `ticks` ticks, clamped to [0, 1] and snapped to 0 near zero.
    ///
    /// Computed from the tick count, not by repeated subtraction, so the
    /// terminal value is exact.
    #[must_use]
    pub fn opacity_after(&self, ticks: u32) -> f64 {
        if ticks >= self.total_ticks() {
            return 0.0;
        }
        let opacity = 1.0 - f64::from(ticks) * self.opacity_step;
        if opacity <= OPACITY_EPSILON {
            0.0
        } else {
            opacity.min(1.0)
        }
    }

    /// Milliseconds from the first tick being scheduled to the element hiding
    #[must_use]
    pub fn fade_duration_ms(&self) -> u64 {
        u64::from(self.total_ticks()) * u64::from(self.tick_interval_ms)
    }

    /// Milliseconds from start to the element hiding
    #[must_use]
    pub fn total_duration_ms(&self) -> u64 {
        u64::from(self.initial_delay_ms) + self.fade_duration_ms()
    }
}
