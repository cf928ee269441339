// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface configuration.

use serde::Deserialize;

use crate::codec::Codec;
use crate::error::ConfigError;
use crate::time::Duration;

/// Frame-rate ceiling applied when none is configured.
pub const DEFAULT_TARGET_FPS: f64 = 70.0;

/// Configuration for a [`TickDriver`](crate::driver::TickDriver).
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SurfaceConfig {
    /// Ceiling on paced redraws per second.
    pub target_fps: f64,
    /// Wire codec shared with the engine.
    pub codec: Codec,
    /// Maximum mailbox items forwarded to the engine per draw.
    pub max_interrupts_per_pump: usize,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self::desktop()
    }
}

impl SurfaceConfig {
    /// Desktop defaults: 70 Hz ceiling, FlexBuffers.
    #[must_use]
    pub const fn desktop() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            codec: Codec::FlexBuffers,
            max_interrupts_per_pump: 16,
        }
    }

    /// Low-power defaults: 30 Hz ceiling, fewer interrupts per draw.
    #[must_use]
    pub const fn low_power() -> Self {
        Self {
            target_fps: 30.0,
            codec: Codec::FlexBuffers,
            max_interrupts_per_pump: 4,
        }
    }

    /// Debugging defaults: desktop pacing with the JSON codec.
    #[must_use]
    pub const fn debug_json() -> Self {
        Self {
            codec: Codec::Json,
            ..Self::desktop()
        }
    }

    /// Parses a JSON document. Absent fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_interrupts_per_pump == 0 {
            return Err(ConfigError::InterruptPumpLimit);
        }
        self.frame_interval().map(|_| ())
    }

    /// Minimum interval between paced draws.
    pub fn frame_interval(&self) -> Result<Duration, ConfigError> {
        Duration::from_frequency(self.target_fps).ok_or(ConfigError::TargetFps(self.target_fps))
    }
}
