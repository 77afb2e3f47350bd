use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Hover highlight settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Highlight", inline)]
#[serde(default)]
pub struct HighlightOptions {
    /// Draw the blink overlay over the hovered manipulator.
    #[schemars(title = "Enabled")]
    pub enabled: bool,
    /// Overlay RGBA; alpha is scaled by the blink wave.
    #[schemars(title = "Color")]
    pub color: [f32; 4],
    /// Full blink cycle in milliseconds.
    #[schemars(
        title = "Blink Period (ms)",
        range(min = 0, max = 10000),
        extend("step" = 50)
    )]
    pub blink_period_ms: u64,
    /// Gap between highlighted frames, in milliseconds, after which the
    /// blink starts over.
    #[schemars(title = "Idle Restart (ms)", range(min = 0, max = 5000))]
    pub idle_restart_ms: u64,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            color: [1.0, 0.85, 0.2, 0.8],
            blink_period_ms: 1000,
            idle_restart_ms: 200,
        }
    }
}

impl HighlightOptions {
    /// Blink period as a duration.
    #[must_use]
    pub const fn blink_period(&self) -> Duration {
        Duration::from_millis(self.blink_period_ms)
    }

    /// Idle restart threshold as a duration.
    #[must_use]
    pub const fn idle_restart(&self) -> Duration {
        Duration::from_millis(self.idle_restart_ms)
    }
}
