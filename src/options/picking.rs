use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Pick pass settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[schemars(title = "Picking", inline)]
#[serde(default)]
pub struct PickingOptions {
    /// Consecutive frames a readback may stay pending before a warning is
    /// logged (0 disables the warning).
    #[schemars(title = "Stall Warning (frames)", range(min = 0, max = 10000))]
    pub stall_warn_frames: u32,
}

impl Default for PickingOptions {
    fn default() -> Self {
        Self {
            stall_warn_frames: 120,
        }
    }
}
