//! Pulsing overlay of the manipulator under the cursor.

mod blink;
mod renderer;

pub use blink::{
    blink_alpha, BlinkState, DEFAULT_IDLE_RESTART, DEFAULT_PERIOD,
};
pub use renderer::{HighlightDraw, HighlightRenderer};
