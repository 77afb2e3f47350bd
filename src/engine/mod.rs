//! The picking subsystem context and its per-frame driver.

pub mod frame;
mod picker;

pub use frame::{drive_frame, FrameOutcome, HostFrame, PickPasses};
pub use picker::{HostTarget, ManipulatorPicker};
