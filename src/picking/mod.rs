//! GPU mouse-over picking of manipulator surfaces.
//!
//! Renders manipulator IDs into a 1×1 off-screen target aligned with the
//! cursor pixel and reads the texel back asynchronously, one frame late.

mod depth;
mod pick_id;
mod readback;
mod resolver;
mod target;
mod transfer;
mod viewport;

pub use depth::DepthConvention;
pub use pick_id::PickId;
pub use readback::GpuReadback;
pub use resolver::PickResolver;
pub use target::PickTarget;
pub use transfer::{
    Completion, ReadbackSlot, SlotRead, TransferChannel, TransferState,
};
pub use viewport::{CursorPos, PickWindow, Viewport};

#[cfg(test)]
pub(crate) use transfer::tests as transfer_tests;
