// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! GPU mouse-over picking and blink highlighting for 3D manipulators,
//! built on wgpu.
//!
//! Every frame the cursor texel is rendered into a 1×1 off-screen target
//! that stores a 16-bit manipulator ID instead of a color. The texel is
//! copied into a staging buffer and mapped asynchronously, so the result is
//! collected on a later frame without ever stalling the render thread. The
//! manipulator under the cursor is then redrawn with a pulsing alpha.
//!
//! # Key entry points
//!
//! - [`engine::ManipulatorPicker`] - the subsystem context with
//!   `activate()`/`deactivate()` lifecycle and the per-frame entry point
//! - [`engine::HostFrame`] - per-frame inputs from the host renderer
//! - [`scene::ManipulatorSource`] - the geometry collaborator, with
//!   [`scene::ManipulatorMesh`] as the bundled implementation
//! - [`options::Options`] - runtime configuration (TOML)
//!
//! # Architecture
//!
//! The frame driver ([`engine::frame`]) skips all work while the cursor is
//! outside the viewport. Otherwise it runs the pick resolver
//! ([`picking::PickResolver`]), which drains the previous readback through
//! the two-state [`picking::TransferChannel`] before queuing a new one, and
//! then the highlight renderer ([`highlight::HighlightRenderer`]) when a
//! manipulator was resolved. The resolved ID always lags one frame behind
//! the geometry it was rendered from.

pub mod engine;
pub mod error;
pub mod gpu;
pub mod highlight;
pub mod options;
pub mod picking;
pub mod scene;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use engine::{FrameOutcome, HostFrame, HostTarget, ManipulatorPicker};
pub use error::ManipDrawError;
pub use picking::PickId;
#[cfg(feature = "viewer")]
pub use viewer::Viewer;
