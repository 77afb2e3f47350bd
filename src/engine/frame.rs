//! Per-frame driver of the pick and highlight passes.
//!
//! The driver only sequences the passes; [`PickPasses`] does the GPU work.
//! Keeping the two apart lets the sequencing rules be exercised without a
//! device.

use glam::Mat4;
use web_time::Instant;

use crate::error::ManipDrawError;
use crate::picking::{CursorPos, DepthConvention, PickId, PickWindow, Viewport};

/// Per-frame inputs supplied by the host renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostFrame {
    /// Cursor pixel, top-left origin.
    pub cursor: CursorPos,
    /// Viewport the host draws the scene into, same pixel space as `cursor`.
    pub viewport: Viewport,
    /// Projection matrix of the frame.
    pub projection: Mat4,
    /// View (world → camera) matrix of the frame.
    pub view: Mat4,
    /// Depth convention of the host's depth buffer.
    pub depth: DepthConvention,
}

impl HostFrame {
    /// Combined projection × view matrix.
    #[must_use]
    pub fn pvm(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// What a frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The cursor was outside the viewport; nothing ran.
    CursorOutside,
    /// The pick pass ran.
    Picked {
        /// Manipulator under the cursor as of the latest completed
        /// readback.
        pick: Option<PickId>,
        /// Whether the highlight pass drew.
        highlighted: bool,
    },
}

impl FrameOutcome {
    /// The hovered manipulator, if any.
    #[must_use]
    pub const fn pick(self) -> Option<PickId> {
        match self {
            Self::CursorOutside => None,
            Self::Picked { pick, .. } => pick,
        }
    }
}

/// The passes a frame is made of.
pub trait PickPasses {
    /// Per-frame housekeeping before any pass (shader hot reload).
    fn prepare(&mut self);

    /// Run the pick pass through `window` and return the resolved pick.
    ///
    /// # Errors
    ///
    /// Fatal invocation errors only; readback latency is not an error.
    fn resolve(
        &mut self,
        window: &PickWindow,
        pvm: Mat4,
        depth: DepthConvention,
    ) -> Result<Option<PickId>, ManipDrawError>;

    /// Draw the highlight of `pick`. Returns whether anything was drawn.
    ///
    /// # Errors
    ///
    /// Fatal invocation errors only.
    fn highlight(
        &mut self,
        pick: PickId,
        pvm: Mat4,
        viewport: Viewport,
        now: Instant,
    ) -> Result<bool, ManipDrawError>;
}

/// Run one frame.
///
/// Does nothing while the cursor is outside the viewport. Otherwise runs
/// the pick pass and, when a manipulator is resolved, the highlight pass.
///
/// # Errors
///
/// Propagates the errors of the passes.
pub fn drive_frame<P: PickPasses + ?Sized>(
    passes: &mut P,
    frame: &HostFrame,
    now: Instant,
) -> Result<FrameOutcome, ManipDrawError> {
    if !frame.viewport.contains(frame.cursor) {
        return Ok(FrameOutcome::CursorOutside);
    }

    passes.prepare();
    let pvm = frame.pvm();
    let window = PickWindow::new(frame.viewport, frame.cursor);
    let pick = passes.resolve(&window, pvm, frame.depth)?;
    let highlighted = match pick {
        Some(id) => passes.highlight(id, pvm, frame.viewport, now)?,
        None => false,
    };
    Ok(FrameOutcome::Picked { pick, highlighted })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::highlight::BlinkState;
    use crate::picking::transfer_tests::FakeSlot;
    use crate::picking::TransferChannel;

    /// CPU stand-in for the GPU passes: the pick target is the texel the
    /// test places under the cursor, read back through a fake slot.
    struct RecordingPasses {
        channel: TransferChannel<FakeSlot>,
        blink: BlinkState,
        prepares: u32,
        resolves: Vec<PickWindow>,
        highlights: Vec<(PickId, f32)>,
    }

    impl RecordingPasses {
        fn with_latency(latency: u32) -> Self {
            Self {
                channel: TransferChannel::new(
                    FakeSlot::with_latency(latency),
                    0,
                ),
                blink: BlinkState::default(),
                prepares: 0,
                resolves: Vec::new(),
                highlights: Vec::new(),
            }
        }

        fn set_texel(&mut self, raw: u16) {
            self.channel_slot().texel = raw;
        }

        fn channel_slot(&mut self) -> &mut FakeSlot {
            self.channel.slot_mut()
        }
    }

    impl PickPasses for RecordingPasses {
        fn prepare(&mut self) {
            self.prepares += 1;
        }

        fn resolve(
            &mut self,
            window: &PickWindow,
            _pvm: Mat4,
            _depth: DepthConvention,
        ) -> Result<Option<PickId>, ManipDrawError> {
            self.resolves.push(*window);
            let _ = self.channel.try_complete();
            if !self.channel.is_pending() {
                self.channel.issue()?;
            }
            Ok(self.channel.resolved())
        }

        fn highlight(
            &mut self,
            pick: PickId,
            _pvm: Mat4,
            _viewport: Viewport,
            now: Instant,
        ) -> Result<bool, ManipDrawError> {
            let alpha = self.blink.advance(pick, now);
            self.highlights.push((pick, alpha));
            Ok(true)
        }
    }

    fn frame(cursor: CursorPos) -> HostFrame {
        HostFrame {
            cursor,
            viewport: Viewport::new(0, 0, 640, 480),
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            depth: DepthConvention::Standard,
        }
    }

    fn id(raw: u16) -> PickId {
        PickId::new(raw).unwrap()
    }

    #[test]
    fn cursor_outside_does_no_work() {
        let mut passes = RecordingPasses::with_latency(0);
        let t0 = Instant::now();
        for cursor in [
            CursorPos::new(-1, 10),
            CursorPos::new(640, 10),
            CursorPos::new(10, 480),
        ] {
            let outcome = drive_frame(&mut passes, &frame(cursor), t0).unwrap();
            assert_eq!(outcome, FrameOutcome::CursorOutside);
        }
        assert_eq!(passes.prepares, 0);
        assert!(passes.resolves.is_empty());
        assert!(passes.highlights.is_empty());
        assert_eq!(passes.channel.slot().begin_calls, 0);
    }

    #[test]
    fn nothing_under_cursor_never_highlights() {
        let mut passes = RecordingPasses::with_latency(0);
        passes.set_texel(PickId::NONE_RAW);
        let t0 = Instant::now();
        let f = frame(CursorPos::new(100, 100));
        for n in 0..5 {
            let outcome =
                drive_frame(&mut passes, &f, t0 + Duration::from_millis(n))
                    .unwrap();
            assert_eq!(
                outcome,
                FrameOutcome::Picked {
                    pick: None,
                    highlighted: false
                }
            );
        }
        assert_eq!(passes.resolves.len(), 5);
        assert!(passes.highlights.is_empty());
    }

    #[test]
    fn pick_arrives_one_frame_late() {
        let mut passes = RecordingPasses::with_latency(0);
        passes.set_texel(42);
        let f = frame(CursorPos::new(320, 240));
        let t0 = Instant::now();

        // Frame N renders 42 and queues the readback.
        let n = drive_frame(&mut passes, &f, t0).unwrap();
        assert_eq!(n.pick(), None);
        assert!(passes.highlights.is_empty());

        // Frame N+1 collects it.
        let n1 =
            drive_frame(&mut passes, &f, t0 + Duration::from_millis(16))
                .unwrap();
        assert_eq!(
            n1,
            FrameOutcome::Picked {
                pick: Some(id(42)),
                highlighted: true
            }
        );
        assert_eq!(passes.highlights, vec![(id(42), 0.0)]);
    }

    #[test]
    fn slow_readback_keeps_the_previous_pick() {
        let mut passes = RecordingPasses::with_latency(0);
        passes.set_texel(5);
        let f = frame(CursorPos::new(1, 1));
        let t0 = Instant::now();
        let _ = drive_frame(&mut passes, &f, t0).unwrap();
        let _ = drive_frame(&mut passes, &f, t0).unwrap();
        assert_eq!(passes.channel.resolved(), Some(id(5)));

        passes.set_texel(9);
        passes.channel_slot().latency = 3;
        for _ in 0..3 {
            let outcome = drive_frame(&mut passes, &f, t0).unwrap();
            assert_eq!(outcome.pick(), Some(id(5)));
        }
        let _ = drive_frame(&mut passes, &f, t0).unwrap();
        let outcome = drive_frame(&mut passes, &f, t0).unwrap();
        assert_eq!(outcome.pick(), Some(id(9)));
    }

    #[test]
    fn pick_window_tracks_the_cursor() {
        let mut passes = RecordingPasses::with_latency(0);
        let f = frame(CursorPos::new(12, 34));
        let _ = drive_frame(&mut passes, &f, Instant::now()).unwrap();
        assert_eq!(
            passes.resolves[0].offset_viewport(),
            Viewport::new(-12, -34, 640, 480)
        );
    }

    #[test]
    fn switching_manipulators_restarts_the_blink() {
        let mut passes = RecordingPasses::with_latency(0);
        let f = frame(CursorPos::new(50, 50));
        let t0 = Instant::now();
        let at = |ms: u64| t0 + Duration::from_millis(ms);

        passes.set_texel(42);
        let _ = drive_frame(&mut passes, &f, at(0)).unwrap();
        let _ = drive_frame(&mut passes, &f, at(10)).unwrap();
        let _ = drive_frame(&mut passes, &f, at(150)).unwrap();
        passes.set_texel(7);
        // Still 42: the readback lags the texel by a frame.
        let _ = drive_frame(&mut passes, &f, at(160)).unwrap();
        let _ = drive_frame(&mut passes, &f, at(170)).unwrap();

        let (ids, alphas): (Vec<PickId>, Vec<f32>) =
            passes.highlights.iter().copied().unzip();
        assert_eq!(ids, vec![id(42), id(42), id(42), id(7)]);
        assert_eq!(alphas[0], 0.0);
        assert!(alphas[2] > 0.0);
        assert_eq!(alphas[3], 0.0);
    }
}
