//! Viewport rectangles, cursor positions, and the pick window that maps the
//! cursor pixel onto the 1×1 pick target.
//!
//! All coordinates are framebuffer pixels with the origin in the top-left
//! corner (the wgpu and winit convention).

use glam::{Mat4, Vec4};

use crate::error::ManipDrawError;

/// Active viewport rectangle in framebuffer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Viewport {
    /// Create a viewport from its origin and extent.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a viewport from a raw `[x, y, width, height]` query result.
    ///
    /// # Errors
    ///
    /// Returns [`ManipDrawError::MalformedViewport`] if the host returned
    /// anything other than exactly four elements.
    pub fn from_slice(raw: &[i32]) -> Result<Self, ManipDrawError> {
        match *raw {
            [x, y, width, height] => Ok(Self::new(x, y, width, height)),
            _ => Err(ManipDrawError::MalformedViewport { len: raw.len() }),
        }
    }

    /// Whether the cursor pixel lies inside the half-open rectangle
    /// `[x, x + width) × [y, y + height)`. Empty viewports contain nothing.
    #[must_use]
    pub fn contains(&self, cursor: CursorPos) -> bool {
        cursor.x >= self.x
            && cursor.y >= self.y
            && i64::from(cursor.x) < i64::from(self.x) + i64::from(self.width)
            && i64::from(cursor.y)
                < i64::from(self.y) + i64::from(self.height)
    }

    /// Whether the viewport lies entirely inside a `width`×`height` target.
    #[must_use]
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.width > 0
            && self.height > 0
            && i64::from(self.x) + i64::from(self.width) <= i64::from(width)
            && i64::from(self.y) + i64::from(self.height) <= i64::from(height)
    }
}

/// Cursor position in framebuffer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPos {
    /// Horizontal pixel.
    pub x: i32,
    /// Vertical pixel, growing downwards.
    pub y: i32,
}

impl CursorPos {
    /// Create a cursor position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The pixel containing a sub-pixel position such as the ones winit
    /// reports in `CursorMoved`.
    #[must_use]
    pub fn from_physical(x: f64, y: f64) -> Self {
        Self {
            x: x.floor() as i32,
            y: y.floor() as i32,
        }
    }
}

/// The single-pixel window of a pick pass.
///
/// Rendering the host's full viewport shifted by `viewport origin − cursor`
/// onto a 1×1 target lets the rasterizer clip away everything except the
/// texel under the cursor. wgpu refuses viewports that extend past the
/// render target, so the shifted viewport is folded into a clip-space
/// transform instead; the rasterized result is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickWindow {
    /// Host viewport the scene is drawn with.
    pub viewport: Viewport,
    /// Cursor pixel to sample.
    pub cursor: CursorPos,
}

impl PickWindow {
    /// Create the pick window for `cursor` inside `viewport`.
    #[must_use]
    pub const fn new(viewport: Viewport, cursor: CursorPos) -> Self {
        Self { viewport, cursor }
    }

    /// The host viewport translated so the cursor pixel lands on texel
    /// `(0, 0)`, keeping the full width and height.
    #[must_use]
    pub fn offset_viewport(&self) -> Viewport {
        Viewport::new(
            self.viewport.x - self.cursor.x,
            self.viewport.y - self.cursor.y,
            self.viewport.width,
            self.viewport.height,
        )
    }

    /// Clip-space transform equivalent to drawing with
    /// [`offset_viewport`](Self::offset_viewport) on a 1×1 target.
    ///
    /// Pre-multiply onto the frame's projection-view-model matrix. The
    /// cursor pixel centre maps to NDC `(0, 0)` and neighbouring pixels fall
    /// outside the clip volume. Depth is untouched.
    #[must_use]
    pub fn clip_transform(&self) -> Mat4 {
        let offset = self.offset_viewport();
        let w = offset.width as f32;
        let h = offset.height as f32;
        let tx = w + 2.0 * offset.x as f32 - 1.0;
        let ty = 1.0 - h - 2.0 * offset.y as f32;
        Mat4::from_cols(
            Vec4::new(w, 0.0, 0.0, 0.0),
            Vec4::new(0.0, h, 0.0, 0.0),
            Vec4::Z,
            Vec4::new(tx, ty, 0.0, 1.0),
        )
    }
}
