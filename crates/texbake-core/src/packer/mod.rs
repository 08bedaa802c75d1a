use crate::model::{Frame, Rect};

pub mod guillotine;
pub mod maxrects;

/// Page geometry shared by every packer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    pub width: u32,
    pub height: u32,
    /// Pixels reserved between neighbouring frames.
    pub padding: u32,
    /// Pixels reserved on each side of a frame for edge extrusion.
    pub extrude: u32,
    pub allow_rotation: bool,
}

impl PageBounds {
    /// Size of the slot a `w`x`h` sprite occupies once padding and extrusion are added.
    pub fn slot(&self, w: u32, h: u32) -> (u32, u32) {
        let extra = self.padding + self.extrude * 2;
        (w + extra, h + extra)
    }

    /// Offset of the sprite content inside its slot.
    pub fn content_offset(&self) -> u32 {
        self.extrude + self.padding / 2
    }

    /// True if a `w`x`h` sprite fits an empty page in either orientation.
    pub fn fits_empty(&self, w: u32, h: u32) -> bool {
        let (sw, sh) = self.slot(w, h);
        (sw <= self.width && sh <= self.height)
            || (self.allow_rotation && sh <= self.width && sw <= self.height)
    }
}

/// A packer places rectangles into a page.
///
/// Implementations must ensure no overlaps and respect the configured padding.
/// `pack` returns `None` if the rectangle cannot be placed on the current page.
pub trait Packer {
    fn can_pack(&self, rect: &Rect) -> bool;
    fn pack(&mut self, key: String, rect: &Rect) -> Option<Frame>;
}

/// Converts a reserved slot into the reported frame.
pub(crate) fn frame_for_slot(
    bounds: &PageBounds,
    key: String,
    slot: &Rect,
    rect: &Rect,
    rotated: bool,
) -> Frame {
    let (fw, fh) = if rotated {
        (rect.h, rect.w)
    } else {
        (rect.w, rect.h)
    };
    let off = bounds.content_offset();
    Frame {
        key,
        frame: Rect::new(slot.x.saturating_add(off), slot.y.saturating_add(off), fw, fh),
        rotated,
        trimmed: false,
        source: *rect,
        source_size: (rect.w, rect.h),
    }
}
