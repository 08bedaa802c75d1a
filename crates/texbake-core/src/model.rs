use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A discovered source image: path relative to the input root (POSIX
/// separators) and its raw, undecoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub path: String,
    pub contents: Arc<[u8]>,
}

impl AssetRecord {
    pub fn new(path: impl Into<String>, contents: impl Into<Arc<[u8]>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// One file produced by a packing engine, to be written as `{output_dir}/{name}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub buffer: Vec<u8>,
}

impl OutputFile {
    pub fn new(name: impl Into<String>, buffer: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            buffer: buffer.into(),
        }
    }
}

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the two rectangles share any pixel.
    pub fn overlaps(&self, r: &Rect) -> bool {
        !(self.x >= r.x + r.w || r.x >= self.x + self.w || self.y >= r.y + r.h || r.y >= self.y + self.h)
    }
}

/// A placed sprite within a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Sprite name written to metadata.
    pub key: String,
    /// Placed rectangle within the page (post-rotation width/height).
    pub frame: Rect,
    /// True if the frame was rotated 90° when placed.
    pub rotated: bool,
    /// True if transparent borders were removed and the original size is kept.
    pub trimmed: bool,
    /// Sub-rect of the original image that the frame shows.
    pub source: Rect,
    /// Reported original image size (the trimmed size in crop mode).
    pub source_size: (u32, u32),
}

/// A single atlas page (logical record).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: usize,
    pub width: u32,
    pub height: u32,
    pub frames: Vec<Frame>,
}

/// Atlas-level metadata shared by all exporters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub app: String,
    pub version: String,
    pub format: String,
    pub scale: f32,
    pub trim_mode: String,
}

/// Atlas of pages and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atlas {
    pub pages: Vec<Page>,
    pub meta: Meta,
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    pub num_pages: usize,
    pub num_frames: usize,
    /// Sum of width * height over all pages.
    pub total_page_area: u64,
    /// Sum of frame width * height.
    pub used_frame_area: u64,
    /// `used_frame_area / total_page_area` (0.0 to 1.0).
    pub occupancy: f64,
}

impl Atlas {
    pub fn stats(&self) -> PackStats {
        let mut num_frames = 0;
        let mut total_page_area = 0u64;
        let mut used_frame_area = 0u64;
        for page in &self.pages {
            total_page_area += (page.width as u64) * (page.height as u64);
            for frame in &page.frames {
                num_frames += 1;
                used_frame_area += (frame.frame.w as u64) * (frame.frame.h as u64);
            }
        }
        let occupancy = if total_page_area > 0 {
            used_frame_area as f64 / total_page_area as f64
        } else {
            0.0
        };
        PackStats {
            num_pages: self.pages.len(),
            num_frames,
            total_page_area,
            used_frame_area,
            occupancy,
        }
    }
}

impl PackStats {
    pub fn summary(&self) -> String {
        format!(
            "Pages: {}, Frames: {}, Occupancy: {:.2}%, Total Area: {} px², Used Area: {} px²",
            self.num_pages,
            self.num_frames,
            self.occupancy * 100.0,
            self.total_page_area,
            self.used_frame_area,
        )
    }
}
