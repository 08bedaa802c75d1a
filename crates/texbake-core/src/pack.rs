//! The default packing engine: decode, trim, place, compose, encode, export.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::{debug, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::compositing::{apply_filter, blit_rgba};
use crate::config::{
    MaxRectsBinMethod, MaxRectsPackerMethod, PackerChoice, PackingConfiguration, TextureFormat,
    TrimMode,
};
use crate::error::{PipelineError, Result};
use crate::export::{PageExport, export_page};
use crate::model::{AssetRecord, Atlas, Frame, Meta, OutputFile, Page, Rect};
use crate::packer::guillotine::{GuillotineChoice, GuillotinePacker, GuillotineSplit};
use crate::packer::maxrects::MaxRectsPacker;
use crate::packer::{PageBounds, Packer};

/// A decoded sprite ready for placement. `pixels` is already scaled and trimmed.
struct Sprite {
    key: String,
    pixels: RgbaImage,
    trimmed: bool,
    source: Rect,
    source_size: (u32, u32),
    /// Keys of pixel-identical sprites that reuse this placement.
    aliases: Vec<String>,
}

impl Sprite {
    fn rect(&self) -> Rect {
        Rect::new(0, 0, self.pixels.width(), self.pixels.height())
    }
}

/// Result of packing before encoding: logical atlas plus composed RGBA pages.
pub struct PackedAtlas {
    pub atlas: Atlas,
    pub pages: Vec<RgbaImage>,
}

/// Packs `assets` with `cfg` and returns the encoded page images and metadata
/// files, in page order (image, then its metadata).
///
/// An empty asset list is not an error: it yields one metadata file describing
/// zero frames and no image.
#[instrument(skip_all, fields(assets = assets.len(), texture = %cfg.texture_name))]
pub fn pack_assets(assets: &[AssetRecord], cfg: &PackingConfiguration) -> Result<Vec<OutputFile>> {
    let packed = pack_atlas(assets, cfg)?;
    encode_outputs(&packed, cfg)
}

/// Packs `assets` into composed pages without encoding them.
pub fn pack_atlas(assets: &[AssetRecord], cfg: &PackingConfiguration) -> Result<PackedAtlas> {
    cfg.validate()?;
    let sprites = prepare_sprites(assets, cfg)?;
    let bounds = PageBounds {
        width: cfg.width,
        height: cfg.height,
        padding: cfg.padding,
        extrude: cfg.extrude,
        allow_rotation: cfg.allow_rotation,
    };
    for s in &sprites {
        let r = s.rect();
        if !bounds.fits_empty(r.w, r.h) {
            return Err(PipelineError::OutOfSpace {
                key: s.key.clone(),
                width: r.w,
                height: r.h,
                max_width: cfg.width,
                max_height: cfg.height,
            });
        }
    }

    let mut pages = layout(&sprites, bounds, cfg)?;
    let images = compose_pages(&sprites, &pages, cfg);
    add_aliases(&sprites, &mut pages);

    let meta = Meta {
        app: "texbake".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        format: match cfg.texture_format {
            TextureFormat::Png => "RGBA8888",
            TextureFormat::Jpg => "RGB888",
        }
        .into(),
        scale: cfg.scale,
        trim_mode: if !cfg.allow_trim {
            "none"
        } else {
            match cfg.trim_mode {
                TrimMode::Trim => "trim",
                TrimMode::Crop => "crop",
            }
        }
        .into(),
    };
    let atlas = Atlas { pages, meta };
    debug!(stats = %atlas.stats().summary(), "packed");
    Ok(PackedAtlas {
        atlas,
        pages: images,
    })
}

/// Strips folders and/or the extension from an asset path per configuration.
pub fn frame_key(path: &str, cfg: &PackingConfiguration) -> String {
    let mut key = if cfg.prepend_folder_name {
        path
    } else {
        path.rsplit('/').next().unwrap_or(path)
    };
    if cfg.remove_file_extension {
        let file_start = key.rfind('/').map_or(0, |i| i + 1);
        if let Some(dot) = key[file_start..].rfind('.') {
            if dot > 0 {
                key = &key[..file_start + dot];
            }
        }
    }
    key.to_string()
}

/// Bounding box of pixels whose alpha exceeds `threshold`; `None` when every
/// pixel is transparent.
pub fn compute_trim_rect(rgba: &RgbaImage, threshold: u8) -> Option<Rect> {
    let (w, h) = rgba.dimensions();
    let (mut x1, mut y1, mut x2, mut y2) = (u32::MAX, u32::MAX, 0u32, 0u32);
    for (x, y, p) in rgba.enumerate_pixels() {
        if p[3] > threshold {
            x1 = x1.min(x);
            y1 = y1.min(y);
            x2 = x2.max(x);
            y2 = y2.max(y);
        }
    }
    if x1 == u32::MAX || w == 0 || h == 0 {
        return None;
    }
    Some(Rect::new(x1, y1, x2 - x1 + 1, y2 - y1 + 1))
}

fn prepare_sprites(assets: &[AssetRecord], cfg: &PackingConfiguration) -> Result<Vec<Sprite>> {
    let mut sprites: Vec<Sprite> = Vec::with_capacity(assets.len());
    let mut seen_keys: HashMap<String, usize> = HashMap::new();
    let mut identical: HashMap<(u32, u32, Vec<u8>), usize> = HashMap::new();

    for asset in assets {
        let key = frame_key(&asset.path, cfg);
        if seen_keys.contains_key(&key) {
            warn!(%key, path = %asset.path, "duplicate sprite name, skipping");
            continue;
        }

        let mut rgba = image::load_from_memory(&asset.contents)
            .map_err(|source| PipelineError::Image {
                key: asset.path.clone(),
                source,
            })?
            .to_rgba8();

        if (cfg.scale - 1.0).abs() > f32::EPSILON {
            let w = ((rgba.width() as f32 * cfg.scale).round() as u32).max(1);
            let h = ((rgba.height() as f32 * cfg.scale).round() as u32).max(1);
            rgba = image::imageops::resize(&rgba, w, h, cfg.scale_method.filter_type());
        }

        let (iw, ih) = rgba.dimensions();
        let full = Rect::new(0, 0, iw, ih);
        let trim = if cfg.allow_trim {
            compute_trim_rect(&rgba, cfg.alpha_threshold).filter(|r| *r != full)
        } else {
            None
        };
        let (pixels, trimmed, source, source_size) = match (trim, cfg.trim_mode) {
            (None, _) => (rgba, false, full, (iw, ih)),
            (Some(r), TrimMode::Trim) => {
                let px = image::imageops::crop_imm(&rgba, r.x, r.y, r.w, r.h).to_image();
                (px, true, r, (iw, ih))
            }
            (Some(r), TrimMode::Crop) => {
                let px = image::imageops::crop_imm(&rgba, r.x, r.y, r.w, r.h).to_image();
                (px, false, Rect::new(0, 0, r.w, r.h), (r.w, r.h))
            }
        };

        if cfg.detect_identical {
            let fingerprint = (pixels.width(), pixels.height(), pixels.as_raw().clone());
            match identical.entry(fingerprint) {
                Entry::Occupied(e) => {
                    sprites[*e.get()].aliases.push(key.clone());
                    seen_keys.insert(key, *e.get());
                    continue;
                }
                Entry::Vacant(e) => {
                    e.insert(sprites.len());
                }
            }
        }

        seen_keys.insert(key.clone(), sprites.len());
        sprites.push(Sprite {
            key,
            pixels,
            trimmed,
            source,
            source_size,
            aliases: Vec::new(),
        });
    }

    // Largest first, stable on name, so placement does not depend on input order.
    sprites.sort_by(|a, b| {
        let (ra, rb) = (a.rect(), b.rect());
        (rb.w as u64 * rb.h as u64)
            .cmp(&(ra.w as u64 * ra.h as u64))
            .then_with(|| a.key.cmp(&b.key))
    });
    Ok(sprites)
}

#[derive(Debug, Clone, Copy)]
enum Candidate {
    Bin(MaxRectsBinMethod),
    Guillotine {
        choice: GuillotineChoice,
        split: GuillotineSplit,
        square: bool,
    },
}

impl Candidate {
    fn packer(&self, bounds: PageBounds) -> Box<dyn Packer> {
        match *self {
            Candidate::Bin(m) => Box::new(MaxRectsPacker::new(bounds, m)),
            Candidate::Guillotine { choice, split, .. } => {
                Box::new(GuillotinePacker::new(bounds, choice, split))
            }
        }
    }

    fn square(&self) -> bool {
        matches!(self, Candidate::Guillotine { square: true, .. })
    }
}

fn guillotine_candidates(method: MaxRectsPackerMethod) -> Vec<Candidate> {
    let choice = if method.area() {
        GuillotineChoice::BestAreaFit
    } else {
        GuillotineChoice::BestShortSideFit
    };
    let splits: &[GuillotineSplit] = if method.smart() {
        &[GuillotineSplit::ShorterLeftoverAxis, GuillotineSplit::MinimizeArea]
    } else {
        &[GuillotineSplit::ShorterLeftoverAxis]
    };
    splits
        .iter()
        .map(|&split| Candidate::Guillotine {
            choice,
            split,
            square: method.square(),
        })
        .collect()
}

fn layout(sprites: &[Sprite], bounds: PageBounds, cfg: &PackingConfiguration) -> Result<Vec<Page>> {
    if sprites.is_empty() {
        return Ok(Vec::new());
    }
    let candidates: Vec<Candidate> = match cfg.packer_choice()? {
        PackerChoice::Bin(m) => vec![Candidate::Bin(m)],
        PackerChoice::Guillotine(m) => guillotine_candidates(m),
        PackerChoice::Optimal => MaxRectsBinMethod::ALL
            .into_iter()
            .map(Candidate::Bin)
            .chain(MaxRectsPackerMethod::ALL.into_iter().flat_map(guillotine_candidates))
            .collect(),
    };

    #[cfg(feature = "parallel")]
    let results: Vec<Vec<Page>> = candidates
        .par_iter()
        .map(|c| pack_pages(sprites, bounds, cfg, c))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let results: Vec<Vec<Page>> = candidates
        .iter()
        .map(|c| pack_pages(sprites, bounds, cfg, c))
        .collect();

    // Fewest pages, then smallest total area; first candidate wins ties.
    results
        .into_iter()
        .min_by_key(|pages| {
            let area: u64 = pages
                .iter()
                .map(|p| p.width as u64 * p.height as u64)
                .sum();
            (pages.len(), area)
        })
        .ok_or_else(|| PipelineError::InvalidConfig("no packer candidate".into()))
}

/// Places every sprite, opening a new page whenever the current one is full.
/// Callers guarantee each sprite fits an empty page.
fn pack_pages(
    sprites: &[Sprite],
    bounds: PageBounds,
    cfg: &PackingConfiguration,
    candidate: &Candidate,
) -> Vec<Page> {
    let mut remaining: Vec<usize> = (0..sprites.len()).collect();
    let mut pages: Vec<Page> = Vec::new();

    while !remaining.is_empty() {
        let mut packer = candidate.packer(bounds);
        let mut frames: Vec<Frame> = Vec::new();
        remaining.retain(|&idx| {
            let s = &sprites[idx];
            let rect = s.rect();
            if !packer.can_pack(&rect) {
                return true;
            }
            match packer.pack(s.key.clone(), &rect) {
                Some(mut f) => {
                    f.trimmed = s.trimmed;
                    f.source = s.source;
                    f.source_size = s.source_size;
                    frames.push(f);
                    false
                }
                None => true,
            }
        });
        if frames.is_empty() {
            // Unreachable while every sprite fits an empty page; bail out rather than spin.
            break;
        }
        let (width, height) = page_size(&frames, bounds, cfg, candidate.square());
        pages.push(Page {
            id: pages.len(),
            width,
            height,
            frames,
        });
    }
    pages
}

fn page_size(frames: &[Frame], bounds: PageBounds, cfg: &PackingConfiguration, square: bool) -> (u32, u32) {
    if cfg.fixed_size {
        return (cfg.width, cfg.height);
    }
    let pad_rem = bounds.padding - bounds.padding / 2;
    let extra = bounds.extrude + pad_rem;
    let mut w = 0u32;
    let mut h = 0u32;
    for f in frames {
        w = w.max(f.frame.right() + 1 + extra);
        h = h.max(f.frame.bottom() + 1 + extra);
    }
    if cfg.power_of_two {
        w = w.max(1).next_power_of_two();
        h = h.max(1).next_power_of_two();
    }
    if square {
        let m = w.max(h);
        if m <= cfg.width && m <= cfg.height {
            w = m;
            h = m;
        }
    }
    (w, h)
}

fn compose_pages(sprites: &[Sprite], pages: &[Page], cfg: &PackingConfiguration) -> Vec<RgbaImage> {
    let by_key: HashMap<&str, &Sprite> = sprites.iter().map(|s| (s.key.as_str(), s)).collect();
    pages
        .iter()
        .map(|page| {
            let mut canvas = RgbaImage::new(page.width, page.height);
            for f in &page.frames {
                if let Some(s) = by_key.get(f.key.as_str()) {
                    blit_rgba(
                        &s.pixels,
                        &mut canvas,
                        f.frame.x,
                        f.frame.y,
                        s.rect(),
                        f.rotated,
                        cfg.extrude,
                    );
                }
            }
            apply_filter(&mut canvas, cfg.filter);
            canvas
        })
        .collect()
}

fn add_aliases(sprites: &[Sprite], pages: &mut [Page]) {
    let by_key: HashMap<&str, &Sprite> = sprites.iter().map(|s| (s.key.as_str(), s)).collect();
    for page in pages.iter_mut() {
        let mut extra: Vec<Frame> = Vec::new();
        for f in &page.frames {
            if let Some(s) = by_key.get(f.key.as_str()) {
                for alias in &s.aliases {
                    extra.push(Frame {
                        key: alias.clone(),
                        ..f.clone()
                    });
                }
            }
        }
        page.frames.extend(extra);
    }
}

fn output_base(cfg: &PackingConfiguration, page_count: usize, index: usize) -> String {
    if page_count > 1 {
        format!("{}-{}", cfg.texture_name, index)
    } else {
        cfg.texture_name.clone()
    }
}

fn encode_page(canvas: &RgbaImage, format: TextureFormat) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    let written = match format {
        TextureFormat::Png => DynamicImage::ImageRgba8(canvas.clone()).write_to(&mut buf, ImageFormat::Png),
        TextureFormat::Jpg => {
            let rgb = DynamicImage::ImageRgba8(canvas.clone()).to_rgb8();
            DynamicImage::ImageRgb8(rgb).write_to(&mut buf, ImageFormat::Jpeg)
        }
    };
    written.map_err(|e| PipelineError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}

fn encode_outputs(packed: &PackedAtlas, cfg: &PackingConfiguration) -> Result<Vec<OutputFile>> {
    let image_ext = cfg.texture_format.extension();
    let meta_ext = cfg.exporter.file_ext();
    let page_count = packed.atlas.pages.len();

    if page_count == 0 {
        let image_name = format!("{}.{}", cfg.texture_name, image_ext);
        let empty = Page {
            id: 0,
            width: 0,
            height: 0,
            frames: Vec::new(),
        };
        let text = export_page(
            &cfg.exporter,
            PageExport {
                page: &empty,
                meta: &packed.atlas.meta,
                image_name: &image_name,
            },
        )?;
        return Ok(vec![OutputFile::new(
            format!("{}.{}", cfg.texture_name, meta_ext),
            text,
        )]);
    }

    let mut files = Vec::with_capacity(page_count * 2);
    for (i, (page, canvas)) in packed.atlas.pages.iter().zip(&packed.pages).enumerate() {
        let base = output_base(cfg, page_count, i);
        let image_name = format!("{base}.{image_ext}");
        let text = export_page(
            &cfg.exporter,
            PageExport {
                page,
                meta: &packed.atlas.meta,
                image_name: &image_name,
            },
        )?;
        files.push(OutputFile::new(image_name, encode_page(canvas, cfg.texture_format)?));
        files.push(OutputFile::new(format!("{base}.{meta_ext}"), text));
    }
    Ok(files)
}
