use image::{Rgba, RgbaImage};

use crate::config::BitmapFilterType;
use crate::model::Rect;

/// Copies `source` (a sub-rect of `src`) into `canvas` with its top-left at
/// `(dx, dy)`, rotating 90° clockwise when `rotated` is set, then repeats the
/// outermost content pixels `extrude` times around the blitted area.
pub fn blit_rgba(
    src: &RgbaImage,
    canvas: &mut RgbaImage,
    dx: u32,
    dy: u32,
    source: Rect,
    rotated: bool,
    extrude: u32,
) {
    let (cw, ch) = canvas.dimensions();
    let (rw, rh) = if rotated {
        (source.h, source.w)
    } else {
        (source.w, source.h)
    };
    if rw == 0 || rh == 0 {
        return;
    }

    for yy in 0..rh {
        for xx in 0..rw {
            let (ix, iy) = if rotated {
                (source.x + yy, source.y + (source.h - 1 - xx))
            } else {
                (source.x + xx, source.y + yy)
            };
            if dx + xx < cw && dy + yy < ch {
                canvas.put_pixel(dx + xx, dy + yy, *src.get_pixel(ix, iy));
            }
        }
    }

    if extrude == 0 {
        return;
    }
    // Every ring pixel takes the colour of the nearest content pixel, which
    // covers edges and corners in one pass.
    let x0 = dx.saturating_sub(extrude);
    let y0 = dy.saturating_sub(extrude);
    let x1 = (dx + rw + extrude).min(cw);
    let y1 = (dy + rh + extrude).min(ch);
    for y in y0..y1 {
        for x in x0..x1 {
            let inside = x >= dx && x < dx + rw && y >= dy && y < dy + rh;
            if inside {
                continue;
            }
            let nx = x.clamp(dx, dx + rw - 1);
            let ny = y.clamp(dy, dy + rh - 1);
            if nx < cw && ny < ch {
                let p = *canvas.get_pixel(nx, ny);
                canvas.put_pixel(x, y, p);
            }
        }
    }
}

/// Applies a post-process filter to a composed page in place.
pub fn apply_filter(canvas: &mut RgbaImage, filter: BitmapFilterType) {
    match filter {
        BitmapFilterType::None => {}
        BitmapFilterType::Grayscale => {
            for Rgba([r, g, b, _]) in canvas.pixels_mut() {
                // Rec. 601 luma in fixed point.
                let luma = ((*r as u32 * 299 + *g as u32 * 587 + *b as u32 * 114) / 1000) as u8;
                *r = luma;
                *g = luma;
                *b = luma;
            }
        }
        BitmapFilterType::Mask => {
            for Rgba([r, g, b, a]) in canvas.pixels_mut() {
                *r = *a;
                *g = *a;
                *b = *a;
                *a = 255;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotated_blit_turns_clockwise() {
        // 2x1 source: red, green
        let mut src = RgbaImage::new(2, 1);
        src.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        src.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        let mut canvas = RgbaImage::new(1, 2);
        blit_rgba(&src, &mut canvas, 0, 0, Rect::new(0, 0, 2, 1), true, 0);
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(0, 1), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn extrusion_copies_edges_and_corners() {
        let src = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        let mut canvas = RgbaImage::new(6, 6);
        blit_rgba(&src, &mut canvas, 2, 2, Rect::new(0, 0, 2, 2), false, 1);
        for (x, y) in [(1, 1), (4, 1), (1, 4), (4, 4), (2, 1), (1, 3)] {
            assert_eq!(canvas.get_pixel(x, y), &Rgba([10, 20, 30, 255]), "({x},{y})");
        }
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn mask_filter_moves_alpha_into_colour() {
        let mut canvas = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 77]));
        apply_filter(&mut canvas, BitmapFilterType::Mask);
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([77, 77, 77, 255]));
    }

    #[test]
    fn grayscale_keeps_alpha() {
        let mut canvas = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 128]));
        apply_filter(&mut canvas, BitmapFilterType::Grayscale);
        let p = canvas.get_pixel(0, 0);
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
        assert_eq!(p[3], 128);
    }
}
