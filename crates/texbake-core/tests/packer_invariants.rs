use rand::{Rng, SeedableRng};
use texbake_core::config::{MaxRectsBinMethod, MaxRectsPackerMethod};
use texbake_core::model::{Frame, Rect};
use texbake_core::packer::guillotine::{GuillotineChoice, GuillotinePacker, GuillotineSplit};
use texbake_core::packer::maxrects::MaxRectsPacker;
use texbake_core::packer::{PageBounds, Packer};

fn bounds(padding: u32, extrude: u32, allow_rotation: bool) -> PageBounds {
    PageBounds {
        width: 512,
        height: 512,
        padding,
        extrude,
        allow_rotation,
    }
}

fn expanded_slot(f: &Rect, pad: u32, extrude: u32) -> Rect {
    let off = extrude + pad / 2;
    Rect::new(
        f.x.saturating_sub(off),
        f.y.saturating_sub(off),
        f.w + extrude * 2 + pad,
        f.h + extrude * 2 + pad,
    )
}

fn packers(b: PageBounds) -> Vec<(String, Box<dyn Packer>)> {
    let mut out: Vec<(String, Box<dyn Packer>)> = MaxRectsBinMethod::ALL
        .into_iter()
        .map(|m| {
            (
                format!("{m:?}"),
                Box::new(MaxRectsPacker::new(b, m)) as Box<dyn Packer>,
            )
        })
        .collect();
    for choice in [GuillotineChoice::BestAreaFit, GuillotineChoice::BestShortSideFit] {
        for split in [GuillotineSplit::ShorterLeftoverAxis, GuillotineSplit::MinimizeArea] {
            out.push((
                format!("{choice:?}/{split:?}"),
                Box::new(GuillotinePacker::new(b, choice, split)) as Box<dyn Packer>,
            ));
        }
    }
    out
}

fn random_rects(seed: u64, count: usize) -> Vec<Rect> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| Rect::new(0, 0, rng.gen_range(4..=64), rng.gen_range(4..=64)))
        .collect()
}

fn fill(packer: &mut dyn Packer, rects: &[Rect]) -> Vec<Frame> {
    let mut frames = Vec::new();
    for (i, r) in rects.iter().enumerate() {
        if let Some(f) = packer.pack(format!("r{i}"), r) {
            frames.push(f);
        }
    }
    frames
}

#[test]
fn packers_are_repeatable() {
    let rects = random_rects(42, 120);
    let b = bounds(0, 0, true);
    for ((label, mut p1), (_, mut p2)) in packers(b).into_iter().zip(packers(b)) {
        let f1 = fill(p1.as_mut(), &rects);
        let f2 = fill(p2.as_mut(), &rects);
        assert_eq!(f1.len(), f2.len(), "{label}");
        for (a, b) in f1.iter().zip(&f2) {
            assert_eq!(a.frame, b.frame, "{label}");
            assert_eq!(a.rotated, b.rotated, "{label}");
        }
    }
}

#[test]
fn padded_and_extruded_slots_never_overlap() {
    let rects = random_rects(3, 80);
    let (pad, extrude) = (4, 2);
    let b = bounds(pad, extrude, false);
    let page = Rect::new(0, 0, b.width, b.height);
    for (label, mut p) in packers(b) {
        let frames = fill(p.as_mut(), &rects);
        assert!(!frames.is_empty(), "{label}");
        let slots: Vec<Rect> = frames
            .iter()
            .map(|f| expanded_slot(&f.frame, pad, extrude))
            .collect();
        for (i, a) in slots.iter().enumerate() {
            assert!(page.contains(a), "{label}: slot {a:?} leaves the page");
            for s in &slots[i + 1..] {
                assert!(!a.overlaps(s), "{label}: {a:?} overlaps {s:?}");
            }
        }
    }
}

#[test]
fn rotation_lets_tall_sprites_fit_wide_pages() {
    let b = PageBounds {
        width: 100,
        height: 20,
        padding: 0,
        extrude: 0,
        allow_rotation: true,
    };
    let tall = Rect::new(0, 0, 10, 90);
    for (label, mut p) in packers(b) {
        assert!(p.can_pack(&tall), "{label}");
        let f = p.pack("tall".into(), &tall).expect("rotated placement");
        assert!(f.rotated, "{label}");
        assert_eq!((f.frame.w, f.frame.h), (90, 10), "{label}");
    }
    let no_rot = PageBounds {
        allow_rotation: false,
        ..b
    };
    for (label, p) in packers(no_rot) {
        assert!(!p.can_pack(&tall), "{label}");
    }
}

#[test]
fn guillotine_methods_cover_every_variant() {
    // Every `MaxRectsPackerMethod` maps onto a guillotine choice; area variants pick BAF.
    for m in MaxRectsPackerMethod::ALL {
        let choice = if m.area() {
            GuillotineChoice::BestAreaFit
        } else {
            GuillotineChoice::BestShortSideFit
        };
        let mut p = GuillotinePacker::new(bounds(0, 0, true), choice, GuillotineSplit::MinimizeArea);
        assert!(p.pack("x".into(), &Rect::new(0, 0, 32, 32)).is_some(), "{m:?}");
    }
}
