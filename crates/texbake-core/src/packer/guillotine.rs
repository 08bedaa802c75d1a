use super::{PageBounds, Packer, frame_for_slot};
use crate::model::{Frame, Rect};

/// Free-rect selection rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuillotineChoice {
    BestAreaFit,
    BestShortSideFit,
}

/// Split axis rule applied to the free rect a sprite was placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuillotineSplit {
    ShorterLeftoverAxis,
    MinimizeArea,
}

pub struct GuillotinePacker {
    bounds: PageBounds,
    free: Vec<Rect>,
    choice: GuillotineChoice,
    split: GuillotineSplit,
}

impl GuillotinePacker {
    pub fn new(bounds: PageBounds, choice: GuillotineChoice, split: GuillotineSplit) -> Self {
        Self {
            bounds,
            free: vec![Rect::new(0, 0, bounds.width, bounds.height)],
            choice,
            split,
        }
    }

    fn score(&self, fr: &Rect, w: u32, h: u32) -> i64 {
        match self.choice {
            GuillotineChoice::BestAreaFit => (fr.w as i64 * fr.h as i64) - (w as i64 * h as i64),
            GuillotineChoice::BestShortSideFit => {
                let dw = (fr.w - w) as i64;
                let dh = (fr.h - h) as i64;
                dw.min(dh)
            }
        }
    }

    fn choose(&self, w: u32, h: u32) -> Option<(usize, Rect, bool)> {
        let mut best: Option<(i64, usize, Rect, bool)> = None;
        for (i, fr) in self.free.iter().enumerate() {
            if fr.w >= w && fr.h >= h {
                let s = self.score(fr, w, h);
                if best.as_ref().is_none_or(|b| s < b.0) {
                    best = Some((s, i, Rect::new(fr.x, fr.y, w, h), false));
                }
            }
            if self.bounds.allow_rotation && w != h && fr.w >= h && fr.h >= w {
                let s = self.score(fr, h, w);
                if best.as_ref().is_none_or(|b| s < b.0) {
                    best = Some((s, i, Rect::new(fr.x, fr.y, h, w), true));
                }
            }
        }
        best.map(|(_, idx, rect, rotated)| (idx, rect, rotated))
    }

    /// Splits `fr` into the bottom and right leftovers of `placed`.
    fn split(&self, fr: &Rect, placed: &Rect) -> [Option<Rect>; 2] {
        let w_right = fr.w - placed.w;
        let h_bottom = fr.h - placed.h;

        let split_horizontal = match self.split {
            GuillotineSplit::ShorterLeftoverAxis => h_bottom < w_right,
            GuillotineSplit::MinimizeArea => {
                (w_right as u64 * fr.h as u64) <= (fr.w as u64 * h_bottom as u64)
            }
        };

        let (bottom, right) = if split_horizontal {
            (
                Rect::new(fr.x, placed.y + placed.h, fr.w, h_bottom),
                Rect::new(placed.x + placed.w, fr.y, w_right, placed.h),
            )
        } else {
            (
                Rect::new(fr.x, placed.y + placed.h, placed.w, h_bottom),
                Rect::new(placed.x + placed.w, fr.y, w_right, fr.h),
            )
        };
        [bottom, right].map(|r| (r.w > 0 && r.h > 0).then_some(r))
    }

    fn place(&mut self, idx: usize, placed: &Rect) {
        let fr = self.free.swap_remove(idx);
        for r in self.split(&fr, placed).into_iter().flatten() {
            self.free.push(r);
        }
        self.merge_free_list();
    }

    /// Joins free rects that share a full edge.
    fn merge_free_list(&mut self) {
        'restart: loop {
            for i in 0..self.free.len() {
                for j in i + 1..self.free.len() {
                    let (a, b) = (self.free[i], self.free[j]);
                    let merged = if a.y == b.y && a.h == b.h && a.x + a.w == b.x {
                        Some(Rect::new(a.x, a.y, a.w + b.w, a.h))
                    } else if a.y == b.y && a.h == b.h && b.x + b.w == a.x {
                        Some(Rect::new(b.x, a.y, a.w + b.w, a.h))
                    } else if a.x == b.x && a.w == b.w && a.y + a.h == b.y {
                        Some(Rect::new(a.x, a.y, a.w, a.h + b.h))
                    } else if a.x == b.x && a.w == b.w && b.y + b.h == a.y {
                        Some(Rect::new(a.x, b.y, a.w, a.h + b.h))
                    } else {
                        None
                    };
                    if let Some(m) = merged {
                        self.free[i] = m;
                        self.free.remove(j);
                        continue 'restart;
                    }
                }
            }
            break;
        }
    }
}

impl Packer for GuillotinePacker {
    fn can_pack(&self, rect: &Rect) -> bool {
        let (w, h) = self.bounds.slot(rect.w, rect.h);
        self.choose(w, h).is_some()
    }

    fn pack(&mut self, key: String, rect: &Rect) -> Option<Frame> {
        let (w, h) = self.bounds.slot(rect.w, rect.h);
        let (idx, slot, rotated) = self.choose(w, h)?;
        self.place(idx, &slot);
        Some(frame_for_slot(&self.bounds, key, &slot, rect, rotated))
    }
}
