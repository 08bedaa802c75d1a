use super::{PageBounds, Packer, frame_for_slot};
use crate::config::MaxRectsBinMethod;
use crate::model::{Frame, Rect};

/// Free-list MaxRects bin (Jylänki). Every placement splits all intersecting
/// free rectangles into maximal leftovers and prunes contained ones.
pub struct MaxRectsPacker {
    bounds: PageBounds,
    border: Rect,
    free: Vec<Rect>,
    used: Vec<Rect>,
    method: MaxRectsBinMethod,
}

impl MaxRectsPacker {
    pub fn new(bounds: PageBounds, method: MaxRectsBinMethod) -> Self {
        let border = Rect::new(0, 0, bounds.width, bounds.height);
        Self {
            bounds,
            border,
            free: vec![border],
            used: Vec::new(),
            method,
        }
    }

    fn place_rect(&mut self, node: &Rect) {
        let mut next: Vec<Rect> = Vec::with_capacity(self.free.len() + 4);
        for fr in &self.free {
            if !fr.overlaps(node) {
                next.push(*fr);
                continue;
            }
            split_around(fr, node, &mut next);
        }
        self.free = next;
        self.prune_free_list();
        self.used.push(*node);
    }

    fn prune_free_list(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let a = self.free[i];
            let mut remove_i = false;
            let mut j = i + 1;
            while j < self.free.len() {
                let b = self.free[j];
                if b.contains(&a) {
                    remove_i = true;
                    break;
                }
                if a.contains(&b) {
                    self.free.remove(j);
                    continue;
                }
                j += 1;
            }
            if remove_i {
                self.free.remove(i);
            } else {
                i += 1;
            }
        }
    }

    fn score(&self, fr: &Rect, w: u32, h: u32) -> (i64, i64) {
        let leftover_h = (fr.w as i64 - w as i64).abs();
        let leftover_v = (fr.h as i64 - h as i64).abs();
        let short_fit = leftover_h.min(leftover_v);
        let long_fit = leftover_h.max(leftover_v);
        let area_fit = (fr.w as i64 * fr.h as i64) - (w as i64 * h as i64);
        match self.method {
            MaxRectsBinMethod::BestShortSideFit => (short_fit, long_fit),
            MaxRectsBinMethod::BestLongSideFit => (long_fit, short_fit),
            MaxRectsBinMethod::BestAreaFit => (area_fit, short_fit),
            MaxRectsBinMethod::BottomLeftRule => ((fr.y + h) as i64, fr.x as i64),
            // higher contact is better, so negate for minimization
            MaxRectsBinMethod::ContactPointRule => {
                (-(self.contact_point_score(fr.x, fr.y, w, h) as i64), area_fit)
            }
        }
    }

    fn find_position(&self, w: u32, h: u32) -> Option<(Rect, bool)> {
        let mut best: Option<((i64, i64), Rect, bool)> = None;
        let mut consider = |score: (i64, i64), rect: Rect, rotated: bool| {
            let better = match &best {
                None => true,
                Some((s, r, _)) => score < *s || (score == *s && (rect.y, rect.x) < (r.y, r.x)),
            };
            if better {
                best = Some((score, rect, rotated));
            }
        };

        for fr in &self.free {
            if fr.w >= w && fr.h >= h {
                consider(self.score(fr, w, h), Rect::new(fr.x, fr.y, w, h), false);
            }
            if self.bounds.allow_rotation && w != h && fr.w >= h && fr.h >= w {
                consider(self.score(fr, h, w), Rect::new(fr.x, fr.y, h, w), true);
            }
        }
        best.map(|(_, rect, rotated)| (rect, rotated))
    }

    fn contact_point_score(&self, x: u32, y: u32, w: u32, h: u32) -> u32 {
        let node = Rect::new(x, y, w, h);
        let mut score = 0u32;
        if node.x == self.border.x || node.x + node.w == self.border.x + self.border.w {
            score += node.h;
        }
        if node.y == self.border.y || node.y + node.h == self.border.y + self.border.h {
            score += node.w;
        }
        for u in &self.used {
            if node.x == u.x + u.w || u.x == node.x + node.w {
                score += overlap_1d(node.y, node.y + node.h, u.y, u.y + u.h);
            }
            if node.y == u.y + u.h || u.y == node.y + node.h {
                score += overlap_1d(node.x, node.x + node.w, u.x, u.x + u.w);
            }
        }
        score
    }

    pub fn free_list_len(&self) -> usize {
        self.free.len()
    }
}

/// Pushes the (up to four) maximal free rectangles of `fr` that remain after
/// placing `node` inside it.
fn split_around(fr: &Rect, node: &Rect, out: &mut Vec<Rect>) {
    let fr_x2 = fr.x + fr.w;
    let fr_y2 = fr.y + fr.h;
    let n_x2 = node.x + node.w;
    let n_y2 = node.y + node.h;

    if node.x > fr.x {
        out.push(Rect::new(fr.x, fr.y, node.x - fr.x, fr.h));
    }
    if n_x2 < fr_x2 {
        out.push(Rect::new(n_x2, fr.y, fr_x2 - n_x2, fr.h));
    }
    if node.y > fr.y {
        out.push(Rect::new(fr.x, fr.y, fr.w, node.y - fr.y));
    }
    if n_y2 < fr_y2 {
        out.push(Rect::new(fr.x, n_y2, fr.w, fr_y2 - n_y2));
    }
}

fn overlap_1d(a1: u32, a2: u32, b1: u32, b2: u32) -> u32 {
    a2.min(b2).saturating_sub(a1.max(b1))
}

impl Packer for MaxRectsPacker {
    fn can_pack(&self, rect: &Rect) -> bool {
        let (w, h) = self.bounds.slot(rect.w, rect.h);
        self.find_position(w, h).is_some()
    }

    fn pack(&mut self, key: String, rect: &Rect) -> Option<Frame> {
        let (w, h) = self.bounds.slot(rect.w, rect.h);
        let (slot, rotated) = self.find_position(w, h)?;
        self.place_rect(&slot);
        Some(frame_for_slot(&self.bounds, key, &slot, rect, rotated))
    }
}
