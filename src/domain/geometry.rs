//! Page-space rectangles.
//!
//! Coordinates follow the layout provider: origin at the top-left of the
//! page, `y` growing downwards, `x0 <= x1` and `y0 <= y1`.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in page coordinates
///
/// Serialized as `[x0, y0, x1, y1]` to match layout files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl From<[f64; 4]> for Rect {
    fn from(v: [f64; 4]) -> Self {
        Rect::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Rect> for [f64; 4] {
    fn from(r: Rect) -> Self {
        [r.x0, r.y0, r.x1, r.y1]
    }
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// True when all coordinates are finite and the corners are ordered
    pub fn is_valid(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| v.is_finite())
            && self.x0 <= self.x1
            && self.y0 <= self.y1
    }

    /// A rectangle with no area
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Strict overlap: rectangles that only touch along an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Union of a sequence of rectangles, `None` when empty
    pub fn enclosing<'a, I>(rects: I) -> Option<Rect>
    where
        I: IntoIterator<Item = &'a Rect>,
    {
        rects.into_iter().fold(None, |acc, r| match acc {
            Some(a) => Some(a.union(r)),
            None => Some(*r),
        })
    }

    /// Grow (or shrink) equally in all directions around the center
    pub fn scale(&self, factor: f64) -> Rect {
        let cx = (self.x0 + self.x1) / 2.0;
        let cy = (self.y0 + self.y1) / 2.0;
        let half_w = self.width() * factor / 2.0;
        let half_h = self.height() * factor / 2.0;
        Rect {
            x0: cx - half_w,
            y0: cy - half_h,
            x1: cx + half_w,
            y1: cy + half_h,
        }
    }

    /// Clip to `bounds`
    pub fn clamp_to(&self, bounds: &Rect) -> Rect {
        Rect {
            x0: self.x0.max(bounds.x0).min(bounds.x1),
            y0: self.y0.max(bounds.y0).min(bounds.y1),
            x1: self.x1.min(bounds.x1).max(bounds.x0),
            y1: self.y1.min(bounds.y1).max(bounds.y0),
        }
    }

    /// Shift vertically by `dy`
    pub fn offset_y(&self, dy: f64) -> Rect {
        Rect {
            y0: self.y0 + dy,
            y1: self.y1 + dy,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 20.0, 10.0);
        assert!(!a.intersects(&b));
        let c = Rect::new(9.0, 9.0, 20.0, 20.0);
        assert!(a.intersects(&c));
        assert!(c.intersects(&a));
    }

    #[test]
    fn test_scale_about_center() {
        let r = Rect::new(0.0, 0.0, 10.0, 20.0).scale(2.0);
        assert_eq!(r, Rect::new(-5.0, -10.0, 15.0, 30.0));
    }

    #[test]
    fn test_clamp_to_page() {
        let page = Rect::new(0.0, 0.0, 100.0, 100.0);
        let r = Rect::new(-5.0, 90.0, 50.0, 120.0).clamp_to(&page);
        assert_eq!(r, Rect::new(0.0, 90.0, 50.0, 100.0));
    }

    #[test]
    fn test_enclosing() {
        let rects = [Rect::new(0.0, 0.0, 1.0, 1.0), Rect::new(5.0, -2.0, 6.0, 3.0)];
        assert_eq!(Rect::enclosing(&rects), Some(Rect::new(0.0, -2.0, 6.0, 3.0)));
        assert_eq!(Rect::enclosing(&Vec::<Rect>::new()), None);
    }

    #[test]
    fn test_serde_as_array() {
        let r: Rect = serde_json::from_str("[1.0, 2.0, 3.0, 4.0]").unwrap();
        assert_eq!(r, Rect::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(serde_json::to_string(&r).unwrap(), "[1.0,2.0,3.0,4.0]");
    }
}
