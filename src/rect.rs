/// Axis-aligned rectangle given by its top-left corner and its size.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// The point where the rectangle splits into quadrants.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        Extent::from_rect(*self).center()
    }

    /// Inclusive on every edge. NaN coordinates are never contained.
    #[inline]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        Extent::from_rect(*self).contains(x, y)
    }

    /// Whether any point of the rectangle lies within `radius` of `(cx, cy)`.
    ///
    /// Negative and NaN radii intersect nothing.
    #[inline]
    pub fn intersects_circle(&self, cx: f32, cy: f32, radius: f32) -> bool {
        Extent::from_rect(*self).intersects_circle(cx, cy, radius)
    }

    /// The four quadrants in NW, NE, SW, SE order.
    pub fn split(&self) -> [Rect; 4] {
        Extent::from_rect(*self).split().map(Extent::to_rect)
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }
}

/// A node's region stored by its corners.
///
/// Quadrants are cut at the center and reuse the parent's corner values, so
/// neighbouring quadrants share their edges bit for bit and the outer ones
/// end exactly where the parent ends.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Extent {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Extent {
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            min_x: rect.x,
            min_y: rect.y,
            max_x: rect.right(),
            max_y: rect.bottom(),
        }
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(
            self.min_x,
            self.min_y,
            self.max_x - self.min_x,
            self.max_y - self.min_y,
        )
    }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (
            midpoint(self.min_x, self.max_x),
            midpoint(self.min_y, self.max_y),
        )
    }

    #[inline]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    #[inline]
    pub fn intersects_circle(&self, cx: f32, cy: f32, radius: f32) -> bool {
        if !(radius >= 0.0) {
            return false;
        }
        let dx = cx - cx.clamp(self.min_x, self.max_x);
        let dy = cy - cy.clamp(self.min_y, self.max_y);
        dx * dx + dy * dy <= radius * radius
    }

    pub fn split(&self) -> [Extent; 4] {
        let (cx, cy) = self.center();
        [
            Extent { max_x: cx, max_y: cy, ..*self },
            Extent { min_x: cx, max_y: cy, ..*self },
            Extent { max_x: cx, min_y: cy, ..*self },
            Extent { min_x: cx, min_y: cy, ..*self },
        ]
    }

    /// Index into [`Extent::split`] of the quadrant owning `(x, y)`.
    ///
    /// Points on the vertical split line belong to the west side and points
    /// on the horizontal one to the north side.
    #[inline]
    pub fn quadrant(&self, x: f32, y: f32) -> usize {
        let (cx, cy) = self.center();
        let east = (x > cx) as usize;
        let south = (y > cy) as usize;
        south << 1 | east
    }
}

/// Halfway point, kept inside `[min, max]` whatever the rounding.
#[inline]
fn midpoint(min: f32, max: f32) -> f32 {
    (min + (max - min) * 0.5).clamp(min, max)
}
