// ── Geometry primitives ───────────────────────────────────────────────────────
//
// Device-pixel coordinates, origin top-left.  Native notifications carry
// floating-point points; everything the host sees is integral.

use serde::{Deserialize, Serialize};

/// A floating-point point as reported by the native toolkit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Truncate toward zero, matching how toolkits convert sub-pixel positions.
    pub fn to_int(self) -> PointI {
        PointI::new(self.x as i32, self.y as i32)
    }
}

/// An integral device-pixel position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointI {
    pub x: i32,
    pub y: i32,
}

impl PointI {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Saturates at the `i32` range: positions far apart still yield the
/// largest representable delta in the right direction.
impl std::ops::Sub for PointI {
    type Output = PointI;

    fn sub(self, rhs: PointI) -> PointI {
        PointI::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

/// An integral width/height pair.  `Size::ZERO` means "no limit" for
/// min/max window size queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const ZERO: Size = Size::new(0, 0);

    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }
}

/// A window or screen frame: top-left position plus size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub origin: PointI,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            origin: PointI::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Place a rectangle of `size` in the middle of `self`.
    pub fn centered(self, size: Size) -> Rect {
        Rect {
            origin: PointI::new(
                self.origin.x + (self.size.width - size.width) / 2,
                self.origin.y + (self.size.height - size.height) / 2,
            ),
            size,
        }
    }
}
