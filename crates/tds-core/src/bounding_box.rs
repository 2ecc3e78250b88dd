//! Axis-aligned bounds accumulated over mesh positions.

use crate::vector::Vector3f;

/// Running axis-aligned bounding box.
///
/// `min`/`max` only mean something once [`is_valid`](Self::is_valid) is true.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    min: Vector3f,
    max: Vector3f,
    valid: bool,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundingBox {
    pub fn new() -> Self {
        Self {
            min: Vector3f::splat(f32::INFINITY),
            max: Vector3f::splat(f32::NEG_INFINITY),
            valid: false,
        }
    }

    pub fn from_corners(min: Vector3f, max: Vector3f) -> Self {
        Self {
            min,
            max,
            valid: true,
        }
    }

    /// Grows the box to contain `p`. Points with a NaN or infinite
    /// component are ignored.
    #[inline]
    pub fn extend(&mut self, p: Vector3f) {
        if !p.is_finite() {
            return;
        }
        self.min = self.min.min(p);
        self.max = self.max.max(p);
        self.valid = true;
    }

    pub fn union(&mut self, other: &BoundingBox) {
        if other.valid {
            self.extend(other.min);
            self.extend(other.max);
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn min(&self) -> Vector3f {
        self.min
    }

    pub fn max(&self) -> Vector3f {
        self.max
    }

    pub fn center(&self) -> Vector3f {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vector3f {
        self.max - self.min
    }
}
