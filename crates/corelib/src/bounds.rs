use crate::{Mat4, Vec3};

/// Axis-aligned box given by its two extreme corners.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Tight box around `points`, `None` if there are none.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), |acc, p| {
            Self::new(acc.min.min(p), acc.max.max(p))
        }))
    }

    #[inline]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(self.min.min(other.min), self.max.max(other.max))
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Maps only `min` and `max` through `m`. Exact for translation and
    /// positive scale; under rotation the result is not a bound of the
    /// rotated box.
    pub fn transform_corners(&self, m: &Mat4) -> BoundingBox {
        BoundingBox::new(m.transform_point(self.min), m.transform_point(self.max))
    }
}
