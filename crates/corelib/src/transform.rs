use crate::{Mat4, Vec3};

/// Position, Euler rotation and non-uniform scale of a model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation_euler: Vec3,
    pub scale: Vec3,
}

impl Transform {
    #[inline]
    pub const fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation_euler: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    #[inline]
    pub fn from_trs(translation: Vec3, rotation_euler: Vec3, scale: Vec3) -> Self {
        Self {
            translation,
            rotation_euler,
            scale,
        }
    }

    /// Rotation, then scale, then translation (see [`Mat4::model`]).
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::model(self.translation, self.scale, self.rotation_euler)
    }

    #[inline]
    pub fn translate(&mut self, delta: Vec3) {
        self.translation += delta;
    }

    #[inline]
    pub fn rotate(&mut self, delta: Vec3) {
        self.rotation_euler += delta;
    }

    /// Multiplies the current scale component-wise.
    #[inline]
    pub fn scale_by(&mut self, factor: Vec3) {
        self.scale = self.scale.mul_elem(factor);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
