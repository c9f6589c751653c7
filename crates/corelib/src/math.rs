//! Vector and 4x4 matrix kernel.
//!
//! Matrices are stored column-major: element `(col, row)` lives at
//! `col * 4 + row`, which is also the layout OpenGL expects for
//! `glUniformMatrix4fv` without transposition.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use crate::error::{CoreError, CoreResult};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec2) {
        *self = *self + rhs;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    #[inline]
    pub const fn from_array(a: [f32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    #[inline]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Component-wise product.
    #[inline]
    pub fn mul_elem(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }

    #[inline]
    pub fn cross(self, rhs: Vec3) -> Vec3 {
        Vec3::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    #[inline]
    pub fn dot(self, rhs: Vec3) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    #[inline]
    pub fn min(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x.min(rhs.x), self.y.min(rhs.y), self.z.min(rhs.z))
    }

    #[inline]
    pub fn max(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x.max(rhs.x), self.y.max(rhs.y), self.z.max(rhs.z))
    }

    /// Unit vector in the same direction, or `None` when the magnitude is
    /// zero or not finite.
    pub fn try_normalize(self) -> Option<Vec3> {
        let len = self.length();
        if len == 0.0 || !len.is_finite() {
            return None;
        }
        Some(Vec3::new(self.x / len, self.y / len, self.z / len))
    }

    /// Like [`Vec3::try_normalize`], reporting a zero vector as an error.
    pub fn normalize(self) -> CoreResult<Vec3> {
        self.try_normalize().ok_or(CoreError::DegenerateVector)
    }

    #[inline]
    pub fn normalize_or_zero(self) -> Vec3 {
        self.try_normalize().unwrap_or(Vec3::ZERO)
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    #[inline]
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    #[inline]
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(a: [f32; 3]) -> Self {
        Vec3::from_array(a)
    }
}

impl From<Vec3> for glam::Vec3 {
    fn from(v: Vec3) -> Self {
        glam::Vec3::new(v.x, v.y, v.z)
    }
}

/// Angles recovered from a rotation matrix, in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EulerAngles {
    pub pitch: f32,
    pub yaw: f32,
    /// Computed as `atan2(m01, m01)`, which can only produce 0, π/4 or
    /// -3π/4. Do not feed it back into a transform.
    pub roll: f32,
}

/// 4x4 float matrix, column-major.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat4 {
    d: [f32; 16],
}

#[inline]
const fn idx(col: usize, row: usize) -> usize {
    col * 4 + row
}

impl Mat4 {
    pub const ZERO: Self = Self { d: [0.0; 16] };

    pub const IDENTITY: Self = Self {
        d: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    #[inline]
    pub const fn from_cols_array(d: [f32; 16]) -> Self {
        Self { d }
    }

    #[inline]
    pub const fn to_cols_array(&self) -> [f32; 16] {
        self.d
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.d
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> f32 {
        self.d[idx(col, row)]
    }

    #[inline]
    pub fn set(&mut self, col: usize, row: usize, value: f32) {
        self.d[idx(col, row)] = value;
    }

    #[inline]
    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn scale(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::ZERO;
        m.set(0, 0, x);
        m.set(1, 1, y);
        m.set(2, 2, z);
        m.set(3, 3, 1.0);
        m
    }

    pub fn translate(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.set(3, 0, x);
        m.set(3, 1, y);
        m.set(3, 2, z);
        m
    }

    pub fn rotate_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Self::IDENTITY;
        m.set(1, 1, c);
        m.set(2, 1, -s);
        m.set(1, 2, s);
        m.set(2, 2, c);
        m
    }

    pub fn rotate_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Self::IDENTITY;
        m.set(0, 0, c);
        m.set(2, 0, s);
        m.set(0, 2, -s);
        m.set(2, 2, c);
        m
    }

    pub fn rotate_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Self::IDENTITY;
        m.set(0, 0, c);
        m.set(1, 0, -s);
        m.set(0, 1, s);
        m.set(1, 1, c);
        m
    }

    /// `result(col, row) = Σ self(col, i) * rhs(i, row)`.
    ///
    /// Read as textbook matrices this is `rhs · self`, so chaining
    /// `a.multiply(b).multiply(c)` applies `a` to a point first.
    pub fn multiply(&self, rhs: &Mat4) -> Mat4 {
        let mut out = Mat4::ZERO;
        for row in 0..4 {
            for col in 0..4 {
                let mut acc = 0.0;
                for i in 0..4 {
                    acc += self.get(col, i) * rhs.get(i, row);
                }
                out.set(col, row, acc);
            }
        }
        out
    }

    /// Model matrix: rotate X, Y, Z, then scale, then translate.
    pub fn model(translation: Vec3, scale: Vec3, rotation: Vec3) -> Mat4 {
        Mat4::IDENTITY
            .multiply(&Mat4::rotate_x(rotation.x))
            .multiply(&Mat4::rotate_y(rotation.y))
            .multiply(&Mat4::rotate_z(rotation.z))
            .multiply(&Mat4::scale(scale.x, scale.y, scale.z))
            .multiply(&Mat4::translate(translation.x, translation.y, translation.z))
    }

    /// Point transform: the 3x3 linear part plus the translation column.
    pub fn transform_point(&self, v: Vec3) -> Vec3 {
        let row = |r: usize| {
            v.x * self.get(0, r) + v.y * self.get(1, r) + v.z * self.get(2, r) + self.get(3, r)
        };
        Vec3::new(row(0), row(1), row(2))
    }

    pub fn to_euler(&self) -> EulerAngles {
        let m12 = self.get(1, 2);
        let m22 = self.get(2, 2);
        let sign = if m22 > 0.0 { 1.0 } else { -1.0 };

        EulerAngles {
            pitch: m12.atan2(m22),
            yaw: (-self.get(0, 2)).atan2(sign * m12.hypot(m22)),
            roll: self.get(0, 1).atan2(self.get(0, 1)),
        }
    }

    /// OpenGL-style perspective projection (clip z in [-1, 1]).
    pub fn perspective(fov_y_rad: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let f = 1.0 / (fov_y_rad / 2.0).tan();
        let depth = near - far;

        let mut m = Mat4::ZERO;
        m.set(0, 0, f / aspect);
        m.set(1, 1, f);
        m.set(2, 2, (near + far) / depth);
        m.set(3, 2, 2.0 * near * far / depth);
        m.set(2, 3, -1.0);
        m
    }

    pub fn approx_eq(&self, other: &Mat4, eps: f32) -> bool {
        self.d.iter().zip(other.d.iter()).all(|(a, b)| (a - b).abs() <= eps)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    #[inline]
    fn mul(self, rhs: Mat4) -> Mat4 {
        self.multiply(&rhs)
    }
}

impl From<Mat4> for glam::Mat4 {
    fn from(m: Mat4) -> Self {
        glam::Mat4::from_cols_array(&m.d)
    }
}

impl From<glam::Mat4> for Mat4 {
    fn from(m: glam::Mat4) -> Self {
        Mat4::from_cols_array(m.to_cols_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    const EPS: f32 = 1e-4;

    fn random_mat(rng: &mut StdRng) -> Mat4 {
        let mut d = [0.0; 16];
        for v in d.iter_mut() {
            *v = rng.random_range(-2.0..2.0);
        }
        Mat4::from_cols_array(d)
    }

    fn assert_vec_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < EPS, "{a:?} != {b:?}");
    }

    #[test]
    fn multiply_is_associative() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..32 {
            let (a, b, c) = (random_mat(&mut rng), random_mat(&mut rng), random_mat(&mut rng));
            let left = (a * b) * c;
            let right = a * (b * c);
            assert!(left.approx_eq(&right, 1e-3), "{left:?} vs {right:?}");
        }
    }

    #[test]
    fn identity_is_two_sided() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..16 {
            let m = random_mat(&mut rng);
            assert!((m * Mat4::identity()).approx_eq(&m, EPS));
            assert!((Mat4::identity() * m).approx_eq(&m, EPS));
        }
    }

    #[test]
    fn multiply_matches_reversed_glam_product() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = random_mat(&mut rng);
        let b = random_mat(&mut rng);
        let expected = glam::Mat4::from(b) * glam::Mat4::from(a);
        assert!(Mat4::from(expected).approx_eq(&(a * b), 1e-4));
    }

    #[test]
    fn translate_moves_origin() {
        let p = Mat4::translate(1.5, -2.0, 3.25).transform_point(Vec3::ZERO);
        assert_eq!(p, Vec3::new(1.5, -2.0, 3.25));
    }

    #[test]
    fn model_without_rotation_or_scale_is_pure_translation() {
        let t = Vec3::new(4.0, -1.0, 0.5);
        let m = Mat4::model(t, Vec3::ONE, Vec3::ZERO);
        let p = Vec3::new(0.3, 0.7, -2.0);
        assert_vec_close(m.transform_point(p), p + t);
    }

    #[test]
    fn model_order_matches_textbook_trs() {
        let t = Vec3::new(1.0, 2.0, 3.0);
        let s = Vec3::new(2.0, 0.5, 1.5);
        let r = Vec3::new(0.3, -0.7, 1.1);
        let ours = Mat4::model(t, s, r);
        let reference = glam::Mat4::from_translation(t.into())
            * glam::Mat4::from_scale(s.into())
            * glam::Mat4::from_rotation_z(r.z)
            * glam::Mat4::from_rotation_y(r.y)
            * glam::Mat4::from_rotation_x(r.x);
        assert!(ours.approx_eq(&reference.into(), EPS));
    }

    #[test]
    fn perspective_matches_gl_convention() {
        let ours = Mat4::perspective(1.0, 16.0 / 9.0, 0.1, 100.0);
        let reference = glam::Mat4::perspective_rh_gl(1.0, 16.0 / 9.0, 0.1, 100.0);
        assert!(ours.approx_eq(&reference.into(), EPS));
    }

    #[test]
    fn euler_from_single_axis_rotations() {
        let yaw = Mat4::rotate_y(0.6).to_euler();
        assert!((yaw.yaw - 0.6).abs() < EPS);
        assert!(yaw.pitch.abs() < EPS);

        let pitch = Mat4::rotate_x(-0.4).to_euler();
        assert!((pitch.pitch + 0.4).abs() < EPS);
        assert!(pitch.yaw.abs() < EPS);
    }

    #[test]
    fn euler_roll_is_degenerate() {
        let e = Mat4::rotate_z(0.3).to_euler();
        assert!((e.roll - std::f32::consts::FRAC_PI_4).abs() < EPS);
        assert_eq!(Mat4::IDENTITY.to_euler().roll, 0.0);
    }

    #[test]
    fn cross_is_anticommutative() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..16 {
            let a = Vec3::new(rng.random_range(-5.0..5.0), rng.random_range(-5.0..5.0), 1.0);
            let b = Vec3::new(0.5, rng.random_range(-5.0..5.0), rng.random_range(-5.0..5.0));
            assert_vec_close(a.cross(b), -b.cross(a));
        }
    }

    #[test]
    fn normalize_unit_and_general() {
        let unit = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(unit.normalize().unwrap(), unit);

        let n = Vec3::new(3.0, -4.0, 12.0).normalize().unwrap();
        assert!((n.length() - 1.0).abs() < EPS);
    }

    #[test]
    fn normalize_zero_vector() {
        assert_eq!(Vec3::ZERO.normalize(), Err(CoreError::DegenerateVector));
        assert_eq!(Vec3::ZERO.try_normalize(), None);
        assert_eq!(Vec3::ZERO.normalize_or_zero(), Vec3::ZERO);
    }

    #[test]
    fn vector_arithmetic() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::splat(3.0));
        assert_eq!(a.mul_elem(b), Vec3::new(4.0, 10.0, 18.0));
    }
}
