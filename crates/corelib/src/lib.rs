//! Core types: column-major math kernel, Transform, Camera, render and
//! input state. Nothing in this crate talks to the GPU.

pub mod bounds;
pub mod camera;
pub mod error;
pub mod input;
pub mod math;
pub mod state;
pub mod transform;

pub use bounds::BoundingBox;
pub use camera::Camera;
pub use error::{CoreError, CoreResult};
pub use input::{InputState, Key};
pub use math::{EulerAngles, Mat4, Vec2, Vec3};
pub use state::RenderState;
pub use transform::Transform;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transform_is_identity_matrix() {
        let t = Transform::identity();
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn translate_then_scale_matrix() {
        let t = Transform::from_trs(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 2.0, 2.0),
        );
        // Translation sits in column 3; the diagonal carries the scale.
        let m = t.matrix().to_cols_array();
        assert!((m[12] - 1.0).abs() < 1e-6);
        assert!((m[13] - 2.0).abs() < 1e-6);
        assert!((m[14] - 3.0).abs() < 1e-6);
        assert!((m[0] - 2.0).abs() < 1e-6);
        assert!((m[5] - 2.0).abs() < 1e-6);
        assert!((m[10] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn transform_mutators_accumulate() {
        let mut t = Transform::identity();
        t.translate(Vec3::new(1.0, 0.0, 0.0));
        t.translate(Vec3::new(0.5, 2.0, 0.0));
        t.rotate(Vec3::new(0.1, 0.0, 0.0));
        t.rotate(Vec3::new(0.1, 0.2, 0.0));
        t.scale_by(Vec3::new(2.0, 3.0, 1.0));
        t.scale_by(Vec3::new(2.0, 1.0, 0.5));
        assert_eq!(t.translation, Vec3::new(1.5, 2.0, 0.0));
        assert!((t.rotation_euler.x - 0.2).abs() < 1e-6);
        assert!((t.rotation_euler.y - 0.2).abs() < 1e-6);
        assert_eq!(t.scale, Vec3::new(4.0, 3.0, 0.5));
    }

    #[test]
    fn camera_pv_is_finite() {
        let mut state = RenderState::new(1920, 1080);
        let cam = Camera::new(Vec3::new(0.0, 0.0, 4.0), 60f32.to_radians(), 0.1, 100.0, &mut state);
        let pv = state.view.multiply(&state.projection);
        assert!(pv.to_cols_array().iter().all(|f| f.is_finite()));
        assert_eq!(state.view, cam.view());
    }
}
