use crate::{InputState, Key, Mat4, RenderState, Vec3};

/// Distance travelled per update while a movement key is held.
pub const FPS_STEP: f32 = 0.1;
/// Mouse motion, as a fraction of the window size, is scaled by this.
pub const MOUSE_SENSITIVITY: f32 = 10.0;

/// First-person perspective camera.
///
/// Orientation is kept as an accumulated rotation matrix rather than
/// Euler angles.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Mat4,
    pub fov_y_rad: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    /// Creates the camera and writes its projection into `state`.
    pub fn new(position: Vec3, fov_y_rad: f32, z_near: f32, z_far: f32, state: &mut RenderState) -> Self {
        let camera = Self {
            position,
            rotation: Mat4::IDENTITY,
            fov_y_rad,
            z_near,
            z_far,
        };
        state.projection = camera.proj(state.aspect());
        state.view = camera.view();
        camera
    }

    #[inline]
    pub fn proj(&self, aspect: f32) -> Mat4 {
        Mat4::perspective(self.fov_y_rad, aspect.max(1e-6), self.z_near, self.z_far)
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        let p = self.position;
        Mat4::translate(-p.x, -p.y, -p.z).multiply(&self.rotation)
    }

    /// Refreshes the projection after a window resize.
    pub fn update_projection(&self, state: &mut RenderState) {
        state.projection = self.proj(state.aspect());
    }

    /// One FPS tick: WASD moves by a fixed step in the camera's yaw frame,
    /// mouse motion turns it. Not scaled by frame time.
    pub fn update_fps(&mut self, input: &mut InputState, state: &mut RenderState) {
        let mut ds = Vec3::ZERO;
        if input.is_down(Key::W) {
            ds.z -= FPS_STEP;
        }
        if input.is_down(Key::S) {
            ds.z += FPS_STEP;
        }
        if input.is_down(Key::A) {
            ds.x -= FPS_STEP;
        }
        if input.is_down(Key::D) {
            ds.x += FPS_STEP;
        }

        let rel = input.take_mouse_delta();
        let yaw = rel.x / state.width as f32 * MOUSE_SENSITIVITY;
        let pitch = rel.y / state.height as f32 * MOUSE_SENSITIVITY;

        self.rotation = Mat4::rotate_y(yaw).multiply(&self.rotation);
        self.rotation = self.rotation.multiply(&Mat4::rotate_x(pitch));

        // The view yaw maps world to eye space; undo it to move in world space.
        let angles = self.rotation.to_euler();
        let ds = Mat4::rotate_y(-angles.yaw).transform_point(ds);
        self.position += ds;

        state.view = self.view();
    }
}
