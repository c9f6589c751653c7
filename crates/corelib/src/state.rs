//! Per-context render state shared by the camera and the draw path.

use crate::Mat4;

/// View/projection matrices, window size and polygon fill mode.
///
/// Owned by one render context and passed explicitly; nothing here is
/// global. GPU-side effects of `fill` are applied by the renderer.
#[derive(Clone, Debug)]
pub struct RenderState {
    pub width: u32,
    pub height: u32,
    pub view: Mat4,
    pub projection: Mat4,
    pub fill: bool,
}

impl RenderState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            fill: true,
        }
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}
