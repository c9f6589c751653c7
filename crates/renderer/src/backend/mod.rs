//! The seam between the draw path and the graphics API.
//!
//! Every call returns a [`RenderResult`]; the GL implementation checks
//! `glGetError` after each call in debug builds. All objects must be
//! created and used on the thread that owns the GL context.

use std::num::NonZeroU32;

use asset::PixelFormat;

use crate::error::RenderResult;

pub mod gl;
pub mod recording;

pub use gl::GlBackend;
pub use recording::{Call, RecordingBackend};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub NonZeroU32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub NonZeroU32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderId(pub NonZeroU32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(pub NonZeroU32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub NonZeroU32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureWrap {
    Repeat,
    ClampToEdge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFilter {
    Nearest,
    Linear,
    LinearMipmapLinear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureParam {
    WrapS(TextureWrap),
    WrapT(TextureWrap),
    MinFilter(TextureFilter),
    MagFilter(TextureFilter),
}

/// Pixels handed to [`GraphicsBackend::tex_image_2d`].
#[derive(Clone, Copy, Debug)]
pub struct ImageUpload<'a> {
    pub width: u32,
    pub height: u32,
    /// Storage format on the GPU.
    pub internal_format: PixelFormat,
    /// Layout of `pixels`.
    pub format: PixelFormat,
    pub pixels: &'a [u8],
}

pub trait GraphicsBackend {
    fn create_vertex_array(&mut self) -> RenderResult<VertexArrayId>;
    fn bind_vertex_array(&mut self, vao: Option<VertexArrayId>) -> RenderResult<()>;
    fn delete_vertex_array(&mut self, vao: VertexArrayId);

    fn create_buffer(&mut self) -> RenderResult<BufferId>;
    /// Binds `buffer` to `target` and uploads `data` as static draw data.
    fn buffer_data(&mut self, target: BufferTarget, buffer: BufferId, data: &[u8]) -> RenderResult<()>;
    /// Points attribute `location` at the bound array buffer (tightly
    /// packed floats) and enables it.
    fn vertex_attrib_f32(&mut self, location: u32, components: i32) -> RenderResult<()>;
    fn delete_buffer(&mut self, buffer: BufferId);

    /// Creates and compiles one stage. A compile failure carries the info log.
    fn create_shader(&mut self, stage: ShaderStage, source: &str) -> RenderResult<ShaderId>;
    fn delete_shader(&mut self, shader: ShaderId);

    fn create_program(&mut self) -> RenderResult<ProgramId>;
    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) -> RenderResult<()>;
    fn bind_attrib_location(&mut self, program: ProgramId, location: u32, name: &str) -> RenderResult<()>;
    fn link_program(&mut self, program: ProgramId) -> RenderResult<()>;
    /// `None` when the linked program has no active uniform called `name`.
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> RenderResult<Option<UniformLocation>>;
    fn use_program(&mut self, program: Option<ProgramId>) -> RenderResult<()>;
    fn delete_program(&mut self, program: ProgramId);

    fn uniform_matrix4(&mut self, location: Option<UniformLocation>, value: &[f32; 16]) -> RenderResult<()>;
    fn uniform_vec3(&mut self, location: Option<UniformLocation>, value: [f32; 3]) -> RenderResult<()>;
    fn uniform_i32(&mut self, location: Option<UniformLocation>, value: i32) -> RenderResult<()>;

    fn create_texture(&mut self) -> RenderResult<TextureId>;
    /// Binds `texture` as the current 2D texture and uploads level 0.
    fn tex_image_2d(&mut self, texture: TextureId, image: &ImageUpload<'_>) -> RenderResult<()>;
    fn generate_mipmap(&mut self, texture: TextureId) -> RenderResult<()>;
    fn tex_parameter(&mut self, texture: TextureId, param: TextureParam) -> RenderResult<()>;
    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>) -> RenderResult<()>;
    fn delete_texture(&mut self, texture: TextureId);

    /// Non-indexed triangle list from the bound vertex array.
    fn draw_arrays(&mut self, vertex_count: i32) -> RenderResult<()>;
    /// Indexed triangle list, `u32` indices from the bound vertex array.
    fn draw_elements(&mut self, index_count: i32) -> RenderResult<()>;

    /// `true` fills polygons, `false` draws wireframe.
    fn polygon_mode(&mut self, fill: bool) -> RenderResult<()>;
    fn viewport(&mut self, width: u32, height: u32) -> RenderResult<()>;
    fn clear(&mut self, color: [f32; 4]) -> RenderResult<()>;
}
