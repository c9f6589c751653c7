//! Headless backend that records every call.
//!
//! Compilation checks only for a `main` entry point. Linking collects the
//! `uniform` declarations of the attached sources, so uniform lookups
//! behave like a driver that keeps every declared uniform active.

use std::{
    collections::{HashMap, HashSet},
    num::NonZeroU32,
};

use asset::PixelFormat;

use super::{
    BufferId, BufferTarget, GraphicsBackend, ImageUpload, ProgramId, ShaderId, ShaderStage,
    TextureId, TextureParam, UniformLocation, VertexArrayId,
};
use crate::error::{RenderError, RenderResult};

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CreateVertexArray(VertexArrayId),
    BindVertexArray(Option<VertexArrayId>),
    DeleteVertexArray(VertexArrayId),
    CreateBuffer(BufferId),
    BufferData { target: BufferTarget, buffer: BufferId, bytes: usize },
    VertexAttrib { location: u32, components: i32 },
    DeleteBuffer(BufferId),
    CreateShader { shader: ShaderId, stage: ShaderStage },
    DeleteShader(ShaderId),
    CreateProgram(ProgramId),
    AttachShader { program: ProgramId, shader: ShaderId },
    BindAttribLocation { program: ProgramId, location: u32, name: String },
    LinkProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    DeleteProgram(ProgramId),
    UniformMatrix4 { location: Option<UniformLocation>, value: [f32; 16] },
    UniformVec3 { location: Option<UniformLocation>, value: [f32; 3] },
    UniformI32 { location: Option<UniformLocation>, value: i32 },
    CreateTexture(TextureId),
    TexImage2d { texture: TextureId, width: u32, height: u32, internal_format: PixelFormat, format: PixelFormat },
    GenerateMipmap(TextureId),
    TexParameter { texture: TextureId, param: TextureParam },
    BindTexture { unit: u32, texture: Option<TextureId> },
    DeleteTexture(TextureId),
    DrawArrays { vertex_count: i32 },
    DrawElements { index_count: i32 },
    PolygonMode { fill: bool },
    Viewport { width: u32, height: u32 },
    Clear,
}

#[derive(Debug, Default)]
struct ProgramRecord {
    shaders: Vec<ShaderId>,
    uniforms: Vec<String>,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u32,
    calls: Vec<Call>,
    live: HashSet<u32>,
    sources: HashMap<ShaderId, String>,
    programs: HashMap<ProgramId, ProgramRecord>,
    object_limit: Option<usize>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Drains the recorded calls, leaving object bookkeeping intact.
    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    /// Number of created objects that have not been deleted.
    pub fn live_objects(&self) -> usize {
        self.live.len()
    }

    /// Creation fails once this many objects are alive, like a driver
    /// out of memory. `None` lifts the cap.
    pub fn set_object_limit(&mut self, limit: Option<usize>) {
        self.object_limit = limit;
    }

    fn alloc(&mut self, what: &'static str) -> RenderResult<NonZeroU32> {
        if self.object_limit.is_some_and(|limit| self.live.len() >= limit) {
            return Err(RenderError::Create {
                what,
                reason: "object limit reached".to_string(),
            });
        }
        self.next_id += 1;
        self.live.insert(self.next_id);
        Ok(NonZeroU32::new(self.next_id).unwrap_or(NonZeroU32::MIN))
    }

    fn release(&mut self, id: NonZeroU32) {
        self.live.remove(&id.get());
    }
}

fn declared_uniforms(source: &str) -> impl Iterator<Item = String> + '_ {
    source.split([';', '\n']).filter_map(|stmt| {
        let stmt = stmt.trim();
        if !stmt.starts_with("uniform ") {
            return None;
        }
        let name = stmt.split_whitespace().last()?;
        Some(name.split('[').next().unwrap_or(name).to_string())
    })
}

impl GraphicsBackend for RecordingBackend {
    fn create_vertex_array(&mut self) -> RenderResult<VertexArrayId> {
        let id = VertexArrayId(self.alloc("vertex array")?);
        self.calls.push(Call::CreateVertexArray(id));
        Ok(id)
    }

    fn bind_vertex_array(&mut self, vao: Option<VertexArrayId>) -> RenderResult<()> {
        self.calls.push(Call::BindVertexArray(vao));
        Ok(())
    }

    fn delete_vertex_array(&mut self, vao: VertexArrayId) {
        self.release(vao.0);
        self.calls.push(Call::DeleteVertexArray(vao));
    }

    fn create_buffer(&mut self) -> RenderResult<BufferId> {
        let id = BufferId(self.alloc("buffer")?);
        self.calls.push(Call::CreateBuffer(id));
        Ok(id)
    }

    fn buffer_data(&mut self, target: BufferTarget, buffer: BufferId, data: &[u8]) -> RenderResult<()> {
        self.calls.push(Call::BufferData {
            target,
            buffer,
            bytes: data.len(),
        });
        Ok(())
    }

    fn vertex_attrib_f32(&mut self, location: u32, components: i32) -> RenderResult<()> {
        self.calls.push(Call::VertexAttrib { location, components });
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.release(buffer.0);
        self.calls.push(Call::DeleteBuffer(buffer));
    }

    fn create_shader(&mut self, stage: ShaderStage, source: &str) -> RenderResult<ShaderId> {
        if !source.contains("main") {
            return Err(RenderError::ShaderCompile {
                stage,
                log: "0:1: error: no entry point 'main'".to_string(),
            });
        }
        let shader = ShaderId(self.alloc("shader")?);
        self.sources.insert(shader, source.to_string());
        self.calls.push(Call::CreateShader { shader, stage });
        Ok(shader)
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.release(shader.0);
        self.sources.remove(&shader);
        self.calls.push(Call::DeleteShader(shader));
    }

    fn create_program(&mut self) -> RenderResult<ProgramId> {
        let program = ProgramId(self.alloc("program")?);
        self.programs.insert(program, ProgramRecord::default());
        self.calls.push(Call::CreateProgram(program));
        Ok(program)
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) -> RenderResult<()> {
        if let Some(record) = self.programs.get_mut(&program) {
            record.shaders.push(shader);
        }
        self.calls.push(Call::AttachShader { program, shader });
        Ok(())
    }

    fn bind_attrib_location(&mut self, program: ProgramId, location: u32, name: &str) -> RenderResult<()> {
        self.calls.push(Call::BindAttribLocation {
            program,
            location,
            name: name.to_string(),
        });
        Ok(())
    }

    fn link_program(&mut self, program: ProgramId) -> RenderResult<()> {
        self.calls.push(Call::LinkProgram(program));
        let record = self.programs.entry(program).or_default();
        if record.shaders.is_empty() {
            return Err(RenderError::ProgramLink {
                log: "no shaders attached".to_string(),
            });
        }
        let mut uniforms = Vec::new();
        for shader in &record.shaders {
            let source = self.sources.get(shader).map(String::as_str).unwrap_or_default();
            for name in declared_uniforms(source) {
                if !uniforms.contains(&name) {
                    uniforms.push(name);
                }
            }
        }
        record.uniforms = uniforms;
        Ok(())
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> RenderResult<Option<UniformLocation>> {
        Ok(self.programs.get(&program).and_then(|record| {
            record
                .uniforms
                .iter()
                .position(|u| u == name)
                .map(|i| UniformLocation(i as u32))
        }))
    }

    fn use_program(&mut self, program: Option<ProgramId>) -> RenderResult<()> {
        self.calls.push(Call::UseProgram(program));
        Ok(())
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.release(program.0);
        self.programs.remove(&program);
        self.calls.push(Call::DeleteProgram(program));
    }

    fn uniform_matrix4(&mut self, location: Option<UniformLocation>, value: &[f32; 16]) -> RenderResult<()> {
        self.calls.push(Call::UniformMatrix4 {
            location,
            value: *value,
        });
        Ok(())
    }

    fn uniform_vec3(&mut self, location: Option<UniformLocation>, value: [f32; 3]) -> RenderResult<()> {
        self.calls.push(Call::UniformVec3 { location, value });
        Ok(())
    }

    fn uniform_i32(&mut self, location: Option<UniformLocation>, value: i32) -> RenderResult<()> {
        self.calls.push(Call::UniformI32 { location, value });
        Ok(())
    }

    fn create_texture(&mut self) -> RenderResult<TextureId> {
        let id = TextureId(self.alloc("texture")?);
        self.calls.push(Call::CreateTexture(id));
        Ok(id)
    }

    fn tex_image_2d(&mut self, texture: TextureId, image: &ImageUpload<'_>) -> RenderResult<()> {
        self.calls.push(Call::TexImage2d {
            texture,
            width: image.width,
            height: image.height,
            internal_format: image.internal_format,
            format: image.format,
        });
        Ok(())
    }

    fn generate_mipmap(&mut self, texture: TextureId) -> RenderResult<()> {
        self.calls.push(Call::GenerateMipmap(texture));
        Ok(())
    }

    fn tex_parameter(&mut self, texture: TextureId, param: TextureParam) -> RenderResult<()> {
        self.calls.push(Call::TexParameter { texture, param });
        Ok(())
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>) -> RenderResult<()> {
        self.calls.push(Call::BindTexture { unit, texture });
        Ok(())
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.release(texture.0);
        self.calls.push(Call::DeleteTexture(texture));
    }

    fn draw_arrays(&mut self, vertex_count: i32) -> RenderResult<()> {
        self.calls.push(Call::DrawArrays { vertex_count });
        Ok(())
    }

    fn draw_elements(&mut self, index_count: i32) -> RenderResult<()> {
        self.calls.push(Call::DrawElements { index_count });
        Ok(())
    }

    fn polygon_mode(&mut self, fill: bool) -> RenderResult<()> {
        self.calls.push(Call::PolygonMode { fill });
        Ok(())
    }

    fn viewport(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.calls.push(Call::Viewport { width, height });
        Ok(())
    }

    fn clear(&mut self, _color: [f32; 4]) -> RenderResult<()> {
        self.calls.push(Call::Clear);
        Ok(())
    }
}
