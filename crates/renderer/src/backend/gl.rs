//! OpenGL 3.3 core backend over `glow`.

use asset::PixelFormat;
use glow::HasContext as _;

use super::{
    BufferId, BufferTarget, GraphicsBackend, ImageUpload, ProgramId, ShaderId, ShaderStage,
    TextureFilter, TextureId, TextureParam, TextureWrap, UniformLocation, VertexArrayId,
};
use crate::error::{RenderError, RenderResult};

pub struct GlBackend {
    gl: glow::Context,
}

impl GlBackend {
    /// Wraps a context that is current on this thread and enables depth
    /// testing.
    pub fn new(gl: glow::Context) -> RenderResult<Self> {
        let backend = Self { gl };
        unsafe { backend.gl.enable(glow::DEPTH_TEST) };
        backend.check("glEnable")?;
        Ok(backend)
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// `glGetError` check after a GL call; skipped in release builds.
    fn check(&self, call: &'static str) -> RenderResult<()> {
        if !cfg!(debug_assertions) {
            return Ok(());
        }
        let code = unsafe { self.gl.get_error() };
        if code == glow::NO_ERROR {
            Ok(())
        } else {
            log::error!("{call} raised GL error 0x{code:04X}");
            Err(RenderError::Backend { call, code })
        }
    }
}

fn vao(id: VertexArrayId) -> glow::NativeVertexArray {
    glow::NativeVertexArray(id.0)
}

fn buffer(id: BufferId) -> glow::NativeBuffer {
    glow::NativeBuffer(id.0)
}

fn shader(id: ShaderId) -> glow::NativeShader {
    glow::NativeShader(id.0)
}

fn program(id: ProgramId) -> glow::NativeProgram {
    glow::NativeProgram(id.0)
}

fn texture(id: TextureId) -> glow::NativeTexture {
    glow::NativeTexture(id.0)
}

fn location(loc: Option<UniformLocation>) -> Option<glow::NativeUniformLocation> {
    loc.map(|l| glow::NativeUniformLocation(l.0))
}

fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn pixel_format(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::R8 => glow::RED,
        PixelFormat::Rg8 => glow::RG,
        PixelFormat::Rgb8 => glow::RGB,
        PixelFormat::Rgba8 => glow::RGBA,
    }
}

fn create_failed(what: &'static str) -> impl FnOnce(String) -> RenderError {
    move |reason| RenderError::Create { what, reason }
}

impl GraphicsBackend for GlBackend {
    fn create_vertex_array(&mut self) -> RenderResult<VertexArrayId> {
        let native = unsafe { self.gl.create_vertex_array() }.map_err(create_failed("vertex array"))?;
        Ok(VertexArrayId(native.0))
    }

    fn bind_vertex_array(&mut self, id: Option<VertexArrayId>) -> RenderResult<()> {
        unsafe { self.gl.bind_vertex_array(id.map(vao)) };
        self.check("glBindVertexArray")
    }

    fn delete_vertex_array(&mut self, id: VertexArrayId) {
        unsafe { self.gl.delete_vertex_array(vao(id)) };
    }

    fn create_buffer(&mut self) -> RenderResult<BufferId> {
        let native = unsafe { self.gl.create_buffer() }.map_err(create_failed("buffer"))?;
        Ok(BufferId(native.0))
    }

    fn buffer_data(&mut self, target: BufferTarget, id: BufferId, data: &[u8]) -> RenderResult<()> {
        let target = buffer_target(target);
        unsafe { self.gl.bind_buffer(target, Some(buffer(id))) };
        self.check("glBindBuffer")?;
        unsafe { self.gl.buffer_data_u8_slice(target, data, glow::STATIC_DRAW) };
        self.check("glBufferData")
    }

    fn vertex_attrib_f32(&mut self, index: u32, components: i32) -> RenderResult<()> {
        let stride = components * std::mem::size_of::<f32>() as i32;
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, stride, 0)
        };
        self.check("glVertexAttribPointer")?;
        unsafe { self.gl.enable_vertex_attrib_array(index) };
        self.check("glEnableVertexAttribArray")
    }

    fn delete_buffer(&mut self, id: BufferId) {
        unsafe { self.gl.delete_buffer(buffer(id)) };
    }

    fn create_shader(&mut self, stage: ShaderStage, source: &str) -> RenderResult<ShaderId> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        let native = unsafe { self.gl.create_shader(kind) }.map_err(create_failed("shader"))?;
        unsafe {
            self.gl.shader_source(native, source);
            self.gl.compile_shader(native);
        }
        if let Err(err) = self.check("glCompileShader") {
            unsafe { self.gl.delete_shader(native) };
            return Err(err);
        }

        if !unsafe { self.gl.get_shader_compile_status(native) } {
            let log = unsafe { self.gl.get_shader_info_log(native) };
            unsafe { self.gl.delete_shader(native) };
            return Err(RenderError::ShaderCompile { stage, log });
        }
        Ok(ShaderId(native.0))
    }

    fn delete_shader(&mut self, id: ShaderId) {
        unsafe { self.gl.delete_shader(shader(id)) };
    }

    fn create_program(&mut self) -> RenderResult<ProgramId> {
        let native = unsafe { self.gl.create_program() }.map_err(create_failed("program"))?;
        Ok(ProgramId(native.0))
    }

    fn attach_shader(&mut self, prg: ProgramId, sh: ShaderId) -> RenderResult<()> {
        unsafe { self.gl.attach_shader(program(prg), shader(sh)) };
        self.check("glAttachShader")
    }

    fn bind_attrib_location(&mut self, prg: ProgramId, index: u32, name: &str) -> RenderResult<()> {
        unsafe { self.gl.bind_attrib_location(program(prg), index, name) };
        self.check("glBindAttribLocation")
    }

    fn link_program(&mut self, prg: ProgramId) -> RenderResult<()> {
        unsafe { self.gl.link_program(program(prg)) };
        self.check("glLinkProgram")?;
        if !unsafe { self.gl.get_program_link_status(program(prg)) } {
            let log = unsafe { self.gl.get_program_info_log(program(prg)) };
            return Err(RenderError::ProgramLink { log });
        }
        Ok(())
    }

    fn uniform_location(&mut self, prg: ProgramId, name: &str) -> RenderResult<Option<UniformLocation>> {
        let loc = unsafe { self.gl.get_uniform_location(program(prg), name) };
        self.check("glGetUniformLocation")?;
        Ok(loc.map(|l| UniformLocation(l.0)))
    }

    fn use_program(&mut self, prg: Option<ProgramId>) -> RenderResult<()> {
        unsafe { self.gl.use_program(prg.map(program)) };
        self.check("glUseProgram")
    }

    fn delete_program(&mut self, prg: ProgramId) {
        unsafe { self.gl.delete_program(program(prg)) };
    }

    fn uniform_matrix4(&mut self, loc: Option<UniformLocation>, value: &[f32; 16]) -> RenderResult<()> {
        let Some(loc) = location(loc) else {
            return Ok(());
        };
        unsafe { self.gl.uniform_matrix_4_f32_slice(Some(&loc), false, value) };
        self.check("glUniformMatrix4fv")
    }

    fn uniform_vec3(&mut self, loc: Option<UniformLocation>, value: [f32; 3]) -> RenderResult<()> {
        let Some(loc) = location(loc) else {
            return Ok(());
        };
        unsafe { self.gl.uniform_3_f32(Some(&loc), value[0], value[1], value[2]) };
        self.check("glUniform3f")
    }

    fn uniform_i32(&mut self, loc: Option<UniformLocation>, value: i32) -> RenderResult<()> {
        let Some(loc) = location(loc) else {
            return Ok(());
        };
        unsafe { self.gl.uniform_1_i32(Some(&loc), value) };
        self.check("glUniform1i")
    }

    fn create_texture(&mut self) -> RenderResult<TextureId> {
        let native = unsafe { self.gl.create_texture() }.map_err(create_failed("texture"))?;
        Ok(TextureId(native.0))
    }

    fn tex_image_2d(&mut self, id: TextureId, image: &ImageUpload<'_>) -> RenderResult<()> {
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture(id)));
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        }
        self.check("glBindTexture")?;
        unsafe {
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                pixel_format(image.internal_format) as i32,
                image.width.min(i32::MAX as u32) as i32,
                image.height.min(i32::MAX as u32) as i32,
                0,
                pixel_format(image.format),
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(image.pixels)),
            )
        };
        self.check("glTexImage2D")
    }

    fn generate_mipmap(&mut self, id: TextureId) -> RenderResult<()> {
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture(id)));
            self.gl.generate_mipmap(glow::TEXTURE_2D);
        }
        self.check("glGenerateMipmap")
    }

    fn tex_parameter(&mut self, id: TextureId, param: TextureParam) -> RenderResult<()> {
        let wrap = |w: TextureWrap| match w {
            TextureWrap::Repeat => glow::REPEAT,
            TextureWrap::ClampToEdge => glow::CLAMP_TO_EDGE,
        };
        let filter = |f: TextureFilter| match f {
            TextureFilter::Nearest => glow::NEAREST,
            TextureFilter::Linear => glow::LINEAR,
            TextureFilter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
        };
        let (name, value) = match param {
            TextureParam::WrapS(w) => (glow::TEXTURE_WRAP_S, wrap(w)),
            TextureParam::WrapT(w) => (glow::TEXTURE_WRAP_T, wrap(w)),
            TextureParam::MinFilter(f) => (glow::TEXTURE_MIN_FILTER, filter(f)),
            TextureParam::MagFilter(f) => (glow::TEXTURE_MAG_FILTER, filter(f)),
        };
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture(id)));
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, name, value as i32);
        }
        self.check("glTexParameteri")
    }

    fn bind_texture(&mut self, unit: u32, id: Option<TextureId>) -> RenderResult<()> {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, id.map(texture));
        }
        self.check("glBindTexture")
    }

    fn delete_texture(&mut self, id: TextureId) {
        unsafe { self.gl.delete_texture(texture(id)) };
    }

    fn draw_arrays(&mut self, vertex_count: i32) -> RenderResult<()> {
        unsafe { self.gl.draw_arrays(glow::TRIANGLES, 0, vertex_count) };
        self.check("glDrawArrays")
    }

    fn draw_elements(&mut self, index_count: i32) -> RenderResult<()> {
        unsafe {
            self.gl
                .draw_elements(glow::TRIANGLES, index_count, glow::UNSIGNED_INT, 0)
        };
        self.check("glDrawElements")
    }

    fn polygon_mode(&mut self, fill: bool) -> RenderResult<()> {
        let mode = if fill { glow::FILL } else { glow::LINE };
        unsafe { self.gl.polygon_mode(glow::FRONT_AND_BACK, mode) };
        self.check("glPolygonMode")
    }

    fn viewport(&mut self, width: u32, height: u32) -> RenderResult<()> {
        unsafe {
            self.gl.viewport(
                0,
                0,
                width.min(i32::MAX as u32) as i32,
                height.min(i32::MAX as u32) as i32,
            )
        };
        self.check("glViewport")
    }

    fn clear(&mut self, color: [f32; 4]) -> RenderResult<()> {
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
        self.check("glClear")
    }
}
