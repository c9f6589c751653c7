//! Shader program builder and the fixed uniform table.

use crate::backend::{GraphicsBackend, ProgramId, ShaderId, ShaderStage, UniformLocation};
use crate::error::{RenderError, RenderResult};

pub const DEFAULT_VERTEX_SHADER: &str = include_str!("shaders/default.vert");
pub const DEFAULT_FRAGMENT_SHADER: &str = include_str!("shaders/default.frag");

/// Attribute slots bound by name before linking.
pub mod attrib {
    pub const POSITION: u32 = 0;
    pub const UV: u32 = 1;
    /// Not bound by name; shaders that read normals declare the location.
    pub const NORMAL: u32 = 2;

    pub const POSITION_NAME: &str = "position";
    pub const UV_NAME: &str = "uv";
}

/// Uniforms every program is queried for after linking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Uniform {
    Model,
    View,
    Projection,
    DiffuseColor,
    DiffuseTexture,
    DiffuseTextureProvided,
}

impl Uniform {
    pub const COUNT: usize = 6;

    pub const ALL: [Uniform; Uniform::COUNT] = [
        Uniform::Model,
        Uniform::View,
        Uniform::Projection,
        Uniform::DiffuseColor,
        Uniform::DiffuseTexture,
        Uniform::DiffuseTextureProvided,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Uniform::Model => "model",
            Uniform::View => "view",
            Uniform::Projection => "projection",
            Uniform::DiffuseColor => "diffuse_color",
            Uniform::DiffuseTexture => "diffuse_tex",
            Uniform::DiffuseTextureProvided => "diffuse_tex_provided",
        }
    }
}

/// A linked program plus its cached uniform locations.
#[derive(Debug, PartialEq, Eq)]
pub struct ShaderProgram {
    id: ProgramId,
    uniforms: [Option<UniformLocation>; Uniform::COUNT],
}

impl ShaderProgram {
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// `None` when the program has no active uniform of that name.
    pub fn location(&self, uniform: Uniform) -> Option<UniformLocation> {
        self.uniforms[uniform as usize]
    }

    pub fn has(&self, uniform: Uniform) -> bool {
        self.location(uniform).is_some()
    }

    pub fn destroy(self, gfx: &mut dyn GraphicsBackend) {
        gfx.delete_program(self.id);
    }
}

/// Collects compiled stages, then links them once.
#[derive(Debug, Default)]
pub struct ShaderProgramBuilder {
    stages: Vec<ShaderId>,
}

impl ShaderProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder for the bundled flat-colour/diffuse-texture program.
    pub fn with_default_sources(gfx: &mut dyn GraphicsBackend) -> RenderResult<Self> {
        let mut builder = Self::new();
        builder.add_shader(gfx, DEFAULT_VERTEX_SHADER, ShaderStage::Vertex)?;
        builder.add_shader(gfx, DEFAULT_FRAGMENT_SHADER, ShaderStage::Fragment)?;
        Ok(builder)
    }

    pub fn add_shader(
        &mut self,
        gfx: &mut dyn GraphicsBackend,
        source: &str,
        stage: ShaderStage,
    ) -> RenderResult<&mut Self> {
        match gfx.create_shader(stage, source) {
            Ok(shader) => {
                self.stages.push(shader);
                Ok(self)
            }
            Err(err) => {
                log::error!("{err}");
                self.discard(gfx);
                Err(err)
            }
        }
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Links the collected stages. The stages are deleted whether or not
    /// linking succeeds.
    pub fn build(mut self, gfx: &mut dyn GraphicsBackend) -> RenderResult<ShaderProgram> {
        if self.stage_count() == 0 {
            let err = RenderError::ProgramLink {
                log: "no shader stages attached".to_string(),
            };
            log::error!("{err}");
            return Err(err);
        }

        let id = match gfx.create_program() {
            Ok(id) => id,
            Err(err) => {
                log::error!("{err}");
                self.discard(gfx);
                return Err(err);
            }
        };
        let stages = std::mem::take(&mut self.stages);

        let linked = link(gfx, id, &stages);

        for shader in stages {
            gfx.delete_shader(shader);
        }

        match linked {
            Ok(uniforms) => {
                log::info!(
                    "Linked shader program {:?} ({} of {} uniforms active)",
                    id,
                    uniforms.iter().filter(|u| u.is_some()).count(),
                    Uniform::COUNT
                );
                Ok(ShaderProgram { id, uniforms })
            }
            Err(err) => {
                log::error!("{err}");
                gfx.delete_program(id);
                Err(err)
            }
        }
    }

    fn discard(&mut self, gfx: &mut dyn GraphicsBackend) {
        for shader in self.stages.drain(..) {
            gfx.delete_shader(shader);
        }
    }
}

fn link(
    gfx: &mut dyn GraphicsBackend,
    id: ProgramId,
    stages: &[ShaderId],
) -> RenderResult<[Option<UniformLocation>; Uniform::COUNT]> {
    for &shader in stages {
        gfx.attach_shader(id, shader)?;
    }
    gfx.bind_attrib_location(id, attrib::POSITION, attrib::POSITION_NAME)?;
    gfx.bind_attrib_location(id, attrib::UV, attrib::UV_NAME)?;
    gfx.link_program(id)?;

    let mut uniforms = [None; Uniform::COUNT];
    for uniform in Uniform::ALL {
        uniforms[uniform as usize] = gfx.uniform_location(id, uniform.name())?;
    }
    Ok(uniforms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Call, RecordingBackend};

    #[test]
    fn default_program_resolves_every_uniform() {
        let mut gfx = RecordingBackend::new();
        let program = ShaderProgramBuilder::with_default_sources(&mut gfx)
            .unwrap()
            .build(&mut gfx)
            .unwrap();

        for uniform in Uniform::ALL {
            assert!(program.has(uniform), "{} unresolved", uniform.name());
        }
    }

    #[test]
    fn omitted_uniforms_resolve_to_none() {
        let vert = "#version 330 core\nin vec3 position;\nuniform mat4 model;\nvoid main() { gl_Position = model * vec4(position, 1.0); }";
        let frag = "#version 330 core\nuniform vec3 diffuse_color;\nout vec4 c;\nvoid main() { c = vec4(diffuse_color, 1.0); }";

        let mut gfx = RecordingBackend::new();
        let mut builder = ShaderProgramBuilder::new();
        builder.add_shader(&mut gfx, vert, ShaderStage::Vertex).unwrap();
        builder.add_shader(&mut gfx, frag, ShaderStage::Fragment).unwrap();
        let program = builder.build(&mut gfx).unwrap();

        assert!(program.has(Uniform::Model));
        assert!(program.has(Uniform::DiffuseColor));
        assert_eq!(program.location(Uniform::View), None);
        assert_eq!(program.location(Uniform::Projection), None);
        assert_eq!(program.location(Uniform::DiffuseTexture), None);
        assert_eq!(program.location(Uniform::DiffuseTextureProvided), None);
    }

    #[test]
    fn compile_failure_is_reported() {
        let mut gfx = RecordingBackend::new();
        let mut builder = ShaderProgramBuilder::new();
        let err = builder
            .add_shader(&mut gfx, "not glsl", ShaderStage::Fragment)
            .unwrap_err();
        assert!(matches!(err, RenderError::ShaderCompile { stage: ShaderStage::Fragment, .. }));
        assert_eq!(gfx.live_objects(), 0);
    }

    #[test]
    fn stages_are_deleted_after_link() {
        let mut gfx = RecordingBackend::new();
        let builder = ShaderProgramBuilder::with_default_sources(&mut gfx).unwrap();
        assert_eq!(builder.stage_count(), 2);
        let program = builder.build(&mut gfx).unwrap();

        let deleted = gfx
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::DeleteShader(_)))
            .count();
        assert_eq!(deleted, 2);
        assert_eq!(gfx.live_objects(), 1);

        let binds: Vec<_> = gfx
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::BindAttribLocation { location, name, .. } => Some((*location, name.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(binds, [(0, "position"), (1, "uv")]);

        program.destroy(&mut gfx);
        assert_eq!(gfx.live_objects(), 0);
    }

    #[test]
    fn link_without_stages_fails() {
        let mut gfx = RecordingBackend::new();
        let err = ShaderProgramBuilder::new().build(&mut gfx).unwrap_err();
        assert!(matches!(err, RenderError::ProgramLink { .. }));
        assert!(gfx.calls().is_empty());
    }

    #[test]
    fn stages_are_released_when_program_creation_fails() {
        let mut gfx = RecordingBackend::new();
        let builder = ShaderProgramBuilder::with_default_sources(&mut gfx).unwrap();
        gfx.set_object_limit(Some(2));

        let err = builder.build(&mut gfx).unwrap_err();
        assert!(matches!(err, RenderError::Create { what: "program", .. }));
        assert_eq!(gfx.live_objects(), 0);
    }
}
