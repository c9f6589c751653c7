//! Immediate-mode renderer over OpenGL 3.3 core.
//!
//! GPU work goes through [`GraphicsBackend`]: [`GlBackend`] drives a real
//! context via `glow`, [`RecordingBackend`] records calls for headless
//! runs. Frame state lives in a [`RenderContext`] passed to every draw.

pub mod backend;
pub mod context;
pub mod defaults;
pub mod error;
pub mod material;
pub mod mesh;
pub mod model;
pub mod shader;
pub mod texture;

pub use backend::{GlBackend, GraphicsBackend, RecordingBackend};
pub use context::RenderContext;
pub use defaults::Defaults;
pub use error::{RenderError, RenderResult};
pub use material::{Material, TextureSlots};
pub use mesh::Mesh;
pub use model::Model;
pub use shader::{ShaderProgram, ShaderProgramBuilder, Uniform};
pub use texture::{Texture, TextureKind};
