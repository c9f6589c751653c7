use corelib::CoreError;
use thiserror::Error;

use crate::backend::ShaderStage;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{call} failed with GL error 0x{code:04X}")]
    Backend { call: &'static str, code: u32 },

    #[error("failed to create {what}: {reason}")]
    Create { what: &'static str, reason: String },

    #[error("{stage:?} shader compilation failed: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("shader program link failed: {log}")]
    ProgramLink { log: String },

    #[error("mesh has no vertex positions")]
    EmptyVertexBuffer,

    #[error(transparent)]
    Contract(#[from] CoreError),

    #[error(transparent)]
    Asset(#[from] anyhow::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;
