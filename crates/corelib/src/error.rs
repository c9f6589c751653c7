//! Contract violations detected by the math and composition layer.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("cannot normalize a zero-length vector")]
    DegenerateVector,

    #[error("mesh {mesh} is mapped to material {index}, but only {materials} materials exist")]
    MaterialIndexOutOfRange {
        mesh: usize,
        index: usize,
        materials: usize,
    },

    #[error("mesh-to-material map has {mapping} entries for {meshes} meshes")]
    MappingLengthMismatch { meshes: usize, mapping: usize },
}

pub type CoreResult<T> = Result<T, CoreError>;
