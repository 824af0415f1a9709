use std::{io, path::PathBuf};

use thiserror::Error;

use super::StageKind;

/// Failures while building a [`ShaderProgram`](super::ShaderProgram).
///
/// None of these are transient, so callers should never retry a load that returned one.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ShaderError {
    /// A source file could not be opened or read.
    #[error("Failed to read {stage} shader source '{}': {source}", path.display())]
    FileRead {
        stage: StageKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The driver's compiler rejected one stage.
    #[error("Failed to compile {stage} shader:\n{log}")]
    Compile { stage: StageKind, log: String },

    /// The driver's linker rejected the vertex/fragment pair.
    #[error("Failed to link shader program:\n{log}")]
    Link { log: String },

    /// The driver could not allocate a shader or program object.
    #[error("Driver failed to create object: {0}")]
    Driver(String),
}

impl ShaderError {
    /// The stage this error is tagged with, if it belongs to a single stage.
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            Self::FileRead { stage, .. } | Self::Compile { stage, .. } => Some(*stage),
            Self::Link { .. } | Self::Driver(_) => None,
        }
    }
}
