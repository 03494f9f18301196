use std::path::PathBuf;

use thiserror::Error;

use super::StageKind;

/// Shader failures. All of them are fatal for the demo.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("couldn't find the shader file {}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `log` carries the full compiler diagnostic, rendered against the source.
    #[error("failed to compile {stage} shader {}:\n{log}", .path.display())]
    Compile {
        stage: StageKind,
        path: PathBuf,
        log: String,
    },

    #[error("failed to link shader program: {reason}")]
    Link { reason: String },
}

impl ShaderError {
    pub(crate) fn link(reason: impl Into<String>) -> Self {
        Self::Link { reason: reason.into() }
    }
}
