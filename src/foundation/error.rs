use std::path::PathBuf;

use crate::engine::LoadErrorKind;

pub type SheetResult<T> = Result<T, SheetError>;

/// Stage of the bake loop that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RasterStage {
    Attach,
    Seek,
    Draw,
    Sync,
}

impl std::fmt::Display for RasterStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Attach => "attach",
            Self::Seek => "seek",
            Self::Draw => "draw",
            Self::Sync => "sync",
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SheetError {
    #[error("document parse error at line {line}, column {column}: {message}")]
    DocumentParse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("unrecognized document: {reason}")]
    UnrecognizedFormat { reason: String },

    #[error("engine load error ({kind}): {message}")]
    EngineLoad {
        kind: LoadErrorKind,
        message: String,
    },

    #[error("rasterization error during {stage} on {width}x{height} surface: {message}")]
    Rasterization {
        stage: RasterStage,
        width: u32,
        height: u32,
        message: String,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("io error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SheetError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unrecognized(reason: impl Into<String>) -> Self {
        Self::UnrecognizedFormat {
            reason: reason.into(),
        }
    }

    pub fn rasterization(
        stage: RasterStage,
        (width, height): (u32, u32),
        msg: impl Into<String>,
    ) -> Self {
        Self::Rasterization {
            stage,
            width,
            height,
            message: msg.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for SheetError {
    fn from(err: serde_json::Error) -> Self {
        Self::DocumentParse {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}
