//! CLI error types.

use std::path::PathBuf;

use wt_compiler::RenderError;
use wt_config::ConfigError;

use crate::pages::PageIndexError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Compiler(#[from] wt_compiler::ConfigError),

    #[error("{0}")]
    Pages(#[from] PageIndexError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: RenderError,
    },

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
