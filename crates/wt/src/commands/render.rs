//! Render command implementation.

use std::time::Instant;

use clap::Args;

use super::CommonArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    #[command(flatten)]
    pub(crate) common: CommonArgs,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// Every file is compiled before anything is written, so a failure in one
    /// file produces no output at all.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid, a file cannot be read,
    /// or a document fails to compile.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let compiler = self.common.build_compiler()?;
        let sources = self.common.read_sources()?;

        let start = Instant::now();
        let mut rendered = Vec::with_capacity(sources.len());
        for (path, result) in self.common.files.iter().zip(compiler.compile_many(&sources)) {
            let doc = result.map_err(|source| CliError::Render {
                path: path.clone(),
                source,
            })?;
            rendered.push((path, doc.output));
        }
        tracing::info!(
            files = rendered.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Rendered documents"
        );

        let many = rendered.len() > 1;
        for (path, html) in &rendered {
            if many {
                write_result(&output, path, &format!("<!-- {} -->", path.display()))?;
            }
            write_result(&output, path, html)?;
        }

        if many {
            output.success(&format!("Rendered {} files", rendered.len()));
        }
        Ok(())
    }
}

fn write_result(output: &Output, path: &std::path::Path, text: &str) -> Result<(), CliError> {
    output.result(text).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}
