//! Links command implementation.

use clap::Args;
use wt_compiler::RenderContext;

use super::CommonArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the links command.
#[derive(Args)]
pub(crate) struct LinksArgs {
    #[command(flatten)]
    pub(crate) common: CommonArgs,

    /// Print the page list as a JSON array.
    #[arg(long)]
    json: bool,
}

impl LinksArgs {
    /// Execute the links command.
    ///
    /// Prints the sorted, de-duplicated local pages linked from all files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid, a file cannot be read,
    /// or a document fails to compile.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let compiler = self.common.build_compiler()?;
        let sources = self.common.read_sources()?;

        let mut context = RenderContext::new();
        for (path, result) in self.common.files.iter().zip(compiler.compile_many(&sources)) {
            let doc = result.map_err(|source| CliError::Render {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(
                path = %path.display(),
                links = doc.context.internal_links().len(),
                "Collected links"
            );
            context.merge(doc.context);
        }

        let pages = context.into_internal_links();
        let io_error = |source| CliError::Io {
            path: "<stdout>".into(),
            source,
        };
        if self.json {
            let pages: Vec<&String> = pages.iter().collect();
            output
                .result(&serde_json::to_string_pretty(&pages)?)
                .map_err(io_error)?;
        } else {
            for page in &pages {
                output.result(page).map_err(io_error)?;
            }
            output.note(&format!("{} linked pages", pages.len()));
        }
        Ok(())
    }
}
