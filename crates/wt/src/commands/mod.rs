//! CLI command implementations.

mod links;
mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use wt_compiler::{Compiler, ExistenceResolver, LinkCapabilities};
use wt_config::{CliSettings, Config};

use crate::error::CliError;
use crate::pages::PageIndex;

pub(crate) use links::LinksArgs;
pub(crate) use render::RenderArgs;

/// Arguments shared by all commands.
#[derive(Args)]
pub(crate) struct CommonArgs {
    /// Wikitext files to compile.
    #[arg(required = true)]
    pub(crate) files: Vec<PathBuf>,

    /// Path to configuration file (default: auto-discover wt.toml).
    #[arg(short, long)]
    pub(crate) config: Option<PathBuf>,

    /// Page index file: one page per line, optionally `name | Title`.
    #[arg(short, long, env = "WT_PAGES")]
    pub(crate) pages: Option<PathBuf>,

    /// Override the URL of existing pages.
    #[arg(long)]
    pub(crate) view_url: Option<String>,

    /// Override the URL of the create-page form.
    #[arg(long)]
    pub(crate) new_url: Option<String>,

    /// Override the domain of cross-site links.
    #[arg(long)]
    pub(crate) domain: Option<String>,

    /// Override the bound on nesting passes.
    #[arg(long)]
    pub(crate) max_passes: Option<usize>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl CommonArgs {
    /// Load configuration with CLI overrides applied.
    fn load_config(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            view_url: self.view_url.clone(),
            new_url: self.new_url.clone(),
            domain: self.domain.clone(),
            max_passes: self.max_passes,
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }

    /// Build an HTML compiler from configuration and the optional page index.
    pub(crate) fn build_compiler(&self) -> Result<Compiler, CliError> {
        let config = self.load_config()?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Using configuration");
        }

        let mut capabilities = LinkCapabilities::new();
        if let Some(path) = &self.pages {
            let index = Arc::new(PageIndex::load(path)?);
            capabilities = capabilities
                .with_resolver(Arc::clone(&index) as Arc<dyn ExistenceResolver>)
                .with_title_lookup(index);
        }

        Ok(Compiler::html(
            config.rule_set(),
            &config.link_config(),
            capabilities,
        )?)
    }

    /// Read every input file, failing on the first unreadable one.
    pub(crate) fn read_sources(&self) -> Result<Vec<String>, CliError> {
        self.files.iter().map(|path| read_source(path)).collect()
    }
}

fn read_source(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}
