//! Configuration management for wt.
//!
//! Parses `wt.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `links.view_url`
//! - `links.new_url`
//! - `site.scheme`
//! - `site.domain`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use wt_compiler::{LinkConfig, NewTextPosition, RuleSet};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the existing-page URL.
    pub view_url: Option<String>,
    /// Override the create-page URL.
    pub new_url: Option<String>,
    /// Override the cross-site domain.
    pub domain: Option<String>,
    /// Override the nesting pass bound.
    pub max_passes: Option<usize>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "wt.toml";

/// Upper bound accepted for `parser.max_passes`.
const MAX_PASSES_LIMIT: usize = 64;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Wiki-link rendering.
    pub links: LinksConfig,
    /// Cross-site link target.
    pub site: SiteConfig,
    /// Rule engine settings.
    pub parser: ParserConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// `[links]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    /// URL of existing pages: template with `%s` or prefix.
    pub view_url: String,
    /// URL of the create-page form. Missing pages render as text without it.
    pub new_url: Option<String>,
    /// Label of the create-page marker.
    pub new_text: String,
    /// Marker position: `before`, `after` or `none`.
    pub new_text_pos: NewTextPosition,
    /// CSS class of links to existing pages.
    pub css: Option<String>,
    /// CSS class of create-page links.
    pub css_new: Option<String>,
    /// Pages known to exist when no page index is given.
    pub allow_list: Option<Vec<String>>,
}

impl Default for LinksConfig {
    fn default() -> Self {
        let defaults = LinkConfig::default();
        Self {
            view_url: defaults.view_url,
            new_url: defaults.new_url,
            new_text: defaults.new_text,
            new_text_pos: defaults.new_text_pos,
            css: defaults.css,
            css_new: defaults.css_new,
            allow_list: defaults.allow_list,
        }
    }
}

/// `[site]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Scheme of cross-site links.
    pub scheme: String,
    /// Domain that site names are prefixed to.
    pub domain: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let defaults = LinkConfig::default();
        Self {
            scheme: defaults.site_scheme,
            domain: defaults.site_domain,
        }
    }
}

/// `[parser]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Pass bound for nesting rules.
    pub max_passes: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_passes: wt_compiler::rules::DEFAULT_MAX_PASSES,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.domain`").
        field: String,
        /// Error message (e.g., "${`WT_DOMAIN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL setting to contain at most one `%s` slot.
fn require_url_template(value: &str, field: &str) -> Result<(), ConfigError> {
    let slots = value.matches("%s").count();
    if slots > 1 {
        return Err(ConfigError::Validation(format!(
            "{field} may contain at most one %s, found {slots}"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `wt.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values. The result is validated again
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or a value is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_config(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(view_url) = &settings.view_url {
            self.links.view_url.clone_from(view_url);
        }
        if let Some(new_url) = &settings.new_url {
            self.links.new_url = Some(new_url.clone());
        }
        if let Some(domain) = &settings.domain {
            self.site.domain.clone_from(domain);
        }
        if let Some(max_passes) = settings.max_passes {
            self.parser.max_passes = max_passes;
        }
    }

    /// Search for config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_links()?;
        self.validate_site()?;
        self.validate_parser()?;
        Ok(())
    }

    fn validate_links(&self) -> Result<(), ConfigError> {
        require_url_template(&self.links.view_url, "links.view_url")?;
        if let Some(new_url) = &self.links.new_url {
            require_url_template(new_url, "links.new_url")?;
        }
        Ok(())
    }

    fn validate_site(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.site.scheme, "site.scheme")?;
        require_non_empty(&self.site.domain, "site.domain")?;
        Ok(())
    }

    fn validate_parser(&self) -> Result<(), ConfigError> {
        let passes = self.parser.max_passes;
        if passes == 0 || passes > MAX_PASSES_LIMIT {
            return Err(ConfigError::Validation(format!(
                "parser.max_passes must be between 1 and {MAX_PASSES_LIMIT}, got {passes}"
            )));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.links.view_url = expand::expand_env(&self.links.view_url, "links.view_url")?;
        if let Some(ref url) = self.links.new_url {
            self.links.new_url = Some(expand::expand_env(url, "links.new_url")?);
        }
        self.site.scheme = expand::expand_env(&self.site.scheme, "site.scheme")?;
        self.site.domain = expand::expand_env(&self.site.domain, "site.domain")?;
        Ok(())
    }

    /// Settings of the wiki-link renderer.
    #[must_use]
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            view_url: self.links.view_url.clone(),
            new_url: self.links.new_url.clone(),
            new_text: self.links.new_text.clone(),
            new_text_pos: self.links.new_text_pos,
            css: self.links.css.clone(),
            css_new: self.links.css_new.clone(),
            allow_list: self.links.allow_list.clone(),
            site_scheme: self.site.scheme.clone(),
            site_domain: self.site.domain.clone(),
        }
    }

    /// Standard rule set with the configured pass bound.
    #[must_use]
    pub fn rule_set(&self) -> RuleSet {
        RuleSet::standard().with_max_passes(self.parser.max_passes)
    }
}
