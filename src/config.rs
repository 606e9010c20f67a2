//! TOML configuration file support.
//!
//! Settings shared by all commands can live in a file instead of flags:
//!
//! ```toml
//! # pmtraces.toml
//! [pipeline]
//! encoding = "latin1"
//! sort = true
//! param = "sweep/Rel. Sweep Time"
//! ```
//!
//! Command-line flags take precedence over the file, the file over built-in
//! defaults. An empty `param` disables the parameter column.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::loader::MetadataEncoding;
use crate::data::model::ParamPath;

/// Root configuration structure.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Settings of the batch pipeline.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Text encoding of every `.json` sidecar.
    pub encoding: Option<MetadataEncoding>,

    /// Sort traces by name fields before processing.
    pub sort: Option<bool>,

    /// `/`-separated path of the value printed next to each mean.
    pub param: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

impl PipelineConfig {
    pub fn encoding(&self, flag: Option<MetadataEncoding>) -> MetadataEncoding {
        flag.or(self.encoding).unwrap_or_default()
    }

    pub fn sort(&self, no_sort_flag: bool) -> bool {
        !no_sort_flag && self.sort.unwrap_or(true)
    }

    pub fn param(&self, flag: Option<&str>, no_param_flag: bool) -> Option<ParamPath> {
        if no_param_flag {
            return None;
        }
        match flag.or(self.param.as_deref()) {
            Some("") => None,
            Some(path) => Some(ParamPath::parse(path)),
            None => Some(ParamPath::default()),
        }
    }
}
