//! Mapping assembly and file rendering
//!
//! The loader owns the variable mapping an interpolation pass runs
//! against: a snapshot of the process environment, optionally overlaid
//! with a YAML env file (`KEY: value` scalars) and a set of
//! caller-supplied reserved variables. The snapshot is taken once at
//! construction so repeated renders are reproducible even if the
//! process environment changes concurrently.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::interpolator::{Interpolator, Mapping};

/// Options controlling mapping assembly and rendering
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// YAML file of additional variables (`KEY: value` scalars)
    pub env_file: Option<PathBuf>,
    /// Leave references whose name starts with this prefix untouched,
    /// for a later resolution pass
    pub keep_prefix: Option<String>,
    /// Framework-provided variables; these win over the environment
    /// and the env file
    pub reserved: Mapping,
}

/// Renders configuration text against an assembled mapping
#[derive(Debug)]
pub struct Loader {
    keep_prefix: Option<String>,
    mapping: Mapping,
}

impl Loader {
    /// Create a loader over a snapshot of the process environment
    pub fn new(options: LoaderOptions) -> Result<Self> {
        let env = std::env::vars().collect();
        Self::with_env(options, env)
    }

    /// Create a loader over an explicit base environment
    pub fn with_env(options: LoaderOptions, env: Mapping) -> Result<Self> {
        let mut mapping = env;
        log::debug!("base environment holds {} variables", mapping.len());

        // Overlay order: env file beats the environment, reserved
        // variables beat both
        if let Some(path) = &options.env_file {
            let overlay = read_env_file(path)?;
            log::debug!("{} defines {} variables", path.display(), overlay.len());
            for (key, value) in overlay {
                log::trace!("env file sets {}", key);
                mapping.insert(key, value);
            }
        }
        for (key, value) in &options.reserved {
            log::trace!("reserved variable {}", key);
            mapping.insert(key.clone(), value.clone());
        }

        Ok(Self {
            keep_prefix: options.keep_prefix,
            mapping,
        })
    }

    /// The assembled mapping
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Resolve every reference in `text`
    pub fn render_str(&self, text: &str) -> Result<String> {
        let mut interpolator = Interpolator::new(&self.mapping);
        if let Some(prefix) = &self.keep_prefix {
            interpolator = interpolator.with_keep_prefix(prefix.clone());
        }
        interpolator.interpolate(text)
    }

    /// Read a file and resolve every reference in it
    pub fn render_file(&self, path: &Path) -> Result<String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("failed to read {}: {}", path.display(), e)))?;
        self.render_str(&text)
            .map_err(|e| e.with_source_file(path.display().to_string()))
    }

    /// Read, resolve, and parse a file as a YAML document
    pub fn render_value(&self, path: &Path) -> Result<serde_yaml::Value> {
        let rendered = self.render_file(path)?;
        serde_yaml::from_str(&rendered).map_err(|e| {
            Error::parse(e.to_string()).with_source_file(path.display().to_string())
        })
    }
}

/// Read a YAML env file into a mapping of string variables
///
/// Scalar values are stringified the way they are written (`8080`,
/// `true`); null becomes the empty string. Nested values are an error.
fn read_env_file(path: &Path) -> Result<Mapping> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::io(format!("failed to read {}: {}", path.display(), e)))?;

    if text.trim().is_empty() {
        return Ok(Mapping::new());
    }

    let doc: IndexMap<String, serde_yaml::Value> = serde_yaml::from_str(&text)
        .map_err(|e| Error::env_file(e.to_string()).with_source_file(path.display().to_string()))?;

    let mut vars = Mapping::new();
    for (key, value) in doc {
        let value = scalar_to_string(&value).ok_or_else(|| {
            Error::env_file(format!("variable '{}' is not a scalar", key))
                .with_source_file(path.display().to_string())
        })?;
        vars.insert(key, value);
    }

    Ok(vars)
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Null => Some(String::new()),
        _ => None,
    }
}
