//! Configuration options for HTML to DOCX export.

use crate::ooxml::docx::writer::CODE_FONT;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading export options.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid YAML options: {0}")]
    Yaml(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Options controlling how math and text are exported.
///
/// # Examples
///
/// ```rust
/// use mathdocx::ExportOptions;
///
/// let options = ExportOptions::new()
///     .with_prefer_regeneration_for_matrices(false)
///     .with_disabled_rule("brace-matrix")
///     .with_fallback_font("Courier New");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Try MathML regenerated from LaTeX before embedded MathML when the
    /// LaTeX contains a matrix-like environment
    pub prefer_regeneration_for_matrices: bool,
    /// Retry conversion once with fence operators stripped
    pub retry_without_fences: bool,
    /// Repair passes to skip, by name
    pub disabled_rules: Vec<String>,
    /// Monospace font for math that falls back to literal LaTeX
    pub fallback_font: String,
    /// Center paragraphs holding display math
    pub center_display_math: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            prefer_regeneration_for_matrices: true,
            retry_without_fences: true,
            disabled_rules: Vec::new(),
            fallback_font: CODE_FONT.to_string(),
            center_display_math: true,
        }
    }
}

impl ExportOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from YAML. Missing keys keep their defaults.
    ///
    /// ```rust
    /// use mathdocx::ExportOptions;
    ///
    /// let options = ExportOptions::from_yaml_str("retry_without_fences: false\n").unwrap();
    /// assert!(!options.retry_without_fences);
    /// assert!(options.prefer_regeneration_for_matrices);
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_saphyr::from_str(yaml).map_err(|e| ConfigError::Yaml(e.to_string()))
    }

    /// Load options from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    #[inline]
    pub fn with_prefer_regeneration_for_matrices(mut self, prefer: bool) -> Self {
        self.prefer_regeneration_for_matrices = prefer;
        self
    }

    #[inline]
    pub fn with_retry_without_fences(mut self, retry: bool) -> Self {
        self.retry_without_fences = retry;
        self
    }

    /// Skip the repair pass with this name.
    #[inline]
    pub fn with_disabled_rule(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.disabled_rules.contains(&name) {
            self.disabled_rules.push(name);
        }
        self
    }

    #[inline]
    pub fn with_fallback_font(mut self, font: impl Into<String>) -> Self {
        self.fallback_font = font.into();
        self
    }

    #[inline]
    pub fn with_center_display_math(mut self, center: bool) -> Self {
        self.center_display_math = center;
        self
    }
}
