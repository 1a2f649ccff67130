//! HTML to DOCX export.
//!
//! One export call owns one [`MathContext`]: the HTML walker registers a
//! placeholder per converted formula, the document is serialized, and the
//! placeholders are spliced out for OMML before packaging.

use crate::config::{ConfigError, ExportOptions};
use crate::formula::{MathContext, MathConverter};
use crate::html::{self, MathStats};
use crate::ooxml::OoxmlError;
use crate::ooxml::docx::DocxPackage;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Error, Debug)]
pub enum ExportError {
    /// Input could not be read as HTML text
    #[error("HTML input error: {0}")]
    Html(String),

    #[error(transparent)]
    Ooxml(#[from] OoxmlError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What happened to the math of one export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub math: MathStats,
    /// Placeholders replaced by OMML
    pub spliced: usize,
    /// Placeholders left as literal text
    pub splice_skipped: usize,
    pub paragraphs: usize,
}

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    /// The .docx file contents
    pub package: Vec<u8>,
    /// `word/document.xml` after math splicing
    pub document_xml: String,
    pub report: ExportReport,
}

/// Converts rendered HTML into a Word package with native equations.
///
/// # Examples
///
/// ```rust,no_run
/// use mathdocx::{DocxExporter, ExportOptions};
///
/// let exporter = DocxExporter::new(ExportOptions::default());
/// let output = exporter.export_html("<p>Euler: <math><mi>e</mi></math></p>")?;
/// std::fs::write("out.docx", &output.package)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct DocxExporter {
    options: ExportOptions,
    converter: MathConverter,
}

impl Default for DocxExporter {
    fn default() -> Self {
        Self::new(ExportOptions::default())
    }
}

impl DocxExporter {
    pub fn new(options: ExportOptions) -> Self {
        let converter = MathConverter::from_options(&options);
        Self { options, converter }
    }

    /// Use a custom math converter; options that configure conversion are
    /// then the caller's business.
    pub fn with_converter(mut self, converter: MathConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Convert an HTML string into a .docx package.
    pub fn export_html(&self, html: &str) -> Result<ExportOutput> {
        let mut context = MathContext::new();
        let (doc, math) = html::build_document(html, &self.converter, &self.options, &mut context)?;

        let mut package = DocxPackage::from_document(&doc)?;
        let (spliced, splice_skipped) = package.apply_math(context.replacements());

        let report = ExportReport {
            math,
            spliced,
            splice_skipped,
            paragraphs: doc.paragraph_count(),
        };
        info!(
            target: "export",
            op = "export_html",
            paragraphs = report.paragraphs,
            math = math.elements,
            converted = math.converted(),
            fallbacks = math.fallbacks,
            spliced,
            splice_skipped,
            "export finished"
        );

        Ok(ExportOutput {
            package: package.to_bytes()?,
            document_xml: package.document_xml().to_string(),
            report,
        })
    }

    /// Convert an HTML file.
    pub fn export_html_file<P: AsRef<Path>>(&self, path: P) -> Result<ExportOutput> {
        let bytes = std::fs::read(path.as_ref())?;
        let html = String::from_utf8(bytes)
            .map_err(|e| ExportError::Html(format!("{}: {e}", path.as_ref().display())))?;
        self.export_html(&html)
    }

    /// Convert HTML and write the package to `path`.
    pub fn write_html_to<P: AsRef<Path>>(&self, html: &str, path: P) -> Result<ExportReport> {
        let output = self.export_html(html)?;
        std::fs::write(path, &output.package)?;
        Ok(output.report)
    }
}
