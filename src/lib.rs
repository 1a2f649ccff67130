//! mathdocx - KaTeX-rendered HTML to Word documents with native equations
//!
//! Browser-rendered math (KaTeX HTML with embedded MathML and the LaTeX
//! source as an annotation) is converted into Office Math Markup (OMML) and
//! written into a generated .docx package as real Word equations.
//!
//! # Pipeline
//!
//! For every math element, leaves first:
//!
//! 1. **LaTeX normalization** ([`formula::latex`]): environment rewriting,
//!    sizing and spacing commands
//! 2. **Source selection and pre-cleaning** ([`formula::mathml`]): embedded
//!    MathML or MathML regenerated from the LaTeX
//! 3. **Conversion** ([`formula::omml`]): MathML to OMML behind the
//!    [`MathmlToOmml`] trait, retried once without fence operators
//! 4. **Repair** ([`formula::omml::repair`]): named passes that rebuild
//!    stretchy delimiters, scripts, integrals and fractions
//!
//! The document itself is built from the HTML by [`html`], serialized by
//! [`ooxml::docx::writer`], and the math placeholders are spliced out for
//! OMML by [`ooxml::docx::splice`] before packaging.
//!
//! # Example - Exporting HTML
//!
//! ```no_run
//! use mathdocx::{DocxExporter, ExportOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let html = std::fs::read_to_string("answer.html")?;
//! let exporter = DocxExporter::new(ExportOptions::default());
//! let report = exporter.write_html_to(&html, "answer.docx")?;
//! println!("{} of {} formulas converted", report.math.converted(), report.math.elements);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Converting one formula
//!
//! ```no_run
//! use mathdocx::formula::{MathConverter, MathElement};
//!
//! let element = MathElement::from_latex(r"\left(\begin{matrix}a&b\\c&d\end{matrix}\right)", true);
//! match MathConverter::new().convert_element(&element) {
//!     Some(omml) => println!("{omml}"),
//!     None => println!("{}", element.fallback_text()),
//! }
//! ```

pub mod common;
pub mod config;
pub mod export;
pub mod formula;
pub mod html;
pub mod ooxml;

pub use config::{ConfigError, ExportOptions};
pub use export::{DocxExporter, ExportError, ExportOutput, ExportReport};
pub use formula::{MathConverter, MathElement, MathmlToOmml};
