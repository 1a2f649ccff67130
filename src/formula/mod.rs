// Formula Module - HTML math to Office Math
//
// Every math element found in the HTML goes through the same stages:
//
// - **latex**: LaTeX normalization and MathML regeneration
// - **mathml**: source selection and MathML pre-cleaning
// - **omml**: conversion (with a fence-stripped retry) and structural repair
//
// `MathConverter` drives one element through those stages and yields either
// a finished `m:oMath` fragment or `None`, in which case the caller writes
// the LaTeX source as plain text. `MathContext` hands out the placeholder
// tokens that carry fragments into the finished document XML.
//
// # Example
//
// ```ignore
// use mathdocx::formula::{MathConverter, MathElement};
//
// let converter = MathConverter::new();
// let element = MathElement::from_latex(r"\frac{a}{b}", false);
// let omml = converter.convert_element(&element);
// ```

/// Placeholder tokens and the fragments they stand for.
pub mod context;
pub mod error;
/// LaTeX normalization and MathML regeneration
pub mod latex;
pub mod mathml;
/// MathML to OMML conversion and repair
///
/// Reference: https://devblogs.microsoft.com/math-in-office/officemath/
pub mod omml;
mod pipeline;

pub use context::{MathContext, MathReplacement};
pub use error::{FormulaError, Result};
pub use latex::{LatexRenderer, NoRenderer, normalize_latex};
pub use mathml::{MathElement, MathSource};
pub use omml::{BuiltinConverter, MathmlToOmml, RepairPass, RepairPipeline, RepairState};
pub use pipeline::MathConverter;
