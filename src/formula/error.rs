use crate::common::xml::XmlError;
use thiserror::Error;

/// Result type for formula conversion.
pub type Result<T> = std::result::Result<T, FormulaError>;

/// Errors raised while turning one math element into OMML.
///
/// None of these abort a document export: the element pipeline catches them
/// and moves to the next source strategy, and finally to literal LaTeX.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormulaError {
    /// A MathML or OMML fragment could not be parsed
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    /// LaTeX could not be rendered to MathML
    #[error("LaTeX rendering failed: {0}")]
    Render(String),

    /// The MathML to OMML converter failed or returned nothing
    #[error("MathML conversion failed: {0}")]
    Convert(String),

    /// The input had a fraction and every conversion attempt dropped it
    #[error("fraction structure lost during conversion")]
    MissingFraction,

    /// The element carries neither MathML nor LaTeX for the strategy
    #[error("no {0} source available")]
    NoSource(&'static str),

    /// Structural problem in a fragment
    #[error("invalid structure: {0}")]
    InvalidStructure(String),
}
