// MathML side of the pipeline: extracted elements, source selection and
// pre-cleaning

mod clean;
mod element;
mod select;

pub use clean::{clean_mathml, clean_tree};
pub use element::MathElement;
pub use select::{MathSource, resolve_source, select_sources};
