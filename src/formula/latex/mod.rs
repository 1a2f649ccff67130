// LaTeX handling: source normalization and MathML regeneration

mod normalize;
mod render;

pub use normalize::{has_matrix_environment, normalize_latex};
#[cfg(feature = "regenerate")]
pub use render::Latex2MathmlRenderer;
pub use render::{LatexRenderer, NoRenderer, default_renderer, regenerate_mathml};
