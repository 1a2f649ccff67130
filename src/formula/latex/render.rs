// LaTeX to MathML regeneration

use crate::formula::error::{FormulaError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static MATH_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<math\b.*?</math>").expect("valid math block regex"));

/// Renders LaTeX into a MathML string.
///
/// Implementations may return anything that contains a `<math>` element;
/// surrounding text is discarded by [`regenerate_mathml`].
pub trait LatexRenderer {
    fn render(&self, latex: &str, display: bool) -> Result<String>;
}

/// Renderer backed by the `latex2mathml` crate.
#[cfg(feature = "regenerate")]
#[derive(Debug, Default, Clone, Copy)]
pub struct Latex2MathmlRenderer;

#[cfg(feature = "regenerate")]
impl LatexRenderer for Latex2MathmlRenderer {
    fn render(&self, latex: &str, display: bool) -> Result<String> {
        use latex2mathml::{DisplayStyle, latex_to_mathml};

        let style = if display {
            DisplayStyle::Block
        } else {
            DisplayStyle::Inline
        };
        let mathml = latex_to_mathml(latex, style).map_err(|e| FormulaError::Render(e.to_string()))?;
        if mathml.contains("[PARSE ERROR:") {
            return Err(FormulaError::Render(
                "unsupported LaTeX command or token".to_string(),
            ));
        }
        Ok(mathml)
    }
}

/// Renderer that never produces output, used when regeneration is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRenderer;

impl LatexRenderer for NoRenderer {
    fn render(&self, _latex: &str, _display: bool) -> Result<String> {
        Err(FormulaError::NoSource("renderer"))
    }
}

/// The renderer used when none is configured explicitly.
pub fn default_renderer() -> Box<dyn LatexRenderer + Send + Sync> {
    #[cfg(feature = "regenerate")]
    {
        Box::new(Latex2MathmlRenderer)
    }
    #[cfg(not(feature = "regenerate"))]
    {
        Box::new(NoRenderer)
    }
}

/// Render already normalized LaTeX and extract the first `<math>` element.
///
/// Returns `None` when the renderer fails or its output holds no `<math>`
/// element.
pub fn regenerate_mathml(
    renderer: &dyn LatexRenderer,
    normalized_latex: &str,
    display: bool,
) -> Option<String> {
    let rendered = match renderer.render(normalized_latex, display) {
        Ok(s) => s,
        Err(err) => {
            tracing::debug!(
                target: "formula::latex",
                op = "regenerate",
                error = %err,
                "LaTeX regeneration failed"
            );
            return None;
        },
    };
    MATH_BLOCK.find(&rendered).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl LatexRenderer for Fixed {
        fn render(&self, _latex: &str, _display: bool) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_extracts_math_block() {
        let r = Fixed("<div>junk<math display=\"block\"><mi>x</mi></math>tail</div>");
        assert_eq!(
            regenerate_mathml(&r, "x", true).as_deref(),
            Some("<math display=\"block\"><mi>x</mi></math>")
        );
    }

    #[test]
    fn test_no_math_block() {
        assert_eq!(regenerate_mathml(&Fixed("<span>x</span>"), "x", false), None);
        assert_eq!(regenerate_mathml(&NoRenderer, "x", false), None);
    }

    #[cfg(feature = "regenerate")]
    #[test]
    fn test_latex2mathml_renders_fraction() {
        let mathml = regenerate_mathml(&Latex2MathmlRenderer, r"\frac{1}{2}", false);
        let mathml = mathml.expect("fraction renders");
        assert!(mathml.contains("<mfrac"));
    }
}
