/// A region of rendered HTML identified as math.
///
/// Built once by the HTML walker and read by the element pipeline; never
/// mutated after extraction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MathElement {
    /// Original LaTeX source, if it could be recovered
    pub latex: Option<String>,
    /// MathML embedded by the renderer
    pub mathml: Option<String>,
    /// Block (display) math rather than inline math
    pub display: bool,
}

impl MathElement {
    /// Create an element from its parts. Blank strings count as absent.
    pub fn new(latex: Option<String>, mathml: Option<String>, display: bool) -> Self {
        Self {
            latex: latex.filter(|s| !s.trim().is_empty()),
            mathml: mathml.filter(|s| !s.trim().is_empty()),
            display,
        }
    }

    /// Element carrying only LaTeX source.
    pub fn from_latex(latex: impl Into<String>, display: bool) -> Self {
        Self::new(Some(latex.into()), None, display)
    }

    /// Element carrying only MathML.
    pub fn from_mathml(mathml: impl Into<String>, display: bool) -> Self {
        Self::new(None, Some(mathml.into()), display)
    }

    /// Extract the first math element from an HTML fragment.
    ///
    /// Looks for a `katex-display` or `katex` element (or a bare `<math>`),
    /// takes its embedded `<math>` subtree, the `application/x-tex`
    /// annotation as LaTeX and the `title` attribute as a last resort.
    pub fn from_html(fragment: &str) -> Option<Self> {
        crate::html::extract_math_element(fragment)
    }

    /// LaTeX source, trimmed.
    pub fn latex_source(&self) -> Option<&str> {
        self.latex.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Text shown in the document when no OMML could be produced.
    pub fn fallback_text(&self) -> String {
        match self.latex_source() {
            Some(latex) if self.display => format!("$${latex}$$"),
            Some(latex) => format!("${latex}$"),
            None => String::new(),
        }
    }
}
