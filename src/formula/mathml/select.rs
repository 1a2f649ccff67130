// Math-source selection
//
// Chooses, per element, the order in which the embedded MathML and MathML
// regenerated from normalized LaTeX are fed to the converter.

use super::MathElement;
use crate::formula::latex::{LatexRenderer, has_matrix_environment, normalize_latex, regenerate_mathml};
use smallvec::SmallVec;

/// Where the MathML for one conversion attempt comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathSource {
    /// MathML embedded in the rendered HTML
    Embedded,
    /// MathML rendered afresh from normalized LaTeX
    Regenerated,
}

impl MathSource {
    /// Short name used in logs and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            MathSource::Embedded => "embedded",
            MathSource::Regenerated => "regenerated",
        }
    }
}

/// Ordered strategies for one element.
///
/// Matrix-like LaTeX prefers regeneration (when `prefer_regeneration` is
/// set); everything else tries the embedded MathML first. Strategies whose
/// input is absent are left out.
pub fn select_sources(element: &MathElement, prefer_regeneration: bool) -> SmallVec<[MathSource; 2]> {
    let has_latex = element.latex_source().is_some();
    let has_mathml = element.mathml.is_some();

    let order = match element.latex_source() {
        Some(latex) if prefer_regeneration && has_matrix_environment(latex) => {
            [MathSource::Regenerated, MathSource::Embedded]
        },
        _ => [MathSource::Embedded, MathSource::Regenerated],
    };

    order
        .into_iter()
        .filter(|source| match source {
            MathSource::Embedded => has_mathml,
            MathSource::Regenerated => has_latex,
        })
        .collect()
}

/// MathML for one strategy, or `None` when it cannot be produced.
pub fn resolve_source(
    source: MathSource,
    element: &MathElement,
    renderer: &dyn LatexRenderer,
) -> Option<String> {
    match source {
        MathSource::Embedded => element.mathml.clone(),
        MathSource::Regenerated => {
            let latex = element.latex_source()?;
            regenerate_mathml(renderer, &normalize_latex(latex), element.display)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::latex::NoRenderer;

    #[test]
    fn test_matrix_prefers_regeneration() {
        let e = MathElement::new(
            Some(r"\begin{pmatrix}1\end{pmatrix}".into()),
            Some("<math/>".into()),
            false,
        );
        assert_eq!(
            select_sources(&e, true).as_slice(),
            &[MathSource::Regenerated, MathSource::Embedded]
        );
        assert_eq!(
            select_sources(&e, false).as_slice(),
            &[MathSource::Embedded, MathSource::Regenerated]
        );
    }

    #[test]
    fn test_plain_prefers_embedded() {
        let e = MathElement::new(Some("x+1".into()), Some("<math/>".into()), true);
        assert_eq!(
            select_sources(&e, true).as_slice(),
            &[MathSource::Embedded, MathSource::Regenerated]
        );
    }

    #[test]
    fn test_absent_inputs_are_skipped() {
        let latex_only = MathElement::from_latex(r"\begin{bmatrix}1\end{bmatrix}", false);
        assert_eq!(select_sources(&latex_only, true).as_slice(), &[MathSource::Regenerated]);

        let mathml_only = MathElement::from_mathml("<math/>", false);
        assert_eq!(select_sources(&mathml_only, true).as_slice(), &[MathSource::Embedded]);

        assert!(select_sources(&MathElement::default(), true).is_empty());
    }

    #[test]
    fn test_resolve_without_renderer() {
        let e = MathElement::new(Some("x".into()), Some("<math><mi>x</mi></math>".into()), false);
        assert!(resolve_source(MathSource::Embedded, &e, &NoRenderer).is_some());
        assert!(resolve_source(MathSource::Regenerated, &e, &NoRenderer).is_none());
    }
}
