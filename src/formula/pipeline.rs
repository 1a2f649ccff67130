// Per-element conversion: source selection, pre-cleaning, conversion with
// retry and structural repair

use super::error::{FormulaError, Result};
use super::latex::{LatexRenderer, default_renderer};
use super::mathml::{MathElement, MathSource, clean_mathml, resolve_source, select_sources};
use super::omml::{BuiltinConverter, MathmlToOmml, RepairPipeline, convert_with_retry, has_fraction_marker};
use crate::config::ExportOptions;
use tracing::debug;

/// Turns math elements into finished OMML fragments.
///
/// Strategies are tried in the order chosen by the source selector; the
/// first one that survives conversion and repair wins. `None` means the
/// caller renders the element's LaTeX as literal text.
pub struct MathConverter {
    converter: Box<dyn MathmlToOmml + Send + Sync>,
    renderer: Box<dyn LatexRenderer + Send + Sync>,
    repair: RepairPipeline,
    prefer_regeneration: bool,
    retry_without_fences: bool,
}

impl Default for MathConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MathConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MathConverter")
            .field("repair", &self.repair)
            .field("prefer_regeneration", &self.prefer_regeneration)
            .field("retry_without_fences", &self.retry_without_fences)
            .finish_non_exhaustive()
    }
}

impl MathConverter {
    /// Built-in converter, default renderer and the standard repair passes.
    pub fn new() -> Self {
        Self {
            converter: Box::new(BuiltinConverter),
            renderer: default_renderer(),
            repair: RepairPipeline::standard(),
            prefer_regeneration: true,
            retry_without_fences: true,
        }
    }

    /// Converter configured from export options.
    pub fn from_options(options: &ExportOptions) -> Self {
        let repair = options
            .disabled_rules
            .iter()
            .fold(RepairPipeline::standard(), |p, name| p.disable(name.clone()));
        Self::new()
            .with_repair_pipeline(repair)
            .with_prefer_regeneration(options.prefer_regeneration_for_matrices)
            .with_retry_without_fences(options.retry_without_fences)
    }

    /// Use a different MathML to OMML converter.
    #[inline]
    pub fn with_converter(mut self, converter: impl MathmlToOmml + Send + Sync + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    /// Use a different LaTeX renderer for regeneration.
    #[inline]
    pub fn with_renderer(mut self, renderer: impl LatexRenderer + Send + Sync + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    #[inline]
    pub fn with_repair_pipeline(mut self, repair: RepairPipeline) -> Self {
        self.repair = repair;
        self
    }

    #[inline]
    pub fn with_prefer_regeneration(mut self, prefer: bool) -> Self {
        self.prefer_regeneration = prefer;
        self
    }

    #[inline]
    pub fn with_retry_without_fences(mut self, retry: bool) -> Self {
        self.retry_without_fences = retry;
        self
    }

    /// OMML for one element, or `None` to render it as literal LaTeX.
    pub fn convert_element(&self, element: &MathElement) -> Option<String> {
        self.convert_element_with_source(element).map(|(omml, _)| omml)
    }

    /// Like [`convert_element`](Self::convert_element), also reporting which
    /// strategy produced the fragment.
    pub fn convert_element_with_source(&self, element: &MathElement) -> Option<(String, MathSource)> {
        for source in select_sources(element, self.prefer_regeneration) {
            let Some(mathml) = resolve_source(source, element, self.renderer.as_ref()) else {
                debug!(
                    target: "formula",
                    op = "resolve_source",
                    source = source.as_str(),
                    "no MathML for strategy"
                );
                continue;
            };
            match self.convert_mathml(&mathml) {
                Ok(omml) => return Some((omml, source)),
                Err(err) => {
                    debug!(
                        target: "formula",
                        op = "convert_element",
                        source = source.as_str(),
                        error = %err,
                        "strategy failed"
                    );
                },
            }
        }
        None
    }

    /// Clean, convert and repair one MathML string.
    pub fn convert_mathml(&self, mathml: &str) -> Result<String> {
        let cleaned = clean_mathml(mathml)?;
        let raw = convert_with_retry(self.converter.as_ref(), &cleaned, self.retry_without_fences)?;
        let Some(omml) = self.repair.repair(&raw) else {
            return Err(if has_fraction_marker(&raw) {
                FormulaError::MissingFraction
            } else {
                FormulaError::InvalidStructure("converter output could not be repaired".to_string())
            });
        };
        if cleaned.contains("<mfrac") && !has_fraction_marker(&omml) {
            return Err(FormulaError::MissingFraction);
        }
        Ok(omml)
    }
}
