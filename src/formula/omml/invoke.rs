// Converter invocation with a single fence-stripped retry

use super::convert::MathmlToOmml;
use crate::formula::error::{FormulaError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static FENCE_OPERATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<mo\b[^>]*>\s*(?:\(|\)|\[|\]|\{|\}|⟨|⟩|\||‖)\s*</mo>")
        .expect("valid fence operator regex")
});

/// Whether OMML text contains a fraction element.
#[inline]
pub fn has_fraction_marker(omml: &str) -> bool {
    omml.contains("<m:f>") || omml.contains("<m:f ")
}

/// Remove delimiter `<mo>` operators from MathML.
pub fn strip_fence_operators(mathml: &str) -> String {
    FENCE_OPERATOR.replace_all(mathml, "").into_owned()
}

/// Convert cleaned MathML, retrying once without fence operators.
///
/// An attempt is accepted when it is non-empty and, if the input has an
/// `<mfrac>`, keeps an `m:f`. The retry only runs when `allow_retry` is set.
pub fn convert_with_retry(
    converter: &dyn MathmlToOmml,
    cleaned: &str,
    allow_retry: bool,
) -> Result<String> {
    let needs_fraction = cleaned.contains("<mfrac");

    let first = attempt(converter, cleaned, needs_fraction);
    let first_err = match first {
        Ok(omml) => return Ok(omml),
        Err(err) => err,
    };
    if !allow_retry {
        return Err(first_err);
    }

    let stripped = strip_fence_operators(cleaned);
    if stripped == cleaned {
        return Err(first_err);
    }
    debug!(
        target: "formula::omml",
        op = "convert_retry",
        reason = %first_err,
        "retrying conversion without fence operators"
    );
    attempt(converter, &stripped, needs_fraction)
}

fn attempt(converter: &dyn MathmlToOmml, mathml: &str, needs_fraction: bool) -> Result<String> {
    let omml = converter.convert(mathml)?;
    if omml.trim().is_empty() {
        return Err(FormulaError::Convert("converter returned empty output".to_string()));
    }
    if needs_fraction && !has_fraction_marker(&omml) {
        return Err(FormulaError::MissingFraction);
    }
    Ok(omml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Drops fractions whenever the input still has fence operators.
    struct FenceSensitive {
        calls: RefCell<Vec<String>>,
    }

    impl MathmlToOmml for FenceSensitive {
        fn convert(&self, mathml: &str) -> Result<String> {
            self.calls.borrow_mut().push(mathml.to_string());
            if mathml.contains("<mo>(</mo>") {
                Ok("<m:oMath><m:r><m:t>(1/2)</m:t></m:r></m:oMath>".to_string())
            } else {
                Ok("<m:oMath><m:f><m:num/><m:den/></m:f></m:oMath>".to_string())
            }
        }
    }

    #[test]
    fn test_strip_fence_operators() {
        let input = r#"<math><mo stretchy="true">(</mo><mi>x</mi><mo> ) </mo><mo>+</mo></math>"#;
        assert_eq!(strip_fence_operators(input), "<math><mi>x</mi><mo>+</mo></math>");
    }

    #[test]
    fn test_retry_recovers_fraction() {
        let conv = FenceSensitive {
            calls: RefCell::new(Vec::new()),
        };
        let input = "<math><mo>(</mo><mfrac><mn>1</mn><mn>2</mn></mfrac><mo>)</mo></math>";
        let out = convert_with_retry(&conv, input, true).unwrap();
        assert!(has_fraction_marker(&out));
        assert_eq!(conv.calls.borrow().len(), 2);
    }

    #[test]
    fn test_retry_disabled() {
        let conv = FenceSensitive {
            calls: RefCell::new(Vec::new()),
        };
        let input = "<math><mo>(</mo><mfrac><mn>1</mn><mn>2</mn></mfrac><mo>)</mo></math>";
        assert_eq!(
            convert_with_retry(&conv, input, false),
            Err(FormulaError::MissingFraction)
        );
        assert_eq!(conv.calls.borrow().len(), 1);
    }

    #[test]
    fn test_first_success_wins() {
        let conv = |_: &str| -> Result<String> { Ok("<m:oMath><m:r><m:t>x</m:t></m:r></m:oMath>".to_string()) };
        assert!(convert_with_retry(&conv, "<math><mi>x</mi></math>", true).is_ok());
    }

    #[test]
    fn test_total_failure() {
        let conv = |_: &str| -> Result<String> { Ok(String::new()) };
        let input = "<math><mo>[</mo><mi>x</mi><mo>]</mo></math>";
        assert!(matches!(
            convert_with_retry(&conv, input, true),
            Err(FormulaError::Convert(_))
        ));

        let lossy = |_: &str| -> Result<String> { Ok("<m:oMath/>".to_string()) };
        let input = "<math><mo>(</mo><mfrac><mn>1</mn><mn>2</mn></mfrac><mo>)</mo></math>";
        assert_eq!(
            convert_with_retry(&lossy, input, true),
            Err(FormulaError::MissingFraction)
        );
    }
}
