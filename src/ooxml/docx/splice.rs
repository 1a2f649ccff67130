//! Math splicing over serialized document XML.
//!
//! The writer has no math run; math elements are written as placeholder
//! text runs and this module swaps each placeholder run for its OMML
//! fragment in the finished `word/document.xml` markup.

use crate::common::xml::OMML_NS;
use crate::formula::MathReplacement;
use memchr::memmem;
use tracing::{debug, warn};

const RUN_OPEN: &[u8] = b"<w:r";
const RUN_CLOSE: &str = "</w:r>";
const ROOT_OPEN: &str = "<w:document";

/// Result of [`splice_math`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpliceOutcome {
    /// The patched document XML
    pub xml: String,
    /// Replacements whose run was swapped for OMML
    pub applied: usize,
    /// Replacements left as literal placeholder text
    pub skipped: usize,
}

/// Replace the run holding each placeholder token with its OMML.
///
/// Display fragments are wrapped in `m:oMathPara`. A token that cannot be
/// found, or that sits outside a `w:r`, is skipped and stays visible as
/// text. The math namespace is declared on `w:document` when missing.
pub fn splice_math(xml: &str, replacements: &[MathReplacement]) -> SpliceOutcome {
    let mut out = xml.to_string();
    let mut applied = 0;
    let mut skipped = 0;

    for replacement in replacements {
        let Some((start, end)) = enclosing_run(&out, &replacement.token) else {
            warn!(
                target: "ooxml::splice",
                op = "splice_math",
                token = %replacement.token,
                "placeholder run not found, leaving token as text"
            );
            skipped += 1;
            continue;
        };
        let fragment = if replacement.display {
            format!("<m:oMathPara>{}</m:oMathPara>", replacement.omml)
        } else {
            replacement.omml.clone()
        };
        out.replace_range(start..end, &fragment);
        applied += 1;
    }

    ensure_math_namespace(&mut out);
    debug!(target: "ooxml::splice", op = "splice_math", applied, skipped, "splice finished");

    SpliceOutcome {
        xml: out,
        applied,
        skipped,
    }
}

/// Byte range of the innermost `<w:r>`/`<w:r ...>` ... `</w:r>` holding
/// `token`.
fn enclosing_run(xml: &str, token: &str) -> Option<(usize, usize)> {
    let bytes = xml.as_bytes();
    let at = memmem::find(bytes, token.as_bytes())?;

    let mut search_end = at;
    let start = loop {
        let candidate = memmem::rfind(&bytes[..search_end], RUN_OPEN)?;
        // `<w:rPr`, `<w:rFonts` and friends share the prefix
        match bytes.get(candidate + RUN_OPEN.len()) {
            Some(b'>' | b' ' | b'\t' | b'\n' | b'\r') => break candidate,
            _ => search_end = candidate,
        }
    };
    if memmem::find(&bytes[start..at], RUN_CLOSE.as_bytes()).is_some() {
        return None;
    }

    let after = at + token.len();
    let close = after + memmem::find(&bytes[after..], RUN_CLOSE.as_bytes())?;
    Some((start, close + RUN_CLOSE.len()))
}

fn ensure_math_namespace(xml: &mut String) {
    let Some(root) = memmem::find(xml.as_bytes(), ROOT_OPEN.as_bytes()) else {
        return;
    };
    let tag_end = match memchr::memchr(b'>', &xml.as_bytes()[root..]) {
        Some(i) => root + i,
        None => return,
    };
    if xml[root..tag_end].contains("xmlns:m=") {
        return;
    }
    xml.insert_str(root + ROOT_OPEN.len(), &format!(r#" xmlns:m="{OMML_NS}""#));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replacement(token: &str, omml: &str, display: bool) -> MathReplacement {
        MathReplacement {
            token: token.to_string(),
            omml: omml.to_string(),
            display,
        }
    }

    #[test]
    fn test_replaces_whole_run() {
        let xml = "<w:r><w:t>__MATH_000001__</w:t></w:r>";
        let out = splice_math(xml, &[replacement("__MATH_000001__", "<m:r><m:t>x</m:t></m:r>", false)]);
        assert_eq!(out.xml, "<m:r><m:t>x</m:t></m:r>");
        assert!(!out.xml.contains("__MATH_000001__"));
        assert_eq!((out.applied, out.skipped), (1, 0));
    }

    #[test]
    fn test_run_with_properties() {
        let xml = r#"<w:p><w:r><w:t>a</w:t></w:r><w:r w:rsidR="00"><w:rPr><w:rFonts w:ascii="Cambria Math"/></w:rPr><w:t xml:space="preserve">__MATH_000002__</w:t></w:r></w:p>"#;
        let out = splice_math(xml, &[replacement("__MATH_000002__", "<m:oMath/>", true)]);
        assert_eq!(
            out.xml,
            "<w:p><w:r><w:t>a</w:t></w:r><m:oMathPara><m:oMath/></m:oMathPara></w:p>"
        );
    }

    #[test]
    fn test_missing_token_skipped() {
        let xml = "<w:r><w:t>plain</w:t></w:r>";
        let out = splice_math(xml, &[replacement("__MATH_000003__", "<m:oMath/>", false)]);
        assert_eq!(out.xml, xml);
        assert_eq!((out.applied, out.skipped), (0, 1));
    }

    #[test]
    fn test_token_outside_run_skipped() {
        let xml = "<w:r><w:t>a</w:t></w:r><w:t>__MATH_000004__</w:t>";
        let out = splice_math(xml, &[replacement("__MATH_000004__", "<m:oMath/>", false)]);
        assert_eq!(out.xml, xml);
        assert_eq!(out.skipped, 1);
    }

    #[test]
    fn test_namespace_injected_once() {
        let xml = r#"<w:document xmlns:w="w"><w:body><w:p><w:r><w:t>__MATH_000001__</w:t></w:r></w:p></w:body></w:document>"#;
        let out = splice_math(xml, &[replacement("__MATH_000001__", "<m:oMath/>", false)]);
        assert!(out.xml.starts_with(&format!(r#"<w:document xmlns:m="{OMML_NS}" xmlns:w="w">"#)));

        let again = splice_math(&out.xml, &[]);
        assert_eq!(again.xml.matches("xmlns:m=").count(), 1);
    }

    #[test]
    fn test_multiple_tokens_in_order() {
        let xml = "<w:p><w:r><w:t>__MATH_000001__</w:t></w:r><w:r><w:t> and </w:t></w:r><w:r><w:t>__MATH_000002__</w:t></w:r></w:p>";
        let out = splice_math(
            xml,
            &[
                replacement("__MATH_000001__", "<m:oMath>1</m:oMath>", false),
                replacement("__MATH_000002__", "<m:oMath>2</m:oMath>", false),
            ],
        );
        assert_eq!(
            out.xml,
            "<w:p><m:oMath>1</m:oMath><w:r><w:t> and </w:t></w:r><m:oMath>2</m:oMath></w:p>"
        );
        assert_eq!(out.applied, 2);
    }
}
