// Integral repairs: bare glyph runs, integrand adoption and limit placement

use super::{RepairPass, RepairState, containers};
use crate::common::xml::XmlTree;
use crate::formula::omml::build;
use crate::formula::omml::lookup::{DELIMITER_CHARS, INTEGRAL_CHARS, INTEGRAL_RUN_CHARS};
use once_cell::sync::Lazy;
use regex::Regex;

static DIFFERENTIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^d\s*[A-Za-z\p{Greek}]").expect("valid differential regex"));

/// Whether run text looks like a differential marker (`dx`, `d x`, `dθ`).
fn is_differential(text: &str) -> bool {
    let text = text.trim();
    text == "d" || DIFFERENTIAL.is_match(text)
}

fn is_integrand(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && !DELIMITER_CHARS.contains(trimmed) && !is_differential(trimmed)
}

/// Turns an integral glyph run, an optional digit run and an optional `∞`
/// run into an `m:nary` with limits above and below and an empty integrand.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntegralRuns;

impl IntegralRuns {
    pub const NAME: &'static str = "integral-runs";
}

impl RepairPass for IntegralRuns {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, tree: &mut XmlTree, _state: &mut RepairState) {
        for container in containers(tree) {
            if !tree.is_attached(container) {
                continue;
            }
            let mut i = 0;
            while i < tree.children(container).len() {
                let node = tree.children(container)[i];
                let chr = match build::trimmed_run_text(tree, node) {
                    Some(t) if INTEGRAL_RUN_CHARS.contains(t.as_str()) => t,
                    _ => {
                        i += 1;
                        continue;
                    },
                };

                let siblings = tree.children(container);
                let mut next = i + 1;
                let lower = siblings.get(next).copied().filter(|&n| {
                    build::trimmed_run_text(tree, n)
                        .is_some_and(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_digit()))
                });
                if lower.is_some() {
                    next += 1;
                }
                let upper = siblings
                    .get(next)
                    .copied()
                    .filter(|&n| build::run_is(tree, n, "∞"));

                let lower_nodes: Vec<_> = lower.into_iter().collect();
                let upper_nodes: Vec<_> = upper.into_iter().collect();
                let nary = build::nary(
                    tree,
                    &chr,
                    "undOvr",
                    lower.map(|_| lower_nodes.as_slice()),
                    upper.map(|_| upper_nodes.as_slice()),
                    &[],
                );
                tree.replace(node, nary);
                i += 1;
            }
        }
    }
}

/// Moves the run right after an `m:nary` with an empty integrand into the
/// integrand, unless it is a differential marker or a lone delimiter.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntegrandAdoption;

impl IntegrandAdoption {
    pub const NAME: &'static str = "integrand-adoption";
}

impl RepairPass for IntegrandAdoption {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, tree: &mut XmlTree, _state: &mut RepairState) {
        for nary in tree.descendants_named(tree.root(), "m:nary") {
            if !tree.is_attached(nary) {
                continue;
            }
            let Some(e) = tree.child_named(nary, "m:e") else {
                continue;
            };
            if !build::is_empty_slot(tree, e) {
                continue;
            }
            let Some(next) = tree.next_element_sibling(nary) else {
                continue;
            };
            match build::run_text(tree, next) {
                Some(text) if is_integrand(&text) => {
                    tree.append(e, next);
                },
                _ => {},
            }
        }
    }
}

/// Integral-family operators place their limits above and below.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntegralLimits;

impl IntegralLimits {
    pub const NAME: &'static str = "integral-limits";
}

impl RepairPass for IntegralLimits {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, tree: &mut XmlTree, _state: &mut RepairState) {
        for nary in tree.descendants_named(tree.root(), "m:nary") {
            let chr = build::nary_char(tree, nary);
            if INTEGRAL_CHARS.contains(chr.as_str()) {
                build::set_property(tree, nary, "m:naryPr", "m:limLoc", "undOvr");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixture::*;
    use super::*;

    #[test]
    fn test_integral_reconstruction() {
        let out = apply(&IntegralRuns, &format!("{}{}{}", r("∫"), r("0"), r("∞")));
        assert_eq!(
            out,
            format!(
                r#"<m:nary><m:naryPr><m:chr m:val="∫"/><m:limLoc m:val="undOvr"/></m:naryPr><m:sub>{}</m:sub><m:sup>{}</m:sup><m:e/></m:nary>"#,
                r("0"),
                r("∞")
            )
        );
    }

    #[test]
    fn test_integral_without_limits() {
        let out = apply(&IntegralRuns, &format!("{}{}", r("∮"), r("x")));
        assert!(out.starts_with(r#"<m:nary><m:naryPr><m:chr m:val="∮"/><m:limLoc m:val="undOvr"/><m:subHide m:val="1"/><m:supHide m:val="1"/></m:naryPr>"#));
        assert!(out.ends_with(&format!("<m:e/></m:nary>{}", r("x"))));
    }

    #[test]
    fn test_upper_only() {
        let out = apply(&IntegralRuns, &format!("{}{}", r("∫"), r("∞")));
        assert!(out.contains(r#"<m:subHide m:val="1"/>"#));
        assert!(out.contains(&format!("<m:sup>{}</m:sup>", r("∞"))));
    }

    #[test]
    fn test_integral_runs_idempotent() {
        let once = apply(&IntegralRuns, &format!("{}{}{}", r("∫"), r("0"), r("∞")));
        assert_eq!(apply(&IntegralRuns, &once), once);
    }

    #[test]
    fn test_integrand_adoption() {
        let nary = r#"<m:nary><m:naryPr><m:chr m:val="∫"/></m:naryPr><m:sub/><m:sup/><m:e/></m:nary>"#;
        let out = apply(&IntegrandAdoption, &format!("{nary}{}{}", r("f"), r("dx")));
        assert_eq!(
            out,
            format!(
                r#"<m:nary><m:naryPr><m:chr m:val="∫"/></m:naryPr><m:sub/><m:sup/><m:e>{}</m:e></m:nary>{}"#,
                r("f"),
                r("dx")
            )
        );
    }

    #[test]
    fn test_differential_stays_outside() {
        let nary = r#"<m:nary><m:sub/><m:sup/><m:e/></m:nary>"#;
        for d in ["dx", "d x", "dθ", "d"] {
            let inner = format!("{nary}{}", r(d));
            assert_eq!(apply(&IntegrandAdoption, &inner), inner, "{d}");
        }
    }

    #[test]
    fn test_delimiter_stays_outside() {
        let nary = r#"<m:nary><m:naryPr><m:chr m:val="∑"/></m:naryPr><m:sub/><m:sup/><m:e/></m:nary>"#;
        for delim in ["]", ")", " } ", "("] {
            let inner = format!("{nary}{}", r(delim));
            assert_eq!(apply(&IntegrandAdoption, &inner), inner, "{delim}");
        }
    }

    #[test]
    fn test_integral_limits() {
        let nary = r#"<m:nary><m:naryPr><m:chr m:val="∬"/><m:limLoc m:val="subSup"/></m:naryPr><m:sub/><m:sup/><m:e/></m:nary>"#;
        let out = apply(&IntegralLimits, nary);
        assert!(out.contains(r#"<m:limLoc m:val="undOvr"/>"#));

        let default_chr = "<m:nary><m:sub/><m:sup/><m:e/></m:nary>";
        let out = apply(&IntegralLimits, default_chr);
        assert!(out.starts_with(r#"<m:nary><m:naryPr><m:limLoc m:val="undOvr"/></m:naryPr>"#));

        let sum = r#"<m:nary><m:naryPr><m:chr m:val="∑"/><m:limLoc m:val="subSup"/></m:naryPr><m:sub/><m:sup/><m:e/></m:nary>"#;
        assert_eq!(apply(&IntegralLimits, sum), sum);
    }
}
