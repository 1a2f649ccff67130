// Bracketed fraction misparse: `[∫ … / 1+∑ …]` read as a flat run of siblings

use super::{RepairPass, RepairState, containers};
use crate::common::xml::{NodeId, XmlTree};
use crate::formula::omml::build;
use crate::formula::omml::lookup::{INTEGRAL_CHARS, SUMMATION_CHARS, closing_delimiter};

/// Rebuilds one recurring converter misparse as a bracketed fraction:
///
/// `[` `∫…` `tail` [`1+`] `∑…` `]` becomes `m:d` around an `m:f` whose
/// numerator holds the integral and its tail and whose denominator holds
/// the `1+` run and the summation.
#[derive(Debug, Default, Clone, Copy)]
pub struct BracketedFraction;

impl BracketedFraction {
    pub const NAME: &'static str = "bracketed-fraction";

    fn nary_in(tree: &XmlTree, node: NodeId, chars: &phf::Set<&'static str>) -> bool {
        tree.is(node, "m:nary") && chars.contains(build::nary_char(tree, node).as_str())
    }

    /// Whether the pattern starts at `children[start]`.
    pub(super) fn matches_at(tree: &XmlTree, children: &[NodeId], start: usize) -> bool {
        Self::match_at(tree, children, start).is_some()
    }

    /// Match the pattern at `start`. The tail run may already have been
    /// adopted into the integrand, in which case it is absent here.
    fn match_at(tree: &XmlTree, children: &[NodeId], start: usize) -> Option<Match> {
        let open = build::trimmed_run_text(tree, *children.get(start)?)?;
        if open != "[" && open != "(" {
            return None;
        }
        let close = closing_delimiter(&open)?;

        let integral = start + 1;
        let integral_node = *children.get(integral)?;
        if !Self::nary_in(tree, integral_node, &INTEGRAL_CHARS) {
            return None;
        }

        let mut next = integral + 1;
        let tail = match build::trimmed_run_text(tree, *children.get(next)?) {
            Some(text) if !text.is_empty() && text != "1+" => Some(next),
            _ => None,
        };
        if tail.is_some() {
            next += 1;
        } else if tree
            .child_named(integral_node, "m:e")
            .is_none_or(|e| build::is_empty_slot(tree, e))
        {
            return None;
        }

        let one_plus = build::run_is(tree, *children.get(next)?, "1+").then_some(next);
        if one_plus.is_some() {
            next += 1;
        }
        let sum = next;
        if !Self::nary_in(tree, *children.get(sum)?, &SUMMATION_CHARS) {
            return None;
        }
        let end = sum + 1;
        if !build::run_is(tree, *children.get(end)?, close) {
            return None;
        }
        Some(Match {
            open,
            close,
            integral,
            tail,
            one_plus,
            sum,
            end,
        })
    }
}

struct Match {
    open: String,
    close: &'static str,
    integral: usize,
    tail: Option<usize>,
    one_plus: Option<usize>,
    sum: usize,
    end: usize,
}

impl RepairPass for BracketedFraction {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, tree: &mut XmlTree, state: &mut RepairState) {
        for container in containers(tree) {
            if !tree.is_attached(container) {
                continue;
            }
            let mut start = 0;
            loop {
                let children = tree.children(container).to_vec();
                if start >= children.len() {
                    break;
                }
                let Some(m) = Self::match_at(tree, &children, start) else {
                    start += 1;
                    continue;
                };

                let mut numerator = vec![children[m.integral]];
                numerator.extend(m.tail.map(|i| children[i]));
                let mut denominator = Vec::with_capacity(2);
                if let Some(i) = m.one_plus {
                    denominator.push(children[i]);
                }
                denominator.push(children[m.sum]);

                let num = build::slot(tree, "m:num", &numerator);
                let den = build::slot(tree, "m:den", &denominator);
                let f = build::element(tree, "m:f", &[num, den]);
                let d = build::delimiter(tree, &m.open, m.close, &[f]);
                tree.replace(children[start], d);
                tree.detach(children[m.end]);

                state.bracketed_fraction = true;
                start += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixture::*;
    use super::*;

    fn nary(chr: &str) -> String {
        format!(
            r#"<m:nary><m:naryPr><m:chr m:val="{chr}"/></m:naryPr><m:sub/><m:sup/><m:e/></m:nary>"#
        )
    }

    #[test]
    fn test_bracketed_fraction() {
        let inner = format!(
            "{}{}{}{}{}{}",
            r("["),
            nary("∫"),
            r("f(t)dt"),
            r("1+"),
            nary("∑"),
            r("]")
        );
        let mut tree = omath(&inner);
        let mut state = RepairState::default();
        BracketedFraction.apply(&mut tree, &mut state);
        assert!(state.bracketed_fraction);
        assert_eq!(
            body(&tree),
            format!(
                r#"<m:d><m:dPr><m:begChr m:val="["/><m:endChr m:val="]"/></m:dPr><m:e><m:f><m:num>{}{}</m:num><m:den>{}{}</m:den></m:f></m:e></m:d>"#,
                nary("∫"),
                r("f(t)dt"),
                r("1+"),
                nary("∑")
            )
        );
    }

    #[test]
    fn test_without_one_plus() {
        let inner = format!("{}{}{}{}{}", r("("), nary("∫"), r("g"), nary("∏"), r(")"));
        let out = apply(&BracketedFraction, &inner);
        assert!(out.contains(&format!("<m:den>{}</m:den>", nary("∏"))));
        assert!(out.starts_with(r#"<m:d><m:dPr><m:begChr m:val="("/><m:endChr m:val=")"/>"#));
    }

    #[test]
    fn test_other_shapes_untouched() {
        let wrong_close = format!("{}{}{}{}{}", r("["), nary("∫"), r("g"), nary("∑"), r(")"));
        let mut tree = omath(&wrong_close);
        let mut state = RepairState::default();
        BracketedFraction.apply(&mut tree, &mut state);
        assert!(!state.bracketed_fraction);
        assert_eq!(body(&tree), wrong_close);

        let sum_first = format!("{}{}{}{}{}", r("["), nary("∑"), r("g"), nary("∫"), r("]"));
        assert_eq!(apply(&BracketedFraction, &sum_first), sum_first);
    }

    fn limited(chr: &str, sub: &str) -> String {
        format!(
            r#"<m:nary><m:naryPr><m:chr m:val="{chr}"/></m:naryPr><m:sub>{}</m:sub><m:sup/><m:e/></m:nary>"#,
            r(sub)
        )
    }

    #[test]
    fn test_standard_pipeline_rebuilds_square_bracket() {
        let raw = format!(
            "<m:oMath>{}{}{}{}{}{}</m:oMath>",
            r("["),
            limited("∫", "k"),
            r("f(t)dt"),
            r("1+"),
            limited("∑", "k"),
            r("]")
        );
        let out = super::super::RepairPipeline::standard().repair(&raw).unwrap();
        assert!(out.starts_with(r#"<m:oMath><m:d><m:dPr><m:begChr m:val="["/><m:endChr m:val="]"/></m:dPr><m:e><m:f><m:num><m:nary>"#));
        assert!(out.contains(&format!("<m:e>{}</m:e></m:nary></m:num><m:den>{}<m:nary>", r("f(t)dt"), r("1+"))));
        assert!(!out.contains(&r("]")));
    }

    #[test]
    fn test_adopted_tail_still_matches() {
        let integral = format!(
            r#"<m:nary><m:naryPr><m:chr m:val="∫"/></m:naryPr><m:sub/><m:sup/><m:e>{}</m:e></m:nary>"#,
            r("g")
        );
        let inner = format!("{}{integral}{}{}", r("("), nary("∑"), r(")"));
        let out = apply(&BracketedFraction, &inner);
        assert!(out.contains(&format!("<m:num>{integral}</m:num><m:den>{}</m:den>", nary("∑"))));

        let empty = format!("{}{}{}{}", r("("), nary("∫"), nary("∑"), r(")"));
        assert_eq!(apply(&BracketedFraction, &empty), empty);
    }
}
