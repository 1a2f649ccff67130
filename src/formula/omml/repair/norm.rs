// Norm subscripts: `‖` runs with trailing digits flattened by the converter

use super::{RepairPass, RepairState};
use crate::common::xml::{NodeId, XmlTree};
use crate::formula::omml::build;
use once_cell::sync::Lazy;
use regex::Regex;

static NORM_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(.*?)‖([0-9₀-₉]+)(.*)$").expect("valid norm regex"));

/// Subscript digits become ASCII digits.
fn ascii_digits(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '₀'..='₉' => char::from_u32(c as u32 - '₀' as u32 + '0' as u32).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Rebuilds runs like `‖x‖12` copied from rendered norms: the digits after
/// the double bar become a subscript (one digit) or a subscript followed by
/// a superscript (two or more digits) over the bar.
#[derive(Debug, Default, Clone, Copy)]
pub struct NormSubscript;

impl NormSubscript {
    pub const NAME: &'static str = "norm-subscript";
}

impl RepairPass for NormSubscript {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, tree: &mut XmlTree, _state: &mut RepairState) {
        let mut work: Vec<NodeId> = tree.descendants_named(tree.root(), "m:r");
        work.reverse();
        while let Some(run) = work.pop() {
            if !tree.is_attached(run) {
                continue;
            }
            let Some(text) = build::run_text(tree, run) else {
                continue;
            };
            let Some(caps) = NORM_DIGITS.captures(&text) else {
                continue;
            };
            let prefix = caps.get(1).map_or("", |m| m.as_str());
            let digits = ascii_digits(caps.get(2).map_or("", |m| m.as_str()));
            let suffix = caps.get(3).map_or("", |m| m.as_str());

            let mut replacement = Vec::with_capacity(3);
            if !prefix.is_empty() {
                replacement.push(build::run_like(tree, run, prefix));
            }

            let bar = build::run_like(tree, run, "‖");
            let e = build::slot(tree, "m:e", &[bar]);
            let (first, rest) = digits.split_at(1);
            let sub_run = build::run_like(tree, run, first);
            let sub = build::slot(tree, "m:sub", &[sub_run]);
            let script = if rest.is_empty() {
                build::element(tree, "m:sSub", &[e, sub])
            } else {
                let sup_run = build::run_like(tree, run, rest);
                let sup = build::slot(tree, "m:sup", &[sup_run]);
                build::element(tree, "m:sSubSup", &[e, sub, sup])
            };
            replacement.push(script);

            if !suffix.is_empty() {
                let suffix_run = build::run_like(tree, run, suffix);
                replacement.push(suffix_run);
                work.push(suffix_run);
            }

            let (Some(parent), Some(index)) = (tree.parent(run), tree.index_in_parent(run)) else {
                continue;
            };
            tree.detach(run);
            for (offset, node) in replacement.into_iter().enumerate() {
                tree.insert(parent, index + offset, node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixture::*;
    use super::*;

    #[test]
    fn test_single_digit_subscript() {
        let out = apply(&NormSubscript, &r("‖x‖1"));
        assert_eq!(
            out,
            format!(
                "{}<m:sSub><m:e>{}</m:e><m:sub>{}</m:sub></m:sSub>",
                r("‖x"),
                r("‖"),
                r("1")
            )
        );
    }

    #[test]
    fn test_two_digits_split_into_sub_and_sup() {
        let out = apply(&NormSubscript, &r("‖v‖₁₂ + y"));
        assert_eq!(
            out,
            format!(
                "{}<m:sSubSup><m:e>{}</m:e><m:sub>{}</m:sub><m:sup>{}</m:sup></m:sSubSup>{}",
                r("‖v"),
                r("‖"),
                r("1"),
                r("2"),
                r(" + y")
            )
        );
    }

    #[test]
    fn test_run_properties_are_kept() {
        let inner = r#"<m:r><m:rPr><m:sty m:val="b"/></m:rPr><m:t>‖3</m:t></m:r>"#;
        let out = apply(&NormSubscript, inner);
        assert_eq!(out.matches(r#"<m:sty m:val="b"/>"#).count(), 2);
    }

    #[test]
    fn test_idempotent() {
        let once = apply(&NormSubscript, &r("a‖1b‖23"));
        assert_eq!(once.matches("<m:sSub>").count(), 1);
        assert_eq!(once.matches("<m:sSubSup>").count(), 1);
        assert_eq!(apply(&NormSubscript, &once), once);
    }

    #[test]
    fn test_plain_runs_untouched() {
        let inner = format!("{}{}", r("‖x‖"), r("12"));
        assert_eq!(apply(&NormSubscript, &inner), inner);
    }
}
