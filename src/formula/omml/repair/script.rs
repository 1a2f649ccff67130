// Script repairs: delimiters inside script bases, and structurally invalid
// scripts

use super::{RepairPass, RepairState};
use crate::common::xml::{NodeId, XmlTree};
use crate::formula::omml::build;
use crate::formula::omml::lookup::is_delimiter_pair;

const SCRIPTS: &[&str] = &["m:sSub", "m:sSup", "m:sSubSup"];

fn scripts(tree: &XmlTree) -> Vec<NodeId> {
    tree.descendants(tree.root())
        .into_iter()
        .filter(|&n| tree.is_any(n, SCRIPTS))
        .collect()
}

/// Wraps bracketed script bases, `(a+b)^2`, in a stretchy `m:d` inside the
/// base slot.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptParens;

impl ScriptParens {
    pub const NAME: &'static str = "script-parens";
}

impl RepairPass for ScriptParens {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, tree: &mut XmlTree, _state: &mut RepairState) {
        for script in scripts(tree) {
            let Some(base) = tree.child_named(script, "m:e") else {
                continue;
            };
            let kids = tree.element_children(base);
            if kids.len() < 3 {
                continue;
            }
            let (first, last) = (kids[0], kids[kids.len() - 1]);
            let (Some(open), Some(close)) = (
                build::trimmed_run_text(tree, first),
                build::trimmed_run_text(tree, last),
            ) else {
                continue;
            };
            if !is_delimiter_pair(&open, &close) {
                continue;
            }
            let d = build::delimiter(tree, &open, &close, &kids[1..kids.len() - 1]);
            tree.detach(first);
            tree.detach(last);
            tree.append(base, d);
        }
    }
}

/// Drops scripts without a base and unwraps scripts missing a required
/// sub or sup slot to their base content.
#[derive(Debug, Default, Clone, Copy)]
pub struct InvalidScripts;

impl InvalidScripts {
    pub const NAME: &'static str = "invalid-scripts";
}

impl RepairPass for InvalidScripts {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, tree: &mut XmlTree, _state: &mut RepairState) {
        // unwrapping a script can expose an invalid ancestor
        for _ in 0..2 {
            for script in scripts(tree) {
                if !tree.is_attached(script) {
                    continue;
                }
                let Some(base) = tree.child_named(script, "m:e") else {
                    tree.detach(script);
                    continue;
                };
                let needs_sub = !tree.is(script, "m:sSup");
                let needs_sup = !tree.is(script, "m:sSub");
                let missing = (needs_sub && tree.child_named(script, "m:sub").is_none())
                    || (needs_sup && tree.child_named(script, "m:sup").is_none());
                if missing {
                    tree.detach(base);
                    tree.replace(script, base);
                    tree.unwrap_node(base);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixture::*;
    use super::*;

    #[test]
    fn test_parens_in_script_base() {
        let inner = format!(
            "<m:sSup><m:e>{}{}{}{}{}</m:e><m:sup>{}</m:sup></m:sSup>",
            r("("),
            r("a"),
            r("+"),
            r("b"),
            r(")"),
            r("2")
        );
        let out = apply(&ScriptParens, &inner);
        assert_eq!(
            out,
            format!(
                r#"<m:sSup><m:e><m:d><m:dPr><m:begChr m:val="("/><m:endChr m:val=")"/></m:dPr><m:e>{}{}{}</m:e></m:d></m:e><m:sup>{}</m:sup></m:sSup>"#,
                r("a"),
                r("+"),
                r("b"),
                r("2")
            )
        );
        assert_eq!(apply(&ScriptParens, &out), out);
    }

    #[test]
    fn test_mismatched_base_untouched() {
        let inner = format!(
            "<m:sSub><m:e>{}{}{}</m:e><m:sub>{}</m:sub></m:sSub>",
            r("("),
            r("a"),
            r("]"),
            r("1")
        );
        assert_eq!(apply(&ScriptParens, &inner), inner);
    }

    #[test]
    fn test_script_without_base_removed() {
        let inner = format!("{}<m:sSub><m:sub>{}</m:sub></m:sSub>{}", r("a"), r("1"), r("b"));
        let mut tree = omath(&inner);
        let math = tree.descendants_named(tree.root(), "m:oMath")[0];
        let before = tree.children(math).len();
        let mut state = RepairState::default();
        InvalidScripts.apply(&mut tree, &mut state);
        assert_eq!(tree.children(math).len(), before - 1);
        assert_eq!(body(&tree), format!("{}{}", r("a"), r("b")));
    }

    #[test]
    fn test_script_without_sub_unwrapped() {
        let inner = format!("<m:sSubSup><m:e>{}{}</m:e><m:sup>{}</m:sup></m:sSubSup>", r("x"), r("y"), r("2"));
        assert_eq!(apply(&InvalidScripts, &inner), format!("{}{}", r("x"), r("y")));
    }

    #[test]
    fn test_nested_invalid_scripts() {
        let inner = format!(
            "<m:sSup><m:e><m:sSub><m:e>{}</m:e></m:sSub></m:e></m:sSup>",
            r("x")
        );
        assert_eq!(apply(&InvalidScripts, &inner), r("x"));
    }

    #[test]
    fn test_valid_scripts_untouched() {
        let inner = format!("<m:sSub><m:e>{}</m:e><m:sub>{}</m:sub></m:sSub>", r("x"), r("1"));
        assert_eq!(apply(&InvalidScripts, &inner), inner);
    }
}
