// Stretchy delimiter reconstruction from operator runs

use super::fraction::BracketedFraction;
use super::{RepairPass, RepairState, containers};
use crate::common::xml::{NodeId, XmlTree};
use crate::formula::omml::build;
use crate::formula::omml::lookup::{closing_delimiter, is_tall};

fn tall(tree: &XmlTree, node: NodeId) -> bool {
    tree.name(node).is_some_and(is_tall)
}

/// Collapse `children[open..=close]` into one `m:d` whose content is the
/// nodes strictly between the two runs.
fn collapse(tree: &mut XmlTree, children: &[NodeId], open: usize, close: usize, begin: &str, end: &str) -> NodeId {
    let open_run = children[open];
    let close_run = children[close];
    let d = build::delimiter(tree, begin, end, &children[open + 1..close]);
    tree.replace(open_run, d);
    tree.detach(close_run);
    d
}

/// Wraps `[` ... `]` spans that contain at least one tall construct in a
/// stretchy square bracket. Brackets are matched with depth tracking.
///
/// Spans shaped like a bracketed fraction are left for
/// [`BracketedFraction`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BracketAroundTall;

impl BracketAroundTall {
    pub const NAME: &'static str = "bracket-around-tall";

    /// Collapse the first eligible span of a container; `false` when none.
    fn collapse_once(tree: &mut XmlTree, container: NodeId) -> bool {
        let children = tree.children(container).to_vec();
        for (open, &node) in children.iter().enumerate() {
            if !build::run_is(tree, node, "[") || BracketedFraction::matches_at(tree, &children, open) {
                continue;
            }
            let mut depth = 0usize;
            let mut close = None;
            for (j, &candidate) in children.iter().enumerate().skip(open + 1) {
                if build::run_is(tree, candidate, "[") {
                    depth += 1;
                } else if build::run_is(tree, candidate, "]") {
                    if depth == 0 {
                        close = Some(j);
                        break;
                    }
                    depth -= 1;
                }
            }
            let Some(close) = close else {
                continue;
            };
            if children[open + 1..close].iter().any(|&c| tall(tree, c)) {
                collapse(tree, &children, open, close, "[", "]");
                return true;
            }
        }
        false
    }
}

impl RepairPass for BracketAroundTall {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, tree: &mut XmlTree, _state: &mut RepairState) {
        for container in containers(tree) {
            while tree.is_attached(container) && Self::collapse_once(tree, container) {}
        }
    }
}

/// A `{` run directly followed by a matrix becomes a one-sided brace
/// around the matrix (systems of equations, `cases`).
#[derive(Debug, Default, Clone, Copy)]
pub struct BraceMatrix;

impl BraceMatrix {
    pub const NAME: &'static str = "brace-matrix";
}

impl RepairPass for BraceMatrix {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, tree: &mut XmlTree, _state: &mut RepairState) {
        for container in containers(tree) {
            if !tree.is_attached(container) {
                continue;
            }
            let children = tree.children(container).to_vec();
            for (i, &node) in children.iter().enumerate() {
                if !build::run_is(tree, node, "{") {
                    continue;
                }
                let Some(&matrix) = children.get(i + 1) else {
                    continue;
                };
                if !tree.is(matrix, "m:m") {
                    continue;
                }
                // a matching close brace is left to delimiter promotion
                if children.get(i + 2).is_some_and(|&c| build::run_is(tree, c, "}")) {
                    continue;
                }
                let d = build::delimiter(tree, "{", "", &[matrix]);
                tree.replace(node, d);
            }
        }
    }
}

/// Collapses `open-run, tall construct, close-run` triples into `m:d`,
/// repeating until no triple is left.
///
/// Skipped when a bracketed fraction was rebuilt or the converter output
/// has a top-level fraction.
#[derive(Debug, Default, Clone, Copy)]
pub struct DelimiterPromotion;

impl DelimiterPromotion {
    pub const NAME: &'static str = "delimiter-promotion";

    fn find_triple(tree: &XmlTree, children: &[NodeId]) -> Option<(usize, String, String)> {
        children.windows(3).enumerate().find_map(|(i, w)| {
            let open = build::trimmed_run_text(tree, w[0])?;
            let close = closing_delimiter(&open)?;
            (tall(tree, w[1]) && build::run_is(tree, w[2], close)).then(|| (i, open, close.to_string()))
        })
    }

    /// Run promotion regardless of the repair state.
    pub fn promote(tree: &mut XmlTree) {
        let mut work = containers(tree);
        while let Some(container) = work.pop() {
            if !tree.is_attached(container) {
                continue;
            }
            let children = tree.children(container).to_vec();
            if let Some((i, open, close)) = Self::find_triple(tree, &children) {
                collapse(tree, &children, i, i + 2, &open, &close);
                work.push(container);
            }
        }
    }
}

impl RepairPass for DelimiterPromotion {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, tree: &mut XmlTree, state: &mut RepairState) {
        if state.bracketed_fraction || state.top_level_fraction {
            return;
        }
        Self::promote(tree);
    }
}
