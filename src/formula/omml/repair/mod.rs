// OMML structural repair
//
// A registry of named passes run in a fixed order over one parsed fragment.
// Each pass mutates the tree in place and is idempotent on its own. Passes
// that rewrite sibling runs (integral runs, brackets, fractions) come before
// the generic delimiter promotion so nothing is wrapped twice.

mod delim;
mod fraction;
mod integral;
mod norm;
mod script;
mod strip;
mod text;

pub use delim::{BraceMatrix, BracketAroundTall, DelimiterPromotion};
pub use fraction::BracketedFraction;
pub use integral::{IntegralLimits, IntegralRuns, IntegrandAdoption};
pub use norm::NormSubscript;
pub use script::{InvalidScripts, ScriptParens};
pub use strip::StripForeign;
pub use text::{TextNormalization, UndefinedStyle};

use super::invoke::has_fraction_marker;
use crate::common::xml::{NodeId, OMML_NS, XmlTree};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Name of the synthetic wrapper element around a parsed fragment.
pub const WRAPPER: &str = "omml-fragment";

/// Shared facts the passes read and report into.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RepairState {
    /// The raw converter output has an `m:f` directly under an `m:oMath`
    pub top_level_fraction: bool,
    /// `bracketed-fraction` rebuilt at least one fraction
    pub bracketed_fraction: bool,
}

impl RepairState {
    /// Initial state for a freshly parsed fragment.
    pub fn for_tree(tree: &XmlTree) -> Self {
        let top_level_fraction = tree
            .descendants_named(tree.root(), "m:f")
            .into_iter()
            .any(|f| tree.parent(f).is_some_and(|p| tree.is(p, "m:oMath")));
        Self {
            top_level_fraction,
            bracketed_fraction: false,
        }
    }
}

/// One named, idempotent rewrite over a fragment tree.
pub trait RepairPass: Send + Sync {
    /// Stable name used for configuration and logging.
    fn name(&self) -> &'static str;

    /// Rewrite the tree in place.
    fn apply(&self, tree: &mut XmlTree, state: &mut RepairState);
}

/// Ordered registry of repair passes.
pub struct RepairPipeline {
    passes: Vec<Box<dyn RepairPass>>,
    disabled: HashSet<String>,
}

impl Default for RepairPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for RepairPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepairPipeline")
            .field("passes", &self.names())
            .field("disabled", &self.disabled)
            .finish()
    }
}

impl RepairPipeline {
    /// A pipeline with no passes.
    pub fn empty() -> Self {
        Self {
            passes: Vec::new(),
            disabled: HashSet::new(),
        }
    }

    /// The full pass list in its canonical order.
    pub fn standard() -> Self {
        Self::empty()
            .with_pass(StripForeign)
            .with_pass(IntegralRuns)
            .with_pass(NormSubscript)
            .with_pass(IntegrandAdoption)
            .with_pass(IntegralLimits)
            .with_pass(ScriptParens)
            .with_pass(BracketAroundTall)
            .with_pass(BraceMatrix)
            .with_pass(BracketedFraction)
            .with_pass(DelimiterPromotion)
            .with_pass(InvalidScripts)
            .with_pass(UndefinedStyle)
            .with_pass(TextNormalization)
    }

    /// Register a pass after the existing ones.
    pub fn with_pass(mut self, pass: impl RepairPass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Disable a pass by name. Unknown names are ignored.
    pub fn disable(mut self, name: impl Into<String>) -> Self {
        self.disabled.insert(name.into());
        self
    }

    /// Names of the registered passes, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Whether a pass is registered and enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        !self.disabled.contains(name) && self.passes.iter().any(|p| p.name() == name)
    }

    /// Run every enabled pass except those named in `skip`.
    pub fn run(&self, tree: &mut XmlTree, state: &mut RepairState, skip: &[&str]) {
        for pass in &self.passes {
            let name = pass.name();
            if self.disabled.contains(name) || skip.contains(&name) {
                continue;
            }
            pass.apply(tree, state);
        }
    }

    /// Repair raw converter output and serialize it.
    ///
    /// Returns `None` when the output cannot be used: it is malformed and
    /// holds no `<m:oMath`, or a fraction present in it could not be kept.
    pub fn repair(&self, raw: &str) -> Option<String> {
        let mut tree = match parse_omml(raw) {
            Ok(tree) => tree,
            Err(err) => {
                warn!(
                    target: "formula::omml",
                    op = "repair",
                    error = %err,
                    "converter output is not well-formed"
                );
                return raw.contains("<m:oMath").then(|| raw.to_string());
            },
        };

        let mut state = RepairState::for_tree(&tree);
        self.run(&mut tree, &mut state, &[]);

        if has_fraction_marker(raw) && !has_fraction(&tree) {
            debug!(
                target: "formula::omml",
                op = "repair",
                "fraction lost, rerunning without delimiter promotion"
            );
            tree = parse_omml(raw).ok()?;
            let mut state = RepairState::for_tree(&tree);
            self.run(&mut tree, &mut state, &[DelimiterPromotion::NAME]);
            if !has_fraction(&tree) {
                warn!(
                    target: "formula::omml",
                    op = "repair",
                    "fraction lost even without delimiter promotion"
                );
                return None;
            }
        }

        let out = serialize_math(&tree);
        (!out.is_empty()).then_some(out)
    }
}

/// Parse converter output under the wrapper, declaring the OMML namespace.
pub fn parse_omml(raw: &str) -> Result<XmlTree, crate::common::xml::XmlError> {
    XmlTree::parse_fragment(raw, WRAPPER, &[("m", OMML_NS)])
}

fn has_fraction(tree: &XmlTree) -> bool {
    !tree.descendants_named(tree.root(), "m:f").is_empty()
}

/// Serialize the repaired fragment as a sequence of `m:oMath` elements.
///
/// `m:oMathPara` is unwrapped; loose math content is wrapped in one
/// `m:oMath`. Namespace declarations are dropped.
pub fn serialize_math(tree: &XmlTree) -> String {
    let root = tree.root();
    let mut out = String::new();
    let mut loose = String::new();
    for &child in tree.children(root) {
        if tree.is(child, "m:oMathPara") {
            for &inner in tree.children(child) {
                if tree.is(inner, "m:oMath") {
                    out.push_str(&tree.serialize_without_namespaces(inner));
                }
            }
        } else if tree.is(child, "m:oMath") {
            out.push_str(&tree.serialize_without_namespaces(child));
        } else if tree.element(child).is_some() {
            loose.push_str(&tree.serialize_without_namespaces(child));
        }
    }
    if !loose.is_empty() {
        out.push_str("<m:oMath>");
        out.push_str(&loose);
        out.push_str("</m:oMath>");
    }
    out
}

/// Every attached element that can hold math content, parents first.
pub(crate) fn containers(tree: &XmlTree) -> Vec<NodeId> {
    let root = tree.root();
    let mut out = vec![root];
    out.extend(
        tree.descendants(root)
            .into_iter()
            .filter(|&n| tree.element(n).is_some() && !tree.children(n).is_empty()),
    );
    out
}

#[cfg(test)]
pub(crate) mod fixture {
    use super::*;

    /// `<m:r><m:t>text</m:t></m:r>`
    pub fn r(text: &str) -> String {
        format!("<m:r><m:t>{text}</m:t></m:r>")
    }

    /// Parse `inner` as the content of one `m:oMath`.
    pub fn omath(inner: &str) -> XmlTree {
        parse_omml(&format!("<m:oMath>{inner}</m:oMath>")).unwrap()
    }

    /// Content of the first `m:oMath`.
    pub fn body(tree: &XmlTree) -> String {
        let math = tree.descendants_named(tree.root(), "m:oMath")[0];
        tree.serialize_children(math)
    }

    /// Run one pass with a default state and return the body.
    pub fn apply(pass: &dyn RepairPass, inner: &str) -> String {
        let mut tree = omath(inner);
        let mut state = RepairState::for_tree(&tree);
        pass.apply(&mut tree, &mut state);
        body(&tree)
    }
}

#[cfg(test)]
mod tests {
    use super::fixture::*;
    use super::*;

    #[test]
    fn test_standard_order() {
        assert_eq!(
            RepairPipeline::standard().names(),
            vec![
                "strip-foreign",
                "integral-runs",
                "norm-subscript",
                "integrand-adoption",
                "integral-limits",
                "script-parens",
                "bracket-around-tall",
                "brace-matrix",
                "bracketed-fraction",
                "delimiter-promotion",
                "invalid-scripts",
                "undefined-style",
                "text-normalization",
            ]
        );
    }

    #[test]
    fn test_disable() {
        let p = RepairPipeline::standard().disable("brace-matrix");
        assert!(!p.is_enabled("brace-matrix"));
        assert!(p.is_enabled("delimiter-promotion"));
        assert!(!p.is_enabled("no-such-rule"));
    }

    #[test]
    fn test_serialization_strips_namespaces_and_para() {
        let raw = format!(
            r#"<m:oMathPara xmlns:m="{OMML_NS}"><m:oMath>{}</m:oMath></m:oMathPara>"#,
            r("x")
        );
        let out = RepairPipeline::standard().repair(&raw).unwrap();
        assert_eq!(out, format!("<m:oMath>{}</m:oMath>", r("x")));
    }

    #[test]
    fn test_malformed_output() {
        let p = RepairPipeline::standard();
        assert_eq!(p.repair("<m:oMath><m:r>").as_deref(), Some("<m:oMath><m:r>"));
        assert_eq!(p.repair("<m:r><m:t>x</m:r>"), None);
    }

    #[test]
    fn test_round_trip_matrix_delimiters() {
        let matrix = format!(
            "<m:m><m:mr><m:e>{}</m:e><m:e>{}</m:e></m:mr><m:mr><m:e>{}</m:e><m:e>{}</m:e></m:mr></m:m>",
            r("a"),
            r("b"),
            r("c"),
            r("d")
        );
        let raw = format!("<m:oMath>{}{matrix}{}</m:oMath>", r("("), r(")"));
        let out = RepairPipeline::standard().repair(&raw).unwrap();
        let tree = parse_omml(&out).unwrap();
        let ds = tree.descendants_named(tree.root(), "m:d");
        assert_eq!(ds.len(), 1);
        let d = ds[0];
        assert_eq!(
            crate::formula::omml::build::property_value(&tree, d, "m:dPr", "m:begChr").as_deref(),
            Some("(")
        );
        assert_eq!(
            crate::formula::omml::build::property_value(&tree, d, "m:dPr", "m:endChr").as_deref(),
            Some(")")
        );
        let e = tree.child_named(d, "m:e").unwrap();
        let ms = tree.element_children(e);
        assert_eq!(ms.len(), 1);
        assert!(tree.is(ms[0], "m:m"));
        assert_eq!(tree.descendants_named(ms[0], "m:e").len(), 4);
    }

    #[test]
    fn test_top_level_fraction_blocks_promotion() {
        let inner = format!(
            "<m:f><m:num>{}</m:num><m:den>{}</m:den></m:f>{}<m:rad><m:deg/><m:e>{}</m:e></m:rad>{}",
            r("1"),
            r("2"),
            r("("),
            r("x"),
            r(")")
        );
        let raw = format!("<m:oMath>{inner}</m:oMath>");
        let out = RepairPipeline::standard().repair(&raw).unwrap();
        assert!(!out.contains("<m:d>"));
        assert!(out.contains("<m:f>"));
    }

    /// Promotes even around fractions, then drops them.
    struct DropFractions;

    impl RepairPass for DropFractions {
        fn name(&self) -> &'static str {
            "drop-fractions"
        }

        fn apply(&self, tree: &mut XmlTree, _state: &mut RepairState) {
            for f in tree.descendants_named(tree.root(), "m:f") {
                tree.detach(f);
            }
        }
    }

    #[test]
    fn test_fraction_loss_fails_the_strategy() {
        let raw = format!(
            "<m:oMath><m:f><m:num>{}</m:num><m:den>{}</m:den></m:f></m:oMath>",
            r("1"),
            r("2")
        );
        let p = RepairPipeline::standard().with_pass(DropFractions);
        assert_eq!(p.repair(&raw), None);

        let p = RepairPipeline::standard()
            .with_pass(DropFractions)
            .disable("drop-fractions");
        assert!(p.repair(&raw).unwrap().contains("<m:f>"));
    }
}
