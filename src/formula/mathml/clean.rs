// MathML pre-cleaning
//
// Strips renderer decorations the converter mishandles: semantic wrappers
// and annotations, style wrappers, invisible operators, typographic spaces,
// stretchy hints on operators and namespace declarations.

use crate::common::text::{is_zero_width, normalize_math_text};
use crate::common::xml::{NodeData, NodeId, XmlTree};
use crate::formula::error::Result;

/// Attributes removed from `<mo>` so the converter sees no stretchy hints.
const MO_STRIPPED_ATTRS: &[&str] = &[
    "fence",
    "stretchy",
    "symmetric",
    "largeop",
    "movablelimits",
    "form",
    "lspace",
    "rspace",
    "minsize",
    "maxsize",
];

const WRAPPER: &str = "mathml-fragment";

/// Clean a MathML string for the converter.
///
/// Fails only when the input is not well-formed XML.
pub fn clean_mathml(mathml: &str) -> Result<String> {
    let mut tree = XmlTree::parse_fragment(mathml, WRAPPER, &[])?;
    clean_tree(&mut tree);
    Ok(tree.serialize_children(tree.root()))
}

/// Clean a parsed MathML tree in place.
pub fn clean_tree(tree: &mut XmlTree) {
    let root = tree.root();
    strip_prefixes(tree, root);
    drop_semantics(tree, root);

    for node in tree.descendants(root) {
        let name = match tree.data(node) {
            NodeData::Text(_) => {
                normalize_text(tree, node);
                continue;
            },
            NodeData::Element(e) => e.name.clone(),
        };
        match name.as_str() {
            "mstyle" => tree.unwrap_node(node),
            "mtext" => flatten_mtext(tree, node),
            "mo" => {
                strip_namespace_attrs(tree, node);
                tree.retain_attrs(node, |k, _| !MO_STRIPPED_ATTRS.contains(&k));
            },
            _ => strip_namespace_attrs(tree, node),
        }
    }
}

/// `mml:mi` and friends become plain local names.
fn strip_prefixes(tree: &mut XmlTree, root: NodeId) {
    for node in tree.descendants(root) {
        let local = match tree.element(node) {
            Some(e) if e.prefix().is_some() => e.local_name().to_string(),
            _ => continue,
        };
        tree.rename(node, &local);
    }
}

/// `<semantics>` keeps its first presentation child; annotations go away.
fn drop_semantics(tree: &mut XmlTree, root: NodeId) {
    for node in tree.descendants(root) {
        if tree.is_any(node, &["annotation", "annotation-xml"]) {
            tree.detach(node);
        }
    }
    for node in tree.descendants_named(root, "semantics").into_iter().rev() {
        match tree.element_children(node).first().copied() {
            Some(first) => tree.replace(node, first),
            None => tree.detach(node),
        }
    }
}

fn strip_namespace_attrs(tree: &mut XmlTree, node: NodeId) {
    tree.retain_attrs(node, |k, _| k != "xmlns" && !k.starts_with("xmlns:"));
}

fn normalize_text(tree: &mut XmlTree, node: NodeId) {
    let Some(text) = tree.text(node) else {
        return;
    };
    let cleaned = normalize_math_text(text);
    if cleaned.is_empty() {
        tree.detach(node);
    } else if cleaned != text {
        tree.set_text(node, cleaned);
    }
}

/// `<mtext>` loses nested markup and zero-width characters and becomes `<mi>`.
fn flatten_mtext(tree: &mut XmlTree, node: NodeId) {
    let text: String = tree
        .text_content(node)
        .chars()
        .filter(|&c| !is_zero_width(c))
        .collect();
    let text = normalize_math_text(&text);
    for child in tree.children(node).to_vec() {
        tree.detach(child);
    }
    if !text.is_empty() {
        let t = tree.create_text(&text);
        tree.append(node, t);
    }
    tree.rename(node, "mi");
    tree.retain_attrs(node, |k, _| k == "mathvariant");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantics_and_annotation_removed() {
        let input = r#"<math xmlns="http://www.w3.org/1998/Math/MathML"><semantics><mrow><mi>x</mi></mrow><annotation encoding="application/x-tex">x</annotation></semantics></math>"#;
        assert_eq!(clean_mathml(input).unwrap(), "<math><mrow><mi>x</mi></mrow></math>");
    }

    #[test]
    fn test_mstyle_unwrapped() {
        let input = r#"<math><mstyle displaystyle="true" scriptlevel="0"><mi>a</mi><mo>+</mo><mi>b</mi></mstyle></math>"#;
        assert_eq!(
            clean_mathml(input).unwrap(),
            "<math><mi>a</mi><mo>+</mo><mi>b</mi></math>"
        );
    }

    #[test]
    fn test_invisible_operators_and_spaces() {
        let input = "<math><mi>f</mi><mo>\u{2061}</mo><mi>x</mi><mtext>a\u{00A0}b</mtext></math>";
        assert_eq!(
            clean_mathml(input).unwrap(),
            "<math><mi>f</mi><mo/><mi>x</mi><mi>a b</mi></math>"
        );
        let entity = "<math><mtext>&nbsp;if</mtext></math>";
        assert_eq!(clean_mathml(entity).unwrap(), "<math><mi> if</mi></math>");
    }

    #[test]
    fn test_mtext_flattened() {
        let input = "<math><mtext>a<mspace/>b\u{200B}c</mtext></math>";
        assert_eq!(clean_mathml(input).unwrap(), "<math><mi>abc</mi></math>");
    }

    #[test]
    fn test_mo_attributes_stripped() {
        let input = r#"<math><mo fence="true" stretchy="true" form="prefix" lspace="0em" mathcolor="red">(</mo></math>"#;
        assert_eq!(
            clean_mathml(input).unwrap(),
            r#"<math><mo mathcolor="red">(</mo></math>"#
        );
    }

    #[test]
    fn test_prefixed_names() {
        let input = r#"<mml:math xmlns:mml="http://www.w3.org/1998/Math/MathML"><mml:mi>x</mml:mi></mml:math>"#;
        assert_eq!(clean_mathml(input).unwrap(), "<math><mi>x</mi></math>");
    }

    #[test]
    fn test_malformed_is_error() {
        assert!(clean_mathml("<math><mi>x</math>").is_err());
    }
}
