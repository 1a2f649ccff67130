// OMML construction helpers shared by the converter and the repair passes

use crate::common::xml::{NodeId, XmlTree};

/// Attribute key for OMML property values.
pub const VAL: &str = "m:val";

/// Create an element with the given children appended in order.
pub fn element(tree: &mut XmlTree, name: &str, children: &[NodeId]) -> NodeId {
    let node = tree.create_element(name);
    for &child in children {
        tree.append(node, child);
    }
    node
}

/// Create a property element `<name m:val="value"/>`.
pub fn property(tree: &mut XmlTree, name: &str, value: &str) -> NodeId {
    let node = tree.create_element(name);
    tree.set_attr(node, VAL, value);
    node
}

/// Create a math run `<m:r>[<m:rPr><m:sty m:val=".."/></m:rPr>]<m:t>..</m:t></m:r>`.
pub fn run(tree: &mut XmlTree, text: &str, style: Option<&str>) -> NodeId {
    let r = tree.create_element("m:r");
    if let Some(style) = style {
        let sty = property(tree, "m:sty", style);
        let rpr = element(tree, "m:rPr", &[sty]);
        tree.append(r, rpr);
    }
    let t = text_element(tree, text);
    tree.append(r, t);
    r
}

/// Create `<m:t>text</m:t>`.
pub fn text_element(tree: &mut XmlTree, text: &str) -> NodeId {
    let t = tree.create_element("m:t");
    if !text.is_empty() {
        let content = tree.create_text(text);
        tree.append(t, content);
    }
    t
}

/// A run whose `m:rPr` is a copy of `template`'s, if it has one.
pub fn run_like(tree: &mut XmlTree, template: NodeId, text: &str) -> NodeId {
    let r = tree.create_element("m:r");
    if let Some(rpr) = tree.child_named(template, "m:rPr") {
        let copy = tree.clone_subtree(rpr);
        tree.append(r, copy);
    }
    let t = text_element(tree, text);
    tree.append(r, t);
    r
}

/// Text of an `m:r`, `None` for anything else.
pub fn run_text(tree: &XmlTree, node: NodeId) -> Option<String> {
    if !tree.is(node, "m:r") {
        return None;
    }
    let mut text = String::new();
    for &child in tree.children(node) {
        if tree.is(child, "m:t") {
            text.push_str(&tree.text_content(child));
        }
    }
    Some(text)
}

/// Trimmed run text, `None` for anything that is not a run.
pub fn trimmed_run_text(tree: &XmlTree, node: NodeId) -> Option<String> {
    run_text(tree, node).map(|t| t.trim().to_string())
}

/// Whether `node` is a run whose trimmed text equals `expected`.
pub fn run_is(tree: &XmlTree, node: NodeId, expected: &str) -> bool {
    trimmed_run_text(tree, node).is_some_and(|t| t == expected)
}

/// Create an argument slot (`m:e`, `m:sub`, `m:num`, ...) holding `content`.
pub fn slot(tree: &mut XmlTree, name: &str, content: &[NodeId]) -> NodeId {
    element(tree, name, content)
}

/// Create a stretchy delimiter `m:d` around `content`.
///
/// `end` may be empty for a one-sided delimiter.
pub fn delimiter(tree: &mut XmlTree, begin: &str, end: &str, content: &[NodeId]) -> NodeId {
    let beg_chr = property(tree, "m:begChr", begin);
    let end_chr = property(tree, "m:endChr", end);
    let dpr = element(tree, "m:dPr", &[beg_chr, end_chr]);
    let e = slot(tree, "m:e", content);
    element(tree, "m:d", &[dpr, e])
}

/// Create an `m:nary` over `chr`.
///
/// Absent limits are hidden and get an empty slot; the integrand slot holds
/// `body`.
pub fn nary(
    tree: &mut XmlTree,
    chr: &str,
    lim_loc: &str,
    sub: Option<&[NodeId]>,
    sup: Option<&[NodeId]>,
    body: &[NodeId],
) -> NodeId {
    let mut props = vec![property(tree, "m:chr", chr), property(tree, "m:limLoc", lim_loc)];
    if sub.is_none() {
        props.push(property(tree, "m:subHide", "1"));
    }
    if sup.is_none() {
        props.push(property(tree, "m:supHide", "1"));
    }
    let pr = element(tree, "m:naryPr", &props);
    let sub = slot(tree, "m:sub", sub.unwrap_or(&[]));
    let sup = slot(tree, "m:sup", sup.unwrap_or(&[]));
    let e = slot(tree, "m:e", body);
    element(tree, "m:nary", &[pr, sub, sup, e])
}

/// Value of a property element nested in a properties container, e.g.
/// `m:naryPr/m:chr/@m:val`.
pub fn property_value(tree: &XmlTree, node: NodeId, container: &str, name: &str) -> Option<String> {
    let pr = tree.child_named(node, container)?;
    let prop = tree.child_named(pr, name)?;
    tree.attr(prop, VAL).map(str::to_string)
}

/// Set a property inside a properties container, creating both as needed.
///
/// A new container is inserted as the first child of `node`.
pub fn set_property(tree: &mut XmlTree, node: NodeId, container: &str, name: &str, value: &str) {
    let pr = match tree.child_named(node, container) {
        Some(pr) => pr,
        None => {
            let pr = tree.create_element(container);
            tree.insert(node, 0, pr);
            pr
        },
    };
    match tree.child_named(pr, name) {
        Some(prop) => tree.set_attr(prop, VAL, value),
        None => {
            let prop = property(tree, name, value);
            tree.append(pr, prop);
        },
    }
}

/// Character of an `m:nary`; OMML defaults a missing `m:chr` to `∫`.
pub fn nary_char(tree: &XmlTree, node: NodeId) -> String {
    property_value(tree, node, "m:naryPr", "m:chr").unwrap_or_else(|| "∫".to_string())
}

/// Whether an element has no element or non-blank text children.
pub fn is_empty_slot(tree: &XmlTree, node: NodeId) -> bool {
    tree.children(node)
        .iter()
        .all(|&c| tree.text(c).is_some_and(|t| t.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_serialization() {
        let mut tree = XmlTree::new("w");
        let r = run(&mut tree, "sin", Some("p"));
        assert_eq!(
            tree.serialize(r),
            r#"<m:r><m:rPr><m:sty m:val="p"/></m:rPr><m:t>sin</m:t></m:r>"#
        );
        assert_eq!(run_text(&tree, r).as_deref(), Some("sin"));
    }

    #[test]
    fn test_delimiter() {
        let mut tree = XmlTree::new("w");
        let x = run(&mut tree, "x", None);
        let d = delimiter(&mut tree, "{", "", &[x]);
        assert_eq!(
            tree.serialize(d),
            r#"<m:d><m:dPr><m:begChr m:val="{"/><m:endChr m:val=""/></m:dPr><m:e><m:r><m:t>x</m:t></m:r></m:e></m:d>"#
        );
    }

    #[test]
    fn test_nary_hides_missing_limits() {
        let mut tree = XmlTree::new("w");
        let zero = run(&mut tree, "0", None);
        let n = nary(&mut tree, "∫", "undOvr", Some(&[zero]), None, &[]);
        assert_eq!(nary_char(&tree, n), "∫");
        assert_eq!(property_value(&tree, n, "m:naryPr", "m:supHide").as_deref(), Some("1"));
        assert_eq!(property_value(&tree, n, "m:naryPr", "m:subHide"), None);
        let e = tree.child_named(n, "m:e").unwrap();
        assert!(is_empty_slot(&tree, e));
    }

    #[test]
    fn test_set_property_creates_container() {
        let mut tree = XmlTree::new("w");
        let n = tree.create_element("m:nary");
        set_property(&mut tree, n, "m:naryPr", "m:limLoc", "undOvr");
        set_property(&mut tree, n, "m:naryPr", "m:limLoc", "subSup");
        assert_eq!(
            tree.serialize(n),
            r#"<m:nary><m:naryPr><m:limLoc m:val="subSup"/></m:naryPr></m:nary>"#
        );
    }
}
