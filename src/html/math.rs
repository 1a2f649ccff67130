// Math element extraction from rendered HTML
//
// KaTeX renders each formula as `span.katex` (wrapped in `span.katex-display`
// for display math) holding a `span.katex-mathml` with the MathML tree and a
// `span.katex-html` with the visual rendering. The LaTeX source survives as
// an `annotation` with encoding `application/x-tex`.

use crate::common::xml::{MATHML_NS, escape_xml};
use crate::formula::MathElement;
use markup5ever_rcdom::{Handle, NodeData};

const TEX_ENCODING: &str = "application/x-tex";

/// Lowercase local name of an element node.
pub(crate) fn tag_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_ascii_lowercase().to_string()),
        _ => None,
    }
}

pub(crate) fn attr(node: &Handle, key: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| (*a.name.local).eq_ignore_ascii_case(key))
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

pub(crate) fn has_class(node: &Handle, class: &str) -> bool {
    attr(node, "class").is_some_and(|c| c.split_whitespace().any(|c| c == class))
}

/// Whether `node` hosts one formula: a KaTeX wrapper or a bare `<math>`.
pub(crate) fn is_math_host(node: &Handle) -> bool {
    has_class(node, "katex-display") || has_class(node, "katex") || tag_name(node).as_deref() == Some("math")
}

fn find_descendant(node: &Handle, pred: &dyn Fn(&Handle) -> bool) -> Option<Handle> {
    for child in node.children.borrow().iter() {
        if pred(child) {
            return Some(child.clone());
        }
        if let Some(found) = find_descendant(child, pred) {
            return Some(found);
        }
    }
    None
}

fn text_of(node: &Handle, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        _ => {
            for child in node.children.borrow().iter() {
                text_of(child, out);
            }
        },
    }
}

/// Serialize a `<math>` subtree as XML with the MathML default namespace.
pub(crate) fn serialize_mathml(node: &Handle) -> String {
    let mut out = String::with_capacity(512);
    write_node(node, true, &mut out);
    out
}

fn write_node(node: &Handle, is_root: bool, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => out.push_str(&escape_xml(&contents.borrow())),
        NodeData::Element { name, attrs, .. } => {
            out.push('<');
            out.push_str(&name.local);
            if is_root {
                out.push_str(&format!(r#" xmlns="{MATHML_NS}""#));
            }
            for a in attrs.borrow().iter() {
                let key = match &a.name.prefix {
                    Some(prefix) if &**prefix == "xmlns" => continue,
                    Some(prefix) => format!("{}:{}", prefix, a.name.local),
                    None if &*a.name.local == "xmlns" => continue,
                    None => a.name.local.to_string(),
                };
                out.push_str(&format!(r#" {}="{}""#, key, escape_xml(&a.value)));
            }
            let children = node.children.borrow();
            if children.is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for child in children.iter() {
                write_node(child, false, out);
            }
            out.push_str("</");
            out.push_str(&name.local);
            out.push('>');
        },
        _ => {},
    }
}

/// Build a [`MathElement`] from a math host node.
///
/// The LaTeX comes from the TeX annotation, falling back to the host's
/// `title` attribute. Display mode comes from `katex-display` or
/// `display="block"` on the `<math>` element.
pub(crate) fn element_from_host(node: &Handle, display_hint: bool) -> Option<MathElement> {
    let math = if tag_name(node).as_deref() == Some("math") {
        Some(node.clone())
    } else {
        find_descendant(node, &|n| tag_name(n).as_deref() == Some("math"))
    };

    let mut latex = math.as_ref().and_then(|m| {
        let annotation = find_descendant(m, &|n| {
            tag_name(n).as_deref() == Some("annotation")
                && attr(n, "encoding").is_some_and(|e| e.eq_ignore_ascii_case(TEX_ENCODING))
        })?;
        let mut text = String::new();
        text_of(&annotation, &mut text);
        Some(text)
    });
    if latex.as_deref().is_none_or(|l| l.trim().is_empty()) {
        latex = attr(node, "title");
    }

    let display = display_hint
        || has_class(node, "katex-display")
        || math
            .as_ref()
            .and_then(|m| attr(m, "display"))
            .is_some_and(|d| d.eq_ignore_ascii_case("block"));

    let element = MathElement::new(latex, math.as_ref().map(serialize_mathml), display);
    (element.latex.is_some() || element.mathml.is_some()).then_some(element)
}

/// Extract the first formula from an HTML fragment.
pub fn extract_math_element(fragment: &str) -> Option<MathElement> {
    let dom = super::parse_html(fragment);
    let host = find_descendant(&dom.document, &|n| is_math_host(n))?;
    element_from_host(&host, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KATEX_INLINE: &str = r#"<span class="katex"><span class="katex-mathml"><math xmlns="http://www.w3.org/1998/Math/MathML"><semantics><mrow><mi>x</mi><mo>+</mo><mn>1</mn></mrow><annotation encoding="application/x-tex">x+1</annotation></semantics></math></span><span class="katex-html" aria-hidden="true"><span class="base">x+1</span></span></span>"#;

    #[test]
    fn test_katex_inline() {
        let element = extract_math_element(KATEX_INLINE).unwrap();
        assert_eq!(element.latex.as_deref(), Some("x+1"));
        assert!(!element.display);
        let mathml = element.mathml.unwrap();
        assert!(mathml.starts_with(r#"<math xmlns="http://www.w3.org/1998/Math/MathML">"#));
        assert!(mathml.contains("<mi>x</mi><mo>+</mo><mn>1</mn>"));
        assert!(mathml.contains(r#"<annotation encoding="application/x-tex">x+1</annotation>"#));
    }

    #[test]
    fn test_katex_display() {
        let html = format!(r#"<p><span class="katex-display">{KATEX_INLINE}</span></p>"#);
        let element = extract_math_element(&html).unwrap();
        assert!(element.display);
    }

    #[test]
    fn test_bare_math_block() {
        let html = r#"<math display="block"><mfrac><mi>a</mi><mi>b</mi></mfrac></math>"#;
        let element = extract_math_element(html).unwrap();
        assert!(element.display);
        assert_eq!(element.latex, None);
        assert!(element.mathml.unwrap().contains("<mfrac><mi>a</mi><mi>b</mi></mfrac>"));
    }

    #[test]
    fn test_title_fallback() {
        let html = r#"<span class="katex" title="\alpha"></span>"#;
        let element = extract_math_element(html).unwrap();
        assert_eq!(element.latex.as_deref(), Some(r"\alpha"));
        assert_eq!(element.mathml, None);
    }

    #[test]
    fn test_no_math() {
        assert_eq!(extract_math_element("<p>plain <b>text</b></p>"), None);
        assert_eq!(extract_math_element(r#"<span class="katex"></span>"#), None);
    }

    #[test]
    fn test_text_escaped() {
        let html = "<math><mo>&lt;</mo></math>";
        let element = extract_math_element(html).unwrap();
        assert!(element.mathml.unwrap().contains("<mo>&lt;</mo>"));
    }
}
