// Run properties and text content cleanup

use super::{RepairPass, RepairState};
use crate::common::text::{needs_space_preserve, normalize_math_text};
use crate::common::xml::XmlTree;
use crate::formula::omml::build::VAL;

/// Removes `m:sty`/`m:scr` whose value is the literal `undefined`, and any
/// `m:rPr` left empty by that.
#[derive(Debug, Default, Clone, Copy)]
pub struct UndefinedStyle;

impl UndefinedStyle {
    pub const NAME: &'static str = "undefined-style";
}

impl RepairPass for UndefinedStyle {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, tree: &mut XmlTree, _state: &mut RepairState) {
        for node in tree.descendants(tree.root()) {
            if !tree.is_any(node, &["m:sty", "m:scr"]) || tree.attr(node, VAL) != Some("undefined") {
                continue;
            }
            let parent = tree.parent(node);
            tree.detach(node);
            if let Some(parent) = parent
                && tree.is(parent, "m:rPr")
                && tree.children(parent).is_empty()
            {
                tree.detach(parent);
            }
        }
    }
}

/// Normalizes every `m:t`: typographic spaces become ASCII spaces,
/// zero-width and control characters go away, and significant spaces get
/// `xml:space="preserve"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextNormalization;

impl TextNormalization {
    pub const NAME: &'static str = "text-normalization";
}

impl RepairPass for TextNormalization {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, tree: &mut XmlTree, _state: &mut RepairState) {
        for t in tree.descendants_named(tree.root(), "m:t") {
            let original = tree.text_content(t);
            let text = normalize_math_text(&original);
            if text != original || tree.children(t).len() > 1 {
                for child in tree.children(t).to_vec() {
                    tree.detach(child);
                }
                if !text.is_empty() {
                    let node = tree.create_text(&text);
                    tree.append(t, node);
                }
            }
            if needs_space_preserve(&text) {
                tree.set_attr(t, "xml:space", "preserve");
            }
        }
    }
}
