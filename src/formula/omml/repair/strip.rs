// Foreign markup left in converter output

use super::{RepairPass, RepairState};
use crate::common::xml::XmlTree;

/// Removes every element outside the OMML namespace (`w:`, `wp:`, `a:`,
/// `mc:`, `v:`, ...) together with its subtree. The wrapper is kept.
#[derive(Debug, Default, Clone, Copy)]
pub struct StripForeign;

impl StripForeign {
    pub const NAME: &'static str = "strip-foreign";
}

impl RepairPass for StripForeign {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, tree: &mut XmlTree, _state: &mut RepairState) {
        let root = tree.root();
        for node in tree.descendants(root) {
            let foreign = tree.element(node).is_some_and(|e| e.prefix() != Some("m"));
            if foreign && tree.is_attached(node) {
                tree.detach(node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixture::*;
    use super::*;

    #[test]
    fn test_foreign_elements_removed() {
        let inner = format!(
            r#"<m:r><w:rPr><w:rFonts w:ascii="Cambria Math"/></w:rPr><m:t>x</m:t></m:r><mc:AlternateContent>{}</mc:AlternateContent>{}"#,
            r("junk"),
            r("y")
        );
        assert_eq!(apply(&StripForeign, &inner), format!("{}{}", r("x"), r("y")));
    }

    #[test]
    fn test_idempotent() {
        let inner = format!("<w:r/>{}", r("x"));
        let once = apply(&StripForeign, &inner);
        assert_eq!(apply(&StripForeign, &once), once);
    }
}
