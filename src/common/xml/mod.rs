//! XML helpers: escaping and the arena tree used by every rewrite stage.

mod escape;
mod tree;

pub use escape::{escape_text, escape_xml, resolve_entity, unescape_xml};
pub use tree::{Element, NodeData, NodeId, XmlError, XmlTree};

/// OMML namespace URI.
pub const OMML_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/math";
/// WordprocessingML namespace URI.
pub const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
/// MathML namespace URI.
pub const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";
