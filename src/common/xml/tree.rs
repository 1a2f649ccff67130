//! Arena-backed mutable XML tree.
//!
//! Fragments (MathML input, OMML converter output) are parsed into an
//! [`XmlTree`] whose nodes live in one `Vec` and reference each other by
//! [`NodeId`]. Rewrite passes take `&mut XmlTree`, move nodes around by id and
//! never invalidate other ids: detached nodes simply stay in the arena until
//! the tree is dropped.

use super::escape::{escape_text, escape_xml, resolve_entity, unescape_xml};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use smallvec::SmallVec;
use thiserror::Error;

/// Maximum element nesting accepted while parsing.
const MAX_DEPTH: usize = 512;

/// Leaf elements whose whitespace-only text is significant.
const TEXT_LEAVES: &[&str] = &["t", "mi", "mn", "mo", "mtext", "ms", "annotation"];

/// Errors produced while reading an XML fragment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    /// The underlying reader rejected the input
    #[error("malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    /// Elements were left open at end of input
    #[error("unclosed elements at end of input (depth {0})")]
    Unclosed(usize),

    /// Closing tag without a matching opening tag
    #[error("unexpected closing tag </{0}>")]
    UnexpectedEnd(String),

    /// Nesting exceeded [`MAX_DEPTH`]
    #[error("maximum nesting depth {0} exceeded")]
    TooDeep(usize),

    /// Non UTF-8 bytes in a name or text node
    #[error("invalid UTF-8 in XML: {0}")]
    Encoding(String),
}

/// Index of a node inside an [`XmlTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// An element's qualified name and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written, e.g. `m:r`
    pub name: String,
    /// Attributes in document order, values unescaped
    pub attrs: Vec<(String, String)>,
}

impl Element {
    /// Namespace prefix, if the name has one.
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(p, _)| p)
    }

    /// Local part of the name.
    pub fn local_name(&self) -> &str {
        self.name.split_once(':').map_or(self.name.as_str(), |(_, l)| l)
    }
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
}

/// Mutable XML tree rooted at a synthetic wrapper element.
#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl XmlTree {
    /// Create a tree holding only the wrapper element.
    pub fn new(root_name: &str) -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(64),
            root: NodeId(0),
        };
        tree.root = tree.create_element(root_name);
        tree
    }

    /// Parse a fragment (zero or more top-level nodes) under a wrapper element.
    ///
    /// `namespaces` are declared on the wrapper as `xmlns:prefix="uri"` so the
    /// fragment can be serialized back as a standalone document if needed.
    /// XML declarations, comments and processing instructions are dropped.
    pub fn parse_fragment(
        xml: &str,
        root_name: &str,
        namespaces: &[(&str, &str)],
    ) -> Result<Self, XmlError> {
        let mut tree = Self::new(root_name);
        let root = tree.root;
        for (prefix, uri) in namespaces {
            tree.set_attr(root, &format!("xmlns:{prefix}"), uri);
        }

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<NodeId> = vec![root];
        loop {
            let event = reader.read_event().map_err(|e| XmlError::Malformed {
                position: reader.buffer_position(),
                message: e.to_string(),
            })?;
            match event {
                Event::Start(ref e) => {
                    if stack.len() > MAX_DEPTH {
                        return Err(XmlError::TooDeep(MAX_DEPTH));
                    }
                    let node = tree.element_from_start(e)?;
                    let parent = *stack.last().unwrap_or(&root);
                    tree.append(parent, node);
                    stack.push(node);
                },
                Event::Empty(ref e) => {
                    let node = tree.element_from_start(e)?;
                    let parent = *stack.last().unwrap_or(&root);
                    tree.append(parent, node);
                },
                Event::End(ref e) => {
                    if stack.len() <= 1 {
                        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                        return Err(XmlError::UnexpectedEnd(name));
                    }
                    stack.pop();
                },
                Event::Text(ref e) => {
                    let raw = std::str::from_utf8(e.as_ref())
                        .map_err(|err| XmlError::Encoding(err.to_string()))?;
                    let parent = *stack.last().unwrap_or(&root);
                    tree.push_text(parent, &unescape_xml(raw));
                },
                Event::CData(ref e) => {
                    let raw = std::str::from_utf8(e.as_ref())
                        .map_err(|err| XmlError::Encoding(err.to_string()))?;
                    let parent = *stack.last().unwrap_or(&root);
                    tree.push_text(parent, raw);
                },
                Event::GeneralRef(ref e) => {
                    let name = std::str::from_utf8(e.as_ref())
                        .map_err(|err| XmlError::Encoding(err.to_string()))?;
                    let parent = *stack.last().unwrap_or(&root);
                    match resolve_entity(name) {
                        Some(ch) => tree.push_text(parent, ch.encode_utf8(&mut [0u8; 4])),
                        None => tree.push_text(parent, &format!("&{name};")),
                    }
                },
                Event::Eof => break,
                _ => {},
            }
        }

        if stack.len() != 1 {
            return Err(XmlError::Unclosed(stack.len() - 1));
        }

        tree.drop_insignificant_whitespace(root);
        Ok(tree)
    }

    fn element_from_start(&mut self, e: &BytesStart) -> Result<NodeId, XmlError> {
        let name = std::str::from_utf8(e.name().as_ref())
            .map_err(|err| XmlError::Encoding(err.to_string()))?
            .to_string();
        let mut attrs = Vec::new();
        for attr in e.attributes().with_checks(false).flatten() {
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|err| XmlError::Encoding(err.to_string()))?;
            let value = std::str::from_utf8(&attr.value)
                .map_err(|err| XmlError::Encoding(err.to_string()))?;
            attrs.push((key.to_string(), unescape_xml(value).into_owned()));
        }
        Ok(self.alloc(NodeData::Element(Element { name, attrs })))
    }

    /// Append text to `parent`, merging with a trailing text child.
    fn push_text(&mut self, parent: NodeId, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(&last) = self.nodes[parent.index()].children.last()
            && let NodeData::Text(existing) = &mut self.nodes[last.index()].data
        {
            existing.push_str(text);
            return;
        }
        let node = self.create_text(text);
        self.append(parent, node);
    }

    fn drop_insignificant_whitespace(&mut self, id: NodeId) {
        let keep_ws = self
            .element(id)
            .is_some_and(|e| TEXT_LEAVES.contains(&e.local_name()));
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            match &self.nodes[child.index()].data {
                NodeData::Text(t) if !keep_ws && t.trim().is_empty() => self.detach(child),
                NodeData::Element(_) => self.drop_insignificant_whitespace(child),
                _ => {},
            }
        }
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            data,
            parent: None,
            children: SmallVec::new(),
        });
        id
    }

    /// The wrapper element.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.alloc(NodeData::Element(Element {
            name: name.to_string(),
            attrs: Vec::new(),
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_string()))
    }

    /// Node payload.
    #[inline]
    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()].data
    }

    /// Element payload, `None` for text nodes.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.index()].data {
            NodeData::Element(e) => Some(e),
            NodeData::Text(_) => None,
        }
    }

    /// Qualified element name, `None` for text nodes.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    /// Whether `id` is an element with exactly this qualified name.
    #[inline]
    pub fn is(&self, id: NodeId, name: &str) -> bool {
        self.name(id) == Some(name)
    }

    /// Whether `id` is an element whose qualified name is one of `names`.
    pub fn is_any(&self, id: NodeId, names: &[&str]) -> bool {
        self.name(id).is_some_and(|n| names.contains(&n))
    }

    /// Text payload, `None` for elements.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.index()].data {
            NodeData::Text(t) => Some(t),
            NodeData::Element(_) => None,
        }
    }

    /// Replace the payload of a text node. No-op on elements.
    pub fn set_text(&mut self, id: NodeId, text: String) {
        if let NodeData::Text(t) = &mut self.nodes[id.index()].data {
            *t = text;
        }
    }

    /// Rename an element. No-op on text nodes.
    pub fn rename(&mut self, id: NodeId, name: &str) {
        if let NodeData::Element(e) = &mut self.nodes[id.index()].data {
            e.name = name.to_string();
        }
    }

    /// Attribute value by qualified key.
    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        self.element(id)?
            .attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set (or overwrite) an attribute.
    pub fn set_attr(&mut self, id: NodeId, key: &str, value: &str) {
        if let NodeData::Element(e) = &mut self.nodes[id.index()].data {
            match e.attrs.iter_mut().find(|(k, _)| k == key) {
                Some((_, v)) => *v = value.to_string(),
                None => e.attrs.push((key.to_string(), value.to_string())),
            }
        }
    }

    /// Keep only the attributes for which `keep` returns true.
    pub fn retain_attrs(&mut self, id: NodeId, mut keep: impl FnMut(&str, &str) -> bool) {
        if let NodeData::Element(e) = &mut self.nodes[id.index()].data {
            e.attrs.retain(|(k, v)| keep(k, v));
        }
    }

    /// Parent node, `None` for the root and detached nodes.
    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Children in document order.
    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Element children only.
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.element(c).is_some())
            .collect()
    }

    /// First child element with the given qualified name.
    pub fn child_named(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id).iter().copied().find(|&c| self.is(c, name))
    }

    /// Position of `id` among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Next sibling element, skipping text nodes.
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let idx = siblings.iter().position(|&c| c == id)?;
        siblings[idx + 1..]
            .iter()
            .copied()
            .find(|&c| self.element(c).is_some())
    }

    /// Detach a node from its parent. The subtree stays intact.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|c| *c != id);
        }
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Insert `child` at `index` among `parent`'s children, detaching it first.
    ///
    /// The index is interpreted after detaching, and clamped to the child count.
    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let len = self.nodes[parent.index()].children.len();
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()]
            .children
            .insert(index.min(len), child);
    }

    /// Put `replacement` where `id` is and detach `id`.
    pub fn replace(&mut self, id: NodeId, replacement: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let Some(idx) = self.index_in_parent(id) else {
            return;
        };
        self.detach(id);
        self.insert(parent, idx, replacement);
    }

    /// Replace `id` by its own children (unwrap).
    pub fn unwrap_node(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let Some(mut idx) = self.index_in_parent(id) else {
            return;
        };
        self.detach(id);
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            self.insert(parent, idx, child);
            idx += 1;
        }
    }

    /// Move every child of `from` to the end of `to`.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        let children: Vec<NodeId> = self.children(from).to_vec();
        for child in children {
            self.append(to, child);
        }
    }

    /// Deep-copy a subtree. The copy is detached.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let data = self.nodes[id.index()].data.clone();
        let copy = self.alloc(data);
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            let child_copy = self.clone_subtree(child);
            self.append(copy, child_copy);
        }
        copy
    }

    /// All attached descendants of `id` in pre-order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Attached descendant elements with the given qualified name, pre-order.
    pub fn descendants_named(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.is(n, name))
            .collect()
    }

    /// Whether `id` is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            if cur == self.root {
                return true;
            }
            match self.parent(cur) {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    /// Concatenated text of a subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.index()].data {
            NodeData::Text(t) => out.push_str(t),
            NodeData::Element(_) => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            },
        }
    }

    /// Serialize a node and its subtree.
    pub fn serialize(&self, id: NodeId) -> String {
        let mut out = String::with_capacity(256);
        self.write_node(id, &mut out, false);
        out
    }

    /// Serialize only the children of a node.
    pub fn serialize_children(&self, id: NodeId) -> String {
        let mut out = String::with_capacity(256);
        for &child in self.children(id) {
            self.write_node(child, &mut out, false);
        }
        out
    }

    /// Serialize a node, dropping every `xmlns` / `xmlns:*` attribute.
    pub fn serialize_without_namespaces(&self, id: NodeId) -> String {
        let mut out = String::with_capacity(256);
        self.write_node(id, &mut out, true);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String, strip_ns: bool) {
        match &self.nodes[id.index()].data {
            NodeData::Text(t) => out.push_str(&escape_text(t)),
            NodeData::Element(e) => {
                out.push('<');
                out.push_str(&e.name);
                for (k, v) in &e.attrs {
                    if strip_ns && (k == "xmlns" || k.starts_with("xmlns:")) {
                        continue;
                    }
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    out.push_str(&escape_xml(v));
                    out.push('"');
                }
                let children = self.children(id);
                if children.is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for &child in children {
                    self.write_node(child, out, strip_ns);
                }
                out.push_str("</");
                out.push_str(&e.name);
                out.push('>');
            },
        }
    }
}
