//! Rendered HTML to Word document.
//!
//! Walks an HTML fragment (typically chat or notebook output with KaTeX
//! math) and builds a [`MutableDocument`]: headings, paragraphs, code
//! blocks, list items and bold/italic/code runs. Every math element is run
//! through a [`MathConverter`]; converted math becomes a placeholder token
//! registered in the [`MathContext`], failed math becomes literal LaTeX.

mod math;

pub use math::extract_math_element;

use crate::common::text::sanitize_document_text;
use crate::config::ExportOptions;
use crate::formula::{MathContext, MathConverter, MathSource};
use crate::ooxml::docx::writer::{ListType, MutableDocument, ParagraphAlignment};
use crate::ooxml::error::Result;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use math::{element_from_host, is_math_host, tag_name};
use tracing::debug;

const CODE_BLOCK_STYLE: &str = "CodeBlock";
const CODE_CHAR_STYLE: &str = "CodeChar";

/// Per-document math counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MathStats {
    /// Math elements found in the HTML
    pub elements: usize,
    /// Elements converted from embedded MathML
    pub embedded: usize,
    /// Elements converted from MathML regenerated out of LaTeX
    pub regenerated: usize,
    /// Elements written as literal LaTeX
    pub fallbacks: usize,
}

impl MathStats {
    pub fn converted(&self) -> usize {
        self.embedded + self.regenerated
    }
}

pub(crate) fn parse_html(input: &str) -> RcDom {
    let wrapped = if input.to_ascii_lowercase().contains("<html") {
        input.to_string()
    } else {
        format!("<!doctype html><html><head><meta charset=\"utf-8\"></head><body>{input}</body></html>")
    };
    parse_document(RcDom::default(), Default::default()).one(wrapped)
}

fn find_body(node: &Handle) -> Option<Handle> {
    if tag_name(node).as_deref() == Some("body") {
        return Some(node.clone());
    }
    node.children.borrow().iter().find_map(find_body)
}

/// Every text node and attribute value under `node`, one per line.
fn collect_text(node: &Handle, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => {
            out.push_str(&contents.borrow());
            out.push('\n');
        },
        NodeData::Element { attrs, .. } => {
            for a in attrs.borrow().iter() {
                out.push_str(&a.value);
                out.push('\n');
            }
        },
        _ => {},
    }
    for child in node.children.borrow().iter() {
        collect_text(child, out);
    }
}

fn collapse_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_ws = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !in_ws {
                out.push(' ');
                in_ws = true;
            }
        } else {
            out.push(ch);
            in_ws = false;
        }
    }
    out
}

#[derive(Debug, Clone, Copy, Default)]
struct RunStyle {
    bold: bool,
    italic: bool,
    code: bool,
}

#[derive(Debug, Clone)]
enum Segment {
    Text(String, RunStyle),
    Break,
    Tab,
    /// Placeholder token for converted math
    Math(String),
    /// Literal LaTeX for math that could not be converted
    Fallback(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum ParagraphKind {
    #[default]
    Normal,
    Heading(u8),
    Code,
}

#[derive(Debug, Default)]
struct Pending {
    kind: ParagraphKind,
    list: Option<(ListType, u32)>,
    centered: bool,
    segments: Vec<Segment>,
}

impl Pending {
    fn has_content(&self) -> bool {
        self.segments.iter().any(|s| match s {
            Segment::Text(text, _) => !text.trim().is_empty(),
            Segment::Tab => false,
            Segment::Break | Segment::Math(_) | Segment::Fallback(_) => true,
        })
    }
}

struct Walker<'a> {
    converter: &'a MathConverter,
    options: &'a ExportOptions,
    context: &'a mut MathContext,
    doc: MutableDocument,
    current: Pending,
    bold: u32,
    italic: u32,
    code: u32,
    pre: u32,
    lists: Vec<ListType>,
    items: Vec<Option<(ListType, u32)>>,
    stats: MathStats,
}

impl Walker<'_> {
    fn current_item(&self) -> Option<(ListType, u32)> {
        self.items.last().copied().flatten()
    }

    fn start_paragraph(&mut self, kind: ParagraphKind) -> Result<()> {
        self.flush()?;
        self.current.kind = kind;
        self.current.list = self.current_item();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.current);
        if !pending.has_content() {
            return Ok(());
        }

        let para = match pending.kind {
            ParagraphKind::Heading(level) => self.doc.add_heading(level)?,
            ParagraphKind::Code => {
                let para = self.doc.add_paragraph();
                para.set_style(CODE_BLOCK_STYLE);
                para
            },
            ParagraphKind::Normal => self.doc.add_paragraph(),
        };
        if let Some((list_type, level)) = pending.list {
            para.set_list(list_type, level);
        }
        if pending.centered {
            para.set_alignment(ParagraphAlignment::Center);
        }

        for segment in pending.segments {
            match segment {
                Segment::Text(text, style) => {
                    let run = para.add_run_with_text(&text);
                    run.bold(style.bold).italic(style.italic);
                    if style.code {
                        run.style(CODE_CHAR_STYLE);
                    }
                },
                Segment::Break => {
                    para.add_run().add_break();
                },
                Segment::Tab => {
                    para.add_run().add_tab();
                },
                Segment::Math(token) => {
                    para.add_run_with_text(&token);
                },
                Segment::Fallback(latex) => {
                    para.add_run_with_text(&latex).font_name(&self.options.fallback_font);
                },
            }
        }
        Ok(())
    }

    fn style(&self) -> RunStyle {
        RunStyle {
            bold: self.bold > 0,
            italic: self.italic > 0,
            code: self.code > 0 && self.pre == 0,
        }
    }

    fn emit_text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let raw = raw.replace("\r\n", "\n").replace('\r', "\n");
        let style = self.style();

        if self.pre > 0 {
            for (i, line) in raw.split('\n').enumerate() {
                if i > 0 {
                    self.current.segments.push(Segment::Break);
                }
                if !line.is_empty() {
                    self.current.segments.push(Segment::Text(line.to_string(), style));
                }
            }
            return;
        }

        let mut text = collapse_ws(&raw);
        if !self.current.has_content() {
            text = text.trim_start().to_string();
        }
        if !text.is_empty() {
            self.current.segments.push(Segment::Text(text, style));
        }
    }

    fn emit_math(&mut self, node: &Handle) -> Result<()> {
        let Some(element) = element_from_host(node, false) else {
            return Ok(());
        };
        self.stats.elements += 1;

        let segment = match self.converter.convert_element_with_source(&element) {
            Some((omml, source)) => {
                match source {
                    MathSource::Embedded => self.stats.embedded += 1,
                    MathSource::Regenerated => self.stats.regenerated += 1,
                }
                Segment::Math(self.context.register(omml, element.display))
            },
            None => {
                self.stats.fallbacks += 1;
                debug!(
                    target: "html",
                    op = "emit_math",
                    latex = element.latex_source().unwrap_or_default(),
                    "math written as literal LaTeX"
                );
                Segment::Fallback(element.fallback_text())
            },
        };

        if element.display {
            let list = self.current.list;
            self.flush()?;
            self.current.list = list;
            self.current.centered = self.options.center_display_math;
            self.current.segments.push(segment);
            self.flush()?;
            self.current.list = list;
        } else {
            self.current.segments.push(segment);
        }
        Ok(())
    }

    fn walk(&mut self, node: &Handle) -> Result<()> {
        match &node.data {
            NodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                self.emit_text(&text);
                Ok(())
            },
            NodeData::Element { .. } => self.walk_element(node),
            _ => Ok(()),
        }
    }

    fn walk_children(&mut self, node: &Handle) -> Result<()> {
        let children: Vec<Handle> = node.children.borrow().iter().cloned().collect();
        for child in &children {
            self.walk(child)?;
        }
        Ok(())
    }

    fn walk_element(&mut self, node: &Handle) -> Result<()> {
        if is_math_host(node) {
            return self.emit_math(node);
        }
        let Some(tag) = tag_name(node) else {
            return Ok(());
        };

        match tag.as_str() {
            "head" | "script" | "style" | "title" | "template" | "noscript" => return Ok(()),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag.as_bytes()[1] - b'0';
                self.start_paragraph(ParagraphKind::Heading(level))?;
            },
            "pre" => {
                self.pre += 1;
                self.start_paragraph(ParagraphKind::Code)?;
            },
            "p" | "div" | "blockquote" | "section" | "article" | "tr" | "figure" | "figcaption" => {
                self.start_paragraph(ParagraphKind::Normal)?;
            },
            "br" => self.current.segments.push(Segment::Break),
            "hr" => self.flush()?,
            "ul" => self.lists.push(ListType::Bullet),
            "ol" => self.lists.push(ListType::Decimal),
            "li" => {
                let list_type = self.lists.last().copied().unwrap_or(ListType::Bullet);
                let level = self.lists.len().saturating_sub(1) as u32;
                self.items.push(Some((list_type, level)));
                self.start_paragraph(ParagraphKind::Normal)?;
            },
            "td" | "th" => {
                if self.current.has_content() {
                    self.current.segments.push(Segment::Tab);
                }
            },
            "code" | "kbd" | "samp" => self.code += 1,
            "b" | "strong" => self.bold += 1,
            "i" | "em" => self.italic += 1,
            _ => {},
        }

        self.walk_children(node)?;

        match tag.as_str() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "p" | "div" | "blockquote" | "section"
            | "article" | "tr" | "figure" | "figcaption" => self.flush()?,
            "pre" => {
                self.flush()?;
                self.pre = self.pre.saturating_sub(1);
            },
            "ul" | "ol" => {
                self.lists.pop();
            },
            "li" => {
                self.flush()?;
                self.items.pop();
            },
            "code" | "kbd" | "samp" => self.code = self.code.saturating_sub(1),
            "b" | "strong" => self.bold = self.bold.saturating_sub(1),
            "i" | "em" => self.italic = self.italic.saturating_sub(1),
            _ => {},
        }
        Ok(())
    }
}

/// Build a document from HTML, registering converted math in `context`.
pub fn build_document(
    html: &str,
    converter: &MathConverter,
    options: &ExportOptions,
    context: &mut MathContext,
) -> Result<(MutableDocument, MathStats)> {
    let dom = parse_html(html);
    let root = find_body(&dom.document).unwrap_or_else(|| dom.document.clone());

    let mut text = String::new();
    collect_text(&root, &mut text);
    context.reserve_existing(&sanitize_document_text(&text));

    let mut walker = Walker {
        converter,
        options,
        context,
        doc: MutableDocument::new(),
        current: Pending::default(),
        bold: 0,
        italic: 0,
        code: 0,
        pre: 0,
        lists: Vec::new(),
        items: Vec::new(),
        stats: MathStats::default(),
    };
    walker.walk_children(&root)?;
    walker.flush()?;

    debug!(
        target: "html",
        op = "build_document",
        paragraphs = walker.doc.paragraph_count(),
        math = walker.stats.elements,
        fallbacks = walker.stats.fallbacks,
        "document built"
    );
    Ok((walker.doc, walker.stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{FormulaError, NoRenderer};

    fn katex(inner: &str, latex: &str, display: bool) -> String {
        let span = format!(
            r#"<span class="katex"><span class="katex-mathml"><math xmlns="http://www.w3.org/1998/Math/MathML"><semantics><mrow>{inner}</mrow><annotation encoding="application/x-tex">{latex}</annotation></semantics></math></span><span class="katex-html" aria-hidden="true">{latex}</span></span>"#
        );
        if display {
            format!(r#"<span class="katex-display">{span}</span>"#)
        } else {
            span
        }
    }

    fn build(html: &str, converter: &MathConverter) -> (MutableDocument, MathStats, MathContext) {
        let mut context = MathContext::new();
        let (doc, stats) = build_document(html, converter, &ExportOptions::default(), &mut context).unwrap();
        (doc, stats, context)
    }

    #[test]
    fn test_structure() {
        let html = "<h2>Title</h2><p>Some <b>bold</b> and <code>x</code> text</p><ul><li>one</li><li>two</li></ul><pre>a\nb</pre>";
        let (doc, stats, context) = build(html, &MathConverter::new());
        assert_eq!(stats, MathStats::default());
        assert!(context.is_empty());

        let paras = doc.paragraphs();
        assert_eq!(paras.len(), 5);
        assert_eq!(paras[0].style(), Some("Heading2"));
        assert_eq!(paras[1].text(), "Some bold and x text");
        assert!(paras[2].is_list_item());
        assert_eq!(paras[3].text(), "two");
        assert_eq!(paras[4].style(), Some(CODE_BLOCK_STYLE));
        assert_eq!(paras[4].run_count(), 3);
    }

    #[test]
    fn test_inline_and_display_math() {
        let html = format!(
            "<p>Let {} be given.</p><p>{}</p>",
            katex("<mi>x</mi>", "x", false),
            katex("<mfrac><mi>a</mi><mi>b</mi></mfrac>", r"\frac{a}{b}", true)
        );
        let converter = MathConverter::new().with_renderer(NoRenderer);
        let (doc, stats, context) = build(&html, &converter);

        assert_eq!(stats.elements, 2);
        assert_eq!(stats.embedded, 2);
        assert_eq!(context.len(), 2);
        let replacements = context.replacements();
        assert!(!replacements[0].display);
        assert!(replacements[1].display);

        let paras = doc.paragraphs();
        assert_eq!(paras.len(), 2);
        assert_eq!(paras[0].text(), format!("Let {} be given.", replacements[0].token));
        assert_eq!(paras[1].text(), replacements[1].token);

        let xml = doc.to_xml().unwrap();
        assert!(xml.contains(r#"<w:jc w:val="center"/>"#));
        assert_eq!(xml.matches(&replacements[0].token).count(), 1);
    }

    #[test]
    fn test_failed_math_falls_back_to_latex() {
        let failing = |_: &str| -> crate::formula::Result<String> { Err(FormulaError::Convert("no".into())) };
        let converter = MathConverter::new().with_converter(failing).with_renderer(NoRenderer);
        let html = format!("<p>{}</p>", katex("<mi>y</mi>", "y", false));
        let (doc, stats, context) = build(&html, &converter);

        assert_eq!(stats.fallbacks, 1);
        assert_eq!(stats.converted(), 0);
        assert!(context.is_empty());
        assert_eq!(doc.paragraphs()[0].text(), "$y$");
        assert!(doc.to_xml().unwrap().contains(r#"w:ascii="Consolas""#));
    }

    #[test]
    fn test_katex_html_not_duplicated() {
        let html = format!("<p>{}</p>", katex("<mi>z</mi>", "z", false));
        let converter = MathConverter::new().with_renderer(NoRenderer);
        let (doc, _, context) = build(&html, &converter);
        assert_eq!(doc.paragraphs()[0].text(), context.replacements()[0].token);
    }

    #[test]
    fn test_full_html_document() {
        let html = "<html><head><title>T</title></head><body><p>hi</p></body></html>";
        let (doc, _, _) = build(html, &MathConverter::new());
        assert_eq!(doc.paragraph_count(), 1);
        assert_eq!(doc.paragraphs()[0].text(), "hi");
    }

    #[test]
    fn test_literal_token_text_is_not_reused() {
        let html = "<p>literal __MATH_000001__ here</p><p><math><mi>x</mi></math></p>";
        let (doc, _, context) = build(html, &MathConverter::new().with_renderer(NoRenderer));
        assert_eq!(context.replacements()[0].token, "__MATH_000002__");
        assert_eq!(doc.paragraphs()[0].text(), "literal __MATH_000001__ here");

        let hidden = "<p>__MATH_\u{200B}000001__</p><p><math><mi>x</mi></math></p>";
        let (_, _, context) = build(hidden, &MathConverter::new().with_renderer(NoRenderer));
        assert_eq!(context.replacements()[0].token, "__MATH_000002__");
    }
}
