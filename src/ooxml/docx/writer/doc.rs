/// Document writer implementation for DOCX.
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::namespace as ns;
use std::fmt::Write as FmtWrite;

use super::paragraph::MutableParagraph;
use super::style::heading_style_id;

/// A4 page in twips with one inch margins.
const SECTION_PROPERTIES: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#;

/// A mutable Word document for writing.
///
/// Holds the body paragraphs. The math namespace is not declared on the
/// root; math is spliced in afterwards by [`splice_math`], which adds the
/// declaration.
///
/// [`splice_math`]: crate::ooxml::docx::splice::splice_math
#[derive(Debug, Clone, Default)]
pub struct MutableDocument {
    paragraphs: Vec<MutableParagraph>,
}

impl MutableDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new paragraph to the end of the document.
    pub fn add_paragraph(&mut self) -> &mut MutableParagraph {
        self.paragraphs.push(MutableParagraph::new());
        let last = self.paragraphs.len() - 1;
        &mut self.paragraphs[last]
    }

    /// Add a paragraph with text.
    pub fn add_paragraph_with_text(&mut self, text: &str) -> &mut MutableParagraph {
        let para = self.add_paragraph();
        para.add_run_with_text(text);
        para
    }

    /// Add an empty heading paragraph; levels above 3 use the level 3 style.
    pub fn add_heading(&mut self, level: u8) -> Result<&mut MutableParagraph> {
        if !(1..=6).contains(&level) {
            return Err(OoxmlError::InvalidFormat(format!(
                "Heading level must be 1-6, got {level}"
            )));
        }
        let para = self.add_paragraph();
        para.set_style(&heading_style_id(level));
        Ok(para)
    }

    /// Drop the last paragraph if it has no visible content.
    pub fn discard_empty_tail(&mut self) {
        if self.paragraphs.last().is_some_and(|p| p.is_empty() && p.style.is_none()) {
            self.paragraphs.pop();
        }
    }

    pub fn paragraphs(&self) -> &[MutableParagraph] {
        &self.paragraphs
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Whether any paragraph is a list item, i.e. a numbering part is needed.
    pub fn has_lists(&self) -> bool {
        self.paragraphs.iter().any(MutableParagraph::is_list_item)
    }

    /// Generate `word/document.xml`.
    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(1024 + self.paragraphs.len() * 128);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        write!(
            &mut xml,
            r#"<w:document xmlns:w="{}" xmlns:r="{}">"#,
            ns::WML_MAIN,
            ns::OFC_RELATIONSHIPS
        )?;
        xml.push_str("<w:body>");
        for para in &self.paragraphs {
            para.to_xml(&mut xml)?;
        }
        xml.push_str(SECTION_PROPERTIES);
        xml.push_str("</w:body></w:document>");
        Ok(xml)
    }
}
