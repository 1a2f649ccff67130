/// Paragraph types and implementation for DOCX documents.
use crate::common::xml::escape_xml;
use crate::ooxml::error::Result;
use std::fmt::Write as FmtWrite;

use super::run::{MutableRun, RunContent};

/// Paragraph alignment options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphAlignment {
    Left,
    Center,
    Right,
    Justify,
}

impl ParagraphAlignment {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "both",
        }
    }
}

/// List types for paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListType {
    Bullet,
    Decimal,
}

impl ListType {
    /// `w:numId` of the list definition in the numbering part.
    pub(crate) fn num_id(&self) -> u32 {
        match self {
            Self::Bullet => 1,
            Self::Decimal => 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct NumberingInfo {
    pub(crate) num_id: u32,
    pub(crate) ilvl: u32,
}

/// Paragraph properties.
#[derive(Debug, Clone, Default)]
pub(crate) struct ParagraphProperties {
    pub(crate) alignment: Option<ParagraphAlignment>,
    pub(crate) numbering: Option<NumberingInfo>,
}

impl ParagraphProperties {
    pub(crate) fn has_properties(&self) -> bool {
        self.alignment.is_some() || self.numbering.is_some()
    }
}

/// A mutable paragraph in a document.
#[derive(Debug, Clone)]
pub struct MutableParagraph {
    pub(crate) runs: Vec<MutableRun>,
    /// Paragraph style ID
    pub(crate) style: Option<String>,
    pub(crate) properties: ParagraphProperties,
}

impl MutableParagraph {
    pub(crate) fn new() -> Self {
        Self {
            runs: Vec::new(),
            style: None,
            properties: ParagraphProperties::default(),
        }
    }

    /// Add a new run to the paragraph.
    pub fn add_run(&mut self) -> &mut MutableRun {
        self.runs.push(MutableRun::new());
        let last = self.runs.len() - 1;
        &mut self.runs[last]
    }

    /// Add a run with text.
    pub fn add_run_with_text(&mut self, text: &str) -> &mut MutableRun {
        let run = self.add_run();
        run.set_text(text);
        run
    }

    /// Set the paragraph style.
    pub fn set_style(&mut self, style_id: &str) {
        self.style = Some(style_id.to_string());
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    pub fn set_alignment(&mut self, alignment: ParagraphAlignment) {
        self.properties.alignment = Some(alignment);
    }

    /// Make this paragraph a list item at `level` (0-based).
    pub fn set_list(&mut self, list_type: ListType, level: u32) {
        self.properties.numbering = Some(NumberingInfo {
            num_id: list_type.num_id(),
            ilvl: level.min(8),
        });
    }

    pub fn is_list_item(&self) -> bool {
        self.properties.numbering.is_some()
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Whether the paragraph holds no visible content.
    pub fn is_empty(&self) -> bool {
        self.runs
            .iter()
            .all(|r| matches!(&r.content, RunContent::Text(t) if t.trim().is_empty()))
    }

    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(MutableRun::text).collect()
    }

    pub(crate) fn to_xml(&self, xml: &mut String) -> Result<()> {
        xml.push_str("<w:p>");

        if self.style.is_some() || self.properties.has_properties() {
            xml.push_str("<w:pPr>");
            if let Some(ref style) = self.style {
                write!(xml, "<w:pStyle w:val=\"{}\"/>", escape_xml(style))?;
            }
            if let Some(numbering) = self.properties.numbering {
                write!(
                    xml,
                    "<w:numPr><w:ilvl w:val=\"{}\"/><w:numId w:val=\"{}\"/></w:numPr>",
                    numbering.ilvl, numbering.num_id
                )?;
            }
            if let Some(alignment) = self.properties.alignment {
                write!(xml, "<w:jc w:val=\"{}\"/>", alignment.as_str())?;
            }
            xml.push_str("</w:pPr>");
        }

        for run in &self.runs {
            run.to_xml(xml)?;
        }

        xml.push_str("</w:p>");
        Ok(())
    }
}
