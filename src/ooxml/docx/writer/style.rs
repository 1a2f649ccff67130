/// Style writer support for DOCX documents.
///
/// The exporter writes a fixed style sheet: `Normal`, three heading levels,
/// a code block paragraph style and an inline code character style.
use crate::common::xml::escape_xml;
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::namespace as ns;
use std::fmt::Write as FmtWrite;

/// Font used for code blocks and inline code.
pub const CODE_FONT: &str = "Consolas";

/// Style types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleType {
    Paragraph,
    Character,
}

impl StyleType {
    fn to_xml(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Character => "character",
        }
    }
}

/// A style definition for writing.
///
/// # Examples
///
/// ```rust,ignore
/// use mathdocx::ooxml::docx::writer::{MutableStyle, StyleType};
///
/// let mut style = MutableStyle::new("Heading1", "heading 1", StyleType::Paragraph);
/// style.set_based_on(Some("Normal".to_string()));
/// style.set_font_size(Some(32));
/// style.set_bold(true);
/// ```
#[derive(Debug, Clone)]
pub struct MutableStyle {
    /// Style identifier (e.g., "Heading1")
    style_id: String,
    /// UI-visible name (e.g., "heading 1")
    name: String,
    style_type: StyleType,
    is_default: bool,
    based_on: Option<String>,
    /// Outline level for headings, 0-based
    outline_level: Option<u8>,
    font_name: Option<String>,
    /// Font size in half-points (e.g., 24 = 12pt)
    font_size: Option<u32>,
    bold: bool,
    italic: bool,
    /// Space after paragraph in twips
    space_after: Option<u32>,
}

impl MutableStyle {
    pub fn new(style_id: &str, name: &str, style_type: StyleType) -> Self {
        Self {
            style_id: style_id.to_string(),
            name: name.to_string(),
            style_type,
            is_default: false,
            based_on: None,
            outline_level: None,
            font_name: None,
            font_size: None,
            bold: false,
            italic: false,
            space_after: None,
        }
    }

    pub fn style_id(&self) -> &str {
        &self.style_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn style_type(&self) -> StyleType {
        self.style_type
    }

    pub fn set_default(&mut self, is_default: bool) -> &mut Self {
        self.is_default = is_default;
        self
    }

    pub fn set_based_on(&mut self, based_on: Option<String>) -> &mut Self {
        self.based_on = based_on;
        self
    }

    pub fn set_outline_level(&mut self, level: Option<u8>) -> &mut Self {
        self.outline_level = level;
        self
    }

    pub fn set_font_name(&mut self, font: Option<String>) -> &mut Self {
        self.font_name = font;
        self
    }

    pub fn set_font_size(&mut self, half_points: Option<u32>) -> &mut Self {
        self.font_size = half_points;
        self
    }

    pub fn set_bold(&mut self, bold: bool) -> &mut Self {
        self.bold = bold;
        self
    }

    pub fn set_italic(&mut self, italic: bool) -> &mut Self {
        self.italic = italic;
        self
    }

    pub fn set_space_after(&mut self, twips: Option<u32>) -> &mut Self {
        self.space_after = twips;
        self
    }

    pub(crate) fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(256);

        write!(
            &mut xml,
            r#"<w:style w:type="{}" w:styleId="{}""#,
            self.style_type.to_xml(),
            escape_xml(&self.style_id)
        )?;
        if self.is_default {
            xml.push_str(r#" w:default="1""#);
        }
        xml.push('>');

        write!(&mut xml, r#"<w:name w:val="{}"/>"#, escape_xml(&self.name))?;
        if let Some(ref based_on) = self.based_on {
            write!(&mut xml, r#"<w:basedOn w:val="{}"/>"#, escape_xml(based_on))?;
        }
        xml.push_str("<w:qFormat/>");

        if self.style_type == StyleType::Paragraph
            && (self.outline_level.is_some() || self.space_after.is_some())
        {
            xml.push_str("<w:pPr>");
            if let Some(after) = self.space_after {
                write!(&mut xml, r#"<w:spacing w:after="{after}"/>"#)?;
            }
            if let Some(level) = self.outline_level {
                write!(&mut xml, r#"<w:outlineLvl w:val="{level}"/>"#)?;
            }
            xml.push_str("</w:pPr>");
        }

        if self.font_name.is_some() || self.font_size.is_some() || self.bold || self.italic {
            xml.push_str("<w:rPr>");
            if let Some(ref font) = self.font_name {
                let font = escape_xml(font);
                write!(&mut xml, r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/>"#)?;
            }
            if self.bold {
                xml.push_str("<w:b/>");
            }
            if self.italic {
                xml.push_str("<w:i/>");
            }
            if let Some(size) = self.font_size {
                write!(&mut xml, r#"<w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#)?;
            }
            xml.push_str("</w:rPr>");
        }

        xml.push_str("</w:style>");
        Ok(xml)
    }
}

/// Style ID for a heading level, clamped to the levels the style sheet has.
pub fn heading_style_id(level: u8) -> String {
    format!("Heading{}", level.clamp(1, 3))
}

/// The exporter's style sheet.
pub fn default_styles() -> Vec<MutableStyle> {
    let mut styles = Vec::with_capacity(6);

    let mut normal = MutableStyle::new("Normal", "Normal", StyleType::Paragraph);
    normal.set_default(true).set_space_after(Some(120));
    styles.push(normal);

    for (level, size) in [(1u8, 32u32), (2, 28), (3, 24)] {
        let mut heading = MutableStyle::new(
            &heading_style_id(level),
            &format!("heading {level}"),
            StyleType::Paragraph,
        );
        heading
            .set_based_on(Some("Normal".to_string()))
            .set_outline_level(Some(level - 1))
            .set_font_size(Some(size))
            .set_bold(true);
        styles.push(heading);
    }

    let mut code_block = MutableStyle::new("CodeBlock", "Code Block", StyleType::Paragraph);
    code_block
        .set_based_on(Some("Normal".to_string()))
        .set_font_name(Some(CODE_FONT.to_string()))
        .set_font_size(Some(20))
        .set_space_after(Some(0));
    styles.push(code_block);

    let mut code = MutableStyle::new("CodeChar", "Code Char", StyleType::Character);
    code.set_font_name(Some(CODE_FONT.to_string()));
    styles.push(code);

    styles
}

/// Generate `word/styles.xml` for a set of styles.
pub fn generate_styles_xml(styles: &[MutableStyle]) -> Result<String> {
    let mut xml = String::with_capacity(2048);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    write!(&mut xml, r#"<w:styles xmlns:w="{}">"#, ns::WML_MAIN)?;

    xml.push_str("<w:docDefaults>");
    xml.push_str("<w:rPrDefault><w:rPr>");
    xml.push_str(r#"<w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/>"#);
    xml.push_str(r#"<w:sz w:val="22"/>"#);
    xml.push_str(r#"<w:szCs w:val="22"/>"#);
    xml.push_str("</w:rPr></w:rPrDefault>");
    xml.push_str("<w:pPrDefault/>");
    xml.push_str("</w:docDefaults>");

    for style in styles {
        xml.push_str(&style.to_xml()?);
    }

    xml.push_str("</w:styles>");
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_style() {
        let styles = default_styles();
        let h2 = styles.iter().find(|s| s.style_id() == "Heading2").unwrap();
        assert_eq!(h2.name(), "heading 2");
        let xml = h2.to_xml().unwrap();
        assert!(xml.contains(r#"<w:basedOn w:val="Normal"/>"#));
        assert!(xml.contains(r#"<w:outlineLvl w:val="1"/>"#));
        assert!(xml.contains("<w:b/>"));
        assert!(xml.contains(r#"<w:sz w:val="28"/>"#));
    }

    #[test]
    fn test_heading_level_clamped() {
        assert_eq!(heading_style_id(0), "Heading1");
        assert_eq!(heading_style_id(2), "Heading2");
        assert_eq!(heading_style_id(6), "Heading3");
    }

    #[test]
    fn test_character_style_has_no_paragraph_props() {
        let mut style = MutableStyle::new("X", "X", StyleType::Character);
        style.set_space_after(Some(10)).set_italic(true);
        let xml = style.to_xml().unwrap();
        assert!(!xml.contains("<w:pPr>"));
        assert!(xml.contains("<w:i/>"));
    }

    #[test]
    fn test_styles_xml() {
        let xml = generate_styles_xml(&default_styles()).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"w:styleId="Normal" w:default="1""#));
        assert!(xml.contains(r#"w:styleId="CodeBlock""#));
        assert!(xml.ends_with("</w:styles>"));
    }
}
