/// Run types and implementation for DOCX documents.
use crate::common::text::sanitize_document_text;
use crate::common::xml::escape_xml;
use crate::ooxml::error::Result;
use std::fmt::Write as FmtWrite;

/// Run content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunContent {
    /// Plain text
    Text(String),
    /// Line break (`<br>`)
    Break,
    /// Tab character
    Tab,
}

/// A mutable run.
///
/// Runs contain text and character formatting.
#[derive(Debug, Clone)]
pub struct MutableRun {
    pub(crate) content: RunContent,
    pub(crate) properties: RunProperties,
}

impl MutableRun {
    pub(crate) fn new() -> Self {
        Self {
            content: RunContent::Text(String::new()),
            properties: RunProperties::default(),
        }
    }

    /// Set the text content. Zero-width and XML-invalid characters are
    /// dropped so placeholder tokens stay unambiguous.
    pub fn set_text(&mut self, text: &str) {
        self.content = RunContent::Text(sanitize_document_text(text));
    }

    /// Get the text content.
    pub fn text(&self) -> &str {
        match &self.content {
            RunContent::Text(s) => s,
            _ => "",
        }
    }

    pub fn bold(&mut self, bold: bool) -> &mut Self {
        self.properties.bold = bold;
        self
    }

    pub fn italic(&mut self, italic: bool) -> &mut Self {
        self.properties.italic = italic;
        self
    }

    /// Set font name.
    pub fn font_name(&mut self, name: &str) -> &mut Self {
        self.properties.font_name = Some(name.to_string());
        self
    }

    /// Set character style ID.
    pub fn style(&mut self, style_id: &str) -> &mut Self {
        self.properties.style = Some(style_id.to_string());
        self
    }

    /// Turn this run into a line break.
    pub fn add_break(&mut self) -> &mut Self {
        self.content = RunContent::Break;
        self
    }

    /// Turn this run into a tab.
    pub fn add_tab(&mut self) -> &mut Self {
        self.content = RunContent::Tab;
        self
    }

    pub(crate) fn to_xml(&self, xml: &mut String) -> Result<()> {
        xml.push_str("<w:r>");

        if self.properties.has_properties() {
            xml.push_str("<w:rPr>");
            if let Some(ref style) = self.properties.style {
                write!(xml, "<w:rStyle w:val=\"{}\"/>", escape_xml(style))?;
            }
            if let Some(ref font_name) = self.properties.font_name {
                let font = escape_xml(font_name);
                write!(xml, "<w:rFonts w:ascii=\"{font}\" w:hAnsi=\"{font}\" w:cs=\"{font}\"/>")?;
            }
            if self.properties.bold {
                xml.push_str("<w:b/>");
            }
            if self.properties.italic {
                xml.push_str("<w:i/>");
            }
            xml.push_str("</w:rPr>");
        }

        match &self.content {
            RunContent::Text(text) if !text.is_empty() => {
                write!(xml, "<w:t xml:space=\"preserve\">{}</w:t>", escape_xml(text))?;
            },
            RunContent::Text(_) => {},
            RunContent::Break => xml.push_str("<w:br/>"),
            RunContent::Tab => xml.push_str("<w:tab/>"),
        }

        xml.push_str("</w:r>");
        Ok(())
    }
}

/// Run properties.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunProperties {
    pub(crate) bold: bool,
    pub(crate) italic: bool,
    pub(crate) font_name: Option<String>,
    pub(crate) style: Option<String>,
}

impl RunProperties {
    pub(crate) fn has_properties(&self) -> bool {
        self.bold || self.italic || self.font_name.is_some() || self.style.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xml_of(run: &MutableRun) -> String {
        let mut xml = String::new();
        run.to_xml(&mut xml).unwrap();
        xml
    }

    #[test]
    fn test_plain_run() {
        let mut run = MutableRun::new();
        run.set_text("a < b");
        assert_eq!(xml_of(&run), r#"<w:r><w:t xml:space="preserve">a &lt; b</w:t></w:r>"#);
    }

    #[test]
    fn test_formatted_run() {
        let mut run = MutableRun::new();
        run.set_text("code");
        run.bold(true).italic(true).font_name("Consolas");
        assert_eq!(
            xml_of(&run),
            r#"<w:r><w:rPr><w:rFonts w:ascii="Consolas" w:hAnsi="Consolas" w:cs="Consolas"/><w:b/><w:i/></w:rPr><w:t xml:space="preserve">code</w:t></w:r>"#
        );
    }

    #[test]
    fn test_text_sanitized() {
        let mut run = MutableRun::new();
        run.set_text("x\u{200B}y\u{0007}");
        assert_eq!(run.text(), "xy");
    }

    #[test]
    fn test_break_run() {
        let mut run = MutableRun::new();
        run.add_break();
        assert_eq!(xml_of(&run), "<w:r><w:br/></w:r>");
    }
}
