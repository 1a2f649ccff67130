/// Package implementation for generated Word documents.
use crate::formula::MathReplacement;
use crate::ooxml::docx::splice::splice_math;
use crate::ooxml::docx::writer::{MutableDocument, default_styles, generate_numbering_xml, generate_styles_xml};
use crate::ooxml::error::Result;
use crate::ooxml::opc::PackageWriter;
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use std::path::Path;

const DOCUMENT_PART: &str = "/word/document.xml";
const STYLES_PART: &str = "/word/styles.xml";
const NUMBERING_PART: &str = "/word/numbering.xml";

/// A Word (.docx) package ready to be written.
///
/// # Examples
///
/// ```rust,no_run
/// use mathdocx::ooxml::docx::{DocxPackage, writer::MutableDocument};
///
/// let mut doc = MutableDocument::new();
/// doc.add_paragraph_with_text("Hello");
/// let pkg = DocxPackage::from_document(&doc)?;
/// pkg.save("hello.docx")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct DocxPackage {
    document_xml: String,
    styles_xml: String,
    numbering_xml: Option<String>,
}

impl DocxPackage {
    /// Serialize a document with the default style sheet; a numbering part
    /// is added only when the document has list items.
    pub fn from_document(doc: &MutableDocument) -> Result<Self> {
        let numbering_xml = if doc.has_lists() {
            Some(generate_numbering_xml()?)
        } else {
            None
        };
        Ok(Self {
            document_xml: doc.to_xml()?,
            styles_xml: generate_styles_xml(&default_styles())?,
            numbering_xml,
        })
    }

    /// The serialized main document part.
    pub fn document_xml(&self) -> &str {
        &self.document_xml
    }

    /// Swap placeholder runs for OMML; returns `(applied, skipped)`.
    pub fn apply_math(&mut self, replacements: &[MathReplacement]) -> (usize, usize) {
        let outcome = splice_math(&self.document_xml, replacements);
        self.document_xml = outcome.xml;
        (outcome.applied, outcome.skipped)
    }

    fn writer(&self) -> PackageWriter {
        let mut pkg = PackageWriter::new();
        let document = pkg.add_part(
            DOCUMENT_PART,
            ct::WML_DOCUMENT_MAIN,
            self.document_xml.as_bytes().to_vec(),
        );
        document.relate_to("styles.xml", rt::STYLES);
        if self.numbering_xml.is_some() {
            document.relate_to("numbering.xml", rt::NUMBERING);
        }
        pkg.relate_to(DOCUMENT_PART.trim_start_matches('/'), rt::OFFICE_DOCUMENT);

        pkg.add_part(STYLES_PART, ct::WML_STYLES, self.styles_xml.as_bytes().to_vec());
        if let Some(ref numbering) = self.numbering_xml {
            pkg.add_part(NUMBERING_PART, ct::WML_NUMBERING, numbering.as_bytes().to_vec());
        }
        pkg
    }

    /// The binary package.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.writer().to_bytes()
    }

    /// Write the package to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.writer().write(path)
    }
}
