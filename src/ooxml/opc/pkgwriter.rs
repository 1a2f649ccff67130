//! Package writer for OPC packages.
//!
//! Serializes a set of parts into a ZIP container, writing
//! [Content_Types].xml, package relationships and per-part relationships.

use crate::common::xml::escape_xml;
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::{content_type as ct, namespace as ns};
use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const PACKAGE_RELS_PART: &str = "_rels/.rels";

/// A relationship from a part (or the package) to another part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub r_id: String,
    pub rel_type: &'static str,
    /// Target relative to the source part's directory
    pub target: String,
}

/// One part of the package.
#[derive(Debug, Clone)]
pub struct Part {
    /// Absolute part name, e.g. `/word/document.xml`
    partname: String,
    content_type: &'static str,
    blob: Vec<u8>,
    rels: Vec<Relationship>,
}

impl Part {
    pub fn partname(&self) -> &str {
        &self.partname
    }

    pub fn content_type(&self) -> &str {
        self.content_type
    }

    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    /// Add a relationship from this part and return its rId.
    pub fn relate_to(&mut self, target: &str, rel_type: &'static str) -> String {
        add_relationship(&mut self.rels, target, rel_type)
    }

    /// Part name of this part's relationships item,
    /// `/word/document.xml` -> `word/_rels/document.xml.rels`.
    fn rels_name(&self) -> String {
        let name = self.partname.trim_start_matches('/');
        match name.rsplit_once('/') {
            Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
            None => format!("_rels/{name}.rels"),
        }
    }
}

fn add_relationship(rels: &mut Vec<Relationship>, target: &str, rel_type: &'static str) -> String {
    if let Some(existing) = rels.iter().find(|r| r.target == target && r.rel_type == rel_type) {
        return existing.r_id.clone();
    }
    let r_id = format!("rId{}", rels.len() + 1);
    rels.push(Relationship {
        r_id: r_id.clone(),
        rel_type,
        target: target.to_string(),
    });
    r_id
}

fn rels_xml(rels: &[Relationship]) -> String {
    let mut xml = String::with_capacity(256 + rels.len() * 160);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<Relationships xmlns="{}">"#, ns::OPC_RELATIONSHIPS));
    for rel in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            escape_xml(&rel.r_id),
            escape_xml(rel.rel_type),
            escape_xml(&rel.target)
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// Package writer that serializes parts to a ZIP file.
///
/// # Example
///
/// ```no_run
/// use mathdocx::ooxml::opc::constants::{content_type, relationship_type};
/// use mathdocx::ooxml::opc::pkgwriter::PackageWriter;
///
/// let mut pkg = PackageWriter::new();
/// pkg.add_part("/word/document.xml", content_type::WML_DOCUMENT_MAIN, b"<w:document/>".to_vec());
/// pkg.relate_to("word/document.xml", relationship_type::OFFICE_DOCUMENT);
/// pkg.write("output.docx")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct PackageWriter {
    rels: Vec<Relationship>,
    parts: Vec<Part>,
}

impl PackageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part; an existing part with the same name is replaced.
    pub fn add_part(&mut self, partname: &str, content_type: &'static str, blob: Vec<u8>) -> &mut Part {
        let part = Part {
            partname: partname.to_string(),
            content_type,
            blob,
            rels: Vec::new(),
        };
        let index = match self.parts.iter().position(|p| p.partname == partname) {
            Some(i) => {
                self.parts[i] = part;
                i
            },
            None => {
                self.parts.push(part);
                self.parts.len() - 1
            },
        };
        &mut self.parts[index]
    }

    /// Add a package-level relationship and return its rId.
    pub fn relate_to(&mut self, target: &str, rel_type: &'static str) -> String {
        add_relationship(&mut self.rels, target, rel_type)
    }

    pub fn part(&self, partname: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.partname == partname)
    }

    pub fn iter_parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter()
    }

    /// Write the package to a file.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Serialize the package to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        let cti = ContentTypesItem::from_parts(&self.parts);
        zip.start_file(CONTENT_TYPES_PART, options)?;
        zip.write_all(cti.to_xml().as_bytes())?;

        zip.start_file(PACKAGE_RELS_PART, options)?;
        zip.write_all(rels_xml(&self.rels).as_bytes())?;

        for part in &self.parts {
            zip.start_file(part.partname.trim_start_matches('/'), options)?;
            zip.write_all(&part.blob)?;
            if !part.rels.is_empty() {
                zip.start_file(part.rels_name(), options)?;
                zip.write_all(rels_xml(&part.rels).as_bytes())?;
            }
        }

        Ok(zip.finish()?.into_inner())
    }
}

/// Helper for building [Content_Types].xml content.
struct ContentTypesItem {
    /// Default content types by extension
    defaults: BTreeMap<String, String>,
    /// Override content types by partname
    overrides: BTreeMap<String, String>,
}

impl ContentTypesItem {
    fn new() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("rels".to_string(), ct::OPC_RELATIONSHIPS.to_string());
        defaults.insert("xml".to_string(), ct::XML.to_string());
        Self {
            defaults,
            overrides: BTreeMap::new(),
        }
    }

    fn from_parts(parts: &[Part]) -> Self {
        let mut cti = Self::new();
        for part in parts {
            cti.add_content_type(&part.partname, part.content_type);
        }
        cti
    }

    fn add_content_type(&mut self, partname: &str, content_type: &str) {
        let ext = partname.rsplit_once('.').map_or("", |(_, ext)| ext);
        if matches!((ext, content_type), ("rels", ct::OPC_RELATIONSHIPS) | ("xml", ct::XML)) {
            return;
        }
        self.overrides
            .insert(partname.to_string(), content_type.to_string());
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(1024);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<Types xmlns="{}">"#, ns::OPC_CONTENT_TYPES));
        for (ext, content_type) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(content_type)
            ));
        }
        for (partname, content_type) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(partname),
                escape_xml(content_type)
            ));
        }
        xml.push_str("</Types>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::relationship_type as rt;
    use std::io::Read;

    #[test]
    fn test_content_types_xml() {
        let mut cti = ContentTypesItem::new();
        cti.add_content_type("/word/document.xml", ct::WML_DOCUMENT_MAIN);
        cti.add_content_type("/customXml/item1.xml", ct::XML);

        let xml = cti.to_xml();
        assert!(xml.contains(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#));
        assert!(xml.contains(r#"<Override PartName="/word/document.xml""#));
        assert!(!xml.contains("/customXml/item1.xml"));
    }

    #[test]
    fn test_rels_name() {
        let mut pkg = PackageWriter::new();
        let part = pkg.add_part("/word/document.xml", ct::WML_DOCUMENT_MAIN, Vec::new());
        assert_eq!(part.rels_name(), "word/_rels/document.xml.rels");
    }

    #[test]
    fn test_relationship_ids() {
        let mut pkg = PackageWriter::new();
        let part = pkg.add_part("/word/document.xml", ct::WML_DOCUMENT_MAIN, Vec::new());
        assert_eq!(part.relate_to("styles.xml", rt::STYLES), "rId1");
        assert_eq!(part.relate_to("numbering.xml", rt::NUMBERING), "rId2");
        assert_eq!(part.relate_to("styles.xml", rt::STYLES), "rId1");
    }

    #[test]
    fn test_to_bytes_is_readable_zip() {
        let mut pkg = PackageWriter::new();
        pkg.add_part("/word/document.xml", ct::WML_DOCUMENT_MAIN, b"<w:document/>".to_vec())
            .relate_to("styles.xml", rt::STYLES);
        pkg.relate_to("word/document.xml", rt::OFFICE_DOCUMENT);

        let bytes = pkg.to_bytes().unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        for expected in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/_rels/document.xml.rels",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }

        let mut rels = String::new();
        archive
            .by_name("_rels/.rels")
            .unwrap()
            .read_to_string(&mut rels)
            .unwrap();
        assert!(rels.contains(r#"Target="word/document.xml""#));
    }
}
