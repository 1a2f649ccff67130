/// Numbering definitions for bulleted and numbered lists.
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::namespace as ns;
use std::fmt::Write as FmtWrite;

use super::paragraph::ListType;

const LEVELS: u32 = 9;
const BULLETS: [&str; 3] = ["•", "◦", "▪"];

fn abstract_num(xml: &mut String, list_type: ListType) -> Result<()> {
    write!(
        xml,
        r#"<w:abstractNum w:abstractNumId="{}"><w:multiLevelType w:val="hybridMultilevel"/>"#,
        list_type.num_id()
    )?;
    for ilvl in 0..LEVELS {
        let indent = 720 * (ilvl + 1);
        write!(xml, r#"<w:lvl w:ilvl="{ilvl}"><w:start w:val="1"/>"#)?;
        match list_type {
            ListType::Bullet => {
                let glyph = BULLETS[(ilvl as usize) % BULLETS.len()];
                write!(xml, r#"<w:numFmt w:val="bullet"/><w:lvlText w:val="{glyph}"/>"#)?;
            },
            ListType::Decimal => {
                write!(
                    xml,
                    r#"<w:numFmt w:val="decimal"/><w:lvlText w:val="%{}."/>"#,
                    ilvl + 1
                )?;
            },
        }
        write!(
            xml,
            r#"<w:lvlJc w:val="left"/><w:pPr><w:ind w:left="{indent}" w:hanging="360"/></w:pPr></w:lvl>"#
        )?;
    }
    xml.push_str("</w:abstractNum>");
    Ok(())
}

/// Generate `word/numbering.xml` with one bullet and one decimal list.
pub fn generate_numbering_xml() -> Result<String> {
    let mut xml = String::with_capacity(4096);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    write!(&mut xml, r#"<w:numbering xmlns:w="{}">"#, ns::WML_MAIN)?;

    let lists = [ListType::Bullet, ListType::Decimal];
    for list_type in lists {
        abstract_num(&mut xml, list_type)?;
    }
    for list_type in lists {
        write!(
            &mut xml,
            r#"<w:num w:numId="{id}"><w:abstractNumId w:val="{id}"/></w:num>"#,
            id = list_type.num_id()
        )?;
    }

    xml.push_str("</w:numbering>");
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbering_xml() {
        let xml = generate_numbering_xml().unwrap();
        assert_eq!(xml.matches("<w:abstractNum ").count(), 2);
        assert_eq!(xml.matches("<w:lvl ").count(), 18);
        assert!(xml.contains(r#"<w:num w:numId="1"><w:abstractNumId w:val="1"/></w:num>"#));
        assert!(xml.contains(r#"<w:num w:numId="2"><w:abstractNumId w:val="2"/></w:num>"#));
        assert!(xml.contains(r#"<w:lvlText w:val="%3."/>"#));
        assert!(xml.contains(r#"<w:lvlText w:val="•"/>"#));
    }

    #[test]
    fn test_abstract_nums_precede_nums() {
        let xml = generate_numbering_xml().unwrap();
        let last_abstract = xml.rfind("<w:abstractNum ").unwrap();
        let first_num = xml.find("<w:num ").unwrap();
        assert!(last_abstract < first_num);
    }
}
