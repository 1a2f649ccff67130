//! Character classes shared by the MathML cleaner, the OMML text pass and
//! the document writer.

/// Zero-width characters that copy/paste and renderers leave behind.
#[inline]
pub fn is_zero_width(c: char) -> bool {
    matches!(
        c,
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}'
    )
}

/// Invisible MathML operators (function application, invisible times,
/// separator and plus).
#[inline]
pub fn is_invisible_operator(c: char) -> bool {
    matches!(c, '\u{2061}'..='\u{2064}')
}

/// Non-breaking and typographic spaces that should read as an ASCII space.
#[inline]
pub fn is_typographic_space(c: char) -> bool {
    matches!(
        c,
        '\u{00A0}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}'
    )
}

/// Characters XML 1.0 does not allow in documents at all.
#[inline]
pub fn is_xml_invalid(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}')
}

/// Normalize math text: typographic spaces become ASCII spaces, zero-width,
/// invisible-operator and control characters are dropped.
pub fn normalize_math_text(s: &str) -> String {
    s.chars()
        .filter(|&c| !is_zero_width(c) && !is_invisible_operator(c) && !c.is_control())
        .map(|c| if is_typographic_space(c) { ' ' } else { c })
        .collect()
}

/// Sanitize document text before it reaches the XML writer.
///
/// Zero-width and XML-invalid characters are removed so that placeholder
/// tokens can never be forged or split by invisible characters.
pub fn sanitize_document_text(s: &str) -> String {
    s.chars()
        .filter(|&c| !is_zero_width(c) && !is_xml_invalid(c))
        .collect()
}

/// Whether a text value needs `xml:space="preserve"` to survive.
pub fn needs_space_preserve(s: &str) -> bool {
    s.starts_with(' ') || s.ends_with(' ') || s.contains("  ")
}
