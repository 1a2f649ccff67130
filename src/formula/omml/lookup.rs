// Static lookup tables for the OMML builder and repair passes

use phf::{phf_map, phf_set};

/// Recognized stretchy delimiter pairs: open character to close character.
pub static DELIMITER_PAIRS: phf::Map<&'static str, &'static str> = phf_map! {
    "(" => ")",
    "[" => "]",
    "{" => "}",
    "⟨" => "⟩",
    "|" => "|",
    "‖" => "‖",
};

/// Delimiter characters the converter emits as plain operators.
pub static DELIMITER_CHARS: phf::Set<&'static str> = phf_set! {
    "(", ")", "[", "]", "{", "}", "⟨", "⟩", "|", "‖",
};

/// Large operators that become `m:nary` when they carry limits.
pub static NARY_CHARS: phf::Set<&'static str> = phf_set! {
    "∑", "∏", "∐", "⋃", "⋂", "⋁", "⋀",
    "∫", "∬", "∭", "∮", "∯", "∰",
    "⨁", "⨂", "⨀",
};

/// Integral-family operators; their limits are placed above and below.
pub static INTEGRAL_CHARS: phf::Set<&'static str> = phf_set! {
    "∫", "∬", "∭", "∮", "∯", "∰",
};

/// Integral glyphs the converter sometimes leaves as bare text runs.
pub static INTEGRAL_RUN_CHARS: phf::Set<&'static str> = phf_set! {
    "∫", "∬", "∭", "∮",
};

/// Summation-like operators used by the bracketed fraction pattern.
pub static SUMMATION_CHARS: phf::Set<&'static str> = phf_set! {
    "∑", "∏", "∐",
};

/// OMML constructs whose height usually exceeds one text line.
pub static TALL_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "m:m", "m:f", "m:rad", "m:nary", "m:eqArr", "m:d",
    "m:sSub", "m:sSup", "m:sSubSup", "m:sPre", "m:groupChr",
};

/// MathML `mathvariant` values mapped to OMML `m:sty` values.
pub static MATHVARIANT_STYLES: phf::Map<&'static str, &'static str> = phf_map! {
    "normal" => "p",
    "bold" => "b",
    "italic" => "i",
    "bold-italic" => "bi",
};

/// MathML `mathvariant` values mapped to OMML `m:scr` values.
pub static MATHVARIANT_SCRIPTS: phf::Map<&'static str, &'static str> = phf_map! {
    "double-struck" => "double-struck",
    "script" => "script",
    "bold-script" => "script",
    "fraktur" => "fraktur",
    "bold-fraktur" => "fraktur",
    "sans-serif" => "sans-serif",
    "bold-sans-serif" => "sans-serif",
    "sans-serif-italic" => "sans-serif",
    "monospace" => "monospace",
};

/// Closing character for an opening delimiter.
#[inline]
pub fn closing_delimiter(open: &str) -> Option<&'static str> {
    DELIMITER_PAIRS.get(open).copied()
}

/// Whether `open` and `close` form a registered pair.
#[inline]
pub fn is_delimiter_pair(open: &str, close: &str) -> bool {
    closing_delimiter(open) == Some(close)
}

/// Whether an element name is a tall construct.
#[inline]
pub fn is_tall(name: &str) -> bool {
    TALL_ELEMENTS.contains(name)
}
