//! Document writer components for DOCX.
//!
//! Builds `word/document.xml`, `word/styles.xml` and `word/numbering.xml`
//! for a generated document.

pub mod doc;
pub mod numbering;
pub mod paragraph;
pub mod run;
pub mod style;

pub use doc::MutableDocument;
pub use numbering::generate_numbering_xml;
pub use paragraph::{ListType, MutableParagraph, ParagraphAlignment};
pub use run::{MutableRun, RunContent};
pub use style::{CODE_FONT, MutableStyle, StyleType, default_styles, generate_styles_xml};
