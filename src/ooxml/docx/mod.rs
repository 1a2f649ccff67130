//! Word document (.docx) generation.
//!
//! Documents are built through the [`writer`] API, serialized, patched with
//! OMML by [`splice`] and packaged by [`DocxPackage`].
//!
//! # Example
//!
//! ```rust,no_run
//! use mathdocx::ooxml::docx::{DocxPackage, writer::MutableDocument};
//!
//! let mut doc = MutableDocument::new();
//! doc.add_heading(1)?.add_run_with_text("Results");
//! doc.add_paragraph_with_text("Plain text paragraph.");
//!
//! DocxPackage::from_document(&doc)?.save("results.docx")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod package;
pub mod splice;
pub mod writer;

pub use package::DocxPackage;
pub use splice::{SpliceOutcome, splice_math};
