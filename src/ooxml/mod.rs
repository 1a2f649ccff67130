//! Office Open XML (OOXML) output.
//!
//! The module is organized into two layers:
//!
//! 1. **OPC Layer** (`opc`): package writing (ZIP, parts, relationships)
//! 2. **Word** (`docx`): document writer, math splicing and the Word package
//!
//! # Example
//!
//! ```rust,no_run
//! use mathdocx::ooxml::docx::{DocxPackage, writer::MutableDocument};
//!
//! let mut doc = MutableDocument::new();
//! doc.add_paragraph_with_text("Hello");
//! let bytes = DocxPackage::from_document(&doc)?.to_bytes()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod docx;
pub mod error;
pub mod opc;

// Re-export error types
pub use error::{OoxmlError, Result};
