//! Common types and utilities shared by the formula pipeline and the
//! document writer.

pub mod text;
pub mod xml;

pub use xml::{NodeId, XmlError, XmlTree};
