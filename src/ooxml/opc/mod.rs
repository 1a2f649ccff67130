/// Open Packaging Conventions (OPC) writing support.
///
/// The structure and packaging format of Office Open XML documents: parts,
/// relationships, content types and the ZIP container they live in.

pub mod constants;
pub mod pkgwriter;

pub use pkgwriter::{PackageWriter, Part, Relationship};
