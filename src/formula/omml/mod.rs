// OMML (Office Math Markup Language) side of the pipeline
//
// - `convert`: the pluggable MathML to OMML converter and the built-in one
// - `invoke`: converter invocation with a fence-stripped retry
// - `repair`: the named structural repair passes
// - `build`, `lookup`: construction helpers and static tables
//
// Reference: https://devblogs.microsoft.com/math-in-office/officemath/

pub mod build;
mod convert;
mod invoke;
pub mod lookup;
pub mod repair;

pub use convert::{BuiltinConverter, MathmlToOmml};
pub use invoke::{convert_with_retry, has_fraction_marker, strip_fence_operators};
pub use repair::{RepairPass, RepairPipeline, RepairState};
