//! Patient cognitive-model data types.
//!
//! - [`RawPatientRecord`]: loosely-typed input from dataset parsers
//! - [`CognitiveModel`]: canonical profile produced by the normalizer
//! - [`PrimaryStyle`]: categorical style inferred from numeric dimensions

mod raw;
mod style;
mod types;

pub use raw::*;
pub use style::*;
pub use types::*;
