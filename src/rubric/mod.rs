//! Rubric lookup by `(provider, level, task type)`.

pub mod cached;
pub mod error;
pub mod file;
pub mod source;


pub use cached::CachedRubricSource;
pub use error::RubricError;
pub use file::FileRubricSource;
pub use source::{RubricSource, StaticRubricSource};
