//! Generation domain

mod result;

pub use result::GenerationResult;
