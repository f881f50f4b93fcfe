//! Question set loading

mod loader;

pub use loader::load_question_set;
