//! Tailoring: prompt, edit plan and run-level editing of the résumé.

pub mod edit_plan;
pub mod editor;
pub mod matching;
pub mod pipeline;
pub mod prompt_builder;
pub mod prompts;

pub use pipeline::{run, TailorOutcome};
