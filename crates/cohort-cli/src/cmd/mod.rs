pub mod completions;
pub mod detect;
