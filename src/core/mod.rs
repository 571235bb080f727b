// src/core/mod.rs
mod engine;
mod file_index;
mod options;
mod parser;
mod patterns;

pub mod call_graph;
pub mod languages;
pub mod reporters;
pub mod symbols;
pub mod syntax;

pub use engine::Engine;
pub use file_index::{qualified_name_for, FileIndex, SourceTree};
pub use options::{AnalyzeOptions, LanguageLevel};
pub use parser::ParserContext;
pub use patterns::Patterns;
