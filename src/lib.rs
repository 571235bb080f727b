//! Static call graphs for cucumber step definitions in Java projects

pub mod cli;
pub mod config;
pub mod core;
pub mod error;

pub use crate::config::Config;
pub use crate::core::Engine;
pub use crate::error::{Result, StepTraceError};
