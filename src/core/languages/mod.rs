//! Source language front ends
//!
//! Each front end lowers a concrete syntax tree into the owned model in
//! [`crate::core::syntax`].

mod java;

pub use java::JavaParser;
