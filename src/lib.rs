//! Hierarchical configuration store.
//!
//! Nested configuration values live in a tree of addressable nodes and are
//! read and written by slash-delimited path in several text encodings.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
