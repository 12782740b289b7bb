//! Domain layer: node tree, path resolution and value codecs
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod codec;
pub mod error;
pub mod properties;
pub mod record;
pub mod resolver;
pub mod value;

pub use arena::{BranchKind, Node, NodeArena, NodeId, NodeKind};
pub use error::{DomainError, DomainResult};
pub use record::{NodeRecord, RecordType};
pub use resolver::split_path;
pub use value::Value;

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
///
/// Uses shellexpand crate for robust expansion.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
