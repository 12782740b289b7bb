//! Slash-delimited path resolution over a [`NodeArena`].

use tracing::{debug, instrument};

use crate::domain::arena::{NodeArena, NodeId};
use crate::domain::error::{DomainError, DomainResult};

/// Non-empty segments of a path; leading, trailing and doubled slashes vanish.
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

impl NodeArena {
    /// Walk `path` from the root, creating missing Dict nodes when `create`
    /// is set. An empty path yields the root.
    #[instrument(level = "debug", skip(self))]
    pub fn resolve(&mut self, path: &str, create: bool) -> DomainResult<NodeId> {
        if !create {
            return self.lookup(path);
        }
        let mut current = self.root();
        for segment in split_path(path) {
            self.ensure_branch(path, current)?;
            current = self
                .child(current, segment, true)?
                .ok_or_else(|| missing(path, segment))?;
        }
        debug!("resolved '{}' (create)", path);
        Ok(current)
    }

    /// Read-only resolution: fails with `InvalidPath` on a missing segment.
    pub fn lookup(&self, path: &str) -> DomainResult<NodeId> {
        let mut current = self.root();
        for segment in split_path(path) {
            self.ensure_branch(path, current)?;
            current = self
                .find_child(current, segment)?
                .ok_or_else(|| missing(path, segment))?;
        }
        Ok(current)
    }

    fn ensure_branch(&self, path: &str, id: NodeId) -> DomainResult<()> {
        let node = self.get(id)?;
        if node.kind().is_leaf() {
            return Err(DomainError::InvalidPath {
                path: path.to_string(),
                reason: format!("path traverses leaf '{}'", self.path(id)?),
            });
        }
        Ok(())
    }
}

fn missing(path: &str, segment: &str) -> DomainError {
    DomainError::InvalidPath {
        path: path.to_string(),
        reason: format!("'{}' does not exist", segment),
    }
}
