//! Conversion between generic values and node subtrees.
//!
//! `store` reconciles incrementally: children whose labels survive are
//! updated in place, missing ones are created and stale ones deleted.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

use itertools::Itertools;
use tracing::{debug, instrument, trace};

use crate::domain::arena::{BranchKind, NodeArena, NodeId, NodeKind};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::value::Value;

impl NodeArena {
    /// Materialize `value` under the node.
    #[instrument(level = "trace", skip(self, value))]
    pub fn store(&mut self, id: NodeId, value: &Value) -> DomainResult<()> {
        let (kind, entries): (BranchKind, Cow<'_, BTreeMap<String, Value>>) = match value {
            Value::List(items) => (
                BranchKind::List,
                Cow::Owned(
                    items
                        .iter()
                        .enumerate()
                        .map(|(index, item)| (index.to_string(), item.clone()))
                        .collect(),
                ),
            ),
            Value::Map(map) => (BranchKind::Dict, Cow::Borrowed(map)),
            scalar => return self.set_value(id, scalar),
        };
        if let Some(bad) = entries.keys().find(|label| label.is_empty() || label.contains('/')) {
            return Err(DomainError::UnsupportedValue(format!(
                "key '{}' cannot be used as a node label",
                bad
            )));
        }

        if self.kind(id)?.is_leaf() {
            trace!("leaf '{}' becomes a branch", self.path(id)?);
        }
        self.set_branch(id, kind)?;

        let stale: Vec<NodeId> = self
            .get(id)?
            .children()
            .filter(|(label, _)| !entries.contains_key(*label))
            .map(|(_, child)| child)
            .collect();
        for child in stale {
            debug!("removing stale node '{}'", self.path(child)?);
            self.remove(child)?;
        }

        for (label, item) in entries.iter() {
            let child = self
                .child(id, label, true)?
                .ok_or(DomainError::NodeNotFound)?;
            self.store(child, item)?;
        }
        Ok(())
    }

    /// Rebuild the generic value held by the node's subtree.
    ///
    /// List children are ordered by numeric label; gaps are not filled, so
    /// labels `0, 2, 5` load as a three element list.
    pub fn load(&self, id: NodeId) -> DomainResult<Value> {
        let node = self.get(id)?;
        match node.kind() {
            NodeKind::Dict => {
                let map = node
                    .children()
                    .map(|(label, child)| Ok((label.to_string(), self.load(child)?)))
                    .collect::<DomainResult<BTreeMap<_, _>>>()?;
                Ok(Value::Map(map))
            }
            NodeKind::List => {
                let items = node
                    .children()
                    .sorted_by_key(|(label, _)| list_position(label))
                    .map(|(_, child)| self.load(child))
                    .collect::<DomainResult<Vec<_>>>()?;
                Ok(Value::List(items))
            }
            leaf => leaf
                .scalar()
                .ok_or_else(|| DomainError::NotALeaf(self.path(id).unwrap_or_default())),
        }
    }

    /// Labels of the node's current children.
    pub fn child_labels(&self, id: NodeId) -> DomainResult<HashSet<String>> {
        Ok(self
            .get(id)?
            .children()
            .map(|(label, _)| label.to_string())
            .collect())
    }
}

/// Sort key for list children: numeric labels first by value, anything
/// else (only reachable by writing through a path) afterwards by label.
fn list_position(label: &str) -> (bool, u64, String) {
    match label.parse::<u64>() {
        Ok(index) => (false, index, String::new()),
        Err(_) => (true, 0, label.to_string()),
    }
}
