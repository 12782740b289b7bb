//! Flat node rows for persistence: one record per node, linked by parent id.

use std::collections::{BTreeMap, HashMap};

use generational_arena::Arena;
use serde::{Deserialize, Serialize};

use crate::domain::arena::{validate_label, Node, NodeArena, NodeId, NodeKind};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Null,
    Bool,
    Int,
    Float,
    String,
    Dict,
    List,
}

/// Persisted shape of a node. `(parent, label)` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: u64,
    pub parent: Option<u64>,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: RecordType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl NodeRecord {
    fn from_node(parent: Option<u64>, node: &Node) -> Self {
        let (kind, value) = match &node.kind {
            NodeKind::Null => (RecordType::Null, None),
            NodeKind::Bool(b) => (RecordType::Bool, Some(Value::Bool(*b))),
            NodeKind::Int(i) => (RecordType::Int, Some(Value::Int(*i))),
            NodeKind::Float(f) => (RecordType::Float, Some(float_value(*f))),
            NodeKind::String(s) => (RecordType::String, Some(Value::String(s.clone()))),
            NodeKind::Dict => (RecordType::Dict, None),
            NodeKind::List => (RecordType::List, None),
        };
        Self {
            id: node.record_id,
            parent,
            label: node.label.clone(),
            kind,
            value,
        }
    }

    fn node_kind(&self) -> DomainResult<NodeKind> {
        let kind = match (self.kind, &self.value) {
            (RecordType::Null, _) => NodeKind::Null,
            (RecordType::Dict, None) => NodeKind::Dict,
            (RecordType::List, None) => NodeKind::List,
            (RecordType::Bool, Some(Value::Bool(b))) => NodeKind::Bool(*b),
            (RecordType::Int, Some(Value::Int(i))) => NodeKind::Int(*i),
            (RecordType::Float, Some(Value::Float(f))) => NodeKind::Float(*f),
            (RecordType::Float, Some(Value::Int(i))) => NodeKind::Float(*i as f64),
            (RecordType::Float, Some(Value::String(s))) => {
                let f = s.parse().map_err(|_| {
                    DomainError::CorruptStore(format!("node {} has float value '{}'", self.id, s))
                })?;
                NodeKind::Float(f)
            }
            (RecordType::String, Some(Value::String(s))) => NodeKind::String(s.clone()),
            (kind, value) => {
                return Err(DomainError::CorruptStore(format!(
                    "node {} has type {:?} but value {:?}",
                    self.id, kind, value
                )))
            }
        };
        Ok(kind)
    }
}

/// JSON has no representation for infinities and NaN; those are kept as
/// their text form under the float type.
fn float_value(f: f64) -> Value {
    if f.is_finite() {
        Value::Float(f)
    } else {
        Value::String(f.to_string())
    }
}

impl NodeArena {
    /// Rows in pre-order, so every parent precedes its children. Each row
    /// keeps the id its node was loaded or created with.
    pub fn to_records(&self) -> Vec<NodeRecord> {
        self.iter()
            .map(|(_, node)| {
                let parent = node
                    .parent
                    .and_then(|p| self.get(p).ok())
                    .map(|parent| parent.record_id);
                NodeRecord::from_node(parent, node)
            })
            .collect()
    }

    /// Rebuild a tree from rows, validating the tree invariants.
    /// No rows means a fresh tree.
    pub fn from_records(records: &[NodeRecord]) -> DomainResult<Self> {
        if records.is_empty() {
            return Ok(Self::new());
        }

        let mut roots = records.iter().filter(|r| r.parent.is_none());
        let root_record = roots
            .next()
            .ok_or_else(|| DomainError::CorruptStore("no root node".to_string()))?;
        if roots.next().is_some() {
            return Err(DomainError::CorruptStore("more than one root node".to_string()));
        }
        if !root_record.label.is_empty() {
            return Err(DomainError::CorruptStore(format!(
                "root node has label '{}'",
                root_record.label
            )));
        }

        let mut arena = Arena::with_capacity(records.len());
        let mut index: HashMap<u64, NodeId> = HashMap::with_capacity(records.len());
        for record in records {
            let idx = arena.insert(Node {
                label: record.label.clone(),
                parent: None,
                kind: record.node_kind()?,
                children: BTreeMap::new(),
                record_id: record.id,
            });
            if index.insert(record.id, idx).is_some() {
                return Err(DomainError::CorruptStore(format!("duplicate id {}", record.id)));
            }
        }

        for record in records {
            let Some(parent_id) = record.parent else {
                continue;
            };
            validate_label(&record.label)
                .map_err(|e| DomainError::CorruptStore(format!("node {}: {}", record.id, e)))?;
            let child = index[&record.id];
            let parent = *index.get(&parent_id).ok_or_else(|| {
                DomainError::CorruptStore(format!(
                    "node {} references missing parent {}",
                    record.id, parent_id
                ))
            })?;
            let parent_node = arena.get_mut(parent).ok_or(DomainError::NodeNotFound)?;
            if parent_node.kind.is_leaf() {
                return Err(DomainError::CorruptStore(format!(
                    "node {} has a leaf parent",
                    record.id
                )));
            }
            if parent_node
                .children
                .insert(record.label.clone(), child)
                .is_some()
            {
                return Err(DomainError::CorruptStore(format!(
                    "duplicate label '{}' under node {}",
                    record.label, parent_id
                )));
            }
            if let Some(node) = arena.get_mut(child) {
                node.parent = Some(parent);
            }
        }

        let root = index[&root_record.id];
        let tree = NodeArena::from_parts(arena, root);
        if tree.iter().count() != records.len() {
            return Err(DomainError::CorruptStore(
                "nodes unreachable from the root".to_string(),
            ));
        }
        Ok(tree)
    }
}
