use std::collections::BTreeMap;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::value::Value;

/// Stable handle of a node inside its [`NodeArena`].
pub type NodeId = Index;

/// Type tag of a node. Leaf variants carry their scalar, branches carry none.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Dict,
    List,
}

/// Branch flavour requested by the tree codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Dict,
    List,
}

impl NodeKind {
    pub fn is_leaf(&self) -> bool {
        !self.is_branch()
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, NodeKind::Dict | NodeKind::List)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Null => "null",
            NodeKind::Bool(_) => "bool",
            NodeKind::Int(_) => "int",
            NodeKind::Float(_) => "float",
            NodeKind::String(_) => "string",
            NodeKind::Dict => "dict",
            NodeKind::List => "list",
        }
    }

    /// Leaf kind for a scalar value; `None` for lists and maps.
    pub fn from_scalar(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(NodeKind::Null),
            Value::Bool(b) => Some(NodeKind::Bool(*b)),
            Value::Int(i) => Some(NodeKind::Int(*i)),
            Value::Float(f) => Some(NodeKind::Float(*f)),
            Value::String(s) => Some(NodeKind::String(s.clone())),
            Value::List(_) | Value::Map(_) => None,
        }
    }

    /// Stored scalar for leaves; `None` for branches.
    pub fn scalar(&self) -> Option<Value> {
        match self {
            NodeKind::Null => Some(Value::Null),
            NodeKind::Bool(b) => Some(Value::Bool(*b)),
            NodeKind::Int(i) => Some(Value::Int(*i)),
            NodeKind::Float(f) => Some(Value::Float(*f)),
            NodeKind::String(s) => Some(Value::String(s.clone())),
            NodeKind::Dict | NodeKind::List => None,
        }
    }
}

impl From<BranchKind> for NodeKind {
    fn from(kind: BranchKind) -> Self {
        match kind {
            BranchKind::Dict => NodeKind::Dict,
            BranchKind::List => NodeKind::List,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Tree node in the arena-based hierarchy.
#[derive(Debug)]
pub struct Node {
    /// Name of the node, unique among its siblings; empty only for the root
    pub(crate) label: String,
    /// Index of parent node in the arena, None for the root
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
    /// Child indices keyed by label
    pub(crate) children: BTreeMap<String, NodeId>,
    /// Persisted row id; kept for the node's whole lifetime
    pub(crate) record_id: u64,
}

impl Node {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn record_id(&self) -> u64 {
        self.record_id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Children in label order.
    pub fn children(&self) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.children.iter().map(|(label, &id)| (label.as_str(), id))
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// Arena owning every node of one configuration tree.
///
/// The root always exists; all cross references are arena indices, so
/// parent links never form ownership cycles.
#[derive(Debug)]
pub struct NodeArena {
    arena: Arena<Node>,
    root: NodeId,
    /// Next unused record id, above every id ever handed out
    next_record_id: u64,
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeArena {
    /// Empty tree holding only the root (an empty Dict).
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(Node {
            label: String::new(),
            parent: None,
            kind: NodeKind::Dict,
            children: BTreeMap::new(),
            record_id: 0,
        });
        Self {
            arena,
            root,
            next_record_id: 1,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.get(self.root)
            .map(|root| root.children.is_empty())
            .unwrap_or(true)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id)
    }

    pub fn get(&self, id: NodeId) -> DomainResult<&Node> {
        self.arena.get(id).ok_or(DomainError::NodeNotFound)
    }

    fn get_mut(&mut self, id: NodeId) -> DomainResult<&mut Node> {
        self.arena.get_mut(id).ok_or(DomainError::NodeNotFound)
    }

    pub fn kind(&self, id: NodeId) -> DomainResult<&NodeKind> {
        Ok(&self.get(id)?.kind)
    }

    /// Store a scalar: the node becomes a leaf of the matching kind and
    /// loses all of its children.
    #[instrument(level = "trace", skip(self))]
    pub fn set_value(&mut self, id: NodeId, value: &Value) -> DomainResult<()> {
        let kind = match NodeKind::from_scalar(value) {
            Some(kind) => kind,
            None => {
                return Err(DomainError::NotALeaf(format!(
                    "cannot store a {} as a leaf value at '{}'",
                    value.kind_name(),
                    self.path(id)?
                )))
            }
        };
        self.clear(id)?;
        self.get_mut(id)?.kind = kind;
        Ok(())
    }

    /// Scalar of a leaf node; `NotALeaf` for Dict and List nodes.
    pub fn get_value(&self, id: NodeId) -> DomainResult<Value> {
        let node = self.get(id)?;
        node.kind
            .scalar()
            .ok_or_else(|| DomainError::NotALeaf(self.path(id).unwrap_or_default()))
    }

    /// Turn the node into a branch. A former scalar is dropped, existing
    /// children of a branch are kept for reconciliation.
    pub fn set_branch(&mut self, id: NodeId, kind: BranchKind) -> DomainResult<()> {
        self.get_mut(id)?.kind = kind.into();
        Ok(())
    }

    /// Child lookup by label, optionally creating a Dict child.
    ///
    /// Returns `Ok(None)` if the child is missing and `create` is false.
    #[instrument(level = "trace", skip(self))]
    pub fn child(&mut self, id: NodeId, label: &str, create: bool) -> DomainResult<Option<NodeId>> {
        let node = self.get(id)?;
        if let Some(&child) = node.children.get(label) {
            return Ok(Some(child));
        }
        if !create {
            return Ok(None);
        }
        if node.kind.is_leaf() {
            return Err(DomainError::InvalidPath {
                path: self.path(id)?,
                reason: format!("cannot attach child '{}' to a {} leaf", label, node.kind),
            });
        }
        self.attach(id, label, NodeKind::Dict).map(Some)
    }

    /// Child lookup without creation, usable on a shared borrow.
    pub fn find_child(&self, id: NodeId, label: &str) -> DomainResult<Option<NodeId>> {
        Ok(self.get(id)?.children.get(label).copied())
    }

    fn attach(&mut self, parent: NodeId, label: &str, kind: NodeKind) -> DomainResult<NodeId> {
        validate_label(label)?;
        if self.get(parent)?.children.contains_key(label) {
            return Err(DomainError::LabelConflict {
                parent: self.path(parent)?,
                label: label.to_string(),
            });
        }
        let record_id = self.next_record_id;
        self.next_record_id += 1;
        let child = self.arena.insert(Node {
            label: label.to_string(),
            parent: Some(parent),
            kind,
            children: BTreeMap::new(),
            record_id,
        });
        self.get_mut(parent)?.children.insert(label.to_string(), child);
        debug!("created node '{}' under '{}'", label, self.path(parent)?);
        Ok(child)
    }

    /// Delete all descendants of a node, leaving the node itself in place.
    pub fn clear(&mut self, id: NodeId) -> DomainResult<()> {
        let children: Vec<NodeId> = std::mem::take(&mut self.get_mut(id)?.children)
            .into_values()
            .collect();
        for child in children {
            self.drop_subtree(child);
        }
        Ok(())
    }

    /// Cascade delete: detach the node from its parent and free its subtree
    /// bottom-up. The root is never deleted.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, id: NodeId) -> DomainResult<()> {
        if id == self.root {
            return Err(DomainError::RootDeletion);
        }
        let (parent, label) = {
            let node = self.get(id)?;
            (node.parent, node.label.clone())
        };
        if let Some(parent) = parent {
            self.get_mut(parent)?.children.remove(&label);
        }
        self.drop_subtree(id);
        Ok(())
    }

    fn drop_subtree(&mut self, id: NodeId) {
        let doomed: Vec<NodeId> = self.iter_postorder_from(id).map(|(idx, _)| idx).collect();
        for idx in doomed {
            self.arena.remove(idx);
        }
    }

    /// Move a node (with its subtree) under a new parent.
    #[instrument(level = "debug", skip(self))]
    pub fn reparent(&mut self, id: NodeId, new_parent: NodeId) -> DomainResult<()> {
        if id == self.root {
            return Err(DomainError::RootDeletion);
        }
        if self.xpath(new_parent)?.contains(&id) {
            return Err(DomainError::Cycle(self.path(id)?));
        }
        let target = self.get(new_parent)?;
        if target.kind.is_leaf() {
            return Err(DomainError::InvalidPath {
                path: self.path(new_parent)?,
                reason: "cannot move a node under a leaf".to_string(),
            });
        }
        let (old_parent, label) = {
            let node = self.get(id)?;
            (node.parent, node.label.clone())
        };
        if old_parent == Some(new_parent) {
            return Ok(());
        }
        if target.children.contains_key(&label) {
            return Err(DomainError::LabelConflict {
                parent: self.path(new_parent)?,
                label,
            });
        }
        if let Some(old) = old_parent {
            self.get_mut(old)?.children.remove(&label);
        }
        self.get_mut(new_parent)?.children.insert(label, id);
        self.get_mut(id)?.parent = Some(new_parent);
        Ok(())
    }

    /// Ancestor chain from the root down to (and including) the node.
    pub fn xpath(&self, id: NodeId) -> DomainResult<Vec<NodeId>> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(idx) = current {
            chain.push(idx);
            current = self.get(idx)?.parent;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Slash separated labels from the root; the root itself is "".
    pub fn path(&self, id: NodeId) -> DomainResult<String> {
        let labels = self
            .xpath(id)?
            .into_iter()
            .map(|idx| self.get(idx).map(|node| node.label.as_str()))
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(labels
            .into_iter()
            .filter(|label| !label.is_empty())
            .collect::<Vec<_>>()
            .join("/"))
    }

    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, self.root)
    }

    pub fn iter_postorder_from(&self, id: NodeId) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self, id)
    }

    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root)
    }

    fn calculate_depth(&self, id: NodeId) -> usize {
        match self.arena.get(id) {
            Some(node) => {
                1 + node
                    .children
                    .values()
                    .map(|&child| self.calculate_depth(child))
                    .max()
                    .unwrap_or(0)
            }
            None => 0,
        }
    }

    pub(crate) fn from_parts(arena: Arena<Node>, root: NodeId) -> Self {
        let next_record_id = arena
            .iter()
            .map(|(_, node)| node.record_id)
            .max()
            .map_or(0, |max| max + 1);
        Self {
            arena,
            root,
            next_record_id,
        }
    }
}

/// Labels become path segments, so they cannot be empty or contain `/`.
pub fn validate_label(label: &str) -> DomainResult<()> {
    if label.is_empty() || label.contains('/') {
        return Err(DomainError::InvalidLabel(label.to_string()));
    }
    Ok(())
}

/// Pre-order traversal, children in label order.
pub struct TreeIterator<'a> {
    arena: &'a NodeArena,
    stack: Vec<NodeId>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a NodeArena, start: NodeId) -> Self {
        Self {
            arena,
            stack: vec![start],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(node) = self.arena.arena.get(current) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.values().rev().copied());
                return Some((current, node));
            }
        }
        None
    }
}

/// Post-order traversal: every node is yielded after its descendants.
pub struct PostOrderIterator<'a> {
    arena: &'a NodeArena,
    stack: Vec<(NodeId, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a NodeArena, start: NodeId) -> Self {
        Self {
            arena,
            stack: vec![(start, false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.arena.get(current) {
                if visited {
                    return Some((current, node));
                }
                self.stack.push((current, true));
                for &child in node.children.values().rev() {
                    self.stack.push((child, false));
                }
            }
        }
        None
    }
}
