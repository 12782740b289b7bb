//! Configuration tree service
//!
//! Every request loads the committed tree, applies its edits and commits
//! once. Nothing is committed when any step fails.

use std::sync::Arc;

use termtree::Tree;
use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult, Format, IoResultExt};
use crate::domain::{NodeArena, NodeId, Value};
use crate::infrastructure::traits::NodeStore;

/// Service for reading and writing subtrees of the configuration tree.
pub struct ConfigService {
    store: Arc<dyn NodeStore>,
}

impl ConfigService {
    /// Create a new config service on top of a node store.
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self { store }
    }

    /// Load the committed tree as a working copy.
    pub fn open(&self) -> ApplicationResult<NodeArena> {
        let records = self.store.fetch().with_context("fetch nodes")?;
        debug!("open: {} records", records.len());
        NodeArena::from_records(&records).map_err(ApplicationError::from_domain)
    }

    /// Persist the working copy in one step.
    pub fn commit(&self, tree: &NodeArena) -> ApplicationResult<()> {
        let records = tree.to_records();
        debug!("commit: {} records", records.len());
        self.store.commit(&records).with_context("commit nodes")
    }

    /// Generic value stored at `path`.
    #[instrument(level = "debug", skip(self))]
    pub fn read(&self, path: &str) -> ApplicationResult<Value> {
        let tree = self.open()?;
        let node = tree.lookup(path).map_err(ApplicationError::from_domain)?;
        tree.load(node).map_err(ApplicationError::from_domain)
    }

    /// Subtree at `path` encoded in `format`.
    #[instrument(level = "debug", skip(self))]
    pub fn get(&self, path: &str, format: Format) -> ApplicationResult<String> {
        let value = self.read(path)?;
        format.encode(&value)
    }

    /// Store `value` at `path`, creating missing intermediate nodes.
    #[instrument(level = "debug", skip(self, value))]
    pub fn write(&self, path: &str, value: &Value) -> ApplicationResult<()> {
        let mut tree = self.open()?;
        let node = tree
            .resolve(path, true)
            .map_err(ApplicationError::from_domain)?;
        tree.store(node, value)
            .map_err(ApplicationError::from_domain)?;
        self.commit(&tree)?;
        info!("stored {} at '{}'", value.kind_name(), path);
        Ok(())
    }

    /// Decode `body` in `format` and store it at `path`.
    #[instrument(level = "debug", skip(self, body))]
    pub fn put(&self, path: &str, format: Format, body: &str) -> ApplicationResult<()> {
        let value = format.decode(body)?;
        self.write(path, &value)
    }

    /// Same semantics as [`ConfigService::put`].
    pub fn post(&self, path: &str, format: Format, body: &str) -> ApplicationResult<()> {
        self.put(path, format, body)
    }

    /// Delete the node at `path` with its subtree. The root cannot be
    /// deleted; deleting it empties the tree instead.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&self, path: &str) -> ApplicationResult<()> {
        let mut tree = self.open()?;
        let node = tree.lookup(path).map_err(ApplicationError::from_domain)?;
        if node == tree.root() {
            tree.store(node, &Value::empty_map())
                .map_err(ApplicationError::from_domain)?;
        } else {
            tree.remove(node).map_err(ApplicationError::from_domain)?;
        }
        self.commit(&tree)?;
        info!("deleted '{}'", path);
        Ok(())
    }

    /// Subtree at `path` rendered for display.
    pub fn tree(&self, path: &str) -> ApplicationResult<Tree<String>> {
        let tree = self.open()?;
        let node = tree.lookup(path).map_err(ApplicationError::from_domain)?;
        display_tree(&tree, node).map_err(ApplicationError::from_domain)
    }
}

fn display_tree(tree: &NodeArena, id: NodeId) -> crate::domain::DomainResult<Tree<String>> {
    let node = tree.get(id)?;
    let label = if node.label().is_empty() {
        "/"
    } else {
        node.label()
    };
    let text = match node.kind().scalar() {
        Some(Value::String(s)) => format!("{} = \"{}\"", label, s),
        Some(Value::Float(f)) => format!("{} = {:?}", label, f),
        Some(Value::Int(i)) => format!("{} = {}", label, i),
        Some(Value::Bool(b)) => format!("{} = {}", label, b),
        Some(_) => format!("{} = null", label),
        None => format!("{} ({})", label, node.kind()),
    };
    let leaves = node
        .children()
        .map(|(_, child)| display_tree(tree, child))
        .collect::<crate::domain::DomainResult<Vec<_>>>()?;
    Ok(Tree::new(text).with_leaves(leaves))
}
