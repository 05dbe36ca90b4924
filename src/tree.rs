// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Node tree walking.
//!
//! [`NodeTreeWalker`] enumerates the server's address space into a
//! [`NodeTree`]: a nested mapping keyed by display name, with variables as
//! leaves and objects/views as branches. The walk is strictly sequential
//! (one browse at a time), guards against reference cycles with a visited
//! set, and enforces a configurable depth bound.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;

use tracing::{debug, trace};

use crate::client::{BrowseResult, OpcUaTransport};
use crate::error::{BrowseError, IoServerError, IoServerResult};
use crate::types::{NodeClass, NodeId};

// =============================================================================
// TagNode
// =============================================================================

/// A leaf in the node tree: a variable node usable for reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagNode {
    /// Node ID the server knows this tag by.
    pub node_id: NodeId,

    /// Display name the tree is keyed by.
    pub display_name: String,
}

impl TagNode {
    /// Creates a tag node.
    pub fn new(node_id: NodeId, display_name: impl Into<String>) -> Self {
        Self {
            node_id,
            display_name: display_name.into(),
        }
    }
}

// =============================================================================
// NodeTree
// =============================================================================

/// A subtree of the server's address space, keyed by display name.
///
/// Sibling order is not preserved; when two siblings share a display name the
/// later-enumerated one wins.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeTree {
    /// A variable node (a tag).
    Leaf(TagNode),

    /// A folder node containing children by display name.
    Branch(HashMap<String, NodeTree>),
}

impl NodeTree {
    /// Creates an empty branch.
    pub fn empty() -> Self {
        Self::Branch(HashMap::new())
    }

    /// Returns `true` if this is a leaf.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// Returns `true` if this is a branch.
    #[inline]
    pub fn is_branch(&self) -> bool {
        matches!(self, Self::Branch(_))
    }

    /// Returns the tag node if this is a leaf.
    pub fn as_leaf(&self) -> Option<&TagNode> {
        match self {
            Self::Leaf(tag) => Some(tag),
            Self::Branch(_) => None,
        }
    }

    /// Returns the children mapping if this is a branch.
    pub fn as_branch(&self) -> Option<&HashMap<String, NodeTree>> {
        match self {
            Self::Leaf(_) => None,
            Self::Branch(children) => Some(children),
        }
    }

    /// Returns the direct child with the given display name.
    pub fn get(&self, name: &str) -> Option<&NodeTree> {
        self.as_branch().and_then(|children| children.get(name))
    }

    /// Looks up an entry by slash-separated path, e.g. `"Motors/Motor1"`.
    ///
    /// # Errors
    ///
    /// Returns [`BrowseError::PathNotFound`] if any segment is missing or a
    /// leaf is hit before the last segment.
    pub fn lookup(&self, path: &str) -> IoServerResult<&NodeTree> {
        let mut current = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = current.get(segment).ok_or_else(|| {
                IoServerError::browse(BrowseError::path_not_found(path))
            })?;
        }
        Ok(current)
    }

    /// Looks up a tag by path, erroring if the path leads to a folder.
    pub fn lookup_tag(&self, path: &str) -> IoServerResult<&TagNode> {
        self.lookup(path)?.as_leaf().ok_or_else(|| {
            IoServerError::operation(crate::error::OperationError::not_a_tag(path))
        })
    }

    /// Returns the number of leaves in this subtree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Branch(children) => children.values().map(NodeTree::leaf_count).sum(),
        }
    }

    /// Returns all leaves with their slash-separated paths.
    pub fn leaves(&self) -> Vec<(String, &TagNode)> {
        let mut out = Vec::new();
        self.collect_leaves(String::new(), &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, prefix: String, out: &mut Vec<(String, &'a TagNode)>) {
        match self {
            Self::Leaf(tag) => out.push((prefix, tag)),
            Self::Branch(children) => {
                for (name, child) in children {
                    let path = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{}/{}", prefix, name)
                    };
                    child.collect_leaves(path, out);
                }
            }
        }
    }

    /// Returns `true` if this subtree contains no entries.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Leaf(_) => false,
            Self::Branch(children) => children.is_empty(),
        }
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// NodeTreeWalker
// =============================================================================

/// Recursive walker over the server's address space.
pub struct NodeTreeWalker {
    max_depth: usize,
}

impl NodeTreeWalker {
    /// Creates a walker with the given depth bound.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Walks the subtree under `root` into a [`NodeTree`].
    ///
    /// Classification per child:
    /// - `Variable` becomes a leaf under its display name.
    /// - `Object` and `View` become branches, walked recursively.
    /// - Any other node class is skipped.
    ///
    /// Already-visited nodes are skipped, so reference cycles terminate.
    ///
    /// # Errors
    ///
    /// A browse failure on any node aborts the walk; the partial tree is
    /// discarded. Exceeding the depth bound is [`BrowseError::DepthExceeded`].
    pub async fn walk<T>(&self, transport: &T, root: &NodeId) -> IoServerResult<NodeTree>
    where
        T: OpcUaTransport + ?Sized,
    {
        let mut visited = HashSet::new();
        visited.insert(root.clone());
        self.walk_children(transport, root, 1, &mut visited).await
    }

    /// Boxed for async recursion.
    fn walk_children<'a, T>(
        &'a self,
        transport: &'a T,
        node: &'a NodeId,
        depth: usize,
        visited: &'a mut HashSet<NodeId>,
    ) -> Pin<Box<dyn Future<Output = IoServerResult<NodeTree>> + Send + 'a>>
    where
        T: OpcUaTransport + ?Sized,
    {
        Box::pin(async move {
            if depth > self.max_depth {
                return Err(IoServerError::browse(BrowseError::depth_exceeded(
                    depth,
                    self.max_depth,
                )));
            }

            let children = transport.browse(node).await?;
            let mut mapping = HashMap::with_capacity(children.len());

            for child in children {
                let BrowseResult {
                    node_id,
                    display_name,
                    node_class,
                    ..
                } = child;

                match node_class {
                    NodeClass::Variable => {
                        trace!(node_id = %node_id, name = %display_name, "Found tag");
                        mapping.insert(
                            display_name.clone(),
                            NodeTree::Leaf(TagNode::new(node_id, display_name)),
                        );
                    }
                    class if class.is_container() => {
                        if !visited.insert(node_id.clone()) {
                            debug!(node_id = %node_id, name = %display_name, "Skipping already-visited node");
                            continue;
                        }
                        let subtree = self
                            .walk_children(transport, &node_id, depth + 1, visited)
                            .await?;
                        mapping.insert(display_name, subtree);
                    }
                    other => {
                        trace!(
                            node_id = %node_id,
                            name = %display_name,
                            node_class = %other,
                            "Skipping non-tag, non-folder node"
                        );
                    }
                }
            }

            Ok(NodeTree::Branch(mapping))
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> NodeTree {
        NodeTree::Leaf(TagNode::new(NodeId::string(2, name), name))
    }

    fn branch(entries: Vec<(&str, NodeTree)>) -> NodeTree {
        NodeTree::Branch(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    fn sample_tree() -> NodeTree {
        branch(vec![
            ("Temperature", leaf("Temperature")),
            (
                "Motors",
                branch(vec![("Motor1", leaf("Motor1")), ("Motor2", leaf("Motor2"))]),
            ),
        ])
    }

    #[test]
    fn test_lookup_by_path() {
        let tree = sample_tree();

        assert!(tree.lookup("Temperature").unwrap().is_leaf());
        assert!(tree.lookup("Motors").unwrap().is_branch());
        assert!(tree.lookup("Motors/Motor1").unwrap().is_leaf());
        assert!(tree.lookup("Motors/Missing").is_err());
        assert!(tree.lookup("Missing").is_err());

        // Descending through a leaf is a path error too.
        assert!(tree.lookup("Temperature/Deeper").is_err());
    }

    #[test]
    fn test_lookup_tag() {
        let tree = sample_tree();

        let tag = tree.lookup_tag("Motors/Motor1").unwrap();
        assert_eq!(tag.display_name, "Motor1");

        let err = tree.lookup_tag("Motors").unwrap_err();
        assert!(err.is_operation());
    }

    #[test]
    fn test_leaf_count_and_leaves() {
        let tree = sample_tree();
        assert_eq!(tree.leaf_count(), 3);

        let mut paths: Vec<String> = tree.leaves().into_iter().map(|(p, _)| p).collect();
        paths.sort();
        assert_eq!(paths, ["Motors/Motor1", "Motors/Motor2", "Temperature"]);
    }

    #[test]
    fn test_empty_tree() {
        let tree = NodeTree::empty();
        assert!(tree.is_empty());
        assert!(tree.is_branch());
        assert_eq!(tree.leaf_count(), 0);
        assert!(tree.leaves().is_empty());
    }

    #[test]
    fn test_get_on_leaf() {
        let tree = leaf("Temperature");
        assert!(tree.get("anything").is_none());
        assert!(!tree.is_empty());
    }
}
