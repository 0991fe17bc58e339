//! Immutable parent → children view of one list scope
//!
//! A `TreeSnapshot` is rebuilt from the store's node list on every change and
//! is the only data drop resolution reads. Nodes whose parent is not part of
//! the scope are treated as roots, and parent cycles in corrupted input are
//! broken at the node where the walk closes.

use std::collections::{HashMap, HashSet};

use trellis_api::TreeNode;

/// A rendered row: a node and its display depth (roots are depth 0)
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRow<N> {
    pub node: N,
    pub depth: usize,
}

impl<N: TreeNode> FlatRow<N> {
    pub fn id(&self) -> &str {
        self.node.id()
    }
}

#[derive(Debug, Clone)]
pub struct TreeSnapshot<N> {
    nodes: HashMap<String, N>,
    /// Effective parent of every node (orphans and cycle breaks map to `None`)
    parents: HashMap<String, Option<String>>,
    /// Children per parent, sorted by `(order_key, id)`
    children: HashMap<Option<String>, Vec<String>>,
}

impl<N: TreeNode> Default for TreeSnapshot<N> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            parents: HashMap::new(),
            children: HashMap::new(),
        }
    }
}

impl<N: TreeNode> TreeSnapshot<N> {
    pub fn from_nodes(items: impl IntoIterator<Item = N>) -> Self {
        let nodes: HashMap<String, N> = items
            .into_iter()
            .map(|n| (n.id().to_string(), n))
            .collect();

        let mut parents: HashMap<String, Option<String>> = nodes
            .values()
            .map(|n| {
                let parent = n
                    .parent_id()
                    .filter(|p| nodes.contains_key(*p))
                    .map(|p| p.to_string());
                (n.id().to_string(), parent)
            })
            .collect();

        let mut ids: Vec<&String> = nodes.keys().collect();
        ids.sort();
        for id in ids {
            let mut seen = HashSet::new();
            let mut current = id.clone();
            loop {
                if !seen.insert(current.clone()) {
                    tracing::warn!(
                        "[TreeSnapshot] Parent cycle through '{}', treating it as a root",
                        current
                    );
                    parents.insert(current, None);
                    break;
                }
                match parents.get(&current).cloned().flatten() {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
        }

        let mut children: HashMap<Option<String>, Vec<String>> = HashMap::new();
        for (id, parent) in &parents {
            children.entry(parent.clone()).or_default().push(id.clone());
        }
        for list in children.values_mut() {
            list.sort_by(|a, b| {
                nodes[a]
                    .order_key()
                    .cmp(&nodes[b].order_key())
                    .then_with(|| a.cmp(b))
            });
        }

        Self {
            nodes,
            parents,
            children,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&N> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.nodes.values()
    }

    /// Effective parent; `None` for roots and unknown ids
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.parents.get(id).and_then(|p| p.as_deref())
    }

    /// Child ids of `parent` (`None` = roots), in sibling order
    pub fn child_ids(&self, parent: Option<&str>) -> &[String] {
        self.children
            .get(&parent.map(|p| p.to_string()))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn children(&self, parent: Option<&str>) -> Vec<&N> {
        self.child_ids(parent)
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }

    /// Children of `parent` in order, without `exclude`
    pub fn children_excluding(&self, parent: Option<&str>, exclude: &str) -> Vec<&str> {
        self.child_ids(parent)
            .iter()
            .map(|id| id.as_str())
            .filter(|id| *id != exclude)
            .collect()
    }

    /// Ancestor ids from the direct parent up to the root
    pub fn ancestors(&self, id: &str) -> Vec<&str> {
        let mut result = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            result.push(parent);
            current = self.parent_of(parent);
        }
        result
    }

    pub fn is_ancestor(&self, ancestor: &str, of: &str) -> bool {
        self.ancestors(of).contains(&ancestor)
    }

    pub fn depth_of(&self, id: &str) -> Option<usize> {
        self.contains(id).then(|| self.ancestors(id).len())
    }

    /// Depth-annotated rows in pre-order, skipping descendants of `collapsed` nodes
    pub fn flatten(&self, collapsed: &HashSet<String>) -> Vec<FlatRow<N>> {
        let mut rows = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(&str, usize)> = self
            .child_ids(None)
            .iter()
            .rev()
            .map(|id| (id.as_str(), 0))
            .collect();

        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            rows.push(FlatRow {
                node: node.clone(),
                depth,
            });
            if collapsed.contains(id) {
                continue;
            }
            for child in self.child_ids(Some(id)).iter().rev() {
                stack.push((child.as_str(), depth + 1));
            }
        }

        rows
    }

    /// Fully expanded flattening
    pub fn flatten_all(&self) -> Vec<FlatRow<N>> {
        self.flatten(&HashSet::new())
    }
}
