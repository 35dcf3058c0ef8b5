//! Dependency closure over extension links
//!
//! Item A depends on item B when A's extension links (directly or through a
//! child row) to the extension owned by B. The closure walks those edges
//! depth first from a root item and records every item it reaches in
//! first-visit order.
//!
//! Link data is user-editable, so the graph is not trusted to be acyclic: the
//! walk keeps a visited set and an explicit stack, and terminates on any
//! shape of graph.
//!
//! # Example
//!
//! ```
//! use registry_core::{DependencyGraph, DependencyNode};
//! use registry_meta::ItemType;
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_node(DependencyNode::new("agent", Some(ItemType::Agent)));
//! graph.add_node(DependencyNode::new("tool", Some(ItemType::Tool)));
//! graph.add_edge("agent", "tool");
//!
//! assert_eq!(graph.ids(), vec!["agent", "tool"]);
//! assert_eq!(graph.dependencies_of("agent"), vec!["tool"]);
//! ```

use std::collections::{HashMap, HashSet};

use registry_meta::ItemType;
use registry_store::EntityStore;

use crate::{Result, catalog, extension, reference};

/// One visited item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    /// Internal item identifier
    pub id: String,
    /// `None` when the item record is missing
    pub item_type: Option<ItemType>,
}

impl DependencyNode {
    pub fn new(id: impl Into<String>, item_type: Option<ItemType>) -> Self {
        Self {
            id: id.into(),
            item_type,
        }
    }
}

/// Visited items in first-visit order, plus the edges between them.
///
/// Edges point from dependent to dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    nodes: Vec<DependencyNode>,
    index: HashMap<String, usize>,
    edges: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node. A node already present keeps its position.
    pub fn add_node(&mut self, node: DependencyNode) {
        if self.index.contains_key(&node.id) {
            return;
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    /// Declare that `from` depends on `to`. Duplicate edges are ignored.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        let deps = self.edges.entry(from.to_string()).or_default();
        if !deps.iter().any(|d| d == to) {
            deps.push(to.to_string());
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&DependencyNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn nodes(&self) -> &[DependencyNode] {
        &self.nodes
    }

    /// Node ids in first-visit order.
    pub fn ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Direct dependencies of a node, in link order.
    pub fn dependencies_of(&self, id: &str) -> Vec<&str> {
        self.edges
            .get(id)
            .map(|deps| deps.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Collect `root_item_id` and everything it transitively depends on.
///
/// The root is always the first node, even when no item record exists for
/// it. Items without an extension are leaves. Links whose target extension
/// has no owner are skipped.
pub fn collect_dependencies(store: &dyn EntityStore, root_item_id: &str) -> Result<DependencyGraph> {
    let mut graph = DependencyGraph::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut stack = vec![root_item_id.to_string()];

    while let Some(item_id) = stack.pop() {
        if !visited.insert(item_id.clone()) {
            continue;
        }

        let item = catalog::lookup_item(store, &item_id)?;
        graph.add_node(DependencyNode::new(
            item_id.clone(),
            item.as_ref().map(|i| i.item_type),
        ));

        let Some(item) = item else {
            tracing::debug!(%item_id, "Dependency item record is missing or undecodable");
            continue;
        };
        let Some(extension_id) = item.extension_ref.as_deref() else {
            continue;
        };
        let Some(doc) = extension::load(store, item.item_type, extension_id)? else {
            tracing::debug!(slug = %item.slug, extension_id, "Extension record is missing");
            continue;
        };

        let mut children = Vec::new();
        for (target_type, target_id) in doc.link_targets() {
            match reference::owner_of(store, target_type, &target_id)? {
                Some(owner) => {
                    graph.add_edge(&item_id, &owner);
                    children.push(owner);
                }
                None => {
                    tracing::debug!(slug = %item.slug, %target_type, %target_id, "Skipping dangling link");
                }
            }
        }

        // Reversed so the first link is popped first.
        stack.extend(children.into_iter().rev().filter(|c| !visited.contains(c)));
    }

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NewItem, create_item};
    use crate::populate::populate_extension;
    use pretty_assertions::assert_eq;
    use registry_meta::schema::ITEM_TABLE;
    use registry_store::{MemoryStore, Record};
    use serde_json::{Value, json};

    fn agent_with_tools(store: &MemoryStore, tools: &[&str]) -> String {
        for tool in tools {
            create_item(store, NewItem::new(*tool, ItemType::Tool)).unwrap();
        }
        let agent = create_item(store, NewItem::new("Agent", ItemType::Agent)).unwrap();
        let rows: Vec<Value> = tools
            .iter()
            .map(|t| json!({"tool_slug": t.to_lowercase()}))
            .collect();
        let payload = match json!({"agent_tools": rows}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        populate_extension(
            store,
            ItemType::Agent,
            agent.extension_ref.as_deref().unwrap(),
            &payload,
        )
        .unwrap();
        agent.id
    }

    #[test]
    fn test_item_without_extension_is_a_leaf() {
        let store = MemoryStore::new();
        let mut record = Record::new();
        record.insert("slug".into(), json!("bare"));
        record.insert("title".into(), json!("Bare"));
        record.insert("item_type".into(), json!("Agent"));
        let id = store.insert(ITEM_TABLE, record).unwrap();

        let graph = collect_dependencies(&store, &id).unwrap();
        assert_eq!(graph.ids(), vec![id.as_str()]);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_missing_root_is_still_included() {
        let store = MemoryStore::new();
        let graph = collect_dependencies(&store, "ghost").unwrap();
        assert_eq!(graph.nodes(), &[DependencyNode::new("ghost", None)]);
    }

    #[test]
    fn test_first_visit_order_follows_rows() {
        let store = MemoryStore::new();
        let agent = agent_with_tools(&store, &["Gmail", "Slack"]);
        let graph = collect_dependencies(&store, &agent).unwrap();

        let types: Vec<_> = graph.nodes().iter().map(|n| n.item_type).collect();
        assert_eq!(
            types,
            vec![Some(ItemType::Agent), Some(ItemType::Tool), Some(ItemType::Tool)]
        );
        assert_eq!(graph.dependencies_of(&agent), graph.ids()[1..].to_vec());
    }

    #[test]
    fn test_duplicate_rows_visit_once() {
        let store = MemoryStore::new();
        create_item(&store, NewItem::new("Gmail", ItemType::Tool)).unwrap();
        let agent = create_item(&store, NewItem::new("Agent", ItemType::Agent)).unwrap();
        let payload = match json!({"agent_tools": [{"tool_slug": "gmail"}, {"tool_slug": "gmail"}]}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        populate_extension(
            &store,
            ItemType::Agent,
            agent.extension_ref.as_deref().unwrap(),
            &payload,
        )
        .unwrap();

        let graph = collect_dependencies(&store, &agent.id).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }
}
