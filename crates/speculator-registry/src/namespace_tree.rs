//! Namespace Tree - hierarchical storage for all bindings.
//!
//! Uses `petgraph::DiGraph` with:
//! - Nodes: `NamespaceData` (bindings declared at that level)
//! - Edges: `Contains(name)` for hierarchy, `Imports(alias)` for namespaces
//!   bound under a local name without being owned

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;
use speculator_core::{Binding, BindingValue, QualifiedName};

use crate::RegistrationError;

/// Edge types in the namespace graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceEdge {
    /// Parent namespace owns child namespace.
    /// The String is the child's simple name.
    Contains(String),
    /// Namespace binds another, unrelated namespace under an alias.
    Imports(String),
}

/// Data stored in each namespace node.
#[derive(Debug, Default)]
pub struct NamespaceData {
    /// Non-namespace bindings by simple name.
    pub bindings: FxHashMap<String, Binding>,
}

/// The namespace graph.
pub struct NamespaceTree {
    graph: DiGraph<NamespaceData, NamespaceEdge>,
    root: NodeIndex,
}

impl Default for NamespaceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceTree {
    /// Create a new namespace tree with an empty root.
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(NamespaceData::default());
        Self { graph, root }
    }

    /// Get the root (global) namespace node index.
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Get a namespace node's data.
    pub fn get_namespace(&self, node: NodeIndex) -> Option<&NamespaceData> {
        self.graph.node_weight(node)
    }

    /// Find a child namespace by name.
    pub fn find_child(&self, parent: NodeIndex, name: &str) -> Option<NodeIndex> {
        self.graph.edges(parent).find_map(|edge| match edge.weight() {
            NamespaceEdge::Contains(child_name) if child_name == name => Some(edge.target()),
            _ => None,
        })
    }

    /// Get or create a child namespace.
    pub fn get_or_create_child(&mut self, parent: NodeIndex, name: &str) -> NodeIndex {
        if let Some(child) = self.find_child(parent, name) {
            return child;
        }

        let child = self.graph.add_node(NamespaceData::default());
        self.graph
            .add_edge(parent, child, NamespaceEdge::Contains(name.to_string()));
        child
    }

    /// Get or create a namespace path from root.
    pub fn get_or_create_path<S: AsRef<str>>(&mut self, path: &[S]) -> NodeIndex {
        let mut current = self.root;
        for segment in path {
            current = self.get_or_create_child(current, segment.as_ref());
        }
        current
    }

    /// Get an existing namespace by path, or None if it doesn't exist.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<NodeIndex> {
        let mut current = self.root;
        for segment in path {
            current = self.find_child(current, segment.as_ref())?;
        }
        Some(current)
    }

    /// Find the owning namespace of a node.
    pub fn find_parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .find(|edge| matches!(edge.weight(), NamespaceEdge::Contains(_)))
            .map(|edge| edge.source())
    }

    /// Get the simple name of a namespace node.
    pub fn get_namespace_name(&self, node: NodeIndex) -> Option<&str> {
        if node == self.root {
            return None;
        }
        self.graph
            .edges_directed(node, Direction::Incoming)
            .find_map(|edge| match edge.weight() {
                NamespaceEdge::Contains(name) => Some(name.as_str()),
                NamespaceEdge::Imports(_) => None,
            })
    }

    /// Get the full namespace path for a node.
    pub fn get_namespace_path(&self, node: NodeIndex) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = node;

        while current != self.root {
            if let Some(name) = self.get_namespace_name(current) {
                path.push(name.to_string());
            }
            match self.find_parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }

        path.reverse();
        path
    }

    /// Qualified name of a namespace node. The root is the empty global name.
    pub fn namespace_name(&self, node: NodeIndex) -> QualifiedName {
        let mut path = self.get_namespace_path(node);
        match path.pop() {
            Some(name) => QualifiedName::new(name, path),
            None => QualifiedName::global(""),
        }
    }

    /// Namespaces owned directly by the root, sorted by name.
    pub fn top_level(&self) -> Vec<QualifiedName> {
        let mut names: Vec<QualifiedName> = self
            .graph
            .edges(self.root)
            .filter_map(|edge| match edge.weight() {
                NamespaceEdge::Contains(name) => Some(QualifiedName::global(name.clone())),
                NamespaceEdge::Imports(_) => None,
            })
            .collect();
        names.sort();
        names
    }

    /// Bind `target` inside `from` under `alias` without taking ownership of it.
    pub fn add_import(
        &mut self,
        from: NodeIndex,
        alias: &str,
        target: NodeIndex,
    ) -> Result<(), RegistrationError> {
        if self.is_bound(from, alias) {
            return Err(RegistrationError::DuplicateBinding(
                self.namespace_name(from).child(alias).to_string(),
            ));
        }
        self.graph
            .add_edge(from, target, NamespaceEdge::Imports(alias.to_string()));
        Ok(())
    }

    /// Register a non-namespace binding.
    pub fn add_binding(&mut self, node: NodeIndex, binding: Binding) -> Result<(), RegistrationError> {
        if self.is_bound(node, &binding.name) {
            return Err(RegistrationError::DuplicateBinding(
                self.namespace_name(node).child(binding.name.as_str()).to_string(),
            ));
        }
        let data = self
            .graph
            .node_weight_mut(node)
            .ok_or(RegistrationError::InvalidNamespace)?;
        data.bindings.insert(binding.name.clone(), binding);
        Ok(())
    }

    /// Get a mutable binding declared in `node`.
    pub fn binding_mut(&mut self, node: NodeIndex, name: &str) -> Option<&mut Binding> {
        self.graph.node_weight_mut(node)?.bindings.get_mut(name)
    }

    fn is_bound(&self, node: NodeIndex, name: &str) -> bool {
        let declared = self
            .graph
            .node_weight(node)
            .is_some_and(|data| data.bindings.contains_key(name));
        declared
            || self.graph.edges(node).any(|edge| match edge.weight() {
                NamespaceEdge::Contains(n) | NamespaceEdge::Imports(n) => n == name,
            })
    }

    /// Every binding visible in `node`, sorted by name.
    ///
    /// Owned and imported namespaces are reported as namespace bindings;
    /// imports resolve to the imported namespace's own qualified name.
    pub fn bindings(&self, node: NodeIndex) -> Vec<Binding> {
        let Some(data) = self.graph.node_weight(node) else {
            return Vec::new();
        };

        let mut bindings: Vec<Binding> = data.bindings.values().cloned().collect();
        for edge in self.graph.edges(node) {
            let (NamespaceEdge::Contains(name) | NamespaceEdge::Imports(name)) = edge.weight();
            let mut binding = Binding::new(
                name.clone(),
                BindingValue::Namespace(self.namespace_name(edge.target())),
            );
            binding.public = true;
            bindings.push(binding);
        }
        bindings.sort_by(|a, b| a.name.cmp(&b.name));
        bindings
    }
}
