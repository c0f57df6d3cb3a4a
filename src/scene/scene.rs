use glam::Affine3A;
use slotmap::SlotMap;

use super::NodeKey;
use super::background::Background;
use super::environment::Environment;
use super::light::Light;
use super::node::Node;
use super::transform::Transform;
use crate::assets::model::ModelAsset;
use crate::resources::mesh::Mesh;

/// Scene container.
///
/// Owns every node (and through them every mesh and light) plus the scene
/// wide environment and background. Nodes can be added or removed at any
/// time between ticks.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: SlotMap<NodeKey, Node>,
    root_nodes: Vec<NodeKey>,

    pub environment: Environment,
    /// `None` clears with the renderer's clear color.
    pub background: Option<Background>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Adds a node at the root level.
    pub fn add(&mut self, node: Node) -> NodeKey {
        let key = self.nodes.insert(node);
        self.root_nodes.push(key);
        key
    }

    /// Adds a node under `parent`. Falls back to the root level when the
    /// parent does not exist.
    pub fn add_child(&mut self, parent: NodeKey, mut child: Node) -> NodeKey {
        if !self.nodes.contains_key(parent) {
            log::warn!("add_child: parent {parent:?} not found, adding '{}' at root", child.name);
            return self.add(child);
        }

        child.parent = Some(parent);
        let key = self.nodes.insert(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(key);
        }
        key
    }

    /// Re-parents `child` under `parent`.
    pub fn attach(&mut self, child: NodeKey, parent: NodeKey) {
        if child == parent || !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            log::warn!("attach: invalid pair {child:?} -> {parent:?}");
            return;
        }
        if self.is_ancestor(child, parent) {
            log::warn!("attach: {child:?} is an ancestor of {parent:?}");
            return;
        }

        self.detach(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
            c.transform.mark_dirty();
        }
    }

    fn is_ancestor(&self, ancestor: NodeKey, mut node: NodeKey) -> bool {
        while let Some(parent) = self.nodes.get(node).and_then(|n| n.parent) {
            if parent == ancestor {
                return true;
            }
            node = parent;
        }
        false
    }

    fn detach(&mut self, key: NodeKey) {
        match self.nodes.get(key).and_then(|n| n.parent) {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(parent) {
                    p.children.retain(|&c| c != key);
                }
            }
            None => self.root_nodes.retain(|&r| r != key),
        }
    }

    /// Removes a node and its whole subtree. Returns the number of nodes removed.
    pub fn remove(&mut self, key: NodeKey) -> usize {
        if !self.nodes.contains_key(key) {
            return 0;
        }
        self.detach(key);

        let mut removed = 0;
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children);
                removed += 1;
            }
        }
        removed
    }

    /// Moves a loaded model into the scene under a new root node carrying
    /// the model's root transform.
    pub fn instantiate(&mut self, model: ModelAsset) -> NodeKey {
        let ModelAsset {
            name,
            root,
            nodes,
            roots,
        } = model;

        let root_key = self.add(Node::new(name).with_transform(root));
        let mut slots: Vec<Option<_>> = nodes.into_iter().map(Some).collect();

        let mut stack: Vec<(usize, NodeKey)> = roots.into_iter().rev().map(|i| (i, root_key)).collect();
        while let Some((index, parent)) = stack.pop() {
            // Each source node is consumed once; repeated or cyclic references are skipped
            let Some(source) = slots.get_mut(index).and_then(Option::take) else {
                continue;
            };

            let mut node = Node::new(source.name).with_transform(source.transform);
            node.mesh = source.mesh;
            let key = self.add_child(parent, node);
            stack.extend(source.children.into_iter().rev().map(|c| (c, key)));
        }

        root_key
    }

    // ========================================================================
    // Access
    // ========================================================================

    #[must_use]
    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    #[must_use]
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn roots(&self) -> &[NodeKey] {
        &self.root_nodes
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<NodeKey> {
        self.nodes.iter().find(|(_, n)| n.name == name).map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &Node)> {
        self.nodes.iter()
    }

    pub fn meshes(&self) -> impl Iterator<Item = (NodeKey, &Mesh, &Transform)> {
        self.nodes
            .iter()
            .filter_map(|(k, n)| n.mesh.as_ref().map(|m| (k, m, &n.transform)))
    }

    pub fn meshes_mut(&mut self) -> impl Iterator<Item = (NodeKey, &mut Mesh)> {
        self.nodes
            .iter_mut()
            .filter_map(|(k, n)| n.mesh.as_mut().map(|m| (k, m)))
    }

    pub fn lights(&self) -> impl Iterator<Item = (NodeKey, &Light, &Transform)> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.visible)
            .filter_map(|(k, n)| n.light.as_ref().map(|l| (k, l, &n.transform)))
    }

    /// Visits `root` and all its descendants, parents first.
    pub fn traverse_mut(&mut self, root: NodeKey, mut visit: impl FnMut(NodeKey, &mut Node)) {
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(key) {
                visit(key, node);
                stack.extend(node.children.iter().rev().copied());
            }
        }
    }

    /// Walks up the hierarchy: a node is drawn only if it and all its
    /// ancestors are visible.
    #[must_use]
    pub fn is_visible(&self, mut key: NodeKey) -> bool {
        loop {
            let Some(node) = self.nodes.get(key) else {
                return false;
            };
            if !node.visible {
                return false;
            }
            match node.parent {
                Some(parent) => key = parent,
                None => return true,
            }
        }
    }

    // ========================================================================
    // Matrix update
    // ========================================================================

    /// Recomputes every world matrix from the roots down.
    pub fn update_world_matrices(&mut self) {
        let mut stack: Vec<(NodeKey, Affine3A)> = self
            .root_nodes
            .iter()
            .map(|&k| (k, Affine3A::IDENTITY))
            .collect();

        while let Some((key, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(key) else {
                continue;
            };
            node.transform.update_local_matrix();
            let world = parent_world * node.transform.local_matrix;
            node.transform.set_world_matrix(world);
            stack.extend(node.children.iter().map(|&c| (c, world)));
        }
    }
}
