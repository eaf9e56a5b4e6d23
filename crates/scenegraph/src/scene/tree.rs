//! Node arena
//!
//! Nodes are owned by the tree; parent and child links are [`NodeId`]
//! handles. A node is attached exactly once, when it is inserted, and is
//! never moved to another parent, so the structure cannot form a cycle.

use slotmap::SlotMap;

use crate::render::Rasterizer;
use super::{Node, SceneError, SceneResult};

slotmap::new_key_type! {
    /// Handle to a node in a [`NodeTree`]
    ///
    /// Handles of destroyed nodes are never reused for new nodes.
    pub struct NodeId;
}

struct NodeSlot {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    node: Box<dyn Node>,
}

/// Owning arena of scene nodes
///
/// Dropping the tree drops every node without calling
/// [`Node::release`]; use [`NodeTree::clear`] when nodes own GPU resources.
#[derive(Default)]
pub struct NodeTree {
    slots: SlotMap<NodeId, NodeSlot>,
}

impl NodeTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
        }
    }

    /// Insert a node, appending it to `parent`'s children when given.
    ///
    /// Insertion order is traversal order.
    pub fn insert<N: Node>(&mut self, node: N, parent: Option<NodeId>) -> SceneResult<NodeId> {
        self.insert_boxed(Box::new(node), parent)
    }

    /// Insert an already boxed node
    pub fn insert_boxed(&mut self, node: Box<dyn Node>, parent: Option<NodeId>) -> SceneResult<NodeId> {
        if let Some(parent) = parent {
            if !self.slots.contains_key(parent) {
                return Err(SceneError::NodeNotFound(parent));
            }
        }

        let label = node.label();
        let id = self.slots.insert(NodeSlot {
            parent,
            children: Vec::new(),
            node,
        });
        if let Some(slot) = parent.and_then(|parent| self.slots.get_mut(parent)) {
            slot.children.push(id);
        }

        log::debug!("Inserted {} as {:?} under {:?}", label, id, parent);
        Ok(id)
    }

    /// Whether `id` refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.slots.contains_key(id)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the tree holds no nodes
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Parent of a node; `None` for roots and unknown handles
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots.get(id)?.parent
    }

    /// Children of a node in traversal order; empty for unknown handles
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slots.get(id).map_or(&[], |slot| slot.children.as_slice())
    }

    /// Nodes without a parent
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.parent.is_none())
            .map(|(id, _)| id)
    }

    /// Borrow a node as a trait object
    pub fn node(&self, id: NodeId) -> Option<&dyn Node> {
        self.slots.get(id).map(|slot| &*slot.node as &dyn Node)
    }

    /// Mutably borrow a node as a trait object
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut dyn Node> {
        self.slots.get_mut(id).map(|slot| &mut *slot.node as &mut dyn Node)
    }

    /// Borrow a node as its concrete type
    pub fn get<T: Node>(&self, id: NodeId) -> Option<&T> {
        self.node(id)?.as_any().downcast_ref::<T>()
    }

    /// Mutably borrow a node as its concrete type
    pub fn get_mut<T: Node>(&mut self, id: NodeId) -> Option<&mut T> {
        self.node_mut(id)?.as_any_mut().downcast_mut::<T>()
    }

    /// Child of `id` at `index`, used by traversal to walk children without
    /// holding a borrow of the child list across the recursion
    pub(crate) fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.slots.get(id)?.children.get(index).copied()
    }

    /// Destroy a node and its subtree.
    ///
    /// The node is detached from its parent first. Then each node releases its
    /// resources before its children are destroyed, children in insertion
    /// order.
    pub fn destroy(&mut self, id: NodeId, rasterizer: &mut dyn Rasterizer) -> SceneResult<()> {
        let parent = self.slots.get(id).ok_or(SceneError::NodeNotFound(id))?.parent;
        if let Some(slot) = parent.and_then(|parent| self.slots.get_mut(parent)) {
            slot.children.retain(|child| *child != id);
        }

        let destroyed = self.destroy_subtree(id, rasterizer);
        log::debug!("Destroyed {:?} and {} descendant(s)", id, destroyed.saturating_sub(1));
        Ok(())
    }

    /// Destroy every node
    pub fn clear(&mut self, rasterizer: &mut dyn Rasterizer) {
        let roots: Vec<NodeId> = self.roots().collect();
        for root in roots {
            self.destroy_subtree(root, rasterizer);
        }
        debug_assert!(self.slots.is_empty());
    }

    fn destroy_subtree(&mut self, id: NodeId, rasterizer: &mut dyn Rasterizer) -> usize {
        let Some(mut slot) = self.slots.remove(id) else {
            return 0;
        };
        slot.node.release(rasterizer);
        1 + slot
            .children
            .into_iter()
            .map(|child| self.destroy_subtree(child, rasterizer))
            .sum::<usize>()
    }
}

impl std::fmt::Debug for NodeTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|(id, slot)| (id, slot.node.label())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::render::RecordingRasterizer;
    use crate::scene::{Group, Transformation};

    /// Appends its name to a shared log when released
    struct Tracked {
        name: &'static str,
        released: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Node for Tracked {
        fn release(&mut self, _rasterizer: &mut dyn Rasterizer) {
            self.released.borrow_mut().push(self.name);
        }
    }

    #[test]
    fn test_insert_preserves_child_order() {
        let mut tree = NodeTree::new();
        let root = tree.insert(Group, None).unwrap();
        let a = tree.insert(Group, Some(root)).unwrap();
        let b = tree.insert(Transformation::identity(), Some(root)).unwrap();
        let c = tree.insert(Group, Some(root)).unwrap();

        assert_eq!(tree.children(root), &[a, b, c]);
        assert_eq!(tree.parent(b), Some(root));
        assert_eq!(tree.parent(root), None);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.roots().collect::<Vec<_>>(), vec![root]);
    }

    #[test]
    fn test_insert_under_missing_parent_fails() {
        let mut tree = NodeTree::new();
        let mut rasterizer = RecordingRasterizer::new();
        let root = tree.insert(Group, None).unwrap();
        tree.destroy(root, &mut rasterizer).unwrap();

        assert_eq!(tree.insert(Group, Some(root)), Err(SceneError::NodeNotFound(root)));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_typed_access() {
        let mut tree = NodeTree::new();
        let id = tree.insert(Transformation::identity(), None).unwrap();

        assert!(tree.get::<Group>(id).is_none());
        tree.get_mut::<Transformation>(id).unwrap().translate(1.0, 2.0, 3.0);

        let matrix = tree.get::<Transformation>(id).unwrap().matrix();
        assert_eq!((matrix[12], matrix[13], matrix[14]), (1.0, 2.0, 3.0));
    }

    #[test]
    fn test_destroy_detaches_and_removes_subtree() {
        let mut tree = NodeTree::new();
        let mut rasterizer = RecordingRasterizer::new();
        let root = tree.insert(Group, None).unwrap();
        let keep = tree.insert(Group, Some(root)).unwrap();
        let doomed = tree.insert(Group, Some(root)).unwrap();
        let grandchild = tree.insert(Group, Some(doomed)).unwrap();
        tree.insert(Group, Some(grandchild)).unwrap();

        tree.destroy(doomed, &mut rasterizer).unwrap();

        assert_eq!(tree.children(root), &[keep]);
        assert!(!tree.contains(doomed));
        assert!(!tree.contains(grandchild));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.destroy(doomed, &mut rasterizer), Err(SceneError::NodeNotFound(doomed)));
    }

    #[test]
    fn test_destroy_releases_parent_before_children_in_order() {
        let released = Rc::new(RefCell::new(Vec::new()));
        let tracked = |name: &'static str| Tracked { name, released: Rc::clone(&released) };
        let mut tree = NodeTree::new();
        let mut rasterizer = RecordingRasterizer::new();

        let root = tree.insert(tracked("root"), None).unwrap();
        let a = tree.insert(tracked("a"), Some(root)).unwrap();
        tree.insert(tracked("a1"), Some(a)).unwrap();
        tree.insert(tracked("a2"), Some(a)).unwrap();
        tree.insert(tracked("b"), Some(root)).unwrap();

        tree.destroy(root, &mut rasterizer).unwrap();

        assert_eq!(*released.borrow(), vec!["root", "a", "a1", "a2", "b"]);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_clear_empties_every_root() {
        let mut tree = NodeTree::new();
        let mut rasterizer = RecordingRasterizer::new();
        let first = tree.insert(Group, None).unwrap();
        tree.insert(Group, Some(first)).unwrap();
        tree.insert(Group, None).unwrap();

        tree.clear(&mut rasterizer);
        assert!(tree.is_empty());
    }
}
