//! Node lifecycle contract

use std::any::Any;

use crate::render::Rasterizer;
use super::State;

/// Type-erased access used to downcast nodes stored in a [`super::NodeTree`]
pub trait AsAny: Any {
    /// View as `&dyn Any`
    fn as_any(&self) -> &dyn Any;

    /// View as `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Scene graph node
///
/// Every hook has a default, so a node only overrides what it needs. For
/// each traversal pass the [`State`] calls, in this order:
///
/// 1. [`enabled`](Node::enabled): `false` skips the node and its whole
///    subtree; nothing else below is called.
/// 2. [`prepare`](Node::prepare): open a scope, snapshot state to restore.
/// 3. [`update`](Node::update)
/// 4. [`execute`](Node::execute): the node's primary effect.
/// 5. [`animate`](Node::animate)
/// 6. [`visible`](Node::visible): `false` skips the children only.
/// 7. children, in insertion order
/// 8. [`cleanup`](Node::cleanup): always runs once `enabled` returned true.
///
/// Hooks receive the traversal state, never the tree: a node cannot
/// restructure the graph mid-traversal.
pub trait Node: AsAny {
    /// Whether this node and its subtree take part in this pass
    fn enabled(&self, _state: &State) -> bool {
        true
    }

    /// Set up state that [`cleanup`](Node::cleanup) restores
    fn prepare(&mut self, _state: &mut State) {}

    /// Per-pass update before the primary effect
    fn update(&mut self, _state: &mut State) {}

    /// Primary effect: multiply a matrix, bind a resource, issue a draw
    fn execute(&mut self, _state: &mut State) {}

    /// Per-pass update after the primary effect
    fn animate(&mut self, _state: &mut State) {}

    /// Whether the children are visited this pass
    fn visible(&self, _state: &State) -> bool {
        true
    }

    /// Restore whatever [`prepare`](Node::prepare) set up
    fn cleanup(&mut self, _state: &mut State) {}

    /// Free owned GPU resources; called once when the node is destroyed
    fn release(&mut self, _rasterizer: &mut dyn Rasterizer) {}

    /// Short name for log output
    fn label(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Node without an effect of its own, used to group children
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Group;

impl Node for Group {}
