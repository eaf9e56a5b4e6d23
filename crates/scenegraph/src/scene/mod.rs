//! Scene graph core
//!
//! A tree of [`Node`]s that, when traversed by a [`State`], accumulates
//! transform state and issues drawing operations.
//!
//! ## Architecture
//!
//! ```text
//! driver (once per frame)
//!      ↓
//! State::execute(tree, root)
//!      ↓
//! enabled → prepare → update → execute → animate → visible? → children → cleanup
//! ```
//!
//! Nodes live in a [`NodeTree`] arena and refer to each other through
//! [`NodeId`] handles. The [`State`] owns the matrix stack and projection and
//! threads them down the recursion; every node that pushes in `prepare` pops
//! in `cleanup`, so a subtree's transform never leaks to its siblings.

mod node;
mod tree;
mod state;
mod transformation;

#[cfg(test)]
mod tests;

pub use node::{AsAny, Group, Node};
pub use tree::{NodeId, NodeTree};
pub use state::{State, TraversalStats};
pub use transformation::Transformation;

use thiserror::Error;

/// Scene graph error types
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    /// A handle refers to a node that was destroyed or never existed
    #[error("Node {0:?} does not exist in this tree")]
    NodeNotFound(NodeId),

    /// Attempted to pop the base entry of the matrix stack
    #[error("Matrix stack underflow: the base identity entry cannot be popped")]
    MatrixStackUnderflow,
}

/// Result type for scene graph operations
pub type SceneResult<T> = Result<T, SceneError>;
