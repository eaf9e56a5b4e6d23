//! # Scenegraph
//!
//! A minimal retained-mode scene graph for real-time 3D rendering: a tree of
//! nodes that, when traversed, accumulates transform state and issues drawing
//! operations through a pluggable graphics backend.
//!
//! ## Features
//!
//! - **Transform stack**: nested scopes that never leak into sibling subtrees
//! - **Fixed node lifecycle**: enabled, prepare, update, execute, animate,
//!   visible, children, cleanup
//! - **Resource nodes**: shader, texture and mesh nodes over a `Rasterizer`
//! - **Headless backend**: `RecordingRasterizer` for tests and tooling
//!
//! ## Quick Start
//!
//! ```rust
//! use scenegraph::prelude::*;
//!
//! let mut state = State::new();
//! state.set_perspective_projection_ex(16.0 / 9.0, 1.0, 0.1, 100.0);
//!
//! let mut tree = NodeTree::new();
//! let mut camera = Transformation::identity();
//! camera.translate(0.0, 0.0, -5.0);
//! let root = tree.insert(camera, None)?;
//! let mut spin = Transformation::identity();
//! spin.rotate(0.0, 1.0, 0.0, 0.5);
//! tree.insert(spin, Some(root))?;
//!
//! let stats = state.execute(&mut tree, root)?;
//! assert_eq!(stats.visited, 2);
//! assert_eq!(state.matrix_depth(), 1);
//! # Ok::<(), SceneError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod scene;
pub mod render;

/// Common imports for scene graph users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, ProjectionConfig, ProjectionKind, SceneConfig},
        foundation::math::{Mat4, Quat, Vec3, Vec4},
        render::{
            Mesh, PixelFormat, PrimitiveMode, Rasterizer, RecordingRasterizer, RenderError,
            Shader, Texture2D, TextureImage,
        },
        scene::{
            Group, Node, NodeId, NodeTree, SceneError, SceneResult, State, Transformation,
            TraversalStats,
        },
    };
}
