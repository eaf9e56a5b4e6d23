//! Traversal state: transform stack, projection and the tree walk
//!
//! ## Conventions
//!
//! Matrices are column-major with the translation in the last column, the
//! same layout [`crate::foundation::math::multiply_matrices`] assumes.
//! Projections are right-handed and map depth to the `[-1, 1]` clip range:
//! the camera looks down -z, `near` and `far` are distances along it.

use crate::config::{ProjectionConfig, ProjectionKind, SceneConfig};
use crate::foundation::math::{degrees_to_radians, multiply_matrices, Mat4};
use crate::render::{Rasterizer, RecordingRasterizer};
use super::{NodeId, NodeTree, SceneError, SceneResult};

/// Counters gathered during one [`State::execute`] pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Nodes whose `enabled` hook returned true
    pub visited: usize,
    /// Nodes whose `enabled` hook returned false (their subtrees are not counted)
    pub skipped: usize,
    /// Deepest level reached, the root being level 0
    pub max_depth: usize,
}

/// Per-context traversal state
///
/// Owns a stack of model transforms, whose top is the current transform, a
/// projection matrix, and the [`Rasterizer`] resource nodes draw through.
/// The stack always holds at least the base identity entry.
pub struct State {
    matrices: Vec<Mat4>,
    projection: Mat4,
    rasterizer: Box<dyn Rasterizer>,
}

impl State {
    /// State drawing into a [`RecordingRasterizer`]
    pub fn new() -> Self {
        Self::with_rasterizer(Box::new(RecordingRasterizer::new()))
    }

    /// State drawing through the given backend
    pub fn with_rasterizer(rasterizer: Box<dyn Rasterizer>) -> Self {
        let mut state = Self {
            matrices: Vec::new(),
            projection: Mat4::identity(),
            rasterizer,
        };
        state.reset();
        state
    }

    /// State with the configured stack capacity and projection
    pub fn from_config(config: &SceneConfig, rasterizer: Box<dyn Rasterizer>) -> Self {
        let mut state = Self::with_rasterizer(rasterizer);
        state.matrices.reserve(config.matrix_stack_capacity.saturating_sub(1));
        state.apply_projection(&config.projection);
        state
    }

    /// Restore a single identity entry and an identity projection
    pub fn reset(&mut self) {
        self.matrices.clear();
        self.matrices.push(Mat4::identity());
        self.projection = Mat4::identity();
        log::debug!("Traversal state reset");
    }

    /// Traverse the subtree rooted at `root` once.
    ///
    /// Fails only when `root` is not in `tree`; nodes themselves cannot fail
    /// a pass.
    pub fn execute(&mut self, tree: &mut NodeTree, root: NodeId) -> SceneResult<TraversalStats> {
        let mut stats = TraversalStats::default();
        self.visit(tree, root, 0, &mut stats)?;
        log::trace!(
            "Traversal from {:?}: {} visited, {} skipped, depth {}",
            root, stats.visited, stats.skipped, stats.max_depth
        );
        Ok(stats)
    }

    fn visit(&mut self, tree: &mut NodeTree, id: NodeId, depth: usize, stats: &mut TraversalStats) -> SceneResult<()> {
        let node = tree.node_mut(id).ok_or(SceneError::NodeNotFound(id))?;
        if !node.enabled(self) {
            stats.skipped += 1;
            return Ok(());
        }
        stats.visited += 1;
        stats.max_depth = stats.max_depth.max(depth);

        node.prepare(self);
        node.update(self);
        node.execute(self);
        node.animate(self);

        if node.visible(self) {
            let mut index = 0;
            while let Some(child) = tree.child_at(id, index) {
                self.visit(tree, child, depth + 1, stats)?;
                index += 1;
            }
        }

        if let Some(node) = tree.node_mut(id) {
            node.cleanup(self);
        }
        Ok(())
    }

    /// Push a copy of the current matrix, opening a nested scope
    pub fn push_matrix(&mut self) {
        let top = *self.current_matrix();
        self.matrices.push(top);
    }

    /// Push an identity matrix, e.g. for screen-space overlays
    pub fn push_identity_matrix(&mut self) {
        self.matrices.push(Mat4::identity());
    }

    /// Replace the current matrix with `current` composed with `matrix`
    /// (`matrix` applies first)
    pub fn multiply_matrix(&mut self, matrix: &Mat4) {
        let top = self.top_mut();
        *top = multiply_matrices(top, matrix);
    }

    /// Discard the current matrix.
    ///
    /// # Panics
    ///
    /// Panics when only the base entry remains: the pushes and pops of the
    /// caller are unbalanced.
    pub fn pop_matrix(&mut self) {
        assert!(
            self.matrices.len() > 1,
            "pop_matrix called on the base entry of the matrix stack"
        );
        self.matrices.pop();
    }

    /// Discard the current matrix unless it is the base entry
    pub fn try_pop_matrix(&mut self) -> SceneResult<()> {
        if self.matrices.len() > 1 {
            self.matrices.pop();
            Ok(())
        } else {
            Err(SceneError::MatrixStackUnderflow)
        }
    }

    /// Top of the matrix stack
    pub fn current_matrix(&self) -> &Mat4 {
        // The base entry is never popped
        &self.matrices[self.matrices.len() - 1]
    }

    /// Number of entries on the matrix stack, at least 1
    pub fn matrix_depth(&self) -> usize {
        self.matrices.len()
    }

    fn top_mut(&mut self) -> &mut Mat4 {
        let last = self.matrices.len() - 1;
        &mut self.matrices[last]
    }

    /// Orthographic projection onto the given view volume
    pub fn set_orthographic_projection(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        #[rustfmt::skip]
        let m = Mat4::new(
            2.0 / (right - left), 0.0, 0.0, -((right + left) / (right - left)),
            0.0, 2.0 / (top - bottom), 0.0, -((top + bottom) / (top - bottom)),
            0.0, 0.0, -2.0 / (far - near), -((far + near) / (far - near)),
            0.0, 0.0, 0.0, 1.0,
        );
        self.set_projection_matrix(&m);
    }

    /// Orthographic projection sized from an aspect ratio and a vertical
    /// field of view in radians. The half height is `-near * tan(fov_y / 2)`,
    /// so the default volume `near = -1` spans `tan(fov_y / 2)` upwards.
    pub fn set_orthographic_projection_ex(&mut self, aspect: f32, fov_y: f32, near: f32, far: f32) {
        let top = -near * (fov_y / 2.0).tan();
        let right = aspect * top;
        self.set_orthographic_projection(-right, right, -top, top, near, far);
    }

    /// Perspective projection for the given frustum at the near plane
    pub fn set_perspective_projection(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        #[rustfmt::skip]
        let m = Mat4::new(
            (2.0 * near) / (right - left), 0.0, (right + left) / (right - left), 0.0,
            0.0, (2.0 * near) / (top - bottom), (top + bottom) / (top - bottom), 0.0,
            0.0, 0.0, -((far + near) / (far - near)), -((2.0 * far * near) / (far - near)),
            0.0, 0.0, -1.0, 0.0,
        );
        self.set_projection_matrix(&m);
    }

    /// Symmetric perspective projection from an aspect ratio and a vertical
    /// field of view in radians
    pub fn set_perspective_projection_ex(&mut self, aspect: f32, fov_y: f32, near: f32, far: f32) {
        let top = near * (fov_y / 2.0).tan();
        let right = aspect * top;
        self.set_perspective_projection(-right, right, -top, top, near, far);
    }

    /// Store a projection matrix verbatim
    pub fn set_projection_matrix(&mut self, matrix: &Mat4) {
        self.projection = *matrix;
    }

    /// Most recently set projection
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection
    }

    /// Derive the projection from settings, e.g. after a viewport resize
    pub fn apply_projection(&mut self, config: &ProjectionConfig) {
        let fov_y = degrees_to_radians(config.fov_y_degrees);
        match config.kind {
            ProjectionKind::Orthographic => {
                self.set_orthographic_projection_ex(config.aspect, fov_y, config.near, config.far);
            }
            ProjectionKind::Perspective => {
                self.set_perspective_projection_ex(config.aspect, fov_y, config.near, config.far);
            }
        }
        log::debug!("Applied {:?} projection (aspect {})", config.kind, config.aspect);
    }

    /// Projection composed with the current transform
    pub fn model_view_projection(&self) -> Mat4 {
        multiply_matrices(&self.projection, self.current_matrix())
    }

    /// Graphics backend
    pub fn rasterizer(&self) -> &dyn Rasterizer {
        self.rasterizer.as_ref()
    }

    /// Graphics backend, mutably
    pub fn rasterizer_mut(&mut self) -> &mut dyn Rasterizer {
        self.rasterizer.as_mut()
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("matrix_depth", &self.matrices.len())
            .field("current", self.current_matrix())
            .field("projection", &self.projection)
            .finish_non_exhaustive()
    }
}
