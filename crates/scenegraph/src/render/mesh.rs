//! Indexed mesh node
//!
//! Vertex data lives in separate buffers per attribute (positions, texture
//! coordinates) plus one index buffer.

use std::mem::size_of;

use crate::scene::{Node, State};
use super::rasterizer::{AttributeLayout, BufferId, BufferTarget, PrimitiveMode, Rasterizer};
use super::shader::{POSITION_ATTRIBUTE, TEXUV_ATTRIBUTE};
use super::{RenderError, RenderResult};

const POSITION_COMPONENTS: u32 = 3;
const TEXUV_COMPONENTS: u32 = 2;
const FLOAT_SIZE: u32 = size_of::<f32>() as u32;

/// Scene node that draws indexed geometry with the current program
#[derive(Debug)]
pub struct Mesh {
    mode: PrimitiveMode,
    positions: BufferId,
    texuvs: BufferId,
    triangles: BufferId,
    element_count: u32,
    owner: bool,
}

impl Mesh {
    /// Upload vertex and index data.
    ///
    /// `positions` holds 3 floats per vertex, `texuvs` 2 floats per vertex.
    pub fn new(
        rasterizer: &mut dyn Rasterizer,
        mode: PrimitiveMode,
        positions: &[f32],
        texuvs: &[f32],
        triangles: &[u32],
    ) -> RenderResult<Self> {
        if positions.len() % POSITION_COMPONENTS as usize != 0 {
            return Err(RenderError::ResourceCreationFailed(format!(
                "{} position floats is not a whole number of vertices",
                positions.len()
            )));
        }
        if texuvs.len() % TEXUV_COMPONENTS as usize != 0 {
            return Err(RenderError::ResourceCreationFailed(format!(
                "{} texture coordinate floats is not a whole number of vertices",
                texuvs.len()
            )));
        }
        let element_count = u32::try_from(triangles.len()).map_err(|_| {
            RenderError::ResourceCreationFailed(format!("{} indices exceed a single draw", triangles.len()))
        })?;

        let uploads: [(BufferTarget, &[u8]); 3] = [
            (BufferTarget::Array, bytemuck::cast_slice(positions)),
            (BufferTarget::Array, bytemuck::cast_slice(texuvs)),
            (BufferTarget::ElementArray, bytemuck::cast_slice(triangles)),
        ];
        let mut buffers = [BufferId::NONE; 3];
        for (index, (target, bytes)) in uploads.into_iter().enumerate() {
            match rasterizer.create_buffer(target, bytes) {
                Ok(buffer) => buffers[index] = buffer,
                Err(e) => {
                    // Roll back the buffers already uploaded
                    for buffer in &buffers[..index] {
                        rasterizer.delete_buffer(*buffer);
                    }
                    log::warn!("Mesh creation failed after {} of 3 buffers: {}", index, e);
                    return Err(e);
                }
            }
        }
        let [positions, texuvs, triangles] = buffers;

        // Creation leaves the targets bound on real drivers
        rasterizer.bind_buffer(BufferTarget::Array, BufferId::NONE);
        rasterizer.bind_buffer(BufferTarget::ElementArray, BufferId::NONE);

        log::debug!("Created mesh with {} indices ({:?})", element_count, mode);
        Ok(Self {
            mode,
            positions,
            texuvs,
            triangles,
            element_count,
            owner: true,
        })
    }

    /// Another node drawing the same buffers; it never deletes them
    pub fn shared(other: &Self) -> Self {
        Self {
            mode: other.mode,
            positions: other.positions,
            texuvs: other.texuvs,
            triangles: other.triangles,
            element_count: other.element_count,
            owner: false,
        }
    }

    /// Primitive assembly mode
    pub fn mode(&self) -> PrimitiveMode {
        self.mode
    }

    /// Number of indices drawn per execute
    pub fn element_count(&self) -> u32 {
        self.element_count
    }
}

impl Node for Mesh {
    fn execute(&mut self, state: &mut State) {
        let rasterizer = state.rasterizer_mut();
        let program = rasterizer.current_program();

        let position = rasterizer.attribute_location(program, POSITION_ATTRIBUTE);
        if let Some(location) = position {
            rasterizer.bind_buffer(BufferTarget::Array, self.positions);
            rasterizer.enable_attribute(
                location,
                AttributeLayout { components: POSITION_COMPONENTS, stride: POSITION_COMPONENTS * FLOAT_SIZE },
            );
        }

        let texuv = rasterizer.attribute_location(program, TEXUV_ATTRIBUTE);
        if let Some(location) = texuv {
            rasterizer.bind_buffer(BufferTarget::Array, self.texuvs);
            rasterizer.enable_attribute(
                location,
                AttributeLayout { components: TEXUV_COMPONENTS, stride: TEXUV_COMPONENTS * FLOAT_SIZE },
            );
        }

        rasterizer.bind_buffer(BufferTarget::ElementArray, self.triangles);
        rasterizer.draw_elements(self.mode, self.element_count);

        for location in [position, texuv].into_iter().flatten() {
            rasterizer.disable_attribute(location);
        }
        rasterizer.bind_buffer(BufferTarget::ElementArray, BufferId::NONE);
        rasterizer.bind_buffer(BufferTarget::Array, BufferId::NONE);
    }

    fn release(&mut self, rasterizer: &mut dyn Rasterizer) {
        if !self.owner {
            return;
        }
        for buffer in [self.positions, self.texuvs, self.triangles] {
            if !buffer.is_none() {
                rasterizer.delete_buffer(buffer);
            }
        }
        self.positions = BufferId::NONE;
        self.texuvs = BufferId::NONE;
        self.triangles = BufferId::NONE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RasterCommand, RecordingRasterizer, Shader};
    use crate::scene::NodeTree;

    const QUAD_POSITIONS: [f32; 12] = [
        -1.0, -1.0, 0.0,
        1.0, -1.0, 0.0,
        1.0, 1.0, 0.0,
        -1.0, 1.0, 0.0,
    ];
    const QUAD_TEXUVS: [f32; 8] = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
    const QUAD_TRIANGLES: [u32; 6] = [0, 1, 2, 2, 3, 0];

    #[test]
    fn test_upload_sizes() {
        let mut rasterizer = RecordingRasterizer::new();
        let mesh = Mesh::new(
            &mut rasterizer,
            PrimitiveMode::Triangles,
            &QUAD_POSITIONS,
            &QUAD_TEXUVS,
            &QUAD_TRIANGLES,
        )
        .unwrap();

        assert_eq!(mesh.element_count(), 6);
        assert_eq!(rasterizer.live_buffers(), 3);
        let sizes: Vec<usize> = rasterizer
            .commands()
            .iter()
            .filter_map(|command| match command {
                RasterCommand::CreateBuffer { len, .. } => Some(*len),
                _ => None,
            })
            .collect();
        assert_eq!(sizes, vec![48, 32, 24]);
    }

    #[test]
    fn test_ragged_positions_are_rejected() {
        let mut rasterizer = RecordingRasterizer::new();
        let result = Mesh::new(&mut rasterizer, PrimitiveMode::Points, &[0.0; 4], &[], &[0]);
        assert!(matches!(result, Err(RenderError::ResourceCreationFailed(_))));
        assert_eq!(rasterizer.live_buffers(), 0);
    }

    #[test]
    fn test_failed_upload_deletes_earlier_buffers() {
        let mut rasterizer = RecordingRasterizer::new();
        // Room for positions and texture coordinates, not for the indices
        rasterizer.set_buffer_limit(Some(2));

        let result = Mesh::new(
            &mut rasterizer,
            PrimitiveMode::Triangles,
            &QUAD_POSITIONS,
            &QUAD_TEXUVS,
            &QUAD_TRIANGLES,
        );

        assert!(matches!(result, Err(RenderError::ResourceCreationFailed(_))));
        assert_eq!(rasterizer.live_buffers(), 0);
        let deleted = rasterizer
            .commands()
            .iter()
            .filter(|command| matches!(command, RasterCommand::DeleteBuffer(_)))
            .count();
        assert_eq!(deleted, 2);
    }

    #[test]
    fn test_draws_under_shader_and_unbinds() {
        let mut state = State::new();
        let shader = Shader::with_defaults(state.rasterizer_mut()).unwrap();
        let program = shader.program();
        let mesh = Mesh::new(
            state.rasterizer_mut(),
            PrimitiveMode::Triangles,
            &QUAD_POSITIONS,
            &QUAD_TEXUVS,
            &QUAD_TRIANGLES,
        )
        .unwrap();

        let mut tree = NodeTree::new();
        let root = tree.insert(shader, None).unwrap();
        tree.insert(mesh, Some(root)).unwrap();
        state.execute(&mut tree, root).unwrap();

        let recording = state
            .rasterizer()
            .as_any()
            .downcast_ref::<RecordingRasterizer>()
            .unwrap();
        let draws: Vec<_> = recording
            .commands()
            .iter()
            .filter(|command| matches!(command, RasterCommand::DrawElements { .. }))
            .collect();
        assert_eq!(
            draws,
            vec![&RasterCommand::DrawElements { program, mode: PrimitiveMode::Triangles, count: 6 }]
        );
        let enabled = recording
            .commands()
            .iter()
            .filter(|command| matches!(command, RasterCommand::EnableAttribute { .. }))
            .count();
        let disabled = recording
            .commands()
            .iter()
            .filter(|command| matches!(command, RasterCommand::DisableAttribute(_)))
            .count();
        assert_eq!((enabled, disabled), (2, 2));
        assert_eq!(recording.bound_buffer(BufferTarget::Array), BufferId::NONE);
        assert_eq!(recording.bound_buffer(BufferTarget::ElementArray), BufferId::NONE);
    }

    #[test]
    fn test_release_deletes_only_owned_buffers() {
        let mut rasterizer = RecordingRasterizer::new();
        let mut mesh = Mesh::new(
            &mut rasterizer,
            PrimitiveMode::Triangles,
            &QUAD_POSITIONS,
            &QUAD_TEXUVS,
            &QUAD_TRIANGLES,
        )
        .unwrap();
        let mut shared = Mesh::shared(&mesh);

        shared.release(&mut rasterizer);
        assert_eq!(rasterizer.live_buffers(), 3);
        mesh.release(&mut rasterizer);
        assert_eq!(rasterizer.live_buffers(), 0);
    }
}
