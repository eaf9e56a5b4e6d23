//! 2D texture node

use crate::scene::{Node, State};
use super::rasterizer::{Rasterizer, TextureId, TextureImage};
use super::RenderResult;

/// Scene node that binds a texture to a unit for its subtree
#[derive(Debug)]
pub struct Texture2D {
    texture: TextureId,
    unit: u32,
    previous_texture: TextureId,
    previous_unit: u32,
    owner: bool,
}

impl Texture2D {
    /// Upload `image` and bind it to `unit` during traversal
    pub fn new(rasterizer: &mut dyn Rasterizer, image: &TextureImage<'_>, unit: u32) -> RenderResult<Self> {
        image.validate()?;
        let texture = rasterizer.create_texture(image)?;
        log::debug!(
            "Created texture {:?} ({}x{}) on unit {}",
            texture, image.width, image.height, unit
        );
        Ok(Self {
            texture,
            unit,
            previous_texture: TextureId::NONE,
            previous_unit: 0,
            owner: true,
        })
    }

    /// Another node binding the same texture; it never deletes the texture
    pub fn shared(other: &Self) -> Self {
        Self {
            texture: other.texture,
            unit: other.unit,
            previous_texture: TextureId::NONE,
            previous_unit: 0,
            owner: false,
        }
    }

    /// Texture handle
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    /// Texture unit this node binds to
    pub fn unit(&self) -> u32 {
        self.unit
    }
}

impl Node for Texture2D {
    fn prepare(&mut self, state: &mut State) {
        let rasterizer = state.rasterizer();
        self.previous_texture = rasterizer.bound_texture();
        self.previous_unit = rasterizer.active_texture_unit();
    }

    fn execute(&mut self, state: &mut State) {
        let rasterizer = state.rasterizer_mut();
        rasterizer.set_active_texture_unit(self.unit);
        rasterizer.bind_texture(self.texture);
    }

    fn cleanup(&mut self, state: &mut State) {
        let rasterizer = state.rasterizer_mut();
        rasterizer.set_active_texture_unit(self.previous_unit);
        rasterizer.bind_texture(self.previous_texture);
    }

    fn release(&mut self, rasterizer: &mut dyn Rasterizer) {
        if self.owner && !self.texture.is_none() {
            log::debug!("Deleting texture {:?}", self.texture);
            rasterizer.delete_texture(self.texture);
            self.texture = TextureId::NONE;
        }
    }
}
