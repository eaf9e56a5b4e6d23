//! Shader program node
//!
//! Binds a program for its subtree and feeds it the accumulated
//! model-view-projection matrix.

use bitflags::bitflags;

use crate::scene::{Node, State};
use super::rasterizer::{ProgramId, Rasterizer, Uniform};
use super::{RenderError, RenderResult};

/// Uniform holding the combined projection and model-view matrix
pub const PROJECTION_MODEL_VIEW_UNIFORM: &str = "scene_projection_model_view";
/// Sampler uniform bound to texture unit 0
pub const TEXTURE_SAMPLER_UNIFORM: &str = "scene_texture";
/// Vertex position attribute (3 floats)
pub const POSITION_ATTRIBUTE: &str = "scene_position";
/// Vertex normal attribute (3 floats)
pub const NORMAL_ATTRIBUTE: &str = "scene_normal";
/// Texture coordinate attribute (2 floats)
pub const TEXUV_ATTRIBUTE: &str = "scene_texuv";

/// Vertex stage used by [`Shader::with_defaults`]
pub const DEFAULT_VERTEX_SHADER: &str = "\
uniform mat4 scene_projection_model_view;
attribute vec3 scene_position;
attribute vec2 scene_texuv;
varying vec2 v_texuv;
void main()
{
    gl_Position = scene_projection_model_view * vec4(scene_position, 1.0);
    v_texuv = scene_texuv;
}";

/// Fragment stage used by [`Shader::with_defaults`]
pub const DEFAULT_FRAGMENT_SHADER: &str = "\
uniform sampler2D scene_texture;
varying vec2 v_texuv;
void main()
{
    gl_FragColor = texture2D(scene_texture, v_texuv);
}";

bitflags! {
    /// Built-in uniforms a [`Shader`] uploads on every `execute`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderUniforms: u32 {
        /// [`PROJECTION_MODEL_VIEW_UNIFORM`]
        const PROJECTION_MODEL_VIEW = 1;
        /// [`TEXTURE_SAMPLER_UNIFORM`]
        const TEXTURE_SAMPLER = 2;
        /// Both of the above
        const DEFAULT = Self::PROJECTION_MODEL_VIEW.bits() | Self::TEXTURE_SAMPLER.bits();
    }
}

bitflags! {
    /// Vertex attributes a [`Shader`] is expected to declare
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderAttributes: u32 {
        /// [`POSITION_ATTRIBUTE`]
        const POSITION = 1;
        /// [`NORMAL_ATTRIBUTE`]
        const NORMAL = 2;
        /// [`TEXUV_ATTRIBUTE`]
        const TEXUV = 4;
        /// Position and texture coordinates
        const DEFAULT = Self::POSITION.bits() | Self::TEXUV.bits();
    }
}

/// Scene node that makes a shader program current for its subtree
#[derive(Debug)]
pub struct Shader {
    program: ProgramId,
    previous_program: ProgramId,
    uniforms: ShaderUniforms,
    owner: bool,
}

impl Shader {
    /// Compile and link a program.
    ///
    /// Expected attributes that the program does not declare are logged but
    /// do not fail creation.
    pub fn new(
        rasterizer: &mut dyn Rasterizer,
        vertex_source: &str,
        fragment_source: &str,
        uniforms: ShaderUniforms,
        attributes: ShaderAttributes,
    ) -> RenderResult<Self> {
        let program = rasterizer.create_program(vertex_source, fragment_source)
            .map_err(|e| {
                log::warn!("Shader creation failed: {}", e);
                e
            })?;

        let expected = [
            (ShaderAttributes::POSITION, POSITION_ATTRIBUTE),
            (ShaderAttributes::NORMAL, NORMAL_ATTRIBUTE),
            (ShaderAttributes::TEXUV, TEXUV_ATTRIBUTE),
        ];
        for (flag, name) in expected {
            if attributes.contains(flag) && rasterizer.attribute_location(program, name).is_none() {
                log::warn!("Could not bind attribute {} in program {:?}", name, program);
            }
        }

        log::debug!("Created shader program {:?} (uniforms: {:?})", program, uniforms);
        Ok(Self {
            program,
            previous_program: ProgramId::NONE,
            uniforms,
            owner: true,
        })
    }

    /// Program built from [`DEFAULT_VERTEX_SHADER`] and [`DEFAULT_FRAGMENT_SHADER`]
    pub fn with_defaults(rasterizer: &mut dyn Rasterizer) -> RenderResult<Self> {
        Self::new(
            rasterizer,
            DEFAULT_VERTEX_SHADER,
            DEFAULT_FRAGMENT_SHADER,
            ShaderUniforms::DEFAULT,
            ShaderAttributes::DEFAULT,
        )
    }

    /// Another node using the same program; it never deletes the program
    pub fn shared(other: &Self) -> Self {
        Self {
            program: other.program,
            previous_program: ProgramId::NONE,
            uniforms: other.uniforms,
            owner: false,
        }
    }

    /// Program handle
    pub fn program(&self) -> ProgramId {
        self.program
    }

    /// Whether this node deletes the program on release
    pub fn is_owner(&self) -> bool {
        self.owner
    }

    /// Upload a uniform by name. The program must be current.
    pub fn set_uniform(&self, rasterizer: &mut dyn Rasterizer, name: &str, value: &Uniform) -> RenderResult<()> {
        let location = rasterizer
            .uniform_location(self.program, name)
            .ok_or_else(|| RenderError::UnknownUniform(name.to_string()))?;
        rasterizer.set_uniform(location, value);
        Ok(())
    }

    /// Upload a single integer
    pub fn set_uniform_int(&self, rasterizer: &mut dyn Rasterizer, name: &str, value: i32) -> RenderResult<()> {
        self.set_uniform(rasterizer, name, &Uniform::Int(value))
    }

    /// Upload a single float
    pub fn set_uniform_float(&self, rasterizer: &mut dyn Rasterizer, name: &str, value: f32) -> RenderResult<()> {
        self.set_uniform(rasterizer, name, &Uniform::Float(value))
    }

    /// Upload an array of 2-component vectors
    pub fn set_uniform_vec2(&self, rasterizer: &mut dyn Rasterizer, name: &str, values: &[[f32; 2]]) -> RenderResult<()> {
        self.set_uniform(rasterizer, name, &Uniform::Vec2(values.to_vec()))
    }
}

impl Node for Shader {
    fn prepare(&mut self, state: &mut State) {
        self.previous_program = state.rasterizer().current_program();
    }

    fn execute(&mut self, state: &mut State) {
        let model_view_projection = state.model_view_projection();
        let rasterizer = state.rasterizer_mut();

        if self.previous_program != self.program {
            rasterizer.use_program(self.program);
        }
        if self.uniforms.contains(ShaderUniforms::PROJECTION_MODEL_VIEW) {
            let value = Uniform::Mat4 { matrix: model_view_projection, transpose: false };
            if let Err(e) = self.set_uniform(rasterizer, PROJECTION_MODEL_VIEW_UNIFORM, &value) {
                log::warn!("{}", e);
            }
        }
        if self.uniforms.contains(ShaderUniforms::TEXTURE_SAMPLER) {
            if let Err(e) = self.set_uniform_int(rasterizer, TEXTURE_SAMPLER_UNIFORM, 0) {
                log::warn!("{}", e);
            }
        }
    }

    fn cleanup(&mut self, state: &mut State) {
        if self.previous_program != self.program {
            state.rasterizer_mut().use_program(self.previous_program);
        }
    }

    fn release(&mut self, rasterizer: &mut dyn Rasterizer) {
        if self.owner && !self.program.is_none() {
            log::debug!("Deleting shader program {:?}", self.program);
            rasterizer.delete_program(self.program);
            self.program = ProgramId::NONE;
        }
    }
}
