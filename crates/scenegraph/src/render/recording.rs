//! In-memory rasterizer
//!
//! Tracks bindings and resource lifetimes the way a driver would, without a
//! GPU. Every call is appended to a command log, which makes it the backend
//! of choice for headless runs and for asserting on what a traversal did.

use std::any::Any;
use std::collections::HashMap;

use super::rasterizer::{
    AttributeLayout, AttributeLocation, BufferId, BufferTarget, PrimitiveMode, ProgramId,
    Rasterizer, ShaderStage, TextureId, TextureImage, Uniform, UniformLocation,
};
use super::{RenderError, RenderResult};

/// One recorded rasterizer call
#[derive(Debug, Clone, PartialEq)]
pub enum RasterCommand {
    /// Program compiled and linked
    CreateProgram(ProgramId),
    /// Program deleted
    DeleteProgram(ProgramId),
    /// Program made current
    UseProgram(ProgramId),
    /// Uniform uploaded to the current program
    SetUniform {
        /// Program current at upload time
        program: ProgramId,
        /// Target location
        location: UniformLocation,
        /// Uploaded value
        value: Uniform,
    },
    /// Texture uploaded
    CreateTexture {
        /// New texture
        texture: TextureId,
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// Texture deleted
    DeleteTexture(TextureId),
    /// Active texture unit selected
    ActiveTextureUnit(u32),
    /// Texture bound to the active unit
    BindTexture(TextureId),
    /// Buffer created
    CreateBuffer {
        /// New buffer
        buffer: BufferId,
        /// Creation target
        target: BufferTarget,
        /// Size in bytes
        len: usize,
    },
    /// Buffer deleted
    DeleteBuffer(BufferId),
    /// Buffer bound
    BindBuffer {
        /// Binding point
        target: BufferTarget,
        /// Bound buffer, or none
        buffer: BufferId,
    },
    /// Attribute stream enabled
    EnableAttribute {
        /// Attribute location
        location: AttributeLocation,
        /// Source layout
        layout: AttributeLayout,
    },
    /// Attribute stream disabled
    DisableAttribute(AttributeLocation),
    /// Indexed draw issued
    DrawElements {
        /// Program current at draw time
        program: ProgramId,
        /// Primitive assembly
        mode: PrimitiveMode,
        /// Index count
        count: u32,
    },
}

#[derive(Debug, Default)]
struct ProgramInfo {
    uniforms: Vec<String>,
    attributes: Vec<String>,
}

/// Rasterizer that records instead of drawing
#[derive(Debug, Default)]
pub struct RecordingRasterizer {
    next_handle: u32,
    programs: HashMap<ProgramId, ProgramInfo>,
    textures: HashMap<TextureId, (u32, u32)>,
    buffers: HashMap<BufferId, usize>,
    uniform_values: HashMap<(ProgramId, UniformLocation), Uniform>,
    current_program: ProgramId,
    bound_texture: TextureId,
    active_unit: u32,
    array_buffer: BufferId,
    element_buffer: BufferId,
    buffer_limit: Option<usize>,
    commands: Vec<RasterCommand>,
}

impl RecordingRasterizer {
    /// Create an empty rasterizer with nothing bound
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of live buffers; creation past the cap fails the way
    /// an exhausted device would. `None` removes the cap.
    pub fn set_buffer_limit(&mut self, limit: Option<usize>) {
        self.buffer_limit = limit;
    }

    /// Every call recorded so far
    pub fn commands(&self) -> &[RasterCommand] {
        &self.commands
    }

    /// Drain the command log, e.g. once per frame
    pub fn take_commands(&mut self) -> Vec<RasterCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of draw calls in the command log
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, RasterCommand::DrawElements { .. }))
            .count()
    }

    /// Programs created and not yet deleted
    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    /// Textures created and not yet deleted
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Buffers created and not yet deleted
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Buffer bound to a target
    pub fn bound_buffer(&self, target: BufferTarget) -> BufferId {
        match target {
            BufferTarget::Array => self.array_buffer,
            BufferTarget::ElementArray => self.element_buffer,
        }
    }

    /// Last value uploaded to a named uniform of `program`
    pub fn uniform_value(&self, program: ProgramId, name: &str) -> Option<&Uniform> {
        let location = self.uniform_location(program, name)?;
        self.uniform_values.get(&(program, location))
    }

    fn allocate(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    /// Names following `keyword` in GLSL declarations such as
    /// `uniform highp sampler2D name;`
    fn declared_names(source: &str, keyword: &str) -> Vec<String> {
        source
            .split(';')
            .filter_map(|statement| {
                let mut tokens = statement.split_whitespace();
                tokens.find(|token| *token == keyword)?;
                let name = tokens.last()?;
                Some(name.split('[').next().unwrap_or(name).to_string())
            })
            .collect()
    }

    fn compile(stage: ShaderStage, source: &str) -> RenderResult<()> {
        if source.trim().is_empty() {
            return Err(RenderError::ShaderCompilation {
                stage,
                log: "empty source".to_string(),
            });
        }
        if !source.contains("void main") {
            return Err(RenderError::ShaderCompilation {
                stage,
                log: "no entry point `void main` found".to_string(),
            });
        }
        Ok(())
    }
}

impl Rasterizer for RecordingRasterizer {
    fn create_program(&mut self, vertex_source: &str, fragment_source: &str) -> RenderResult<ProgramId> {
        Self::compile(ShaderStage::Vertex, vertex_source)?;
        Self::compile(ShaderStage::Fragment, fragment_source)?;

        let mut uniforms = Self::declared_names(vertex_source, "uniform");
        for name in Self::declared_names(fragment_source, "uniform") {
            if !uniforms.contains(&name) {
                uniforms.push(name);
            }
        }
        let attributes = Self::declared_names(vertex_source, "attribute");

        let program = ProgramId(self.allocate());
        self.programs.insert(program, ProgramInfo { uniforms, attributes });
        self.commands.push(RasterCommand::CreateProgram(program));
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        self.uniform_values.retain(|(owner, _), _| *owner != program);
        if self.current_program == program {
            self.current_program = ProgramId::NONE;
        }
        self.commands.push(RasterCommand::DeleteProgram(program));
    }

    fn current_program(&self) -> ProgramId {
        self.current_program
    }

    fn use_program(&mut self, program: ProgramId) {
        self.current_program = program;
        self.commands.push(RasterCommand::UseProgram(program));
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let info = self.programs.get(&program)?;
        let index = info.uniforms.iter().position(|uniform| uniform == name)?;
        i32::try_from(index).ok().map(UniformLocation)
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<AttributeLocation> {
        let info = self.programs.get(&program)?;
        let index = info.attributes.iter().position(|attribute| attribute == name)?;
        u32::try_from(index).ok().map(AttributeLocation)
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &Uniform) {
        let program = self.current_program;
        self.uniform_values.insert((program, location), value.clone());
        self.commands.push(RasterCommand::SetUniform {
            program,
            location,
            value: value.clone(),
        });
    }

    fn create_texture(&mut self, image: &TextureImage<'_>) -> RenderResult<TextureId> {
        image.validate()?;
        let texture = TextureId(self.allocate());
        self.textures.insert(texture, (image.width, image.height));
        self.commands.push(RasterCommand::CreateTexture {
            texture,
            width: image.width,
            height: image.height,
        });
        Ok(texture)
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        if self.bound_texture == texture {
            self.bound_texture = TextureId::NONE;
        }
        self.commands.push(RasterCommand::DeleteTexture(texture));
    }

    fn bound_texture(&self) -> TextureId {
        self.bound_texture
    }

    fn active_texture_unit(&self) -> u32 {
        self.active_unit
    }

    fn set_active_texture_unit(&mut self, unit: u32) {
        self.active_unit = unit;
        self.commands.push(RasterCommand::ActiveTextureUnit(unit));
    }

    fn bind_texture(&mut self, texture: TextureId) {
        self.bound_texture = texture;
        self.commands.push(RasterCommand::BindTexture(texture));
    }

    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> RenderResult<BufferId> {
        if self.buffer_limit.is_some_and(|limit| self.buffers.len() >= limit) {
            return Err(RenderError::ResourceCreationFailed(format!(
                "out of buffer memory ({} bytes requested)",
                data.len()
            )));
        }
        let buffer = BufferId(self.allocate());
        self.buffers.insert(buffer, data.len());
        self.commands.push(RasterCommand::CreateBuffer {
            buffer,
            target,
            len: data.len(),
        });
        Ok(buffer)
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
        if self.array_buffer == buffer {
            self.array_buffer = BufferId::NONE;
        }
        if self.element_buffer == buffer {
            self.element_buffer = BufferId::NONE;
        }
        self.commands.push(RasterCommand::DeleteBuffer(buffer));
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId) {
        match target {
            BufferTarget::Array => self.array_buffer = buffer,
            BufferTarget::ElementArray => self.element_buffer = buffer,
        }
        self.commands.push(RasterCommand::BindBuffer { target, buffer });
    }

    fn enable_attribute(&mut self, location: AttributeLocation, layout: AttributeLayout) {
        self.commands.push(RasterCommand::EnableAttribute { location, layout });
    }

    fn disable_attribute(&mut self, location: AttributeLocation) {
        self.commands.push(RasterCommand::DisableAttribute(location));
    }

    fn draw_elements(&mut self, mode: PrimitiveMode, count: u32) {
        self.commands.push(RasterCommand::DrawElements {
            program: self.current_program,
            mode,
            count,
        });
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
