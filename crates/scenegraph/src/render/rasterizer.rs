//! Backend abstraction for the graphics API
//!
//! Resource handles are plain integers, as native APIs hand them out. The
//! zero handle means "nothing bound" for every resource kind.

use std::any::Any;

use crate::foundation::math::Mat4;
use super::{RenderError, RenderResult};

macro_rules! resource_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            /// The "nothing bound" handle
            pub const NONE: Self = Self(0);

            /// Whether this is the "nothing bound" handle
            pub const fn is_none(self) -> bool {
                self.0 == 0
            }
        }
    };
}

resource_handle!(
    /// Linked shader program
    ProgramId
);
resource_handle!(
    /// 2D texture object
    TextureId
);
resource_handle!(
    /// Vertex or index buffer object
    BufferId
);

/// Location of a uniform inside the currently bound program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

/// Location of a vertex attribute inside a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeLocation(pub u32);

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Fragment shader
    Fragment,
}

/// Binding point for buffer objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Per-vertex attribute data
    Array,
    /// Index data for indexed draws
    ElementArray,
}

/// How indexed vertices are assembled into primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveMode {
    /// Individual points
    Points,
    /// Independent line segments
    Lines,
    /// Connected line segments
    LineStrip,
    /// Independent triangles
    #[default]
    Triangles,
    /// Triangle strip
    TriangleStrip,
    /// Triangle fan
    TriangleFan,
}

/// Layout of client pixel data handed to [`Rasterizer::create_texture`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit red, green, blue
    Rgb,
    /// 8-bit red, green, blue, alpha
    Rgba,
}

impl PixelFormat {
    /// Bytes per pixel
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// Decoded pixel data supplied by the caller
///
/// Textures are always stored as RGBA with linear filtering and
/// clamp-to-edge wrapping; `format` only describes the source bytes.
#[derive(Debug, Clone, Copy)]
pub struct TextureImage<'a> {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Source pixel layout
    pub format: PixelFormat,
    /// Tightly packed rows, bottom row first
    pub bits: &'a [u8],
}

impl<'a> TextureImage<'a> {
    /// Describe a block of pixel data
    pub const fn new(width: u32, height: u32, format: PixelFormat, bits: &'a [u8]) -> Self {
        Self { width, height, format, bits }
    }

    /// Check that the dimensions and the byte count agree
    pub fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidTexture(format!(
                "empty texture {}x{}",
                self.width, self.height
            )));
        }
        let expected = self.width as usize * self.height as usize * self.format.bytes_per_pixel();
        if self.bits.len() != expected {
            return Err(RenderError::InvalidTexture(format!(
                "{}x{} {:?} needs {} bytes, got {}",
                self.width,
                self.height,
                self.format,
                expected,
                self.bits.len()
            )));
        }
        Ok(())
    }
}

/// Value uploaded to a shader uniform
#[derive(Debug, Clone, PartialEq)]
pub enum Uniform {
    /// Single integer, also used for sampler units
    Int(i32),
    /// Single float
    Float(f32),
    /// Array of 2-component vectors
    Vec2(Vec<[f32; 2]>),
    /// 4x4 matrix in column-major order
    Mat4 {
        /// Matrix value
        matrix: Mat4,
        /// Whether the backend should transpose on upload
        transpose: bool,
    },
}

/// Description of one vertex attribute stream in the bound array buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeLayout {
    /// Floats per vertex
    pub components: u32,
    /// Bytes between consecutive vertices
    pub stride: u32,
}

/// Graphics-function dispatch used by resource nodes
///
/// Implementations forward each call to a native API. Query methods report
/// the state set through this same trait; nodes rely on that to restore
/// bindings in `cleanup`.
pub trait Rasterizer {
    /// Compile both stages and link them into a program
    fn create_program(&mut self, vertex_source: &str, fragment_source: &str) -> RenderResult<ProgramId>;

    /// Delete a program
    fn delete_program(&mut self, program: ProgramId);

    /// Program currently in use
    fn current_program(&self) -> ProgramId;

    /// Make `program` current
    fn use_program(&mut self, program: ProgramId);

    /// Resolve a uniform by name
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Resolve a vertex attribute by name
    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<AttributeLocation>;

    /// Upload a uniform value to the current program
    fn set_uniform(&mut self, location: UniformLocation, value: &Uniform);

    /// Upload a 2D texture
    fn create_texture(&mut self, image: &TextureImage<'_>) -> RenderResult<TextureId>;

    /// Delete a texture
    fn delete_texture(&mut self, texture: TextureId);

    /// Texture bound on the active unit
    fn bound_texture(&self) -> TextureId;

    /// Active texture unit index
    fn active_texture_unit(&self) -> u32;

    /// Select the active texture unit
    fn set_active_texture_unit(&mut self, unit: u32);

    /// Bind a texture to the active unit
    fn bind_texture(&mut self, texture: TextureId);

    /// Create a buffer filled with `data`
    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> RenderResult<BufferId>;

    /// Delete a buffer
    fn delete_buffer(&mut self, buffer: BufferId);

    /// Bind a buffer to a target; [`BufferId::NONE`] unbinds
    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId);

    /// Point an attribute at the bound array buffer and enable it
    fn enable_attribute(&mut self, location: AttributeLocation, layout: AttributeLayout);

    /// Disable an attribute stream
    fn disable_attribute(&mut self, location: AttributeLocation);

    /// Draw `count` indices from the bound element buffer
    fn draw_elements(&mut self, mode: PrimitiveMode, count: u32);

    /// Downcast to the concrete backend type
    fn as_any(&self) -> &dyn Any;

    /// Downcast to the concrete backend type, mutably
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
