//! Rendering boundary
//!
//! The scene graph never talks to a graphics API directly. Everything that
//! touches GPU state goes through the [`Rasterizer`] trait, which a backend
//! implements as a thin pass-through to its native functions.
//!
//! ## Architecture
//!
//! ```text
//! Scene traversal (State::execute)
//!      ↓
//! Resource nodes (Shader, Texture2D, Mesh)
//!      ↓
//! Rasterizer (native graphics API, or RecordingRasterizer)
//! ```
//!
//! Resource nodes snapshot the bound GPU state in `prepare`, bind their own
//! resource in `execute` and restore the snapshot in `cleanup`, so siblings
//! never observe each other's bindings.

mod rasterizer;
mod recording;
mod shader;
mod texture;
mod mesh;

pub use rasterizer::{
    AttributeLayout, AttributeLocation, BufferId, BufferTarget, PixelFormat, PrimitiveMode,
    ProgramId, Rasterizer, ShaderStage, TextureId, TextureImage, Uniform, UniformLocation,
};
pub use recording::{RasterCommand, RecordingRasterizer};
pub use shader::{
    Shader, ShaderAttributes, ShaderUniforms, DEFAULT_FRAGMENT_SHADER, DEFAULT_VERTEX_SHADER,
    NORMAL_ATTRIBUTE, POSITION_ATTRIBUTE, PROJECTION_MODEL_VIEW_UNIFORM, TEXTURE_SAMPLER_UNIFORM,
    TEXUV_ATTRIBUTE,
};
pub use texture::Texture2D;
pub use mesh::Mesh;

use thiserror::Error;

/// Rendering error types
///
/// Raised while creating GPU resources or uploading shader parameters.
/// Traversal itself never fails because of the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A shader stage failed to compile
    #[error("{stage:?} shader failed to compile: {log}")]
    ShaderCompilation {
        /// Stage that failed
        stage: ShaderStage,
        /// Compiler info log
        log: String,
    },

    /// Compiled stages could not be linked into a program
    #[error("Shader program failed to link: {0}")]
    ProgramLink(String),

    /// The bound program has no uniform with this name
    #[error("Could not transfer uniform {0}")]
    UnknownUniform(String),

    /// Resource creation or management failed
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// Texture dimensions and pixel data disagree
    #[error("Invalid texture: {0}")]
    InvalidTexture(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
