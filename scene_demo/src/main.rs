//! Spinning quad demo
//!
//! Builds a small scene (shader, texture, camera offset, spinning node and a
//! textured quad), then drives it headlessly for a fixed number of frames
//! through the recording backend, logging what each frame drew.
//!
//! Usage: `spinning_quad [scene.toml|scene.ron]`

use scenegraph::config::{Config, ConfigError, SceneConfig};
use scenegraph::foundation::logging;
use scenegraph::foundation::math::degrees_to_radians;
use scenegraph::render::{
    Mesh, PixelFormat, PrimitiveMode, RecordingRasterizer, RenderError, Shader, Texture2D,
    TextureImage,
};
use scenegraph::scene::{Node, NodeTree, SceneError, State, Transformation};
use thiserror::Error;

const FRAMES: u32 = 8;
const DEGREES_PER_FRAME: f32 = 15.0;

const QUAD_POSITIONS: [f32; 12] = [
    -1.0, -1.0, 0.0,
    1.0, -1.0, 0.0,
    1.0, 1.0, 0.0,
    -1.0, 1.0, 0.0,
];
const QUAD_TEXUVS: [f32; 8] = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
const QUAD_TRIANGLES: [u32; 6] = [0, 1, 2, 2, 3, 0];

const CHECKER: [u8; 16] = [
    255, 255, 255, 255, 40, 40, 40, 255,
    40, 40, 40, 255, 255, 255, 255, 255,
];

#[derive(Error, Debug)]
enum DemoError {
    #[error("Configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Scene: {0}")]
    Scene(#[from] SceneError),

    #[error("Render: {0}")]
    Render(#[from] RenderError),
}

/// Rotates its subtree about the y axis a little more every frame
struct Spinner {
    degrees_per_frame: f32,
    angle: f32,
    local: Transformation,
}

impl Spinner {
    fn new(degrees_per_frame: f32) -> Self {
        Self {
            degrees_per_frame,
            angle: 0.0,
            local: Transformation::identity(),
        }
    }
}

impl Node for Spinner {
    fn prepare(&mut self, state: &mut State) {
        self.local.prepare(state);
    }

    fn update(&mut self, _state: &mut State) {
        let radians = degrees_to_radians(self.angle);
        self.local.set_matrix(Some(&Transformation::rotation_matrix(0.0, 1.0, 0.0, radians)));
    }

    fn execute(&mut self, state: &mut State) {
        self.local.execute(state);
    }

    fn animate(&mut self, _state: &mut State) {
        self.angle = (self.angle + self.degrees_per_frame) % 360.0;
    }

    fn cleanup(&mut self, state: &mut State) {
        self.local.cleanup(state);
    }
}

fn load_config() -> Result<SceneConfig, DemoError> {
    let Some(path) = std::env::args().nth(1) else {
        log::info!("No configuration given, using defaults");
        return Ok(SceneConfig::default());
    };

    log::info!("Loading configuration from {}", path);
    let config = SceneConfig::load_from_file(&path)?;
    config.validate()?;
    Ok(config)
}

fn run() -> Result<(), DemoError> {
    let config = load_config()?;
    let mut state = State::from_config(&config, Box::new(RecordingRasterizer::new()));

    let mut tree = NodeTree::new();
    let shader = Shader::with_defaults(state.rasterizer_mut())?;
    let image = TextureImage::new(2, 2, PixelFormat::Rgba, &CHECKER);
    let texture = Texture2D::new(state.rasterizer_mut(), &image, 0)?;
    let mesh = Mesh::new(
        state.rasterizer_mut(),
        PrimitiveMode::Triangles,
        &QUAD_POSITIONS,
        &QUAD_TEXUVS,
        &QUAD_TRIANGLES,
    )?;

    let root = tree.insert(shader, None)?;
    let texture = tree.insert(texture, Some(root))?;
    let mut camera = Transformation::identity();
    camera.translate(0.0, 0.0, -4.0);
    let camera = tree.insert(camera, Some(texture))?;
    let spinner = tree.insert(Spinner::new(DEGREES_PER_FRAME), Some(camera))?;
    tree.insert(mesh, Some(spinner))?;
    log::info!("Scene built: {:?}", tree);

    for frame in 0..FRAMES {
        let stats = state.execute(&mut tree, root)?;

        let draws = state
            .rasterizer_mut()
            .as_any_mut()
            .downcast_mut::<RecordingRasterizer>()
            .map_or(0, |recording| {
                let draws = recording.draw_count();
                recording.take_commands();
                draws
            });
        log::info!(
            "Frame {}: {} draw(s), {} node(s) visited, depth {}",
            frame, draws, stats.visited, stats.max_depth
        );
    }

    tree.clear(state.rasterizer_mut());
    log::info!("Released all scene resources");
    Ok(())
}

fn main() {
    logging::init();
    log::info!("Starting spinning quad demo");

    if let Err(e) = run() {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}
