use std::path::PathBuf;

use glam::Vec4;
use winit::dpi::LogicalSize;

use sphere_engine::device::GpuInit;
use sphere_engine::render::{LightParameters, Material};
use sphere_engine::window::RuntimeConfig;

// Shipped under `crates/draw-sphere/assets`.
pub const SCENE_FILE: &str = "sphere.gltf";
pub const VERTEX_SHADER_FILE: &str = "draw_sphere.vert.wgsl";
pub const FRAGMENT_SHADER_FILE: &str = "draw_sphere.frag.wgsl";

/// Fixed demo configuration.
///
/// Asset paths are bare file names resolved against the working directory,
/// so the demo has to be started from `crates/draw-sphere/assets`:
///
/// ```text
/// cd crates/draw-sphere/assets && cargo run -p draw-sphere
/// ```
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub scene: PathBuf,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    pub window: RuntimeConfig,
    pub gpu: GpuInit,
    pub material: Material,
    pub clear_color: wgpu::Color,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            scene: SCENE_FILE.into(),
            vertex_shader: VERTEX_SHADER_FILE.into(),
            fragment_shader: FRAGMENT_SHADER_FILE.into(),
            window: RuntimeConfig {
                title: "Draw Sphere".to_string(),
                initial_size: LogicalSize::new(300.0, 300.0),
                resizable: true,
            },
            gpu: GpuInit::default(),
            material: Material {
                diffuse_color: Vec4::new(0.3, 0.3, 1.0, 1.0),
                light: LightParameters {
                    diffuse_intensity: Vec4::new(0.5, 0.5, 0.5, 1.0),
                    ambient_intensity: Vec4::new(0.3, 0.3, 0.3, 1.0),
                    light_direction: Vec4::new(-1.0, -1.0, 0.25, 1.0),
                },
            },
            clear_color: wgpu::Color::WHITE,
        }
    }
}
