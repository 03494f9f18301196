mod app;
mod config;

use std::process::ExitCode;

use anyhow::Context;

use sphere_engine::logging::{init_logging, LoggingConfig};
use sphere_engine::mesh::MeshSet;
use sphere_engine::shader::ProgramSource;
use sphere_engine::window::Runtime;

use app::DrawSphereApp;
use config::DemoConfig;

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    match run(DemoConfig::default()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Loads everything that can fail before a window exists, then hands over
/// to the event loop.
fn run(config: DemoConfig) -> anyhow::Result<()> {
    let meshes = MeshSet::load(&config.scene)
        .with_context(|| format!("failed to load {}", config.scene.display()))?;

    let program = ProgramSource::load(&config.vertex_shader, &config.fragment_shader)
        .context("failed to build the shader program")?;

    let app = DrawSphereApp::new(meshes, program, config.material, config.clear_color);
    Runtime::run(config.window, config.gpu, app)
}
