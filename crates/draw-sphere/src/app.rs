use anyhow::Context;

use sphere_engine::core::{App, AppControl, FrameCtx};
use sphere_engine::mesh::MeshSet;
use sphere_engine::render::{Material, MeshRenderer, RenderCtx};
use sphere_engine::shader::ProgramSource;

/// Draws every record of the scene once per paint request.
pub struct DrawSphereApp {
    meshes: Option<MeshSet>,
    program: ProgramSource,
    material: Material,
    clear_color: wgpu::Color,
    renderer: Option<MeshRenderer>,
}

impl DrawSphereApp {
    pub fn new(
        meshes: MeshSet,
        program: ProgramSource,
        material: Material,
        clear_color: wgpu::Color,
    ) -> Self {
        Self {
            meshes: Some(meshes),
            program,
            material,
            clear_color,
            renderer: None,
        }
    }
}

impl App for DrawSphereApp {
    fn on_init(&mut self, ctx: &RenderCtx<'_>) -> anyhow::Result<()> {
        let meshes = self.meshes.as_ref().context("scene already released")?;

        let renderer = MeshRenderer::new(ctx, &self.program, meshes, &self.material)
            .context("failed to initialize GPU scene state")?;

        log::info!(
            "scene ready: {} vertex array(s), {} vertex buffer(s)",
            renderer.vertex_state().vertex_array_count(),
            renderer.vertex_state().vertex_buffer_count()
        );

        self.renderer = Some(renderer);
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(renderer) = self.renderer.as_ref() else {
            return AppControl::Continue;
        };

        ctx.render(self.clear_color, |pass| renderer.render(pass))
    }

    fn on_exit(&mut self) {
        // GPU objects first, then the CPU-side mesh data.
        drop(self.renderer.take());
        drop(self.meshes.take());
    }
}
