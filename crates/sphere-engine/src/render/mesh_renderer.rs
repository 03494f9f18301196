use crate::mesh::{MeshError, MeshSet, Topology};
use crate::shader::{PipelineKey, Program, ProgramSource};

use super::{Material, RenderCtx, UniformState, VertexPlan, VertexState};

/// One indexed draw issued per frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DrawCall {
    /// Index of the geometry record / vertex array.
    pub mesh: usize,
    pub index_count: u32,
    pub index_format: wgpu::IndexFormat,
    pub topology: Topology,
}

/// Owns every GPU object of the scene and draws it.
///
/// Dropping the renderer is the teardown: vertex buffers, index buffers,
/// vertex arrays and uniform buffers are each released exactly once.
pub struct MeshRenderer {
    vertex_state: VertexState,
    uniforms: UniformState,
    program: Program,
    draws: Vec<DrawCall>,
}

impl MeshRenderer {
    /// Runs the initialization sequence: program, vertex state, uniforms.
    pub fn new(
        ctx: &RenderCtx<'_>,
        source: &ProgramSource,
        meshes: &MeshSet,
        material: &Material,
    ) -> Result<Self, MeshError> {
        let plan = VertexPlan::for_interface(meshes, source.interface())?;

        let mut program = Program::create(ctx, source);
        let vertex_state = VertexState::create(ctx, &mut program, meshes, &plan)?;
        let uniforms = UniformState::create(ctx, &program, material);

        log::debug!("{} pipeline variant(s) in use", program.pipeline_count());

        Ok(Self {
            vertex_state,
            uniforms,
            program,
            draws: plan.draw_calls(),
        })
    }

    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draws
    }

    pub fn vertex_state(&self) -> &VertexState {
        &self.vertex_state
    }

    pub fn uniforms(&self) -> &UniformState {
        &self.uniforms
    }

    /// Records one indexed draw per geometry record into `pass`.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(0, self.uniforms.bind_group(), &[]);

        let mut bound: Option<&PipelineKey> = None;
        for draw in &self.draws {
            let Some(mesh) = self.vertex_state.mesh(draw.mesh) else { continue };

            if bound != Some(mesh.key()) {
                let Some(pipeline) = self.program.pipeline(mesh.key()) else { continue };
                pass.set_pipeline(pipeline);
                bound = Some(mesh.key());
            }

            if self.vertex_state.bind(pass, draw.mesh) {
                pass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }
    }
}

impl Drop for MeshRenderer {
    fn drop(&mut self) {
        log::debug!("tearing down scene ({} draw(s) per frame)", self.draws.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{
        triangle_fixture as triangle, AttributeBuffer, ElementType, ATTRIBUTE_POSITION,
    };
    use crate::shader::{compile_stage, fixtures, StageKind};

    const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
    const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Any adapter will do, software ones included. `None` skips the test.
    fn headless_device() -> Option<(wgpu::Device, wgpu::Queue)> {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::default(),
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .ok()?;
            adapter
                .request_device(&wgpu::DeviceDescriptor {
                    label: Some("sphere test device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                    experimental_features: wgpu::ExperimentalFeatures::disabled(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    trace: wgpu::Trace::Off,
                })
                .await
                .ok()
        })
    }

    fn linked_fixtures() -> ProgramSource {
        let vs = compile_stage(StageKind::Vertex, "v.wgsl", fixtures::VERTEX.into()).unwrap();
        let fs = compile_stage(StageKind::Fragment, "f.wgsl", fixtures::FRAGMENT.into()).unwrap();
        ProgramSource::link(vs, fs).unwrap()
    }

    fn attachment(device: &wgpu::Device, format: wgpu::TextureFormat) -> wgpu::TextureView {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("offscreen attachment"),
                size: wgpu::Extent3d { width: 64, height: 64, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    }

    #[test]
    fn renders_offscreen_and_releases_everything() {
        let Some((device, queue)) = headless_device() else {
            eprintln!("no wgpu adapter available; skipping");
            return;
        };
        let ctx = RenderCtx::new(&device, &queue, COLOR_FORMAT, DEPTH_FORMAT);

        let mut strip = triangle();
        strip.topology = Topology::TriangleStrip;
        let meshes = MeshSet::from_records(vec![triangle(), triangle(), strip]).unwrap();

        let renderer =
            MeshRenderer::new(&ctx, &linked_fixtures(), &meshes, &Material::default()).unwrap();
        assert_eq!(renderer.vertex_state().vertex_array_count(), 3);
        assert_eq!(renderer.vertex_state().vertex_buffer_count(), 6);
        assert_eq!(renderer.uniforms().light_binding_size(), 48);
        assert_eq!(renderer.draw_calls().len(), 3);

        let color = attachment(&device, COLOR_FORMAT);
        let depth = attachment(&device, DEPTH_FORMAT);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("offscreen frame"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("offscreen pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            renderer.render(&mut pass);
        }
        queue.submit(std::iter::once(encoder.finish()));

        drop(renderer);
    }

    #[test]
    fn integer_positions_fail_before_pipeline_creation() {
        let Some((device, queue)) = headless_device() else {
            eprintln!("no wgpu adapter available; skipping");
            return;
        };
        let ctx = RenderCtx::new(&device, &queue, COLOR_FORMAT, DEPTH_FORMAT);

        let mut rec = triangle();
        rec.attributes.insert(
            ATTRIBUTE_POSITION.to_string(),
            AttributeBuffer {
                components: 3,
                element: ElementType::U32,
                data: bytemuck::cast_slice(&[[0u32; 3]; 3]).to_vec(),
            },
        );
        let meshes = MeshSet::from_records(vec![rec]).unwrap();

        let err = MeshRenderer::new(&ctx, &linked_fixtures(), &meshes, &Material::default())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            MeshError::ElementMismatch {
                record: 0,
                attribute: ATTRIBUTE_POSITION,
                element: ElementType::U32,
                expected: ElementType::F32,
            }
        ));
    }
}
