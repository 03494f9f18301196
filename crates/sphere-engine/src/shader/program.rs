use std::collections::HashMap;
use std::num::NonZeroU64;
use std::path::Path;

use crate::mesh::Topology;
use crate::render::{RenderCtx, INDEX_FORMAT};

use super::{load_stage, CompiledStage, ShaderError, ShaderInterface, StageKind};
use super::{ATTRIB_COORDS, ATTRIB_NORMALS};

/// Compiled and linked program source, independent of any GPU device.
#[derive(Debug)]
pub struct ProgramSource {
    vertex: CompiledStage,
    fragment: CompiledStage,
    interface: ShaderInterface,
}

impl ProgramSource {
    /// Loads, compiles and links a vertex + fragment stage pair.
    pub fn load(
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        let vertex = load_stage(StageKind::Vertex, vertex_path)?;
        let fragment = load_stage(StageKind::Fragment, fragment_path)?;
        Self::link(vertex, fragment)
    }

    /// Links two already compiled stages.
    pub fn link(vertex: CompiledStage, fragment: CompiledStage) -> Result<Self, ShaderError> {
        let interface = ShaderInterface::link(&vertex, &fragment)?;

        log::info!(
            "linked shader program ({} + {})",
            vertex.path().display(),
            fragment.path().display()
        );

        Ok(Self { vertex, fragment, interface })
    }

    pub fn interface(&self) -> &ShaderInterface {
        &self.interface
    }

    pub fn vertex(&self) -> &CompiledStage {
        &self.vertex
    }

    pub fn fragment(&self) -> &CompiledStage {
        &self.fragment
    }
}

/// Everything that selects a pipeline variant of a [`Program`].
///
/// wgpu bakes topology and vertex formats into the pipeline object, so meshes
/// that differ in any of these need their own variant.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PipelineKey {
    pub topology: Topology,
    pub position_format: wgpu::VertexFormat,
    pub normal_format: wgpu::VertexFormat,
}

/// GPU-side linked program.
///
/// Owns both shader modules, the uniform bind group layout and one pipeline
/// per [`PipelineKey`] in use.
pub struct Program {
    interface: ShaderInterface,

    vertex_module: wgpu::ShaderModule,
    vertex_entry: String,
    fragment_module: wgpu::ShaderModule,
    fragment_entry: String,

    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,

    color_format: wgpu::TextureFormat,
    depth_format: wgpu::TextureFormat,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl Program {
    pub fn create(ctx: &RenderCtx<'_>, source: &ProgramSource) -> Self {
        let vertex_module = source.vertex.create_module(ctx.device);
        let fragment_module = source.fragment.create_module(ctx.device);

        let entries: Vec<wgpu::BindGroupLayoutEntry> = source
            .interface
            .uniform_slots()
            .iter()
            .map(|slot| wgpu::BindGroupLayoutEntry {
                binding: slot.binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(slot.size as u64),
                },
                count: None,
            })
            .collect();

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("sphere uniforms bgl"),
                    entries: &entries,
                });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("sphere pipeline layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                });

        Self {
            interface: source.interface.clone(),
            vertex_module,
            vertex_entry: source.vertex.entry_point().to_string(),
            fragment_module,
            fragment_entry: source.fragment.entry_point().to_string(),
            bind_group_layout,
            pipeline_layout,
            color_format: ctx.surface_format,
            depth_format: ctx.depth_format,
            pipelines: HashMap::new(),
        }
    }

    pub fn interface(&self) -> &ShaderInterface {
        &self.interface
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn pipeline(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Creates the pipeline variant for `key` unless it already exists.
    pub fn ensure_pipeline(&mut self, device: &wgpu::Device, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }

        let coords = [wgpu::VertexAttribute {
            format: key.position_format,
            offset: 0,
            shader_location: ATTRIB_COORDS,
        }];
        let normals = [wgpu::VertexAttribute {
            format: key.normal_format,
            offset: 0,
            shader_location: ATTRIB_NORMALS,
        }];
        // Array position is the buffer slot.
        let buffers = [
            wgpu::VertexBufferLayout {
                array_stride: key.position_format.size(),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &coords,
            },
            wgpu::VertexBufferLayout {
                array_stride: key.normal_format.size(),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &normals,
            },
        ];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sphere mesh pipeline"),
            layout: Some(&self.pipeline_layout),

            vertex: wgpu::VertexState {
                module: &self.vertex_module,
                entry_point: Some(&self.vertex_entry),
                compilation_options: Default::default(),
                buffers: &buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &self.fragment_module,
                entry_point: Some(&self.fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: key.topology.to_wgpu(),
                strip_index_format: key.topology.is_strip().then_some(INDEX_FORMAT),
                front_face: wgpu::FrontFace::Cw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: Some(wgpu::DepthStencilState {
                format: self.depth_format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        });

        log::debug!("created pipeline variant {key:?}");
        self.pipelines.insert(key, pipeline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{compile_stage, fixtures};

    fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn loads_and_links_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let vs = write(dir.path(), "draw_sphere.vert.wgsl", fixtures::VERTEX);
        let fs = write(dir.path(), "draw_sphere.frag.wgsl", fixtures::FRAGMENT);

        let program = ProgramSource::load(&vs, &fs).unwrap();
        assert_eq!(program.vertex().entry_point(), "vs_main");
        assert_eq!(program.fragment().entry_point(), "fs_main");
        assert_eq!(program.interface().light_block.size, 48);
    }

    #[test]
    fn missing_fragment_file_stops_loading() {
        let dir = tempfile::tempdir().unwrap();
        let vs = write(dir.path(), "draw_sphere.vert.wgsl", fixtures::VERTEX);

        let err = ProgramSource::load(&vs, dir.path().join("draw_sphere.frag.wgsl")).unwrap_err();
        assert!(matches!(err, ShaderError::NotFound { .. }));
    }

    #[test]
    fn broken_vertex_stage_is_a_compile_error() {
        let dir = tempfile::tempdir().unwrap();
        let vs = write(dir.path(), "v.wgsl", "@vertex fn vs_main( {");
        let fs = write(dir.path(), "f.wgsl", fixtures::FRAGMENT);

        let err = ProgramSource::load(&vs, &fs).unwrap_err();
        assert!(matches!(err, ShaderError::Compile { stage: StageKind::Vertex, .. }));
    }

    #[test]
    fn stages_are_linked_in_memory() {
        let vs = compile_stage(StageKind::Vertex, "v", fixtures::VERTEX.into()).unwrap();
        let fs = compile_stage(StageKind::Fragment, "f", fixtures::FRAGMENT.into()).unwrap();
        assert!(ProgramSource::link(vs, fs).is_ok());
    }

    #[test]
    fn pipeline_keys_distinguish_topology() {
        let a = PipelineKey {
            topology: Topology::Triangles,
            position_format: wgpu::VertexFormat::Float32x3,
            normal_format: wgpu::VertexFormat::Float32x3,
        };
        let b = PipelineKey { topology: Topology::TriangleStrip, ..a };
        assert_ne!(a, b);
        assert_eq!(a, PipelineKey { ..a });
    }
}
