use wgpu::util::DeviceExt;

use crate::mesh::{
    AttributeBuffer, ElementType, GeometryRecord, MeshError, MeshSet, ATTRIBUTE_NORMAL,
    ATTRIBUTE_POSITION,
};
use crate::shader::{PipelineKey, Program, ShaderInterface, ATTRIB_COORDS, ATTRIB_NORMALS};

use super::{DrawCall, RenderCtx, INDEX_FORMAT};

/// Vertex layout and draw parameters of one record, derived without a GPU.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MeshLayout {
    pub key: PipelineKey,
    pub index_count: u32,
    pub position_element: ElementType,
    pub normal_element: ElementType,
}

impl MeshLayout {
    pub fn from_record(index: usize, record: &GeometryRecord) -> Result<Self, MeshError> {
        record.validate(index)?;
        let (position, normal) = record.position_and_normal(index)?;

        Ok(Self {
            key: PipelineKey {
                topology: record.topology,
                position_format: stream_format(index, ATTRIBUTE_POSITION, position)?,
                normal_format: stream_format(index, ATTRIBUTE_NORMAL, normal)?,
            },
            index_count: record.index_count,
            position_element: position.element,
            normal_element: normal.element,
        })
    }

    /// Fails unless both streams hold the scalar type the vertex stage reads.
    pub fn check_inputs(&self, index: usize, interface: &ShaderInterface) -> Result<(), MeshError> {
        for (attribute, element, expected) in [
            (ATTRIBUTE_POSITION, self.position_element, interface.coords_element),
            (ATTRIBUTE_NORMAL, self.normal_element, interface.normals_element),
        ] {
            if element != expected {
                return Err(MeshError::ElementMismatch { record: index, attribute, element, expected });
            }
        }
        Ok(())
    }
}

fn stream_format(
    record: usize,
    attribute: &'static str,
    stream: &AttributeBuffer,
) -> Result<wgpu::VertexFormat, MeshError> {
    stream.vertex_format().ok_or(MeshError::UnsupportedLayout {
        record,
        attribute,
        components: stream.components,
        element: stream.element,
    })
}

/// Allocation plan for a whole mesh set: one vertex array and two vertex
/// buffers per record, in record order.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexPlan {
    layouts: Vec<MeshLayout>,
}

impl VertexPlan {
    pub fn from_meshes(meshes: &MeshSet) -> Result<Self, MeshError> {
        let layouts = meshes
            .iter()
            .enumerate()
            .map(|(i, record)| MeshLayout::from_record(i, record))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { layouts })
    }

    /// Like [`from_meshes`](Self::from_meshes), and additionally checks every
    /// record against the vertex inputs of a linked program.
    pub fn for_interface(meshes: &MeshSet, interface: &ShaderInterface) -> Result<Self, MeshError> {
        let plan = Self::from_meshes(meshes)?;
        for (i, layout) in plan.layouts.iter().enumerate() {
            layout.check_inputs(i, interface)?;
        }
        Ok(plan)
    }

    pub fn layouts(&self) -> &[MeshLayout] {
        &self.layouts
    }

    #[inline]
    pub fn vertex_array_count(&self) -> usize {
        self.layouts.len()
    }

    #[inline]
    pub fn vertex_buffer_count(&self) -> usize {
        2 * self.layouts.len()
    }

    /// One indexed draw per record, in record order.
    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.layouts
            .iter()
            .enumerate()
            .map(|(mesh, layout)| DrawCall {
                mesh,
                index_count: layout.index_count,
                index_format: INDEX_FORMAT,
                topology: layout.key.topology,
            })
            .collect()
    }
}

/// A bound drawable mesh: pipeline variant plus its index buffer.
///
/// The two vertex buffers live in [`VertexState`] at `2i` and `2i + 1`.
pub struct GpuMesh {
    key: PipelineKey,
    index_buffer: wgpu::Buffer,
}

impl GpuMesh {
    pub fn key(&self) -> &PipelineKey {
        &self.key
    }
}

/// GPU-resident vertex data of every record.
///
/// Created once, never resized. Buffers are destroyed when this value drops.
pub struct VertexState {
    meshes: Vec<GpuMesh>,
    vertex_buffers: Vec<wgpu::Buffer>,
}

impl VertexState {
    /// Uploads positions, normals and indices of every record and prepares a
    /// pipeline variant for each distinct layout.
    pub fn create(
        ctx: &RenderCtx<'_>,
        program: &mut Program,
        meshes: &MeshSet,
        plan: &VertexPlan,
    ) -> Result<Self, MeshError> {
        let mut gpu_meshes = Vec::with_capacity(plan.vertex_array_count());
        let mut vertex_buffers = Vec::with_capacity(plan.vertex_buffer_count());

        for (i, (record, layout)) in meshes.iter().zip(plan.layouts()).enumerate() {
            let (position, normal) = record.position_and_normal(i)?;

            vertex_buffers.push(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("sphere mesh {i} positions")),
                contents: &position.data,
                usage: wgpu::BufferUsages::VERTEX,
            }));
            vertex_buffers.push(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("sphere mesh {i} normals")),
                contents: &normal.data,
                usage: wgpu::BufferUsages::VERTEX,
            }));

            let index_buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("sphere mesh {i} indices")),
                contents: bytemuck::cast_slice(&record.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

            program.ensure_pipeline(ctx.device, layout.key);

            log::debug!(
                "mesh {i}: {} + {} vertex bytes, {} indices",
                position.size(),
                normal.size(),
                layout.index_count
            );

            gpu_meshes.push(GpuMesh { key: layout.key, index_buffer });
        }

        log::info!(
            "created {} vertex array(s) and {} vertex buffer(s)",
            gpu_meshes.len(),
            vertex_buffers.len()
        );

        Ok(Self { meshes: gpu_meshes, vertex_buffers })
    }

    #[inline]
    pub fn vertex_array_count(&self) -> usize {
        self.meshes.len()
    }

    #[inline]
    pub fn vertex_buffer_count(&self) -> usize {
        self.vertex_buffers.len()
    }

    pub fn mesh(&self, index: usize) -> Option<&GpuMesh> {
        self.meshes.get(index)
    }

    /// Binds mesh `index` (vertex buffers at their attribute slots, index
    /// buffer) into `pass`. Returns `false` if there is no such mesh.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>, index: usize) -> bool {
        let (Some(mesh), Some(positions), Some(normals)) = (
            self.meshes.get(index),
            self.vertex_buffers.get(2 * index),
            self.vertex_buffers.get(2 * index + 1),
        ) else {
            return false;
        };

        pass.set_vertex_buffer(ATTRIB_COORDS, positions.slice(..));
        pass.set_vertex_buffer(ATTRIB_NORMALS, normals.slice(..));
        pass.set_index_buffer(mesh.index_buffer.slice(..), INDEX_FORMAT);
        true
    }
}

impl Drop for VertexState {
    fn drop(&mut self) {
        for buffer in &self.vertex_buffers {
            buffer.destroy();
        }
        for mesh in &self.meshes {
            mesh.index_buffer.destroy();
        }
        log::info!(
            "released {} vertex array(s), {} vertex buffer(s) and {} index buffer(s)",
            self.meshes.len(),
            self.vertex_buffers.len(),
            self.meshes.len()
        );
    }
}
