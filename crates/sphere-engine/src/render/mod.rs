//! GPU rendering subsystem.
//!
//! Turns a [`MeshSet`](crate::mesh::MeshSet) and a linked
//! [`ProgramSource`](crate::shader::ProgramSource) into GPU-resident state and
//! draws it.
//!
//! Convention:
//! - mesh coordinates are clip-space positions; the vertex shader remaps z
//!   into wgpu's `[0, 1]` depth range
//! - front faces wind clockwise, back faces are culled
//! - indices are always 16-bit

mod ctx;
mod mesh_renderer;
mod uniforms;
mod vertex_state;

pub use ctx::RenderCtx;
pub use mesh_renderer::{DrawCall, MeshRenderer};
pub use uniforms::{LightParameters, Material, UniformState, LIGHT_PARAMETERS_SIZE};
pub use vertex_state::{GpuMesh, MeshLayout, VertexPlan, VertexState};

/// Index element type used for every draw.
pub const INDEX_FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint16;
