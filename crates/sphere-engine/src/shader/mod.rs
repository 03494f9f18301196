//! Shader loading, compilation and program linking.
//!
//! Shader stages are WGSL text files. Compilation runs through `naga` on the
//! CPU so that every source, compile or link failure is known before a window
//! or device exists. The GPU-side modules and pipelines are created later from
//! the already-validated source by [`Program`].
//!
//! Attribute binding contract:
//! - location [`ATTRIB_COORDS`] is the vertex input named [`COORDS_INPUT`]
//! - location [`ATTRIB_NORMALS`] is the vertex input named [`NORMALS_INPUT`]
//!
//! The same constants select the vertex buffer slot and the shader location
//! of each vertex layout.

mod error;
mod interface;
mod program;
mod source;
mod stage;

pub use error::ShaderError;
pub use interface::{ShaderInterface, UniformSlot};
pub use program::{PipelineKey, Program, ProgramSource};
pub use source::read_shader_source;
pub use stage::{compile_stage, load_stage, CompiledStage, StageKind};

/// Attribute slot (buffer slot and shader location) of vertex coordinates.
pub const ATTRIB_COORDS: u32 = 0;

/// Attribute slot (buffer slot and shader location) of vertex normals.
pub const ATTRIB_NORMALS: u32 = 1;

/// Vertex input name bound to [`ATTRIB_COORDS`].
pub const COORDS_INPUT: &str = "in_coords";

/// Vertex input name bound to [`ATTRIB_NORMALS`].
pub const NORMALS_INPUT: &str = "in_normals";

/// Uniform variable holding the 4-component diffuse color.
pub const DIFFUSE_COLOR_UNIFORM: &str = "diffuse_color";

/// Struct type name of the light uniform block.
pub const LIGHT_BLOCK: &str = "LightParameters";

// Vertex buffers are passed to wgpu as `[coords, normals]`, so the slot
// constants must match their array positions.
const _: () = assert!(ATTRIB_COORDS == 0 && ATTRIB_NORMALS == 1);
