//! Mesh source.
//!
//! Turns a scene-description file into an ordered list of [`GeometryRecord`]s.
//! The file format itself (glTF) is delegated to the `gltf` crate; this module
//! only reshapes its output into owned attribute/index buffers that the GPU
//! layer uploads.

mod error;
mod loader;
mod record;

pub use error::MeshError;
pub use loader::MeshSet;
pub use record::{
    AttributeBuffer, ElementType, GeometryRecord, Topology, ATTRIBUTE_NORMAL, ATTRIBUTE_POSITION,
};

#[cfg(test)]
pub(crate) use record::tests::triangle as triangle_fixture;
