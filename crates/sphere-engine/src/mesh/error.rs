use std::path::PathBuf;

use thiserror::Error;

/// Failure while loading or validating mesh data.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("failed to import scene file {path}")]
    Import {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("scene file {path} contains no mesh primitives")]
    Empty { path: PathBuf },

    #[error("mesh set has no geometry records")]
    NoRecords,

    #[error("geometry record {record} has no \"{attribute}\" attribute")]
    MissingAttribute {
        record: usize,
        attribute: &'static str,
    },

    #[error(
        "geometry record {record}: attribute \"{attribute}\" has unsupported layout \
         ({components} x {element:?})"
    )]
    UnsupportedLayout {
        record: usize,
        attribute: &'static str,
        components: u32,
        element: super::ElementType,
    },

    #[error(
        "geometry record {record}: attribute \"{attribute}\" holds {element:?} data \
         but the vertex shader reads it as {expected:?}"
    )]
    ElementMismatch {
        record: usize,
        attribute: &'static str,
        element: super::ElementType,
        expected: super::ElementType,
    },

    #[error("geometry record {record} has no vertices or no indices")]
    EmptyRecord { record: usize },

    #[error("geometry record {record} uses primitive mode {mode}, which cannot be rendered")]
    UnsupportedTopology { record: usize, mode: String },

    #[error(
        "geometry record {record} references vertex {index}, which is out of range for 16-bit indices or the vertex streams"
    )]
    IndexOverflow { record: usize, index: u32 },

    #[error(
        "geometry record {record} is a strip and uses index 65535, which wgpu treats as a strip restart"
    )]
    StripRestartIndex { record: usize },

    #[error("geometry record {record}: index count {count} exceeds the index buffer")]
    IndexCountMismatch { record: usize, count: u32 },
}
