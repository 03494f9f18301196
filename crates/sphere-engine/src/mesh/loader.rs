use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{
    AttributeBuffer, GeometryRecord, MeshError, Topology, ATTRIBUTE_NORMAL, ATTRIBUTE_POSITION,
};

/// Ordered sequence of geometry records loaded from one scene file.
///
/// Records are flattened in document order (mesh by mesh, primitive by
/// primitive). The set owns all vertex and index memory; dropping it frees
/// that memory exactly once.
#[derive(Debug)]
pub struct MeshSet {
    source: Option<PathBuf>,
    records: Vec<GeometryRecord>,
}

impl MeshSet {
    /// Imports and validates every mesh primitive of a glTF scene.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MeshError> {
        let path = path.as_ref();

        let (document, buffers, _images) = gltf::import(path).map_err(|source| {
            MeshError::Import {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let mut records = Vec::new();
        for mesh in document.meshes() {
            for primitive in mesh.primitives() {
                let index = records.len();
                let record = read_primitive(index, mesh.name(), &primitive, &buffers)?;
                log::debug!(
                    "record {index} ({}): {} indices, {:?}",
                    record.name.as_deref().unwrap_or("unnamed"),
                    record.index_count,
                    record.topology,
                );
                records.push(record);
            }
        }

        if records.is_empty() {
            return Err(MeshError::Empty { path: path.to_path_buf() });
        }

        log::info!("loaded {} geometry record(s) from {}", records.len(), path.display());

        Ok(Self {
            source: Some(path.to_path_buf()),
            records,
        })
    }

    /// Wraps records produced elsewhere. Every record is validated and the
    /// set must not be empty, as for [`load`](Self::load).
    pub fn from_records(records: Vec<GeometryRecord>) -> Result<Self, MeshError> {
        if records.is_empty() {
            return Err(MeshError::NoRecords);
        }
        for (index, record) in records.iter().enumerate() {
            record.validate(index)?;
        }
        Ok(Self { source: None, records })
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[GeometryRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeometryRecord> {
        self.records.iter()
    }
}

impl Drop for MeshSet {
    fn drop(&mut self) {
        log::debug!("released {} geometry record(s)", self.records.len());
    }
}

fn read_primitive(
    index: usize,
    mesh_name: Option<&str>,
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
) -> Result<GeometryRecord, MeshError> {
    let topology = map_mode(index, primitive.mode())?;
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let mut attributes = HashMap::new();
    let mut vertex_count = 0usize;

    if let Some(positions) = reader.read_positions() {
        let positions: Vec<[f32; 3]> = positions.collect();
        vertex_count = positions.len();
        attributes.insert(ATTRIBUTE_POSITION.to_string(), AttributeBuffer::from_f32(&positions));
    }

    if let Some(normals) = reader.read_normals() {
        let normals: Vec<[f32; 3]> = normals.collect();
        attributes.insert(ATTRIBUTE_NORMAL.to_string(), AttributeBuffer::from_f32(&normals));
    }

    // Non-indexed primitives draw their vertices in order.
    let wide: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..vertex_count as u32).collect(),
    };

    let indices = wide
        .into_iter()
        .map(|i| u16::try_from(i).map_err(|_| MeshError::IndexOverflow { record: index, index: i }))
        .collect::<Result<Vec<u16>, _>>()?;

    let record = GeometryRecord {
        name: mesh_name.map(String::from),
        attributes,
        index_count: indices.len() as u32,
        indices,
        topology,
    };
    record.validate(index)?;

    Ok(record)
}

fn map_mode(record: usize, mode: gltf::mesh::Mode) -> Result<Topology, MeshError> {
    use gltf::mesh::Mode;

    match mode {
        Mode::Points => Ok(Topology::Points),
        Mode::Lines => Ok(Topology::Lines),
        Mode::LineStrip => Ok(Topology::LineStrip),
        Mode::Triangles => Ok(Topology::Triangles),
        Mode::TriangleStrip => Ok(Topology::TriangleStrip),
        other => Err(MeshError::UnsupportedTopology {
            record,
            mode: format!("{other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::record::tests::triangle;

    /// Writes a one-triangle glTF (with a sibling `.bin`) into `dir`.
    fn write_triangle_gltf(dir: &Path, with_normals: bool, with_indices: bool, mode: u32) -> PathBuf {
        let positions: [[f32; 3]; 3] = [[0.0, 0.5, 0.0], [0.5, -0.5, 0.0], [-0.5, -0.5, 0.0]];
        let normals: [[f32; 3]; 3] = [[0.0, 0.0, -1.0]; 3];
        let indices: [u16; 4] = [0, 1, 2, 0]; // last entry is padding

        let mut bin = Vec::new();
        bin.extend_from_slice(bytemuck::cast_slice(&positions));
        bin.extend_from_slice(bytemuck::cast_slice(&normals));
        bin.extend_from_slice(bytemuck::cast_slice(&indices));
        std::fs::write(dir.join("tri.bin"), &bin).unwrap();

        let mut attributes = String::from(r#""POSITION": 0"#);
        if with_normals {
            attributes.push_str(r#", "NORMAL": 1"#);
        }
        let indices_field = if with_indices { r#", "indices": 2"# } else { "" };

        let json = format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "buffers": [{{ "uri": "tri.bin", "byteLength": {len} }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0,  "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 72, "byteLength": 6 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
       "min": [-0.5, -0.5, 0.0], "max": [0.5, 0.5, 0.0] }},
    {{ "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" }},
    {{ "bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ],
  "meshes": [{{ "name": "tri", "primitives": [{{ "attributes": {{ {attributes} }}{indices_field}, "mode": {mode} }}] }}]
}}"#,
            len = bin.len(),
        );

        let path = dir.join("tri.gltf");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn loads_indexed_triangle() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_triangle_gltf(dir.path(), true, true, 4);

        let set = MeshSet::load(&path).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.source(), Some(path.as_path()));

        let rec = &set.records()[0];
        assert_eq!(rec.name.as_deref(), Some("tri"));
        assert_eq!(rec.index_count, 3);
        assert_eq!(rec.indices, vec![0, 1, 2]);
        assert_eq!(rec.topology, Topology::Triangles);
        assert_eq!(rec.attribute(ATTRIBUTE_POSITION).unwrap().size(), 36);
        assert_eq!(rec.attribute(ATTRIBUTE_NORMAL).unwrap().components, 3);
    }

    #[test]
    fn non_indexed_primitive_gets_sequential_indices() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_triangle_gltf(dir.path(), true, false, 4);

        let set = MeshSet::load(&path).unwrap();
        assert_eq!(set.records()[0].indices, vec![0, 1, 2]);
    }

    #[test]
    fn primitive_without_normals_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_triangle_gltf(dir.path(), false, true, 4);

        let err = MeshSet::load(&path).unwrap_err();
        assert!(matches!(
            err,
            MeshError::MissingAttribute { record: 0, attribute: ATTRIBUTE_NORMAL }
        ));
    }

    #[test]
    fn triangle_fan_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_triangle_gltf(dir.path(), true, true, 6);

        let err = MeshSet::load(&path).unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedTopology { record: 0, .. }));
    }

    #[test]
    fn missing_scene_file_is_an_import_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MeshSet::load(dir.path().join("nope.gltf")).unwrap_err();
        assert!(matches!(err, MeshError::Import { .. }));
    }

    #[test]
    fn from_records_validates() {
        let mut bad = triangle();
        bad.attributes.remove(ATTRIBUTE_POSITION);

        assert_eq!(MeshSet::from_records(vec![triangle()]).unwrap().len(), 1);
        assert!(MeshSet::from_records(vec![triangle(), bad]).is_err());
    }

    #[test]
    fn from_records_rejects_empty_set() {
        assert!(matches!(MeshSet::from_records(Vec::new()), Err(MeshError::NoRecords)));
    }
}
