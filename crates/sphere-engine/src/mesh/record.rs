use std::collections::HashMap;

use super::MeshError;

/// Attribute key for vertex coordinates.
pub const ATTRIBUTE_POSITION: &str = "POSITION";

/// Attribute key for vertex normals.
pub const ATTRIBUTE_NORMAL: &str = "NORMAL";

/// Scalar type of a single attribute component.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ElementType {
    F32,
    U32,
    I32,
}

impl ElementType {
    /// Size of one component in bytes.
    pub const fn size(self) -> u32 {
        4
    }
}

/// How consecutive indices are assembled into primitives.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

impl Topology {
    pub fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Topology::Points => wgpu::PrimitiveTopology::PointList,
            Topology::Lines => wgpu::PrimitiveTopology::LineList,
            Topology::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
            Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }

    /// Strip topologies need the index format baked into the pipeline.
    pub fn is_strip(self) -> bool {
        matches!(self, Topology::LineStrip | Topology::TriangleStrip)
    }
}

/// One named vertex attribute stream.
///
/// `components` is the element stride expressed as a component count
/// (e.g. 3 for a `vec3`). Data is tightly packed.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeBuffer {
    pub components: u32,
    pub element: ElementType,
    pub data: Vec<u8>,
}

impl AttributeBuffer {
    /// Builds a tightly packed `f32` stream from fixed-size vectors.
    pub fn from_f32<const N: usize>(values: &[[f32; N]]) -> Self {
        Self {
            components: N as u32,
            element: ElementType::F32,
            data: bytemuck::cast_slice(values).to_vec(),
        }
    }

    /// Size of the stream in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Number of vertices held by the stream.
    pub fn vertex_count(&self) -> usize {
        let stride = (self.components * self.element.size()) as usize;
        if stride == 0 { 0 } else { self.data.len() / stride }
    }

    /// Maps the declared stride and element type to a vertex format.
    pub fn vertex_format(&self) -> Option<wgpu::VertexFormat> {
        use wgpu::VertexFormat as F;

        let format = match (self.element, self.components) {
            (ElementType::F32, 1) => F::Float32,
            (ElementType::F32, 2) => F::Float32x2,
            (ElementType::F32, 3) => F::Float32x3,
            (ElementType::F32, 4) => F::Float32x4,
            (ElementType::U32, 1) => F::Uint32,
            (ElementType::U32, 2) => F::Uint32x2,
            (ElementType::U32, 3) => F::Uint32x3,
            (ElementType::U32, 4) => F::Uint32x4,
            (ElementType::I32, 1) => F::Sint32,
            (ElementType::I32, 2) => F::Sint32x2,
            (ElementType::I32, 3) => F::Sint32x3,
            (ElementType::I32, 4) => F::Sint32x4,
            _ => return None,
        };
        Some(format)
    }
}

/// A single drawable mesh as produced by the mesh source.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryRecord {
    pub name: Option<String>,
    pub attributes: HashMap<String, AttributeBuffer>,
    pub indices: Vec<u16>,
    pub index_count: u32,
    pub topology: Topology,
}

impl GeometryRecord {
    pub fn attribute(&self, name: &str) -> Option<&AttributeBuffer> {
        self.attributes.get(name)
    }

    /// Returns the position and normal streams, or the first one missing.
    ///
    /// `record` is the position of this record in its sequence, used for
    /// error reporting only.
    pub fn position_and_normal(
        &self,
        record: usize,
    ) -> Result<(&AttributeBuffer, &AttributeBuffer), MeshError> {
        let position = self
            .attribute(ATTRIBUTE_POSITION)
            .ok_or(MeshError::MissingAttribute { record, attribute: ATTRIBUTE_POSITION })?;
        let normal = self
            .attribute(ATTRIBUTE_NORMAL)
            .ok_or(MeshError::MissingAttribute { record, attribute: ATTRIBUTE_NORMAL })?;
        Ok((position, normal))
    }

    /// Checks everything the GPU upload relies on.
    pub fn validate(&self, record: usize) -> Result<(), MeshError> {
        let (position, normal) = self.position_and_normal(record)?;

        for (attribute, stream) in [(ATTRIBUTE_POSITION, position), (ATTRIBUTE_NORMAL, normal)] {
            if stream.vertex_format().is_none() {
                return Err(MeshError::UnsupportedLayout {
                    record,
                    attribute,
                    components: stream.components,
                    element: stream.element,
                });
            }
        }

        if position.vertex_count() == 0 || self.index_count == 0 {
            return Err(MeshError::EmptyRecord { record });
        }

        if self.index_count as usize > self.indices.len() {
            return Err(MeshError::IndexCountMismatch { record, count: self.index_count });
        }

        // Every index must address both streams.
        let vertex_count = position.vertex_count().min(normal.vertex_count());
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MeshError::IndexOverflow { record, index: index as u32 });
        }

        // Strip pipelines bake the index format in, making 0xFFFF a restart marker.
        if self.topology.is_strip() && self.indices.contains(&u16::MAX) {
            return Err(MeshError::StripRestartIndex { record });
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A single triangle with positions and normals.
    pub(crate) fn triangle() -> GeometryRecord {
        let mut attributes = HashMap::new();
        attributes.insert(
            ATTRIBUTE_POSITION.to_string(),
            AttributeBuffer::from_f32(&[[0.0, 0.5, 0.0], [0.5, -0.5, 0.0], [-0.5, -0.5, 0.0]]),
        );
        attributes.insert(
            ATTRIBUTE_NORMAL.to_string(),
            AttributeBuffer::from_f32(&[[0.0, 0.0, -1.0]; 3]),
        );
        GeometryRecord {
            name: Some("triangle".into()),
            attributes,
            indices: vec![0, 1, 2],
            index_count: 3,
            topology: Topology::Triangles,
        }
    }

    #[test]
    fn f32_stream_size_and_count() {
        let buf = AttributeBuffer::from_f32(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(buf.size(), 24);
        assert_eq!(buf.components, 3);
        assert_eq!(buf.vertex_count(), 2);
        assert_eq!(buf.vertex_format(), Some(wgpu::VertexFormat::Float32x3));
    }

    #[test]
    fn five_components_have_no_format() {
        let buf = AttributeBuffer { components: 5, element: ElementType::F32, data: vec![0; 20] };
        assert_eq!(buf.vertex_format(), None);
    }

    #[test]
    fn valid_triangle_passes() {
        triangle().validate(0).unwrap();
    }

    #[test]
    fn missing_normal_is_reported() {
        let mut rec = triangle();
        rec.attributes.remove(ATTRIBUTE_NORMAL);
        let err = rec.validate(4).unwrap_err();
        assert!(matches!(
            err,
            MeshError::MissingAttribute { record: 4, attribute: ATTRIBUTE_NORMAL }
        ));
    }

    #[test]
    fn missing_position_is_reported_first() {
        let mut rec = triangle();
        rec.attributes.clear();
        let err = rec.validate(0).unwrap_err();
        assert!(matches!(err, MeshError::MissingAttribute { attribute: ATTRIBUTE_POSITION, .. }));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut rec = triangle();
        rec.indices = vec![0, 1, 3];
        assert!(matches!(rec.validate(0), Err(MeshError::IndexOverflow { index: 3, .. })));
    }

    #[test]
    fn index_count_beyond_buffer_is_rejected() {
        let mut rec = triangle();
        rec.index_count = 6;
        assert!(matches!(rec.validate(0), Err(MeshError::IndexCountMismatch { count: 6, .. })));
    }

    #[test]
    fn record_without_indices_is_empty() {
        let mut rec = triangle();
        rec.indices.clear();
        rec.index_count = 0;
        assert!(matches!(rec.validate(1), Err(MeshError::EmptyRecord { record: 1 })));
    }

    fn long_strip(topology: Topology) -> GeometryRecord {
        let vertices = vec![[0.0f32; 3]; 65_536];
        let mut rec = triangle();
        rec.attributes.insert(ATTRIBUTE_POSITION.to_string(), AttributeBuffer::from_f32(&vertices));
        rec.attributes.insert(ATTRIBUTE_NORMAL.to_string(), AttributeBuffer::from_f32(&vertices));
        rec.indices = vec![65_533, 65_534, 65_535];
        rec.index_count = 3;
        rec.topology = topology;
        rec
    }

    #[test]
    fn strip_using_restart_index_is_rejected() {
        let rec = long_strip(Topology::TriangleStrip);
        assert!(matches!(rec.validate(0), Err(MeshError::StripRestartIndex { record: 0 })));
        assert!(matches!(
            long_strip(Topology::LineStrip).validate(2),
            Err(MeshError::StripRestartIndex { record: 2 })
        ));
    }

    #[test]
    fn list_may_use_last_16_bit_index() {
        long_strip(Topology::Triangles).validate(0).unwrap();
    }

    #[test]
    fn strips_are_flagged() {
        assert!(Topology::TriangleStrip.is_strip());
        assert!(Topology::LineStrip.is_strip());
        assert!(!Topology::Triangles.is_strip());
        assert_eq!(Topology::Triangles.to_wgpu(), wgpu::PrimitiveTopology::TriangleList);
    }
}
