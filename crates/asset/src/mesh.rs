//! CPU-side mesh representation used by loaders.

use corelib::{BoundingBox, Vec3};

/// Triangle geometry with independently optional attribute streams.
///
/// `positions` is required. Without `indices` every three consecutive
/// positions form one triangle. `normals` and `uvs`, when present, are per
/// vertex and parallel to `positions`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub indices: Option<Vec<u32>>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub uvs: Option<Vec<[f32; 2]>>,
}

impl MeshData {
    pub fn new(positions: Vec<[f32; 3]>) -> Self {
        Self {
            positions,
            ..Self::default()
        }
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn with_normals(mut self, normals: Vec<[f32; 3]>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_uvs(mut self, uvs: Vec<[f32; 2]>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    /// Builds mesh data from flat float arrays (3 floats per position or
    /// normal, 2 per uv). Trailing partial elements are dropped.
    pub fn from_flat(
        positions: &[f32],
        indices: Option<&[u32]>,
        normals: Option<&[f32]>,
        uvs: Option<&[f32]>,
    ) -> Self {
        let triples = |s: &[f32]| -> Vec<[f32; 3]> {
            s.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
        };
        Self {
            positions: triples(positions),
            indices: indices.map(<[u32]>::to_vec),
            normals: normals.map(triples),
            uvs: uvs.map(|s| s.chunks_exact(2).map(|c| [c[0], c[1]]).collect()),
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.as_ref().map_or(0, Vec::len)
    }

    #[inline]
    pub fn normal_count(&self) -> usize {
        self.normals.as_ref().map_or(0, Vec::len)
    }

    #[inline]
    pub fn uv_count(&self) -> usize {
        self.uvs.as_ref().map_or(0, Vec::len)
    }

    /// Returns `true` if there is at least one vertex to draw.
    pub fn is_valid(&self) -> bool {
        !self.positions.is_empty()
    }

    /// Raw vertex extents in object space.
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.positions.iter().copied().map(Vec3::from))
    }

    /// Unit cube centred on the origin, 8 corners and 12 triangles.
    pub fn unit_cube() -> Self {
        let mut positions = Vec::with_capacity(8);
        for z in 0..=1 {
            for y in 0..=1 {
                for x in 0..=1 {
                    positions.push([x as f32 - 0.5, y as f32 - 0.5, z as f32 - 0.5]);
                }
            }
        }

        #[rustfmt::skip]
        let indices = vec![
            0, 1, 2,  2, 1, 3,
            4, 5, 6,  6, 5, 7,
            2, 6, 3,  6, 7, 3,
            0, 1, 4,  4, 5, 1,
            1, 3, 7,  5, 1, 7,
            0, 6, 2,  0, 4, 6,
        ];

        Self::new(positions).with_indices(indices)
    }
}
