use asset::MeshData;
use corelib::BoundingBox;

use crate::backend::{BufferId, BufferTarget, GraphicsBackend, VertexArrayId};
use crate::error::{RenderError, RenderResult};
use crate::shader::attrib;

/// Mesh uploaded into one vertex array, one buffer per attribute stream.
#[derive(Debug)]
pub struct Mesh {
    data: MeshData,
    bounds: BoundingBox,
    vao: VertexArrayId,
    vbo: BufferId,
    ebo: Option<BufferId>,
    nbo: Option<BufferId>,
    tbo: Option<BufferId>,
}

impl Mesh {
    /// Uploads `data`. Positions are required; indices, normals and uvs
    /// are each uploaded only when present.
    pub fn new(gfx: &mut dyn GraphicsBackend, data: MeshData) -> RenderResult<Self> {
        let bounds = data.bounds().ok_or(RenderError::EmptyVertexBuffer)?;

        let vao = gfx.create_vertex_array()?;
        gfx.bind_vertex_array(Some(vao))?;

        let vbo = gfx.create_buffer()?;
        gfx.buffer_data(BufferTarget::Array, vbo, bytemuck::cast_slice(&data.positions))?;
        gfx.vertex_attrib_f32(attrib::POSITION, 3)?;

        let ebo = match &data.indices {
            Some(indices) => {
                let ebo = gfx.create_buffer()?;
                gfx.buffer_data(BufferTarget::ElementArray, ebo, bytemuck::cast_slice(indices))?;
                Some(ebo)
            }
            None => None,
        };

        let tbo = match &data.uvs {
            Some(uvs) => {
                let tbo = gfx.create_buffer()?;
                gfx.buffer_data(BufferTarget::Array, tbo, bytemuck::cast_slice(uvs))?;
                gfx.vertex_attrib_f32(attrib::UV, 2)?;
                Some(tbo)
            }
            None => None,
        };

        let nbo = match &data.normals {
            Some(normals) => {
                let nbo = gfx.create_buffer()?;
                gfx.buffer_data(BufferTarget::Array, nbo, bytemuck::cast_slice(normals))?;
                gfx.vertex_attrib_f32(attrib::NORMAL, 3)?;
                Some(nbo)
            }
            None => None,
        };

        gfx.bind_vertex_array(None)?;

        log::info!(
            "Created mesh: {} vertices, {} indices, {} normals, {} uvs",
            data.vertex_count(),
            data.index_count(),
            data.normal_count(),
            data.uv_count()
        );

        Ok(Self {
            data,
            bounds,
            vao,
            vbo,
            ebo,
            nbo,
            tbo,
        })
    }

    /// Indexed when the mesh has indices, otherwise one triangle per
    /// three vertices.
    pub fn draw(&self, gfx: &mut dyn GraphicsBackend) -> RenderResult<()> {
        gfx.bind_vertex_array(Some(self.vao))?;
        if self.is_indexed() {
            gfx.draw_elements(draw_count(self.data.index_count())?)
        } else {
            gfx.draw_arrays(draw_count(self.data.vertex_count())?)
        }
    }

    #[inline]
    pub fn data(&self) -> &MeshData {
        &self.data
    }

    /// Extents of the raw vertex positions.
    #[inline]
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.ebo.is_some()
    }

    pub fn destroy(self, gfx: &mut dyn GraphicsBackend) {
        for buffer in [Some(self.vbo), self.ebo, self.nbo, self.tbo].into_iter().flatten() {
            gfx.delete_buffer(buffer);
        }
        gfx.delete_vertex_array(self.vao);
    }
}

/// GL takes element counts as `GLsizei`.
fn draw_count(count: usize) -> RenderResult<i32> {
    i32::try_from(count).map_err(|_| RenderError::Create {
        what: "draw call",
        reason: format!("{count} elements exceed the GLsizei range"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Call, RecordingBackend};
    use corelib::Vec3;

    fn triangle() -> MeshData {
        MeshData::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
    }

    #[test]
    fn empty_positions_are_rejected() {
        let mut gfx = RecordingBackend::new();
        let err = Mesh::new(&mut gfx, MeshData::default()).unwrap_err();
        assert!(matches!(err, RenderError::EmptyVertexBuffer));
        assert!(gfx.calls().is_empty());
    }

    #[test]
    fn only_present_streams_are_uploaded() {
        let mut gfx = RecordingBackend::new();
        let mesh = Mesh::new(&mut gfx, triangle().with_uvs(vec![[0.0, 0.0]; 3])).unwrap();
        assert!(!mesh.is_indexed());

        let attribs: Vec<_> = gfx
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::VertexAttrib { location, components } => Some((*location, *components)),
                _ => None,
            })
            .collect();
        assert_eq!(attribs, [(attrib::POSITION, 3), (attrib::UV, 2)]);

        let position_upload = gfx.calls().iter().find_map(|c| match c {
            Call::BufferData { bytes, .. } => Some(*bytes),
            _ => None,
        });
        assert_eq!(position_upload, Some(3 * 3 * 4));
        assert_eq!(gfx.calls().last(), Some(&Call::BindVertexArray(None)));
    }

    #[test]
    fn draw_picks_indexed_path() {
        let mut gfx = RecordingBackend::new();
        let cube = Mesh::new(&mut gfx, MeshData::unit_cube()).unwrap();
        let tri = Mesh::new(&mut gfx, triangle()).unwrap();
        gfx.take_calls();

        cube.draw(&mut gfx).unwrap();
        tri.draw(&mut gfx).unwrap();

        let draws: Vec<_> = gfx
            .take_calls()
            .into_iter()
            .filter(|c| matches!(c, Call::DrawArrays { .. } | Call::DrawElements { .. }))
            .collect();
        assert_eq!(
            draws,
            [
                Call::DrawElements { index_count: 36 },
                Call::DrawArrays { vertex_count: 3 }
            ]
        );
    }

    #[test]
    fn bounds_and_release() {
        let mut gfx = RecordingBackend::new();
        let mesh = Mesh::new(
            &mut gfx,
            MeshData::unit_cube().with_normals(vec![[0.0, 1.0, 0.0]; 8]),
        )
        .unwrap();
        assert_eq!(mesh.bounds().min, Vec3::splat(-0.5));
        assert_eq!(mesh.bounds().max, Vec3::splat(0.5));

        mesh.destroy(&mut gfx);
        assert_eq!(gfx.live_objects(), 0);
    }

    #[test]
    fn draw_count_rejects_overflow() {
        assert_eq!(draw_count(36).unwrap(), 36);
        assert_eq!(draw_count(i32::MAX as usize).unwrap(), i32::MAX);
        assert!(matches!(
            draw_count(i32::MAX as usize + 1),
            Err(RenderError::Create { what: "draw call", .. })
        ));
    }
}
