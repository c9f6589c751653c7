//! Meshes bound to materials, plus a transform and the local bounding box.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use asset::{FileReader, ObjLoadOptions, ObjMaterial};
use corelib::{BoundingBox, CoreError, Mat4, RenderState, Transform, Vec3};

use crate::backend::GraphicsBackend;
use crate::context::RenderContext;
use crate::error::RenderResult;
use crate::material::{Material, TextureSlots};
use crate::mesh::Mesh;
use crate::shader::{ShaderProgram, Uniform};
use crate::texture::Texture;

/// Wireframe colour of the bounding-box overlay.
pub const BOUNDING_BOX_COLOR: Vec3 = Vec3::new(1.0, 0.0, 0.0);

#[derive(Debug)]
pub struct Model {
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
    mesh_to_material: Vec<usize>,
    transform: Transform,
    bounding_box: BoundingBox,
}

impl Model {
    /// Mesh `i` is drawn with `materials[mesh_to_material[i]]`.
    pub fn new(
        meshes: Vec<Mesh>,
        materials: Vec<Material>,
        mesh_to_material: Vec<usize>,
    ) -> Result<Self, CoreError> {
        if mesh_to_material.len() != meshes.len() {
            return Err(CoreError::MappingLengthMismatch {
                meshes: meshes.len(),
                mapping: mesh_to_material.len(),
            });
        }
        if let Some((mesh, &index)) = mesh_to_material
            .iter()
            .enumerate()
            .find(|(_, i)| **i >= materials.len())
        {
            return Err(CoreError::MaterialIndexOutOfRange {
                mesh,
                index,
                materials: materials.len(),
            });
        }

        let bounding_box = meshes
            .iter()
            .map(Mesh::bounds)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();

        Ok(Self {
            meshes,
            materials,
            mesh_to_material,
            transform: Transform::identity(),
            bounding_box,
        })
    }

    /// Every mesh drawn with the default material.
    pub fn with_default_material<B: GraphicsBackend>(
        ctx: &mut RenderContext<B>,
        meshes: Vec<Mesh>,
    ) -> RenderResult<Self> {
        let material = ctx.defaults.material(&mut ctx.backend)?;
        let mapping = vec![0; meshes.len()];
        Ok(Self::new(meshes, vec![material], mapping)?)
    }

    /// One mesh per OBJ shape, one material per MTL record. Shapes without
    /// a material use a default material appended after the MTL ones.
    pub fn from_obj_file<B: GraphicsBackend>(
        ctx: &mut RenderContext<B>,
        path: impl AsRef<Path>,
        options: ObjLoadOptions,
    ) -> RenderResult<Self> {
        let path = path.as_ref();
        let scene = asset::load_obj(ctx.file_reader.as_ref(), path, options)?;
        let shader = ctx.defaults.shader(&mut ctx.backend)?;

        let mut textures = TextureCache::default();
        let mut materials = Vec::with_capacity(scene.materials.len() + 1);
        for m in &scene.materials {
            let slots = textures.load_slots(&mut ctx.backend, ctx.file_reader.as_ref(), m)?;
            materials.push(material_from_obj(Arc::clone(&shader), m, slots));
        }

        let default_index = materials.len();
        let mut meshes = Vec::with_capacity(scene.shapes.len());
        let mut mapping = Vec::with_capacity(scene.shapes.len());
        for shape in scene.shapes {
            if shape.mesh.positions.is_empty() {
                log::warn!("Skipping empty shape '{}' in {}", shape.name, path.display());
                continue;
            }
            mapping.push(shape.material.unwrap_or(default_index));
            meshes.push(Mesh::new(&mut ctx.backend, shape.mesh)?);
        }
        if mapping.contains(&default_index) {
            materials.push(Material::new(shader));
        }

        log::info!(
            "Loaded model {}: {} meshes, {} materials",
            path.display(),
            meshes.len(),
            materials.len()
        );
        Ok(Self::new(meshes, materials, mapping)?)
    }

    #[inline]
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    #[inline]
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Materials can be retinted or retextured; the mapping stays fixed.
    #[inline]
    pub fn materials_mut(&mut self) -> &mut [Material] {
        &mut self.materials
    }

    #[inline]
    pub fn mesh_to_material(&self) -> &[usize] {
        &self.mesh_to_material
    }

    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }

    #[inline]
    pub fn rotation(&self) -> Vec3 {
        self.transform.rotation_euler
    }

    #[inline]
    pub fn scale(&self) -> Vec3 {
        self.transform.scale
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.transform.translation = position;
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.transform.translate(delta);
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.transform.rotation_euler = rotation;
    }

    pub fn rotate(&mut self, delta: Vec3) {
        self.transform.rotate(delta);
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.transform.scale = scale;
    }

    pub fn scale_by(&mut self, factor: Vec3) {
        self.transform.scale_by(factor);
    }

    #[inline]
    pub fn model_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }

    /// Union of the meshes' vertex extents, before any transform.
    #[inline]
    pub fn local_bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    /// The local box with only its min and max corners mapped through the
    /// model matrix. Not a bound of the rotated box.
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box.transform_corners(&self.model_matrix())
    }

    pub fn draw<B: GraphicsBackend>(&self, ctx: &mut RenderContext<B>) -> RenderResult<()> {
        let model = self.model_matrix();
        for (mesh, &index) in self.meshes.iter().zip(&self.mesh_to_material) {
            draw_mesh(&mut ctx.backend, &ctx.state, mesh, &self.materials[index], &model)?;
        }
        Ok(())
    }

    /// Wireframe unit cube stretched to the local box and placed with the
    /// model's transform. The previous fill mode is restored afterwards.
    pub fn draw_bounding_box<B: GraphicsBackend>(&self, ctx: &mut RenderContext<B>) -> RenderResult<()> {
        let cube = ctx.defaults.cube_mesh(&mut ctx.backend)?;
        let material = ctx
            .defaults
            .material(&mut ctx.backend)?
            .with_diffuse_color(BOUNDING_BOX_COLOR);

        let mut transform = Transform::identity();
        transform.scale = self.bounding_box.size();
        transform.translate(self.transform.translation);
        transform.scale_by(self.transform.scale);
        transform.rotate(self.transform.rotation_euler);

        let fill = ctx.fill();
        ctx.set_fill(false)?;
        let drawn = draw_mesh(&mut ctx.backend, &ctx.state, &cube, &material, &transform.matrix());
        ctx.set_fill(fill)?;
        drawn
    }

    /// Deletes the meshes. Textures and programs are deleted only where
    /// this model held the last reference.
    pub fn destroy(self, gfx: &mut dyn GraphicsBackend) {
        for mesh in self.meshes {
            mesh.destroy(gfx);
        }

        // A handle shared inside this model unwraps on its last occurrence.
        for material in self.materials {
            for texture in material.textures.into_textures() {
                if let Ok(texture) = Arc::try_unwrap(texture) {
                    texture.destroy(gfx);
                }
            }
            if let Ok(program) = Arc::try_unwrap(material.shader) {
                program.destroy(gfx);
            }
        }
    }
}

/// Binds the material and draws one mesh.
fn draw_mesh(
    gfx: &mut dyn GraphicsBackend,
    state: &RenderState,
    mesh: &Mesh,
    material: &Material,
    model: &Mat4,
) -> RenderResult<()> {
    let shader: &ShaderProgram = &material.shader;
    gfx.use_program(Some(shader.id()))?;

    gfx.uniform_matrix4(shader.location(Uniform::Model), &model.to_cols_array())?;
    gfx.uniform_matrix4(shader.location(Uniform::View), &state.view.to_cols_array())?;
    gfx.uniform_matrix4(shader.location(Uniform::Projection), &state.projection.to_cols_array())?;

    let provided = shader.location(Uniform::DiffuseTextureProvided);
    match material.diffuse_texture() {
        Some(texture) if shader.has(Uniform::DiffuseTexture) => {
            gfx.uniform_i32(provided, 1)?;
            gfx.uniform_i32(shader.location(Uniform::DiffuseTexture), 0)?;
            gfx.bind_texture(0, Some(texture.id()))?;
        }
        _ => {
            gfx.uniform_i32(provided, 0)?;
            gfx.uniform_vec3(shader.location(Uniform::DiffuseColor), material.color_diffuse.to_array())?;
        }
    }

    mesh.draw(gfx)
}

/// Shares one upload between MTL slots that name the same file.
#[derive(Default)]
struct TextureCache {
    loaded: HashMap<PathBuf, Arc<Texture>>,
}

impl TextureCache {
    fn load(
        &mut self,
        gfx: &mut dyn GraphicsBackend,
        reader: &dyn FileReader,
        path: Option<&Path>,
    ) -> RenderResult<Option<Arc<Texture>>> {
        let Some(path) = path else { return Ok(None) };
        if let Some(texture) = self.loaded.get(path) {
            return Ok(Some(Arc::clone(texture)));
        }
        let texture = Arc::new(Texture::from_file(gfx, reader, path)?);
        self.loaded.insert(path.to_path_buf(), Arc::clone(&texture));
        Ok(Some(texture))
    }

    fn load_slots(
        &mut self,
        gfx: &mut dyn GraphicsBackend,
        reader: &dyn FileReader,
        m: &ObjMaterial,
    ) -> RenderResult<TextureSlots> {
        let t = &m.textures;
        Ok(TextureSlots {
            diffuse: self.load(gfx, reader, t.diffuse.as_deref())?,
            ambient: self.load(gfx, reader, t.ambient.as_deref())?,
            specular: self.load(gfx, reader, t.specular.as_deref())?,
            specular_highlight: self.load(gfx, reader, t.specular_highlight.as_deref())?,
            bump: self.load(gfx, reader, t.bump.as_deref())?,
            displacement: self.load(gfx, reader, t.displacement.as_deref())?,
            alpha: self.load(gfx, reader, t.alpha.as_deref())?,
        })
    }
}

fn material_from_obj(shader: Arc<ShaderProgram>, m: &ObjMaterial, textures: TextureSlots) -> Material {
    Material {
        shader,
        enable_color: true,
        color_ambient: m.ambient.into(),
        color_diffuse: m.diffuse.into(),
        color_specular: m.specular.into(),
        color_transmittance: m.transmittance.into(),
        color_emission: m.emission.into(),
        specular_exponent: m.shininess,
        index_of_refraction: m.ior,
        opacity: m.dissolve,
        textures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Call, RecordingBackend, ShaderStage};
    use asset::{MemoryReader, MeshData};

    fn ctx() -> RenderContext<RecordingBackend> {
        RenderContext::new(RecordingBackend::new(), 800, 600)
    }

    fn triangle() -> MeshData {
        MeshData::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
    }

    fn png(rgba: [u8; 4]) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(2, 2, image::Rgba(rgba)));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn single_triangle_takes_flat_color_path() {
        let mut ctx = ctx();
        let mesh = Mesh::new(&mut ctx.backend, triangle()).unwrap();
        let model = Model::with_default_material(&mut ctx, vec![mesh]).unwrap();
        let program = ctx.defaults.shader(&mut ctx.backend).unwrap();
        ctx.backend.take_calls();

        model.draw(&mut ctx).unwrap();
        let calls = ctx.backend.take_calls();

        let draws: Vec<_> = calls
            .iter()
            .filter(|c| matches!(c, Call::DrawArrays { .. } | Call::DrawElements { .. }))
            .collect();
        assert_eq!(draws, [&Call::DrawArrays { vertex_count: 3 }]);
        assert_eq!(calls[0], Call::UseProgram(Some(program.id())));
        assert!(calls.contains(&Call::UniformI32 {
            location: program.location(Uniform::DiffuseTextureProvided),
            value: 0,
        }));
        assert!(calls.contains(&Call::UniformVec3 {
            location: program.location(Uniform::DiffuseColor),
            value: [1.0, 1.0, 1.0],
        }));
        assert!(!calls.iter().any(|c| matches!(c, Call::BindTexture { .. })));
    }

    #[test]
    fn diffuse_texture_is_bound_to_unit_zero() {
        let mut ctx = ctx();
        let mesh = Mesh::new(&mut ctx.backend, triangle()).unwrap();
        let checker = ctx.defaults.checker_texture(&mut ctx.backend).unwrap();
        let material = ctx
            .defaults
            .material(&mut ctx.backend)
            .unwrap()
            .with_diffuse_texture(Arc::clone(&checker));
        let model = Model::new(vec![mesh], vec![material], vec![0]).unwrap();
        ctx.backend.take_calls();

        model.draw(&mut ctx).unwrap();
        let calls = ctx.backend.take_calls();
        let program = &model.materials()[0].shader;

        assert!(calls.contains(&Call::UniformI32 {
            location: program.location(Uniform::DiffuseTextureProvided),
            value: 1,
        }));
        assert!(calls.contains(&Call::BindTexture {
            unit: 0,
            texture: Some(checker.id()),
        }));
        assert!(!calls.iter().any(|c| matches!(c, Call::UniformVec3 { .. })));
    }

    #[test]
    fn texture_ignored_when_shader_lacks_sampler() {
        let vert = "#version 330 core\nin vec3 position;\nuniform mat4 model;\nvoid main() { gl_Position = model * vec4(position, 1.0); }";
        let frag = "#version 330 core\nuniform vec3 diffuse_color;\nuniform int diffuse_tex_provided;\nout vec4 c;\nvoid main() { c = vec4(diffuse_color, 1.0); }";

        let mut ctx = ctx();
        let mut builder = crate::shader::ShaderProgramBuilder::new();
        builder.add_shader(&mut ctx.backend, vert, ShaderStage::Vertex).unwrap();
        builder.add_shader(&mut ctx.backend, frag, ShaderStage::Fragment).unwrap();
        let program = Arc::new(builder.build(&mut ctx.backend).unwrap());
        assert!(!program.has(Uniform::DiffuseTexture));

        let checker = ctx.defaults.checker_texture(&mut ctx.backend).unwrap();
        let material = Material::new(Arc::clone(&program)).with_diffuse_texture(checker);
        let mesh = Mesh::new(&mut ctx.backend, triangle()).unwrap();
        let model = Model::new(vec![mesh], vec![material], vec![0]).unwrap();
        ctx.backend.take_calls();

        model.draw(&mut ctx).unwrap();
        let calls = ctx.backend.take_calls();

        let material_calls: Vec<_> = calls
            .iter()
            .filter(|c| matches!(c, Call::UniformI32 { .. } | Call::UniformVec3 { .. } | Call::BindTexture { .. }))
            .collect();
        assert_eq!(
            material_calls,
            [
                &Call::UniformI32 {
                    location: program.location(Uniform::DiffuseTextureProvided),
                    value: 0,
                },
                &Call::UniformVec3 {
                    location: program.location(Uniform::DiffuseColor),
                    value: [1.0, 1.0, 1.0],
                },
            ]
        );
        assert!(program.location(Uniform::DiffuseTextureProvided).is_some());
    }

    #[test]
    fn out_of_range_material_index_is_rejected() {
        let mut ctx = ctx();
        let mesh = Mesh::new(&mut ctx.backend, triangle()).unwrap();
        let material = ctx.defaults.material(&mut ctx.backend).unwrap();

        let err = Model::new(vec![mesh], vec![material], vec![1]).unwrap_err();
        assert_eq!(
            err,
            CoreError::MaterialIndexOutOfRange {
                mesh: 0,
                index: 1,
                materials: 1
            }
        );
    }

    #[test]
    fn mapping_must_cover_every_mesh() {
        let mut ctx = ctx();
        let mesh = Mesh::new(&mut ctx.backend, triangle()).unwrap();
        let err = Model::new(vec![mesh], vec![], vec![]).unwrap_err();
        assert_eq!(err, CoreError::MappingLengthMismatch { meshes: 1, mapping: 0 });
    }

    #[test]
    fn bounding_box_spans_all_meshes() {
        let mut ctx = ctx();
        let a = Mesh::new(
            &mut ctx.backend,
            MeshData::new(vec![[1.0, 1.0, 1.0], [2.0, 2.0, 2.0], [1.5, 1.0, 2.0]]),
        )
        .unwrap();
        let b = Mesh::new(
            &mut ctx.backend,
            MeshData::new(vec![[-3.0, -2.0, -1.0], [-2.0, -1.0, -1.0], [-2.0, -2.0, -0.5]]),
        )
        .unwrap();
        let mut model = Model::with_default_material(&mut ctx, vec![a, b]).unwrap();

        let local = model.local_bounding_box();
        assert_eq!(local.min, Vec3::new(-3.0, -2.0, -1.0));
        assert_eq!(local.max, Vec3::new(2.0, 2.0, 2.0));

        model.set_position(Vec3::new(10.0, 0.0, 0.0));
        model.set_scale(Vec3::splat(2.0));
        let world = model.bounding_box();
        assert_eq!(world.min, Vec3::new(4.0, -4.0, -2.0));
        assert_eq!(world.max, Vec3::new(14.0, 4.0, 4.0));
    }

    #[test]
    fn rotated_bounding_box_maps_only_two_corners() {
        let mut ctx = ctx();
        let mesh = Mesh::new(&mut ctx.backend, MeshData::unit_cube()).unwrap();
        let mut model = Model::with_default_material(&mut ctx, vec![mesh]).unwrap();
        model.set_rotation(Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0));

        let world = model.bounding_box();
        assert!((world.min - Vec3::new(-0.5, -0.5, 0.5)).length() < 1e-5, "{world:?}");
        assert!((world.max - Vec3::new(0.5, 0.5, -0.5)).length() < 1e-5, "{world:?}");
        assert!(world.min.z > world.max.z);
    }

    #[test]
    fn movers_accumulate() {
        let mut ctx = ctx();
        let mesh = Mesh::new(&mut ctx.backend, triangle()).unwrap();
        let mut model = Model::with_default_material(&mut ctx, vec![mesh]).unwrap();

        model.translate(Vec3::new(1.0, 0.0, 0.0));
        model.translate(Vec3::new(0.0, 2.0, 0.0));
        model.rotate(Vec3::new(0.0, 0.5, 0.0));
        model.rotate(Vec3::new(0.0, 0.25, 0.0));
        model.scale_by(Vec3::new(2.0, 3.0, 4.0));

        assert_eq!(model.position(), Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(model.rotation(), Vec3::new(0.0, 0.75, 0.0));
        assert_eq!(model.scale(), Vec3::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn bounding_box_draws_in_wireframe_and_restores_fill() {
        let mut ctx = ctx();
        let mesh = Mesh::new(&mut ctx.backend, triangle()).unwrap();
        let model = Model::with_default_material(&mut ctx, vec![mesh]).unwrap();
        ctx.backend.take_calls();

        model.draw_bounding_box(&mut ctx).unwrap();
        model.draw_bounding_box(&mut ctx).unwrap();
        let calls = ctx.backend.take_calls();

        let modes: Vec<_> = calls
            .iter()
            .filter_map(|c| match c {
                Call::PolygonMode { fill } => Some(*fill),
                _ => None,
            })
            .collect();
        assert_eq!(modes, [false, true, false, true]);
        assert!(ctx.fill());

        // The cube is built once and drawn indexed both times.
        let cube_uploads = calls.iter().filter(|c| matches!(c, Call::CreateVertexArray(_))).count();
        assert_eq!(cube_uploads, 1);
        let indexed = calls
            .iter()
            .filter(|c| **c == Call::DrawElements { index_count: 36 })
            .count();
        assert_eq!(indexed, 2);
        assert!(calls.contains(&Call::UniformVec3 {
            location: model.materials()[0].shader.location(Uniform::DiffuseColor),
            value: [1.0, 0.0, 0.0],
        }));
    }

    const OBJ: &str = "\
mtllib scene.mtl
o plain
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
f 1/1 2/2 3/3
o painted
usemtl painted
f 1/1 3/3 2/2
";

    const MTL: &str = "\
newmtl painted
Kd 0.2 0.4 0.6
map_Kd skin.png
map_Ka skin.png
";

    #[test]
    fn obj_model_uses_mtl_and_default_materials() {
        let mut ctx = ctx();
        ctx.set_file_reader(
            MemoryReader::new()
                .with("assets/scene.obj", OBJ)
                .with("assets/scene.mtl", MTL)
                .with("assets/skin.png", png([10, 20, 30, 255])),
        );

        let model = Model::from_obj_file(&mut ctx, "assets/scene.obj", ObjLoadOptions::default()).unwrap();
        assert_eq!(model.meshes().len(), 2);
        assert_eq!(model.materials().len(), 2);
        assert_eq!(model.mesh_to_material(), &[1, 0]);

        let painted = &model.materials()[0];
        assert_eq!(painted.color_diffuse, Vec3::new(0.2, 0.4, 0.6));
        let diffuse = painted.textures.diffuse.as_ref().unwrap();
        let ambient = painted.textures.ambient.as_ref().unwrap();
        assert!(Arc::ptr_eq(diffuse, ambient));

        let fallback = &model.materials()[1];
        assert!(fallback.diffuse_texture().is_none());
        assert_eq!(fallback.color_diffuse, Vec3::ONE);

        let uploads = ctx
            .backend
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::TexImage2d { .. }))
            .count();
        assert_eq!(uploads, 1);
    }

    #[test]
    fn missing_texture_fails_the_load() {
        let mut ctx = ctx();
        ctx.set_file_reader(
            MemoryReader::new()
                .with("assets/scene.obj", OBJ)
                .with("assets/scene.mtl", MTL),
        );
        assert!(Model::from_obj_file(&mut ctx, "assets/scene.obj", ObjLoadOptions::default()).is_err());
    }

    #[test]
    fn destroy_keeps_shared_defaults_alive() {
        let mut ctx = ctx();
        let mesh = Mesh::new(&mut ctx.backend, triangle()).unwrap();
        let model = Model::with_default_material(&mut ctx, vec![mesh]).unwrap();

        model.destroy(&mut ctx.backend);
        // Only the default program remains, owned by the context.
        assert_eq!(ctx.backend.live_objects(), 1);

        let gfx = ctx.destroy();
        assert_eq!(gfx.live_objects(), 0);
    }
}
