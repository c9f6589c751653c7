//! Wavefront OBJ/MTL ingestion on top of `tobj`.
//!
//! All bytes, including referenced `.mtl` files, come through a
//! [`FileReader`], so models can be loaded from bundles as well as disk.
//! Faces are expanded into flat per-corner arrays (no index buffer).

use std::{
    io::{self, BufReader},
    path::{Component, Path, PathBuf},
};

use anyhow::{Context, Result};
use corelib::BoundingBox;

use crate::{mesh::MeshData, reader::FileReader};

#[derive(Clone, Copy, Debug)]
pub struct ObjLoadOptions {
    /// Recentre the positions and divide them by the model's X extent.
    pub normalize: bool,
}

impl Default for ObjLoadOptions {
    fn default() -> Self {
        Self { normalize: true }
    }
}

/// Texture maps named by an MTL record, already resolved to loadable paths.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialTextures {
    pub ambient: Option<PathBuf>,
    pub diffuse: Option<PathBuf>,
    pub specular: Option<PathBuf>,
    pub specular_highlight: Option<PathBuf>,
    pub bump: Option<PathBuf>,
    pub displacement: Option<PathBuf>,
    pub alpha: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjMaterial {
    pub name: String,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub transmittance: [f32; 3],
    pub emission: [f32; 3],
    pub shininess: f32,
    pub ior: f32,
    pub dissolve: f32,
    pub textures: MaterialTextures,
}

#[derive(Clone, Debug)]
pub struct ObjShape {
    pub name: String,
    pub mesh: MeshData,
    /// Index into [`ObjScene::materials`], `None` when no `usemtl` applies.
    pub material: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct ObjScene {
    pub shapes: Vec<ObjShape>,
    pub materials: Vec<ObjMaterial>,
}

/// Joins a texture name from an MTL file to the OBJ file's directory.
///
/// Names containing a `..` component are returned untouched.
pub fn resolve_texture_path(model_path: &Path, texture: &str) -> PathBuf {
    let texture = Path::new(texture);
    if texture.components().any(|c| c == Component::ParentDir) {
        return texture.to_path_buf();
    }
    match model_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(texture),
        _ => texture.to_path_buf(),
    }
}

/// Load an OBJ file (and the MTL files it references) through `reader`.
pub fn load_obj(reader: &dyn FileReader, path: &Path, options: ObjLoadOptions) -> Result<ObjScene> {
    log::info!("Loading OBJ {}", path.display());

    let bytes = reader
        .read(path)
        .with_context(|| format!("Failed to open OBJ file: {}", path.display()))?;
    let model_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };

    let (models, materials) = tobj::load_obj_buf(
        &mut BufReader::new(io::Cursor::new(bytes)),
        &load_options,
        |mtl_path| {
            let full = model_dir.join(mtl_path);
            match reader.read(&full) {
                Ok(mtl) => tobj::load_mtl_buf(&mut BufReader::new(io::Cursor::new(mtl))),
                Err(err) => {
                    log::warn!("Failed to read MTL {}: {err}", full.display());
                    Err(tobj::LoadError::OpenFileFailed)
                }
            }
        },
    )
    .with_context(|| format!("Failed to parse OBJ file: {}", path.display()))?;

    let materials = materials.unwrap_or_else(|err| {
        log::warn!("No materials for {}: {err}", path.display());
        Vec::new()
    });

    let mut shapes: Vec<ObjShape> = models
        .into_iter()
        .map(|model| ObjShape {
            mesh: expand_mesh(&model.mesh),
            material: model.mesh.material_id.filter(|&id| id < materials.len()),
            name: model.name,
        })
        .collect();

    if options.normalize {
        normalize_positions(&mut shapes);
    }

    let materials: Vec<ObjMaterial> = materials
        .iter()
        .map(|m| convert_material(path, m))
        .collect();

    log::info!(
        "OBJ {}: {} shapes, {} materials",
        path.display(),
        shapes.len(),
        materials.len()
    );

    Ok(ObjScene { shapes, materials })
}

fn expand_mesh(mesh: &tobj::Mesh) -> MeshData {
    // One vertex per face corner; the index buffer is dropped.
    let gather = |src: &[f32], width: usize| -> Vec<f32> {
        mesh.indices
            .iter()
            .flat_map(|&i| {
                let at = i as usize * width;
                src[at..at + width].to_vec()
            })
            .collect()
    };

    let positions = gather(&mesh.positions, 3);
    let normals = (!mesh.normals.is_empty()).then(|| gather(&mesh.normals, 3));
    let uvs = (!mesh.texcoords.is_empty()).then(|| gather(&mesh.texcoords, 2));
    MeshData::from_flat(&positions, None, normals.as_deref(), uvs.as_deref())
}

fn normalize_positions(shapes: &mut [ObjShape]) {
    let bounds = shapes
        .iter()
        .filter_map(|s| s.mesh.bounds())
        .reduce(|a, b| a.union(&b));
    let Some(BoundingBox { min, max }) = bounds else {
        return;
    };

    let size = max - min;
    if size.x == 0.0 {
        log::warn!("OBJ has zero width; skipping normalization");
        return;
    }

    // Every axis is divided by the X extent so proportions survive.
    for shape in shapes.iter_mut() {
        for p in shape.mesh.positions.iter_mut() {
            p[0] = (p[0] - size.x / 2.0 - min.x) / size.x;
            p[1] = (p[1] - size.y / 2.0 - min.y) / size.x;
            p[2] = (p[2] - size.z / 2.0 - min.z) / size.x;
        }
    }
}

fn parse_rgb(value: Option<&String>) -> Option<[f32; 3]> {
    let mut parts = value?.split_whitespace().map(str::parse::<f32>);
    Some([parts.next()?.ok()?, parts.next()?.ok()?, parts.next()?.ok()?])
}

fn convert_material(model_path: &Path, m: &tobj::Material) -> ObjMaterial {
    let tex = |name: Option<&String>| name.map(|n| resolve_texture_path(model_path, n));

    ObjMaterial {
        name: m.name.clone(),
        ambient: m.ambient.unwrap_or_default(),
        diffuse: m.diffuse.unwrap_or_default(),
        specular: m.specular.unwrap_or_default(),
        transmittance: parse_rgb(m.unknown_param.get("Tf")).unwrap_or_default(),
        emission: parse_rgb(m.unknown_param.get("Ke")).unwrap_or_default(),
        shininess: m.shininess.unwrap_or(1.0),
        ior: m.optical_density.unwrap_or(1.0),
        dissolve: m.dissolve.unwrap_or(1.0),
        textures: MaterialTextures {
            ambient: tex(m.ambient_texture.as_ref()),
            diffuse: tex(m.diffuse_texture.as_ref()),
            specular: tex(m.specular_texture.as_ref()),
            specular_highlight: tex(m.shininess_texture.as_ref()),
            bump: tex(m.normal_texture.as_ref()),
            displacement: tex(m.unknown_param.get("disp")),
            alpha: tex(m.dissolve_texture.as_ref()),
        },
    }
}
