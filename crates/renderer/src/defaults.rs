//! Lazily built shared resources: the default program, placeholder
//! textures and the unit cube used for bounding-box overlays.
//!
//! Each slot is filled on first request and handed out as an `Arc`
//! afterwards. The slots are mutex-guarded so concurrent first calls
//! build at most one instance, but the backend itself still has to be
//! driven from the thread that owns the GL context.

use std::sync::Arc;

use asset::{MeshData, TextureData};
use parking_lot::Mutex;

use crate::backend::{GraphicsBackend, TextureFilter};
use crate::error::RenderResult;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::shader::{ShaderProgram, ShaderProgramBuilder};
use crate::texture::Texture;

pub const CHECKER_SIZE: u32 = 32;

#[derive(Debug, Default)]
pub struct Defaults {
    shader: Mutex<Option<Arc<ShaderProgram>>>,
    checker: Mutex<Option<Arc<Texture>>>,
    white: Mutex<Option<Arc<Texture>>>,
    cube: Mutex<Option<Arc<Mesh>>>,
}

fn get_or_try_init<T>(
    slot: &Mutex<Option<Arc<T>>>,
    init: impl FnOnce() -> RenderResult<T>,
) -> RenderResult<Arc<T>> {
    let mut guard = slot.lock();
    if let Some(value) = guard.as_ref() {
        return Ok(Arc::clone(value));
    }
    let value = Arc::new(init()?);
    *guard = Some(Arc::clone(&value));
    Ok(value)
}

/// Releases `value` if this was the last reference.
fn release<T>(value: Option<Arc<T>>, what: &str, destroy: impl FnOnce(T)) {
    let Some(value) = value else { return };
    match Arc::try_unwrap(value) {
        Ok(inner) => destroy(inner),
        Err(shared) => log::warn!(
            "Default {what} still has {} users, not released",
            Arc::strong_count(&shared) - 1
        ),
    }
}

impl Defaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shader(&self, gfx: &mut dyn GraphicsBackend) -> RenderResult<Arc<ShaderProgram>> {
        get_or_try_init(&self.shader, || {
            log::info!("Building default shader program");
            ShaderProgramBuilder::with_default_sources(gfx)?.build(gfx)
        })
    }

    /// Magenta/black checkerboard, sampled with nearest magnification so
    /// the cells stay sharp.
    pub fn checker_texture(&self, gfx: &mut dyn GraphicsBackend) -> RenderResult<Arc<Texture>> {
        get_or_try_init(&self.checker, || {
            let texture = Texture::from_data(gfx, &TextureData::checkerboard(CHECKER_SIZE))?;
            texture.set_mag_filter(gfx, TextureFilter::Nearest)?;
            Ok(texture)
        })
    }

    /// 1x1 opaque white.
    pub fn white_texture(&self, gfx: &mut dyn GraphicsBackend) -> RenderResult<Arc<Texture>> {
        get_or_try_init(&self.white, || {
            Texture::from_data(gfx, &TextureData::solid([255, 255, 255, 255]))
        })
    }

    /// Default program with a white flat colour and no textures.
    pub fn material(&self, gfx: &mut dyn GraphicsBackend) -> RenderResult<Material> {
        Ok(Material::new(self.shader(gfx)?))
    }

    pub fn cube_mesh(&self, gfx: &mut dyn GraphicsBackend) -> RenderResult<Arc<Mesh>> {
        get_or_try_init(&self.cube, || Mesh::new(gfx, MeshData::unit_cube()))
    }

    pub fn destroy(&self, gfx: &mut dyn GraphicsBackend) {
        release(self.cube.lock().take(), "cube mesh", |m| m.destroy(gfx));
        release(self.white.lock().take(), "white texture", |t| t.destroy(gfx));
        release(self.checker.lock().take(), "checker texture", |t| t.destroy(gfx));
        release(self.shader.lock().take(), "shader", |s| s.destroy(gfx));
    }
}
