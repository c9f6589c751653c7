use std::sync::Arc;

use corelib::Vec3;

use crate::shader::ShaderProgram;
use crate::texture::Texture;

/// Optional texture per MTL map. Only `diffuse` is sampled when drawing.
#[derive(Clone, Debug, Default)]
pub struct TextureSlots {
    pub diffuse: Option<Arc<Texture>>,
    pub ambient: Option<Arc<Texture>>,
    pub specular: Option<Arc<Texture>>,
    pub specular_highlight: Option<Arc<Texture>>,
    pub bump: Option<Arc<Texture>>,
    pub displacement: Option<Arc<Texture>>,
    pub alpha: Option<Arc<Texture>>,
}

impl TextureSlots {
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Texture>> {
        [
            &self.diffuse,
            &self.ambient,
            &self.specular,
            &self.specular_highlight,
            &self.bump,
            &self.displacement,
            &self.alpha,
        ]
        .into_iter()
        .flatten()
    }

    pub fn into_textures(self) -> impl Iterator<Item = Arc<Texture>> {
        [
            self.diffuse,
            self.ambient,
            self.specular,
            self.specular_highlight,
            self.bump,
            self.displacement,
            self.alpha,
        ]
        .into_iter()
        .flatten()
    }
}

/// Surface description: the program to draw with plus MTL-style
/// parameters.
#[derive(Clone, Debug)]
pub struct Material {
    pub shader: Arc<ShaderProgram>,
    pub enable_color: bool,
    pub color_ambient: Vec3,
    pub color_diffuse: Vec3,
    pub color_specular: Vec3,
    pub color_transmittance: Vec3,
    pub color_emission: Vec3,
    pub specular_exponent: f32,
    pub index_of_refraction: f32,
    pub opacity: f32,
    pub textures: TextureSlots,
}

impl Material {
    /// White flat-colour material drawn with `shader`.
    pub fn new(shader: Arc<ShaderProgram>) -> Self {
        Self {
            shader,
            enable_color: true,
            color_ambient: Vec3::ZERO,
            color_diffuse: Vec3::ONE,
            color_specular: Vec3::ZERO,
            color_transmittance: Vec3::ZERO,
            color_emission: Vec3::ZERO,
            specular_exponent: 0.0,
            index_of_refraction: 1.0,
            opacity: 1.0,
            textures: TextureSlots::default(),
        }
    }

    pub fn with_diffuse_color(mut self, color: Vec3) -> Self {
        self.color_diffuse = color;
        self
    }

    pub fn with_diffuse_texture(mut self, texture: Arc<Texture>) -> Self {
        self.textures.diffuse = Some(texture);
        self
    }

    #[inline]
    pub fn diffuse_texture(&self) -> Option<&Arc<Texture>> {
        self.textures.diffuse.as_ref()
    }
}
