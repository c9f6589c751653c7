//! GPU textures.

use std::path::Path;

use asset::{FileReader, PixelFormat, TextureData};

use crate::backend::{
    GraphicsBackend, ImageUpload, TextureFilter, TextureId, TextureParam, TextureWrap,
};
use crate::error::RenderResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureKind {
    TwoD,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Texture {
    id: TextureId,
    kind: TextureKind,
}

impl Texture {
    /// Uploads level 0, builds mipmaps, repeats in both directions and
    /// filters trilinearly.
    pub fn create_2d(
        gfx: &mut dyn GraphicsBackend,
        image: &TextureData,
        internal_format: PixelFormat,
    ) -> RenderResult<Self> {
        let id = gfx.create_texture()?;
        let upload = ImageUpload {
            width: image.width,
            height: image.height,
            internal_format,
            format: image.format,
            pixels: &image.data,
        };

        let configured = (|| {
            gfx.tex_image_2d(id, &upload)?;
            gfx.generate_mipmap(id)?;
            gfx.tex_parameter(id, TextureParam::WrapS(TextureWrap::Repeat))?;
            gfx.tex_parameter(id, TextureParam::WrapT(TextureWrap::Repeat))?;
            gfx.tex_parameter(id, TextureParam::MinFilter(TextureFilter::LinearMipmapLinear))?;
            gfx.tex_parameter(id, TextureParam::MagFilter(TextureFilter::Linear))
        })();
        if let Err(err) = configured {
            gfx.delete_texture(id);
            return Err(err);
        }

        log::debug!(
            "Created texture {:?} {}x{} {:?}",
            id,
            image.width,
            image.height,
            internal_format
        );
        Ok(Self {
            id,
            kind: TextureKind::TwoD,
        })
    }

    /// Stores the pixels in the format they arrived in.
    pub fn from_data(gfx: &mut dyn GraphicsBackend, image: &TextureData) -> RenderResult<Self> {
        Self::create_2d(gfx, image, image.format)
    }

    /// Reads and decodes an image through `reader`. The decoded pixels are
    /// dropped once uploaded.
    pub fn from_file(
        gfx: &mut dyn GraphicsBackend,
        reader: &dyn FileReader,
        path: &Path,
    ) -> RenderResult<Self> {
        let image = TextureData::load(reader, path)?;
        Self::from_data(gfx, &image)
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    pub fn set_mag_filter(&self, gfx: &mut dyn GraphicsBackend, filter: TextureFilter) -> RenderResult<()> {
        gfx.tex_parameter(self.id, TextureParam::MagFilter(filter))
    }

    pub fn destroy(self, gfx: &mut dyn GraphicsBackend) {
        gfx.delete_texture(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Call, RecordingBackend};
    use asset::MemoryReader;

    fn png_bytes(img: image::DynamicImage) -> Vec<u8> {
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn create_2d_sets_sampling_state() {
        let mut gfx = RecordingBackend::new();
        let tex = Texture::from_data(&mut gfx, &TextureData::checkerboard(4)).unwrap();
        assert_eq!(tex.kind(), TextureKind::TwoD);

        let calls = gfx.take_calls();
        assert!(calls.contains(&Call::GenerateMipmap(tex.id())));
        assert!(calls.contains(&Call::TexParameter {
            texture: tex.id(),
            param: TextureParam::MinFilter(TextureFilter::LinearMipmapLinear),
        }));
        assert!(calls.contains(&Call::TexParameter {
            texture: tex.id(),
            param: TextureParam::WrapS(TextureWrap::Repeat),
        }));
    }

    #[test]
    fn from_file_keeps_channel_count() {
        let gray = image::DynamicImage::ImageLuma8(image::GrayImage::new(2, 3));
        let reader = MemoryReader::new().with("gray.png", png_bytes(gray));

        let mut gfx = RecordingBackend::new();
        let tex = Texture::from_file(&mut gfx, &reader, Path::new("gray.png")).unwrap();

        let upload = gfx.calls().iter().find_map(|c| match c {
            Call::TexImage2d {
                width,
                height,
                internal_format,
                ..
            } => Some((*width, *height, *internal_format)),
            _ => None,
        });
        assert_eq!(upload, Some((2, 3, PixelFormat::R8)));

        tex.destroy(&mut gfx);
        assert_eq!(gfx.live_objects(), 0);
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut gfx = RecordingBackend::new();
        let reader = MemoryReader::new();
        assert!(Texture::from_file(&mut gfx, &reader, Path::new("nope.png")).is_err());
        assert_eq!(gfx.live_objects(), 0);
    }
}
