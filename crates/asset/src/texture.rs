//! Texture loading and data structures.

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};

use crate::reader::FileReader;

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

/// 8-bit-per-channel layouts, named by channel count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    R8,
    Rg8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    pub fn from_channels(channels: u8) -> Option<Self> {
        match channels {
            1 => Some(Self::R8),
            2 => Some(Self::Rg8),
            3 => Some(Self::Rgb8),
            4 => Some(Self::Rgba8),
            _ => None,
        }
    }

    pub fn channels(self) -> u32 {
        match self {
            Self::R8 => 1,
            Self::Rg8 => 2,
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

impl TextureData {
    /// Byte length of a tightly packed image, `None` if it overflows.
    pub fn byte_len(width: u32, height: u32, format: PixelFormat) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(format.channels() as usize)
    }

    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let expected = Self::byte_len(width, height, format)
            .ok_or_else(|| anyhow!("{width}x{height} {format:?} image is too large"))?;
        if data.len() != expected {
            bail!(
                "Data size {} doesn't match {width}x{height} {format:?} ({expected} bytes)",
                data.len()
            );
        }
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    /// Create a new texture with given dimensions and RGBA8 format.
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        Self::new(width, height, PixelFormat::Rgba8, data)
    }

    /// Decode an in-memory PNG/JPEG, keeping its channel count.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes).context("Failed to decode image")?;
        let channels = img.color().channel_count();
        let format = PixelFormat::from_channels(channels)
            .ok_or_else(|| anyhow!("Unsupported channel count {channels}"))?;

        let (width, height) = (img.width(), img.height());
        let data = match format {
            PixelFormat::R8 => img.into_luma8().into_raw(),
            PixelFormat::Rg8 => img.into_luma_alpha8().into_raw(),
            PixelFormat::Rgb8 => img.into_rgb8().into_raw(),
            PixelFormat::Rgba8 => img.into_rgba8().into_raw(),
        };

        Self::new(width, height, format, data)
    }

    /// Read through `reader` and decode.
    pub fn load(reader: &dyn FileReader, path: &Path) -> Result<Self> {
        log::info!("Loading texture from {:?}", path);

        let bytes = reader
            .read(path)
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        let tex = Self::decode(&bytes)
            .with_context(|| format!("Failed to load image {}", path.display()))?;

        log::info!(
            "Loaded texture {}x{} ({:?}, {} bytes)",
            tex.width,
            tex.height,
            tex.format,
            tex.data.len()
        );
        Ok(tex)
    }

    /// Magenta/black single-pixel checkerboard used as a missing-texture
    /// placeholder.
    pub fn checkerboard(size: u32) -> Self {
        let mut data = Vec::with_capacity(Self::byte_len(size, size, PixelFormat::Rgba8).unwrap_or(0));

        for y in 0..size {
            for x in 0..size {
                if (x + y) % 2 == 0 {
                    data.extend_from_slice(&[255, 0, 255, 255]);
                } else {
                    data.extend_from_slice(&[0, 0, 0, 255]);
                }
            }
        }

        Self {
            data,
            width: size,
            height: size,
            format: PixelFormat::Rgba8,
        }
    }

    /// 1x1 opaque texture of a single colour.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            data: rgba.to_vec(),
            width: 1,
            height: 1,
            format: PixelFormat::Rgba8,
        }
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        self.format.channels()
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        Self::byte_len(self.width, self.height, self.format) == Some(self.data.len())
            && self.width > 0
            && self.height > 0
    }
}
