//! CPU texture sampling
//!
//! RGBA8 images sampled with bilinear filtering, standing in for the cloud
//! texture and the decal texture array.

use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::error::{Result, ShadingError};
use crate::foundation::math::{Vec2, Vec4};

/// What happens to coordinates outside `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressMode {
    /// Repeat the texture
    #[default]
    Wrap,
    /// Repeat the edge texel
    Clamp,
    /// Transparent black outside the texture
    Border,
}

/// A filtered 2D texture
pub trait Texture2D {
    /// Bilinear sample at `uv`
    fn sample(&self, uv: Vec2) -> Vec4;
}

/// A filtered 2D texture array
pub trait TextureArray {
    /// Number of layers
    fn layer_count(&self) -> u32;

    /// Bilinear sample at `uv` in `layer`
    fn sample_layer(&self, uv: Vec2, layer: u32) -> Vec4;
}

fn texel(image: &RgbaImage, x: i64, y: i64, mode: AddressMode) -> Vec4 {
    let (width, height) = (i64::from(image.width()), i64::from(image.height()));
    let (x, y) = match mode {
        AddressMode::Wrap => (x.rem_euclid(width), y.rem_euclid(height)),
        AddressMode::Clamp => (x.clamp(0, width - 1), y.clamp(0, height - 1)),
        AddressMode::Border => {
            if x < 0 || y < 0 || x >= width || y >= height {
                return Vec4::zeros();
            }
            (x, y)
        }
    };
    let Rgba(c) = *image.get_pixel(x as u32, y as u32);
    Vec4::new(c[0] as f32, c[1] as f32, c[2] as f32, c[3] as f32) / 255.0
}

fn sample_bilinear(image: &RgbaImage, uv: Vec2, mode: AddressMode) -> Vec4 {
    if image.width() == 0 || image.height() == 0 {
        return Vec4::zeros();
    }
    let x = uv.x * image.width() as f32 - 0.5;
    let y = uv.y * image.height() as f32 - 0.5;
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let top = texel(image, x0, y0, mode).lerp(&texel(image, x0 + 1, y0, mode), fx);
    let bottom = texel(image, x0, y0 + 1, mode).lerp(&texel(image, x0 + 1, y0 + 1, mode), fx);
    top.lerp(&bottom, fy)
}

/// RGBA8 texture
#[derive(Debug, Clone, PartialEq)]
pub struct RgbaTexture {
    image: RgbaImage,
    address_mode: AddressMode,
}

impl RgbaTexture {
    /// Wrap an image
    pub fn new(image: RgbaImage, address_mode: AddressMode) -> Self {
        Self { image, address_mode }
    }

    /// Single-colour texture
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self::new(RgbaImage::from_pixel(width, height, Rgba(color)), AddressMode::Wrap)
    }

    /// Decode an encoded image (PNG)
    pub fn from_bytes(bytes: &[u8], address_mode: AddressMode) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| ShadingError::TextureLoad(format!("Failed to decode image: {}", e)))?
            .to_rgba8();
        log::debug!("Decoded texture {}x{}", image.width(), image.height());
        Ok(Self::new(image, address_mode))
    }

    /// Load an image file
    pub fn from_file<P: AsRef<Path>>(path: P, address_mode: AddressMode) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|e| ShadingError::TextureLoad(format!("{}: {}", path.display(), e)))?
            .to_rgba8();
        log::info!("Loaded texture {}x{} from {:?}", image.width(), image.height(), path);
        Ok(Self::new(image, address_mode))
    }

    /// Width and height
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Underlying image
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

impl Texture2D for RgbaTexture {
    fn sample(&self, uv: Vec2) -> Vec4 {
        sample_bilinear(&self.image, uv, self.address_mode)
    }
}

/// Array of equally sized RGBA8 layers
#[derive(Debug, Clone, PartialEq)]
pub struct RgbaTextureArray {
    width: u32,
    height: u32,
    layers: Vec<RgbaImage>,
    address_mode: AddressMode,
}

impl RgbaTextureArray {
    /// Empty array whose layers must be `width` x `height`
    pub fn new(width: u32, height: u32, address_mode: AddressMode) -> Self {
        Self { width, height, layers: Vec::new(), address_mode }
    }

    /// Append a layer, returning its index
    pub fn push_layer(&mut self, image: RgbaImage) -> Result<u32> {
        if image.dimensions() != (self.width, self.height) {
            return Err(ShadingError::InvalidDecalTextureSize {
                expected: self.width,
                width: image.width(),
                height: image.height(),
            });
        }
        self.layers.push(image);
        Ok(self.layers.len() as u32 - 1)
    }

    /// Layer width and height
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl TextureArray for RgbaTextureArray {
    fn layer_count(&self) -> u32 {
        self.layers.len() as u32
    }

    fn sample_layer(&self, uv: Vec2, layer: u32) -> Vec4 {
        match self.layers.last() {
            None => Vec4::zeros(),
            Some(last) => {
                let image = self.layers.get(layer as usize).unwrap_or(last);
                sample_bilinear(image, uv, self.address_mode)
            }
        }
    }
}
