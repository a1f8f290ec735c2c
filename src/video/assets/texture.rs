//! Textures with immutable storage. A texture is a container of one or more
//! images. It can be the source of a texture access from a shader, or the
//! target of a framebuffer attachment.
//!
//! Storage for every mip level and layer is allocated once at creation; the
//! contents are uploaded afterwards, one image at a time.

use serde::{Deserialize, Serialize};

use crate::video::errors::{Error, Result};

impl_handle!(TextureHandle);

/// The dimensionality and arrangement of the images of a texture.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum TextureLayout {
    Tex1D,
    Tex2D,
    Tex3D,
    /// Six square faces, uploaded one face (layer 0 to 5) at a time.
    CubeMap,
    Tex2DArray,
    /// `depth` counts cube maps, every one of them has six layers.
    CubeMapArray,
}

impl TextureLayout {
    pub const VARIANTS: [TextureLayout; 6] = [
        TextureLayout::Tex1D,
        TextureLayout::Tex2D,
        TextureLayout::Tex3D,
        TextureLayout::CubeMap,
        TextureLayout::Tex2DArray,
        TextureLayout::CubeMapArray,
    ];

    /// Returns true if a framebuffer can render into all layers at once.
    pub fn is_layered(self) -> bool {
        match self {
            TextureLayout::Tex1D | TextureLayout::Tex2D => false,
            _ => true,
        }
    }
}

/// The internal (GPU side) format of texture and renderbuffer storage.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    R8,
    RG8,
    RGBA8,
    R8S,
    RG8S,
    RGBA8S,
    SRGB8A8,
    R16,
    RG16,
    RGBA16,
    R16F,
    RG16F,
    RGBA16F,
    R32F,
    RG32F,
    RGBA32F,
    R11G11B10F,
    RGB10A2,
    R8UI,
    R16UI,
    R32UI,
    RG32UI,
    RGBA32UI,
    R32I,
    RGBA32I,
    Depth16,
    Depth24,
    Depth32F,
    Depth24Stencil8,
    Depth32FStencil8,
    Stencil8,
}

impl TextureFormat {
    pub const VARIANTS: [TextureFormat; 31] = [
        TextureFormat::R8,
        TextureFormat::RG8,
        TextureFormat::RGBA8,
        TextureFormat::R8S,
        TextureFormat::RG8S,
        TextureFormat::RGBA8S,
        TextureFormat::SRGB8A8,
        TextureFormat::R16,
        TextureFormat::RG16,
        TextureFormat::RGBA16,
        TextureFormat::R16F,
        TextureFormat::RG16F,
        TextureFormat::RGBA16F,
        TextureFormat::R32F,
        TextureFormat::RG32F,
        TextureFormat::RGBA32F,
        TextureFormat::R11G11B10F,
        TextureFormat::RGB10A2,
        TextureFormat::R8UI,
        TextureFormat::R16UI,
        TextureFormat::R32UI,
        TextureFormat::RG32UI,
        TextureFormat::RGBA32UI,
        TextureFormat::R32I,
        TextureFormat::RGBA32I,
        TextureFormat::Depth16,
        TextureFormat::Depth24,
        TextureFormat::Depth32F,
        TextureFormat::Depth24Stencil8,
        TextureFormat::Depth32FStencil8,
        TextureFormat::Stencil8,
    ];

    /// Formats that can be attached as depth target.
    pub fn is_depth(self) -> bool {
        match self {
            TextureFormat::Depth16
            | TextureFormat::Depth24
            | TextureFormat::Depth32F
            | TextureFormat::Depth24Stencil8
            | TextureFormat::Depth32FStencil8 => true,
            _ => false,
        }
    }

    pub fn has_stencil(self) -> bool {
        match self {
            TextureFormat::Depth24Stencil8
            | TextureFormat::Depth32FStencil8
            | TextureFormat::Stencil8 => true,
            _ => false,
        }
    }

    #[inline]
    pub fn is_color(self) -> bool {
        !self.is_depth() && !self.has_stencil()
    }

    pub fn is_signed(self) -> bool {
        match self {
            TextureFormat::R8S | TextureFormat::RG8S | TextureFormat::RGBA8S => true,
            _ => false,
        }
    }
}

/// Layout of the client side pixels of an upload.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    R,
    RG,
    RGB,
    BGR,
    RGBA,
    BGRA,
    RInteger,
    RGInteger,
    RGBInteger,
    RGBAInteger,
    Depth,
    Stencil,
}

impl PixelFormat {
    pub const VARIANTS: [PixelFormat; 12] = [
        PixelFormat::R,
        PixelFormat::RG,
        PixelFormat::RGB,
        PixelFormat::BGR,
        PixelFormat::RGBA,
        PixelFormat::BGRA,
        PixelFormat::RInteger,
        PixelFormat::RGInteger,
        PixelFormat::RGBInteger,
        PixelFormat::RGBAInteger,
        PixelFormat::Depth,
        PixelFormat::Stencil,
    ];

    pub fn components(self) -> usize {
        match self {
            PixelFormat::R | PixelFormat::RInteger | PixelFormat::Depth | PixelFormat::Stencil => 1,
            PixelFormat::RG | PixelFormat::RGInteger => 2,
            PixelFormat::RGB | PixelFormat::BGR | PixelFormat::RGBInteger => 3,
            PixelFormat::RGBA | PixelFormat::BGRA | PixelFormat::RGBAInteger => 4,
        }
    }
}

/// Type of every component of the client side pixels.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum PixelType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F16,
    F32,
}

impl PixelType {
    pub const VARIANTS: [PixelType; 8] = [
        PixelType::U8,
        PixelType::I8,
        PixelType::U16,
        PixelType::I16,
        PixelType::U32,
        PixelType::I32,
        PixelType::F16,
        PixelType::F32,
    ];

    pub fn size(self) -> usize {
        match self {
            PixelType::U8 | PixelType::I8 => 1,
            PixelType::U16 | PixelType::I16 | PixelType::F16 => 2,
            PixelType::U32 | PixelType::I32 | PixelType::F32 => 4,
        }
    }
}

/// The parameters of a texture object.
///
/// Unused dimensions must be 1: `height` and `depth` of 1D textures, `depth`
/// of 2D textures and cube maps. Array layouts keep their layer count in
/// `depth`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct TextureParams {
    pub layout: TextureLayout,
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    /// Number of mip levels to allocate, 0 allocates the complete chain.
    /// Larger numbers are clamped to the complete chain.
    pub mip_levels: u32,
}

impl TextureParams {
    pub fn new_1d(width: u32, format: TextureFormat) -> Self {
        TextureParams::new(TextureLayout::Tex1D, format, width, 1, 1)
    }

    pub fn new_2d(width: u32, height: u32, format: TextureFormat) -> Self {
        TextureParams::new(TextureLayout::Tex2D, format, width, height, 1)
    }

    pub fn new_3d(width: u32, height: u32, depth: u32, format: TextureFormat) -> Self {
        TextureParams::new(TextureLayout::Tex3D, format, width, height, depth)
    }

    pub fn new_cube(size: u32, format: TextureFormat) -> Self {
        TextureParams::new(TextureLayout::CubeMap, format, size, size, 1)
    }

    pub fn new_2d_array(width: u32, height: u32, layers: u32, format: TextureFormat) -> Self {
        TextureParams::new(TextureLayout::Tex2DArray, format, width, height, layers)
    }

    pub fn new_cube_array(size: u32, cubes: u32, format: TextureFormat) -> Self {
        TextureParams::new(TextureLayout::CubeMapArray, format, size, size, cubes)
    }

    fn new(
        layout: TextureLayout,
        format: TextureFormat,
        width: u32,
        height: u32,
        depth: u32,
    ) -> Self {
        TextureParams {
            layout,
            format,
            width,
            height,
            depth,
            mip_levels: 0,
        }
    }

    #[inline]
    pub fn with_mip_levels(mut self, levels: u32) -> Self {
        self.mip_levels = levels;
        self
    }

    /// The number of mip levels actually allocated.
    pub fn levels(&self) -> u32 {
        let extent = match self.layout {
            TextureLayout::Tex1D => self.width,
            TextureLayout::Tex3D => self.width.max(self.height).max(self.depth),
            _ => self.width.max(self.height),
        };

        let mut complete = 1;
        let mut v = extent;
        while v > 1 {
            v /= 2;
            complete += 1;
        }

        if self.mip_levels == 0 {
            complete
        } else {
            self.mip_levels.min(complete)
        }
    }

    /// The number of separately uploadable images per mip level.
    pub fn layers(&self) -> u32 {
        match self.layout {
            TextureLayout::Tex1D | TextureLayout::Tex2D | TextureLayout::Tex3D => 1,
            TextureLayout::CubeMap => 6,
            TextureLayout::Tex2DArray => self.depth,
            TextureLayout::CubeMapArray => self.depth * 6,
        }
    }

    /// The extent of a single image of mip `level`. Only 3D textures shrink
    /// in depth, every other layout has an image depth of 1.
    pub fn image_dimensions(&self, level: u32) -> (u32, u32, u32) {
        let shrink = |v: u32| (v >> level).max(1);

        match self.layout {
            TextureLayout::Tex1D => (shrink(self.width), 1, 1),
            TextureLayout::Tex3D => (shrink(self.width), shrink(self.height), shrink(self.depth)),
            _ => (shrink(self.width), shrink(self.height), 1),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return Err(Error::TextureInvalid(format!(
                "Texture dimensions ({}, {}, {}) can not be zero.",
                self.width, self.height, self.depth
            )));
        }

        let unused = match self.layout {
            TextureLayout::Tex1D => self.height != 1 || self.depth != 1,
            TextureLayout::Tex2D | TextureLayout::CubeMap => self.depth != 1,
            _ => false,
        };

        if unused {
            return Err(Error::TextureInvalid(format!(
                "{:?} textures have unused dimensions of 1, found ({}, {}, {}).",
                self.layout, self.width, self.height, self.depth
            )));
        }

        let cube = self.layout == TextureLayout::CubeMap
            || self.layout == TextureLayout::CubeMapArray;
        if cube && self.width != self.height {
            return Err(Error::TextureInvalid(format!(
                "Cube map faces must be square, found {}x{}.",
                self.width, self.height
            )));
        }

        Ok(())
    }

    /// Checks an upload of a complete image of mip `level` and `layer`.
    pub fn validate_image(
        &self,
        level: u32,
        layer: u32,
        format: PixelFormat,
        kind: PixelType,
        data: &[u8],
    ) -> Result<()> {
        if level >= self.levels() || layer >= self.layers() {
            return Err(Error::OutOfBounds);
        }

        let (w, h, d) = self.image_dimensions(level);
        let expected = w as usize * h as usize * d as usize * format.components() * kind.size();

        if data.len() != expected {
            return Err(Error::TextureInvalid(format!(
                "Image of level {} has {} bytes, expected {}.",
                level,
                data.len(),
                expected
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn levels() {
        let params = TextureParams::new_2d(256, 64, TextureFormat::RGBA8);
        assert_eq!(params.levels(), 9);
        assert_eq!(params.with_mip_levels(1).levels(), 1);
        assert_eq!(params.with_mip_levels(20).levels(), 9);

        assert_eq!(TextureParams::new_1d(1, TextureFormat::R8).levels(), 1);
        assert_eq!(TextureParams::new_3d(4, 4, 32, TextureFormat::R8).levels(), 6);

        // Array layers are not mip-mapped.
        let array = TextureParams::new_2d_array(16, 16, 64, TextureFormat::RGBA8);
        assert_eq!(array.levels(), 5);
        assert_eq!(array.layers(), 64);
        assert_eq!(TextureParams::new_cube_array(8, 3, TextureFormat::RGBA8).layers(), 18);
    }

    #[test]
    fn image_dimensions() {
        let volume = TextureParams::new_3d(64, 32, 8, TextureFormat::R8);
        assert_eq!(volume.image_dimensions(0), (64, 32, 8));
        assert_eq!(volume.image_dimensions(4), (4, 2, 1));

        let array = TextureParams::new_2d_array(64, 32, 8, TextureFormat::R8);
        assert_eq!(array.image_dimensions(1), (32, 16, 1));
    }

    #[test]
    fn validate() {
        assert!(TextureParams::new_2d(16, 16, TextureFormat::RGBA8).validate().is_ok());
        assert!(TextureParams::new_2d(16, 0, TextureFormat::RGBA8).validate().is_err());
        assert!(TextureParams::new_1d(16, TextureFormat::R8).validate().is_ok());

        let mut cube = TextureParams::new_cube(16, TextureFormat::RGBA8);
        assert!(cube.validate().is_ok());
        cube.height = 8;
        assert!(cube.validate().is_err());

        let mut flat = TextureParams::new_2d(16, 16, TextureFormat::RGBA8);
        flat.depth = 2;
        assert!(flat.validate().is_err());
    }

    #[test]
    fn images() {
        let params = TextureParams::new_cube(4, TextureFormat::RGBA8);
        let face = [0u8; 64];
        assert!(params
            .validate_image(0, 5, PixelFormat::RGBA, PixelType::U8, &face)
            .is_ok());
        assert!(params
            .validate_image(1, 0, PixelFormat::RGBA, PixelType::U8, &face[..16])
            .is_ok());

        match params.validate_image(0, 6, PixelFormat::RGBA, PixelType::U8, &face) {
            Err(Error::OutOfBounds) => {}
            other => panic!("unexpected {:?}", other),
        }

        match params.validate_image(0, 0, PixelFormat::RGB, PixelType::U8, &face) {
            Err(Error::TextureInvalid(_)) => {}
            other => panic!("unexpected {:?}", other),
        }

        let volume = TextureParams::new_3d(4, 4, 4, TextureFormat::R32F).with_mip_levels(1);
        assert!(volume
            .validate_image(0, 0, PixelFormat::R, PixelType::F32, &[0; 256])
            .is_ok());
        assert!(volume
            .validate_image(1, 0, PixelFormat::R, PixelType::F32, &[0; 32])
            .is_err());
    }

    #[test]
    fn formats() {
        assert!(TextureFormat::Depth24Stencil8.is_depth());
        assert!(TextureFormat::Depth24Stencil8.has_stencil());
        assert!(!TextureFormat::Stencil8.is_depth());
        assert!(!TextureFormat::Stencil8.is_color());
        assert!(TextureFormat::RGBA8S.is_signed());

        let colors = TextureFormat::VARIANTS.iter().filter(|v| v.is_color()).count();
        assert_eq!(colors, 25);
    }
}
