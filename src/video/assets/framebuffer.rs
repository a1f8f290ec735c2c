//! Render targets.
//!
//! A `Framebuffer` is a collection of color attachments plus an optional
//! depth (or depth-stencil) attachment. Attachments are textures, or
//! renderbuffers when the rendered data never needs to be sampled later.

use crate::video::assets::texture::{TextureFormat, TextureHandle};
use crate::video::errors::{Error, Result};
use crate::video::MAX_DRAW_BUFFERS;

impl_handle!(RenderbufferHandle);
impl_handle!(FramebufferHandle);

/// An optimized render target that can not be sampled.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct RenderbufferParams {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl RenderbufferParams {
    pub fn new(width: u32, height: u32, format: TextureFormat) -> Self {
        RenderbufferParams {
            width,
            height,
            format,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::FramebufferInvalid(format!(
                "Renderbuffer dimensions {}x{} can not be zero.",
                self.width, self.height
            )));
        }

        Ok(())
    }
}

/// The image a framebuffer renders into.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Attachment {
    /// A single mip `level` of a texture. For layered textures `layer` picks
    /// one image (array layer, cube face or 3D slice), `None` attaches all of
    /// them for layered rendering.
    Texture {
        handle: TextureHandle,
        level: u32,
        layer: Option<u32>,
    },
    Renderbuffer(RenderbufferHandle),
}

impl Attachment {
    /// The base level of a texture.
    #[inline]
    pub fn texture(handle: TextureHandle) -> Self {
        Attachment::Texture {
            handle,
            level: 0,
            layer: None,
        }
    }

    #[inline]
    pub fn texture_layer(handle: TextureHandle, level: u32, layer: u32) -> Self {
        Attachment::Texture {
            handle,
            level,
            layer: Some(layer),
        }
    }
}

impl From<RenderbufferHandle> for Attachment {
    fn from(handle: RenderbufferHandle) -> Self {
        Attachment::Renderbuffer(handle)
    }
}

/// The attachments of a framebuffer. Color attachment `i` is written by
/// fragment output `i`; empty slots are not drawn into.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct FramebufferParams {
    pub colors: [Option<Attachment>; MAX_DRAW_BUFFERS],
    /// A depth format with stencil bits is attached as depth-stencil target.
    pub depth_stencil: Option<Attachment>,
}

impl FramebufferParams {
    #[inline]
    pub fn with_color(mut self, index: usize, attachment: Attachment) -> Self {
        self.colors[index] = Some(attachment);
        self
    }

    #[inline]
    pub fn with_depth_stencil<T: Into<Attachment>>(mut self, attachment: T) -> Self {
        self.depth_stencil = Some(attachment.into());
        self
    }

    /// Returns true if nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.depth_stencil.is_none() && self.colors.iter().all(|v| v.is_none())
    }
}
