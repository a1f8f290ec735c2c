//! Vertex formats describe how buffers feed the vertex stream inputs.
//!
//! A vertex format only carries binding semantics. The buffers themselves are
//! bound separately with `Context::bind_vertex_buffer`.

use smallvec::SmallVec;

use crate::video::errors::{Error, Result};
use crate::video::MAX_VERTEX_ATTRIBUTES;

impl_handle!(VertexFormatHandle);

/// Element types of a vertex attribute.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum VertexAttributeFormat {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    Fixed,
    F16,
    F32,
    F64,
    I2_10_10_10,
    U2_10_10_10,
    U10F11F11F,
}

impl VertexAttributeFormat {
    pub const VARIANTS: [VertexAttributeFormat; 13] = [
        VertexAttributeFormat::I8,
        VertexAttributeFormat::U8,
        VertexAttributeFormat::I16,
        VertexAttributeFormat::U16,
        VertexAttributeFormat::I32,
        VertexAttributeFormat::U32,
        VertexAttributeFormat::Fixed,
        VertexAttributeFormat::F16,
        VertexAttributeFormat::F32,
        VertexAttributeFormat::F64,
        VertexAttributeFormat::I2_10_10_10,
        VertexAttributeFormat::U2_10_10_10,
        VertexAttributeFormat::U10F11F11F,
    ];

    pub fn is_integer(self) -> bool {
        match self {
            VertexAttributeFormat::I8
            | VertexAttributeFormat::U8
            | VertexAttributeFormat::I16
            | VertexAttributeFormat::U16
            | VertexAttributeFormat::I32
            | VertexAttributeFormat::U32 => true,
            _ => false,
        }
    }

    /// Packed formats always hold exactly four (or three) components.
    pub fn is_packed(self) -> bool {
        match self {
            VertexAttributeFormat::I2_10_10_10
            | VertexAttributeFormat::U2_10_10_10
            | VertexAttributeFormat::U10F11F11F => true,
            _ => false,
        }
    }
}

/// Which flavour of attribute format command feeds the attribute.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AttributePath {
    /// Converted to float, optionally normalized.
    Float,
    /// Kept as integer in the shader.
    Integer,
    /// 64-bit floats.
    Double,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct VertexAttribute {
    /// Stream index visible in the vertex shader.
    pub location: u32,
    /// Vertex buffer binding index the attribute reads from.
    pub binding: u32,
    /// Number of values per vertex, 1 to 4.
    pub components: u8,
    pub format: VertexAttributeFormat,
    /// Integers are normalized to `[-1, 1]` (signed) or `[0, 1]` (unsigned)
    /// when set. Otherwise integers stay integers in the shader, unlike the
    /// plain driver semantics that would silently convert them to floats.
    pub normalized: bool,
    /// Offset in bytes within each vertex.
    pub offset: u32,
    /// Number of instances drawn between advances of the attribute, 0 advances
    /// per vertex.
    pub divisor: u32,
}

impl VertexAttribute {
    pub fn path(&self) -> AttributePath {
        if self.format == VertexAttributeFormat::F64 {
            AttributePath::Double
        } else if !self.normalized && self.format.is_integer() {
            AttributePath::Integer
        } else {
            AttributePath::Float
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct VertexFormatParams {
    pub attributes: SmallVec<[VertexAttribute; 8]>,
}

impl VertexFormatParams {
    pub fn build() -> VertexFormatParamsBuilder {
        VertexFormatParamsBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if self.attributes.len() > MAX_VERTEX_ATTRIBUTES {
            return Err(Error::VertexFormatInvalid(format!(
                "Too many vertex attributes (>= {:?}).",
                MAX_VERTEX_ATTRIBUTES
            )));
        }

        for (i, attr) in self.attributes.iter().enumerate() {
            if attr.components == 0 || attr.components > 4 {
                return Err(Error::VertexFormatInvalid(format!(
                    "Attribute at location {} has {} components.",
                    attr.location, attr.components
                )));
            }

            if attr.location as usize >= MAX_VERTEX_ATTRIBUTES {
                return Err(Error::VertexFormatInvalid(format!(
                    "Attribute location {} is out of range.",
                    attr.location
                )));
            }

            if attr.format.is_packed() && attr.components < 3 {
                return Err(Error::VertexFormatInvalid(format!(
                    "Packed attribute at location {} needs at least 3 components.",
                    attr.location
                )));
            }

            if self.attributes[..i]
                .iter()
                .any(|v| v.location == attr.location)
            {
                return Err(Error::VertexFormatInvalid(format!(
                    "Attribute location {} is declared twice.",
                    attr.location
                )));
            }
        }

        Ok(())
    }
}

#[derive(Default)]
pub struct VertexFormatParamsBuilder(VertexFormatParams);

impl VertexFormatParamsBuilder {
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends a float attribute reading from vertex buffer binding 0.
    pub fn with(self, location: u32, components: u8, offset: u32) -> Self {
        self.with_attribute(VertexAttribute {
            location,
            binding: 0,
            components,
            format: VertexAttributeFormat::F32,
            normalized: false,
            offset,
            divisor: 0,
        })
    }

    pub fn with_attribute(mut self, attribute: VertexAttribute) -> Self {
        self.0.attributes.push(attribute);
        self
    }

    #[inline]
    pub fn finish(self) -> VertexFormatParams {
        self.0
    }
}

/// Primitive topology of a draw call.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Primitive {
    Points,
    Lines,
    LineStrip,
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Patches,
}

/// Element type of an index buffer.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum IndexFormat {
    U8,
    U16,
    U32,
}

impl IndexFormat {
    pub fn stride(self) -> usize {
        match self {
            IndexFormat::U8 => 1,
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn attribute(format: VertexAttributeFormat, normalized: bool) -> VertexAttribute {
        VertexAttribute {
            location: 0,
            binding: 0,
            components: 4,
            format,
            normalized,
            offset: 0,
            divisor: 0,
        }
    }

    #[test]
    fn paths() {
        assert_eq!(
            attribute(VertexAttributeFormat::F32, false).path(),
            AttributePath::Float
        );
        assert_eq!(
            attribute(VertexAttributeFormat::U8, false).path(),
            AttributePath::Integer
        );
        assert_eq!(
            attribute(VertexAttributeFormat::U8, true).path(),
            AttributePath::Float
        );
        assert_eq!(
            attribute(VertexAttributeFormat::F64, false).path(),
            AttributePath::Double
        );
        assert_eq!(
            attribute(VertexAttributeFormat::I2_10_10_10, false).path(),
            AttributePath::Float
        );
    }

    #[test]
    fn validate() {
        let params = VertexFormatParams::build()
            .with(0, 3, 0)
            .with(1, 2, 12)
            .finish();
        assert!(params.validate().is_ok());
        assert!(VertexFormatParams::default().validate().is_ok());

        let duplicated = VertexFormatParams::build()
            .with(0, 3, 0)
            .with(0, 2, 12)
            .finish();
        assert!(duplicated.validate().is_err());

        let empty = VertexFormatParams::build().with(0, 0, 0).finish();
        assert!(empty.validate().is_err());

        let packed = VertexFormatParams::build()
            .with_attribute(VertexAttribute {
                components: 2,
                ..attribute(VertexAttributeFormat::U10F11F11F, false)
            })
            .finish();
        assert!(packed.validate().is_err());
    }
}
