use gl;
use gl::types::*;

use super::super::super::assets::prelude::*;
use super::super::super::debug::{DebugCategory, DebugSeverity, DebugSource};
use super::super::{Capability, Face, IndexedTarget, IndirectTarget};

// Core in 4.6, but the enum is missing from the generated 4.5 bindings.
pub const TEXTURE_MAX_ANISOTROPY: GLenum = 0x84FE;

impl From<Capability> for GLenum {
    fn from(cap: Capability) -> Self {
        match cap {
            Capability::CullFace => gl::CULL_FACE,
            Capability::RasterizerDiscard => gl::RASTERIZER_DISCARD,
            Capability::Dither => gl::DITHER,
            Capability::DepthTest => gl::DEPTH_TEST,
            Capability::StencilTest => gl::STENCIL_TEST,
            Capability::Blend => gl::BLEND,
            Capability::ColorLogicOp => gl::COLOR_LOGIC_OP,
            Capability::SampleAlphaToCoverage => gl::SAMPLE_ALPHA_TO_COVERAGE,
            Capability::TextureCubeMapSeamless => gl::TEXTURE_CUBE_MAP_SEAMLESS,
        }
    }
}

impl From<Face> for GLenum {
    fn from(face: Face) -> Self {
        match face {
            Face::Front => gl::FRONT,
            Face::Back => gl::BACK,
        }
    }
}

impl From<Winding> for GLenum {
    fn from(winding: Winding) -> Self {
        match winding {
            Winding::Clockwise => gl::CW,
            Winding::CounterClockwise => gl::CCW,
        }
    }
}

impl From<FillMode> for GLenum {
    fn from(mode: FillMode) -> Self {
        match mode {
            FillMode::Solid => gl::FILL,
            FillMode::Wireframe => gl::LINE,
            FillMode::Points => gl::POINT,
        }
    }
}

impl From<Comparison> for GLenum {
    fn from(cmp: Comparison) -> Self {
        match cmp {
            Comparison::Never => gl::NEVER,
            Comparison::Less => gl::LESS,
            Comparison::LessOrEqual => gl::LEQUAL,
            Comparison::Greater => gl::GREATER,
            Comparison::GreaterOrEqual => gl::GEQUAL,
            Comparison::Equal => gl::EQUAL,
            Comparison::NotEqual => gl::NOTEQUAL,
            Comparison::Always => gl::ALWAYS,
        }
    }
}

impl From<StencilOp> for GLenum {
    fn from(op: StencilOp) -> Self {
        match op {
            StencilOp::Keep => gl::KEEP,
            StencilOp::Zero => gl::ZERO,
            StencilOp::Replace => gl::REPLACE,
            StencilOp::IncrementWrap => gl::INCR_WRAP,
            StencilOp::DecrementWrap => gl::DECR_WRAP,
            StencilOp::IncrementClamp => gl::INCR,
            StencilOp::DecrementClamp => gl::DECR,
            StencilOp::Invert => gl::INVERT,
        }
    }
}

impl From<BlendOp> for GLenum {
    fn from(op: BlendOp) -> Self {
        match op {
            BlendOp::Add => gl::FUNC_ADD,
            BlendOp::Subtract => gl::FUNC_SUBTRACT,
            BlendOp::ReverseSubtract => gl::FUNC_REVERSE_SUBTRACT,
            BlendOp::Min => gl::MIN,
            BlendOp::Max => gl::MAX,
        }
    }
}

impl From<BlendFactor> for GLenum {
    fn from(factor: BlendFactor) -> Self {
        match factor {
            BlendFactor::Zero => gl::ZERO,
            BlendFactor::One => gl::ONE,
            BlendFactor::SourceAlpha => gl::SRC_ALPHA,
            BlendFactor::OneMinusSourceAlpha => gl::ONE_MINUS_SRC_ALPHA,
            BlendFactor::DestinationAlpha => gl::DST_ALPHA,
            BlendFactor::OneMinusDestinationAlpha => gl::ONE_MINUS_DST_ALPHA,
            BlendFactor::SourceColor => gl::SRC_COLOR,
            BlendFactor::OneMinusSourceColor => gl::ONE_MINUS_SRC_COLOR,
            BlendFactor::DestinationColor => gl::DST_COLOR,
            BlendFactor::OneMinusDestinationColor => gl::ONE_MINUS_DST_COLOR,
        }
    }
}

impl From<LogicOp> for GLenum {
    fn from(op: LogicOp) -> Self {
        match op {
            LogicOp::Clear => gl::CLEAR,
            LogicOp::Set => gl::SET,
            LogicOp::Copy => gl::COPY,
            LogicOp::CopyInverted => gl::COPY_INVERTED,
            LogicOp::Noop => gl::NOOP,
            LogicOp::Invert => gl::INVERT,
            LogicOp::And => gl::AND,
            LogicOp::Nand => gl::NAND,
            LogicOp::Or => gl::OR,
            LogicOp::Nor => gl::NOR,
            LogicOp::Xor => gl::XOR,
            LogicOp::Equiv => gl::EQUIV,
            LogicOp::AndReverse => gl::AND_REVERSE,
            LogicOp::AndInverted => gl::AND_INVERTED,
            LogicOp::OrReverse => gl::OR_REVERSE,
            LogicOp::OrInverted => gl::OR_INVERTED,
        }
    }
}

impl From<SamplerFilter> for GLenum {
    fn from(filter: SamplerFilter) -> Self {
        match filter {
            SamplerFilter::Nearest => gl::NEAREST,
            SamplerFilter::Linear => gl::LINEAR,
        }
    }
}

impl From<MinFilter> for GLenum {
    fn from(filter: MinFilter) -> Self {
        match filter {
            MinFilter::Nearest => gl::NEAREST,
            MinFilter::Linear => gl::LINEAR,
            MinFilter::NearestMipmapNearest => gl::NEAREST_MIPMAP_NEAREST,
            MinFilter::NearestMipmapLinear => gl::NEAREST_MIPMAP_LINEAR,
            MinFilter::LinearMipmapNearest => gl::LINEAR_MIPMAP_NEAREST,
            MinFilter::LinearMipmapLinear => gl::LINEAR_MIPMAP_LINEAR,
        }
    }
}

impl From<SamplerWrap> for GLenum {
    fn from(wrap: SamplerWrap) -> Self {
        match wrap {
            SamplerWrap::Repeat => gl::REPEAT,
            SamplerWrap::Clamp => gl::CLAMP_TO_EDGE,
            SamplerWrap::Border => gl::CLAMP_TO_BORDER,
            SamplerWrap::Mirror => gl::MIRRORED_REPEAT,
        }
    }
}

impl From<ShaderKind> for GLenum {
    fn from(kind: ShaderKind) -> Self {
        match kind {
            ShaderKind::Vertex => gl::VERTEX_SHADER,
            ShaderKind::TessControl => gl::TESS_CONTROL_SHADER,
            ShaderKind::TessEvaluation => gl::TESS_EVALUATION_SHADER,
            ShaderKind::Geometry => gl::GEOMETRY_SHADER,
            ShaderKind::Fragment => gl::FRAGMENT_SHADER,
            ShaderKind::Compute => gl::COMPUTE_SHADER,
        }
    }
}

impl From<VertexAttributeFormat> for GLenum {
    fn from(format: VertexAttributeFormat) -> Self {
        match format {
            VertexAttributeFormat::I8 => gl::BYTE,
            VertexAttributeFormat::U8 => gl::UNSIGNED_BYTE,
            VertexAttributeFormat::I16 => gl::SHORT,
            VertexAttributeFormat::U16 => gl::UNSIGNED_SHORT,
            VertexAttributeFormat::I32 => gl::INT,
            VertexAttributeFormat::U32 => gl::UNSIGNED_INT,
            VertexAttributeFormat::Fixed => gl::FIXED,
            VertexAttributeFormat::F16 => gl::HALF_FLOAT,
            VertexAttributeFormat::F32 => gl::FLOAT,
            VertexAttributeFormat::F64 => gl::DOUBLE,
            VertexAttributeFormat::I2_10_10_10 => gl::INT_2_10_10_10_REV,
            VertexAttributeFormat::U2_10_10_10 => gl::UNSIGNED_INT_2_10_10_10_REV,
            VertexAttributeFormat::U10F11F11F => gl::UNSIGNED_INT_10F_11F_11F_REV,
        }
    }
}

impl From<Primitive> for GLenum {
    fn from(primitive: Primitive) -> Self {
        match primitive {
            Primitive::Points => gl::POINTS,
            Primitive::Lines => gl::LINES,
            Primitive::LineStrip => gl::LINE_STRIP,
            Primitive::LineLoop => gl::LINE_LOOP,
            Primitive::Triangles => gl::TRIANGLES,
            Primitive::TriangleStrip => gl::TRIANGLE_STRIP,
            Primitive::TriangleFan => gl::TRIANGLE_FAN,
            Primitive::Patches => gl::PATCHES,
        }
    }
}

impl From<IndexFormat> for GLenum {
    fn from(format: IndexFormat) -> Self {
        match format {
            IndexFormat::U8 => gl::UNSIGNED_BYTE,
            IndexFormat::U16 => gl::UNSIGNED_SHORT,
            IndexFormat::U32 => gl::UNSIGNED_INT,
        }
    }
}

impl From<DebugSeverity> for GLenum {
    fn from(severity: DebugSeverity) -> Self {
        match severity {
            DebugSeverity::Notification => gl::DEBUG_SEVERITY_NOTIFICATION,
            DebugSeverity::Low => gl::DEBUG_SEVERITY_LOW,
            DebugSeverity::Medium => gl::DEBUG_SEVERITY_MEDIUM,
            DebugSeverity::High => gl::DEBUG_SEVERITY_HIGH,
        }
    }
}

impl From<IndexedTarget> for GLenum {
    fn from(target: IndexedTarget) -> Self {
        match target {
            IndexedTarget::Uniform => gl::UNIFORM_BUFFER,
            IndexedTarget::ShaderStorage => gl::SHADER_STORAGE_BUFFER,
            IndexedTarget::AtomicCounter => gl::ATOMIC_COUNTER_BUFFER,
            IndexedTarget::TransformFeedback => gl::TRANSFORM_FEEDBACK_BUFFER,
        }
    }
}

impl From<IndirectTarget> for GLenum {
    fn from(target: IndirectTarget) -> Self {
        match target {
            IndirectTarget::Draw => gl::DRAW_INDIRECT_BUFFER,
            IndirectTarget::Dispatch => gl::DISPATCH_INDIRECT_BUFFER,
        }
    }
}

impl From<TextureLayout> for GLenum {
    fn from(layout: TextureLayout) -> Self {
        match layout {
            TextureLayout::Tex1D => gl::TEXTURE_1D,
            TextureLayout::Tex2D => gl::TEXTURE_2D,
            TextureLayout::Tex3D => gl::TEXTURE_3D,
            TextureLayout::CubeMap => gl::TEXTURE_CUBE_MAP,
            TextureLayout::Tex2DArray => gl::TEXTURE_2D_ARRAY,
            TextureLayout::CubeMapArray => gl::TEXTURE_CUBE_MAP_ARRAY,
        }
    }
}

impl From<TextureFormat> for GLenum {
    fn from(format: TextureFormat) -> Self {
        match format {
            TextureFormat::R8 => gl::R8,
            TextureFormat::RG8 => gl::RG8,
            TextureFormat::RGBA8 => gl::RGBA8,
            TextureFormat::R8S => gl::R8_SNORM,
            TextureFormat::RG8S => gl::RG8_SNORM,
            TextureFormat::RGBA8S => gl::RGBA8_SNORM,
            TextureFormat::SRGB8A8 => gl::SRGB8_ALPHA8,
            TextureFormat::R16 => gl::R16,
            TextureFormat::RG16 => gl::RG16,
            TextureFormat::RGBA16 => gl::RGBA16,
            TextureFormat::R16F => gl::R16F,
            TextureFormat::RG16F => gl::RG16F,
            TextureFormat::RGBA16F => gl::RGBA16F,
            TextureFormat::R32F => gl::R32F,
            TextureFormat::RG32F => gl::RG32F,
            TextureFormat::RGBA32F => gl::RGBA32F,
            TextureFormat::R11G11B10F => gl::R11F_G11F_B10F,
            TextureFormat::RGB10A2 => gl::RGB10_A2,
            TextureFormat::R8UI => gl::R8UI,
            TextureFormat::R16UI => gl::R16UI,
            TextureFormat::R32UI => gl::R32UI,
            TextureFormat::RG32UI => gl::RG32UI,
            TextureFormat::RGBA32UI => gl::RGBA32UI,
            TextureFormat::R32I => gl::R32I,
            TextureFormat::RGBA32I => gl::RGBA32I,
            TextureFormat::Depth16 => gl::DEPTH_COMPONENT16,
            TextureFormat::Depth24 => gl::DEPTH_COMPONENT24,
            TextureFormat::Depth32F => gl::DEPTH_COMPONENT32F,
            TextureFormat::Depth24Stencil8 => gl::DEPTH24_STENCIL8,
            TextureFormat::Depth32FStencil8 => gl::DEPTH32F_STENCIL8,
            TextureFormat::Stencil8 => gl::STENCIL_INDEX8,
        }
    }
}

impl From<PixelFormat> for GLenum {
    fn from(format: PixelFormat) -> Self {
        match format {
            PixelFormat::R => gl::RED,
            PixelFormat::RG => gl::RG,
            PixelFormat::RGB => gl::RGB,
            PixelFormat::BGR => gl::BGR,
            PixelFormat::RGBA => gl::RGBA,
            PixelFormat::BGRA => gl::BGRA,
            PixelFormat::RInteger => gl::RED_INTEGER,
            PixelFormat::RGInteger => gl::RG_INTEGER,
            PixelFormat::RGBInteger => gl::RGB_INTEGER,
            PixelFormat::RGBAInteger => gl::RGBA_INTEGER,
            PixelFormat::Depth => gl::DEPTH_COMPONENT,
            PixelFormat::Stencil => gl::STENCIL_INDEX,
        }
    }
}

impl From<PixelType> for GLenum {
    fn from(kind: PixelType) -> Self {
        match kind {
            PixelType::U8 => gl::UNSIGNED_BYTE,
            PixelType::I8 => gl::BYTE,
            PixelType::U16 => gl::UNSIGNED_SHORT,
            PixelType::I16 => gl::SHORT,
            PixelType::U32 => gl::UNSIGNED_INT,
            PixelType::I32 => gl::INT,
            PixelType::F16 => gl::HALF_FLOAT,
            PixelType::F32 => gl::FLOAT,
        }
    }
}

impl From<QueryKind> for GLenum {
    fn from(kind: QueryKind) -> Self {
        match kind {
            QueryKind::SamplesPassed => gl::SAMPLES_PASSED,
            QueryKind::AnySamplesPassed => gl::ANY_SAMPLES_PASSED,
            QueryKind::AnySamplesPassedConservative => gl::ANY_SAMPLES_PASSED_CONSERVATIVE,
            QueryKind::PrimitivesGenerated => gl::PRIMITIVES_GENERATED,
            QueryKind::TransformFeedbackPrimitivesWritten => {
                gl::TRANSFORM_FEEDBACK_PRIMITIVES_WRITTEN
            }
            QueryKind::TimeElapsed => gl::TIME_ELAPSED,
        }
    }
}

/// Storage flags of `glBufferStorage`.
pub fn storage_flags(usage: BufferUsage) -> GLbitfield {
    let mut flags = 0;

    if usage.dynamic_update {
        flags |= gl::DYNAMIC_STORAGE_BIT;
    }

    if usage.map_read {
        flags |= gl::MAP_READ_BIT;
    }

    if usage.map_write {
        flags |= gl::MAP_WRITE_BIT;
    }

    if usage.map_persistent {
        flags |= gl::MAP_PERSISTENT_BIT;
    }

    if usage.map_coherent {
        flags |= gl::MAP_COHERENT_BIT;
    }

    flags
}

/// Access flags of `glMapNamedBufferRange`. `whole` tells if the mapping
/// covers the complete buffer.
pub fn map_flags(access: MapAccess, usage: BufferUsage, whole: bool) -> GLbitfield {
    let mut flags = 0;

    if access.read {
        flags |= gl::MAP_READ_BIT;
    }

    if access.write {
        flags |= gl::MAP_WRITE_BIT;
    }

    if access.unsynchronized {
        flags |= gl::MAP_UNSYNCHRONIZED_BIT;
    }

    if access.invalidate {
        flags |= if whole {
            gl::MAP_INVALIDATE_BUFFER_BIT
        } else {
            gl::MAP_INVALIDATE_RANGE_BIT
        };
    }

    if access.persistent {
        flags |= gl::MAP_PERSISTENT_BIT;

        if usage.map_coherent {
            flags |= gl::MAP_COHERENT_BIT;
        } else if access.write {
            flags |= gl::MAP_FLUSH_EXPLICIT_BIT;
        }
    }

    flags
}

pub fn debug_source(source: GLenum) -> DebugSource {
    match source {
        gl::DEBUG_SOURCE_API => DebugSource::Api,
        gl::DEBUG_SOURCE_WINDOW_SYSTEM => DebugSource::WindowSystem,
        gl::DEBUG_SOURCE_SHADER_COMPILER => DebugSource::ShaderCompiler,
        gl::DEBUG_SOURCE_THIRD_PARTY => DebugSource::ThirdParty,
        gl::DEBUG_SOURCE_APPLICATION => DebugSource::Application,
        _ => DebugSource::Other,
    }
}

pub fn debug_category(category: GLenum) -> DebugCategory {
    match category {
        gl::DEBUG_TYPE_ERROR => DebugCategory::Error,
        gl::DEBUG_TYPE_DEPRECATED_BEHAVIOR => DebugCategory::DeprecatedBehavior,
        gl::DEBUG_TYPE_UNDEFINED_BEHAVIOR => DebugCategory::UndefinedBehavior,
        gl::DEBUG_TYPE_PORTABILITY => DebugCategory::Portability,
        gl::DEBUG_TYPE_PERFORMANCE => DebugCategory::Performance,
        _ => DebugCategory::Other,
    }
}

pub fn debug_severity(severity: GLenum) -> DebugSeverity {
    match severity {
        gl::DEBUG_SEVERITY_HIGH => DebugSeverity::High,
        gl::DEBUG_SEVERITY_MEDIUM => DebugSeverity::Medium,
        gl::DEBUG_SEVERITY_LOW => DebugSeverity::Low,
        _ => DebugSeverity::Notification,
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::*;

    fn injective<T: Copy + Into<GLenum>>(variants: &[T]) -> bool {
        let values: HashSet<GLenum> = variants.iter().map(|&v| v.into()).collect();
        values.len() == variants.len()
    }

    #[test]
    fn mappings_are_injective() {
        assert!(injective(&Capability::VARIANTS));
        assert!(injective(&[Face::Front, Face::Back]));
        assert!(injective(&Winding::VARIANTS));
        assert!(injective(&FillMode::VARIANTS));
        assert!(injective(&Comparison::VARIANTS));
        assert!(injective(&StencilOp::VARIANTS));
        assert!(injective(&BlendOp::VARIANTS));
        assert!(injective(&BlendFactor::VARIANTS));
        assert!(injective(&LogicOp::VARIANTS));
        assert!(injective(&ShaderKind::VARIANTS));
        assert!(injective(&VertexAttributeFormat::VARIANTS));
        assert!(injective(&DebugSeverity::VARIANTS));
        assert!(injective(&IndexedTarget::VARIANTS));
        assert!(injective(&[IndirectTarget::Draw, IndirectTarget::Dispatch]));
        assert!(injective(&TextureLayout::VARIANTS));
        assert!(injective(&TextureFormat::VARIANTS));
        assert!(injective(&PixelFormat::VARIANTS));
        assert!(injective(&PixelType::VARIANTS));
        assert!(injective(&QueryKind::VARIANTS));
    }

    #[test]
    fn debug_round_trip() {
        for &v in &DebugSeverity::VARIANTS {
            assert_eq!(debug_severity(v.into()), v);
        }

        assert_eq!(debug_category(gl::DEBUG_TYPE_MARKER), DebugCategory::Other);
        assert_eq!(debug_source(gl::DEBUG_SOURCE_API), DebugSource::Api);
    }

    #[test]
    fn storage() {
        assert_eq!(storage_flags(BufferUsage::default()), 0);
        assert_eq!(
            storage_flags(BufferUsage::dynamic()),
            gl::DYNAMIC_STORAGE_BIT
        );
    }

    #[test]
    fn mapping() {
        let usage = BufferUsage::persistent(false);
        assert_eq!(map_flags(MapAccess::read(), usage, true), gl::MAP_READ_BIT);

        let access = MapAccess {
            persistent: true,
            ..MapAccess::write()
        };
        assert_eq!(
            map_flags(access, usage, true),
            gl::MAP_WRITE_BIT | gl::MAP_PERSISTENT_BIT | gl::MAP_FLUSH_EXPLICIT_BIT
        );
        assert_eq!(
            map_flags(access, BufferUsage::persistent(true), true),
            gl::MAP_WRITE_BIT | gl::MAP_PERSISTENT_BIT | gl::MAP_COHERENT_BIT
        );

        let access = MapAccess {
            invalidate: true,
            ..MapAccess::write()
        };
        assert_ne!(map_flags(access, usage, false) & gl::MAP_INVALIDATE_RANGE_BIT, 0);
        assert_ne!(map_flags(access, usage, true) & gl::MAP_INVALIDATE_BUFFER_BIT, 0);
    }
}
