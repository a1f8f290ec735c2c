pub mod buffer;
pub mod framebuffer;
pub mod pipeline;
pub mod query;
pub mod sampler;
pub mod shader;
pub mod texture;
pub mod vertex;

pub mod prelude {
    pub use super::buffer::{BufferHandle, BufferKind, BufferParams, BufferUsage, MapAccess};
    pub use super::framebuffer::{
        Attachment, FramebufferHandle, FramebufferParams, RenderbufferHandle, RenderbufferParams,
    };
    pub use super::pipeline::{
        BlendFactor, BlendMode, BlendOp, BlendState, BlendTarget, Comparison, ComputePipeline,
        CullMode, DepthStencilState, FillMode, LogicOp, Pipeline, RasterizerState, StencilFace,
        StencilOp, Winding,
    };
    pub use super::query::{QueryHandle, QueryKind, QueryResults};
    pub use super::sampler::{MinFilter, SamplerFilter, SamplerHandle, SamplerParams, SamplerWrap};
    pub use super::shader::{ProgramBinary, ProgramHandle, ShaderHandle, ShaderKind};
    pub use super::texture::{
        PixelFormat, PixelType, TextureFormat, TextureHandle, TextureLayout, TextureParams,
    };
    pub use super::vertex::{
        AttributePath, IndexFormat, Primitive, VertexAttribute, VertexAttributeFormat,
        VertexFormatHandle, VertexFormatParams,
    };
}
