//! The backend of the context, which should be responsible for only one thing:
//! submitting commands to the low-level OpenGL video APIs.

pub mod headless;

use super::assets::prelude::*;
use super::debug::{DebugMessage, DebugSeverity};

use crate::errors::*;

/// Name of a driver object. Zero never names a live object.
pub type ResourceId = u32;

/// Global toggles of the driver.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Capability {
    CullFace,
    RasterizerDiscard,
    Dither,
    DepthTest,
    StencilTest,
    Blend,
    ColorLogicOp,
    SampleAlphaToCoverage,
    TextureCubeMapSeamless,
}

impl Capability {
    pub const VARIANTS: [Capability; 9] = [
        Capability::CullFace,
        Capability::RasterizerDiscard,
        Capability::Dither,
        Capability::DepthTest,
        Capability::StencilTest,
        Capability::Blend,
        Capability::ColorLogicOp,
        Capability::SampleAlphaToCoverage,
        Capability::TextureCubeMapSeamless,
    ];
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Face {
    Front,
    Back,
}

/// Buffer targets with an array of binding points that shaders address by
/// index.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum IndexedTarget {
    Uniform,
    ShaderStorage,
    AtomicCounter,
    TransformFeedback,
}

impl IndexedTarget {
    pub const VARIANTS: [IndexedTarget; 4] = [
        IndexedTarget::Uniform,
        IndexedTarget::ShaderStorage,
        IndexedTarget::AtomicCounter,
        IndexedTarget::TransformFeedback,
    ];
}

/// Buffer targets holding the arguments of indirect draws and dispatches.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum IndirectTarget {
    Draw,
    Dispatch,
}

/// Where a framebuffer attachment is attached to.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum AttachmentPoint {
    Color(u32),
    Depth,
    DepthStencil,
}

/// A framebuffer attachment resolved to driver names.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AttachmentTarget {
    Texture {
        id: ResourceId,
        level: u32,
        layer: Option<u32>,
    },
    Renderbuffer(ResourceId),
}

/// A single driver call. This is the complete vocabulary the context speaks
/// when it moves the driver from one state to another.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Command {
    Enable(Capability),
    Disable(Capability),
    CullFace(Face),
    FrontFace(Winding),
    PolygonMode(FillMode),
    LineWidth(f32),
    /// Toggles writes to all four color channels.
    ColorMask(bool),
    DepthFunc(Comparison),
    DepthMask(bool),
    StencilFuncSeparate {
        face: Face,
        func: Comparison,
        reference: i32,
        mask: u32,
    },
    StencilOpSeparate {
        face: Face,
        fail: StencilOp,
        depth_fail: StencilOp,
        pass: StencilOp,
    },
    BlendEquationSeparate {
        slot: u32,
        color: BlendOp,
        alpha: BlendOp,
    },
    BlendFuncSeparate {
        slot: u32,
        src_color: BlendFactor,
        dst_color: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    },
    LogicOp(LogicOp),
    /// `None` unbinds whatever sampler is attached to the unit.
    BindSampler {
        unit: u32,
        sampler: Option<ResourceId>,
    },
    UseProgram(ResourceId),
    BindVertexFormat(ResourceId),
    BindVertexBuffer {
        binding: u32,
        buffer: ResourceId,
        offset: usize,
        stride: u32,
    },
    BindIndexBuffer(ResourceId),
    BindBufferRange {
        target: IndexedTarget,
        index: u32,
        buffer: ResourceId,
        offset: usize,
        size: usize,
    },
    BindIndirectBuffer {
        target: IndirectTarget,
        buffer: ResourceId,
    },
    /// `None` unbinds whatever texture is attached to the unit.
    BindTexture {
        unit: u32,
        texture: Option<ResourceId>,
    },
    /// `None` binds the default framebuffer.
    BindFramebuffer(Option<ResourceId>),
    BeginQuery {
        kind: QueryKind,
        query: ResourceId,
    },
    EndQuery(QueryKind),
    Draw {
        primitive: Primitive,
        first: u32,
        count: u32,
        instances: u32,
    },
    DrawIndexed {
        primitive: Primitive,
        format: IndexFormat,
        offset: usize,
        count: u32,
        instances: u32,
    },
    /// Reads the draw arguments at byte `offset` of the bound draw indirect
    /// buffer.
    DrawIndirect {
        primitive: Primitive,
        offset: usize,
    },
    Dispatch {
        x: u32,
        y: u32,
        z: u32,
    },
    DispatchIndirect {
        offset: usize,
    },
}

impl Command {
    /// Returns true for commands that mutate the pipeline state tracked by
    /// the context. The program and vertex format binds are issued on every
    /// state apply and count as cheap rebinds. Resource binds are issued on
    /// request only, while draws, dispatches and queries consume state.
    pub fn is_state_change(&self) -> bool {
        match *self {
            Command::UseProgram(_)
            | Command::BindVertexFormat(_)
            | Command::BindVertexBuffer { .. }
            | Command::BindIndexBuffer(_)
            | Command::BindBufferRange { .. }
            | Command::BindIndirectBuffer { .. }
            | Command::BindTexture { .. }
            | Command::BindFramebuffer(_)
            | Command::BeginQuery { .. }
            | Command::EndQuery(_)
            | Command::Draw { .. }
            | Command::DrawIndexed { .. }
            | Command::DrawIndirect { .. }
            | Command::Dispatch { .. }
            | Command::DispatchIndirect { .. } => false,
            _ => true,
        }
    }
}

/// A device owns the driver connection. Every method must be called from the
/// thread whose driver context is current.
pub trait Device {
    /// Human readable description of the driver, e.g. vendor, renderer and version.
    fn describe(&self) -> String;

    /// Installs the debug output with a minimum severity. Messages of a lower
    /// severity are dropped by the driver.
    unsafe fn configure_debug_output(
        &mut self,
        min: DebugSeverity,
        synchronous: bool,
    ) -> Result<()>;

    /// Takes all debug messages collected since the last call.
    fn drain_debug_messages(&mut self) -> Vec<DebugMessage>;

    unsafe fn execute(&mut self, cmd: Command) -> Result<()>;

    unsafe fn create_sampler(&mut self, params: &SamplerParams) -> Result<ResourceId>;

    unsafe fn delete_sampler(&mut self, id: ResourceId) -> Result<()>;

    /// Compiles a single stage. Fails with the compiler log attached.
    unsafe fn create_shader(
        &mut self,
        kind: ShaderKind,
        name: &str,
        source: &str,
    ) -> Result<ResourceId>;

    unsafe fn delete_shader(&mut self, id: ResourceId) -> Result<()>;

    /// Links compiled stages into a program. Fails with the linker log attached.
    unsafe fn create_program(&mut self, shaders: &[ResourceId]) -> Result<ResourceId>;

    unsafe fn delete_program(&mut self, id: ResourceId) -> Result<()>;

    /// Returns the binary format and the bytes of a linked program.
    unsafe fn program_binary(&mut self, id: ResourceId) -> Result<(u32, Vec<u8>)>;

    /// Creates a program from the output of `program_binary`. Fails with
    /// `ProgramLinkFailure` if the driver rejects the binary.
    unsafe fn create_program_from_binary(
        &mut self,
        format: u32,
        bytes: &[u8],
    ) -> Result<ResourceId>;

    unsafe fn create_vertex_format(&mut self, params: &VertexFormatParams) -> Result<ResourceId>;

    unsafe fn delete_vertex_format(&mut self, id: ResourceId) -> Result<()>;

    unsafe fn create_buffer(
        &mut self,
        params: &BufferParams,
        data: Option<&[u8]>,
    ) -> Result<ResourceId>;

    unsafe fn update_buffer(&mut self, id: ResourceId, offset: usize, data: &[u8]) -> Result<()>;

    /// Fills the whole buffer with zeros.
    unsafe fn clear_buffer(&mut self, id: ResourceId) -> Result<()>;

    unsafe fn delete_buffer(&mut self, id: ResourceId) -> Result<()>;

    /// Maps `size` bytes starting at `offset`. The pointer stays valid until
    /// the buffer is unmapped or deleted.
    unsafe fn map_buffer(
        &mut self,
        id: ResourceId,
        offset: usize,
        size: usize,
        access: MapAccess,
        usage: BufferUsage,
    ) -> Result<*mut u8>;

    unsafe fn unmap_buffer(&mut self, id: ResourceId) -> Result<()>;

    /// Makes CPU writes to a mapped buffer visible to the GPU. `explicit`
    /// is the length of a mapping that needs an explicit flush.
    unsafe fn flush_buffer(&mut self, id: ResourceId, explicit: Option<usize>) -> Result<()>;

    /// Makes GPU writes to mapped buffers visible to the CPU, waiting for
    /// all commands issued so far.
    unsafe fn receive_buffers(&mut self) -> Result<()>;

    /// Allocates storage for all levels and layers. The contents are undefined.
    unsafe fn create_texture(&mut self, params: &TextureParams) -> Result<ResourceId>;

    /// Uploads a complete image of mip `level` and `layer`.
    unsafe fn update_texture(
        &mut self,
        id: ResourceId,
        params: &TextureParams,
        level: u32,
        layer: u32,
        format: PixelFormat,
        kind: PixelType,
        data: &[u8],
    ) -> Result<()>;

    /// Fills all mip levels below the base level.
    unsafe fn generate_mipmaps(&mut self, id: ResourceId) -> Result<()>;

    unsafe fn delete_texture(&mut self, id: ResourceId) -> Result<()>;

    unsafe fn create_renderbuffer(&mut self, params: &RenderbufferParams) -> Result<ResourceId>;

    unsafe fn delete_renderbuffer(&mut self, id: ResourceId) -> Result<()>;

    /// Creates a framebuffer, enables its color attachments for drawing and
    /// checks its completeness. Fails with `FramebufferInvalid` otherwise.
    unsafe fn create_framebuffer(
        &mut self,
        attachments: &[(AttachmentPoint, AttachmentTarget)],
    ) -> Result<ResourceId>;

    unsafe fn delete_framebuffer(&mut self, id: ResourceId) -> Result<()>;

    unsafe fn create_query(&mut self, kind: QueryKind) -> Result<ResourceId>;

    /// Returns the raw result of an ended query. Without `wait` this returns
    /// `None` while the result is not available yet.
    unsafe fn query_result(&mut self, id: ResourceId, wait: bool) -> Result<Option<u64>>;

    unsafe fn delete_query(&mut self, id: ResourceId) -> Result<()>;
}

#[cfg(not(target_arch = "wasm32"))]
pub mod gl;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn state_changes() {
        assert!(Command::Enable(Capability::Blend).is_state_change());
        assert!(Command::LineWidth(2.0).is_state_change());
        assert!(Command::BindSampler {
            unit: 3,
            sampler: None
        }
        .is_state_change());

        assert!(!Command::UseProgram(1).is_state_change());
        assert!(!Command::BindVertexFormat(1).is_state_change());
        assert!(!Command::Dispatch { x: 1, y: 1, z: 1 }.is_state_change());
        assert!(!Command::BindTexture {
            unit: 0,
            texture: Some(1)
        }
        .is_state_change());
        assert!(!Command::BindFramebuffer(None).is_state_change());
        assert!(!Command::EndQuery(QueryKind::TimeElapsed).is_state_change());
    }
}
