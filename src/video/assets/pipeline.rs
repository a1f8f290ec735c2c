//! Monolithic pipeline descriptors.
//!
//! A `Pipeline` bundles the entire fixed-function state with a program, a
//! vertex format and the sampler bindings. Every render pass owns its own
//! descriptor, so changing one pass can not leak a forgotten toggle into the
//! next one. The defaults of every state struct are the initial values of an
//! OpenGL context.

use serde::{Deserialize, Serialize};

use crate::video::assets::sampler::SamplerHandle;
use crate::video::assets::shader::ProgramHandle;
use crate::video::assets::vertex::VertexFormatHandle;
use crate::video::{MAX_DRAW_BUFFERS, MAX_SAMPLER_SLOTS};

/// Specify whether front- or back-facing polygons can be culled.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum CullMode {
    None,
    Front,
    Back,
}

impl CullMode {
    pub const VARIANTS: [CullMode; 3] = [CullMode::None, CullMode::Front, CullMode::Back];
}

/// Define front- and back-facing polygons.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Winding {
    Clockwise,
    CounterClockwise,
}

impl Winding {
    pub const VARIANTS: [Winding; 2] = [Winding::Clockwise, Winding::CounterClockwise];
}

/// Rasterization mode of polygons.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum FillMode {
    Solid,
    Wireframe,
    Points,
}

impl FillMode {
    pub const VARIANTS: [FillMode; 3] = [FillMode::Solid, FillMode::Wireframe, FillMode::Points];
}

/// A pixel-wise comparison function, used by depth and stencil tests as well
/// as by depth-comparing samplers.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Comparison {
    Never,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Equal,
    NotEqual,
    Always,
}

impl Comparison {
    pub const VARIANTS: [Comparison; 8] = [
        Comparison::Never,
        Comparison::Less,
        Comparison::LessOrEqual,
        Comparison::Greater,
        Comparison::GreaterOrEqual,
        Comparison::Equal,
        Comparison::NotEqual,
        Comparison::Always,
    ];
}

/// Operations applied to the stencil buffer.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    /// Increment, restarting from zero on overflow.
    IncrementWrap,
    /// Decrement, restarting from the maximum on underflow.
    DecrementWrap,
    /// Increment, clamping to the maximum.
    IncrementClamp,
    /// Decrement, clamping to zero.
    DecrementClamp,
    /// Flip all bits.
    Invert,
}

impl StencilOp {
    pub const VARIANTS: [StencilOp; 8] = [
        StencilOp::Keep,
        StencilOp::Zero,
        StencilOp::Replace,
        StencilOp::IncrementWrap,
        StencilOp::DecrementWrap,
        StencilOp::IncrementClamp,
        StencilOp::DecrementClamp,
        StencilOp::Invert,
    ];
}

/// Specifies how incoming RGBA values (source) and the RGBA in framebuffer
/// (destination) are combined.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

impl BlendOp {
    pub const VARIANTS: [BlendOp; 5] = [
        BlendOp::Add,
        BlendOp::Subtract,
        BlendOp::ReverseSubtract,
        BlendOp::Min,
        BlendOp::Max,
    ];
}

/// Blend factors.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum BlendFactor {
    Zero,
    One,
    SourceAlpha,
    OneMinusSourceAlpha,
    DestinationAlpha,
    OneMinusDestinationAlpha,
    SourceColor,
    OneMinusSourceColor,
    DestinationColor,
    OneMinusDestinationColor,
}

impl BlendFactor {
    pub const VARIANTS: [BlendFactor; 10] = [
        BlendFactor::Zero,
        BlendFactor::One,
        BlendFactor::SourceAlpha,
        BlendFactor::OneMinusSourceAlpha,
        BlendFactor::DestinationAlpha,
        BlendFactor::OneMinusDestinationAlpha,
        BlendFactor::SourceColor,
        BlendFactor::OneMinusSourceColor,
        BlendFactor::DestinationColor,
        BlendFactor::OneMinusDestinationColor,
    ];
}

/// Bitwise operations between the fragment color and the framebuffer.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum LogicOp {
    Clear,
    Set,
    Copy,
    CopyInverted,
    Noop,
    Invert,
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Equiv,
    /// `src & !dst`
    AndReverse,
    /// `!src & dst`
    AndInverted,
    /// `src | !dst`
    OrReverse,
    /// `!src | dst`
    OrInverted,
}

impl LogicOp {
    pub const VARIANTS: [LogicOp; 16] = [
        LogicOp::Clear,
        LogicOp::Set,
        LogicOp::Copy,
        LogicOp::CopyInverted,
        LogicOp::Noop,
        LogicOp::Invert,
        LogicOp::And,
        LogicOp::Nand,
        LogicOp::Or,
        LogicOp::Nor,
        LogicOp::Xor,
        LogicOp::Equiv,
        LogicOp::AndReverse,
        LogicOp::AndInverted,
        LogicOp::OrReverse,
        LogicOp::OrInverted,
    ];
}

/// Alpha blending and logic operations exclude each other globally for all
/// draw buffers.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum BlendMode {
    Disable,
    Blend,
    Logic,
}

impl BlendMode {
    pub const VARIANTS: [BlendMode; 3] = [BlendMode::Disable, BlendMode::Blend, BlendMode::Logic];
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct RasterizerState {
    pub cull_mode: CullMode,
    pub front_face: Winding,
    pub fill_mode: FillMode,
    pub line_width: f32,
    /// Discard primitives right after transform feedback.
    pub discard: bool,
    /// Enables writes to the color channels of the current framebuffer.
    pub color_write: bool,
    /// Dither color components. Only visible on targets with a low bit-depth.
    pub dithering: bool,
}

impl Default for RasterizerState {
    fn default() -> Self {
        RasterizerState {
            cull_mode: CullMode::None,
            front_face: Winding::CounterClockwise,
            fill_mode: FillMode::Solid,
            line_width: 1.0,
            discard: false,
            color_write: true,
            dithering: true,
        }
    }
}

/// Stencil settings of one polygon face.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct StencilFace {
    pub func: Comparison,
    pub reference: i32,
    /// Did not pass the stencil test.
    pub fail: StencilOp,
    /// Passed the stencil test, but failed the depth test.
    pub depth_fail: StencilOp,
    /// Passed both tests.
    pub pass: StencilOp,
}

impl Default for StencilFace {
    fn default() -> Self {
        StencilFace {
            func: Comparison::Always,
            reference: 0,
            fail: StencilOp::Keep,
            depth_fail: StencilOp::Keep,
            pass: StencilOp::Keep,
        }
    }
}

impl StencilFace {
    #[inline]
    pub fn test(&self) -> (Comparison, i32) {
        (self.func, self.reference)
    }

    #[inline]
    pub fn ops(&self) -> (StencilOp, StencilOp, StencilOp) {
        (self.fail, self.depth_fail, self.pass)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct DepthStencilState {
    pub depth_test: bool,
    /// Only meaningful while `depth_test` is enabled.
    pub depth_func: Comparison,
    /// Disabling depth writes makes the depth buffer read only.
    pub depth_write: bool,
    /// Disables both stencil testing and stencil updates.
    pub stencil_test: bool,
    pub stencil_front: StencilFace,
    pub stencil_back: StencilFace,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        DepthStencilState {
            depth_test: false,
            depth_func: Comparison::Less,
            depth_write: true,
            stencil_test: false,
            stencil_front: StencilFace::default(),
            stencil_back: StencilFace::default(),
        }
    }
}

/// Blend settings of a single draw buffer.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct BlendTarget {
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
    pub color_op: BlendOp,
    pub alpha_op: BlendOp,
}

impl Default for BlendTarget {
    fn default() -> Self {
        BlendTarget {
            src_color: BlendFactor::One,
            dst_color: BlendFactor::Zero,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::Zero,
            color_op: BlendOp::Add,
            alpha_op: BlendOp::Add,
        }
    }
}

impl BlendTarget {
    /// Classic `src * a + dst * (1 - a)` blending on all channels.
    pub fn alpha_blend() -> Self {
        BlendTarget {
            src_color: BlendFactor::SourceAlpha,
            dst_color: BlendFactor::OneMinusSourceAlpha,
            src_alpha: BlendFactor::SourceAlpha,
            dst_alpha: BlendFactor::OneMinusSourceAlpha,
            color_op: BlendOp::Add,
            alpha_op: BlendOp::Add,
        }
    }

    /// Adds source and destination on all channels.
    pub fn additive() -> Self {
        BlendTarget {
            src_color: BlendFactor::One,
            dst_color: BlendFactor::One,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::One,
            color_op: BlendOp::Add,
            alpha_op: BlendOp::Add,
        }
    }

    #[inline]
    pub fn equations(&self) -> (BlendOp, BlendOp) {
        (self.color_op, self.alpha_op)
    }

    /// Returns `(src_color, dst_color, src_alpha, dst_alpha)`.
    #[inline]
    pub fn factors(&self) -> (BlendFactor, BlendFactor, BlendFactor, BlendFactor) {
        (self.src_color, self.dst_color, self.src_alpha, self.dst_alpha)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct BlendState {
    /// Only consulted while `mode` is `BlendMode::Blend`.
    pub targets: [BlendTarget; MAX_DRAW_BUFFERS],
    pub mode: BlendMode,
    /// Only has an effect while `mode` is `BlendMode::Logic`.
    pub logic_op: LogicOp,
    /// Use alpha values to generate sub-pixel coverage masks.
    pub alpha_to_coverage: bool,
}

impl Default for BlendState {
    fn default() -> Self {
        BlendState {
            targets: [BlendTarget::default(); MAX_DRAW_BUFFERS],
            mode: BlendMode::Disable,
            logic_op: LogicOp::Copy,
            alpha_to_coverage: false,
        }
    }
}

impl BlendState {
    /// Blending enabled with the same settings on every draw buffer.
    pub fn uniform(target: BlendTarget) -> Self {
        BlendState {
            targets: [target; MAX_DRAW_BUFFERS],
            mode: BlendMode::Blend,
            ..Default::default()
        }
    }
}

/// A collection of the entire render state plus the program and vertex
/// format of a draw call.
///
/// Samplers, programs and vertex formats are referenced by handle. The
/// pipeline observes their identity and never manages their lifetime.
#[derive(Debug, PartialEq, Clone)]
pub struct Pipeline {
    pub rasterizer: RasterizerState,
    pub depth_stencil: DepthStencilState,
    pub blend: BlendState,
    /// Sampler bound to each texture unit, `None` leaves the unit unbound.
    pub samplers: [Option<SamplerHandle>; MAX_SAMPLER_SLOTS],
    pub program: Option<ProgramHandle>,
    /// `None` binds the empty vertex format owned by the context.
    pub vertex_format: Option<VertexFormatHandle>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline {
            rasterizer: RasterizerState::default(),
            depth_stencil: DepthStencilState::default(),
            blend: BlendState::default(),
            samplers: [None; MAX_SAMPLER_SLOTS],
            program: None,
            vertex_format: None,
        }
    }
}

impl Pipeline {
    #[inline]
    pub fn with_program(mut self, program: ProgramHandle) -> Self {
        self.program = Some(program);
        self
    }

    #[inline]
    pub fn with_vertex_format(mut self, format: VertexFormatHandle) -> Self {
        self.vertex_format = Some(format);
        self
    }

    /// Binds `sampler` to texture unit `unit`.
    ///
    /// # Panics
    ///
    /// Panics if `unit` is not smaller than `MAX_SAMPLER_SLOTS`.
    #[inline]
    pub fn with_sampler(mut self, unit: usize, sampler: SamplerHandle) -> Self {
        self.samplers[unit] = Some(sampler);
        self
    }
}

/// Compute dispatches ignore rasterizer, depth-stencil and blend state, so
/// this lightweight descriptor carries only what they use.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ComputePipeline {
    pub samplers: [Option<SamplerHandle>; MAX_SAMPLER_SLOTS],
    pub program: Option<ProgramHandle>,
}

impl Default for ComputePipeline {
    fn default() -> Self {
        ComputePipeline {
            samplers: [None; MAX_SAMPLER_SLOTS],
            program: None,
        }
    }
}

impl ComputePipeline {
    #[inline]
    pub fn with_program(mut self, program: ProgramHandle) -> Self {
        self.program = Some(program);
        self
    }

    #[inline]
    pub fn with_sampler(mut self, unit: usize, sampler: SamplerHandle) -> Self {
        self.samplers[unit] = Some(sampler);
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::prelude::Handle;

    #[test]
    fn defaults() {
        let pipeline = Pipeline::default();

        assert_eq!(pipeline.rasterizer.cull_mode, CullMode::None);
        assert_eq!(pipeline.rasterizer.front_face, Winding::CounterClockwise);
        assert_eq!(pipeline.rasterizer.line_width, 1.0);
        assert!(pipeline.rasterizer.dithering);
        assert!(!pipeline.depth_stencil.depth_test);
        assert_eq!(pipeline.depth_stencil.depth_func, Comparison::Less);
        assert!(pipeline.depth_stencil.depth_write);
        assert_eq!(pipeline.depth_stencil.stencil_back.func, Comparison::Always);
        assert_eq!(pipeline.blend.mode, BlendMode::Disable);
        assert_eq!(pipeline.blend.logic_op, LogicOp::Copy);
        assert!(pipeline.samplers.iter().all(Option::is_none));
        assert!(pipeline.program.is_none());
        assert!(pipeline.vertex_format.is_none());
    }

    #[test]
    fn builders() {
        let sampler = SamplerHandle::from(Handle::new(0, 1));
        let program = ProgramHandle::from(Handle::new(2, 1));

        let pipeline = Pipeline::default()
            .with_program(program)
            .with_sampler(5, sampler);

        assert_eq!(pipeline.program, Some(program));
        assert_eq!(pipeline.samplers[5], Some(sampler));
        assert_eq!(pipeline.samplers.iter().filter(|v| v.is_some()).count(), 1);

        let compute = ComputePipeline::default().with_sampler(63, sampler);
        assert_eq!(compute.samplers[63], Some(sampler));
    }

    #[test]
    fn uniform_blend() {
        let blend = BlendState::uniform(BlendTarget::alpha_blend());
        assert_eq!(blend.mode, BlendMode::Blend);
        assert!(blend.targets.iter().all(|v| *v == BlendTarget::alpha_blend()));
        assert_eq!(
            blend.targets[3].factors(),
            (
                BlendFactor::SourceAlpha,
                BlendFactor::OneMinusSourceAlpha,
                BlendFactor::SourceAlpha,
                BlendFactor::OneMinusSourceAlpha
            )
        );
    }

    #[test]
    fn serialize() {
        let mut depth_stencil = DepthStencilState::default();
        depth_stencil.depth_test = true;
        depth_stencil.stencil_front.fail = StencilOp::Invert;

        let json = serde_json::to_string(&depth_stencil).unwrap();
        let back: DepthStencilState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, depth_stencil);

        let blend = BlendState::uniform(BlendTarget::additive());
        let json = serde_json::to_string(&blend).unwrap();
        assert_eq!(serde_json::from_str::<BlendState>(&json).unwrap(), blend);

        let rasterizer: RasterizerState = serde_json::from_str(
            r#"{"cull_mode":"Back","front_face":"Clockwise","fill_mode":"Wireframe",
                "line_width":2.0,"discard":false,"color_write":true,"dithering":false}"#,
        )
        .unwrap();
        assert_eq!(rasterizer.cull_mode, CullMode::Back);
        assert_eq!(rasterizer.fill_mode, FillMode::Wireframe);
    }
}
