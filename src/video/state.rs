//! The mirror of what the driver currently holds.

use super::assets::prelude::*;
use super::backends::{Capability, Command, Face, ResourceId};
use super::{MAX_DRAW_BUFFERS, MAX_SAMPLER_SLOTS};

/// A value known to be set on the driver, or unknown.
///
/// An unknown value compares unequal to anything, so the next request always
/// goes through to the driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cached<T>(Option<T>);

impl<T> Cached<T>
where
    T: PartialEq + Copy,
{
    #[inline]
    pub fn new(initial: T) -> Self {
        Cached(Some(initial))
    }

    #[inline]
    pub fn unknown() -> Self {
        Cached(None)
    }

    #[inline]
    pub fn get(&self) -> Option<T> {
        self.0
    }

    #[inline]
    pub fn differs(&self, value: T) -> bool {
        self.0 != Some(value)
    }

    /// Stores `value` and returns true if it was not already cached.
    #[inline]
    pub fn set(&mut self, value: T) -> bool {
        if self.differs(value) {
            self.0 = Some(value);
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn invalidate(&mut self) {
        self.0 = None;
    }
}

#[derive(Debug, Clone, Copy)]
struct RasterizerCache {
    cull_mode: Cached<CullMode>,
    front_face: Cached<Winding>,
    fill_mode: Cached<FillMode>,
    line_width: Cached<f32>,
    discard: Cached<bool>,
    color_write: Cached<bool>,
    dithering: Cached<bool>,
}

#[derive(Debug, Clone, Copy)]
struct StencilFaceCache {
    test: Cached<(Comparison, i32)>,
    ops: Cached<(StencilOp, StencilOp, StencilOp)>,
}

#[derive(Debug, Clone, Copy)]
struct DepthStencilCache {
    depth_test: Cached<bool>,
    depth_func: Cached<Comparison>,
    depth_write: Cached<bool>,
    stencil_test: Cached<bool>,
    front: StencilFaceCache,
    back: StencilFaceCache,
}

#[derive(Debug, Clone, Copy)]
struct BlendTargetCache {
    equations: Cached<(BlendOp, BlendOp)>,
    factors: Cached<(BlendFactor, BlendFactor, BlendFactor, BlendFactor)>,
}

#[derive(Debug, Clone, Copy)]
struct BlendCache {
    mode: Cached<BlendMode>,
    targets: [BlendTargetCache; MAX_DRAW_BUFFERS],
    logic_op: Cached<LogicOp>,
    alpha_to_coverage: Cached<bool>,
}

/// The state the driver holds, minus the program and vertex format which are
/// rebound on every apply.
///
/// Settings that only matter while their test is enabled (depth function,
/// stencil faces, per draw buffer blending) are forgotten whenever the test
/// is off, and pushed again once it gets enabled.
pub struct StateSnapshot {
    rasterizer: RasterizerCache,
    depth_stencil: DepthStencilCache,
    blend: BlendCache,
    samplers: [Cached<Option<SamplerHandle>>; MAX_SAMPLER_SLOTS],
}

const UNKNOWN_FACE: StencilFaceCache = StencilFaceCache {
    test: Cached(None),
    ops: Cached(None),
};

const UNKNOWN_TARGET: BlendTargetCache = BlendTargetCache {
    equations: Cached(None),
    factors: Cached(None),
};

impl StateSnapshot {
    /// Creates a snapshot of a freshly created driver context.
    pub fn new() -> Self {
        let rs = RasterizerState::default();
        let ds = DepthStencilState::default();
        let bs = BlendState::default();

        StateSnapshot {
            rasterizer: RasterizerCache {
                cull_mode: Cached::new(rs.cull_mode),
                front_face: Cached::new(rs.front_face),
                fill_mode: Cached::new(rs.fill_mode),
                line_width: Cached::new(rs.line_width),
                discard: Cached::new(rs.discard),
                color_write: Cached::new(rs.color_write),
                dithering: Cached::new(rs.dithering),
            },
            depth_stencil: DepthStencilCache {
                depth_test: Cached::new(ds.depth_test),
                depth_func: Cached::unknown(),
                depth_write: Cached::new(ds.depth_write),
                stencil_test: Cached::new(ds.stencil_test),
                front: UNKNOWN_FACE,
                back: UNKNOWN_FACE,
            },
            blend: BlendCache {
                mode: Cached::new(bs.mode),
                targets: [UNKNOWN_TARGET; MAX_DRAW_BUFFERS],
                logic_op: Cached::new(bs.logic_op),
                alpha_to_coverage: Cached::new(bs.alpha_to_coverage),
            },
            samplers: [Cached::new(None); MAX_SAMPLER_SLOTS],
        }
    }

    /// Forgets everything, so the next apply pushes the complete state.
    pub fn invalidate(&mut self) {
        let r = &mut self.rasterizer;
        r.cull_mode.invalidate();
        r.front_face.invalidate();
        r.fill_mode.invalidate();
        r.line_width.invalidate();
        r.discard.invalidate();
        r.color_write.invalidate();
        r.dithering.invalidate();

        let ds = &mut self.depth_stencil;
        ds.depth_test.invalidate();
        ds.depth_func.invalidate();
        ds.depth_write.invalidate();
        ds.stencil_test.invalidate();
        ds.front = UNKNOWN_FACE;
        ds.back = UNKNOWN_FACE;

        let b = &mut self.blend;
        b.mode.invalidate();
        b.targets = [UNKNOWN_TARGET; MAX_DRAW_BUFFERS];
        b.logic_op.invalidate();
        b.alpha_to_coverage.invalidate();

        for v in self.samplers.iter_mut() {
            v.invalidate();
        }
    }

    pub fn apply_rasterizer(&mut self, state: &RasterizerState, out: &mut Vec<Command>) {
        let cache = &mut self.rasterizer;

        if cache.cull_mode.differs(state.cull_mode) {
            let was_culling = match cache.cull_mode.get() {
                Some(CullMode::Front) | Some(CullMode::Back) => true,
                _ => false,
            };

            match state.cull_mode {
                CullMode::None => out.push(Command::Disable(Capability::CullFace)),
                CullMode::Front | CullMode::Back => {
                    if !was_culling {
                        out.push(Command::Enable(Capability::CullFace));
                    }

                    let face = if state.cull_mode == CullMode::Front {
                        Face::Front
                    } else {
                        Face::Back
                    };

                    out.push(Command::CullFace(face));
                }
            }

            cache.cull_mode.set(state.cull_mode);
        }

        if cache.front_face.set(state.front_face) {
            out.push(Command::FrontFace(state.front_face));
        }

        if cache.fill_mode.set(state.fill_mode) {
            out.push(Command::PolygonMode(state.fill_mode));
        }

        if cache.line_width.set(state.line_width) {
            out.push(Command::LineWidth(state.line_width));
        }

        if cache.discard.set(state.discard) {
            out.push(toggle(Capability::RasterizerDiscard, state.discard));
        }

        if cache.color_write.set(state.color_write) {
            out.push(Command::ColorMask(state.color_write));
        }

        if cache.dithering.set(state.dithering) {
            out.push(toggle(Capability::Dither, state.dithering));
        }
    }

    pub fn apply_depth_stencil(&mut self, state: &DepthStencilState, out: &mut Vec<Command>) {
        let cache = &mut self.depth_stencil;

        if cache.depth_test.set(state.depth_test) {
            out.push(toggle(Capability::DepthTest, state.depth_test));
        }

        if state.depth_test {
            if cache.depth_func.set(state.depth_func) {
                out.push(Command::DepthFunc(state.depth_func));
            }
        } else {
            cache.depth_func.invalidate();
        }

        if cache.depth_write.set(state.depth_write) {
            out.push(Command::DepthMask(state.depth_write));
        }

        if cache.stencil_test.set(state.stencil_test) {
            out.push(toggle(Capability::StencilTest, state.stencil_test));
        }

        if state.stencil_test {
            apply_stencil_face(Face::Front, &mut cache.front, &state.stencil_front, out);
            apply_stencil_face(Face::Back, &mut cache.back, &state.stencil_back, out);
        } else {
            cache.front = UNKNOWN_FACE;
            cache.back = UNKNOWN_FACE;
        }
    }

    pub fn apply_blend(&mut self, state: &BlendState, out: &mut Vec<Command>) {
        let cache = &mut self.blend;

        if cache.mode.set(state.mode) {
            match state.mode {
                BlendMode::Blend => {
                    out.push(Command::Enable(Capability::Blend));
                    out.push(Command::Disable(Capability::ColorLogicOp));
                }
                BlendMode::Logic => {
                    out.push(Command::Enable(Capability::ColorLogicOp));
                    out.push(Command::Disable(Capability::Blend));
                }
                BlendMode::Disable => {
                    out.push(Command::Disable(Capability::Blend));
                    out.push(Command::Disable(Capability::ColorLogicOp));
                }
            }
        }

        if state.mode == BlendMode::Blend {
            for (slot, (target, v)) in cache.targets.iter_mut().zip(&state.targets).enumerate() {
                if target.equations.set(v.equations()) {
                    out.push(Command::BlendEquationSeparate {
                        slot: slot as u32,
                        color: v.color_op,
                        alpha: v.alpha_op,
                    });
                }

                if target.factors.set(v.factors()) {
                    out.push(Command::BlendFuncSeparate {
                        slot: slot as u32,
                        src_color: v.src_color,
                        dst_color: v.dst_color,
                        src_alpha: v.src_alpha,
                        dst_alpha: v.dst_alpha,
                    });
                }
            }
        } else {
            cache.targets = [UNKNOWN_TARGET; MAX_DRAW_BUFFERS];
        }

        if cache.logic_op.set(state.logic_op) {
            out.push(Command::LogicOp(state.logic_op));
        }

        if cache.alpha_to_coverage.set(state.alpha_to_coverage) {
            out.push(toggle(
                Capability::SampleAlphaToCoverage,
                state.alpha_to_coverage,
            ));
        }
    }

    /// `ids` holds the driver name of every sampler in `samplers`, slot by slot.
    pub fn apply_samplers(
        &mut self,
        samplers: &[Option<SamplerHandle>; MAX_SAMPLER_SLOTS],
        ids: &[Option<ResourceId>; MAX_SAMPLER_SLOTS],
        out: &mut Vec<Command>,
    ) {
        for (unit, cache) in self.samplers.iter_mut().enumerate() {
            if cache.set(samplers[unit]) {
                out.push(Command::BindSampler {
                    unit: unit as u32,
                    sampler: ids[unit],
                });
            }
        }
    }

    /// Deleted samplers are unbound from every unit by the driver.
    pub fn forget_sampler(&mut self, handle: SamplerHandle) {
        for v in self.samplers.iter_mut() {
            if v.get() == Some(Some(handle)) {
                *v = Cached::new(None);
            }
        }
    }

    /// Returns true if applying `pipeline` would not change any state.
    pub fn matches(&self, pipeline: &Pipeline) -> bool {
        let r = &self.rasterizer;
        let rs = &pipeline.rasterizer;
        let rasterizer = !r.cull_mode.differs(rs.cull_mode)
            && !r.front_face.differs(rs.front_face)
            && !r.fill_mode.differs(rs.fill_mode)
            && !r.line_width.differs(rs.line_width)
            && !r.discard.differs(rs.discard)
            && !r.color_write.differs(rs.color_write)
            && !r.dithering.differs(rs.dithering);

        let d = &self.depth_stencil;
        let ds = &pipeline.depth_stencil;
        let depth_stencil = !d.depth_test.differs(ds.depth_test)
            && (!ds.depth_test || !d.depth_func.differs(ds.depth_func))
            && !d.depth_write.differs(ds.depth_write)
            && !d.stencil_test.differs(ds.stencil_test)
            && (!ds.stencil_test
                || (!d.front.test.differs(ds.stencil_front.test())
                    && !d.front.ops.differs(ds.stencil_front.ops())
                    && !d.back.test.differs(ds.stencil_back.test())
                    && !d.back.ops.differs(ds.stencil_back.ops())));

        let b = &self.blend;
        let bs = &pipeline.blend;
        let blend = !b.mode.differs(bs.mode)
            && (bs.mode != BlendMode::Blend
                || b.targets.iter().zip(&bs.targets).all(|(c, v)| {
                    !c.equations.differs(v.equations()) && !c.factors.differs(v.factors())
                }))
            && !b.logic_op.differs(bs.logic_op)
            && !b.alpha_to_coverage.differs(bs.alpha_to_coverage);

        let samplers = self
            .samplers
            .iter()
            .zip(pipeline.samplers.iter())
            .all(|(c, v)| !c.differs(*v));

        rasterizer && depth_stencil && blend && samplers
    }
}

fn apply_stencil_face(
    face: Face,
    cache: &mut StencilFaceCache,
    state: &StencilFace,
    out: &mut Vec<Command>,
) {
    if cache.test.set(state.test()) {
        out.push(Command::StencilFuncSeparate {
            face,
            func: state.func,
            reference: state.reference,
            mask: !0,
        });
    }

    if cache.ops.set(state.ops()) {
        out.push(Command::StencilOpSeparate {
            face,
            fail: state.fail,
            depth_fail: state.depth_fail,
            pass: state.pass,
        });
    }
}

#[inline]
fn toggle(cap: Capability, enable: bool) -> Command {
    if enable {
        Command::Enable(cap)
    } else {
        Command::Disable(cap)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::prelude::Handle;

    #[test]
    fn cached() {
        let mut v = Cached::new(1);
        assert!(!v.differs(1));
        assert!(!v.set(1));
        assert!(v.set(2));
        assert_eq!(v.get(), Some(2));

        v.invalidate();
        assert!(v.differs(2));
        assert!(v.set(2));
        assert!(!v.set(2));
    }

    #[test]
    fn defaults_are_silent() {
        let mut snapshot = StateSnapshot::new();
        let mut out = Vec::new();

        snapshot.apply_rasterizer(&RasterizerState::default(), &mut out);
        snapshot.apply_depth_stencil(&DepthStencilState::default(), &mut out);
        snapshot.apply_blend(&BlendState::default(), &mut out);
        assert!(out.is_empty());
        assert!(snapshot.matches(&Pipeline::default()));
    }

    #[test]
    fn cull_face_switch() {
        let mut snapshot = StateSnapshot::new();
        let mut out = Vec::new();
        let mut rs = RasterizerState::default();

        rs.cull_mode = CullMode::Front;
        snapshot.apply_rasterizer(&rs, &mut out);
        assert_eq!(
            out,
            [
                Command::Enable(Capability::CullFace),
                Command::CullFace(Face::Front)
            ]
        );

        out.clear();
        rs.cull_mode = CullMode::Back;
        snapshot.apply_rasterizer(&rs, &mut out);
        assert_eq!(out, [Command::CullFace(Face::Back)]);

        out.clear();
        rs.cull_mode = CullMode::None;
        snapshot.apply_rasterizer(&rs, &mut out);
        assert_eq!(out, [Command::Disable(Capability::CullFace)]);
    }

    #[test]
    fn depth_func_forgotten_while_disabled() {
        let mut snapshot = StateSnapshot::new();
        let mut out = Vec::new();
        let mut ds = DepthStencilState::default();

        ds.depth_test = true;
        snapshot.apply_depth_stencil(&ds, &mut out);
        assert_eq!(
            out,
            [
                Command::Enable(Capability::DepthTest),
                Command::DepthFunc(Comparison::Less)
            ]
        );

        out.clear();
        ds.depth_test = false;
        ds.depth_func = Comparison::Greater;
        snapshot.apply_depth_stencil(&ds, &mut out);
        assert_eq!(out, [Command::Disable(Capability::DepthTest)]);

        out.clear();
        ds.depth_test = true;
        ds.depth_func = Comparison::Less;
        snapshot.apply_depth_stencil(&ds, &mut out);
        assert_eq!(
            out,
            [
                Command::Enable(Capability::DepthTest),
                Command::DepthFunc(Comparison::Less)
            ]
        );
    }

    #[test]
    fn stencil_faces() {
        let mut snapshot = StateSnapshot::new();
        let mut out = Vec::new();
        let mut ds = DepthStencilState::default();

        ds.stencil_test = true;
        ds.stencil_front.reference = 1;
        snapshot.apply_depth_stencil(&ds, &mut out);
        assert_eq!(out.len(), 5);
        assert_eq!(out[0], Command::Enable(Capability::StencilTest));
        assert_eq!(
            out[1],
            Command::StencilFuncSeparate {
                face: Face::Front,
                func: Comparison::Always,
                reference: 1,
                mask: 0xffff_ffff,
            }
        );

        out.clear();
        ds.stencil_back.pass = StencilOp::Replace;
        snapshot.apply_depth_stencil(&ds, &mut out);
        assert_eq!(
            out,
            [Command::StencilOpSeparate {
                face: Face::Back,
                fail: StencilOp::Keep,
                depth_fail: StencilOp::Keep,
                pass: StencilOp::Replace,
            }]
        );
    }

    #[test]
    fn blend_targets() {
        let mut snapshot = StateSnapshot::new();
        let mut out = Vec::new();
        let mut bs = BlendState::uniform(BlendTarget::alpha_blend());

        snapshot.apply_blend(&bs, &mut out);
        assert_eq!(out.len(), 2 + 2 * MAX_DRAW_BUFFERS);

        out.clear();
        bs.targets[2].color_op = BlendOp::Max;
        snapshot.apply_blend(&bs, &mut out);
        assert_eq!(
            out,
            [Command::BlendEquationSeparate {
                slot: 2,
                color: BlendOp::Max,
                alpha: BlendOp::Add,
            }]
        );
    }

    #[test]
    fn samplers() {
        let mut snapshot = StateSnapshot::new();
        let mut out = Vec::new();
        let handle = SamplerHandle::from(Handle::new(0, 1));

        let mut samplers = [None; MAX_SAMPLER_SLOTS];
        let mut ids = [None; MAX_SAMPLER_SLOTS];
        samplers[7] = Some(handle);
        ids[7] = Some(3);

        snapshot.apply_samplers(&samplers, &ids, &mut out);
        assert_eq!(
            out,
            [Command::BindSampler {
                unit: 7,
                sampler: Some(3)
            }]
        );

        snapshot.forget_sampler(handle);
        out.clear();
        snapshot.apply_samplers(&samplers, &ids, &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn invalidate() {
        let mut snapshot = StateSnapshot::new();
        let mut out = Vec::new();

        snapshot.invalidate();
        assert!(!snapshot.matches(&Pipeline::default()));

        snapshot.apply_rasterizer(&RasterizerState::default(), &mut out);
        assert_eq!(out.len(), 7);
        assert_eq!(out[0], Command::Disable(Capability::CullFace));
    }
}
