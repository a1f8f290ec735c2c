//! OpenGL pipeline objects and the state-diffing rendering context.
//!
//! A `Pipeline` describes the complete fixed-function state of a draw call
//! together with its program, vertex format and sampler bindings. The
//! `Context` keeps a single snapshot of what the driver currently holds and,
//! on `set_state`, emits only the commands needed to move the driver from the
//! snapshot to the requested pipeline.
//!
//! Commands are issued through the `Device` trait. `GLDevice` talks to a real
//! OpenGL 4.5 context; `HeadlessDevice` records the commands instead, which is
//! what the tests use.

/// Maximum number of draw buffers with individual blend settings.
pub const MAX_DRAW_BUFFERS: usize = 8;
/// Maximum number of sampler binding units a pipeline can describe.
pub const MAX_SAMPLER_SLOTS: usize = 64;
/// Maximum number of vertex attributes in a vertex format.
pub const MAX_VERTEX_ATTRIBUTES: usize = 16;

pub mod assets;
pub mod backends;
pub mod context;
pub mod debug;
pub mod errors;
pub mod settings;

mod state;

pub mod prelude {
    pub use super::assets::prelude::*;
    pub use super::backends::headless::HeadlessDevice;
    pub use super::backends::{
        AttachmentPoint, AttachmentTarget, Capability, Command, Device, Face, IndexedTarget,
        IndirectTarget, ResourceId,
    };
    pub use super::context::Context;
    pub use super::debug::{DebugCategory, DebugMessage, DebugSeverity, DebugSource, Disposition};
    pub use super::errors::{Error, Result};
    pub use super::settings::ContextParams;

    #[cfg(not(target_arch = "wasm32"))]
    pub use super::backends::gl::GLDevice;
}
