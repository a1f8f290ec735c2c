//! # glframe
//!
//! A small framework around OpenGL 4.5 pipeline objects (samplers, shaders,
//! programs, vertex formats and buffers) and a rendering `Context` that
//! applies monolithic pipeline descriptors while issuing as few driver state
//! changes as possible.
//!
//! ```rust,ignore
//! use glframe::prelude::*;
//!
//! let device = unsafe { GLDevice::load_with(|symbol| window.get_proc_address(symbol) as *const _)? };
//! let mut context = Context::new(device, ContextParams::default())?;
//!
//! let mut pipeline = Pipeline::default();
//! pipeline.rasterizer.cull_mode = CullMode::Back;
//! pipeline.depth_stencil.depth_test = true;
//! pipeline.program = Some(program);
//!
//! context.set_state(&pipeline)?;
//! context.draw(Primitive::Triangles, 0, 36)?;
//! ```

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

#[macro_use]
pub mod utils;
pub mod errors;
pub mod video;

pub mod prelude;
