//! The OpenGL 4.5 device.

pub mod capabilities;
pub mod types;

mod device;

pub use self::device::GLDevice;
