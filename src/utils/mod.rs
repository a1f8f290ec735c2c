//! Commonly used utilities like handles and pools.

#[macro_use]
pub mod handle;
pub mod handle_object_pool;
pub mod handle_pool;

pub mod prelude {
    pub use super::handle::{Handle, HandleIndex};
    pub use super::handle_object_pool::HandleObjectPool;
    pub use super::handle_pool::HandlePool;
}
