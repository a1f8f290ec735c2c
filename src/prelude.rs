pub use crate::utils::prelude::{Handle, HandleIndex};
pub use crate::video::prelude::*;
