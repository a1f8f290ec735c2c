//! Shader stages and the programs linking them together.

use serde::{Deserialize, Serialize};

use crate::video::errors::{Error, Result};

impl_handle!(ShaderHandle);
impl_handle!(ProgramHandle);

/// A programmable stage. A single compiled source file can't be used directly,
/// it must be linked into a program first.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum ShaderKind {
    Vertex,
    TessControl,
    TessEvaluation,
    Geometry,
    Fragment,
    Compute,
}

impl ShaderKind {
    pub const VARIANTS: [ShaderKind; 6] = [
        ShaderKind::Vertex,
        ShaderKind::TessControl,
        ShaderKind::TessEvaluation,
        ShaderKind::Geometry,
        ShaderKind::Fragment,
        ShaderKind::Compute,
    ];

    /// Guesses the stage from the usual file extensions (`.vert`, `.frag`, ...).
    pub fn from_extension(ext: &str) -> Option<ShaderKind> {
        match ext {
            "vert" | "vs" => Some(ShaderKind::Vertex),
            "tesc" => Some(ShaderKind::TessControl),
            "tese" => Some(ShaderKind::TessEvaluation),
            "geom" | "gs" => Some(ShaderKind::Geometry),
            "frag" | "fs" => Some(ShaderKind::Fragment),
            "comp" | "cs" => Some(ShaderKind::Compute),
            _ => None,
        }
    }
}

/// A linked program in the driver's own binary format. Caching it avoids
/// compiling and linking sources again, but it only loads on the driver that
/// produced it.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ProgramBinary {
    /// Driver specific tag of the binary format.
    pub format: u32,
    pub compute: bool,
    pub bytes: Vec<u8>,
}

/// Checks that a set of stages forms a linkable program: either a single
/// compute stage, or a vertex and a fragment stage with optional geometry and
/// tessellation stages in between. Tessellation stages come in pairs.
pub fn validate_stages(stages: &[ShaderKind]) -> Result<()> {
    let count = |kind| stages.iter().filter(|&&v| v == kind).count();

    if stages.is_empty() {
        return Err(Error::ProgramInvalid("No shader stages attached.".into()));
    }

    for &kind in &ShaderKind::VARIANTS {
        if count(kind) > 1 {
            return Err(Error::ProgramInvalid(format!(
                "Stage {:?} is attached more than once.",
                kind
            )));
        }
    }

    if count(ShaderKind::Compute) == 1 {
        if stages.len() != 1 {
            return Err(Error::ProgramInvalid(
                "A compute stage can not be linked with other stages.".into(),
            ));
        }

        return Ok(());
    }

    if count(ShaderKind::Vertex) == 0 {
        return Err(Error::ProgramInvalid(
            "Vertex shader is required to describe a proper render pipeline.".into(),
        ));
    }

    if count(ShaderKind::Fragment) == 0 {
        return Err(Error::ProgramInvalid(
            "Fragment shader is required to describe a proper render pipeline.".into(),
        ));
    }

    if count(ShaderKind::TessControl) != count(ShaderKind::TessEvaluation) {
        return Err(Error::ProgramInvalid(
            "Tessellation control and evaluation stages must be attached together.".into(),
        ));
    }

    Ok(())
}
