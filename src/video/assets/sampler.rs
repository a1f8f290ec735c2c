//! Sampler objects.
//!
//! Samplers are real driver resources. Create a handful of them once and share
//! them between pipelines; you will rarely need more than three.

use serde::{Deserialize, Serialize};

use crate::video::assets::pipeline::Comparison;
use crate::video::errors::{Error, Result};

impl_handle!(SamplerHandle);

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum SamplerFilter {
    Nearest,
    Linear,
}

/// How texture coordinates outside `[0, 1]` are resolved. The same mode is
/// used for all dimensions.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum SamplerWrap {
    Repeat,
    Clamp,
    Border,
    Mirror,
}

/// The minification filter after combining `min_filter` and `mip_filter`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MinFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapNearest,
    LinearMipmapLinear,
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerParams {
    pub min_filter: SamplerFilter,
    pub mag_filter: SamplerFilter,
    /// `None` disables mip-mapping.
    pub mip_filter: Option<SamplerFilter>,
    /// A number between 1.0 and the driver maximum, 1.0 disables anisotropic
    /// filtering.
    pub max_anisotropy: f32,
    /// Depth comparison for textures with a depth format (shadow mapping).
    pub compare: Option<Comparison>,
    pub wrap: SamplerWrap,
    pub border_color: Option<[f32; 4]>,
}

impl Default for SamplerParams {
    fn default() -> Self {
        SamplerParams {
            min_filter: SamplerFilter::Nearest,
            mag_filter: SamplerFilter::Linear,
            mip_filter: Some(SamplerFilter::Linear),
            max_anisotropy: 1.0,
            compare: None,
            wrap: SamplerWrap::Repeat,
            border_color: None,
        }
    }
}

impl SamplerParams {
    /// Linear filtering with trilinear mip-mapping and the given wrap mode.
    pub fn linear(wrap: SamplerWrap) -> Self {
        SamplerParams {
            min_filter: SamplerFilter::Linear,
            mag_filter: SamplerFilter::Linear,
            mip_filter: Some(SamplerFilter::Linear),
            wrap,
            ..Default::default()
        }
    }

    /// Nearest filtering without mip-mapping, clamped to the edge.
    pub fn point() -> Self {
        SamplerParams {
            min_filter: SamplerFilter::Nearest,
            mag_filter: SamplerFilter::Nearest,
            mip_filter: None,
            wrap: SamplerWrap::Clamp,
            ..Default::default()
        }
    }

    pub fn min_filter_mode(&self) -> MinFilter {
        match (self.min_filter, self.mip_filter) {
            (SamplerFilter::Nearest, None) => MinFilter::Nearest,
            (SamplerFilter::Linear, None) => MinFilter::Linear,
            (SamplerFilter::Nearest, Some(SamplerFilter::Nearest)) => {
                MinFilter::NearestMipmapNearest
            }
            (SamplerFilter::Nearest, Some(SamplerFilter::Linear)) => MinFilter::NearestMipmapLinear,
            (SamplerFilter::Linear, Some(SamplerFilter::Nearest)) => MinFilter::LinearMipmapNearest,
            (SamplerFilter::Linear, Some(SamplerFilter::Linear)) => MinFilter::LinearMipmapLinear,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.max_anisotropy >= 1.0) {
            return Err(Error::SamplerInvalid(format!(
                "max anisotropy must be at least 1.0, got {}.",
                self.max_anisotropy
            )));
        }

        if self.border_color.is_some() && self.wrap != SamplerWrap::Border {
            warn!(
                "Border color of sampler is ignored with wrap mode {:?}.",
                self.wrap
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn min_filter() {
        let mut params = SamplerParams::default();
        assert_eq!(params.min_filter_mode(), MinFilter::NearestMipmapLinear);

        params.mip_filter = None;
        assert_eq!(params.min_filter_mode(), MinFilter::Nearest);

        params.min_filter = SamplerFilter::Linear;
        params.mip_filter = Some(SamplerFilter::Nearest);
        assert_eq!(params.min_filter_mode(), MinFilter::LinearMipmapNearest);

        assert_eq!(
            SamplerParams::linear(SamplerWrap::Mirror).min_filter_mode(),
            MinFilter::LinearMipmapLinear
        );
        assert_eq!(SamplerParams::point().min_filter_mode(), MinFilter::Nearest);
    }

    #[test]
    fn validate() {
        assert!(SamplerParams::default().validate().is_ok());

        let mut params = SamplerParams::default();
        params.max_anisotropy = 0.5;
        assert!(params.validate().is_err());

        params.max_anisotropy = ::std::f32::NAN;
        assert!(params.validate().is_err());

        params.max_anisotropy = 16.0;
        assert!(params.validate().is_ok());
    }

    #[test]
    fn deserialize() {
        let params: SamplerParams =
            serde_json::from_str(r#"{ "wrap": "Clamp", "compare": "LessOrEqual" }"#).unwrap();

        assert_eq!(params.wrap, SamplerWrap::Clamp);
        assert_eq!(params.compare, Some(Comparison::LessOrEqual));
        assert_eq!(params.min_filter, SamplerFilter::Nearest);
    }
}
