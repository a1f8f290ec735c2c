use gl;
use gl::types::*;
use std::cmp;
use std::ffi;

use crate::errors::*;

/// Describes the OpenGL context profile.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Profile {
    /// The context uses only future-compatible functions and definitions.
    Core,
    /// The context includes all immediate mode functions and definitions.
    Compatibility,
}

/// Describes a version.
///
/// A version can only be compared to another version if they belong to the same API.
/// For example, both `Version::GL(3, 0) >= Version::ES(3, 0)` and `Version::ES(3, 0) >=
/// Version::GL(3, 0)` return `false`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Version {
    /// Regular OpenGL.
    GL(u8, u8),
    /// OpenGL embedded system.
    ES(u8, u8),
}

impl PartialOrd for Version {
    #[inline]
    fn partial_cmp(&self, other: &Version) -> Option<cmp::Ordering> {
        let (es1, major1, minor1) = match *self {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        let (es2, major2, minor2) = match *other {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        if es1 != es2 {
            None
        } else {
            match major1.cmp(&major2) {
                cmp::Ordering::Equal => Some(minor1.cmp(&minor2)),
                v => Some(v),
            }
        }
    }
}

impl Version {
    /// Obtains the OpenGL version of the current context using the loaded functions.
    ///
    /// # Unsafe
    ///
    /// You must ensure that the functions belong to the current context, otherwise you will get
    /// an undefined behavior.
    pub unsafe fn parse() -> Result<Version> {
        let desc = parse_str(gl::VERSION)?;
        Version::from_description(&desc)
    }

    /// Parses a `GL_VERSION` string, e.g. `4.5.0 NVIDIA 390.77` or `OpenGL ES 3.2 Mesa`.
    pub fn from_description(desc: &str) -> Result<Version> {
        let (es, desc) = if desc.starts_with("OpenGL ES-") {
            (true, &desc[13..])
        } else if desc.starts_with("OpenGL ES ") {
            (true, &desc[10..])
        } else {
            (false, desc)
        };

        let desc = desc
            .split(' ')
            .next()
            .ok_or_else(|| format_err!("[GL] Version string {:?} is unformaled.", desc))?;

        let mut iter = desc.split('.');
        let major = iter.next().and_then(|v| v.parse().ok());
        let minor = iter.next().and_then(|v| v.parse().ok());

        match (major, minor) {
            (Some(major), Some(minor)) if es => Ok(Version::ES(major, minor)),
            (Some(major), Some(minor)) => Ok(Version::GL(major, minor)),
            _ => bail!("[GL] Version string {:?} is unformaled.", desc),
        }
    }
}

macro_rules! extensions {
    ($($string:literal => $field:ident,)+) => {
        /// Contains data about the list of extensions.
        #[derive(Debug, Clone, Copy, Default)]
        pub struct Extensions {
            $(
                pub $field: bool,
            )+
        }

        impl Extensions {
            /// Returns the list of extensions supported by the driver.
            ///
            /// *Safety*: the OpenGL context corresponding to `gl` must be current in the thread.
            pub unsafe fn parse() -> Result<Extensions> {
                let mut num_extensions = 0;
                gl::GetIntegerv(gl::NUM_EXTENSIONS, &mut num_extensions);

                let mut extensions = Extensions::default();
                for i in 0..num_extensions {
                    let ext = gl::GetStringi(gl::EXTENSIONS, i as GLuint);
                    if ext.is_null() {
                        continue;
                    }

                    match ffi::CStr::from_ptr(ext as *const _).to_str() {
                        $(
                            Ok($string) => extensions.$field = true,
                        )+
                        _ => (),
                    }
                }

                Ok(extensions)
            }
        }
    }
}

extensions! {
    "GL_ARB_texture_filter_anisotropic" => gl_arb_texture_filter_anisotropic,
    "GL_EXT_texture_filter_anisotropic" => gl_ext_texture_filter_anisotropic,
    "GL_KHR_debug" => gl_khr_debug,
    "GL_ARB_direct_state_access" => gl_arb_direct_state_access,
    "GL_ARB_seamless_cubemap_per_texture" => gl_arb_seamless_cubemap_per_texture,
}

// Core in 4.6, but the enum is missing from the generated 4.5 bindings.
const MAX_TEXTURE_MAX_ANISOTROPY: GLenum = 0x84FF;

/// Represents the capabilities of the context.
///
/// Contrary to the state, these values never change.
#[derive(Debug)]
pub struct Capabilities {
    /// Returns a version or release number. Vendor-specific information may follow the version
    /// number.
    pub version: Version,

    /// The company responsible for this GL implementation.
    pub vendor: String,

    /// The name of the renderer. This name is typically specific to a particular
    /// configuration of a hardware platform.
    pub renderer: String,

    pub extensions: Extensions,

    /// The OpenGL context profile if available.
    pub profile: Option<Profile>,

    /// The context is in debug mode, which may have additional error and performance issue
    /// reporting functionality.
    pub debug: bool,

    /// Maximum number of texture units that can be used at once.
    pub max_combined_texture_image_units: u32,

    /// Maximum number of draw buffers with individual blend settings.
    pub max_draw_buffers: u32,

    pub max_vertex_attribs: u32,

    /// Number of available buffer bind points for `GL_UNIFORM_BUFFER`.
    pub max_uniform_buffer_bindings: u32,

    /// 1.0 if anisotropic filtering is not available.
    pub max_anisotropy: f32,
}

impl Capabilities {
    pub unsafe fn parse() -> Result<Capabilities> {
        let version = Version::parse()?;
        let extensions = Extensions::parse()?;

        let mut flags = 0;
        gl::GetIntegerv(gl::CONTEXT_FLAGS, &mut flags);

        let max_anisotropy = if version >= Version::GL(4, 6)
            || extensions.gl_arb_texture_filter_anisotropic
            || extensions.gl_ext_texture_filter_anisotropic
        {
            let mut val = 1.0;
            gl::GetFloatv(MAX_TEXTURE_MAX_ANISOTROPY, &mut val);
            val
        } else {
            1.0
        };

        Ok(Capabilities {
            version,
            vendor: parse_str(gl::VENDOR)?,
            renderer: parse_str(gl::RENDERER)?,
            extensions,
            profile: Capabilities::parse_profile(),
            debug: (flags as GLenum & gl::CONTEXT_FLAG_DEBUG_BIT) != 0,
            max_combined_texture_image_units: parse_u32(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS),
            max_draw_buffers: parse_u32(gl::MAX_DRAW_BUFFERS),
            max_vertex_attribs: parse_u32(gl::MAX_VERTEX_ATTRIBS),
            max_uniform_buffer_bindings: parse_u32(gl::MAX_UNIFORM_BUFFER_BINDINGS),
            max_anisotropy,
        })
    }

    #[inline]
    unsafe fn parse_profile() -> Option<Profile> {
        let mut val = 0;
        gl::GetIntegerv(gl::CONTEXT_PROFILE_MASK, &mut val);
        let val = val as GLenum;

        if (val & gl::CONTEXT_COMPATIBILITY_PROFILE_BIT) != 0 {
            Some(Profile::Compatibility)
        } else if (val & gl::CONTEXT_CORE_PROFILE_BIT) != 0 {
            Some(Profile::Core)
        } else {
            None
        }
    }
}

#[inline]
unsafe fn parse_str(id: GLenum) -> Result<String> {
    let s = gl::GetString(id);
    if s.is_null() {
        bail!("[GL] String of {} is null.", id);
    }

    String::from_utf8(ffi::CStr::from_ptr(s as *const _).to_bytes().to_vec())
        .map_err(|_| format_err!("[GL] String of {} is unformaled.", id))
}

#[inline]
unsafe fn parse_u32(id: GLenum) -> u32 {
    let mut val = 0;
    gl::GetIntegerv(id, &mut val);
    val as u32
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn version() {
        assert_eq!(
            Version::from_description("4.5.0 NVIDIA 390.77").unwrap(),
            Version::GL(4, 5)
        );
        assert_eq!(
            Version::from_description("4.6 (Core Profile) Mesa 20.0.8").unwrap(),
            Version::GL(4, 6)
        );
        assert_eq!(
            Version::from_description("OpenGL ES 3.2 Mesa 20.0.8").unwrap(),
            Version::ES(3, 2)
        );
        assert!(Version::from_description("").is_err());
        assert!(Version::from_description("four point five").is_err());
    }

    #[test]
    fn ordering() {
        assert!(Version::GL(4, 5) >= Version::GL(4, 5));
        assert!(Version::GL(4, 6) > Version::GL(4, 5));
        assert!(Version::GL(3, 3) < Version::GL(4, 0));
        assert!(!(Version::ES(3, 2) >= Version::GL(3, 2)));
        assert!(!(Version::ES(3, 2) < Version::GL(3, 2)));
    }
}
