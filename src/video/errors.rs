use failure::Fail;

use super::assets::prelude::*;
use super::debug::DebugMessage;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Backend: {}", _0)]
    Backend(String),
    #[fail(display = "OpenGL implementation doesn\'t support {}.", _0)]
    Requirement(String),
    #[fail(display = "Driver reported: {}", _0)]
    Driver(DebugMessage),
    #[fail(display = "{} is invalid.", _0)]
    SamplerHandleInvalid(SamplerHandle),
    #[fail(display = "{} is invalid.", _0)]
    ShaderHandleInvalid(ShaderHandle),
    #[fail(display = "{} is invalid.", _0)]
    ProgramHandleInvalid(ProgramHandle),
    #[fail(display = "{} is invalid.", _0)]
    VertexFormatHandleInvalid(VertexFormatHandle),
    #[fail(display = "{} is invalid.", _0)]
    BufferHandleInvalid(BufferHandle),
    #[fail(display = "{} is invalid.", _0)]
    TextureHandleInvalid(TextureHandle),
    #[fail(display = "{} is invalid.", _0)]
    RenderbufferHandleInvalid(RenderbufferHandle),
    #[fail(display = "{} is invalid.", _0)]
    FramebufferHandleInvalid(FramebufferHandle),
    #[fail(display = "{} is invalid.", _0)]
    QueryHandleInvalid(QueryHandle),
    #[fail(display = "Sampler is invalid: {}", _0)]
    SamplerInvalid(String),
    #[fail(display = "Failed to compile shader {}, errors: \n{}", _0, _1)]
    ShaderCompileFailure(String, String),
    #[fail(display = "Failed to link program, errors: \n{}", _0)]
    ProgramLinkFailure(String),
    #[fail(display = "Can not tell the shader stage of {}.", _0)]
    ShaderStageUnknown(String),
    #[fail(display = "Program is invalid: {}", _0)]
    ProgramInvalid(String),
    #[fail(display = "Vertex format is invalid: {}", _0)]
    VertexFormatInvalid(String),
    #[fail(display = "Buffer is invalid: {}", _0)]
    BufferInvalid(String),
    #[fail(display = "Buffer mapping is invalid: {}", _0)]
    MappingInvalid(String),
    #[fail(display = "Texture is invalid: {}", _0)]
    TextureInvalid(String),
    #[fail(display = "Framebuffer is invalid: {}", _0)]
    FramebufferInvalid(String),
    #[fail(display = "Query is invalid: {}", _0)]
    QueryInvalid(String),
    #[fail(display = "Failed to read {}: {}", _0, _1)]
    Io(String, String),
    #[fail(display = "Malformed settings: {}", _0)]
    Settings(String),
    #[fail(display = "Out of bounds.")]
    OutOfBounds,
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl From<::failure::Error> for Error {
    fn from(err: ::failure::Error) -> Error {
        match err.downcast::<Error>() {
            Ok(v) => v,
            Err(err) => Error::Backend(format!("{}", err)),
        }
    }
}

impl From<::serde_json::Error> for Error {
    fn from(err: ::serde_json::Error) -> Error {
        Error::Settings(format!("{}", err))
    }
}
