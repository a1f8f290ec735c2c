use std::ffi::CString;
use std::os::raw::c_void;
use std::sync::Mutex;
use std::{ptr, slice};

use gl;
use gl::types::*;

use crate::errors::*;

use super::super::super::assets::prelude::*;
use super::super::super::debug::{DebugMessage, DebugSeverity};
use super::super::super::errors::Error;
use super::super::{AttachmentPoint, AttachmentTarget, Command, Device, ResourceId};
use super::capabilities::{Capabilities, Version};
use super::types;

/// A device backed by an OpenGL 4.5 context.
///
/// The context must stay current on the calling thread for the whole life of
/// the device.
pub struct GLDevice {
    capabilities: Capabilities,
    // Boxed so the debug callback keeps a stable pointer while the device moves.
    messages: Box<Mutex<Vec<DebugMessage>>>,
}

impl GLDevice {
    /// Loads the function pointers with `loader` and checks that the driver is
    /// capable enough.
    ///
    /// # Unsafe
    ///
    /// The context `loader` resolves symbols for must be current on this thread.
    pub unsafe fn load_with<F>(loader: F) -> Result<Self>
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);
        gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);

        let capabilities = Capabilities::parse()?;
        info!("GLDevice {:#?}", capabilities);
        check_capabilities(&capabilities)?;

        Ok(GLDevice {
            capabilities,
            messages: Box::new(Mutex::new(Vec::new())),
        })
    }

    #[inline]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }
}

impl Drop for GLDevice {
    fn drop(&mut self) {
        unsafe {
            gl::DebugMessageCallback(None, ptr::null());
        }
    }
}

impl Device for GLDevice {
    fn describe(&self) -> String {
        format!(
            "{} {} ({:?})",
            self.capabilities.vendor, self.capabilities.renderer, self.capabilities.version
        )
    }

    unsafe fn configure_debug_output(
        &mut self,
        min: DebugSeverity,
        synchronous: bool,
    ) -> Result<()> {
        gl::Enable(gl::DEBUG_OUTPUT);

        if synchronous {
            gl::Enable(gl::DEBUG_OUTPUT_SYNCHRONOUS);
        } else {
            gl::Disable(gl::DEBUG_OUTPUT_SYNCHRONOUS);
        }

        let queue: *const Mutex<Vec<DebugMessage>> = &*self.messages;
        gl::DebugMessageCallback(Some(on_debug_message), queue as *const c_void);

        for &severity in &DebugSeverity::VARIANTS {
            gl::DebugMessageControl(
                gl::DONT_CARE,
                gl::DONT_CARE,
                severity.into(),
                0,
                ptr::null(),
                boolean(severity.is_reported(min)),
            );
        }

        check()
    }

    fn drain_debug_messages(&mut self) -> Vec<DebugMessage> {
        match self.messages.lock() {
            Ok(mut messages) => ::std::mem::replace(&mut *messages, Vec::new()),
            Err(_) => Vec::new(),
        }
    }

    unsafe fn execute(&mut self, cmd: Command) -> Result<()> {
        match cmd {
            Command::Enable(cap) => gl::Enable(cap.into()),
            Command::Disable(cap) => gl::Disable(cap.into()),
            Command::CullFace(face) => gl::CullFace(face.into()),
            Command::FrontFace(winding) => gl::FrontFace(winding.into()),
            Command::PolygonMode(mode) => gl::PolygonMode(gl::FRONT_AND_BACK, mode.into()),
            Command::LineWidth(width) => gl::LineWidth(width),
            Command::ColorMask(write) => {
                let v = boolean(write);
                gl::ColorMask(v, v, v, v);
            }
            Command::DepthFunc(func) => gl::DepthFunc(func.into()),
            Command::DepthMask(write) => gl::DepthMask(boolean(write)),
            Command::StencilFuncSeparate {
                face,
                func,
                reference,
                mask,
            } => gl::StencilFuncSeparate(face.into(), func.into(), reference, mask),
            Command::StencilOpSeparate {
                face,
                fail,
                depth_fail,
                pass,
            } => gl::StencilOpSeparate(face.into(), fail.into(), depth_fail.into(), pass.into()),
            Command::BlendEquationSeparate { slot, color, alpha } => {
                gl::BlendEquationSeparatei(slot, color.into(), alpha.into())
            }
            Command::BlendFuncSeparate {
                slot,
                src_color,
                dst_color,
                src_alpha,
                dst_alpha,
            } => gl::BlendFuncSeparatei(
                slot,
                src_color.into(),
                dst_color.into(),
                src_alpha.into(),
                dst_alpha.into(),
            ),
            Command::LogicOp(op) => gl::LogicOp(op.into()),
            Command::BindSampler { unit, sampler } => gl::BindSampler(unit, sampler.unwrap_or(0)),
            Command::UseProgram(id) => gl::UseProgram(id),
            Command::BindVertexFormat(id) => gl::BindVertexArray(id),
            Command::BindVertexBuffer {
                binding,
                buffer,
                offset,
                stride,
            } => gl::BindVertexBuffer(binding, buffer, offset as GLintptr, stride as GLsizei),
            Command::BindIndexBuffer(id) => gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, id),
            Command::BindBufferRange {
                target,
                index,
                buffer,
                offset,
                size,
            } => gl::BindBufferRange(
                target.into(),
                index,
                buffer,
                offset as GLintptr,
                size as GLsizeiptr,
            ),
            Command::BindIndirectBuffer { target, buffer } => gl::BindBuffer(target.into(), buffer),
            Command::BindTexture { unit, texture } => {
                gl::BindTextureUnit(unit, texture.unwrap_or(0))
            }
            Command::BindFramebuffer(id) => {
                gl::BindFramebuffer(gl::DRAW_FRAMEBUFFER, id.unwrap_or(0))
            }
            Command::BeginQuery { kind, query } => gl::BeginQuery(kind.into(), query),
            Command::EndQuery(kind) => gl::EndQuery(kind.into()),
            Command::Draw {
                primitive,
                first,
                count,
                instances,
            } => gl::DrawArraysInstanced(
                primitive.into(),
                first as GLint,
                count as GLsizei,
                instances as GLsizei,
            ),
            Command::DrawIndexed {
                primitive,
                format,
                offset,
                count,
                instances,
            } => gl::DrawElementsInstanced(
                primitive.into(),
                count as GLsizei,
                format.into(),
                offset as *const c_void,
                instances as GLsizei,
            ),
            Command::DrawIndirect { primitive, offset } => {
                gl::DrawArraysIndirect(primitive.into(), offset as *const c_void)
            }
            Command::Dispatch { x, y, z } => gl::DispatchCompute(x, y, z),
            Command::DispatchIndirect { offset } => gl::DispatchComputeIndirect(offset as GLintptr),
        }

        check()
    }

    unsafe fn create_sampler(&mut self, params: &SamplerParams) -> Result<ResourceId> {
        let mut id = 0;
        gl::CreateSamplers(1, &mut id);
        if id == 0 {
            bail!("[GL] Failed to create sampler object.");
        }

        let min: GLenum = params.min_filter_mode().into();
        let mag: GLenum = params.mag_filter.into();
        let wrap: GLenum = params.wrap.into();

        gl::SamplerParameteri(id, gl::TEXTURE_MIN_FILTER, min as GLint);
        gl::SamplerParameteri(id, gl::TEXTURE_MAG_FILTER, mag as GLint);
        gl::SamplerParameteri(id, gl::TEXTURE_WRAP_S, wrap as GLint);
        gl::SamplerParameteri(id, gl::TEXTURE_WRAP_T, wrap as GLint);
        gl::SamplerParameteri(id, gl::TEXTURE_WRAP_R, wrap as GLint);

        if params.max_anisotropy > 1.0 {
            if self.capabilities.max_anisotropy > 1.0 {
                let v = params.max_anisotropy.min(self.capabilities.max_anisotropy);
                gl::SamplerParameterf(id, types::TEXTURE_MAX_ANISOTROPY, v);
            } else {
                warn!("Anisotropic filtering is not supported by the driver, ignored.");
            }
        }

        if let Some(cmp) = params.compare {
            let func: GLenum = cmp.into();
            gl::SamplerParameteri(
                id,
                gl::TEXTURE_COMPARE_MODE,
                gl::COMPARE_REF_TO_TEXTURE as GLint,
            );
            gl::SamplerParameteri(id, gl::TEXTURE_COMPARE_FUNC, func as GLint);
        }

        if let Some(color) = params.border_color {
            gl::SamplerParameterfv(id, gl::TEXTURE_BORDER_COLOR, color.as_ptr());
        }

        if let Err(err) = check() {
            gl::DeleteSamplers(1, &id);
            return Err(err);
        }

        Ok(id)
    }

    unsafe fn delete_sampler(&mut self, id: ResourceId) -> Result<()> {
        gl::DeleteSamplers(1, &id);
        check()
    }

    unsafe fn create_shader(
        &mut self,
        kind: ShaderKind,
        name: &str,
        source: &str,
    ) -> Result<ResourceId> {
        compile(kind.into(), name, source)
    }

    unsafe fn delete_shader(&mut self, id: ResourceId) -> Result<()> {
        gl::DeleteShader(id);
        check()
    }

    unsafe fn create_program(&mut self, shaders: &[ResourceId]) -> Result<ResourceId> {
        let id = link(shaders)?;

        for &shader in shaders {
            gl::DetachShader(id, shader);
        }

        check()?;
        Ok(id)
    }

    unsafe fn delete_program(&mut self, id: ResourceId) -> Result<()> {
        gl::DeleteProgram(id);
        check()
    }

    unsafe fn program_binary(&mut self, id: ResourceId) -> Result<(u32, Vec<u8>)> {
        let mut len = 0;
        gl::GetProgramiv(id, gl::PROGRAM_BINARY_LENGTH, &mut len);
        if len <= 0 {
            return Err(Error::ProgramInvalid(format!(
                "program {} has no retrievable binary",
                id
            ))
            .into());
        }

        let mut format = 0;
        let mut bytes = vec![0u8; len as usize];
        gl::GetProgramBinary(
            id,
            len,
            &mut len,
            &mut format,
            bytes.as_mut_ptr() as *mut c_void,
        );

        check()?;
        bytes.truncate(len.max(0) as usize);
        Ok((format, bytes))
    }

    unsafe fn create_program_from_binary(
        &mut self,
        format: u32,
        bytes: &[u8],
    ) -> Result<ResourceId> {
        let id = gl::CreateProgram();
        if id == 0 {
            bail!("[GL] Failed to create program object.");
        }

        gl::ProgramBinary(
            id,
            format,
            bytes.as_ptr() as *const c_void,
            bytes.len() as GLsizei,
        );

        // A rejected binary is reported through the link status, not an error.
        let _ = gl::GetError();
        if let Err(err) = link_status(id) {
            gl::DeleteProgram(id);
            return Err(err);
        }

        Ok(id)
    }

    unsafe fn create_vertex_format(&mut self, params: &VertexFormatParams) -> Result<ResourceId> {
        let mut id = 0;
        gl::CreateVertexArrays(1, &mut id);
        if id == 0 {
            bail!("[GL] Failed to create vertex array object.");
        }

        for v in &params.attributes {
            gl::EnableVertexArrayAttrib(id, v.location);

            let size = GLint::from(v.components);
            let format: GLenum = v.format.into();
            match v.path() {
                AttributePath::Float => gl::VertexArrayAttribFormat(
                    id,
                    v.location,
                    size,
                    format,
                    boolean(v.normalized),
                    v.offset,
                ),
                AttributePath::Integer => {
                    gl::VertexArrayAttribIFormat(id, v.location, size, format, v.offset)
                }
                AttributePath::Double => {
                    gl::VertexArrayAttribLFormat(id, v.location, size, format, v.offset)
                }
            }

            gl::VertexArrayAttribBinding(id, v.location, v.binding);
            gl::VertexArrayBindingDivisor(id, v.binding, v.divisor);
        }

        if let Err(err) = check() {
            gl::DeleteVertexArrays(1, &id);
            return Err(err);
        }

        Ok(id)
    }

    unsafe fn delete_vertex_format(&mut self, id: ResourceId) -> Result<()> {
        gl::DeleteVertexArrays(1, &id);
        check()
    }

    unsafe fn create_buffer(
        &mut self,
        params: &BufferParams,
        data: Option<&[u8]>,
    ) -> Result<ResourceId> {
        let mut id = 0;
        gl::CreateBuffers(1, &mut id);
        if id == 0 {
            bail!("[GL] Failed to create buffer object.");
        }

        let bytes = data.map_or(ptr::null(), |v| v.as_ptr() as *const c_void);
        gl::NamedBufferStorage(
            id,
            params.size() as GLsizeiptr,
            bytes,
            types::storage_flags(params.usage),
        );

        if let Err(err) = check() {
            gl::DeleteBuffers(1, &id);
            return Err(err);
        }

        Ok(id)
    }

    unsafe fn update_buffer(&mut self, id: ResourceId, offset: usize, data: &[u8]) -> Result<()> {
        gl::NamedBufferSubData(
            id,
            offset as GLintptr,
            data.len() as GLsizeiptr,
            data.as_ptr() as *const c_void,
        );

        check()
    }

    unsafe fn clear_buffer(&mut self, id: ResourceId) -> Result<()> {
        gl::ClearNamedBufferData(
            id,
            gl::R8UI,
            gl::RED_INTEGER,
            gl::UNSIGNED_BYTE,
            ptr::null(),
        );

        check()
    }

    unsafe fn delete_buffer(&mut self, id: ResourceId) -> Result<()> {
        gl::DeleteBuffers(1, &id);
        check()
    }

    unsafe fn map_buffer(
        &mut self,
        id: ResourceId,
        offset: usize,
        size: usize,
        access: MapAccess,
        usage: BufferUsage,
    ) -> Result<*mut u8> {
        let mut len: GLint64 = 0;
        gl::GetNamedBufferParameteri64v(id, gl::BUFFER_SIZE, &mut len);

        let whole = offset == 0 && size as GLint64 == len;
        let ptr = gl::MapNamedBufferRange(
            id,
            offset as GLintptr,
            size as GLsizeiptr,
            types::map_flags(access, usage, whole),
        );

        check()?;
        if ptr.is_null() {
            bail!("[GL] Failed to map buffer {}.", id);
        }

        Ok(ptr as *mut u8)
    }

    unsafe fn unmap_buffer(&mut self, id: ResourceId) -> Result<()> {
        if gl::UnmapNamedBuffer(id) == gl::FALSE {
            check()?;
            warn!("Contents of buffer {} were corrupted while mapped.", id);
        }

        check()
    }

    unsafe fn flush_buffer(&mut self, id: ResourceId, explicit: Option<usize>) -> Result<()> {
        if let Some(len) = explicit {
            gl::FlushMappedNamedBufferRange(id, 0, len as GLsizeiptr);
        }

        gl::MemoryBarrier(gl::CLIENT_MAPPED_BUFFER_BARRIER_BIT);
        check()
    }

    unsafe fn receive_buffers(&mut self) -> Result<()> {
        gl::MemoryBarrier(gl::CLIENT_MAPPED_BUFFER_BARRIER_BIT);

        let sync = gl::FenceSync(gl::SYNC_GPU_COMMANDS_COMPLETE, 0);
        if sync.is_null() {
            bail!("[GL] Failed to create fence object.");
        }

        let status = gl::ClientWaitSync(sync, gl::SYNC_FLUSH_COMMANDS_BIT, gl::TIMEOUT_IGNORED);
        gl::DeleteSync(sync);

        if status == gl::WAIT_FAILED {
            check()?;
            bail!("[GL] Failed to wait for the fence object.");
        }

        check()
    }

    unsafe fn create_texture(&mut self, params: &TextureParams) -> Result<ResourceId> {
        let mut id = 0;
        gl::CreateTextures(params.layout.into(), 1, &mut id);
        if id == 0 {
            bail!("[GL] Failed to create texture object.");
        }

        let levels = params.levels() as GLsizei;
        let format: GLenum = params.format.into();
        let (w, h) = (params.width as GLsizei, params.height as GLsizei);

        match params.layout {
            TextureLayout::Tex1D => gl::TextureStorage1D(id, levels, format, w),
            TextureLayout::Tex2D | TextureLayout::CubeMap => {
                gl::TextureStorage2D(id, levels, format, w, h)
            }
            TextureLayout::Tex3D | TextureLayout::Tex2DArray => {
                gl::TextureStorage3D(id, levels, format, w, h, params.depth as GLsizei)
            }
            TextureLayout::CubeMapArray => {
                gl::TextureStorage3D(id, levels, format, w, h, params.layers() as GLsizei)
            }
        }

        gl::TextureParameteri(id, gl::TEXTURE_MAX_LEVEL, levels - 1);

        if let Err(err) = check() {
            gl::DeleteTextures(1, &id);
            return Err(err);
        }

        Ok(id)
    }

    unsafe fn update_texture(
        &mut self,
        id: ResourceId,
        params: &TextureParams,
        level: u32,
        layer: u32,
        format: PixelFormat,
        kind: PixelType,
        data: &[u8],
    ) -> Result<()> {
        let (w, h, d) = params.image_dimensions(level);
        let pixels = data.as_ptr() as *const c_void;
        let (format, kind): (GLenum, GLenum) = (format.into(), kind.into());

        match params.layout {
            TextureLayout::Tex1D => {
                gl::TextureSubImage1D(id, level as GLint, 0, w as GLsizei, format, kind, pixels)
            }
            TextureLayout::Tex2D => gl::TextureSubImage2D(
                id,
                level as GLint,
                0,
                0,
                w as GLsizei,
                h as GLsizei,
                format,
                kind,
                pixels,
            ),
            TextureLayout::Tex3D => gl::TextureSubImage3D(
                id,
                level as GLint,
                0,
                0,
                0,
                w as GLsizei,
                h as GLsizei,
                d as GLsizei,
                format,
                kind,
                pixels,
            ),
            // Cube faces and array layers are addressed as slices of a 3D image.
            TextureLayout::CubeMap | TextureLayout::Tex2DArray | TextureLayout::CubeMapArray => {
                gl::TextureSubImage3D(
                    id,
                    level as GLint,
                    0,
                    0,
                    layer as GLint,
                    w as GLsizei,
                    h as GLsizei,
                    1,
                    format,
                    kind,
                    pixels,
                )
            }
        }

        check()
    }

    unsafe fn generate_mipmaps(&mut self, id: ResourceId) -> Result<()> {
        gl::GenerateTextureMipmap(id);
        check()
    }

    unsafe fn delete_texture(&mut self, id: ResourceId) -> Result<()> {
        gl::DeleteTextures(1, &id);
        check()
    }

    unsafe fn create_renderbuffer(&mut self, params: &RenderbufferParams) -> Result<ResourceId> {
        let mut id = 0;
        gl::CreateRenderbuffers(1, &mut id);
        if id == 0 {
            bail!("[GL] Failed to create renderbuffer object.");
        }

        gl::NamedRenderbufferStorage(
            id,
            params.format.into(),
            params.width as GLsizei,
            params.height as GLsizei,
        );

        if let Err(err) = check() {
            gl::DeleteRenderbuffers(1, &id);
            return Err(err);
        }

        Ok(id)
    }

    unsafe fn delete_renderbuffer(&mut self, id: ResourceId) -> Result<()> {
        gl::DeleteRenderbuffers(1, &id);
        check()
    }

    unsafe fn create_framebuffer(
        &mut self,
        attachments: &[(AttachmentPoint, AttachmentTarget)],
    ) -> Result<ResourceId> {
        let mut id = 0;
        gl::CreateFramebuffers(1, &mut id);
        if id == 0 {
            bail!("[GL] Failed to create framebuffer object.");
        }

        let mut draws = Vec::new();
        for &(point, target) in attachments {
            let point = match point {
                AttachmentPoint::Color(i) => {
                    draws.push(gl::COLOR_ATTACHMENT0 + i);
                    gl::COLOR_ATTACHMENT0 + i
                }
                AttachmentPoint::Depth => gl::DEPTH_ATTACHMENT,
                AttachmentPoint::DepthStencil => gl::DEPTH_STENCIL_ATTACHMENT,
            };

            match target {
                AttachmentTarget::Texture {
                    id: texture,
                    level,
                    layer: Some(layer),
                } => gl::NamedFramebufferTextureLayer(
                    id,
                    point,
                    texture,
                    level as GLint,
                    layer as GLint,
                ),
                AttachmentTarget::Texture {
                    id: texture, level, ..
                } => gl::NamedFramebufferTexture(id, point, texture, level as GLint),
                AttachmentTarget::Renderbuffer(renderbuffer) => {
                    gl::NamedFramebufferRenderbuffer(id, point, gl::RENDERBUFFER, renderbuffer)
                }
            }
        }

        if draws.is_empty() {
            gl::NamedFramebufferDrawBuffer(id, gl::NONE);
        } else {
            gl::NamedFramebufferDrawBuffers(id, draws.len() as GLsizei, draws.as_ptr());
        }

        let status = gl::CheckNamedFramebufferStatus(id, gl::DRAW_FRAMEBUFFER);
        if let Err(err) = check() {
            gl::DeleteFramebuffers(1, &id);
            return Err(err);
        }

        if status != gl::FRAMEBUFFER_COMPLETE {
            gl::DeleteFramebuffers(1, &id);
            return Err(Error::FramebufferInvalid(framebuffer_status(status).into()).into());
        }

        Ok(id)
    }

    unsafe fn delete_framebuffer(&mut self, id: ResourceId) -> Result<()> {
        gl::DeleteFramebuffers(1, &id);
        check()
    }

    unsafe fn create_query(&mut self, kind: QueryKind) -> Result<ResourceId> {
        let mut id = 0;
        gl::CreateQueries(kind.into(), 1, &mut id);
        if id == 0 {
            bail!("[GL] Failed to create query object.");
        }

        check()?;
        Ok(id)
    }

    unsafe fn query_result(&mut self, id: ResourceId, wait: bool) -> Result<Option<u64>> {
        if !wait {
            let mut available = 0;
            gl::GetQueryObjectuiv(id, gl::QUERY_RESULT_AVAILABLE, &mut available);
            check()?;

            if available == GLuint::from(gl::FALSE) {
                return Ok(None);
            }
        }

        let mut value = 0;
        gl::GetQueryObjectui64v(id, gl::QUERY_RESULT, &mut value);
        check()?;
        Ok(Some(value))
    }

    unsafe fn delete_query(&mut self, id: ResourceId) -> Result<()> {
        gl::DeleteQueries(1, &id);
        check()
    }
}

extern "system" fn on_debug_message(
    source: GLenum,
    category: GLenum,
    id: GLuint,
    severity: GLenum,
    length: GLsizei,
    message: *const GLchar,
    user: *mut c_void,
) {
    if user.is_null() || message.is_null() {
        return;
    }

    let text = unsafe {
        if length >= 0 {
            let bytes = slice::from_raw_parts(message as *const u8, length as usize);
            String::from_utf8_lossy(bytes).into_owned()
        } else {
            ::std::ffi::CStr::from_ptr(message)
                .to_string_lossy()
                .into_owned()
        }
    };

    let msg = DebugMessage {
        source: types::debug_source(source),
        category: types::debug_category(category),
        severity: types::debug_severity(severity),
        id,
        text: text.trim_end().to_owned(),
    };

    let queue = unsafe { &*(user as *const Mutex<Vec<DebugMessage>>) };
    if let Ok(mut messages) = queue.lock() {
        messages.push(msg);
    }
}

#[inline]
fn boolean(v: bool) -> GLboolean {
    if v {
        gl::TRUE
    } else {
        gl::FALSE
    }
}

unsafe fn compile(kind: GLenum, name: &str, source: &str) -> Result<GLuint> {
    let src = CString::new(source.as_bytes()).map_err(|_| {
        Error::ShaderCompileFailure(name.into(), "source contains a nul byte".into())
    })?;

    let shader = gl::CreateShader(kind);
    if shader == 0 {
        bail!("[GL] Failed to create shader object for {}.", name);
    }

    gl::ShaderSource(shader, 1, &src.as_ptr(), ptr::null());
    gl::CompileShader(shader);

    let mut status = GLint::from(gl::FALSE);
    gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);

    if status != GLint::from(gl::TRUE) {
        let mut len = 0;
        gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);

        let mut buf = vec![0u8; len.max(1) as usize];
        gl::GetShaderInfoLog(
            shader,
            len,
            ptr::null_mut(),
            buf.as_mut_ptr() as *mut GLchar,
        );

        gl::DeleteShader(shader);
        return Err(Error::ShaderCompileFailure(name.into(), info_log(buf)).into());
    }

    Ok(shader)
}

unsafe fn link(shaders: &[GLuint]) -> Result<GLuint> {
    let program = gl::CreateProgram();
    if program == 0 {
        bail!("[GL] Failed to create program object.");
    }

    for &shader in shaders {
        gl::AttachShader(program, shader);
    }

    gl::ProgramParameteri(
        program,
        gl::PROGRAM_BINARY_RETRIEVABLE_HINT,
        GLint::from(gl::TRUE),
    );
    gl::LinkProgram(program);

    if let Err(err) = link_status(program) {
        gl::DeleteProgram(program);
        return Err(err);
    }

    Ok(program)
}

unsafe fn link_status(program: GLuint) -> Result<()> {
    let mut status = GLint::from(gl::FALSE);
    gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);

    if status != GLint::from(gl::TRUE) {
        let mut len: GLint = 0;
        gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);

        let mut buf = vec![0u8; len.max(1) as usize];
        gl::GetProgramInfoLog(
            program,
            len,
            ptr::null_mut(),
            buf.as_mut_ptr() as *mut GLchar,
        );

        return Err(Error::ProgramLinkFailure(info_log(buf)).into());
    }

    Ok(())
}

fn framebuffer_status(status: GLenum) -> &'static str {
    match status {
        gl::FRAMEBUFFER_UNDEFINED => "the default framebuffer does not exist",
        gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => "an attachment is incomplete",
        gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => "no images are attached",
        gl::FRAMEBUFFER_UNSUPPORTED => "the combination of formats is not supported",
        gl::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => "attachments differ in sample counts",
        gl::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS => "attachments differ in layering",
        _ => "unknown framebuffer status",
    }
}

fn info_log(mut buf: Vec<u8>) -> String {
    // Drops the trailing null character.
    while buf.last() == Some(&0) {
        buf.pop();
    }

    String::from_utf8_lossy(&buf).trim_end().to_owned()
}

fn check_capabilities(caps: &Capabilities) -> Result<()> {
    if caps.version < Version::GL(4, 5) && !caps.extensions.gl_arb_direct_state_access {
        return Err(Error::Requirement(format!(
            "direct state access (OpenGL 4.5 or GL_ARB_direct_state_access), found {:?}",
            caps.version
        ))
        .into());
    }

    if caps.version < Version::GL(4, 3) && !caps.extensions.gl_khr_debug {
        return Err(Error::Requirement(format!(
            "debug output (OpenGL 4.3 or GL_KHR_debug), found {:?}",
            caps.version
        ))
        .into());
    }

    if (caps.max_draw_buffers as usize) < crate::video::MAX_DRAW_BUFFERS {
        return Err(Error::Requirement(format!(
            "{} draw buffers, found {}",
            crate::video::MAX_DRAW_BUFFERS,
            caps.max_draw_buffers
        ))
        .into());
    }

    Ok(())
}

unsafe fn check() -> Result<()> {
    match gl::GetError() {
        gl::NO_ERROR => Ok(()),

        gl::INVALID_ENUM => {
            bail!("[GL] An unacceptable value is specified for an enumerated argument.")
        }

        gl::INVALID_VALUE => bail!("[GL] A numeric argument is out of range."),

        gl::INVALID_OPERATION => {
            bail!("[GL] The specified operation is not allowed in the current state.")
        }

        gl::INVALID_FRAMEBUFFER_OPERATION => bail!(
            "[GL] The command is trying to render to or read from the framebuffer while the \
             currently bound framebuffer is not framebuffer complete."
        ),

        gl::OUT_OF_MEMORY => bail!("[GL] There is not enough memory left to execute the command."),
        gl::STACK_OVERFLOW => bail!("[GL] An operation would cause an internal stack to overflow."),
        _ => bail!("[GL] Oops, Unknown OpenGL error."),
    }
}
