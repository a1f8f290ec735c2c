//! The rendering context.
//!
//! A `Context` owns the device, every driver object created through it and a
//! snapshot of the driver state. Pipelines are applied with `set_state`, which
//! only sends the commands for settings that differ from the snapshot.

use std::collections::HashMap;
use std::fs;
use std::mem;
use std::path::Path;
use std::slice;

use super::assets::prelude::*;
use super::assets::shader;
use super::backends::{
    AttachmentPoint, AttachmentTarget, Capability, Command, Device, IndexedTarget,
    IndirectTarget, ResourceId,
};
use super::debug::Disposition;
use super::errors::{Error, Result};
use super::settings::ContextParams;
use super::state::StateSnapshot;
use super::MAX_SAMPLER_SLOTS;

use crate::utils::prelude::HandleObjectPool;

struct ShaderObject {
    id: ResourceId,
    kind: ShaderKind,
}

struct ProgramObject {
    id: ResourceId,
    compute: bool,
}

struct BufferObject {
    id: ResourceId,
    params: BufferParams,
    mapping: Option<Mapping>,
}

#[derive(Clone, Copy)]
struct Mapping {
    ptr: *mut u8,
    len: usize,
    // Writes of persistent, non-coherent mappings are flushed by hand.
    explicit: bool,
}

struct TextureObject {
    id: ResourceId,
    params: TextureParams,
}

struct RenderbufferObject {
    id: ResourceId,
    params: RenderbufferParams,
}

struct QueryObject {
    id: ResourceId,
    kind: QueryKind,
    active: bool,
    // Ended, but the result has not been received yet.
    issued: bool,
    results: QueryResults,
}

pub struct Context<D: Device> {
    device: D,
    params: ContextParams,
    snapshot: StateSnapshot,
    commands: Vec<Command>,

    samplers: HandleObjectPool<ResourceId>,
    shaders: HandleObjectPool<ShaderObject>,
    programs: HandleObjectPool<ProgramObject>,
    vertex_formats: HandleObjectPool<ResourceId>,
    buffers: HandleObjectPool<BufferObject>,
    textures: HandleObjectPool<TextureObject>,
    renderbuffers: HandleObjectPool<RenderbufferObject>,
    framebuffers: HandleObjectPool<ResourceId>,
    queries: HandleObjectPool<QueryObject>,

    active_queries: HashMap<QueryKind, QueryHandle>,
    draw_indirect: Option<BufferHandle>,
    dispatch_indirect: Option<BufferHandle>,

    // Bound whenever a pipeline has no vertex format.
    empty_vertex_format: ResourceId,
}

impl<D: Device> Context<D> {
    /// Takes over a device whose driver state is still the initial one.
    pub fn new(device: D, params: ContextParams) -> Result<Self> {
        info!("Creating rendering context on {}.", device.describe());
        debug!("{:?}", params);

        let mut ctx = Context {
            device,
            params,
            snapshot: StateSnapshot::new(),
            commands: Vec::new(),
            samplers: HandleObjectPool::new(),
            shaders: HandleObjectPool::new(),
            programs: HandleObjectPool::new(),
            vertex_formats: HandleObjectPool::new(),
            buffers: HandleObjectPool::new(),
            textures: HandleObjectPool::new(),
            renderbuffers: HandleObjectPool::new(),
            framebuffers: HandleObjectPool::new(),
            queries: HandleObjectPool::new(),
            active_queries: HashMap::new(),
            draw_indirect: None,
            dispatch_indirect: None,
            empty_vertex_format: 0,
        };

        unsafe {
            ctx.device.configure_debug_output(
                params.debug_severity,
                params.synchronous_debug_output,
            )?;
        }
        ctx.poll()?;

        if params.seamless_cube_maps {
            ctx.submit(Command::Enable(Capability::TextureCubeMapSeamless))?;
        }

        let empty = VertexFormatParams::default();
        ctx.empty_vertex_format = unsafe { ctx.device.create_vertex_format(&empty)? };
        ctx.poll()?;

        Ok(ctx)
    }

    #[inline]
    pub fn params(&self) -> ContextParams {
        self.params
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Direct access to the device. Commands executed this way bypass the
    /// snapshot, call `invalidate_state` after changing any pipeline state.
    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Applies the entire pipeline, issuing driver calls only for settings that
    /// differ from the current driver state. The program (if any) and the
    /// vertex format are bound on every call.
    pub fn set_state(&mut self, pipeline: &Pipeline) -> Result<()> {
        let ids = self.resolve_samplers(&pipeline.samplers)?;

        let program = match pipeline.program {
            Some(handle) => Some(self.program(handle, false)?),
            None => None,
        };

        let vertex_format = match pipeline.vertex_format {
            Some(handle) => *self
                .vertex_formats
                .get(handle)
                .ok_or_else(|| Error::VertexFormatHandleInvalid(handle))?,
            None => self.empty_vertex_format,
        };

        let mut commands = mem::replace(&mut self.commands, Vec::new());
        self.snapshot
            .apply_rasterizer(&pipeline.rasterizer, &mut commands);
        self.snapshot
            .apply_depth_stencil(&pipeline.depth_stencil, &mut commands);
        self.snapshot.apply_blend(&pipeline.blend, &mut commands);
        self.snapshot
            .apply_samplers(&pipeline.samplers, &ids, &mut commands);

        if let Some(id) = program {
            commands.push(Command::UseProgram(id));
        }

        commands.push(Command::BindVertexFormat(vertex_format));

        let result = self.flush(&mut commands);
        self.commands = commands;
        result
    }

    /// Applies the sampler bindings and the program of a compute pipeline.
    pub fn set_compute_state(&mut self, pipeline: &ComputePipeline) -> Result<()> {
        let ids = self.resolve_samplers(&pipeline.samplers)?;

        let program = match pipeline.program {
            Some(handle) => Some(self.program(handle, true)?),
            None => None,
        };

        let mut commands = mem::replace(&mut self.commands, Vec::new());
        self.snapshot
            .apply_samplers(&pipeline.samplers, &ids, &mut commands);

        if let Some(id) = program {
            commands.push(Command::UseProgram(id));
        }

        let result = self.flush(&mut commands);
        self.commands = commands;
        result
    }

    /// Returns true if the driver is known to hold the state of `pipeline`.
    #[inline]
    pub fn is_current(&self, pipeline: &Pipeline) -> bool {
        self.snapshot.matches(pipeline)
    }

    /// Forgets the cached driver state. The next `set_state` pushes everything.
    pub fn invalidate_state(&mut self) {
        self.snapshot.invalidate();
    }

    /// Drains the debug output of the driver. Messages are logged, and the
    /// first fatal one is returned as `Error::Driver`.
    pub fn poll(&mut self) -> Result<()> {
        let mut fatal = None;

        for msg in self.device.drain_debug_messages() {
            match msg.disposition() {
                Disposition::Fatal => {
                    error!("{}", msg);
                    if fatal.is_none() {
                        fatal = Some(msg);
                    }
                }
                Disposition::Info => info!("{}", msg),
                Disposition::Warning => warn!("{}", msg),
            }
        }

        match fatal {
            Some(msg) => {
                // The failed call may have left any state behind.
                self.snapshot.invalidate();
                Err(Error::Driver(msg))
            }
            None => Ok(()),
        }
    }

    fn flush(&mut self, commands: &mut Vec<Command>) -> Result<()> {
        for cmd in commands.drain(..) {
            if let Err(err) = unsafe { self.device.execute(cmd) } {
                self.snapshot.invalidate();
                return Err(err.into());
            }
        }

        self.poll()
    }

    fn submit(&mut self, cmd: Command) -> Result<()> {
        unsafe { self.device.execute(cmd)? };
        self.poll()
    }

    fn resolve_samplers(
        &self,
        samplers: &[Option<SamplerHandle>; MAX_SAMPLER_SLOTS],
    ) -> Result<[Option<ResourceId>; MAX_SAMPLER_SLOTS]> {
        let mut ids = [None; MAX_SAMPLER_SLOTS];

        for (id, handle) in ids.iter_mut().zip(samplers.iter()) {
            if let Some(handle) = *handle {
                let v = self
                    .samplers
                    .get(handle)
                    .ok_or_else(|| Error::SamplerHandleInvalid(handle))?;
                *id = Some(*v);
            }
        }

        Ok(ids)
    }

    fn program(&self, handle: ProgramHandle, compute: bool) -> Result<ResourceId> {
        let program = self
            .programs
            .get(handle)
            .ok_or_else(|| Error::ProgramHandleInvalid(handle))?;

        if program.compute != compute {
            let reason = if compute {
                format!("{} has no compute stage.", handle)
            } else {
                format!("{} is a compute program.", handle)
            };

            return Err(Error::ProgramInvalid(reason));
        }

        Ok(program.id)
    }
}

impl<D: Device> Context<D> {
    pub fn create_sampler(&mut self, params: SamplerParams) -> Result<SamplerHandle> {
        params.validate()?;

        let id = unsafe { self.device.create_sampler(&params)? };
        let handle = self.samplers.create(id).into();
        self.poll()?;
        Ok(handle)
    }

    /// Deletes the sampler and unbinds it from every texture unit.
    pub fn delete_sampler(&mut self, handle: SamplerHandle) -> Result<()> {
        let id = self
            .samplers
            .free(handle)
            .ok_or_else(|| Error::SamplerHandleInvalid(handle))?;

        self.snapshot.forget_sampler(handle);
        unsafe { self.device.delete_sampler(id)? };
        self.poll()
    }

    /// Compiles a single shader stage.
    pub fn create_shader(&mut self, kind: ShaderKind, source: &str) -> Result<ShaderHandle> {
        let name = format!("{:?} shader", kind);
        self.compile(kind, &name, source)
    }

    /// Compiles a shader stage from a file, the stage is guessed from the
    /// file extension (`.vert`, `.tesc`, `.tese`, `.geom`, `.frag` or `.comp`).
    pub fn create_shader_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<ShaderHandle> {
        let path = path.as_ref();
        let name = path.display().to_string();

        let kind = path
            .extension()
            .and_then(|v| v.to_str())
            .and_then(ShaderKind::from_extension)
            .ok_or_else(|| Error::ShaderStageUnknown(name.clone()))?;

        let source =
            fs::read_to_string(path).map_err(|err| Error::Io(name.clone(), err.to_string()))?;

        self.compile(kind, &name, &source)
    }

    fn compile(&mut self, kind: ShaderKind, name: &str, source: &str) -> Result<ShaderHandle> {
        let id = unsafe { self.device.create_shader(kind, name, source)? };
        let handle = self.shaders.create(ShaderObject { id, kind }).into();
        info!("Compiled {}.", name);
        self.poll()?;
        Ok(handle)
    }

    /// Deleting a shader does not affect programs it was linked into.
    pub fn delete_shader(&mut self, handle: ShaderHandle) -> Result<()> {
        let shader = self
            .shaders
            .free(handle)
            .ok_or_else(|| Error::ShaderHandleInvalid(handle))?;

        unsafe { self.device.delete_shader(shader.id)? };
        self.poll()
    }

    /// Links shader stages into a program. Valid combinations are a single
    /// compute stage, or vertex and fragment stages with optional tessellation
    /// and geometry stages.
    pub fn create_program(&mut self, stages: &[ShaderHandle]) -> Result<ProgramHandle> {
        let mut ids = Vec::with_capacity(stages.len());
        let mut kinds = Vec::with_capacity(stages.len());

        for &handle in stages {
            let shader = self
                .shaders
                .get(handle)
                .ok_or_else(|| Error::ShaderHandleInvalid(handle))?;

            ids.push(shader.id);
            kinds.push(shader.kind);
        }

        shader::validate_stages(&kinds)?;

        let id = unsafe { self.device.create_program(&ids)? };
        let compute = kinds[0] == ShaderKind::Compute;
        let handle: ProgramHandle = self.programs.create(ProgramObject { id, compute }).into();
        info!("Linked {} from {:?}.", handle, kinds);
        self.poll()?;
        Ok(handle)
    }

    pub fn delete_program(&mut self, handle: ProgramHandle) -> Result<()> {
        let program = self
            .programs
            .free(handle)
            .ok_or_else(|| Error::ProgramHandleInvalid(handle))?;

        unsafe { self.device.delete_program(program.id)? };
        self.poll()
    }

    /// Retrieves the driver binary of a linked program, which can be cached
    /// and loaded with `create_program_from_binary` by the same driver.
    pub fn program_binary(&mut self, handle: ProgramHandle) -> Result<ProgramBinary> {
        let (id, compute) = self
            .programs
            .get(handle)
            .map(|v| (v.id, v.compute))
            .ok_or_else(|| Error::ProgramHandleInvalid(handle))?;

        let (format, bytes) = unsafe { self.device.program_binary(id)? };
        self.poll()?;

        Ok(ProgramBinary {
            format,
            compute,
            bytes,
        })
    }

    /// Fails with `ProgramLinkFailure` if the driver does not accept the
    /// binary, e.g. after a driver update. Link from sources in that case.
    pub fn create_program_from_binary(
        &mut self,
        binary: &ProgramBinary,
    ) -> Result<ProgramHandle> {
        if binary.bytes.is_empty() {
            return Err(Error::ProgramInvalid("Program binary is empty.".into()));
        }

        let id = unsafe {
            self.device
                .create_program_from_binary(binary.format, &binary.bytes)?
        };

        let handle: ProgramHandle = self
            .programs
            .create(ProgramObject {
                id,
                compute: binary.compute,
            })
            .into();

        info!("Loaded {} from a {} bytes binary.", handle, binary.bytes.len());
        self.poll()?;
        Ok(handle)
    }

    pub fn create_vertex_format(
        &mut self,
        params: VertexFormatParams,
    ) -> Result<VertexFormatHandle> {
        params.validate()?;

        let id = unsafe { self.device.create_vertex_format(&params)? };
        let handle = self.vertex_formats.create(id).into();
        self.poll()?;
        Ok(handle)
    }

    pub fn delete_vertex_format(&mut self, handle: VertexFormatHandle) -> Result<()> {
        let id = self
            .vertex_formats
            .free(handle)
            .ok_or_else(|| Error::VertexFormatHandleInvalid(handle))?;

        unsafe { self.device.delete_vertex_format(id)? };
        self.poll()
    }

    /// Creates a buffer with immutable storage, optionally filled with `data`.
    pub fn create_buffer(
        &mut self,
        params: BufferParams,
        data: Option<&[u8]>,
    ) -> Result<BufferHandle> {
        params.validate(data)?;

        let id = unsafe { self.device.create_buffer(&params, data)? };
        let handle = self
            .buffers
            .create(BufferObject {
                id,
                params,
                mapping: None,
            })
            .into();
        self.poll()?;
        Ok(handle)
    }

    /// Overwrites a part of the buffer. Buffers created without
    /// `dynamic_update` can't be updated, the call is ignored with a warning.
    pub fn update_buffer(
        &mut self,
        handle: BufferHandle,
        offset: usize,
        data: &[u8],
    ) -> Result<()> {
        let (id, params) = self.buffer(handle)?;

        if !params.usage.dynamic_update {
            warn!(
                "{} was created without dynamic_update, the update is ignored.",
                handle
            );
            return Ok(());
        }

        match offset.checked_add(data.len()) {
            Some(end) if end <= params.size() => {}
            _ => return Err(Error::OutOfBounds),
        }

        unsafe { self.device.update_buffer(id, offset, data)? };
        self.poll()
    }

    /// Fills the whole buffer with zeros.
    pub fn clear_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        let (id, _) = self.buffer(handle)?;
        unsafe { self.device.clear_buffer(id)? };
        self.poll()
    }

    /// Deleting a mapped buffer unmaps it.
    pub fn delete_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        let buffer = self
            .buffers
            .free(handle)
            .ok_or_else(|| Error::BufferHandleInvalid(handle))?;

        if self.draw_indirect == Some(handle) {
            self.draw_indirect = None;
        }

        if self.dispatch_indirect == Some(handle) {
            self.dispatch_indirect = None;
        }

        unsafe { self.device.delete_buffer(buffer.id)? };
        self.poll()
    }

    /// Maps the byte range `offset..offset + size` into client memory. A
    /// `size` of `None` maps everything behind `offset`.
    ///
    /// Persistent mappings stay valid while the buffer is used by draws,
    /// `mapped_buffer` hands them out again later.
    pub fn map_buffer(
        &mut self,
        handle: BufferHandle,
        access: MapAccess,
        offset: usize,
        size: Option<usize>,
    ) -> Result<&mut [u8]> {
        let (id, params) = self.buffer(handle)?;
        params.validate_mapping(access)?;
        let len = params.range(offset, size)?;

        if self.mapping(handle).is_ok() {
            return Err(Error::MappingInvalid(format!("{} is already mapped.", handle)));
        }

        let ptr = unsafe {
            self.device
                .map_buffer(id, offset, len, access, params.usage)?
        };
        self.poll()?;

        let mapping = Mapping {
            ptr,
            len,
            explicit: access.persistent && access.write && !params.usage.map_coherent,
        };

        if let Some(buffer) = self.buffers.get_mut(handle) {
            buffer.mapping = Some(mapping);
        }

        Ok(unsafe { slice::from_raw_parts_mut(mapping.ptr, mapping.len) })
    }

    /// Returns the range of a buffer mapped with `map_buffer`.
    pub fn mapped_buffer(&mut self, handle: BufferHandle) -> Result<&mut [u8]> {
        let mapping = self.mapping(handle)?;
        Ok(unsafe { slice::from_raw_parts_mut(mapping.ptr, mapping.len) })
    }

    /// Writes to an explicitly flushed mapping are flushed before unmapping.
    pub fn unmap_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        let (id, _) = self.buffer(handle)?;
        let mapping = self.mapping(handle)?;

        unsafe {
            if mapping.explicit {
                self.device.flush_buffer(id, Some(mapping.len))?;
            }

            self.device.unmap_buffer(id)?;
        }

        if let Some(buffer) = self.buffers.get_mut(handle) {
            buffer.mapping = None;
        }

        self.poll()
    }

    /// Makes CPU writes to a persistent mapping visible to subsequent draws.
    pub fn flush_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        let (id, _) = self.buffer(handle)?;
        let mapping = self.mapping(handle)?;
        let explicit = if mapping.explicit {
            Some(mapping.len)
        } else {
            None
        };

        unsafe { self.device.flush_buffer(id, explicit)? };
        self.poll()
    }

    /// Waits until the GPU writes issued so far are visible through the
    /// mapping of `handle`.
    pub fn receive_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        self.mapping(handle)?;
        unsafe { self.device.receive_buffers()? };
        self.poll()
    }

    fn buffer(&self, handle: BufferHandle) -> Result<(ResourceId, BufferParams)> {
        self.buffers
            .get(handle)
            .map(|v| (v.id, v.params))
            .ok_or_else(|| Error::BufferHandleInvalid(handle))
    }

    fn mapping(&self, handle: BufferHandle) -> Result<Mapping> {
        let buffer = self
            .buffers
            .get(handle)
            .ok_or_else(|| Error::BufferHandleInvalid(handle))?;

        buffer
            .mapping
            .ok_or_else(|| Error::MappingInvalid(format!("{} is not mapped.", handle)))
    }
}

impl<D: Device> Context<D> {
    /// Allocates immutable storage for every level and layer. The contents
    /// are undefined until uploaded with `update_texture`.
    pub fn create_texture(&mut self, params: TextureParams) -> Result<TextureHandle> {
        params.validate()?;

        let id = unsafe { self.device.create_texture(&params)? };
        let handle: TextureHandle = self.textures.create(TextureObject { id, params }).into();
        debug!("Created {} {:?} with {} levels.", handle, params.layout, params.levels());
        self.poll()?;
        Ok(handle)
    }

    /// Uploads a complete image of mip `level`. `layer` picks the array layer
    /// or cube face (`layer % 6` in +X, -X, +Y, -Y, +Z, -Z order) and is 0
    /// for 1D, 2D and 3D textures.
    pub fn update_texture(
        &mut self,
        handle: TextureHandle,
        level: u32,
        layer: u32,
        format: PixelFormat,
        kind: PixelType,
        data: &[u8],
    ) -> Result<()> {
        let (id, params) = self.texture(handle)?;
        params.validate_image(level, layer, format, kind, data)?;

        unsafe {
            self.device
                .update_texture(id, &params, level, layer, format, kind, data)?
        };
        self.poll()
    }

    /// Fills every level below the base level from the base level.
    pub fn generate_mipmaps(&mut self, handle: TextureHandle) -> Result<()> {
        let (id, params) = self.texture(handle)?;

        if params.levels() == 1 {
            warn!("{} has a single level, mipmap generation is ignored.", handle);
            return Ok(());
        }

        unsafe { self.device.generate_mipmaps(id)? };
        self.poll()
    }

    /// Binds a texture to texture unit `unit`. The unit is sampled with the
    /// sampler bound at the same unit by the current pipeline.
    pub fn bind_texture(&mut self, unit: u32, handle: TextureHandle) -> Result<()> {
        if unit as usize >= MAX_SAMPLER_SLOTS {
            return Err(Error::OutOfBounds);
        }

        let (id, _) = self.texture(handle)?;
        self.submit(Command::BindTexture {
            unit,
            texture: Some(id),
        })
    }

    pub fn unbind_texture(&mut self, unit: u32) -> Result<()> {
        if unit as usize >= MAX_SAMPLER_SLOTS {
            return Err(Error::OutOfBounds);
        }

        self.submit(Command::BindTexture {
            unit,
            texture: None,
        })
    }

    /// Deletes the texture and unbinds it from every texture unit. Framebuffers
    /// it is attached to become incomplete.
    pub fn delete_texture(&mut self, handle: TextureHandle) -> Result<()> {
        let texture = self
            .textures
            .free(handle)
            .ok_or_else(|| Error::TextureHandleInvalid(handle))?;

        unsafe { self.device.delete_texture(texture.id)? };
        self.poll()
    }

    pub fn create_renderbuffer(
        &mut self,
        params: RenderbufferParams,
    ) -> Result<RenderbufferHandle> {
        params.validate()?;

        let id = unsafe { self.device.create_renderbuffer(&params)? };
        let handle = self
            .renderbuffers
            .create(RenderbufferObject { id, params })
            .into();
        self.poll()?;
        Ok(handle)
    }

    pub fn delete_renderbuffer(&mut self, handle: RenderbufferHandle) -> Result<()> {
        let renderbuffer = self
            .renderbuffers
            .free(handle)
            .ok_or_else(|| Error::RenderbufferHandleInvalid(handle))?;

        unsafe { self.device.delete_renderbuffer(renderbuffer.id)? };
        self.poll()
    }

    /// Creates a framebuffer from textures and renderbuffers. All attached
    /// images must have the same dimensions. Color attachments need color
    /// formats and the depth-stencil attachment a depth format.
    pub fn create_framebuffer(
        &mut self,
        params: FramebufferParams,
    ) -> Result<FramebufferHandle> {
        if params.is_empty() {
            return Err(Error::FramebufferInvalid("No images are attached.".into()));
        }

        let mut attachments = Vec::new();
        let mut dimensions = None;

        for (i, attachment) in params.colors.iter().enumerate() {
            if let Some(attachment) = *attachment {
                let (target, format, size) = self.attachment(attachment)?;

                if !format.is_color() {
                    return Err(Error::FramebufferInvalid(format!(
                        "Color attachment {} has the non-color format {:?}.",
                        i, format
                    )));
                }

                check_dimensions(&mut dimensions, size)?;
                attachments.push((AttachmentPoint::Color(i as u32), target));
            }
        }

        if let Some(attachment) = params.depth_stencil {
            let (target, format, size) = self.attachment(attachment)?;

            let point = match (format.is_depth(), format.has_stencil()) {
                (true, true) => AttachmentPoint::DepthStencil,
                (true, false) => AttachmentPoint::Depth,
                _ => {
                    return Err(Error::FramebufferInvalid(format!(
                        "Depth attachment has the non-depth format {:?}.",
                        format
                    )));
                }
            };

            check_dimensions(&mut dimensions, size)?;
            attachments.push((point, target));
        }

        let id = unsafe { self.device.create_framebuffer(&attachments)? };
        let handle = self.framebuffers.create(id).into();
        self.poll()?;
        Ok(handle)
    }

    /// Redirects draws into `handle`, `None` restores the default framebuffer.
    pub fn bind_framebuffer(&mut self, handle: Option<FramebufferHandle>) -> Result<()> {
        let id = match handle {
            Some(handle) => Some(
                *self
                    .framebuffers
                    .get(handle)
                    .ok_or_else(|| Error::FramebufferHandleInvalid(handle))?,
            ),
            None => None,
        };

        self.submit(Command::BindFramebuffer(id))
    }

    /// Deleting the bound framebuffer binds the default framebuffer.
    pub fn delete_framebuffer(&mut self, handle: FramebufferHandle) -> Result<()> {
        let id = self
            .framebuffers
            .free(handle)
            .ok_or_else(|| Error::FramebufferHandleInvalid(handle))?;

        unsafe { self.device.delete_framebuffer(id)? };
        self.poll()
    }

    fn texture(&self, handle: TextureHandle) -> Result<(ResourceId, TextureParams)> {
        self.textures
            .get(handle)
            .map(|v| (v.id, v.params))
            .ok_or_else(|| Error::TextureHandleInvalid(handle))
    }

    fn attachment(
        &self,
        attachment: Attachment,
    ) -> Result<(AttachmentTarget, TextureFormat, (u32, u32))> {
        match attachment {
            Attachment::Texture {
                handle,
                level,
                layer,
            } => {
                let (id, params) = self.texture(handle)?;

                if level >= params.levels() {
                    return Err(Error::FramebufferInvalid(format!(
                        "{} has no mip level {}.",
                        handle, level
                    )));
                }

                let (w, h, d) = params.image_dimensions(level);
                if let Some(layer) = layer {
                    let layers = match params.layout {
                        TextureLayout::Tex1D | TextureLayout::Tex2D => 0,
                        TextureLayout::Tex3D => d,
                        _ => params.layers(),
                    };

                    if layer >= layers {
                        return Err(Error::FramebufferInvalid(format!(
                            "{} has no layer {} at level {}.",
                            handle, layer, level
                        )));
                    }
                }

                let target = AttachmentTarget::Texture { id, level, layer };
                Ok((target, params.format, (w, h)))
            }

            Attachment::Renderbuffer(handle) => {
                let renderbuffer = self
                    .renderbuffers
                    .get(handle)
                    .ok_or_else(|| Error::RenderbufferHandleInvalid(handle))?;

                let params = renderbuffer.params;
                let target = AttachmentTarget::Renderbuffer(renderbuffer.id);
                Ok((target, params.format, (params.width, params.height)))
            }
        }
    }
}

fn check_dimensions(dimensions: &mut Option<(u32, u32)>, size: (u32, u32)) -> Result<()> {
    match *dimensions {
        Some(v) if v != size => Err(Error::FramebufferInvalid(format!(
            "Attachments differ in size, {}x{} and {}x{}.",
            v.0, v.1, size.0, size.1
        ))),
        _ => {
            *dimensions = Some(size);
            Ok(())
        }
    }
}

impl<D: Device> Context<D> {
    pub fn create_query(&mut self, kind: QueryKind) -> Result<QueryHandle> {
        let id = unsafe { self.device.create_query(kind)? };
        let handle = self
            .queries
            .create(QueryObject {
                id,
                kind,
                active: false,
                issued: false,
                results: QueryResults::default(),
            })
            .into();

        self.poll()?;
        Ok(handle)
    }

    /// Starts counting. Only one query of each kind can be active at a time.
    pub fn begin_query(&mut self, handle: QueryHandle) -> Result<()> {
        let (id, kind) = self.query(handle)?;

        if let Some(&other) = self.active_queries.get(&kind) {
            return Err(Error::QueryInvalid(format!(
                "{} can not begin while {} of kind {:?} is active.",
                handle, other, kind
            )));
        }

        self.submit(Command::BeginQuery { kind, query: id })?;
        self.active_queries.insert(kind, handle);

        if let Some(query) = self.queries.get_mut(handle) {
            query.active = true;
            query.issued = false;
        }

        Ok(())
    }

    pub fn end_query(&mut self, handle: QueryHandle) -> Result<()> {
        let (_, kind) = self.query(handle)?;

        if self.active_queries.get(&kind) != Some(&handle) {
            return Err(Error::QueryInvalid(format!("{} is not active.", handle)));
        }

        self.submit(Command::EndQuery(kind))?;
        self.active_queries.remove(&kind);

        if let Some(query) = self.queries.get_mut(handle) {
            query.active = false;
            query.issued = true;
        }

        Ok(())
    }

    /// Receives the result of the last ended query. Without `wait`, this
    /// returns `None` while the GPU has not finished yet. Every received
    /// result is recorded in `query_results`.
    pub fn receive_query(&mut self, handle: QueryHandle, wait: bool) -> Result<Option<f64>> {
        let (id, kind) = self.query(handle)?;

        if let Some(query) = self.queries.get(handle) {
            if query.active {
                return Err(Error::QueryInvalid(format!("{} is still active.", handle)));
            }

            if !query.issued {
                return Err(Error::QueryInvalid(format!(
                    "{} has no pending result.",
                    handle
                )));
            }
        }

        let raw = unsafe { self.device.query_result(id, wait)? };
        self.poll()?;

        match raw {
            Some(raw) => {
                let value = kind.convert(raw);
                if let Some(query) = self.queries.get_mut(handle) {
                    query.issued = false;
                    query.results.record(value);
                }

                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub fn query_results(&self, handle: QueryHandle) -> Result<QueryResults> {
        self.queries
            .get(handle)
            .map(|v| v.results)
            .ok_or_else(|| Error::QueryHandleInvalid(handle))
    }

    /// An active query is ended before it is deleted.
    pub fn delete_query(&mut self, handle: QueryHandle) -> Result<()> {
        let (_, kind) = self.query(handle)?;

        if self.active_queries.get(&kind) == Some(&handle) {
            self.end_query(handle)?;
        }

        let query = self
            .queries
            .free(handle)
            .ok_or_else(|| Error::QueryHandleInvalid(handle))?;

        unsafe { self.device.delete_query(query.id)? };
        self.poll()
    }

    fn query(&self, handle: QueryHandle) -> Result<(ResourceId, QueryKind)> {
        self.queries
            .get(handle)
            .map(|v| (v.id, v.kind))
            .ok_or_else(|| Error::QueryHandleInvalid(handle))
    }
}

impl<D: Device> Context<D> {
    /// Binds a buffer to a vertex buffer binding of the current vertex format,
    /// starting at element `offset`. The stride is the element size.
    pub fn bind_vertex_buffer(
        &mut self,
        binding: u32,
        handle: BufferHandle,
        offset: u32,
    ) -> Result<()> {
        let (buffer, params) = self.buffer(handle)?;

        if offset >= params.elements {
            return Err(Error::OutOfBounds);
        }

        self.submit(Command::BindVertexBuffer {
            binding,
            buffer,
            offset: offset as usize * params.element_size as usize,
            stride: params.element_size,
        })
    }

    /// Index buffers are part of the vertex format state. Bind them after
    /// `set_state`, since it rebinds the vertex format.
    pub fn bind_index_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        let (buffer, _) = self.buffer(handle)?;
        self.submit(Command::BindIndexBuffer(buffer))
    }

    /// Binds a buffer to the target its `BufferKind` names. Vertex buffers
    /// go to vertex buffer binding `index`, indexed targets (uniform, shader
    /// storage, atomic counter and transform feedback) bind the whole buffer
    /// at `index`. Index and indirect buffers ignore `index`.
    pub fn bind_buffer(&mut self, index: u32, handle: BufferHandle) -> Result<()> {
        let (buffer, params) = self.buffer(handle)?;

        match params.kind {
            BufferKind::Vertex => self.bind_vertex_buffer(index, handle, 0),
            BufferKind::Index => self.bind_index_buffer(handle),
            BufferKind::Uniform => self.bind_range(IndexedTarget::Uniform, index, handle, 0, None),
            BufferKind::ShaderStorage => {
                self.bind_range(IndexedTarget::ShaderStorage, index, handle, 0, None)
            }
            BufferKind::AtomicCounter => {
                self.bind_range(IndexedTarget::AtomicCounter, index, handle, 0, None)
            }
            BufferKind::TransformFeedback => {
                self.bind_range(IndexedTarget::TransformFeedback, index, handle, 0, None)
            }
            BufferKind::DrawIndirect => {
                self.submit(Command::BindIndirectBuffer {
                    target: IndirectTarget::Draw,
                    buffer,
                })?;
                self.draw_indirect = Some(handle);
                Ok(())
            }
            BufferKind::DispatchIndirect => {
                self.submit(Command::BindIndirectBuffer {
                    target: IndirectTarget::Dispatch,
                    buffer,
                })?;
                self.dispatch_indirect = Some(handle);
                Ok(())
            }
            BufferKind::Texture => Err(Error::BufferInvalid(format!(
                "{} is a texture buffer, which has no binding point.",
                handle
            ))),
        }
    }

    /// Binds the byte range `offset..offset + size` to a uniform block binding
    /// point. A `size` of `None` binds everything behind `offset`.
    #[inline]
    pub fn bind_uniform_buffer(
        &mut self,
        index: u32,
        handle: BufferHandle,
        offset: usize,
        size: Option<usize>,
    ) -> Result<()> {
        self.bind_range(IndexedTarget::Uniform, index, handle, offset, size)
    }

    /// Binds a byte range to a shader storage block binding point.
    #[inline]
    pub fn bind_storage_buffer(
        &mut self,
        index: u32,
        handle: BufferHandle,
        offset: usize,
        size: Option<usize>,
    ) -> Result<()> {
        self.bind_range(IndexedTarget::ShaderStorage, index, handle, offset, size)
    }

    /// Binds a byte range to an atomic counter binding point.
    #[inline]
    pub fn bind_atomic_buffer(
        &mut self,
        index: u32,
        handle: BufferHandle,
        offset: usize,
        size: Option<usize>,
    ) -> Result<()> {
        self.bind_range(IndexedTarget::AtomicCounter, index, handle, offset, size)
    }

    fn bind_range(
        &mut self,
        target: IndexedTarget,
        index: u32,
        handle: BufferHandle,
        offset: usize,
        size: Option<usize>,
    ) -> Result<()> {
        let (buffer, params) = self.buffer(handle)?;
        let size = params.range(offset, size)?;

        self.submit(Command::BindBufferRange {
            target,
            index,
            buffer,
            offset,
            size,
        })
    }

    #[inline]
    pub fn draw(&mut self, primitive: Primitive, first: u32, count: u32) -> Result<()> {
        self.draw_instanced(primitive, first, count, 1)
    }

    pub fn draw_instanced(
        &mut self,
        primitive: Primitive,
        first: u32,
        count: u32,
        instances: u32,
    ) -> Result<()> {
        self.submit(Command::Draw {
            primitive,
            first,
            count,
            instances,
        })
    }

    /// Draws `count` indices of the bound index buffer, starting at index
    /// `first`.
    pub fn draw_indexed(
        &mut self,
        primitive: Primitive,
        format: IndexFormat,
        first: u32,
        count: u32,
    ) -> Result<()> {
        self.submit(Command::DrawIndexed {
            primitive,
            format,
            offset: first as usize * format.stride(),
            count,
            instances: 1,
        })
    }

    /// Draws with the arguments stored at byte `offset` of the buffer bound
    /// with `bind_buffer` as `BufferKind::DrawIndirect`.
    pub fn draw_indirect(&mut self, primitive: Primitive, offset: usize) -> Result<()> {
        let handle = self.draw_indirect;
        self.check_indirect(handle, offset, DRAW_INDIRECT_SIZE)?;
        self.submit(Command::DrawIndirect { primitive, offset })
    }

    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        if x == 0 || y == 0 || z == 0 {
            warn!("Empty dispatch ({}, {}, {}) is ignored.", x, y, z);
            return Ok(());
        }

        self.submit(Command::Dispatch { x, y, z })
    }

    /// Dispatches with the work group counts stored at byte `offset` of the
    /// buffer bound with `bind_buffer` as `BufferKind::DispatchIndirect`.
    pub fn dispatch_indirect(&mut self, offset: usize) -> Result<()> {
        let handle = self.dispatch_indirect;
        self.check_indirect(handle, offset, DISPATCH_INDIRECT_SIZE)?;
        self.submit(Command::DispatchIndirect { offset })
    }

    fn check_indirect(
        &self,
        handle: Option<BufferHandle>,
        offset: usize,
        len: usize,
    ) -> Result<()> {
        let handle = handle
            .ok_or_else(|| Error::BufferInvalid("No indirect buffer is bound.".into()))?;
        let (_, params) = self.buffer(handle)?;

        if offset % 4 != 0 {
            return Err(Error::BufferInvalid(format!(
                "Indirect offset {} is not a multiple of 4.",
                offset
            )));
        }

        params.range(offset, Some(len)).map(|_| ())
    }
}

// Sizes of the argument structs of `glDrawArraysIndirect` and
// `glDispatchComputeIndirect`.
const DRAW_INDIRECT_SIZE: usize = 16;
const DISPATCH_INDIRECT_SIZE: usize = 12;

impl<D: Device> Drop for Context<D> {
    fn drop(&mut self) {
        let device = &mut self.device;

        unsafe {
            self.programs.drain(|v| {
                if let Err(err) = device.delete_program(v.id) {
                    warn!("Failed to delete program {}: {}", v.id, err);
                }
            });

            self.shaders.drain(|v| {
                if let Err(err) = device.delete_shader(v.id) {
                    warn!("Failed to delete shader {}: {}", v.id, err);
                }
            });

            self.samplers.drain(|id| {
                if let Err(err) = device.delete_sampler(id) {
                    warn!("Failed to delete sampler {}: {}", id, err);
                }
            });

            self.vertex_formats.drain(|id| {
                if let Err(err) = device.delete_vertex_format(id) {
                    warn!("Failed to delete vertex format {}: {}", id, err);
                }
            });

            self.buffers.drain(|v| {
                if let Err(err) = device.delete_buffer(v.id) {
                    warn!("Failed to delete buffer {}: {}", v.id, err);
                }
            });

            self.framebuffers.drain(|id| {
                if let Err(err) = device.delete_framebuffer(id) {
                    warn!("Failed to delete framebuffer {}: {}", id, err);
                }
            });

            self.textures.drain(|v| {
                if let Err(err) = device.delete_texture(v.id) {
                    warn!("Failed to delete texture {}: {}", v.id, err);
                }
            });

            self.renderbuffers.drain(|v| {
                if let Err(err) = device.delete_renderbuffer(v.id) {
                    warn!("Failed to delete renderbuffer {}: {}", v.id, err);
                }
            });

            self.queries.drain(|v| {
                if let Err(err) = device.delete_query(v.id) {
                    warn!("Failed to delete query {}: {}", v.id, err);
                }
            });

            if self.empty_vertex_format != 0 {
                if let Err(err) = device.delete_vertex_format(self.empty_vertex_format) {
                    warn!("Failed to delete vertex format: {}", err);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::super::backends::headless::HeadlessDevice;
    use super::super::backends::Face;
    use super::*;

    fn context() -> Context<HeadlessDevice> {
        let mut ctx = Context::new(HeadlessDevice::new(), ContextParams::default()).unwrap();
        ctx.device_mut().take_commands();
        ctx
    }

    fn program(ctx: &mut Context<HeadlessDevice>) -> ProgramHandle {
        let vs = ctx.create_shader(ShaderKind::Vertex, "void main() {}").unwrap();
        let fs = ctx.create_shader(ShaderKind::Fragment, "void main() {}").unwrap();
        ctx.create_program(&[vs, fs]).unwrap()
    }

    #[test]
    fn construction() {
        let ctx = Context::new(HeadlessDevice::new(), ContextParams::default()).unwrap();
        assert_eq!(
            ctx.device().commands(),
            [Command::Enable(Capability::TextureCubeMapSeamless)]
        );
        assert_eq!(
            ctx.device().min_severity(),
            Some(ContextParams::default().debug_severity)
        );
        assert_eq!(ctx.device().live_resources(), 1);

        let params = ContextParams {
            seamless_cube_maps: false,
            ..Default::default()
        };
        let ctx = Context::new(HeadlessDevice::new(), params).unwrap();
        assert!(ctx.device().commands().is_empty());
    }

    #[test]
    fn default_pipeline_binds_empty_vertex_format() {
        let mut ctx = context();
        ctx.set_state(&Pipeline::default()).unwrap();

        let commands = ctx.device_mut().take_commands();
        assert_eq!(commands.len(), 1);
        match commands[0] {
            Command::BindVertexFormat(id) => assert_eq!(id, ctx.empty_vertex_format),
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn state_then_program() {
        let mut ctx = context();
        let program = program(&mut ctx);
        let program_id = ctx.programs.get(program).unwrap().id;

        let mut pipeline = Pipeline::default().with_program(program);
        pipeline.rasterizer.cull_mode = CullMode::Front;
        ctx.set_state(&pipeline).unwrap();

        assert_eq!(
            ctx.device_mut().take_commands(),
            [
                Command::Enable(Capability::CullFace),
                Command::CullFace(Face::Front),
                Command::UseProgram(program_id),
                Command::BindVertexFormat(ctx.empty_vertex_format),
            ]
        );
        assert!(ctx.is_current(&pipeline));
    }

    #[test]
    fn compute_state() {
        let mut ctx = context();
        let cs = ctx.create_shader(ShaderKind::Compute, "void main() {}").unwrap();
        let program = ctx.create_program(&[cs]).unwrap();
        let sampler = ctx.create_sampler(SamplerParams::default()).unwrap();
        ctx.device_mut().take_commands();

        let pipeline = ComputePipeline::default()
            .with_program(program)
            .with_sampler(2, sampler);
        ctx.set_compute_state(&pipeline).unwrap();

        let commands = ctx.device_mut().take_commands();
        assert_eq!(commands.len(), 2);
        match commands[0] {
            Command::BindSampler { unit: 2, sampler } => assert!(sampler.is_some()),
            ref other => panic!("unexpected {:?}", other),
        }

        match ctx.set_state(&Pipeline::default().with_program(program)) {
            Err(Error::ProgramInvalid(_)) => {}
            other => panic!("unexpected {:?}", other),
        }

        ctx.set_compute_state(&pipeline).unwrap();
        assert_eq!(ctx.device_mut().take_commands().len(), 1);
    }

    #[test]
    fn stale_handles() {
        let mut ctx = context();
        let sampler = ctx.create_sampler(SamplerParams::default()).unwrap();
        ctx.delete_sampler(sampler).unwrap();

        let pipeline = Pipeline::default().with_sampler(0, sampler);
        match ctx.set_state(&pipeline) {
            Err(Error::SamplerHandleInvalid(v)) => assert_eq!(v, sampler),
            other => panic!("unexpected {:?}", other),
        }

        match ctx.delete_sampler(sampler) {
            Err(Error::SamplerHandleInvalid(_)) => {}
            other => panic!("unexpected {:?}", other),
        }

        let reused = ctx.create_sampler(SamplerParams::default()).unwrap();
        assert_eq!(reused.index(), sampler.index());
        assert_ne!(reused, sampler);

        let format = ctx
            .create_vertex_format(VertexFormatParams::default())
            .unwrap();
        ctx.delete_vertex_format(format).unwrap();
        match ctx.set_state(&Pipeline::default().with_vertex_format(format)) {
            Err(Error::VertexFormatHandleInvalid(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn deleted_sampler_is_unbound() {
        let mut ctx = context();
        let sampler = ctx.create_sampler(SamplerParams::default()).unwrap();

        let bound = Pipeline::default().with_sampler(4, sampler);
        ctx.set_state(&bound).unwrap();
        ctx.delete_sampler(sampler).unwrap();
        ctx.device_mut().take_commands();

        // The driver already unbound the deleted sampler.
        ctx.set_state(&Pipeline::default()).unwrap();
        assert_eq!(ctx.device_mut().take_commands().len(), 1);
    }

    #[test]
    fn shader_stages() {
        let mut ctx = context();
        let vs = ctx.create_shader(ShaderKind::Vertex, "void main() {}").unwrap();

        match ctx.create_program(&[vs]) {
            Err(Error::ProgramInvalid(_)) => {}
            other => panic!("unexpected {:?}", other),
        }

        match ctx.create_shader(ShaderKind::Fragment, "  ") {
            Err(Error::ShaderCompileFailure(name, _)) => assert_eq!(name, "Fragment shader"),
            other => panic!("unexpected {:?}", other),
        }

        match ctx.create_shader_from_file("shaders/voxel.glsl") {
            Err(Error::ShaderStageUnknown(_)) => {}
            other => panic!("unexpected {:?}", other),
        }

        match ctx.create_shader_from_file("/nonexistent/voxel.frag") {
            Err(Error::Io(..)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn buffer_binds() {
        let mut ctx = context();
        let mut params = BufferParams::new(BufferKind::Uniform, 16, 4);
        params.usage = BufferUsage::dynamic();
        let buffer = ctx.create_buffer(params, None).unwrap();

        ctx.bind_uniform_buffer(1, buffer, 16, None).unwrap();
        match ctx.device_mut().take_commands()[0] {
            Command::BindBufferRange {
                target: IndexedTarget::Uniform,
                index,
                offset,
                size,
                ..
            } => {
                assert_eq!((index, offset, size), (1, 16, 48));
            }
            ref other => panic!("unexpected {:?}", other),
        }

        ctx.bind_storage_buffer(2, buffer, 0, Some(32)).unwrap();
        ctx.bind_atomic_buffer(3, buffer, 60, Some(4)).unwrap();
        let targets: Vec<_> = ctx
            .device_mut()
            .take_commands()
            .into_iter()
            .map(|v| match v {
                Command::BindBufferRange { target, size, .. } => (target, size),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(
            targets,
            [(IndexedTarget::ShaderStorage, 32), (IndexedTarget::AtomicCounter, 4)]
        );

        ctx.bind_vertex_buffer(0, buffer, 2).unwrap();
        match ctx.device_mut().take_commands()[0] {
            Command::BindVertexBuffer { offset, stride, .. } => {
                assert_eq!((offset, stride), (32, 16));
            }
            ref other => panic!("unexpected {:?}", other),
        }

        assert!(ctx.bind_uniform_buffer(0, buffer, 64, None).is_err());
        assert!(ctx.bind_uniform_buffer(0, buffer, 32, Some(64)).is_err());
        assert!(ctx.update_buffer(buffer, 60, &[0; 8]).is_err());
        assert!(ctx.update_buffer(buffer, 0, &[0; 8]).is_ok());
        assert!(ctx.device().commands().is_empty());
    }

    #[test]
    fn huge_ranges_are_out_of_bounds() {
        let mut ctx = context();
        let mut params = BufferParams::new(BufferKind::Uniform, 16, 4);
        params.usage = BufferUsage::dynamic();
        let buffer = ctx.create_buffer(params, None).unwrap();

        match ctx.bind_uniform_buffer(0, buffer, 16, Some(usize::MAX)) {
            Err(Error::OutOfBounds) => {}
            other => panic!("unexpected {:?}", other),
        }

        match ctx.bind_storage_buffer(0, buffer, 1, Some(usize::MAX - 1)) {
            Err(Error::OutOfBounds) => {}
            other => panic!("unexpected {:?}", other),
        }

        match ctx.update_buffer(buffer, usize::MAX, &[0; 8]) {
            Err(Error::OutOfBounds) => {}
            other => panic!("unexpected {:?}", other),
        }

        match ctx.map_buffer(buffer, MapAccess::write(), 8, Some(usize::MAX)) {
            Err(Error::MappingInvalid(_)) | Err(Error::OutOfBounds) => {}
            other => panic!("unexpected {:?}", other.map(|v| v.len())),
        }

        assert!(ctx.device().commands().is_empty());
    }

    #[test]
    fn bind_by_kind() {
        let mut ctx = context();
        let mut bound = Vec::new();

        for &kind in &BufferKind::VARIANTS {
            let buffer = ctx
                .create_buffer(BufferParams::new(kind, 16, 2), None)
                .unwrap();

            let result = ctx.bind_buffer(3, buffer);
            if kind == BufferKind::Texture {
                match result {
                    Err(Error::BufferInvalid(_)) => {}
                    other => panic!("unexpected {:?}", other),
                }
            } else {
                result.unwrap();
            }

            bound.extend(ctx.device_mut().take_commands());
        }

        assert_eq!(bound.len(), BufferKind::VARIANTS.len() - 1);
        match bound[0] {
            Command::BindVertexBuffer {
                binding: 3,
                offset: 0,
                stride: 16,
                ..
            } => {}
            ref other => panic!("unexpected {:?}", other),
        }

        let targets: Vec<_> = bound
            .iter()
            .filter_map(|v| match *v {
                Command::BindBufferRange {
                    target,
                    index: 3,
                    offset: 0,
                    size: 32,
                    ..
                } => Some(target),
                _ => None,
            })
            .collect();
        assert_eq!(
            targets,
            [
                IndexedTarget::ShaderStorage,
                IndexedTarget::Uniform,
                IndexedTarget::AtomicCounter,
                IndexedTarget::TransformFeedback,
            ]
        );

        assert!(bound.iter().any(|v| match *v {
            Command::BindIndexBuffer(_) => true,
            _ => false,
        }));
        assert!(bound.iter().any(|v| match *v {
            Command::BindIndirectBuffer {
                target: IndirectTarget::Dispatch,
                ..
            } => true,
            _ => false,
        }));
    }

    #[test]
    fn indirect() {
        let mut ctx = context();

        match ctx.draw_indirect(Primitive::Triangles, 0) {
            Err(Error::BufferInvalid(_)) => {}
            other => panic!("unexpected {:?}", other),
        }

        let args = ctx
            .create_buffer(BufferParams::new(BufferKind::DrawIndirect, 16, 2), None)
            .unwrap();
        ctx.bind_buffer(0, args).unwrap();
        ctx.device_mut().take_commands();

        ctx.draw_indirect(Primitive::Triangles, 16).unwrap();
        assert_eq!(
            ctx.device_mut().take_commands(),
            [Command::DrawIndirect {
                primitive: Primitive::Triangles,
                offset: 16
            }]
        );

        assert!(ctx.draw_indirect(Primitive::Triangles, 20).is_err());
        assert!(ctx.draw_indirect(Primitive::Triangles, 2).is_err());
        assert!(ctx.dispatch_indirect(0).is_err());

        ctx.delete_buffer(args).unwrap();
        assert!(ctx.draw_indirect(Primitive::Triangles, 0).is_err());
        assert!(ctx.device().commands().is_empty());
    }

    #[test]
    fn mapping() {
        let mut ctx = context();
        let mut params = BufferParams::new(BufferKind::ShaderStorage, 4, 4);
        params.usage = BufferUsage::persistent(false);
        let buffer = ctx.create_buffer(params, Some(&[7; 16])).unwrap();

        let access = MapAccess {
            persistent: true,
            ..MapAccess::write()
        };

        {
            let bytes = ctx.map_buffer(buffer, access, 4, None).unwrap();
            assert_eq!(bytes.len(), 12);
            bytes[0] = 1;
        }

        match ctx.map_buffer(buffer, MapAccess::read(), 0, None) {
            Err(Error::MappingInvalid(_)) => {}
            other => panic!("unexpected {:?}", other.map(|v| v.len())),
        }

        assert_eq!(ctx.mapped_buffer(buffer).unwrap()[..2], [1, 7]);
        ctx.flush_buffer(buffer).unwrap();
        ctx.receive_buffer(buffer).unwrap();
        ctx.unmap_buffer(buffer).unwrap();

        assert!(ctx.mapped_buffer(buffer).is_err());
        assert!(ctx.flush_buffer(buffer).is_err());
        assert!(ctx.unmap_buffer(buffer).is_err());

        let bytes = ctx.map_buffer(buffer, MapAccess::read(), 0, None).unwrap();
        assert_eq!(bytes[..6], [7, 7, 7, 7, 1, 7]);
    }

    #[test]
    fn textures() {
        let mut ctx = context();
        let params = TextureParams::new_2d(4, 2, TextureFormat::RGBA8);
        let texture = ctx.create_texture(params).unwrap();

        ctx.update_texture(texture, 0, 0, PixelFormat::RGBA, PixelType::U8, &[0; 32])
            .unwrap();
        ctx.update_texture(texture, 2, 0, PixelFormat::RGBA, PixelType::U8, &[0; 4])
            .unwrap();

        match ctx.update_texture(texture, 3, 0, PixelFormat::RGBA, PixelType::U8, &[0; 4]) {
            Err(Error::OutOfBounds) => {}
            other => panic!("unexpected {:?}", other),
        }

        match ctx.update_texture(texture, 0, 0, PixelFormat::RGB, PixelType::U8, &[0; 32]) {
            Err(Error::TextureInvalid(_)) => {}
            other => panic!("unexpected {:?}", other),
        }

        ctx.generate_mipmaps(texture).unwrap();
        ctx.bind_texture(7, texture).unwrap();
        ctx.unbind_texture(7).unwrap();
        assert!(ctx.bind_texture(MAX_SAMPLER_SLOTS as u32, texture).is_err());

        let id = ctx.textures.get(texture).unwrap().id;
        assert_eq!(
            ctx.device_mut().take_commands(),
            [
                Command::BindTexture {
                    unit: 7,
                    texture: Some(id)
                },
                Command::BindTexture {
                    unit: 7,
                    texture: None
                },
            ]
        );

        ctx.delete_texture(texture).unwrap();
        match ctx.bind_texture(0, texture) {
            Err(Error::TextureHandleInvalid(_)) => {}
            other => panic!("unexpected {:?}", other),
        }

        let cube = TextureParams::new_cube(4, TextureFormat::RGBA8);
        assert!(ctx.create_texture(cube).is_ok());
        assert!(ctx
            .create_texture(TextureParams::new_cube(0, TextureFormat::RGBA8))
            .is_err());
    }

    #[test]
    fn framebuffers() {
        let mut ctx = context();
        let color = ctx
            .create_texture(TextureParams::new_2d(64, 32, TextureFormat::RGBA16F))
            .unwrap();
        let depth = ctx
            .create_renderbuffer(RenderbufferParams::new(64, 32, TextureFormat::Depth24Stencil8))
            .unwrap();

        let params = FramebufferParams::default()
            .with_color(0, Attachment::texture(color))
            .with_depth_stencil(depth);
        let framebuffer = ctx.create_framebuffer(params).unwrap();

        ctx.bind_framebuffer(Some(framebuffer)).unwrap();
        ctx.bind_framebuffer(None).unwrap();
        let id = *ctx.framebuffers.get(framebuffer).unwrap();
        assert_eq!(
            ctx.device_mut().take_commands(),
            [
                Command::BindFramebuffer(Some(id)),
                Command::BindFramebuffer(None)
            ]
        );

        let invalid = |ctx: &mut Context<HeadlessDevice>, params: FramebufferParams| {
            match ctx.create_framebuffer(params) {
                Err(Error::FramebufferInvalid(_)) => {}
                other => panic!("unexpected {:?}", other),
            }
        };

        invalid(&mut ctx, FramebufferParams::default());
        invalid(
            &mut ctx,
            FramebufferParams::default().with_color(0, Attachment::Renderbuffer(depth)),
        );
        invalid(
            &mut ctx,
            FramebufferParams::default().with_depth_stencil(Attachment::texture(color)),
        );

        // Level 1 is 32x16, the renderbuffer is 64x32.
        invalid(
            &mut ctx,
            FramebufferParams::default()
                .with_color(
                    0,
                    Attachment::Texture {
                        handle: color,
                        level: 1,
                        layer: None,
                    },
                )
                .with_depth_stencil(depth),
        );
        invalid(
            &mut ctx,
            FramebufferParams::default().with_color(
                1,
                Attachment::Texture {
                    handle: color,
                    level: 7,
                    layer: None,
                },
            ),
        );

        let array = ctx
            .create_texture(TextureParams::new_2d_array(64, 32, 4, TextureFormat::RGBA8))
            .unwrap();
        let layered = FramebufferParams::default()
            .with_color(0, Attachment::texture_layer(array, 0, 3))
            .with_color(1, Attachment::texture(color));
        assert!(ctx.create_framebuffer(layered).is_ok());
        invalid(
            &mut ctx,
            FramebufferParams::default().with_color(0, Attachment::texture_layer(array, 0, 4)),
        );

        ctx.delete_framebuffer(framebuffer).unwrap();
        match ctx.bind_framebuffer(Some(framebuffer)) {
            Err(Error::FramebufferHandleInvalid(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn queries() {
        let mut ctx = context();
        let timer = ctx.create_query(QueryKind::TimeElapsed).unwrap();
        let other = ctx.create_query(QueryKind::TimeElapsed).unwrap();

        match ctx.receive_query(timer, false) {
            Err(Error::QueryInvalid(_)) => {}
            other => panic!("unexpected {:?}", other),
        }

        ctx.begin_query(timer).unwrap();
        match ctx.begin_query(other) {
            Err(Error::QueryInvalid(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(ctx.receive_query(timer, false).is_err());
        assert!(ctx.end_query(other).is_err());

        ctx.end_query(timer).unwrap();
        assert_eq!(ctx.receive_query(timer, false).unwrap(), None);

        ctx.device_mut().resolve_queries(4_000_000);
        assert_eq!(ctx.receive_query(timer, true).unwrap(), Some(4.0));
        assert!(ctx.receive_query(timer, true).is_err());

        ctx.begin_query(other).unwrap();
        ctx.end_query(other).unwrap();
        ctx.device_mut().resolve_queries(2_000_000);
        ctx.receive_query(other, true).unwrap();

        let results = ctx.query_results(timer).unwrap();
        assert_eq!((results.count, results.latest), (1, 4.0));
        assert_eq!(ctx.query_results(other).unwrap().latest, 2.0);

        ctx.begin_query(timer).unwrap();
        ctx.device_mut().take_commands();
        ctx.delete_query(timer).unwrap();
        assert_eq!(
            ctx.device_mut().take_commands(),
            [Command::EndQuery(QueryKind::TimeElapsed)]
        );

        // The kind is free again once its active query is gone.
        ctx.begin_query(other).unwrap();
        assert!(ctx.query_results(timer).is_err());
    }

    #[test]
    fn program_binaries() {
        let mut ctx = context();
        let cs = ctx.create_shader(ShaderKind::Compute, "void main() {}").unwrap();
        let program = ctx.create_program(&[cs]).unwrap();

        let binary = ctx.program_binary(program).unwrap();
        assert!(binary.compute);
        assert!(!binary.bytes.is_empty());

        let json = serde_json::to_string(&binary).unwrap();
        let binary: ProgramBinary = serde_json::from_str(&json).unwrap();

        let loaded = ctx.create_program_from_binary(&binary).unwrap();
        ctx.set_compute_state(&ComputePipeline::default().with_program(loaded))
            .unwrap();

        let foreign = ProgramBinary {
            format: 1,
            ..binary.clone()
        };
        match ctx.create_program_from_binary(&foreign) {
            Err(Error::ProgramLinkFailure(_)) => {}
            other => panic!("unexpected {:?}", other),
        }

        let empty = ProgramBinary {
            bytes: Vec::new(),
            ..binary
        };
        assert!(ctx.create_program_from_binary(&empty).is_err());

        ctx.delete_program(program).unwrap();
        assert!(ctx.program_binary(program).is_err());
    }

    #[test]
    fn delete_resources() {
        let mut ctx = context();
        let program = program(&mut ctx);
        let sampler = ctx.create_sampler(SamplerParams::default()).unwrap();
        let buffer = ctx
            .create_buffer(BufferParams::new(BufferKind::Vertex, 12, 3), None)
            .unwrap();
        assert_eq!(ctx.device().live_resources(), 6);

        ctx.delete_program(program).unwrap();
        ctx.delete_sampler(sampler).unwrap();
        ctx.delete_buffer(buffer).unwrap();
        assert_eq!(ctx.device().live_resources(), 3);

        match ctx.delete_buffer(buffer) {
            Err(Error::BufferHandleInvalid(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
