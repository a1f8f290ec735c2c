use std::collections::HashMap;

use super::super::assets::prelude::*;
use super::super::debug::{DebugMessage, DebugSeverity};
use super::super::errors::Error;
use super::{AttachmentPoint, AttachmentTarget, Command, Device, ResourceId};

use crate::errors::*;

/// Binary format tag of the programs handed out by `HeadlessDevice`.
pub const HEADLESS_BINARY_FORMAT: u32 = 0x4845_4144;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryStatus {
    Idle,
    Active,
    Pending,
    Ready(u64),
}

#[derive(Debug)]
enum Resource {
    Sampler,
    Shader,
    Program,
    VertexFormat,
    Buffer {
        bytes: Vec<u8>,
        dynamic: bool,
        mapped: bool,
    },
    Texture,
    Renderbuffer,
    Framebuffer,
    Query {
        kind: QueryKind,
        status: QueryStatus,
    },
}

impl Resource {
    fn name(&self) -> &'static str {
        match *self {
            Resource::Sampler => "Sampler",
            Resource::Shader => "Shader",
            Resource::Program => "Program",
            Resource::VertexFormat => "VertexFormat",
            Resource::Buffer { .. } => "Buffer",
            Resource::Texture => "Texture",
            Resource::Renderbuffer => "Renderbuffer",
            Resource::Framebuffer => "Framebuffer",
            Resource::Query { .. } => "Query",
        }
    }
}

/// A device without any driver behind it. Every command is recorded, so that
/// callers can inspect exactly what would have been sent to the driver.
///
/// Buffers are backed by host memory, which makes mapped ranges readable and
/// writable. Query results stay pending until `resolve_queries` is called.
#[derive(Default)]
pub struct HeadlessDevice {
    commands: Vec<Command>,
    messages: Vec<DebugMessage>,
    min_severity: Option<DebugSeverity>,
    resources: HashMap<ResourceId, Resource>,
    next_id: ResourceId,
    fail_next: bool,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Default::default()
    }

    /// Commands executed so far.
    #[inline]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Takes all commands executed since the last call.
    pub fn take_commands(&mut self) -> Vec<Command> {
        ::std::mem::replace(&mut self.commands, Vec::new())
    }

    /// Queues a message as if the driver had reported it. Messages below the
    /// configured minimum severity are dropped, just like a driver would.
    pub fn inject_message(&mut self, msg: DebugMessage) {
        if let Some(min) = self.min_severity {
            if !msg.severity.is_reported(min) {
                return;
            }
        }

        self.messages.push(msg);
    }

    /// Makes the next `execute` fail as if the driver had raised an error.
    /// The failed command is not recorded.
    pub fn fail_next_command(&mut self) {
        self.fail_next = true;
    }

    /// Completes every ended query with `value`.
    pub fn resolve_queries(&mut self, value: u64) {
        for v in self.resources.values_mut() {
            if let Resource::Query { ref mut status, .. } = *v {
                if *status == QueryStatus::Pending {
                    *status = QueryStatus::Ready(value);
                }
            }
        }
    }

    /// Returns the number of live driver objects.
    #[inline]
    pub fn live_resources(&self) -> usize {
        self.resources.len()
    }

    #[inline]
    pub fn min_severity(&self) -> Option<DebugSeverity> {
        self.min_severity
    }

    fn alloc(&mut self, resource: Resource) -> ResourceId {
        self.next_id += 1;
        self.resources.insert(self.next_id, resource);
        self.next_id
    }

    fn expect(&self, id: ResourceId, expected: &'static str) -> Result<()> {
        match self.resources.get(&id) {
            Some(v) if v.name() == expected => Ok(()),
            _ => bail!("[Headless] {} {} does not exist.", expected, id),
        }
    }

    fn free(&mut self, id: ResourceId, expected: &'static str) -> Result<()> {
        self.expect(id, expected)?;
        self.resources.remove(&id);
        Ok(())
    }

    fn buffer(&mut self, id: ResourceId) -> Result<(&mut Vec<u8>, bool, &mut bool)> {
        match self.resources.get_mut(&id) {
            Some(Resource::Buffer {
                bytes,
                dynamic,
                mapped,
            }) => Ok((bytes, *dynamic, mapped)),
            _ => bail!("[Headless] Buffer {} does not exist.", id),
        }
    }

    fn query(&mut self, id: ResourceId) -> Result<(QueryKind, &mut QueryStatus)> {
        match self.resources.get_mut(&id) {
            Some(Resource::Query { kind, status }) => Ok((*kind, status)),
            _ => bail!("[Headless] Query {} does not exist.", id),
        }
    }

    fn track_queries(&mut self, cmd: Command) -> Result<()> {
        match cmd {
            Command::BeginQuery { query, .. } => {
                let (_, status) = self.query(query)?;
                *status = QueryStatus::Active;
            }
            Command::EndQuery(kind) => {
                let active = self.resources.values_mut().find_map(|v| match v {
                    Resource::Query { kind: k, status }
                        if *k == kind && *status == QueryStatus::Active =>
                    {
                        Some(status)
                    }
                    _ => None,
                });

                match active {
                    Some(status) => *status = QueryStatus::Pending,
                    None => bail!("[Headless] No {:?} query is active.", kind),
                }
            }
            _ => {}
        }

        Ok(())
    }
}

impl Device for HeadlessDevice {
    fn describe(&self) -> String {
        "Headless (no driver)".into()
    }

    unsafe fn configure_debug_output(&mut self, min: DebugSeverity, _: bool) -> Result<()> {
        self.min_severity = Some(min);
        Ok(())
    }

    fn drain_debug_messages(&mut self) -> Vec<DebugMessage> {
        ::std::mem::replace(&mut self.messages, Vec::new())
    }

    unsafe fn execute(&mut self, cmd: Command) -> Result<()> {
        if self.fail_next {
            self.fail_next = false;
            bail!("[Headless] {:?} failed.", cmd);
        }

        self.track_queries(cmd)?;
        self.commands.push(cmd);
        Ok(())
    }

    unsafe fn create_sampler(&mut self, _: &SamplerParams) -> Result<ResourceId> {
        Ok(self.alloc(Resource::Sampler))
    }

    unsafe fn delete_sampler(&mut self, id: ResourceId) -> Result<()> {
        self.free(id, "Sampler")
    }

    unsafe fn create_shader(
        &mut self,
        _: ShaderKind,
        name: &str,
        source: &str,
    ) -> Result<ResourceId> {
        if source.trim().is_empty() {
            return Err(Error::ShaderCompileFailure(
                name.into(),
                "0:1: error: empty source".into(),
            )
            .into());
        }

        Ok(self.alloc(Resource::Shader))
    }

    unsafe fn delete_shader(&mut self, id: ResourceId) -> Result<()> {
        self.free(id, "Shader")
    }

    unsafe fn create_program(&mut self, shaders: &[ResourceId]) -> Result<ResourceId> {
        for &id in shaders {
            if self.expect(id, "Shader").is_err() {
                return Err(
                    Error::ProgramLinkFailure(format!("shader {} is not attached", id)).into(),
                );
            }
        }

        Ok(self.alloc(Resource::Program))
    }

    unsafe fn delete_program(&mut self, id: ResourceId) -> Result<()> {
        self.free(id, "Program")
    }

    unsafe fn program_binary(&mut self, id: ResourceId) -> Result<(u32, Vec<u8>)> {
        self.expect(id, "Program")?;
        Ok((HEADLESS_BINARY_FORMAT, format!("program {}", id).into_bytes()))
    }

    unsafe fn create_program_from_binary(
        &mut self,
        format: u32,
        bytes: &[u8],
    ) -> Result<ResourceId> {
        if format != HEADLESS_BINARY_FORMAT || bytes.is_empty() {
            return Err(Error::ProgramLinkFailure(format!(
                "binary format {:#x} is not supported",
                format
            ))
            .into());
        }

        Ok(self.alloc(Resource::Program))
    }

    unsafe fn create_vertex_format(&mut self, _: &VertexFormatParams) -> Result<ResourceId> {
        Ok(self.alloc(Resource::VertexFormat))
    }

    unsafe fn delete_vertex_format(&mut self, id: ResourceId) -> Result<()> {
        self.free(id, "VertexFormat")
    }

    unsafe fn create_buffer(
        &mut self,
        params: &BufferParams,
        data: Option<&[u8]>,
    ) -> Result<ResourceId> {
        let bytes = match data {
            Some(v) => v.to_vec(),
            None => vec![0; params.size()],
        };

        Ok(self.alloc(Resource::Buffer {
            bytes,
            dynamic: params.usage.dynamic_update,
            mapped: false,
        }))
    }

    unsafe fn update_buffer(&mut self, id: ResourceId, offset: usize, data: &[u8]) -> Result<()> {
        let (bytes, dynamic, _) = self.buffer(id)?;

        if !dynamic {
            bail!("[Headless] Buffer {} has no dynamic storage.", id);
        }

        match offset.checked_add(data.len()) {
            Some(end) if end <= bytes.len() => {
                bytes[offset..end].copy_from_slice(data);
                Ok(())
            }
            _ => Err(Error::OutOfBounds.into()),
        }
    }

    unsafe fn clear_buffer(&mut self, id: ResourceId) -> Result<()> {
        let (bytes, _, _) = self.buffer(id)?;
        for v in bytes.iter_mut() {
            *v = 0;
        }

        Ok(())
    }

    unsafe fn delete_buffer(&mut self, id: ResourceId) -> Result<()> {
        self.free(id, "Buffer")
    }

    unsafe fn map_buffer(
        &mut self,
        id: ResourceId,
        offset: usize,
        size: usize,
        _: MapAccess,
        _: BufferUsage,
    ) -> Result<*mut u8> {
        let (bytes, _, mapped) = self.buffer(id)?;

        if *mapped {
            bail!("[Headless] Buffer {} is already mapped.", id);
        }

        match offset.checked_add(size) {
            Some(end) if end <= bytes.len() => {
                *mapped = true;
                Ok(bytes[offset..].as_mut_ptr())
            }
            _ => Err(Error::OutOfBounds.into()),
        }
    }

    unsafe fn unmap_buffer(&mut self, id: ResourceId) -> Result<()> {
        let (_, _, mapped) = self.buffer(id)?;

        if !*mapped {
            bail!("[Headless] Buffer {} is not mapped.", id);
        }

        *mapped = false;
        Ok(())
    }

    unsafe fn flush_buffer(&mut self, id: ResourceId, explicit: Option<usize>) -> Result<()> {
        let (_, _, mapped) = self.buffer(id)?;

        if explicit.is_some() && !*mapped {
            bail!("[Headless] Buffer {} is not mapped.", id);
        }

        Ok(())
    }

    unsafe fn receive_buffers(&mut self) -> Result<()> {
        Ok(())
    }

    unsafe fn create_texture(&mut self, _: &TextureParams) -> Result<ResourceId> {
        Ok(self.alloc(Resource::Texture))
    }

    unsafe fn update_texture(
        &mut self,
        id: ResourceId,
        _: &TextureParams,
        _: u32,
        _: u32,
        _: PixelFormat,
        _: PixelType,
        _: &[u8],
    ) -> Result<()> {
        self.expect(id, "Texture")
    }

    unsafe fn generate_mipmaps(&mut self, id: ResourceId) -> Result<()> {
        self.expect(id, "Texture")
    }

    unsafe fn delete_texture(&mut self, id: ResourceId) -> Result<()> {
        self.free(id, "Texture")
    }

    unsafe fn create_renderbuffer(&mut self, _: &RenderbufferParams) -> Result<ResourceId> {
        Ok(self.alloc(Resource::Renderbuffer))
    }

    unsafe fn delete_renderbuffer(&mut self, id: ResourceId) -> Result<()> {
        self.free(id, "Renderbuffer")
    }

    unsafe fn create_framebuffer(
        &mut self,
        attachments: &[(AttachmentPoint, AttachmentTarget)],
    ) -> Result<ResourceId> {
        if attachments.is_empty() {
            return Err(Error::FramebufferInvalid("No images are attached.".into()).into());
        }

        for &(_, target) in attachments {
            match target {
                AttachmentTarget::Texture { id, .. } => self.expect(id, "Texture")?,
                AttachmentTarget::Renderbuffer(id) => self.expect(id, "Renderbuffer")?,
            }
        }

        Ok(self.alloc(Resource::Framebuffer))
    }

    unsafe fn delete_framebuffer(&mut self, id: ResourceId) -> Result<()> {
        self.free(id, "Framebuffer")
    }

    unsafe fn create_query(&mut self, kind: QueryKind) -> Result<ResourceId> {
        Ok(self.alloc(Resource::Query {
            kind,
            status: QueryStatus::Idle,
        }))
    }

    unsafe fn query_result(&mut self, id: ResourceId, wait: bool) -> Result<Option<u64>> {
        let (kind, status) = self.query(id)?;

        match *status {
            QueryStatus::Ready(v) => Ok(Some(v)),
            QueryStatus::Pending if !wait => Ok(None),
            QueryStatus::Pending => bail!(
                "[Headless] {:?} query {} would wait forever, resolve it first.",
                kind,
                id
            ),
            _ => bail!("[Headless] {:?} query {} has not ended.", kind, id),
        }
    }

    unsafe fn delete_query(&mut self, id: ResourceId) -> Result<()> {
        self.free(id, "Query")
    }
}
