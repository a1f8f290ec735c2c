//! Buffers are plain memory blocks on the GPU side.

use crate::video::errors::{Error, Result};

impl_handle!(BufferHandle);

/// The main purpose of a buffer. `Context::bind_buffer` binds it to the
/// matching target, but it can always be bound for other purposes as well.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BufferKind {
    Vertex,
    Index,
    ShaderStorage,
    Texture,
    Uniform,
    AtomicCounter,
    DispatchIndirect,
    DrawIndirect,
    TransformFeedback,
}

impl BufferKind {
    pub const VARIANTS: [BufferKind; 9] = [
        BufferKind::Vertex,
        BufferKind::Index,
        BufferKind::ShaderStorage,
        BufferKind::Texture,
        BufferKind::Uniform,
        BufferKind::AtomicCounter,
        BufferKind::DispatchIndirect,
        BufferKind::DrawIndirect,
        BufferKind::TransformFeedback,
    ];
}

/// Storage flags fixed at creation time.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct BufferUsage {
    /// Allows sub-data updates after creation.
    pub dynamic_update: bool,
    pub map_read: bool,
    pub map_write: bool,
    /// The buffer may stay mapped while the GPU uses it.
    pub map_persistent: bool,
    pub map_coherent: bool,
}

impl BufferUsage {
    pub fn dynamic() -> Self {
        BufferUsage {
            dynamic_update: true,
            ..Default::default()
        }
    }

    /// Readable and writable mapping that stays valid while the GPU works
    /// with the buffer.
    pub fn persistent(coherent: bool) -> Self {
        BufferUsage {
            map_read: true,
            map_write: true,
            map_persistent: true,
            map_coherent: coherent,
            ..Default::default()
        }
    }
}

/// CPU access requested when mapping a buffer.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct MapAccess {
    pub read: bool,
    pub write: bool,
    /// The mapping stays valid during draws. CPU writes become visible with
    /// `flush_buffer`, GPU writes with `receive_buffer`.
    pub persistent: bool,
    /// Discards the previous contents of the mapped range.
    pub invalidate: bool,
    /// Maps without waiting for pending GPU operations on the buffer.
    pub unsynchronized: bool,
}

impl MapAccess {
    pub fn read() -> Self {
        MapAccess {
            read: true,
            ..Default::default()
        }
    }

    pub fn write() -> Self {
        MapAccess {
            write: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct BufferParams {
    pub kind: BufferKind,
    pub element_size: u32,
    pub elements: u32,
    pub usage: BufferUsage,
}

impl BufferParams {
    pub fn new(kind: BufferKind, element_size: u32, elements: u32) -> Self {
        BufferParams {
            kind,
            element_size,
            elements,
            usage: BufferUsage::default(),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.element_size as usize * self.elements as usize
    }

    pub fn validate(&self, data: Option<&[u8]>) -> Result<()> {
        if self.size() == 0 {
            return Err(Error::BufferInvalid("Buffer can not be empty.".into()));
        }

        if self.usage.map_coherent && !self.usage.map_persistent {
            return Err(Error::BufferInvalid(
                "Coherent mapping requires persistent mapping.".into(),
            ));
        }

        if self.usage.map_persistent && !(self.usage.map_read || self.usage.map_write) {
            return Err(Error::BufferInvalid(
                "Persistent mapping requires read or write access.".into(),
            ));
        }

        if let Some(bytes) = data {
            if bytes.len() != self.size() {
                return Err(Error::BufferInvalid(format!(
                    "Initial data has {} bytes, expected {}.",
                    bytes.len(),
                    self.size()
                )));
            }
        }

        Ok(())
    }

    /// Resolves the byte range `offset..offset + size` and returns its size.
    /// A `size` of `None` covers everything behind `offset`.
    pub fn range(&self, offset: usize, size: Option<usize>) -> Result<usize> {
        if offset >= self.size() {
            return Err(Error::OutOfBounds);
        }

        let size = size.unwrap_or_else(|| self.size() - offset);
        match offset.checked_add(size) {
            Some(end) if size > 0 && end <= self.size() => Ok(size),
            _ => Err(Error::OutOfBounds),
        }
    }

    /// Checks `access` against the storage flags fixed at creation.
    pub fn validate_mapping(&self, access: MapAccess) -> Result<()> {
        let reason = if !access.read && !access.write {
            "Mapping requires read or write access."
        } else if access.read && !self.usage.map_read {
            "Buffer was created without map_read."
        } else if access.write && !self.usage.map_write {
            "Buffer was created without map_write."
        } else if access.persistent && !self.usage.map_persistent {
            "Buffer was created without map_persistent."
        } else if access.invalidate && access.read {
            "Invalidated ranges can not be read."
        } else {
            return Ok(());
        };

        Err(Error::MappingInvalid(reason.into()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validate() {
        let mut params = BufferParams::new(BufferKind::Vertex, 12, 3);
        assert_eq!(params.size(), 36);
        assert!(params.validate(None).is_ok());
        assert!(params.validate(Some(&[0; 36])).is_ok());
        assert!(params.validate(Some(&[0; 35])).is_err());

        params.usage.map_coherent = true;
        assert!(params.validate(None).is_err());

        params.usage.map_persistent = true;
        params.usage.map_write = true;
        assert!(params.validate(None).is_ok());

        assert!(BufferParams::new(BufferKind::Uniform, 16, 0)
            .validate(None)
            .is_err());
    }

    #[test]
    fn range() {
        let params = BufferParams::new(BufferKind::Uniform, 16, 4);
        assert_eq!(params.range(16, None).unwrap(), 48);
        assert_eq!(params.range(0, Some(64)).unwrap(), 64);
        assert!(params.range(64, None).is_err());
        assert!(params.range(32, Some(64)).is_err());
        assert!(params.range(0, Some(0)).is_err());

        match params.range(16, Some(usize::MAX)) {
            Err(Error::OutOfBounds) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn mapping() {
        let mut params = BufferParams::new(BufferKind::ShaderStorage, 4, 4);
        assert!(params.validate_mapping(MapAccess::read()).is_err());

        params.usage = BufferUsage::persistent(false);
        assert!(params.validate_mapping(MapAccess::read()).is_ok());
        assert!(params.validate_mapping(MapAccess::default()).is_err());

        let access = MapAccess {
            invalidate: true,
            ..MapAccess::read()
        };
        assert!(params.validate_mapping(access).is_err());

        params.usage.map_persistent = false;
        params.usage.map_coherent = false;
        let access = MapAccess {
            persistent: true,
            ..MapAccess::write()
        };
        assert!(params.validate_mapping(access).is_err());
    }
}
