use std::borrow::Borrow;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::handle::{Handle, HandleIndex};

/// `HandlePool` manages the manipulations of a `Handle` collection, which are
/// created with a continuous `index` field. It also have the ability to find
/// out the current status of a specified `Handle`.
///
/// A slot is alive while its version is odd. Freeing bumps the version to an
/// even number, and the next `create` on that slot bumps it again.
#[derive(Debug, Default)]
pub struct HandlePool {
    versions: Vec<HandleIndex>,
    frees: BinaryHeap<Reverse<HandleIndex>>,
}

impl HandlePool {
    /// Constructs a new, empty `HandlePool`.
    pub fn new() -> HandlePool {
        HandlePool {
            versions: Vec::new(),
            frees: BinaryHeap::new(),
        }
    }

    /// Creates a unused `Handle`. Freed indices are reused lowest first.
    pub fn create(&mut self) -> Handle {
        if let Some(Reverse(index)) = self.frees.pop() {
            let index = index as usize;
            self.versions[index] += 1;
            Handle::new(index as HandleIndex, self.versions[index])
        } else {
            self.versions.push(1);
            Handle::new(self.versions.len() as HandleIndex - 1, 1)
        }
    }

    /// Returns true if this `Handle` was created by `HandlePool`, and has not been
    /// freed yet.
    pub fn is_alive<T>(&self, handle: T) -> bool
    where
        T: Borrow<Handle>,
    {
        let handle = handle.borrow();
        let index = handle.index() as usize;
        self.is_alive_at(index) && (self.versions[index] == handle.version())
    }

    #[inline]
    fn is_alive_at(&self, index: usize) -> bool {
        (index < self.versions.len()) && ((self.versions[index] & 0x1) == 1)
    }

    /// Recycles the `Handle` index, and mark its version as dead.
    pub fn free<T>(&mut self, handle: T) -> bool
    where
        T: Borrow<Handle>,
    {
        let handle = handle.borrow();
        if !self.is_alive(handle) {
            false
        } else {
            self.versions[handle.index() as usize] += 1;
            self.frees.push(Reverse(handle.index()));
            true
        }
    }

    /// Returns the total number of alive handle in this `HandlePool`.
    #[inline]
    pub fn len(&self) -> usize {
        self.versions.len() - self.frees.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over the alive handles.
    pub fn iter(&self) -> impl Iterator<Item = Handle> + '_ {
        self.versions
            .iter()
            .enumerate()
            .filter(|&(_, v)| v & 0x1 == 1)
            .map(|(i, v)| Handle::new(i as HandleIndex, *v))
    }
}
