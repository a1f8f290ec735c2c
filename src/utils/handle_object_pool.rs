use std::borrow::Borrow;

use super::handle::Handle;
use super::handle_pool::HandlePool;

/// A named object collections. Every time u create or free a handle, a
/// attached instance `T` will be created/ freed.
#[derive(Debug)]
pub struct HandleObjectPool<T: Sized> {
    handles: HandlePool,
    entries: Vec<Option<T>>,
}

impl<T: Sized> Default for HandleObjectPool<T> {
    fn default() -> Self {
        HandleObjectPool::new()
    }
}

impl<T: Sized> HandleObjectPool<T> {
    /// Constructs a new, empty `HandleObjectPool`.
    pub fn new() -> Self {
        HandleObjectPool {
            handles: HandlePool::new(),
            entries: Vec::new(),
        }
    }

    /// Creates a `T` and named it with `Handle`.
    pub fn create(&mut self, value: T) -> Handle {
        let handle = self.handles.create();

        if handle.index() >= self.entries.len() as u32 {
            self.entries.push(Some(value));
        } else {
            self.entries[handle.index() as usize] = Some(value);
        }

        handle
    }

    /// Returns immutable reference to internal value with name `Handle`.
    #[inline]
    pub fn get<H>(&self, handle: H) -> Option<&T>
    where
        H: Borrow<Handle>,
    {
        let handle = handle.borrow();
        if self.handles.is_alive(handle) {
            self.entries[handle.index() as usize].as_ref()
        } else {
            None
        }
    }

    /// Returns mutable reference to internal value with name `Handle`.
    #[inline]
    pub fn get_mut<H>(&mut self, handle: H) -> Option<&mut T>
    where
        H: Borrow<Handle>,
    {
        let handle = handle.borrow();
        if self.handles.is_alive(handle) {
            self.entries[handle.index() as usize].as_mut()
        } else {
            None
        }
    }

    /// Returns true if this `Handle` was created by `HandleObjectPool`, and has
    /// not been freed yet.
    #[inline]
    pub fn is_alive<H>(&self, handle: H) -> bool
    where
        H: Borrow<Handle>,
    {
        self.handles.is_alive(handle)
    }

    /// Recycles the value with name `Handle`.
    #[inline]
    pub fn free<H>(&mut self, handle: H) -> Option<T>
    where
        H: Borrow<Handle>,
    {
        let handle = handle.borrow();
        if self.handles.free(handle) {
            self.entries[handle.index() as usize].take()
        } else {
            None
        }
    }

    /// Removes every object, handing each one to `f`.
    pub fn drain<F>(&mut self, mut f: F)
    where
        F: FnMut(T),
    {
        let handles: Vec<_> = self.handles.iter().collect();
        for handle in handles {
            if let Some(v) = self.free(handle) {
                f(v);
            }
        }
    }

    /// Returns the total number of alive handle in this `HandleObjectPool`.
    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basic() {
        let mut set = HandleObjectPool::<i32>::new();

        let e1 = set.create(3);
        assert_eq!(set.get(e1), Some(&3));
        assert_eq!(set.len(), 1);
        assert_eq!(set.free(e1), Some(3));
        assert_eq!(set.len(), 0);
        assert_eq!(set.get(e1), None);
        assert_eq!(set.free(e1), None);
        assert_eq!(set.len(), 0);

        let e2 = set.create(4);
        if let Some(v) = set.get_mut(e2) {
            *v += 1;
        }
        assert_eq!(set.get(e2), Some(&5));
        assert_eq!(set.get_mut(e1), None);
    }

    #[test]
    fn stale_handle() {
        let mut set = HandleObjectPool::<&'static str>::new();

        let old = set.create("old");
        set.free(old);
        let new = set.create("new");

        assert_eq!(old.index(), new.index());
        assert_eq!(set.get(old), None);
        assert_eq!(set.get(new), Some(&"new"));
    }

    #[test]
    fn drain() {
        let mut set = HandleObjectPool::<u32>::new();
        for i in 0..4 {
            set.create(i);
        }

        let mut drained = Vec::new();
        set.drain(|v| drained.push(v));
        drained.sort();

        assert_eq!(drained, vec![0, 1, 2, 3]);
        assert!(set.is_empty());
    }
}
