//! Owned engine handles.
//!
//! A [`Handle`] is the owned view of one engine resource: it alone may release
//! it, and it does so exactly once, on drop at the latest. Shared and exclusive
//! views are plain `&` and `&mut` borrows of the typed wrappers built on top
//! ([`crate::Run`], [`crate::Timer`]), so the only place a disposed handle can
//! be observed is here, and [`Handle::raw`] refuses to hand it out.

use crate::engine::{Engine, RawHandle, NULL_HANDLE};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A kind of engine resource.
pub trait Resource {
    /// Name used in disposed-handle panics.
    const KIND: &'static str;

    fn release(engine: &dyn Engine, raw: RawHandle);
}

pub struct Handle<R: Resource> {
    raw: RawHandle,
    engine: Arc<dyn Engine>,
    _kind: PhantomData<fn() -> R>,
}

impl<R: Resource> Handle<R> {
    /// Wrap a raw handle without validation. [`NULL_HANDLE`] yields a handle
    /// that is already disposed.
    pub fn from_raw(engine: Arc<dyn Engine>, raw: RawHandle) -> Self {
        Self {
            raw,
            engine,
            _kind: PhantomData,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.raw == NULL_HANDLE
    }

    /// The raw handle, for passing across the engine boundary.
    ///
    /// # Panics
    ///
    /// When the handle is disposed.
    #[track_caller]
    pub fn raw(&self) -> RawHandle {
        if self.is_disposed() {
            panic!("{} is disposed", R::KIND);
        }
        self.raw
    }

    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    /// Release the resource. Later calls do nothing.
    pub fn release(&mut self) {
        let raw = std::mem::replace(&mut self.raw, NULL_HANDLE);
        if raw != NULL_HANDLE {
            R::release(self.engine.as_ref(), raw);
        }
    }

    /// Give up ownership without releasing. The caller becomes responsible for
    /// the returned handle.
    #[track_caller]
    pub fn into_raw(mut self) -> RawHandle {
        let raw = self.raw();
        self.raw = NULL_HANDLE;
        raw
    }

    /// Move ownership out of a place, leaving a disposed handle behind.
    pub fn take(&mut self) -> Self {
        let raw = std::mem::replace(&mut self.raw, NULL_HANDLE);
        Self::from_raw(self.engine.clone(), raw)
    }
}

impl<R: Resource> Drop for Handle<R> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<R: Resource> fmt::Debug for Handle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_disposed() {
            write!(f, "{}(disposed)", R::KIND)
        } else {
            write!(f, "{}({})", R::KIND, self.raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LocalEngine;

    struct Gadget;

    impl Resource for Gadget {
        const KIND: &'static str = "gadget";

        fn release(engine: &dyn Engine, raw: RawHandle) {
            engine.run_drop(raw);
        }
    }

    fn allocate() -> (Arc<dyn Engine>, Handle<Gadget>) {
        let engine: Arc<dyn Engine> = Arc::new(LocalEngine::new());
        let raw = engine.run_new();
        let handle = Handle::from_raw(engine.clone(), raw);
        (engine, handle)
    }

    #[test]
    fn test_release_is_idempotent() {
        let (engine, mut handle) = allocate();
        handle.release();
        assert!(handle.is_disposed());
        assert_eq!(engine.live_handles(), 0);
        handle.release();
        drop(handle);
        assert_eq!(engine.live_handles(), 0);
    }

    #[test]
    fn test_take_leaves_disposed_source() {
        let (engine, mut handle) = allocate();
        let moved = handle.take();
        assert!(handle.is_disposed());
        assert!(!moved.is_disposed());
        drop(handle);
        assert_eq!(engine.live_handles(), 1);
        drop(moved);
        assert_eq!(engine.live_handles(), 0);
    }

    #[test]
    #[should_panic(expected = "gadget is disposed")]
    fn test_raw_on_disposed_panics() {
        let (_engine, mut handle) = allocate();
        handle.release();
        handle.raw();
    }

    #[test]
    fn test_null_handle_is_disposed() {
        let engine: Arc<dyn Engine> = Arc::new(LocalEngine::new());
        let handle: Handle<Gadget> = Handle::from_raw(engine, NULL_HANDLE);
        assert!(handle.is_disposed());
        assert_eq!(format!("{handle:?}"), "gadget(disposed)");
    }

    #[test]
    fn test_into_raw_skips_release() {
        let (engine, handle) = allocate();
        let raw = handle.into_raw();
        assert_eq!(engine.live_handles(), 1);
        engine.run_drop(raw);
    }
}
