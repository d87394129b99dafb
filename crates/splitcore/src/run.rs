use crate::engine::{Engine, RawHandle, RunInfo};
use crate::handle::{Handle, Resource};
use std::sync::Arc;

pub struct RunResource;

impl Resource for RunResource {
    const KIND: &'static str = "run";

    fn release(engine: &dyn Engine, raw: RawHandle) {
        engine.run_drop(raw);
    }
}

/// An owned run: the segment list and its recorded history.
#[derive(Debug)]
pub struct Run {
    handle: Handle<RunResource>,
}

impl Run {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        let raw = engine.run_new();
        Self::from_raw(engine, raw)
    }

    pub fn with_segments<I, S>(engine: Arc<dyn Engine>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut run = Self::new(engine);
        for name in names {
            run.push_segment(name.as_ref());
        }
        run
    }

    pub fn from_raw(engine: Arc<dyn Engine>, raw: RawHandle) -> Self {
        Self {
            handle: Handle::from_raw(engine, raw),
        }
    }

    pub fn handle(&self) -> &Handle<RunResource> {
        &self.handle
    }

    /// Hand ownership to the engine, e.g. after it consumed the run.
    pub(crate) fn into_raw(self) -> RawHandle {
        self.handle.into_raw()
    }

    pub fn push_segment(&mut self, name: &str) {
        self.handle.engine().run_push_segment(self.handle.raw(), name);
    }

    pub fn set_game_name(&mut self, name: &str) {
        self.handle.engine().run_set_game_name(self.handle.raw(), name);
    }

    pub fn set_category_name(&mut self, name: &str) {
        self.handle
            .engine()
            .run_set_category_name(self.handle.raw(), name);
    }

    /// False when a comparison with that name already exists.
    pub fn add_custom_comparison(&mut self, name: &str) -> bool {
        self.handle
            .engine()
            .run_add_custom_comparison(self.handle.raw(), name)
    }

    pub fn info(&self) -> RunInfo {
        self.handle.engine().run_info(self.handle.raw())
    }

    pub fn segment_count(&self) -> usize {
        self.info().segments.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_disposed()
    }

    pub fn release(&mut self) {
        self.handle.release();
    }
}

impl Clone for Run {
    fn clone(&self) -> Self {
        let engine = self.handle.engine().clone();
        let raw = engine.run_clone(self.handle.raw());
        Self::from_raw(engine, raw)
    }
}
