//! Per-render state and the composition root
//!
//! A render calls the verbs through [`VariablesEngine`]. `#save` collects
//! variables into a [`SetCollection`] kept in the host's side channel for
//! the duration of the render; [`VariablesEngine::flush`] persists it once
//! the render is done.

mod engine;


pub use engine::{FlushOutcome, VariablesEngine};

use crate::set::SetCollection;
use std::collections::HashMap;

/// Render-scoped key/value state owned by the host
pub trait SideChannel {
    fn get(&self, key: &str) -> Option<&SetCollection>;

    fn get_mut(&mut self, key: &str) -> Option<&mut SetCollection>;

    fn put(&mut self, key: &str, collection: SetCollection);

    fn take(&mut self, key: &str) -> Option<SetCollection>;
}

/// Plain map side channel for hosts without one of their own
#[derive(Debug, Default, Clone)]
pub struct RenderStash {
    entries: HashMap<String, SetCollection>,
}

impl RenderStash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SideChannel for RenderStash {
    fn get(&self, key: &str) -> Option<&SetCollection> {
        self.entries.get(key)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut SetCollection> {
        self.entries.get_mut(key)
    }

    fn put(&mut self, key: &str, collection: SetCollection) {
        self.entries.insert(key.to_string(), collection);
    }

    fn take(&mut self, key: &str) -> Option<SetCollection> {
        self.entries.remove(key)
    }
}
