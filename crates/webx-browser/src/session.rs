//! State owned by one navigation.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tokio::task::JoinSet;
use webx_audio::{AudioBackend, AudioCache};

use crate::sandbox::{ContextRegistry, SharedAudio, SharedRegistry};
use crate::surface::SurfaceHandle;

/// Surface, context registry, audio cache and script tasks of the current
/// page. A new navigation tears the old session down and starts a fresh
/// one under the next generation number.
pub struct Session {
    surface: SurfaceHandle,
    registry: SharedRegistry,
    audio: SharedAudio,
    tasks: JoinSet<()>,
}

impl Session {
    /// Claim the next generation and create empty page state for it.
    pub(crate) fn start(live: &Rc<Cell<u64>>, backend: Box<dyn AudioBackend>) -> Self {
        let generation = live.get() + 1;
        live.set(generation);
        log::debug!("session generation {generation}");
        Self {
            surface: SurfaceHandle::new(generation, Rc::clone(live)),
            registry: Rc::new(RefCell::new(ContextRegistry::new())),
            audio: Rc::new(RefCell::new(AudioCache::new(backend))),
            tasks: JoinSet::new(),
        }
    }

    pub fn surface(&self) -> &SurfaceHandle {
        &self.surface
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn audio(&self) -> &SharedAudio {
        &self.audio
    }

    pub(crate) fn tasks_mut(&mut self) -> &mut JoinSet<()> {
        &mut self.tasks
    }

    /// Number of script tasks not yet finished.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Abort outstanding scripts and drop page state.
    pub(crate) fn teardown(&mut self) {
        self.tasks.abort_all();
        self.registry.borrow_mut().clear();
        self.audio.borrow_mut().clear();
    }

    /// Wait for every script task of this session to finish.
    pub async fn settle(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined
                && e.is_panic()
            {
                log::error!("script task panicked: {e}");
            }
        }
    }
}
