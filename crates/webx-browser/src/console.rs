//! Interactive console bridge.
//!
//! Lets an operator run extra code inside any registered context. In
//! headless sessions there is no console and every operation is a no-op.

use std::cell::RefCell;
use std::rc::Rc;

use crate::log::LogSink;
use crate::sandbox::registry::{ContextRegistry, SharedRegistry};

/// The operator-facing context selector.
pub trait ConsoleView {
    fn set_contexts(&mut self, listing: &[String]);
}

/// Result of a console injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectOutcome {
    Executed,
    Failed,
    NoContext,
    Headless,
}

#[derive(Clone, Default)]
pub struct ConsoleBridge {
    view: Option<Rc<RefCell<dyn ConsoleView>>>,
}

impl ConsoleBridge {
    pub fn headless() -> Self {
        Self::default()
    }

    pub fn attached(view: Rc<RefCell<dyn ConsoleView>>) -> Self {
        Self { view: Some(view) }
    }

    pub fn is_attached(&self) -> bool {
        self.view.is_some()
    }

    /// Push the current registry listing to the view.
    pub fn refresh(&self, registry: &ContextRegistry) {
        if let Some(view) = &self.view {
            view.borrow_mut().set_contexts(&registry.listing());
        }
    }

    /// Run `code` in context `index`. Failures are logged, never raised.
    pub async fn inject(
        &self,
        registry: &SharedRegistry,
        index: usize,
        code: &str,
        log: &LogSink,
    ) -> InjectOutcome {
        if self.view.is_none() {
            return InjectOutcome::Headless;
        }
        let engine = registry.borrow().engine(index);
        let Some(engine) = engine else {
            log.error(format!("No script context at index {index}"));
            return InjectOutcome::NoContext;
        };
        match engine.execute(code).await {
            Ok(()) => InjectOutcome::Executed,
            Err(e) => {
                log.error(e.to_string());
                InjectOutcome::Failed
            },
        }
    }
}
