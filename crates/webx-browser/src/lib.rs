//! WebX page pipeline: address resolution, page assembly and script
//! sandboxing.
//!
//! A navigation resolves the operator's address, fetches and builds the
//! page, assembles markup, theme and styles onto a fresh rendering surface,
//! then starts one task per declared script. [`Browser`] drives the whole
//! flow and owns the per-navigation [`Session`]. It must be driven from
//! inside a `tokio::task::LocalSet`: script contexts are `!Send`.

pub mod address;
pub mod assemble;
pub mod collab;
pub mod console;
pub mod fetch;
pub mod headless;
pub mod log;
pub mod nav;
pub mod page;
pub mod sandbox;
pub mod session;
pub mod surface;
pub mod theme;

#[cfg(test)]
pub(crate) mod test_utils;

// -----------------------------------------------------------------------
// Public re-exports
// -----------------------------------------------------------------------

pub use address::{AddressResolver, ResolvedTarget};
pub use assemble::{AssemblyReport, PageAssembler};
pub use collab::{Collaborators, MarkupBuilder, MarkupParser, StyleBuilder, StyleParser};
pub use console::{ConsoleBridge, ConsoleView, InjectOutcome};
pub use fetch::ResourceFetcher;
pub use crate::log::{LogLevel, LogLine, LogSink};
pub use nav::History;
pub use page::{Dialect, PageBundle, ScriptDescriptor};
pub use sandbox::{EngineFactory, EngineSet, HostFunction, HostOptions, HostValue, ScriptEngine};
pub use session::Session;
pub use surface::{Surface, SurfaceHandle};

// -----------------------------------------------------------------------
// Imports
// -----------------------------------------------------------------------

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use webx_audio::{AudioBackend, NullAudioBackend};
use webx_net::Transport;
use webx_types::{BrowserConfig, Result, WebxError};

use sandbox::{PageScope, ScriptSandbox};

// -----------------------------------------------------------------------
// NavigationReport
// -----------------------------------------------------------------------

/// Summary of one completed navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationReport {
    pub target: ResolvedTarget,
    pub styles: AssemblyReport,
    /// Script tasks started. Each may still fail on its own.
    pub scripts_spawned: usize,
}

type AudioBackendFactory = Box<dyn Fn() -> Box<dyn AudioBackend>>;

// -----------------------------------------------------------------------
// Browser
// -----------------------------------------------------------------------

/// Navigation controller.
pub struct Browser {
    config: BrowserConfig,
    transport: Rc<dyn Transport>,
    collaborators: Collaborators,
    engines: EngineSet,
    log: LogSink,
    console_view: Option<Rc<RefCell<dyn ConsoleView>>>,
    /// Bridge for the current session, rebuilt from the config each load.
    console: ConsoleBridge,
    audio_backend: AudioBackendFactory,
    live_generation: Rc<Cell<u64>>,
    session: Session,
    history: History,
}

impl Browser {
    pub fn new(
        config: BrowserConfig,
        transport: Rc<dyn Transport>,
        collaborators: Collaborators,
        engines: EngineSet,
    ) -> Self {
        let audio_backend: AudioBackendFactory =
            Box::new(|| Box::new(NullAudioBackend) as Box<dyn AudioBackend>);
        let live_generation = Rc::new(Cell::new(0));
        let session = Session::start(&live_generation, audio_backend());
        Self {
            config,
            transport,
            collaborators,
            engines,
            log: LogSink::new(),
            console_view: None,
            console: ConsoleBridge::headless(),
            audio_backend,
            live_generation,
            session,
            history: History::new(),
        }
    }

    /// Attach an interactive console. Sessions started while the
    /// configuration disables the console run headless.
    pub fn with_console(mut self, view: Rc<RefCell<dyn ConsoleView>>) -> Self {
        self.console_view = Some(view);
        self.console = self.session_console(&self.config);
        self
    }

    /// Use a real audio output for future sessions.
    pub fn with_audio_backend(
        mut self,
        factory: impl Fn() -> Box<dyn AudioBackend> + 'static,
    ) -> Self {
        self.audio_backend = Box::new(factory);
        self
    }

    pub fn with_log(mut self, log: LogSink) -> Self {
        self.log = log;
        self
    }

    // -- Accessors --------------------------------------------------------

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Replace the configuration. Takes effect at the next navigation.
    pub fn set_config(&mut self, config: BrowserConfig) {
        self.config = config;
    }

    pub fn log(&self) -> &LogSink {
        &self.log
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn surface(&self) -> &SurfaceHandle {
        self.session.surface()
    }

    pub fn registry_len(&self) -> usize {
        self.session.registry().borrow().len()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn current_address(&self) -> Option<&str> {
        self.history.current()
    }

    // -- Navigation -------------------------------------------------------

    /// Navigate to `address` and record it in history.
    pub async fn navigate(&mut self, address: &str) -> Result<NavigationReport> {
        self.history.push(address);
        self.load(address).await
    }

    /// Load the current history entry again.
    pub async fn reload(&mut self) -> Result<Option<NavigationReport>> {
        let Some(address) = self.history.current().map(str::to_string) else {
            return Ok(None);
        };
        self.load(&address).await.map(Some)
    }

    pub async fn go_back(&mut self) -> Result<Option<NavigationReport>> {
        let Some(address) = self.history.go_back() else {
            return Ok(None);
        };
        self.load(&address).await.map(Some)
    }

    pub async fn go_forward(&mut self) -> Result<Option<NavigationReport>> {
        let Some(address) = self.history.go_forward() else {
            return Ok(None);
        };
        self.load(&address).await.map(Some)
    }

    /// Deliver a click on an anchor. Returns `Ok(false)` when the surface's
    /// interceptor does not claim the target.
    pub async fn click_link(&mut self, href: &str) -> Result<bool> {
        let target = self.session.surface().read(|s| s.intercept_click(href));
        match target {
            Some(address) => self.navigate(&address).await.map(|_| true),
            None => Ok(false),
        }
    }

    /// Run `code` in the context registered at `index`.
    pub async fn console_inject(&self, index: usize, code: &str) -> InjectOutcome {
        self.console
            .inject(self.session.registry(), index, code, &self.log)
            .await
    }

    /// Wait for every script of the current page to finish.
    pub async fn settle(&mut self) {
        self.session.settle().await;
    }

    fn session_console(&self, config: &BrowserConfig) -> ConsoleBridge {
        match &self.console_view {
            Some(view) if config.console => ConsoleBridge::attached(Rc::clone(view)),
            Some(_) => {
                ::log::debug!("console disabled by configuration");
                ConsoleBridge::headless()
            },
            None => ConsoleBridge::headless(),
        }
    }

    fn begin_session(&mut self) {
        self.session.teardown();
        self.session = Session::start(&self.live_generation, (self.audio_backend)());
    }

    fn fail(&self, err: WebxError) -> WebxError {
        self.log.error(err.to_string());
        err
    }

    async fn load(&mut self, address: &str) -> Result<NavigationReport> {
        let config = self.config.clone();
        self.begin_session();
        self.console = self.session_console(&config);
        ::log::info!("navigating to {address}");

        let resolver = AddressResolver::new(&config.naming_service).map_err(|e| self.fail(e))?;
        let target = resolver
            .resolve(&*self.transport, address)
            .await
            .map_err(|e| self.fail(e))?;

        let fetcher = ResourceFetcher::new(Rc::clone(&self.transport), self.log.clone());
        let page = fetcher
            .fetch(&target.base, "")
            .await
            .map_err(|e| self.fail(e))?;
        let bundle = self
            .collaborators
            .build_page(&page, &target.base)
            .map_err(|e| self.fail(e))?;

        let surface = self.session.surface().clone();
        let assembler =
            PageAssembler::new(fetcher.clone(), self.collaborators.clone(), self.log.clone());
        let styles = assembler
            .assemble(
                &surface,
                &target.base,
                &bundle.markup,
                &bundle.styles,
                config.alternate_theme,
            )
            .await;

        let scope = PageScope {
            base: target.base.clone(),
            options: HostOptions {
                query: target.query.clone(),
                bussinga: config.alternate_theme,
                proxy: config.proxy,
            },
            surface,
            registry: Rc::clone(self.session.registry()),
            audio: Rc::clone(self.session.audio()),
        };
        self.console.refresh(&scope.registry.borrow());
        let sandbox = ScriptSandbox::new(
            fetcher,
            self.engines.clone(),
            self.log.clone(),
            self.console.clone(),
        );
        let scripts_spawned = sandbox.spawn_all(bundle.scripts, &scope, self.session.tasks_mut());

        Ok(NavigationReport {
            target,
            styles,
            scripts_spawned,
        })
    }
}
