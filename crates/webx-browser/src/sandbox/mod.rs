//! Script sandbox orchestration.
//!
//! Every script a page declares gets its own task on the navigation's task
//! set. A task fetches the code, picks the dialect engine, rewrites legacy
//! source, injects host capabilities, registers the context and runs it.
//! Tasks are independent: none waits for another and a failure in one is
//! logged and contained.

pub mod capabilities;
pub mod engine;
pub mod legacy;
pub mod registry;

use std::rc::Rc;

use tokio::task::JoinSet;

pub use capabilities::SharedAudio;
pub use engine::{EngineFactory, EngineSet, HostFunction, HostOptions, HostValue, ScriptEngine};
pub use registry::{ContextEntry, ContextRegistry, SharedRegistry};

use webx_types::WebxError;

use crate::console::ConsoleBridge;
use crate::fetch::ResourceFetcher;
use crate::log::LogSink;
use crate::page::{Dialect, ScriptDescriptor};
use crate::surface::SurfaceHandle;

/// Page-level state every script task of one navigation shares.
#[derive(Clone)]
pub struct PageScope {
    pub base: String,
    pub options: HostOptions,
    pub surface: SurfaceHandle,
    pub registry: SharedRegistry,
    pub audio: SharedAudio,
}

#[derive(Clone)]
pub struct ScriptSandbox {
    fetcher: ResourceFetcher,
    engines: EngineSet,
    log: LogSink,
    console: ConsoleBridge,
}

impl ScriptSandbox {
    pub fn new(
        fetcher: ResourceFetcher,
        engines: EngineSet,
        log: LogSink,
        console: ConsoleBridge,
    ) -> Self {
        Self {
            fetcher,
            engines,
            log,
            console,
        }
    }

    /// Spawn one task per descriptor onto `tasks`. Must be called from
    /// within a `LocalSet`. Returns the number of tasks spawned.
    pub fn spawn_all(
        &self,
        scripts: Vec<ScriptDescriptor>,
        scope: &PageScope,
        tasks: &mut JoinSet<()>,
    ) -> usize {
        let count = scripts.len();
        for descriptor in scripts {
            let sandbox = self.clone();
            let scope = scope.clone();
            tasks.spawn_local(async move {
                sandbox.run(descriptor, &scope).await;
            });
        }
        count
    }

    /// Bring up and run one script context. Returns its registry index, or
    /// `None` when the descriptor produced no context.
    pub async fn run(&self, mut descriptor: ScriptDescriptor, scope: &PageScope) -> Option<usize> {
        let Some(dialect) = descriptor.dialect() else {
            let err = WebxError::UnknownDialect {
                version: descriptor.version,
                script: descriptor.source,
            };
            self.log.error(err.to_string());
            return None;
        };

        let code = match self.fetcher.fetch(&scope.base, &descriptor.source).await {
            Ok(code) => code,
            Err(e) => {
                self.log.error(e.to_string());
                return None;
            },
        };
        descriptor.code = Some(match dialect {
            Dialect::Legacy => legacy::rewrite(&code),
            Dialect::V2 => code,
        });

        if !scope.surface.is_live() {
            log::debug!("page replaced before {} started", descriptor.source);
            return None;
        }

        let factory = self.engines.factory(dialect);
        let engine = match factory
            .create(scope.surface.clone(), scope.options.clone(), self.log.clone())
            .await
        {
            Ok(engine) => engine,
            Err(e) => {
                self.log.error(e.to_string());
                return None;
            },
        };
        capabilities::inject_audio(&*engine, &scope.surface, &scope.audio);
        capabilities::inject_audio_ui(&*engine, &scope.surface);

        if !scope.surface.is_live() {
            return None;
        }
        let index = scope.registry.borrow_mut().register(ContextEntry {
            engine: Rc::clone(&engine),
            dialect,
            version: descriptor.version.clone(),
            source: descriptor.source.clone(),
        });
        self.console.refresh(&scope.registry.borrow());
        log::debug!("context {index} ({}) for {}", descriptor.version, descriptor.source);

        let code = descriptor.code.unwrap_or_default();
        if let Err(e) = engine.execute(&code).await {
            self.log.error(e.to_string());
        }
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use tokio::task::LocalSet;
    use webx_audio::AudioCache;

    use crate::log::LogLevel;
    use crate::test_utils::{FakeFactory, MockTransport, RecordingConsole};

    const BASE: &str = "https://site.test/";

    struct Fixture {
        transport: Rc<MockTransport>,
        legacy: Rc<FakeFactory>,
        v2: Rc<FakeFactory>,
        log: LogSink,
        console: Rc<RefCell<RecordingConsole>>,
        scope: PageScope,
    }

    impl Fixture {
        fn new() -> Self {
            let surface = SurfaceHandle::standalone();
            Self {
                transport: MockTransport::new(),
                legacy: FakeFactory::new("legacy"),
                v2: FakeFactory::new("v2"),
                log: LogSink::new(),
                console: RecordingConsole::new(),
                scope: PageScope {
                    base: BASE.to_string(),
                    options: HostOptions {
                        query: "q=1".into(),
                        bussinga: false,
                        proxy: true,
                    },
                    surface,
                    registry: Rc::new(RefCell::new(ContextRegistry::new())),
                    audio: Rc::new(RefCell::new(AudioCache::default())),
                },
            }
        }

        fn sandbox(&self) -> ScriptSandbox {
            let fetcher = ResourceFetcher::new(
                Rc::clone(&self.transport) as Rc<dyn webx_net::Transport>,
                self.log.clone(),
            );
            let engines = EngineSet {
                legacy: Rc::clone(&self.legacy) as Rc<dyn EngineFactory>,
                v2: Rc::clone(&self.v2) as Rc<dyn EngineFactory>,
            };
            let console = ConsoleBridge::attached(
                Rc::clone(&self.console) as Rc<RefCell<dyn crate::console::ConsoleView>>
            );
            ScriptSandbox::new(fetcher, engines, self.log.clone(), console)
        }
    }

    #[tokio::test]
    async fn unknown_dialect_logs_once_and_registers_nothing() {
        let fx = Fixture::new();
        fx.transport.route("https://site.test/a.lua", "print(1)");
        let index = fx
            .sandbox()
            .run(ScriptDescriptor::new("a.lua", "v3"), &fx.scope)
            .await;
        assert_eq!(index, None);
        assert_eq!(fx.log.count(LogLevel::Error), 1);
        assert!(fx.log.contains("Unknown version: v3 for: a.lua"));
        assert!(fx.scope.registry.borrow().is_empty());
        assert!(fx.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn legacy_source_is_rewritten() {
        let fx = Fixture::new();
        fx.transport
            .route("https://site.test/a.lua", "b.on_click(function() end)");
        let index = fx
            .sandbox()
            .run(ScriptDescriptor::new("a.lua", "legacy"), &fx.scope)
            .await;
        assert_eq!(index, Some(0));
        let engine = fx.legacy.created(0);
        assert_eq!(engine.executed(), vec!["b.on_click(async(function() end))".to_string()]);
        assert!(fx.v2.created_count() == 0);
    }

    #[tokio::test]
    async fn v2_gets_options_and_capabilities() {
        let fx = Fixture::new();
        fx.transport.route("https://site.test/b.lua", "print(2)");
        fx.sandbox()
            .run(ScriptDescriptor::new("b.lua", "2"), &fx.scope)
            .await;
        let engine = fx.v2.created(0);
        assert_eq!(engine.executed(), vec!["print(2)".to_string()]);
        assert_eq!(engine.options().query, "q=1");
        assert!(engine.options().proxy);
        let mut names = engine.registered();
        names.sort();
        assert_eq!(names, vec!["create_audio_player", "pause_audio", "play_audio", "stop_audio"]);
        assert_eq!(fx.console.borrow().last(), Some(vec!["0 (2)".to_string()]));
    }

    #[tokio::test]
    async fn fetch_failure_drops_only_that_script() {
        let fx = Fixture::new();
        fx.transport.route("https://site.test/ok.lua", "print(1)");
        let sandbox = fx.sandbox();
        assert_eq!(sandbox.run(ScriptDescriptor::new("gone.lua", "v2"), &fx.scope).await, None);
        assert_eq!(sandbox.run(ScriptDescriptor::new("ok.lua", "v2"), &fx.scope).await, Some(0));
        assert_eq!(fx.log.count(LogLevel::Error), 1);
        assert_eq!(fx.scope.registry.borrow().len(), 1);
    }

    #[tokio::test]
    async fn execution_failure_is_contained() {
        let fx = Fixture::new();
        fx.transport.route("https://site.test/bad.lua", "fail attempt to index nil");
        fx.transport.route("https://site.test/good.lua", "write ok");
        let sandbox = fx.sandbox();
        sandbox.run(ScriptDescriptor::new("bad.lua", "v2"), &fx.scope).await;
        sandbox.run(ScriptDescriptor::new("good.lua", "v2"), &fx.scope).await;
        assert_eq!(fx.scope.registry.borrow().len(), 2);
        assert_eq!(
            fx.log.lines().last().map(|l| l.text.clone()),
            Some("attempt to index nil".to_string())
        );
        assert_eq!(fx.scope.surface.read(|s| s.markup().to_string()), "ok");
    }

    #[tokio::test]
    async fn engine_creation_failure_is_logged() {
        let fx = Fixture::new();
        fx.v2.fail_creation();
        fx.transport.route("https://site.test/a.lua", "print(1)");
        let index = fx.sandbox().run(ScriptDescriptor::new("a.lua", "v2"), &fx.scope).await;
        assert_eq!(index, None);
        assert_eq!(fx.log.count(LogLevel::Error), 1);
        assert!(fx.scope.registry.borrow().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_scripts_run_concurrently() {
        let fx = Fixture::new();
        fx.transport.route_delayed("https://site.test/slow.lua", "write slow", 30);
        fx.transport.route("https://site.test/fast.lua", "write fast");
        let scripts = vec![
            ScriptDescriptor::new("slow.lua", "v2"),
            ScriptDescriptor::new("fast.lua", "v2"),
        ];
        let local = LocalSet::new();
        local
            .run_until(async {
                let mut tasks = JoinSet::new();
                assert_eq!(fx.sandbox().spawn_all(scripts, &fx.scope, &mut tasks), 2);
                while tasks.join_next().await.is_some() {}
            })
            .await;
        assert_eq!(fx.scope.registry.borrow().len(), 2);
        assert_eq!(fx.scope.surface.read(|s| s.markup().to_string()), "fastslow");
    }
}
