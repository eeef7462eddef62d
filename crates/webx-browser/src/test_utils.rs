//! Shared test doubles for the page pipeline.
//!
//! [`MockTransport`] serves canned bodies and records every request.
//! [`FakeEngine`] understands a tiny line language so tests can drive the
//! surface and host functions from "script" text:
//!
//! * `write <text>` appends to the surface markup
//! * `fail <message>` fails execution with that message
//! * `sleep <ms>` suspends the script
//! * `play <address> <volume>` calls `play_audio`
//!
//! Any other line is ignored.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use webx_net::Transport;
use webx_types::{Result, WebxError};

use crate::collab::{StyleBuilder, StyleParser, StyleTree};
use crate::console::ConsoleView;
use crate::log::LogSink;
use crate::sandbox::capabilities::PLAY_AUDIO;
use crate::sandbox::{EngineFactory, HostFunction, HostOptions, HostValue, ScriptEngine};
use crate::surface::SurfaceHandle;

/// Canned-response transport.
#[derive(Default)]
pub struct MockTransport {
    routes: RefCell<HashMap<String, (String, Option<Duration>)>>,
    requests: RefCell<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn route(&self, url: &str, body: &str) {
        self.routes
            .borrow_mut()
            .insert(url.to_string(), (body.to_string(), None));
    }

    /// Serve `body` after `delay_ms` on the tokio clock. Tests that pause
    /// the clock see the delay auto-advanced.
    pub fn route_delayed(&self, url: &str, body: &str, delay_ms: u64) {
        self.routes.borrow_mut().insert(
            url.to_string(),
            (body.to_string(), Some(Duration::from_millis(delay_ms))),
        );
    }

    /// Every requested URL, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn requests_starting_with(&self, prefix: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|u| u.starts_with(prefix))
            .count()
    }
}

#[async_trait(?Send)]
impl Transport for MockTransport {
    async fn get(&self, url: &str) -> Result<String> {
        self.requests.borrow_mut().push(url.to_string());
        let route = self.routes.borrow().get(url).cloned();
        match route {
            Some((body, Some(delay))) => {
                tokio::time::sleep(delay).await;
                Ok(body)
            },
            Some((body, None)) => {
                tokio::task::yield_now().await;
                Ok(body)
            },
            None => Err(WebxError::fetch(url, "HTTP status 404")),
        }
    }
}

/// Script engine double that records what it is asked to do.
pub struct FakeEngine {
    tag: String,
    surface: SurfaceHandle,
    options: HostOptions,
    log: LogSink,
    globals: RefCell<BTreeMap<String, HostFunction>>,
    executed: RefCell<Vec<String>>,
}

impl FakeEngine {
    pub fn new(tag: &str, surface: SurfaceHandle) -> Rc<Self> {
        Self::with(tag, surface, HostOptions::default(), LogSink::new())
    }

    pub fn with(tag: &str, surface: SurfaceHandle, options: HostOptions, log: LogSink) -> Rc<Self> {
        Rc::new(Self {
            tag: tag.to_string(),
            surface,
            options,
            log,
            globals: RefCell::new(BTreeMap::new()),
            executed: RefCell::new(Vec::new()),
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn surface(&self) -> &SurfaceHandle {
        &self.surface
    }

    pub fn options(&self) -> HostOptions {
        self.options.clone()
    }

    pub fn registered(&self) -> Vec<String> {
        self.globals.borrow().keys().cloned().collect()
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.borrow().clone()
    }

    /// Invoke a registered host function the way a script would.
    pub fn call(&self, name: &str, args: &[HostValue]) -> Result<HostValue> {
        let function = self
            .globals
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| {
                WebxError::ExecutionFailed(format!("attempt to call a nil value ({name})"))
            })?;
        function(args)
    }
}

#[async_trait(?Send)]
impl ScriptEngine for FakeEngine {
    fn register(&self, name: &str, function: HostFunction) {
        self.globals.borrow_mut().insert(name.to_string(), function);
    }

    async fn execute(&self, code: &str) -> Result<()> {
        self.executed.borrow_mut().push(code.to_string());
        for line in code.lines().map(str::trim) {
            let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
            match command {
                "write" => {
                    self.surface.mutate(|s| s.append_markup(rest));
                },
                "fail" => return Err(WebxError::ExecutionFailed(rest.to_string())),
                "sleep" => {
                    let ms = rest.parse().unwrap_or(0);
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                },
                "play" => {
                    let (address, volume) = rest.split_once(' ').unwrap_or((rest, "1"));
                    let opts = HostValue::Table(BTreeMap::from([(
                        "volume".to_string(),
                        HostValue::Number(volume.parse().unwrap_or(1.0)),
                    )]));
                    self.call(PLAY_AUDIO, &[address.into(), opts])?;
                },
                "log" => self.log.info(rest),
                _ => {},
            }
        }
        Ok(())
    }
}

/// Factory double; keeps every engine it creates.
pub struct FakeFactory {
    tag: String,
    created: RefCell<Vec<Rc<FakeEngine>>>,
    fail: Cell<bool>,
}

impl FakeFactory {
    pub fn new(tag: &str) -> Rc<Self> {
        Rc::new(Self {
            tag: tag.to_string(),
            created: RefCell::new(Vec::new()),
            fail: Cell::new(false),
        })
    }

    pub fn fail_creation(&self) {
        self.fail.set(true);
    }

    /// The `index`th engine created. Panics if there is none.
    pub fn created(&self, index: usize) -> Rc<FakeEngine> {
        Rc::clone(&self.created.borrow()[index])
    }

    pub fn created_count(&self) -> usize {
        self.created.borrow().len()
    }
}

#[async_trait(?Send)]
impl EngineFactory for FakeFactory {
    async fn create(
        &self,
        surface: SurfaceHandle,
        options: HostOptions,
        log: LogSink,
    ) -> Result<Rc<dyn ScriptEngine>> {
        tokio::task::yield_now().await;
        if self.fail.get() {
            return Err(WebxError::ExecutionFailed(format!("{} engine failed to start", self.tag)));
        }
        let engine = FakeEngine::with(&self.tag, surface, options, log);
        self.created.borrow_mut().push(Rc::clone(&engine));
        Ok(engine as Rc<dyn ScriptEngine>)
    }
}

/// Console view that records every listing pushed to it.
#[derive(Default)]
pub struct RecordingConsole {
    pub listings: Vec<Vec<String>>,
}

impl RecordingConsole {
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn last(&self) -> Option<Vec<String>> {
        self.listings.last().cloned()
    }
}

impl ConsoleView for RecordingConsole {
    fn set_contexts(&mut self, listing: &[String]) {
        self.listings.push(listing.to_vec());
    }
}

/// Style collaborator that tags normalized output. Text containing
/// `!invalid` fails to parse.
pub struct TaggingStyle;

pub const NORMALIZED_TAG: &str = "/* normalized */ ";

impl StyleParser for TaggingStyle {
    fn parse(&self, text: &str) -> Result<StyleTree> {
        if text.contains("!invalid") {
            return Err(WebxError::Parse("unexpected token".into()));
        }
        Ok(serde_json::Value::String(text.trim().to_string()))
    }
}

impl StyleBuilder for TaggingStyle {
    fn build(&self, tree: &StyleTree) -> Result<String> {
        let css = tree
            .as_str()
            .ok_or_else(|| WebxError::Parse("expected style text".into()))?;
        Ok(format!("{NORMALIZED_TAG}{css}"))
    }
}
