//! Built-in collaborators for running without a real parser or engine.
//!
//! The tag scanner keeps markup verbatim and pulls out script and style
//! references; the style pass-through returns its input; the dry-run
//! engine only reports what it was asked to run.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use webx_types::{Result, WebxError};

use crate::collab::{
    Collaborators, MarkupBuilder, MarkupParser, MarkupTree, StyleBuilder, StyleParser, StyleTree,
};
use crate::log::LogSink;
use crate::page::{PageBundle, ScriptDescriptor};
use crate::sandbox::{EngineFactory, EngineSet, HostFunction, HostOptions, ScriptEngine};
use crate::surface::SurfaceHandle;

static SCRIPT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b([^>]*)>").expect("script tag pattern"));
static LINK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<link\b([^>]*)>").expect("link tag pattern"));
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("attribute pattern")
});

const DEFAULT_VERSION: &str = "legacy";

fn attributes(tag_body: &str) -> HashMap<String, String> {
    ATTRIBUTE
        .captures_iter(tag_body)
        .filter_map(|c| {
            let name = c.get(1)?.as_str().to_ascii_lowercase();
            let value = c.get(2).or_else(|| c.get(3)).or_else(|| c.get(4))?.as_str();
            Some((name, value.to_string()))
        })
        .collect()
}

/// Regex-driven markup collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagScanner;

impl MarkupParser for TagScanner {
    fn parse(&self, text: &str) -> Result<MarkupTree> {
        Ok(serde_json::Value::String(text.to_string()))
    }
}

impl MarkupBuilder for TagScanner {
    fn build(&self, tree: &MarkupTree, _base: &str) -> Result<PageBundle> {
        let markup = tree
            .as_str()
            .ok_or_else(|| WebxError::Parse("tag scanner expects markup text".into()))?;

        let scripts = SCRIPT_TAG
            .captures_iter(markup)
            .filter_map(|c| {
                let attrs = attributes(c.get(1)?.as_str());
                let source = attrs.get("src")?.clone();
                let version = attrs
                    .get("version")
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_VERSION.to_string());
                Some(ScriptDescriptor::new(source, version))
            })
            .collect();

        let styles = LINK_TAG
            .captures_iter(markup)
            .filter_map(|c| attributes(c.get(1)?.as_str()).remove("href"))
            .collect();

        Ok(PageBundle {
            markup: markup.to_string(),
            scripts,
            styles,
        })
    }
}

/// Style collaborator that leaves text unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughStyle;

impl StyleParser for PassthroughStyle {
    fn parse(&self, text: &str) -> Result<StyleTree> {
        Ok(serde_json::Value::String(text.to_string()))
    }
}

impl StyleBuilder for PassthroughStyle {
    fn build(&self, tree: &StyleTree) -> Result<String> {
        tree.as_str()
            .map(str::to_string)
            .ok_or_else(|| WebxError::Parse("expected style text".into()))
    }
}

/// Engine that logs scripts instead of running them.
pub struct DryRunEngine {
    tag: &'static str,
    log: LogSink,
    host_functions: RefCell<Vec<String>>,
}

#[async_trait(?Send)]
impl ScriptEngine for DryRunEngine {
    fn register(&self, name: &str, _function: HostFunction) {
        self.host_functions.borrow_mut().push(name.to_string());
    }

    async fn execute(&self, code: &str) -> Result<()> {
        let functions = self.host_functions.borrow().len();
        self.log.info(format!(
            "[dry-run] {} script: {} lines, {functions} host functions",
            self.tag,
            code.lines().count()
        ));
        Ok(())
    }
}

pub struct DryRunFactory {
    tag: &'static str,
}

#[async_trait(?Send)]
impl EngineFactory for DryRunFactory {
    async fn create(
        &self,
        surface: SurfaceHandle,
        options: HostOptions,
        log: LogSink,
    ) -> Result<Rc<dyn ScriptEngine>> {
        log::debug!(
            "dry-run {} engine for generation {} (query {:?})",
            self.tag,
            surface.generation(),
            options.query
        );
        let engine: Rc<dyn ScriptEngine> = Rc::new(DryRunEngine {
            tag: self.tag,
            log,
            host_functions: RefCell::new(Vec::new()),
        });
        Ok(engine)
    }
}

/// Tag scanner plus pass-through styles.
pub fn collaborators() -> Collaborators {
    Collaborators {
        markup_parser: Rc::new(TagScanner),
        markup_builder: Rc::new(TagScanner),
        style_parser: Rc::new(PassthroughStyle),
        style_builder: Rc::new(PassthroughStyle),
    }
}

/// Dry-run engines for both dialects.
pub fn engines() -> EngineSet {
    EngineSet {
        legacy: Rc::new(DryRunFactory { tag: "legacy" }),
        v2: Rc::new(DryRunFactory { tag: "v2" }),
    }
}
