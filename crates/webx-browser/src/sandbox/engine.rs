//! Invocation contract for the external dialect engines.

use std::collections::BTreeMap;
use std::rc::Rc;

use async_trait::async_trait;
use serde::Serialize;
use webx_types::Result;

use crate::log::LogSink;
use crate::page::Dialect;
use crate::surface::SurfaceHandle;

/// A value crossing the host/script boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HostValue {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Table(BTreeMap<String, HostValue>),
}

impl HostValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            HostValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Field lookup on a table; `None` for anything else.
    pub fn get(&self, key: &str) -> Option<&HostValue> {
        match self {
            HostValue::Table(t) => t.get(key),
            _ => None,
        }
    }

    /// Script truthiness: only `nil` and `false` are false.
    pub fn truthy(&self) -> bool {
        !matches!(self, HostValue::Nil | HostValue::Bool(false))
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::String(s)
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Number(n)
    }
}

/// A host function registered into a script context.
pub type HostFunction = Rc<dyn Fn(&[HostValue]) -> Result<HostValue>>;

/// Read-only options every context receives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostOptions {
    pub query: String,
    /// The alternate-theme toggle.
    pub bussinga: bool,
    pub proxy: bool,
}

impl HostOptions {
    pub fn to_value(&self) -> HostValue {
        HostValue::Table(BTreeMap::from([
            ("query".to_string(), HostValue::from(self.query.as_str())),
            ("bussinga".to_string(), HostValue::from(self.bussinga)),
            ("proxy".to_string(), HostValue::from(self.proxy)),
        ]))
    }
}

/// One running script context.
#[async_trait(?Send)]
pub trait ScriptEngine {
    /// Expose `function` to scripts under `name`.
    fn register(&self, name: &str, function: HostFunction);

    /// Run `code` in this context. Runtime faults come back as
    /// [`webx_types::WebxError::ExecutionFailed`].
    async fn execute(&self, code: &str) -> Result<()>;
}

/// Constructs contexts for one dialect.
#[async_trait(?Send)]
pub trait EngineFactory {
    async fn create(
        &self,
        surface: SurfaceHandle,
        options: HostOptions,
        log: LogSink,
    ) -> Result<Rc<dyn ScriptEngine>>;
}

/// Factories for both dialects.
#[derive(Clone)]
pub struct EngineSet {
    pub legacy: Rc<dyn EngineFactory>,
    pub v2: Rc<dyn EngineFactory>,
}

impl EngineSet {
    pub fn factory(&self, dialect: Dialect) -> &Rc<dyn EngineFactory> {
        match dialect {
            Dialect::Legacy => &self.legacy,
            Dialect::V2 => &self.v2,
        }
    }
}
