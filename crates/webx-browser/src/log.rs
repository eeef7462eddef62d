//! Operator-facing log panel.
//!
//! Every line is mirrored to the `log` facade at the matching level.

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// CSS class the panel gives lines of this level.
    pub fn class(self) -> &'static str {
        match self {
            LogLevel::Info => "",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Map a panel class back to a level. Unknown classes are `Info`.
    pub fn from_class(class: &str) -> Self {
        match class {
            "warn" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub level: LogLevel,
    pub text: String,
}

/// Shared, append-only log panel. Cloning shares the same panel.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    lines: Rc<RefCell<Vec<LogLine>>>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, level: LogLevel, text: impl Into<String>) {
        let text = text.into();
        match level {
            LogLevel::Info => log::info!("{text}"),
            LogLevel::Warn => log::warn!("{text}"),
            LogLevel::Error => log::error!("{text}"),
        }
        self.lines.borrow_mut().push(LogLine { level, text });
    }

    pub fn info(&self, text: impl Into<String>) {
        self.push(LogLevel::Info, text);
    }

    pub fn warn(&self, text: impl Into<String>) {
        self.push(LogLevel::Warn, text);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.push(LogLevel::Error, text);
    }

    /// Snapshot of all lines, oldest first.
    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.borrow().clone()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.lines.borrow().iter().filter(|l| l.level == level).count()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|l| l.text.contains(needle))
    }

    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }

    /// Panel markup: newest line first, `<` escaped.
    pub fn render_html(&self) -> String {
        self.lines
            .borrow()
            .iter()
            .rev()
            .map(|l| {
                let text = l.text.replace('<', "&lt;");
                format!("<p class=\"{}\">{text}</p>", l.level.class())
            })
            .collect()
    }
}
