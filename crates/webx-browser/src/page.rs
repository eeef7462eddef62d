//! What the markup builder hands back for one page.

use std::fmt;

/// Markup, script declarations and style references of one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageBundle {
    pub markup: String,
    pub scripts: Vec<ScriptDescriptor>,
    pub styles: Vec<String>,
}

/// One `<script>` declaration. `code` is filled in once the source has
/// been fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptDescriptor {
    pub source: String,
    pub version: String,
    pub code: Option<String>,
}

impl ScriptDescriptor {
    pub fn new(source: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            version: version.into(),
            code: None,
        }
    }

    pub fn dialect(&self) -> Option<Dialect> {
        Dialect::from_version(&self.version)
    }
}

/// The two supported script syntaxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Legacy,
    V2,
}

impl Dialect {
    /// Map a declared version tag to a dialect. Tags are matched exactly.
    pub fn from_version(version: &str) -> Option<Self> {
        match version {
            "legacy" => Some(Dialect::Legacy),
            "2" | "v2" => Some(Dialect::V2),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Dialect::Legacy => "legacy",
            Dialect::V2 => "v2",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
