//! Seams for the external markup and style collaborators.
//!
//! Parsers and builders are pure text/tree transforms. Trees are carried
//! as `serde_json::Value` so any parser can hand over its own shape.

use std::rc::Rc;

use webx_types::Result;

use crate::page::PageBundle;

pub type MarkupTree = serde_json::Value;
pub type StyleTree = serde_json::Value;

pub trait MarkupParser {
    fn parse(&self, text: &str) -> Result<MarkupTree>;
}

pub trait MarkupBuilder {
    /// Build a page from a parsed tree. `base` is the page's location.
    fn build(&self, tree: &MarkupTree, base: &str) -> Result<PageBundle>;
}

pub trait StyleParser {
    fn parse(&self, text: &str) -> Result<StyleTree>;
}

pub trait StyleBuilder {
    fn build(&self, tree: &StyleTree) -> Result<String>;
}

/// The four collaborators a [`crate::Browser`] drives.
#[derive(Clone)]
pub struct Collaborators {
    pub markup_parser: Rc<dyn MarkupParser>,
    pub markup_builder: Rc<dyn MarkupBuilder>,
    pub style_parser: Rc<dyn StyleParser>,
    pub style_builder: Rc<dyn StyleBuilder>,
}

impl Collaborators {
    /// Parse then build a markup document.
    pub fn build_page(&self, text: &str, base: &str) -> Result<PageBundle> {
        let tree = self.markup_parser.parse(text)?;
        self.markup_builder.build(&tree, base)
    }

    /// Round-trip a style document through the parser and builder.
    pub fn normalize_style(&self, text: &str) -> Result<String> {
        let tree = self.style_parser.parse(text)?;
        self.style_builder.build(&tree)
    }
}
