//! Page assembly: markup, theme, link interception and page styles.

use webx_types::Result;

use crate::collab::Collaborators;
use crate::fetch::ResourceFetcher;
use crate::log::LogSink;
use crate::surface::SurfaceHandle;
use crate::theme::{self, BUSSINGA_WARNING};

/// What happened to a page's style references.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    pub styles_applied: usize,
    pub styles_skipped: usize,
}

pub struct PageAssembler {
    fetcher: ResourceFetcher,
    collaborators: Collaborators,
    log: LogSink,
}

impl PageAssembler {
    pub fn new(fetcher: ResourceFetcher, collaborators: Collaborators, log: LogSink) -> Self {
        Self {
            fetcher,
            collaborators,
            log,
        }
    }

    /// Render `markup` into the surface, then fetch and append the page's
    /// styles.
    ///
    /// Styles are fetched one at a time in declaration order and appended
    /// only once all of them have been fetched, so later documents always
    /// sit after earlier ones in the cascade. References that are not style
    /// documents, or that fail to fetch, are skipped.
    pub async fn assemble(
        &self,
        surface: &SurfaceHandle,
        base: &str,
        markup: &str,
        style_refs: &[String],
        alternate_theme: bool,
    ) -> AssemblyReport {
        surface.mutate(|s| {
            s.replace_markup(markup);
            s.push_style(theme::default_theme(alternate_theme));
            s.install_link_interceptor();
        });

        let mut bodies = Vec::with_capacity(style_refs.len());
        for reference in style_refs {
            if !theme::is_style_ref(reference) {
                log::debug!("skipping non-style reference {reference}");
                continue;
            }
            match self.fetcher.fetch(base, reference).await {
                Ok(body) => bodies.push(body),
                Err(e) => self.log.warn(e.to_string()),
            }
        }

        let blocks: Vec<String> = bodies
            .iter()
            .map(|body| self.process_style(body, alternate_theme))
            .collect();
        let report = AssemblyReport {
            styles_applied: blocks.len(),
            styles_skipped: style_refs.len() - blocks.len(),
        };
        surface.mutate(|s| {
            for block in blocks {
                s.push_style(block);
            }
        });
        report
    }

    /// Decide how one fetched style document reaches the surface.
    ///
    /// Opted-in documents are used verbatim in alternate theme mode.
    /// Everything else is normalized; if normalization fails the source
    /// text is used as is.
    pub fn process_style(&self, body: &str, alternate_theme: bool) -> String {
        let opted_in = theme::has_opt_in_marker(body);
        if opted_in && alternate_theme {
            return body.to_string();
        }
        if opted_in {
            self.log.warn(BUSSINGA_WARNING);
        }
        match self.normalize(body) {
            Ok(css) => css,
            Err(e) => {
                log::debug!("style normalization failed, using source text: {e}");
                body.to_string()
            },
        }
    }

    fn normalize(&self, body: &str) -> Result<String> {
        self.collaborators.normalize_style(body)
    }
}
