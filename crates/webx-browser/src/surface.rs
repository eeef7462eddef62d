//! The per-page rendering surface.
//!
//! A [`SurfaceHandle`] belongs to one navigation generation. Once a newer
//! navigation starts, the handle goes stale and every write through it is
//! dropped, so late completions from a discarded page never land on the
//! page that replaced it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use webx_audio::AudioPlayer;

/// Scheme whose anchors re-trigger top-level navigation.
pub const NAV_SCHEME: &str = "buss://";

/// Document state of one page.
#[derive(Debug, Default)]
pub struct Surface {
    markup: String,
    styles: Vec<String>,
    players: Vec<AudioPlayer>,
    link_interceptor: bool,
}

impl Surface {
    /// Replace the entire document content.
    pub fn replace_markup(&mut self, markup: &str) {
        self.markup = markup.to_string();
        self.styles.clear();
        self.players.clear();
    }

    pub fn append_markup(&mut self, markup: &str) {
        self.markup.push_str(markup);
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Append a style block after every existing one.
    pub fn push_style(&mut self, css: impl Into<String>) {
        self.styles.push(css.into());
    }

    /// Style blocks in cascade order.
    pub fn styles(&self) -> &[String] {
        &self.styles
    }

    pub fn append_audio_player(&mut self, player: AudioPlayer) {
        self.players.push(player);
    }

    pub fn audio_players(&self) -> &[AudioPlayer] {
        &self.players
    }

    pub fn install_link_interceptor(&mut self) {
        self.link_interceptor = true;
    }

    pub fn intercepts_links(&self) -> bool {
        self.link_interceptor
    }

    /// Handle a click on an anchor targeting `href`.
    ///
    /// Returns the address to navigate to when the interceptor claims the
    /// click, or `None` to let default handling proceed.
    pub fn intercept_click(&self, href: &str) -> Option<String> {
        if !self.link_interceptor {
            return None;
        }
        href.trim()
            .strip_prefix(NAV_SCHEME)
            .map(|rest| rest.to_string())
    }

    /// Serialise the surface as a document.
    pub fn render_document(&self) -> String {
        let mut html = String::from("<html><head>");
        for css in &self.styles {
            html.push_str("<style>");
            html.push_str(css);
            html.push_str("</style>");
        }
        html.push_str("</head><body>");
        html.push_str(&self.markup);
        for player in &self.players {
            html.push_str(&player.to_html());
        }
        html.push_str("</body></html>");
        html
    }
}

/// Shared, generation-tagged access to a [`Surface`].
#[derive(Debug, Clone)]
pub struct SurfaceHandle {
    surface: Rc<RefCell<Surface>>,
    generation: u64,
    live: Rc<Cell<u64>>,
}

impl SurfaceHandle {
    pub(crate) fn new(generation: u64, live: Rc<Cell<u64>>) -> Self {
        Self {
            surface: Rc::new(RefCell::new(Surface::default())),
            generation,
            live,
        }
    }

    /// A handle that is live until something else claims its generation
    /// cell. Embedders and tests use it to drive a surface directly.
    pub fn standalone() -> Self {
        Self::new(0, Rc::new(Cell::new(0)))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this surface still belongs to the current navigation.
    pub fn is_live(&self) -> bool {
        self.live.get() == self.generation
    }

    /// Apply `f` to the surface unless it has gone stale.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut Surface) -> R) -> Option<R> {
        if !self.is_live() {
            log::debug!(
                "dropping write to stale surface (generation {}, live {})",
                self.generation,
                self.live.get()
            );
            return None;
        }
        Some(f(&mut self.surface.borrow_mut()))
    }

    pub fn read<R>(&self, f: impl FnOnce(&Surface) -> R) -> R {
        f(&self.surface.borrow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webx_audio::PlayOptions;

    #[test]
    fn replace_resets_document() {
        let handle = SurfaceHandle::standalone();
        handle.mutate(|s| {
            s.replace_markup("<p>a</p>");
            s.push_style("p {}");
            s.append_audio_player(AudioPlayer::new("x.mp3", &PlayOptions::new()));
            s.replace_markup("<p>b</p>");
        });
        handle.read(|s| {
            assert_eq!(s.markup(), "<p>b</p>");
            assert!(s.styles().is_empty());
            assert!(s.audio_players().is_empty());
        });
    }

    #[test]
    fn interceptor_claims_only_nav_scheme() {
        let mut surface = Surface::default();
        assert_eq!(surface.intercept_click("buss://example.it"), None);
        surface.install_link_interceptor();
        assert_eq!(
            surface.intercept_click("buss://example.it/page?x=1"),
            Some("example.it/page?x=1".to_string())
        );
        assert_eq!(surface.intercept_click("https://example.com"), None);
    }

    #[test]
    fn stale_handle_drops_writes() {
        let live = Rc::new(Cell::new(1));
        let old = SurfaceHandle::new(1, Rc::clone(&live));
        assert!(old.mutate(|s| s.append_markup("a")).is_some());
        live.set(2);
        assert!(!old.is_live());
        assert!(old.mutate(|s| s.append_markup("b")).is_none());
        assert_eq!(old.read(|s| s.markup().to_string()), "a");
    }

    #[test]
    fn render_document_orders_styles() {
        let handle = SurfaceHandle::standalone();
        handle.mutate(|s| {
            s.replace_markup("<h1>hi</h1>");
            s.push_style("a{}");
            s.push_style("b{}");
        });
        assert_eq!(
            handle.read(|s| s.render_document()),
            "<html><head><style>a{}</style><style>b{}</style></head><body><h1>hi</h1></body></html>"
        );
    }
}
