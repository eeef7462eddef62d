//! Document-wide theme and the opt-in styling convention.

/// Comment a style document carries to skip normalization in alternate
/// theme mode.
pub const BUSSINGA_MARKER: &str = "/* bussinga! */";

pub const BUSSINGA_WARNING: &str =
    "[Warn] Site uses bussinga css, but you are not using bussinga mode.";

const DEFAULT_THEME: &str =
    "body { font-family: Lexend, Arial; background: #2C2C2C; color: #F7F7F7; }";
const ALTERNATE_THEME: &str =
    "body { font-family: Lexend, Arial; background: #252524; color: white; }";

/// The style block installed ahead of every page's own styles.
pub fn default_theme(alternate: bool) -> &'static str {
    if alternate { ALTERNATE_THEME } else { DEFAULT_THEME }
}

pub fn has_opt_in_marker(css: &str) -> bool {
    css.contains(BUSSINGA_MARKER)
}

/// Whether a style reference names a style document. Any query or fragment
/// is ignored and the suffix match is case-insensitive.
pub fn is_style_ref(reference: &str) -> bool {
    let path = reference
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    path.len() > ".css".len() && path.to_ascii_lowercase().ends_with(".css")
}
