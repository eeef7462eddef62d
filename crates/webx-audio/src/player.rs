//! Playback options and the inline player element.

/// Options accepted by `play_audio` and `create_audio_player`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayOptions {
    /// Switch looping on. A `false` here never switches it off.
    pub looping: bool,
    /// Requested volume; clamped to `[0, 1]` when applied.
    pub volume: Option<f64>,
}

impl PlayOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }
}

/// Clamp a requested volume into `[0, 1]`. NaN is rejected.
pub fn clamp_volume(volume: f64) -> Option<f64> {
    if volume.is_nan() {
        None
    } else {
        Some(volume.clamp(0.0, 1.0))
    }
}

/// An inline, controls-enabled player element appended to a page.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioPlayer {
    pub src: String,
    pub controls: bool,
    pub looping: bool,
    pub volume: f64,
}

impl AudioPlayer {
    pub fn new(src: &str, options: &PlayOptions) -> Self {
        Self {
            src: src.to_string(),
            controls: true,
            looping: options.looping,
            volume: options.volume.and_then(clamp_volume).unwrap_or(1.0),
        }
    }

    /// Markup for the element as it sits in the page body.
    pub fn to_html(&self) -> String {
        let mut html = format!("<audio src=\"{}\" controls", escape_attr(&self.src));
        if self.looping {
            html.push_str(" loop");
        }
        html.push_str("></audio>");
        html
    }
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;")
}
