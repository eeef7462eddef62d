//! Audio subsystem for WebX pages.
//!
//! Scripts address audio by resource address. Every script context on a
//! page shares one [`AudioCache`], so repeated requests for the same
//! address drive a single [`AudioHandle`] instead of spawning duplicate
//! players. Actual sound output is delegated to an [`AudioBackend`].

mod cache;
mod player;

pub use cache::{AudioBackend, AudioCache, AudioHandle, NullAudioBackend, PlaybackState};
pub use player::{AudioPlayer, PlayOptions, clamp_volume};
