//! Per-page playback handles keyed by address.

use std::collections::HashMap;

use crate::player::{PlayOptions, clamp_volume};

/// Playback state of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// Playback state for one audio address.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioHandle {
    pub address: String,
    pub looping: bool,
    pub volume: f64,
    pub state: PlaybackState,
    /// Playback position in seconds. Reset to zero by `stop`.
    pub position: f64,
}

impl AudioHandle {
    fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            looping: false,
            volume: 1.0,
            state: PlaybackState::Stopped,
            position: 0.0,
        }
    }
}

/// Receives playback commands once the cache has updated a handle.
pub trait AudioBackend {
    fn play(&mut self, handle: &AudioHandle);
    fn pause(&mut self, handle: &AudioHandle);
    fn stop(&mut self, handle: &AudioHandle);
}

/// Backend for headless sessions: commands are only logged.
#[derive(Debug, Default)]
pub struct NullAudioBackend;

impl AudioBackend for NullAudioBackend {
    fn play(&mut self, handle: &AudioHandle) {
        log::debug!(
            "audio play {} (loop={}, volume={:.2})",
            handle.address,
            handle.looping,
            handle.volume
        );
    }

    fn pause(&mut self, handle: &AudioHandle) {
        log::debug!("audio pause {}", handle.address);
    }

    fn stop(&mut self, handle: &AudioHandle) {
        log::debug!("audio stop {}", handle.address);
    }
}

/// One handle per distinct address, shared by every script context of a
/// page. Commands are last-writer-wins.
pub struct AudioCache {
    handles: HashMap<String, AudioHandle>,
    backend: Box<dyn AudioBackend>,
}

impl AudioCache {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            handles: HashMap::new(),
            backend,
        }
    }

    /// Start (or resume) playback of `address`, creating its handle on
    /// first use.
    pub fn play(&mut self, address: &str, options: &PlayOptions) -> &AudioHandle {
        let handle = self
            .handles
            .entry(address.to_string())
            .or_insert_with(|| AudioHandle::new(address));
        if options.looping {
            handle.looping = true;
        }
        if let Some(volume) = options.volume.and_then(clamp_volume) {
            handle.volume = volume;
        }
        handle.state = PlaybackState::Playing;
        self.backend.play(handle);
        handle
    }

    /// Pause `address`. Unknown addresses are ignored.
    pub fn pause(&mut self, address: &str) -> bool {
        let Some(handle) = self.handles.get_mut(address) else {
            return false;
        };
        handle.state = PlaybackState::Paused;
        self.backend.pause(handle);
        true
    }

    /// Pause `address` and rewind it. Unknown addresses are ignored.
    pub fn stop(&mut self, address: &str) -> bool {
        let Some(handle) = self.handles.get_mut(address) else {
            return false;
        };
        handle.state = PlaybackState::Stopped;
        handle.position = 0.0;
        self.backend.stop(handle);
        true
    }

    pub fn get(&self, address: &str) -> Option<&AudioHandle> {
        self.handles.get(address)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Stop everything and drop all handles.
    pub fn clear(&mut self) {
        for handle in self.handles.values_mut() {
            if handle.state != PlaybackState::Stopped {
                handle.state = PlaybackState::Stopped;
                self.backend.stop(handle);
            }
        }
        self.handles.clear();
    }
}

impl Default for AudioCache {
    fn default() -> Self {
        Self::new(Box::new(NullAudioBackend))
    }
}

impl Drop for AudioCache {
    fn drop(&mut self) {
        self.clear();
    }
}
