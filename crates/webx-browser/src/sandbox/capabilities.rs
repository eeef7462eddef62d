//! Host capabilities injected into every script context.
//!
//! All closures hold the page's surface handle; once the page is replaced
//! they become no-ops.

use std::cell::RefCell;
use std::rc::Rc;

use webx_audio::{AudioCache, AudioPlayer, PlayOptions};
use webx_types::{Result, WebxError};

use super::engine::{HostFunction, HostValue, ScriptEngine};
use crate::surface::SurfaceHandle;

pub const PLAY_AUDIO: &str = "play_audio";
pub const PAUSE_AUDIO: &str = "pause_audio";
pub const STOP_AUDIO: &str = "stop_audio";
pub const CREATE_AUDIO_PLAYER: &str = "create_audio_player";

/// Audio cache shared by every context on one page.
pub type SharedAudio = Rc<RefCell<AudioCache>>;

/// First argument as an address. Numbers are accepted the way a script
/// would stringify them.
fn address_arg(name: &str, args: &[HostValue]) -> Result<String> {
    match args.first() {
        Some(HostValue::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(HostValue::Number(n)) => Ok(n.to_string()),
        _ => Err(WebxError::ExecutionFailed(format!(
            "{name}: expected an audio address"
        ))),
    }
}

/// `{ loop, volume }` from the optional second argument.
fn play_options(args: &[HostValue]) -> PlayOptions {
    let mut opts = PlayOptions::new();
    let Some(table) = args.get(1) else {
        return opts;
    };
    if table.get("loop").is_some_and(HostValue::truthy) {
        opts = opts.looping(true);
    }
    if let Some(volume) = table.get("volume").and_then(HostValue::as_number) {
        opts = opts.volume(volume);
    }
    opts
}

/// Register `play_audio`, `pause_audio` and `stop_audio`.
pub fn inject_audio(engine: &dyn ScriptEngine, surface: &SurfaceHandle, audio: &SharedAudio) {
    let play: HostFunction = {
        let surface = surface.clone();
        let audio = Rc::clone(audio);
        Rc::new(move |args: &[HostValue]| -> Result<HostValue> {
            let address = address_arg(PLAY_AUDIO, args)?;
            if surface.is_live() {
                audio.borrow_mut().play(&address, &play_options(args));
            }
            Ok(HostValue::Nil)
        })
    };
    let pause: HostFunction = {
        let surface = surface.clone();
        let audio = Rc::clone(audio);
        Rc::new(move |args: &[HostValue]| -> Result<HostValue> {
            let address = address_arg(PAUSE_AUDIO, args)?;
            let paused = surface.is_live() && audio.borrow_mut().pause(&address);
            Ok(HostValue::Bool(paused))
        })
    };
    let stop: HostFunction = {
        let surface = surface.clone();
        let audio = Rc::clone(audio);
        Rc::new(move |args: &[HostValue]| -> Result<HostValue> {
            let address = address_arg(STOP_AUDIO, args)?;
            let stopped = surface.is_live() && audio.borrow_mut().stop(&address);
            Ok(HostValue::Bool(stopped))
        })
    };
    engine.register(PLAY_AUDIO, play);
    engine.register(PAUSE_AUDIO, pause);
    engine.register(STOP_AUDIO, stop);
}

/// Register `create_audio_player`.
pub fn inject_audio_ui(engine: &dyn ScriptEngine, surface: &SurfaceHandle) {
    let surface = surface.clone();
    let create: HostFunction = Rc::new(move |args: &[HostValue]| -> Result<HostValue> {
        let address = address_arg(CREATE_AUDIO_PLAYER, args)?;
        let player = AudioPlayer::new(&address, &play_options(args));
        let appended = surface
            .mutate(|s| s.append_audio_player(player))
            .is_some();
        Ok(HostValue::Bool(appended))
    });
    engine.register(CREATE_AUDIO_PLAYER, create);
}
