//! Tone-synthesis audio for sound effects and background melody
//!
//! All sounds are generated sine tones; there are no audio assets. Audio
//! is optional - if the output device cannot be opened the game runs
//! silently.

use rodio::source::{SineWave, Source};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::time::Duration;

const SFX_GAIN: f32 = 0.20;
const BGM_GAIN: f32 = 0.08;

/// Sound effect types, one per game event worth hearing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sfx {
    Move,
    Rotate,
    Lock,
    LineClear,
    BombBlast,
    LevelUp,
    GravityWarning,
    GravityShift,
    GameOver,
}

impl Sfx {
    /// Tone sequence as (frequency Hz, duration ms) pairs
    fn notes(self) -> &'static [(f32, u64)] {
        match self {
            Sfx::Move => &[(220.0, 20)],
            Sfx::Rotate => &[(330.0, 25)],
            Sfx::Lock => &[(165.0, 50)],
            Sfx::LineClear => &[(523.0, 60), (659.0, 60), (784.0, 90)],
            Sfx::BombBlast => &[(110.0, 80), (82.0, 120)],
            Sfx::LevelUp => &[(523.0, 70), (659.0, 70), (784.0, 70), (1047.0, 140)],
            Sfx::GravityWarning => &[(440.0, 120), (440.0, 120)],
            Sfx::GravityShift => &[(784.0, 80), (523.0, 80), (349.0, 120)],
            Sfx::GameOver => &[(392.0, 150), (330.0, 150), (262.0, 150), (196.0, 300)],
        }
    }
}

/// A short loopable melody, same (frequency, duration) encoding
const MELODY: &[(f32, u64)] = &[
    (330.0, 250),
    (262.0, 125),
    (294.0, 125),
    (330.0, 250),
    (294.0, 125),
    (262.0, 125),
    (220.0, 250),
    (220.0, 125),
    (262.0, 125),
    (330.0, 250),
    (294.0, 125),
    (262.0, 125),
    (247.0, 375),
    (262.0, 125),
    (294.0, 250),
    (330.0, 250),
    (262.0, 250),
    (220.0, 250),
    (220.0, 500),
];

/// Audio manager handles all sound playback
pub struct AudioManager {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    bgm_sink: Option<Sink>,
    sound_enabled: bool,
    music_enabled: bool,
}

impl AudioManager {
    /// Create a new audio manager; None if no output device is available
    pub fn new(sound_enabled: bool, music_enabled: bool) -> Option<Self> {
        let (stream, stream_handle) = OutputStream::try_default().ok()?;
        Some(Self {
            _stream: stream,
            stream_handle,
            bgm_sink: None,
            sound_enabled,
            music_enabled,
        })
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
    }

    pub fn set_music_enabled(&mut self, enabled: bool) {
        self.music_enabled = enabled;
        if !enabled {
            if let Some(sink) = self.bgm_sink.take() {
                sink.stop();
            }
        }
    }

    /// Play a sound effect on a detached sink
    pub fn play(&self, sfx: Sfx) {
        if !self.sound_enabled {
            return;
        }
        let Ok(sink) = Sink::try_new(&self.stream_handle) else {
            return;
        };
        for &(freq, ms) in sfx.notes() {
            sink.append(
                SineWave::new(freq)
                    .take_duration(Duration::from_millis(ms))
                    .amplify(SFX_GAIN),
            );
        }
        sink.detach();
    }

    /// Keep the melody looping; call once per frame
    pub fn update(&mut self) {
        if !self.music_enabled {
            return;
        }
        let needs_refill = self.bgm_sink.as_ref().is_none_or(Sink::empty);
        if !needs_refill {
            return;
        }
        if self.bgm_sink.is_none() {
            self.bgm_sink = Sink::try_new(&self.stream_handle).ok();
        }
        if let Some(sink) = &self.bgm_sink {
            for &(freq, ms) in MELODY {
                sink.append(
                    SineWave::new(freq)
                        .take_duration(Duration::from_millis(ms))
                        .amplify(BGM_GAIN),
                );
            }
        }
    }
}
