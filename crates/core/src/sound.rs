//! Sound player trait and implementations

use glucowatch_audio::AlarmSound;
use std::sync::atomic::{AtomicBool, Ordering};

/// Starts/stops/mutes the alarm audio loop
pub trait SoundPlayer: Send + Sync {
    fn play(&self);
    fn stop(&self);
    fn mute_volume(&self);
    fn unmute_volume(&self);
}

impl SoundPlayer for AlarmSound {
    fn play(&self) {
        AlarmSound::play(self)
    }

    fn stop(&self) {
        AlarmSound::stop(self)
    }

    fn mute_volume(&self) {
        AlarmSound::mute_volume(self)
    }

    fn unmute_volume(&self) {
        AlarmSound::unmute_volume(self)
    }
}

/// Player used when sound is disabled or no output device exists; it only
/// logs what would have been played
#[derive(Debug, Default)]
pub struct SilentSound {
    playing: AtomicBool,
}

impl SoundPlayer for SilentSound {
    fn play(&self) {
        if !self.playing.swap(true, Ordering::SeqCst) {
            log::warn!("ALARM (sound disabled)");
        }
    }

    fn stop(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }

    fn mute_volume(&self) {
        log::debug!("Mute requested on silent player");
    }

    fn unmute_volume(&self) {
        log::debug!("Unmute requested on silent player");
    }
}
