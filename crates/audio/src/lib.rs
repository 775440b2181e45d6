//! Audio playback for the glucose alarm
//!
//! The rodio output stream is not `Send`, so [`AlarmSound`] keeps it on a
//! dedicated audio thread and drives it through a command channel. The
//! output device is opened before [`AlarmSound::spawn`] returns, so a host
//! without audio is reported to the caller instead of failing silently.

use anyhow::{anyhow, Context, Result};
use glucowatch_types::AlarmSoundConfig;
use rodio::source::SineWave;
use rodio::{Decoder, OutputStream, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, sync_channel, Receiver, Sender};
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::Duration;

/// Common system alert sound paths, tried in order
const SYSTEM_ALERT_PATHS: &[&str] = &[
    // freedesktop sounds (Linux)
    "/usr/share/sounds/freedesktop/stereo/alarm-clock-elapsed.oga",
    "/usr/share/sounds/freedesktop/stereo/complete.oga",
    "/usr/share/sounds/freedesktop/stereo/bell.oga",
    // Ubuntu/GNOME sounds
    "/usr/share/sounds/gnome/default/alerts/glass.ogg",
    // macOS
    "/System/Library/Sounds/Glass.aiff",
    // Windows
    "C:\\Windows\\Media\\Alarm01.wav",
];

/// Fallback tone when no alert sound file can be played
const BEEP_FREQUENCY_HZ: f32 = 880.0;
const BEEP_LENGTH: Duration = Duration::from_millis(400);

/// rodio output owned by the audio thread
struct AlarmOutput {
    // Dropping the stream silences the sink
    _stream: OutputStream,
    sink: Sink,
}

impl AlarmOutput {
    fn open() -> Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().context("Failed to open audio output stream")?;
        let sink = Sink::try_new(&handle).context("Failed to create audio sink")?;
        Ok(Self {
            _stream: stream,
            sink,
        })
    }

    /// Replace whatever plays with the configured alarm sound
    fn start(&self, config: &AlarmSoundConfig) {
        self.sink.stop();
        let queued = match config.custom_sound_path.as_deref() {
            Some(path) => self.queue_file(path, config.loop_sound),
            None => Err(anyhow!("No custom alarm sound")),
        };
        if let Err(e) = queued {
            if config.custom_sound_path.is_some() {
                log::warn!("{:#}, using system alert", e);
            }
            self.queue_system_alert(config.loop_sound);
        }
        self.sink.play();
    }

    fn queue_file(&self, path: &str, looped: bool) -> Result<()> {
        let file =
            File::open(path).with_context(|| format!("Failed to open sound file: {}", path))?;
        let source = Decoder::new(BufReader::new(file))
            .with_context(|| format!("Failed to decode sound file: {}", path))?;
        if looped {
            self.sink.append(source.repeat_infinite());
        } else {
            self.sink.append(source);
        }
        Ok(())
    }

    fn queue_system_alert(&self, looped: bool) {
        let played = SYSTEM_ALERT_PATHS
            .iter()
            .filter(|path| Path::new(path).exists())
            .any(|path| self.queue_file(path, looped).is_ok());
        if !played {
            self.queue_beep(looped);
        }
    }

    fn queue_beep(&self, looped: bool) {
        let tone = SineWave::new(BEEP_FREQUENCY_HZ)
            .take_duration(BEEP_LENGTH)
            .amplify(0.3);
        if looped {
            // A pause of one beep length between beeps
            self.sink.append(tone.delay(BEEP_LENGTH).repeat_infinite());
        } else {
            self.sink.append(tone);
        }
    }

    fn run(self, commands: Receiver<AudioCommand>) {
        while let Ok(command) = commands.recv() {
            match command {
                AudioCommand::Start(config) => {
                    if config.enabled {
                        self.start(&config);
                    }
                }
                AudioCommand::Stop => self.sink.stop(),
                AudioCommand::SetVolume(volume) => self.sink.set_volume(volume.clamp(0.0, 1.0)),
                AudioCommand::Shutdown => break,
            }
        }
        log::debug!("Audio thread exiting");
    }
}

/// Commands for the audio thread
#[derive(Debug, Clone, PartialEq)]
enum AudioCommand {
    Start(AlarmSoundConfig),
    Stop,
    SetVolume(f32),
    Shutdown,
}

/// Handle to the alarm audio loop running on its own thread
pub struct AlarmSound {
    config: AlarmSoundConfig,
    sender: Mutex<Option<Sender<AudioCommand>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    playing: AtomicBool,
    muted: AtomicBool,
    /// Set once a command could not be delivered
    thread_gone: AtomicBool,
}

impl AlarmSound {
    /// Spawn the audio thread and open the default output device.
    ///
    /// Fails when the device cannot be opened.
    pub fn spawn(config: AlarmSoundConfig) -> Result<Self> {
        let (tx, rx) = channel::<AudioCommand>();
        let (ready_tx, ready_rx) = sync_channel::<Result<()>>(1);

        let handle = std::thread::Builder::new()
            .name("alarm-audio".to_string())
            .spawn(move || match AlarmOutput::open() {
                Ok(output) => {
                    let _ = ready_tx.send(Ok(()));
                    output.run(rx);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .context("Failed to spawn audio thread")?;

        let opened = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(anyhow!("Audio thread exited during startup")));
        if let Err(e) = opened {
            let _ = handle.join();
            return Err(e.context("No audio output available"));
        }

        let sound = Self::with_channel(config, tx, Some(handle));
        sound.send(AudioCommand::SetVolume(sound.config.volume));
        Ok(sound)
    }

    fn with_channel(
        config: AlarmSoundConfig,
        sender: Sender<AudioCommand>,
        handle: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            config,
            sender: Mutex::new(Some(sender)),
            handle: Mutex::new(handle),
            playing: AtomicBool::new(false),
            muted: AtomicBool::new(false),
            thread_gone: AtomicBool::new(false),
        }
    }

    fn send(&self, command: AudioCommand) {
        let guard = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        let Some(sender) = guard.as_ref() else {
            return;
        };
        if sender.send(command).is_err() && !self.thread_gone.swap(true, Ordering::SeqCst) {
            log::warn!("Audio thread is not running, alarm sound unavailable");
        }
    }

    /// Start the alarm loop; does nothing if it is already playing
    pub fn play(&self) {
        if self.playing.swap(true, Ordering::SeqCst) {
            return;
        }
        log::info!("Starting alarm sound");
        self.send(AudioCommand::Start(self.config.clone()));
    }

    pub fn stop(&self) {
        if self.playing.swap(false, Ordering::SeqCst) {
            log::info!("Stopping alarm sound");
            self.send(AudioCommand::Stop);
        }
    }

    pub fn mute_volume(&self) {
        self.muted.store(true, Ordering::SeqCst);
        self.send(AudioCommand::SetVolume(0.0));
    }

    pub fn unmute_volume(&self) {
        self.muted.store(false, Ordering::SeqCst);
        self.send(AudioCommand::SetVolume(self.config.volume));
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    /// Stop the audio thread and wait for it
    pub fn shutdown(&self) {
        self.send(AudioCommand::Shutdown);
        self.sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let handle = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.join() {
                log::warn!("Audio thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for AlarmSound {
    fn drop(&mut self) {
        self.shutdown();
    }
}
