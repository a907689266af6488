use std::{
    f32::consts::PI,
    fmt,
    fs::File,
    io::BufReader,
    path::PathBuf,
};

use rodio::{buffer::SamplesBuffer, Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("couldn't open audio output: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("couldn't start playback: {0}")]
    Play(#[from] rodio::PlayError),
    #[error("couldn't decode alarm sound: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
    #[error("couldn't open alarm sound: {0}")]
    Io(#[from] std::io::Error),
}

/// what the alarm rings with
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AlarmSound {
    /// generated beeping, needs no files
    #[default]
    Beep,
    Custom(PathBuf),
}

impl From<Option<PathBuf>> for AlarmSound {
    fn from(path: Option<PathBuf>) -> Self {
        path.map_or(Self::Beep, Self::Custom)
    }
}

impl fmt::Display for AlarmSound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Beep => f.write_str("beep"),
            Self::Custom(path) => write!(
                f,
                "{}",
                path.file_name()
                    .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy())
            ),
        }
    }
}

/// what the next player should sound like
/// shared between the gui and the trigger handler thread
#[derive(Debug, Clone, PartialEq)]
pub struct SoundSettings {
    pub sound: AlarmSound,
    /// 0 to 100
    pub volume: f32,
}

impl SoundSettings {
    pub fn open_player(&self) -> Result<RodioPlayer, AudioError> {
        RodioPlayer::open(&self.sound, self.volume)
    }
}

/// the bits of playback the trigger handler cares about
pub trait Player {
    fn play(&mut self);
    fn is_playing(&self) -> bool;
    fn stop(&mut self);
    /// give the audio device back
    fn release(self)
    where
        Self: Sized;
}

const SAMPLE_RATE: u32 = 44_100;

/// 880 Hz for 400ms then 200ms of silence
#[allow(clippy::cast_precision_loss)]
fn beep_samples() -> Vec<f32> {
    let tone = SAMPLE_RATE as usize * 400 / 1000;
    let silence = SAMPLE_RATE as usize * 200 / 1000;
    (0..tone)
        .map(|i| (i as f32 / SAMPLE_RATE as f32 * 880.0 * 2.0 * PI).sin() * 0.3)
        .chain(std::iter::repeat(0.0).take(silence))
        .collect()
}

/// looping alarm sound on the default output device
pub struct RodioPlayer {
    // dropping the stream silences the sink
    _stream: OutputStream,
    _handle: OutputStreamHandle,
    sink: Sink,
}

impl fmt::Debug for RodioPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RodioPlayer")
            .field("paused", &self.sink.is_paused())
            .field("empty", &self.sink.empty())
            .finish_non_exhaustive()
    }
}

impl RodioPlayer {
    /// queues the sound on repeat but leaves it paused until [`Player::play`]
    pub fn open(sound: &AlarmSound, volume: f32) -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&handle)?;
        sink.pause();
        sink.set_volume(volume / 100.0);
        match sound {
            AlarmSound::Beep => {
                sink.append(SamplesBuffer::new(1, SAMPLE_RATE, beep_samples()).repeat_infinite());
            }
            AlarmSound::Custom(path) => {
                let file = BufReader::new(File::open(path)?);
                sink.append(Decoder::new(file)?.repeat_infinite());
            }
        }
        log::debug!("opened alarm sound {sound} at volume {volume}");
        Ok(Self {
            _stream: stream,
            _handle: handle,
            sink,
        })
    }
}

impl Player for RodioPlayer {
    fn play(&mut self) {
        self.sink.play();
    }

    fn is_playing(&self) -> bool {
        !self.sink.is_paused() && !self.sink.empty()
    }

    fn stop(&mut self) {
        self.sink.stop();
    }

    fn release(self) {
        self.sink.stop();
        drop(self);
    }
}
