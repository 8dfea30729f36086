// audio.rs — looping background music started when the visitor enters

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },
    #[error("no audio output: {0}")]
    Output(#[from] rodio::StreamError),
    #[error("cannot create sink: {0}")]
    Sink(#[from] rodio::PlayError),
}

fn open_track(path: &Path) -> Result<Decoder<BufReader<File>>, AudioError> {
    let file = File::open(path).map_err(|source| AudioError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Decoder::new(BufReader::new(file)).map_err(|source| AudioError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Relative paths are looked up next to the executable first, then in the working dir.
fn resolve(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join(path);
            if p.exists() {
                return p;
            }
        }
    }
    path.to_path_buf()
}

/// Keeps the output stream alive for as long as the music should play.
pub struct BackgroundMusic {
    _stream: OutputStream,
    _handle: OutputStreamHandle,
    sink: Sink,
    volume: f32,
    muted: bool,
}

impl BackgroundMusic {
    /// Decodes `path` and starts it looping at `volume`.
    pub fn start(path: &Path, volume: f32) -> Result<Self, AudioError> {
        let path = resolve(path);
        // Decode first so a missing track never opens the device.
        let track = open_track(&path)?;
        let (stream, handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&handle)?;
        sink.set_volume(volume);
        sink.append(track.repeat_infinite());
        log::info!("music {} at volume {:.2}", path.display(), volume);

        Ok(Self {
            _stream: stream,
            _handle: handle,
            sink,
            volume,
            muted: false,
        })
    }

    pub fn set_muted(&mut self, muted: bool) {
        if self.muted != muted {
            self.muted = muted;
            self.sink.set_volume(if muted { 0.0 } else { self.volume });
        }
    }
}
