//! core/playback/backend.rs
//! Media backend seam.
//!
//! The engine drives one `AudioBackend`: bind a source, start/pause/stop it,
//! reposition it, and read back where it is. `RodioBackend` is the real one.
//! It owns:
//! - OutputStream (must stay alive)
//! - Sink (per play-through of the bound media)
//! - the downloaded bytes, so stop -> play can rebuild the source

use rodio::{OutputStream, OutputStreamBuilder, Sink};

use super::decoder::{SampleTap, open_source_at_ms, probe_duration_ms};
use crate::core::error::PlaybackError;
use crate::core::remote::MediaSource;

pub trait AudioBackend {
    /// Bind `media` as the current source. Stops whatever was playing.
    fn open(&mut self, media: MediaSource, hint_ext: Option<&str>) -> Result<(), PlaybackError>;

    /// Start from the beginning (after open/stop) or resume after pause.
    fn play(&mut self) -> Result<(), PlaybackError>;

    fn pause(&mut self);

    fn stop(&mut self);

    /// Reposition to a fraction of the track length.
    fn seek(&mut self, position: f32) -> Result<(), PlaybackError>;

    /// 0.0..=1.0
    fn set_volume(&mut self, volume: f32);

    /// Normalized position, 0.0 when nothing is bound or the length is unknown.
    fn position(&self) -> f32;

    /// Track length in ms, 0 if unknown.
    fn length_ms(&self) -> u64;

    /// True once an active play-through has drained all its samples.
    fn finished(&self) -> bool {
        false
    }
}

pub struct RodioBackend {
    // Keep this alive for the lifetime of the backend!
    stream: OutputStream,

    sink: Option<Sink>,
    media: Option<MediaSource>,
    hint_ext: Option<String>,
    length_ms: Option<u64>,

    /// Offset the current sink started from (rodio's get_pos restarts at 0 per source).
    base_ms: u64,
    volume: f32,
    tap: SampleTap,
}

impl RodioBackend {
    pub fn new(tap: SampleTap) -> Result<Self, PlaybackError> {
        // rodio 0.21.x: build/open the default output stream via OutputStreamBuilder
        let stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| PlaybackError::Output(e.to_string()))?;

        Ok(Self {
            stream,
            sink: None,
            media: None,
            hint_ext: None,
            length_ms: None,
            base_ms: 0,
            volume: 1.0,
            tap,
        })
    }

    fn start_sink_at(&mut self, start_ms: u64, paused: bool) -> Result<(), PlaybackError> {
        let media = self.media.as_ref().ok_or(PlaybackError::NoMedia)?;

        let source = open_source_at_ms(
            &media.bytes,
            self.hint_ext.as_deref(),
            start_ms,
            self.tap.clone(),
        )?;

        if let Some(old) = self.sink.take() {
            old.stop();
        }

        // rodio 0.21.x: Sink is created from the stream's mixer
        let sink = Sink::connect_new(self.stream.mixer());
        sink.set_volume(self.volume);
        if paused {
            sink.pause();
        }
        sink.append(source);

        self.base_ms = start_ms;
        self.sink = Some(sink);
        Ok(())
    }
}

impl AudioBackend for RodioBackend {
    fn open(&mut self, media: MediaSource, hint_ext: Option<&str>) -> Result<(), PlaybackError> {
        self.stop();

        self.length_ms = probe_duration_ms(&media.bytes, hint_ext);
        self.hint_ext = hint_ext.map(str::to_owned);
        self.media = Some(media);
        self.tap.clear();

        tracing::debug!(length_ms = ?self.length_ms, "media bound");
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        match &self.sink {
            Some(sink) => {
                sink.play();
                Ok(())
            }
            None => self.start_sink_at(0, false),
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.base_ms = 0;
    }

    fn seek(&mut self, position: f32) -> Result<(), PlaybackError> {
        let Some(len) = self.length_ms else {
            return Err(PlaybackError::Decode("track length unknown; cannot seek".into()));
        };

        let mut target_ms = (position as f64 * len as f64).round() as u64;
        // Seeking to *exactly* the end tends to produce EOF weirdness; clamp slightly.
        if target_ms >= len {
            target_ms = len.saturating_sub(1);
        }

        let paused = self.sink.as_ref().map(|s| s.is_paused()).unwrap_or(true);
        self.start_sink_at(target_ms, paused)
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    fn position(&self) -> f32 {
        let (Some(sink), Some(len)) = (&self.sink, self.length_ms) else {
            return 0.0;
        };
        if len == 0 {
            return 0.0;
        }
        let pos_ms = self.base_ms + sink.get_pos().as_millis() as u64;
        (pos_ms as f64 / len as f64).clamp(0.0, 1.0) as f32
    }

    fn length_ms(&self) -> u64 {
        self.length_ms.unwrap_or(0)
    }

    fn finished(&self) -> bool {
        self.sink
            .as_ref()
            .map(|s| s.empty() && !s.is_paused())
            .unwrap_or(false)
    }
}
