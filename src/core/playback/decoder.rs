//! core/playback/decoder.rs
//! Audio decoding utilities (Symphonia) -> rodio::Source.
//!
//! Streams are fully downloaded before decoding, so every source reads from
//! an in-memory `Cursor` and can be reopened at any offset.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rodio::Source;

use symphonia::core::audio::{AudioBufferRef, SampleBuffer, Signal, SignalSpec};
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::{Hint, ProbeResult};
use symphonia::core::units::{Time, TimeBase};

use crate::core::error::PlaybackError;

/// How many recent samples the visualizer tap keeps.
pub const TAP_CAPACITY: usize = 2048;

/// Rolling window of the most recently decoded samples (interleaved).
#[derive(Clone, Default)]
pub struct SampleTap {
    samples: Arc<Mutex<VecDeque<f32>>>,
}

impl SampleTap {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, chunk: &[f32]) {
        let mut buf = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        let chunk = if chunk.len() > TAP_CAPACITY {
            &chunk[chunk.len() - TAP_CAPACITY..]
        } else {
            chunk
        };
        let overflow = (buf.len() + chunk.len()).saturating_sub(TAP_CAPACITY);
        buf.drain(..overflow);
        buf.extend(chunk.iter().copied());
    }

    pub fn snapshot(&self) -> Vec<f32> {
        let buf = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        buf.iter().copied().collect()
    }

    pub fn clear(&self) {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

fn probe(bytes: &Arc<[u8]>, hint_ext: Option<&str>) -> Result<ProbeResult, PlaybackError> {
    let cursor = Cursor::new(bytes.clone());
    let mss = MediaSourceStream::new(Box::new(cursor), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = hint_ext {
        hint.with_extension(ext);
    }

    symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| PlaybackError::Decode(format!("format probe failed: {e}")))
}

/// Total duration in ms, if the container declares it.
pub fn probe_duration_ms(bytes: &Arc<[u8]>, hint_ext: Option<&str>) -> Option<u64> {
    let probed = probe(bytes, hint_ext).ok()?;
    let track = probed.format.default_track()?;
    duration_from_params(track.codec_params.time_base, track.codec_params.n_frames)
}

/// Construct a new seekable rodio Source over `bytes`, starting at `start_ms`.
pub fn open_source_at_ms(
    bytes: &Arc<[u8]>,
    hint_ext: Option<&str>,
    start_ms: u64,
    tap: SampleTap,
) -> Result<SymphoniaSource, PlaybackError> {
    let probed = probe(bytes, hint_ext)?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| PlaybackError::Decode("no supported audio track found".into()))?;

    let track_id = track.id;

    // Clone codec params so we can seek (mutable borrow of format) without borrow conflicts.
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| PlaybackError::Decode(format!("decoder init failed: {e}")))?;

    if start_ms > 0 {
        let time = Time::from(Duration::from_millis(start_ms));
        let seek_to = SeekTo::Time {
            time,
            track_id: Some(track_id),
        };

        format
            .seek(SeekMode::Accurate, seek_to)
            .map_err(|e| PlaybackError::Decode(format!("seek failed: {e}")))?;

        // Decoder state is stale after a seek; rebuild it.
        decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| PlaybackError::Decode(format!("decoder re-init failed: {e}")))?;
    }

    Ok(SymphoniaSource::new(format, decoder, track_id, tap))
}

fn duration_from_params(time_base: Option<TimeBase>, n_frames: Option<u64>) -> Option<u64> {
    let tb = time_base?;
    let frames = n_frames?;

    let t = tb.calc_time(frames);
    // Time is { seconds: u64, frac: f64 } in symphonia 0.5.x.
    let ms = (t.seconds as f64 * 1000.0) + (t.frac * 1000.0);
    Some(ms.round() as u64)
}

/// A streaming rodio Source backed by Symphonia.
pub struct SymphoniaSource {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    tap: SampleTap,

    // Output format for rodio
    sample_rate: u32,
    channels: u16,

    // Interleaved f32 samples ready to be yielded
    out: Vec<f32>,
    out_pos: usize,

    ended: bool,
}

impl SymphoniaSource {
    fn new(
        format: Box<dyn FormatReader>,
        decoder: Box<dyn Decoder>,
        track_id: u32,
        tap: SampleTap,
    ) -> Self {
        let mut this = Self {
            format,
            decoder,
            track_id,
            tap,
            sample_rate: 44100,
            channels: 2,
            out: Vec::new(),
            out_pos: 0,
            ended: false,
        };

        // Prime once so sample_rate/channels become correct ASAP.
        if let Err(e) = this.fill_out_buffer() {
            tracing::warn!("first packet failed to decode: {e}");
        }

        this
    }

    fn fill_out_buffer(&mut self) -> Result<(), PlaybackError> {
        if self.ended {
            return Ok(());
        }

        self.out.clear();
        self.out_pos = 0;

        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(_)) => {
                    self.ended = true;
                    return Ok(());
                }
                Err(SymphoniaError::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(e) => return Err(PlaybackError::Decode(format!("read error: {e}"))),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::IoError(_)) => {
                    self.ended = true;
                    return Ok(());
                }
                // Corrupt packet; skip.
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(SymphoniaError::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(e) => return Err(PlaybackError::Decode(e.to_string())),
            };

            match decoded {
                AudioBufferRef::F32(buf) => {
                    self.sample_rate = buf.spec().rate;
                    self.channels = buf.spec().channels.count() as u16;

                    let frames = buf.frames();
                    let chans = buf.spec().channels.count();

                    self.out.reserve(frames * chans);
                    for f in 0..frames {
                        for c in 0..chans {
                            self.out.push(buf.chan(c)[f]);
                        }
                    }
                }
                other => {
                    let spec = SignalSpec::new(other.spec().rate, other.spec().channels);
                    self.sample_rate = spec.rate;
                    self.channels = spec.channels.count() as u16;

                    let frames = other.frames();
                    let chans = spec.channels.count();

                    let mut sbuf = SampleBuffer::<f32>::new(frames as u64, spec);
                    sbuf.copy_interleaved_ref(other);

                    self.out.reserve(frames * chans);
                    self.out.extend_from_slice(sbuf.samples());
                }
            }

            self.tap.push(&self.out);
            return Ok(());
        }
    }
}

impl Iterator for SymphoniaSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.out_pos >= self.out.len() {
            if self.ended {
                return None;
            }
            if let Err(e) = self.fill_out_buffer() {
                tracing::warn!("decode stopped: {e}");
                self.ended = true;
                return None;
            }
            if self.out.is_empty() && self.ended {
                return None;
            }
        }

        let s = self.out.get(self.out_pos).copied();
        self.out_pos += 1;
        s
    }
}

impl Source for SymphoniaSource {
    // rodio 0.21 uses current_span_len (not current_frame_len).
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_keeps_only_the_newest_window() {
        let tap = SampleTap::new();
        let first: Vec<f32> = (0..TAP_CAPACITY).map(|i| i as f32).collect();
        tap.push(&first);
        tap.push(&[-1.0, -2.0]);

        let snap = tap.snapshot();
        assert_eq!(snap.len(), TAP_CAPACITY);
        assert_eq!(snap[0], 2.0);
        assert_eq!(&snap[TAP_CAPACITY - 2..], &[-1.0, -2.0]);
    }

    #[test]
    fn oversized_chunk_is_trimmed_to_capacity() {
        let tap = SampleTap::new();
        let big: Vec<f32> = (0..TAP_CAPACITY * 2).map(|i| i as f32).collect();
        tap.push(&big);
        let snap = tap.snapshot();
        assert_eq!(snap.len(), TAP_CAPACITY);
        assert_eq!(snap[0], TAP_CAPACITY as f32);
    }

    #[test]
    fn garbage_bytes_fail_to_probe() {
        let bytes: Arc<[u8]> = Arc::from(&b"definitely not audio"[..]);
        assert!(probe_duration_ms(&bytes, Some("mp3")).is_none());
        assert!(matches!(
            open_source_at_ms(&bytes, Some("mp3"), 0, SampleTap::new()),
            Err(PlaybackError::Decode(_))
        ));
    }

    #[test]
    fn duration_from_time_base() {
        let tb = TimeBase::new(1, 44_100);
        assert_eq!(duration_from_params(Some(tb), Some(88_200)), Some(2000));
        assert_eq!(duration_from_params(None, Some(1)), None);
    }
}
