// SPDX-License-Identifier: GPL-3.0-or-later

//! Chromaprint fingerprint generation from in-memory audio.
//!
//! The acoustic fallback hands over the full content of the downloaded
//! artifact (WAV by default, MP3 or M4A when the downloader could not convert).
//! The container is probed from the bytes themselves, decoded with symphonia,
//! downmixed to mono 16-bit PCM and truncated before fingerprinting.
//!
//! Everything in here is CPU bound and synchronous; callers on an async
//! runtime should run it on a blocking worker.

use std::io::Cursor;

use chromaprint::Chromaprint;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, instrument};

use crate::{Fingerprint, FingerprintError, Result};

/// Maximum duration to use for fingerprinting (in seconds).
pub const MAX_FINGERPRINT_DURATION_SECS: u32 = 120;

/// Used when the container does not report a sample rate.
const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Mono, 16-bit PCM at a given sample rate.
#[derive(Debug)]
pub(crate) struct AudioSamples {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl AudioSamples {
    fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate: sample_rate.max(1),
        }
    }

    fn max_samples(&self) -> usize {
        (self.sample_rate as usize) * (MAX_FINGERPRINT_DURATION_SECS as usize)
    }

    fn is_full(&self) -> bool {
        self.samples.len() >= self.max_samples()
    }

    fn truncate_to_limit(&mut self) {
        let max = self.max_samples();
        if self.samples.len() > max {
            debug!(
                original_len = self.samples.len(),
                max_samples = max,
                "Truncating audio samples to fingerprint duration limit"
            );
            self.samples.truncate(max);
        }
    }

    /// Whole seconds covered, at least one for any non-empty buffer.
    fn duration_secs(&self) -> u32 {
        if self.samples.is_empty() {
            0
        } else {
            ((self.samples.len() / self.sample_rate as usize) as u32).max(1)
        }
    }
}

/// Fingerprint generator for in-memory audio.
#[derive(Debug, Default, Clone, Copy)]
pub struct FingerprintGenerator;

impl FingerprintGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Decode `audio` and produce its Chromaprint fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError::AudioProcessing`] if the container cannot be
    /// probed, no decodable track exists, no samples come out, or Chromaprint
    /// rejects the input.
    #[instrument(skip_all, fields(bytes = audio.len()))]
    pub fn generate_from_bytes(&self, audio: Vec<u8>) -> Result<Fingerprint> {
        let samples = decode_to_mono(audio)?;
        fingerprint_samples(samples)
    }
}

pub(crate) fn decode_to_mono(audio: Vec<u8>) -> Result<AudioSamples> {
    if audio.is_empty() {
        return Err(FingerprintError::AudioProcessing(
            "audio buffer is empty".to_string(),
        ));
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(audio)), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| FingerprintError::AudioProcessing(format!("Failed to probe audio: {e}")))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| FingerprintError::AudioProcessing("No audio tracks found".to_string()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| {
            FingerprintError::AudioProcessing(format!("Failed to create decoder: {e}"))
        })?;

    let mut mono: Vec<i16> = Vec::new();
    let mut interleaved: Option<SampleBuffer<i16>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => {
                return Err(FingerprintError::AudioProcessing(format!(
                    "Error reading packet: {e}"
                )))
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A corrupt frame is skipped, the rest of the stream is still usable.
            Err(SymphoniaError::DecodeError(reason)) => {
                debug!(reason, "skipping undecodable frame");
                continue;
            }
            Err(e) => {
                return Err(FingerprintError::AudioProcessing(format!(
                    "Failed to decode frame: {e}"
                )))
            }
        };

        let spec = *decoded.spec();
        if spec.rate > 0 {
            sample_rate = spec.rate;
        }
        let channels = spec.channels.count().max(1);

        let needed = decoded.capacity() * channels;
        if interleaved.as_ref().map_or(true, |b| b.capacity() < needed) {
            interleaved = Some(SampleBuffer::<i16>::new(decoded.capacity() as u64, spec));
        }
        let Some(buffer) = interleaved.as_mut() else {
            continue;
        };
        buffer.copy_interleaved_ref(decoded);
        mono.extend(downmix(buffer.samples(), channels));

        if mono.len() >= (sample_rate as usize) * (MAX_FINGERPRINT_DURATION_SECS as usize) {
            break;
        }
    }

    let mut samples = AudioSamples::new(mono, sample_rate);
    if samples.is_full() {
        samples.truncate_to_limit();
    }
    Ok(samples)
}

fn downmix(interleaved: &[i16], channels: usize) -> impl Iterator<Item = i16> + '_ {
    interleaved.chunks(channels).map(move |frame| {
        let sum: i32 = frame.iter().map(|&s| s as i32).sum();
        (sum / frame.len() as i32) as i16
    })
}

fn fingerprint_samples(mut samples: AudioSamples) -> Result<Fingerprint> {
    if samples.samples.is_empty() {
        return Err(FingerprintError::AudioProcessing(
            "No audio samples available".to_string(),
        ));
    }
    samples.truncate_to_limit();

    debug!(
        sample_count = samples.samples.len(),
        duration_secs = samples.duration_secs(),
        sample_rate = samples.sample_rate,
        "Generating fingerprint from audio samples"
    );

    let mut ctx = Chromaprint::new();
    if !ctx.start(samples.sample_rate as i32, 1) {
        return Err(FingerprintError::AudioProcessing(
            "Failed to start Chromaprint".to_string(),
        ));
    }
    if !ctx.feed(&samples.samples) {
        return Err(FingerprintError::AudioProcessing(
            "Failed to feed samples to Chromaprint".to_string(),
        ));
    }
    if !ctx.finish() {
        return Err(FingerprintError::AudioProcessing(
            "Chromaprint finalize failed".to_string(),
        ));
    }

    let hash = ctx.fingerprint().ok_or_else(|| {
        FingerprintError::AudioProcessing("Chromaprint did not return a fingerprint".to_string())
    })?;

    Ok(Fingerprint::new(hash, samples.duration_secs()))
}
