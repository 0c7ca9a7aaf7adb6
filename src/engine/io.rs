//! Audio file decoding
//!
//! WAV clips are read with hound; everything else (MP3 from the pronunciation
//! and TTS providers) goes through symphonia. All audio is converted to
//! interleaved 32-bit float at the file's native rate and channel count.

use std::fs::File;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::engine::buffer::AudioBuffer;
use crate::error::{FlashtapeError, Result};

/// File extensions accepted as clip sources
pub const CLIP_EXTENSIONS: &[&str] = &["mp3", "wav"];

/// Decode an audio file, picking the decoder from the file extension
///
/// # Errors
/// * `Io` - If the file cannot be opened
/// * `Decode` - If the contents are not valid audio
pub fn decode_file(path: &Path) -> Result<AudioBuffer> {
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));

    if is_wav {
        load_wav(path)
    } else {
        decode_compressed(path)
    }
}

/// Load a WAV file into an AudioBuffer
pub fn load_wav(path: &Path) -> Result<AudioBuffer> {
    let decode_err = |e: hound::Error| match e {
        hound::Error::IoError(io) => FlashtapeError::Io(io),
        other => FlashtapeError::Decode {
            path: path.display().to_string(),
            reason: other.to_string(),
        },
    };

    let reader = WavReader::open(path).map_err(decode_err)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(decode_err)?,
        SampleFormat::Int => {
            let max_val = (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(decode_err)?
        }
    };

    AudioBuffer::new(samples, spec.channels, spec.sample_rate)
}

/// Save an AudioBuffer to a 16-bit WAV file
pub fn save_wav(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    let write_err = |e: hound::Error| match e {
        hound::Error::IoError(io) => FlashtapeError::Export {
            path: path.display().to_string(),
            source: io,
        },
        other => FlashtapeError::Encode {
            reason: other.to_string(),
        },
    };

    let spec = WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(write_err)?;
    for &sample in buffer.samples() {
        let scaled = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
        writer.write_sample(scaled).map_err(write_err)?;
    }
    writer.finalize().map_err(write_err)?;

    Ok(())
}

/// Decode a compressed file (MP3 and friends) with symphonia
fn decode_compressed(path: &Path) -> Result<AudioBuffer> {
    let decode_err = |reason: String| FlashtapeError::Decode {
        path: path.display().to_string(),
        reason,
    };

    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| decode_err(format!("failed to probe format: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decode_err("no audio track found".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(format!("failed to create decoder: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut channels = codec_params.channels.map(|c| c.count() as u16);
    let mut sample_rate = codec_params.sample_rate;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(decode_err(format!("packet read error: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                channels.get_or_insert(spec.channels.count() as u16);
                sample_rate.get_or_insert(spec.rate);

                let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(sample_buf.samples());
            }
            // A corrupt frame in an otherwise valid stream is skipped
            Err(SymphoniaError::DecodeError(e)) => {
                log::debug!("{}: skipping undecodable packet: {}", path.display(), e);
            }
            Err(e) => return Err(decode_err(format!("decode error: {}", e))),
        }
    }

    let channels = channels.ok_or_else(|| decode_err("unknown channel layout".to_string()))?;
    let sample_rate = sample_rate.ok_or_else(|| decode_err("unknown sample rate".to_string()))?;

    AudioBuffer::new(samples, channels, sample_rate).map_err(|e| decode_err(e.to_string()))
}
