//! MP3 export
//!
//! The finished study recording is encoded in one pass with LAME and written
//! next to its destination as a `.part` file, then renamed into place. A
//! failed export never leaves a truncated file at the destination.

use std::fs;
use std::path::{Path, PathBuf};

use mp3lame_encoder::{Bitrate, Builder, DualPcm, FlushNoGap, Quality};

use crate::engine::buffer::AudioBuffer;
use crate::error::{FlashtapeError, Result};

/// Export format configuration
///
/// The output codec is always MP3; only the constant bitrate varies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFormat {
    /// Constant bitrate in kbps (default: 128)
    pub bitrate_kbps: u32,
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat { bitrate_kbps: 128 }
    }
}

impl ExportFormat {
    pub fn new(bitrate_kbps: u32) -> Self {
        ExportFormat { bitrate_kbps }
    }

    /// Small files for speech (96 kbps)
    pub fn voice() -> Self {
        ExportFormat { bitrate_kbps: 96 }
    }

    /// Codec identifier
    pub fn codec(&self) -> &'static str {
        "mp3"
    }

    /// File extension for exported files
    pub fn extension(&self) -> &'static str {
        "mp3"
    }

    fn lame_bitrate(&self) -> Bitrate {
        match self.bitrate_kbps {
            0..=111 => Bitrate::Kbps96,
            112..=127 => Bitrate::Kbps112,
            128..=159 => Bitrate::Kbps128,
            160..=191 => Bitrate::Kbps160,
            192..=223 => Bitrate::Kbps192,
            224..=255 => Bitrate::Kbps224,
            256..=319 => Bitrate::Kbps256,
            _ => Bitrate::Kbps320,
        }
    }
}

/// Encode `buffer` and write it to `path`, replacing any existing file
///
/// The destination directory must already exist.
///
/// # Errors
/// * `Encode` - If LAME rejects the format or fails mid-stream
/// * `Export` - If the file cannot be written
pub fn export(buffer: &AudioBuffer, path: &Path, format: &ExportFormat) -> Result<()> {
    let bytes = encode_mp3(buffer, format)?;

    let part_path = part_path(path);
    let written = fs::write(&part_path, &bytes).and_then(|_| fs::rename(&part_path, path));
    if let Err(source) = written {
        let _ = fs::remove_file(&part_path);
        return Err(FlashtapeError::Export {
            path: path.display().to_string(),
            source,
        });
    }

    log::info!(
        "Exported {:.1}s of audio to {} ({} bytes)",
        buffer.duration_secs(),
        path.display(),
        bytes.len()
    );
    Ok(())
}

/// Encode a buffer to MP3 bytes
///
/// Mono stays mono; anything wider than stereo is down-mixed to stereo.
pub fn encode_mp3(buffer: &AudioBuffer, format: &ExportFormat) -> Result<Vec<u8>> {
    let encode_err = |stage: &str, e: &dyn std::fmt::Debug| FlashtapeError::Encode {
        reason: format!("LAME {} failed: {:?}", stage, e),
    };

    let buffer = if buffer.channels() > 2 {
        buffer.conform(2, buffer.sample_rate())
    } else {
        buffer.clone()
    };

    let mut builder = Builder::new().ok_or_else(|| FlashtapeError::Encode {
        reason: "LAME encoder init failed".to_string(),
    })?;
    builder
        .set_num_channels(buffer.channels() as u8)
        .map_err(|e| encode_err("set channels", &e))?;
    builder
        .set_sample_rate(buffer.sample_rate())
        .map_err(|e| encode_err("set sample rate", &e))?;
    builder
        .set_brate(format.lame_bitrate())
        .map_err(|e| encode_err("set bitrate", &e))?;
    builder
        .set_quality(Quality::Best)
        .map_err(|e| encode_err("set quality", &e))?;
    let mut encoder = builder.build().map_err(|e| encode_err("build", &e))?;

    // LAME expects 16-bit PCM in separate left/right planes
    let to_i16 = |s: f32| (s.clamp(-1.0, 1.0) * 32767.0) as i16;
    let num_frames = buffer.num_frames();
    let (left, right): (Vec<i16>, Vec<i16>) = if buffer.channels() == 2 {
        buffer
            .samples()
            .chunks_exact(2)
            .map(|f| (to_i16(f[0]), to_i16(f[1])))
            .unzip()
    } else {
        let mono: Vec<i16> = buffer.samples().iter().map(|&s| to_i16(s)).collect();
        (mono.clone(), mono)
    };

    let mut mp3_output: Vec<u8> =
        Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(num_frames));
    let input = DualPcm {
        left: &left,
        right: &right,
    };
    let encoded_size = encoder
        .encode(input, mp3_output.spare_capacity_mut())
        .map_err(|e| encode_err("encode", &e))?;
    // SAFETY: encoder wrote encoded_size bytes into spare capacity
    unsafe {
        mp3_output.set_len(encoded_size);
    }

    mp3_output.reserve(7200);
    let flush_size = encoder
        .flush::<FlushNoGap>(mp3_output.spare_capacity_mut())
        .map_err(|e| encode_err("flush", &e))?;
    // SAFETY: encoder wrote flush_size bytes into spare capacity
    unsafe {
        mp3_output.set_len(mp3_output.len() + flush_size);
    }

    Ok(mp3_output)
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_export_format_default() {
        let format = ExportFormat::default();
        assert_eq!(format.bitrate_kbps, 128);
        assert_eq!(format.codec(), "mp3");
        assert!(matches!(format.lame_bitrate(), Bitrate::Kbps128));
        assert!(matches!(ExportFormat::new(500).lame_bitrate(), Bitrate::Kbps320));
        assert!(matches!(ExportFormat::voice().lame_bitrate(), Bitrate::Kbps96));
    }

    #[test]
    fn test_part_path_is_sibling() {
        let part = part_path(Path::new("/out/cards_0-10.mp3"));
        assert_eq!(part, PathBuf::from("/out/cards_0-10.mp3.part"));
    }

    #[test]
    fn test_export_writes_and_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cards.mp3");
        std::fs::write(&path, b"stale").unwrap();

        let tone = AudioBuffer::sine_wave(440.0, 0.5, 1000, 44100);
        export(&tone, &path, &ExportFormat::default()).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.len() > 1000);
        assert_ne!(&bytes[..5], b"stale");
        assert!(!part_path(&path).exists());
    }

    #[test]
    fn test_export_into_missing_directory_fails_cleanly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("cards.mp3");

        let tone = AudioBuffer::sine_wave(440.0, 0.5, 200, 44100);
        let result = export(&tone, &path, &ExportFormat::default());

        assert!(matches!(result, Err(FlashtapeError::Export { .. })));
        assert!(!path.exists());
    }
}
