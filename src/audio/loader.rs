use std::fs::File;
use std::path::Path;

use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::audio::types::AudioData;
use crate::error::{AudioError, Result};

/// Audio file loader supporting multiple formats
pub struct AudioLoader;

impl AudioLoader {
    /// Load an audio file as mono samples at its native sample rate
    pub fn load<P: AsRef<Path>>(path: P) -> Result<AudioData> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "wav" => Self::load_wav(path),
            "mp3" | "flac" | "ogg" | "m4a" | "aac" => Self::load_with_symphonia(path),
            _ => Err(AudioError::UnsupportedFormat { format: extension }.into()),
        }
    }

    /// Load WAV files using the hound crate (most reliable for WAV)
    fn load_wav(path: &Path) -> Result<AudioData> {
        let reader = hound::WavReader::open(path)
            .map_err(|_| AudioError::LoadFailed {
                path: path.display().to_string()
            })?;

        let spec = reader.spec();
        let sample_rate = spec.sample_rate;
        let channels = spec.channels;

        // Convert samples to f32
        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => {
                reader.into_samples::<f32>()
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|e| AudioError::DecodeFailed {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    })?
            }
            hound::SampleFormat::Int => {
                let bit_depth = spec.bits_per_sample;
                let samples: std::result::Result<Vec<i32>, _> = reader.into_samples().collect();

                samples
                    .map_err(|e| AudioError::DecodeFailed {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    })?
                    .into_iter()
                    .map(|sample| Self::int_to_float(sample, bit_depth))
                    .collect()
            }
        };

        debug!(
            "Decoded {} ({} Hz, {} ch, {} frames)",
            path.display(),
            sample_rate,
            channels,
            interleaved.len() / channels.max(1) as usize
        );

        Ok(AudioData::from_interleaved(
            interleaved,
            channels,
            sample_rate,
            path.to_path_buf(),
        ))
    }

    /// Load various formats using Symphonia
    fn load_with_symphonia(path: &Path) -> Result<AudioData> {
        let file = File::open(path)
            .map_err(|_| AudioError::LoadFailed {
                path: path.display().to_string()
            })?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Probe hint from the file extension
        let mut hint = Hint::new();
        if let Some(extension) = path.extension() {
            if let Some(extension_str) = extension.to_str() {
                hint.with_extension(extension_str);
            }
        }

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &fmt_opts, &meta_opts)
            .map_err(|e| AudioError::DecodeFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut format = probed.format;

        // Find the first audio track with a known (decodable) codec
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::NoAudioTrack {
                path: path.display().to_string()
            })?;

        let track_id = track.id;

        let codec_params = &track.codec_params;
        let sample_rate = codec_params.sample_rate
            .ok_or_else(|| AudioError::DecodeFailed {
                path: path.display().to_string(),
                reason: "no sample rate in codec parameters".to_string(),
            })?;

        let channels = codec_params.channels
            .ok_or_else(|| AudioError::DecodeFailed {
                path: path.display().to_string(),
                reason: "no channel information in codec parameters".to_string(),
            })?
            .count() as u16;

        let dec_opts: DecoderOptions = Default::default();
        let mut decoder = symphonia::default::get_codecs()
            .make(codec_params, &dec_opts)
            .map_err(|e| AudioError::DecodeFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        // Decode all packets and collect interleaved samples
        let mut interleaved = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(SymphoniaError::IoError(_)) => break, // End of stream
                Err(_) => break,
            };

            // Consume any new metadata
            while !format.metadata().is_latest() {
                format.metadata().pop();
            }

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    Self::convert_audio_buffer_to_f32(&decoded, &mut interleaved);
                }
                Err(SymphoniaError::IoError(_)) => break,
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(_) => break,
            }
        }

        debug!(
            "Decoded {} ({} Hz, {} ch, {} frames)",
            path.display(),
            sample_rate,
            channels,
            interleaved.len() / channels.max(1) as usize
        );

        Ok(AudioData::from_interleaved(
            interleaved,
            channels,
            sample_rate,
            path.to_path_buf(),
        ))
    }

    /// Convert integer sample to float (-1.0 to 1.0)
    fn int_to_float(sample: i32, bit_depth: u16) -> f32 {
        match bit_depth {
            8 => (sample as f32 - 128.0) / 128.0,
            16 => sample as f32 / 32768.0,
            24 => sample as f32 / 8388608.0,
            32 => sample as f32 / 2147483648.0,
            _ => sample as f32 / 32768.0, // Default to 16-bit
        }
    }

    /// Convert Symphonia audio buffer to interleaved f32 samples
    fn convert_audio_buffer_to_f32(buffer: &AudioBufferRef, output: &mut Vec<f32>) {
        match buffer {
            AudioBufferRef::F32(buf) => {
                let channels = buf.spec().channels.count();
                let frames = buf.frames();

                for frame_idx in 0..frames {
                    for ch in 0..channels {
                        output.push(buf.chan(ch)[frame_idx]);
                    }
                }
            }
            AudioBufferRef::F64(buf) => {
                let channels = buf.spec().channels.count();
                let frames = buf.frames();

                for frame_idx in 0..frames {
                    for ch in 0..channels {
                        output.push(buf.chan(ch)[frame_idx] as f32);
                    }
                }
            }
            AudioBufferRef::S32(buf) => {
                let channels = buf.spec().channels.count();
                let frames = buf.frames();

                for frame_idx in 0..frames {
                    for ch in 0..channels {
                        output.push(buf.chan(ch)[frame_idx] as f32 / 2147483648.0);
                    }
                }
            }
            AudioBufferRef::S16(buf) => {
                let channels = buf.spec().channels.count();
                let frames = buf.frames();

                for frame_idx in 0..frames {
                    for ch in 0..channels {
                        output.push(buf.chan(ch)[frame_idx] as f32 / 32768.0);
                    }
                }
            }
            _ => {
                tracing::warn!("Unsupported audio buffer format, skipping packet");
            }
        }
    }

    /// Detect audio format from file extension
    pub fn detect_format<P: AsRef<Path>>(path: P) -> Option<String> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }

    /// Check if a file format is supported
    pub fn is_format_supported(extension: &str) -> bool {
        matches!(
            extension.to_lowercase().as_str(),
            "wav" | "mp3" | "flac" | "ogg" | "m4a" | "aac"
        )
    }
}
