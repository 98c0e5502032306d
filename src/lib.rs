// Wavfile -- A RIFF/WAVE chunk codec in Rust
// Copyright (C) 2026 The wavfile developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Wavfile, a chunk-level reader and writer for RIFF/WAVE files.
//!
//! A wav file is a RIFF container holding a `fmt ` chunk that describes the
//! audio, a `data` chunk with interleaved samples, and optionally a
//! `LIST/INFO` chunk with textual metadata. This crate reads and writes those
//! chunks directly, for integer samples of any width from 8 to 64 bits and
//! for 32 or 64-bit IEEE float samples.
//!
//! Examples
//! ========
//!
//! The following example writes five stereo frames of 16-bit audio and reads
//! them back.
//!
//! ```
//! use std::io::Cursor;
//! use wavfile::{WavReader, WavSpec, WavWriter};
//!
//! let spec = WavSpec {
//!     sample_rate: 48000,
//!     bits_per_sample: 16,
//!     ..WavSpec::default()
//! };
//! let frames = vec![vec![0, 0], vec![256, 512], vec![512, 256], vec![-256, -512]];
//!
//! let mut buffer = Cursor::new(Vec::new());
//! let mut writer = WavWriter::new(&mut buffer, spec).unwrap();
//! writer.write_int(&frames).unwrap();
//! writer.finalize().unwrap();
//!
//! buffer.set_position(0);
//! let mut reader = WavReader::new(&mut buffer).unwrap();
//! assert_eq!(reader.channels(), 2);
//! assert_eq!(reader.num_frames(), 4);
//! assert_eq!(reader.read_int(None).unwrap(), frames);
//! ```
//!
//! Headers are patched when the writer is finalized. A writer that is dropped
//! without calling `finalize` leaves a file whose chunk sizes are stale.

#![warn(missing_docs)]

use std::io;

mod chunk;
mod data;
mod fmt;
mod list;
mod read;
mod write;

pub mod shortcut;

pub use chunk::{Chunk, ChunkId, RiffChunk};
pub use data::{DataChunk, Sample, SampleCodec, Whence};
pub use fmt::FormatChunk;
pub use list::{InfoItem, InfoValue, ListChunk, Metadata};
pub use read::{read_chunks, Block, Blocks, ReadExt, WavReader};
pub use write::{WavWriter, WriteExt};

/// The error type for operations on `WavReader`, `WavWriter` and the chunks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An IO error occurred in the underlying reader or writer.
    ///
    /// A file that ends before a field could be read completely surfaces as
    /// an error of kind `UnexpectedEof`.
    #[error(transparent)]
    IoError(#[from] io::Error),
    /// Ill-formed input or an invalid argument.
    #[error("Ill-formed WAVE data or argument: {0}")]
    FormatError(&'static str),
    /// The structure of the file was violated while parsing it.
    #[error("Cannot read WAVE file: {0}")]
    ReadError(&'static str),
    /// The writer was used in a way that would produce an invalid file.
    #[error("Cannot write WAVE file: {0}")]
    WriteError(&'static str),
    /// The audio format of the file is not supported.
    #[error("The wave format of the file is not supported.")]
    Unsupported,
}

/// A type for results generated by wavfile where the error type is hard-wired.
pub type Result<T> = std::result::Result<T, Error>;

/// The audio format code stored in the `fmt ` chunk.
///
/// When reading, the format of a file is always `Pcm` or `IeeeFloat`: for
/// extensible files the format nested in the sub-format tag is reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WavFormat {
    /// Integer samples, `WAVE_FORMAT_PCM`.
    #[default]
    Pcm,
    /// Floating point samples, `WAVE_FORMAT_IEEE_FLOAT`.
    IeeeFloat,
    /// Integer samples in a `WAVE_FORMAT_EXTENSIBLE` chunk.
    Extensible,
}

impl WavFormat {
    /// The 16-bit format code as stored in the file.
    pub fn code(self) -> u16 {
        match self {
            WavFormat::Pcm => fmt::PCM,
            WavFormat::IeeeFloat => fmt::IEEE_FLOAT,
            WavFormat::Extensible => fmt::EXTENSIBLE,
        }
    }
}

/// Specifies the properties of a file to write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WavSpec {
    /// The number of samples per second.
    pub sample_rate: u32,

    /// The number of channels.
    ///
    /// When `None`, the channel count is taken from the first block of frames
    /// that is written.
    pub channels: Option<u16>,

    /// The number of bits per sample, a multiple of 8 between 8 and 64.
    ///
    /// 8-bit samples are stored unsigned, wider samples are signed.
    pub bits_per_sample: u16,

    /// Whether samples are stored as integers or IEEE floats.
    pub format: WavFormat,

    /// Always write a `WAVE_FORMAT_EXTENSIBLE` format chunk.
    ///
    /// The extensible chunk is also used without this flag when there are
    /// more than 16 bits per sample or more than two channels.
    pub extensible: bool,
}

impl Default for WavSpec {
    fn default() -> WavSpec {
        WavSpec {
            sample_rate: 44100,
            channels: None,
            bits_per_sample: 16,
            format: WavFormat::Pcm,
            extensible: false,
        }
    }
}

impl WavSpec {
    /// Checks that a file with these properties can be written.
    pub fn validate(&self) -> Result<()> {
        let bits = self.bits_per_sample;
        if bits < 8 || bits > 64 || bits % 8 != 0 {
            return Err(Error::WriteError("bits per sample must be a multiple of 8 between 8 and 64"));
        }
        if self.sample_rate == 0 {
            return Err(Error::WriteError("sample rate must be positive"));
        }
        if self.channels == Some(0) {
            return Err(Error::WriteError("channel count must be positive"));
        }
        if self.format == WavFormat::IeeeFloat && bits != 32 && bits != 64 {
            return Err(Error::WriteError("IEEE float samples must be 32 or 64 bits wide"));
        }
        Ok(())
    }

    /// Whether the extensible format chunk will be written for this spec.
    pub fn needs_extensible(&self) -> bool {
        self.extensible
            || self.format == WavFormat::Extensible
            || self.bits_per_sample > 16
            || self.channels.map_or(false, |n| n > 2)
    }
}

/// A block of interleaved audio frames, one row per frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Frames {
    /// Integer samples.
    Int(Vec<Vec<i64>>),
    /// Floating point samples.
    Float(Vec<Vec<f64>>),
}

impl Frames {
    /// The number of frames (rows).
    pub fn len(&self) -> usize {
        match *self {
            Frames::Int(ref rows) => rows.len(),
            Frames::Float(ref rows) => rows.len(),
        }
    }

    /// Whether the block holds no frames.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of samples in the first frame, or 0 for an empty block.
    pub fn channels(&self) -> usize {
        match *self {
            Frames::Int(ref rows) => rows.first().map_or(0, Vec::len),
            Frames::Float(ref rows) => rows.first().map_or(0, Vec::len),
        }
    }

    /// The largest absolute sample value in the block.
    pub fn max_abs(&self) -> f64 {
        match *self {
            Frames::Int(ref rows) => rows.iter().flatten()
                .map(|&x| (x as f64).abs())
                .fold(0.0, f64::max),
            Frames::Float(ref rows) => rows.iter().flatten()
                .map(|x| x.abs())
                .fold(0.0, f64::max),
        }
    }

    /// Whether `WavWriter::write` treats the block as float samples.
    ///
    /// Float blocks are float. Integer blocks are treated as float too when
    /// no sample exceeds 1 in magnitude, so an all-zero or all-unity integer
    /// block is ambiguous. Use `write_int` or `write_float` to be explicit.
    pub fn looks_like_float(&self) -> bool {
        match *self {
            Frames::Float(_) => true,
            Frames::Int(_) => self.max_abs() <= 1.0,
        }
    }
}

impl From<Vec<Vec<i64>>> for Frames {
    fn from(rows: Vec<Vec<i64>>) -> Frames {
        Frames::Int(rows)
    }
}

impl From<Vec<Vec<f64>>> for Frames {
    fn from(rows: Vec<Vec<f64>>) -> Frames {
        Frames::Float(rows)
    }
}

/// Converts an integer sample to a float in the range [-1, 1).
///
/// Unsigned samples are centered on 2<sup>bits - 1</sup> first.
pub fn int_to_float(x: i64, bits: u16, signed: bool) -> f64 {
    let half = 2.0_f64.powi(bits as i32 - 1);
    if signed {
        x as f64 / half
    } else {
        (x as f64 - half) / half
    }
}

/// Converts a float sample in the range [-1, 1) to an integer sample.
///
/// The unsigned conversion scales by 2<sup>bits</sup>, so it is not the exact
/// inverse of `int_to_float` at the top of the range: 1.0 maps to 256 for
/// 8 bits, which saturates to 255 when written. Ties round to even.
pub fn float_to_int(x: f64, bits: u16, signed: bool) -> i64 {
    if signed {
        (x * 2.0_f64.powi(bits as i32 - 1)).round_ties_even() as i64
    } else {
        (((x + 1.0) / 2.0) * 2.0_f64.powi(bits as i32)).round_ties_even() as i64
    }
}

/// Formats a duration in seconds as `h:mm:ss.ss`.
pub fn format_hms(seconds: f64) -> String {
    let minutes = (seconds / 60.0).floor();
    let secs = seconds - minutes * 60.0;
    let minutes = minutes as u64;
    format!("{}:{:02}:{:05.2}", minutes / 60, minutes % 60, secs)
}

#[test]
fn int_float_conversion_matches_reference_values() {
    assert_eq!(int_to_float(0, 8, false), -1.0);
    assert_eq!(int_to_float(128, 8, false), 0.0);
    assert_eq!(int_to_float(64, 8, false), -0.5);
    assert_eq!(int_to_float(-16384, 16, true), -0.5);
    assert_eq!(int_to_float(1 << 23, 24, true), 1.0);

    assert_eq!(float_to_int(-1.0, 8, false), 0);
    assert_eq!(float_to_int(0.0, 8, false), 128);
    assert_eq!(float_to_int(-0.5, 8, false), 64);
    assert_eq!(float_to_int(-0.5, 16, true), -16384);
}

#[test]
fn unsigned_conversion_is_asymmetric_at_the_top() {
    // 1.0 overshoots the 8-bit range; the writer saturates it to 255.
    assert_eq!(float_to_int(1.0, 8, false), 256);
    assert_eq!(int_to_float(255, 8, false), 127.0 / 128.0);
}

#[test]
fn float_to_int_rounds_ties_to_even() {
    assert_eq!(float_to_int(0.5 / 32768.0, 16, true), 0);
    assert_eq!(float_to_int(1.5 / 32768.0, 16, true), 2);
}

#[test]
fn int_frames_with_small_magnitude_look_like_float() {
    assert!(Frames::Int(vec![vec![0, 1], vec![-1, 0]]).looks_like_float());
    assert!(!Frames::Int(vec![vec![0, 2]]).looks_like_float());
    assert!(Frames::Float(vec![vec![100.0]]).looks_like_float());
}

#[test]
fn format_hms_pads_fields() {
    assert_eq!(format_hms(0.0), "0:00:00.00");
    assert_eq!(format_hms(3725.5), "1:02:05.50");
    assert_eq!(format_hms(59.999), "0:00:60.00");
}

#[test]
fn spec_validation_rejects_unwritable_formats() {
    let ok = WavSpec::default();
    assert!(ok.validate().is_ok());
    let bad_bits = WavSpec { bits_per_sample: 12, ..ok };
    assert!(matches!(bad_bits.validate(), Err(Error::WriteError(_))));
    let bad_float = WavSpec { format: WavFormat::IeeeFloat, ..ok };
    assert!(matches!(bad_float.validate(), Err(Error::WriteError(_))));
    let no_channels = WavSpec { channels: Some(0), ..ok };
    assert!(matches!(no_channels.validate(), Err(Error::WriteError(_))));
}

#[test]
fn extensible_is_selected_for_wide_or_multichannel_audio() {
    let plain = WavSpec { channels: Some(2), ..WavSpec::default() };
    assert!(!plain.needs_extensible());
    assert!(WavSpec { bits_per_sample: 24, ..plain }.needs_extensible());
    assert!(WavSpec { channels: Some(6), ..plain }.needs_extensible());
    assert!(WavSpec { format: WavFormat::Extensible, ..plain }.needs_extensible());
}
