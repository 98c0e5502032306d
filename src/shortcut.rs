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

//! Single-call helpers for whole files.
//!
//! These open, process and finalize files in one go, using the public
//! `WavReader` and `WavWriter` interface.

use std::path::{Path, PathBuf};

use log::debug;

use super::{Error, Frames, Result, WavFormat, WavSpec};
use crate::list::Metadata;
use crate::read::WavReader;
use crate::write::WavWriter;

/// The number of frames copied at a time by `split` and `join`.
const BLOCK_LEN: usize = 4096;

/// How `read` returns samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReadAs {
    /// Integer samples, converting float files.
    #[default]
    Int,
    /// Float samples in [-1, 1), converting integer files.
    Float,
    /// The sample format of the file.
    Native,
}

/// Reads a whole file. Returns the frames, the sample rate and the bits per
/// sample.
pub fn read<P: AsRef<Path>>(path: P, read_as: ReadAs) -> Result<(Frames, u32, u16)> {
    let mut reader = WavReader::open(path)?;
    let frames = match read_as {
        ReadAs::Int => Frames::Int(reader.read_int(None)?),
        ReadAs::Float => Frames::Float(reader.read_float(None)?),
        ReadAs::Native => reader.read(None)?,
    };
    Ok((frames, reader.sample_rate(), reader.bits_per_sample()))
}

/// Writes a whole file, with optional metadata placed before the audio.
///
/// The frames are written with `WavWriter::write`, so an integer block with
/// no sample beyond 1 in magnitude is taken as float samples.
pub fn write<P: AsRef<Path>>(path: P,
                             frames: &Frames,
                             spec: WavSpec,
                             metadata: Option<&Metadata>)
                             -> Result<()> {
    let mut writer = WavWriter::create(path, spec)?;
    if let Some(metadata) = metadata {
        writer.add_metadata(metadata.iter().map(|(item, value)| (*item, value.clone())))?;
    }
    writer.write(frames)?;
    writer.finalize()
}

/// The path of the mono file that holds `channel` of `path`.
///
/// For `dir/take.wav` and channel 1 this is `dir/take_01.wav`.
fn channel_path(path: &Path, channel: usize) -> PathBuf {
    let stem = path.file_stem().map_or_else(Default::default, |s| s.to_string_lossy());
    let name = match path.extension() {
        Some(ext) => format!("{}_{:02}.{}", stem, channel, ext.to_string_lossy()),
        None => format!("{}_{:02}", stem, channel),
    };
    path.with_file_name(name)
}

/// Splits a file into one mono file per channel, and returns their paths.
///
/// The files are written next to the input, with the channel index appended
/// to the file stem. They keep the sample rate, bit depth and sample format
/// of the input.
pub fn split<P: AsRef<Path>>(path: P) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    let mut reader = WavReader::open(path)?;
    let spec = WavSpec {
        channels: Some(1),
        extensible: false,
        ..reader.spec()
    };

    let paths: Vec<PathBuf> = (0..reader.channels() as usize)
        .map(|channel| channel_path(path, channel))
        .collect();
    let mut writers = Vec::with_capacity(paths.len());
    for channel_path in &paths {
        debug!("splitting channel into {}", channel_path.display());
        writers.push(WavWriter::create(channel_path, spec)?);
    }

    for block in reader.iter(Some(BLOCK_LEN)) {
        match block? {
            Frames::Int(frames) => {
                for (channel, writer) in writers.iter_mut().enumerate() {
                    let mono: Vec<Vec<i64>> = frames.iter().map(|f| vec![f[channel]]).collect();
                    writer.write_int(&mono)?;
                }
            }
            Frames::Float(frames) => {
                for (channel, writer) in writers.iter_mut().enumerate() {
                    let mono: Vec<Vec<f64>> = frames.iter().map(|f| vec![f[channel]]).collect();
                    writer.write_float(&mono)?;
                }
            }
        }
    }

    for writer in writers {
        writer.finalize()?;
    }
    Ok(paths)
}

/// Joins files into one multichannel integer file.
///
/// The channels of the inputs appear in the order of `inputs`. The output
/// has the largest bit depth among the inputs and lasts as long as the
/// longest input; shorter inputs are padded with silence. All inputs must
/// have the same sample rate.
pub fn join<P, Q>(output: P, inputs: &[Q]) -> Result<()>
    where P: AsRef<Path>,
          Q: AsRef<Path>
{
    let mut readers = Vec::with_capacity(inputs.len());
    for input in inputs {
        readers.push(WavReader::open(input)?);
    }
    let sample_rate = match readers.first() {
        Some(reader) => reader.sample_rate(),
        None => return Err(Error::FormatError("no input files to join")),
    };
    if readers.iter().any(|reader| reader.sample_rate() != sample_rate) {
        return Err(Error::ReadError("sample rates of input files do not match"));
    }
    let bits_per_sample = readers.iter().map(|r| r.bits_per_sample()).max().unwrap_or(16);
    let channels: u32 = readers.iter().map(|r| r.channels() as u32).sum();
    let channels = u16::try_from(channels)
        .map_err(|_| Error::WriteError("too many channels in total"))?;
    let num_frames = readers.iter().map(|r| r.num_frames()).max().unwrap_or(0) as usize;

    let spec = WavSpec {
        sample_rate: sample_rate,
        channels: Some(channels),
        bits_per_sample: bits_per_sample,
        format: WavFormat::Pcm,
        extensible: false,
    };
    let mut writer = WavWriter::create(output, spec)?;

    let mut written = 0;
    while written < num_frames {
        let len = BLOCK_LEN.min(num_frames - written);
        let mut block = vec![vec![0.0; channels as usize]; len];
        let mut first_channel = 0;
        for reader in readers.iter_mut() {
            let frames = reader.read_float(Some(len))?;
            for (row, frame) in block.iter_mut().zip(frames) {
                row[first_channel..first_channel + frame.len()].copy_from_slice(&frame);
            }
            first_channel += reader.channels() as usize;
        }
        writer.write_float(&block)?;
        written += len;
    }
    writer.finalize()
}

#[test]
fn channel_paths_number_the_stem() {
    assert_eq!(channel_path(Path::new("dir/take.wav"), 1), PathBuf::from("dir/take_01.wav"));
    assert_eq!(channel_path(Path::new("take"), 12), PathBuf::from("take_12"));
}
