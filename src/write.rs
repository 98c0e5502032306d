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

use std::fs;
use std::io;
use std::io::SeekFrom;
use std::path;

use byteorder::{LittleEndian, WriteBytesExt};
use log::warn;

use super::{float_to_int, format_hms, int_to_float};
use super::{Error, Frames, Result, WavFormat, WavSpec};
use crate::chunk::RiffChunk;
use crate::data::{DataChunk, Sample, Whence};
use crate::fmt::FormatChunk;
use crate::list::{InfoItem, InfoValue, ListChunk, Metadata};
use crate::read::{int_width, invalid_float_width};

/// Extends the functionality of `io::Write` with additional methods.
///
/// The methods may be used on any type that implements `io::Write`.
pub trait WriteExt: io::Write {
    /// Writes an unsigned integer in `width` bytes, 1 to 8, little endian.
    ///
    /// Values that do not fit are an error of kind `InvalidInput`.
    fn write_le_uint(&mut self, x: u64, width: u16) -> io::Result<()>;

    /// Writes a signed integer in `width` bytes, 1 to 8, little endian.
    ///
    /// Values that do not fit are an error of kind `InvalidInput`.
    fn write_le_int(&mut self, x: i64, width: u16) -> io::Result<()>;

    /// Writes an IEEE float in `width` bytes, 4 or 8, little endian.
    fn write_le_float(&mut self, x: f64, width: u16) -> io::Result<()>;
}

fn out_of_range() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, "value does not fit in the given width")
}

impl<W> WriteExt for W where W: io::Write {
    fn write_le_uint(&mut self, x: u64, width: u16) -> io::Result<()> {
        let width = int_width(width)?;
        if width < 8 && x >> (width * 8) != 0 {
            return Err(out_of_range());
        }
        self.write_uint::<LittleEndian>(x, width)
    }

    fn write_le_int(&mut self, x: i64, width: u16) -> io::Result<()> {
        let width = int_width(width)?;
        if width < 8 {
            let half = 1i64 << (width * 8 - 1);
            if x < -half || x >= half {
                return Err(out_of_range());
            }
        }
        self.write_int::<LittleEndian>(x, width)
    }

    fn write_le_float(&mut self, x: f64, width: u16) -> io::Result<()> {
        match width {
            4 => self.write_f32::<LittleEndian>(x as f32),
            8 => self.write_f64::<LittleEndian>(x),
            _ => Err(invalid_float_width()),
        }
    }
}

/// A writer that accepts frames and writes the WAVE format.
///
/// The RIFF, format and data chunk headers are written on construction, with
/// provisional sizes. After all frames have been written, the file must be
/// finalized by calling `finalize`, which patches the headers. A writer that
/// is dropped without being finalized logs a warning and leaves the headers
/// as they are.
///
/// The writer does not close a caller-supplied stream. Pass `&mut File` or
/// `&mut Cursor` to keep using the stream afterwards.
pub struct WavWriter<W>
    where W: io::Write + io::Seek
{
    writer: W,
    riff: RiffChunk,
    data: DataChunk,
    list: Option<ListChunk>,

    /// Set when metadata follows the audio; the data chunk can no longer grow.
    data_closed: bool,

    /// Whether `finalize` has been called.
    finalized: bool,
}

impl<W> WavWriter<W>
    where W: io::Write + io::Seek
{
    /// Creates a writer that writes the WAVE format to the underlying writer.
    ///
    /// The headers are written immediately, starting at the current position.
    pub fn new(mut writer: W, spec: WavSpec) -> Result<WavWriter<W>> {
        spec.validate()?;
        let riff = RiffChunk::create(&mut writer)?;
        let format = FormatChunk::create(&mut writer, &spec)?;
        let data = DataChunk::create(&mut writer, format)?;
        Ok(WavWriter {
            writer: writer,
            riff: riff,
            data: data,
            list: None,
            data_closed: false,
            finalized: false,
        })
    }

    /// Returns the properties of the file. The channel count is `None` until
    /// it is known.
    pub fn spec(&self) -> WavSpec {
        let format = self.data.format();
        WavSpec {
            sample_rate: format.sample_rate(),
            channels: match format.channels() {
                0 => None,
                n => Some(n),
            },
            bits_per_sample: format.bits_per_sample(),
            format: format.format(),
            extensible: format.is_extensible(),
        }
    }

    /// The number of channels, 0 until the first frames are written.
    pub fn channels(&self) -> u16 {
        self.data.format().channels()
    }

    /// The number of frames per second.
    pub fn sample_rate(&self) -> u32 {
        self.data.format().sample_rate()
    }

    /// The number of bits used to store a sample.
    pub fn bits_per_sample(&self) -> u16 {
        self.data.format().bits_per_sample()
    }

    /// The sample format, `Pcm` or `IeeeFloat`.
    pub fn format(&self) -> WavFormat {
        self.data.format().format()
    }

    /// Whether the format chunk uses the extensible layout.
    pub fn is_extensible(&self) -> bool {
        self.data.format().is_extensible()
    }

    /// The speaker position mask, 0 for plain format chunks.
    pub fn channel_mask(&self) -> u32 {
        self.data.format().channel_mask()
    }

    /// The number of significant bits per sample.
    pub fn valid_bits_per_sample(&self) -> u16 {
        self.data.format().valid_bits_per_sample()
    }

    /// The number of frames written so far.
    pub fn num_frames(&self) -> u32 {
        self.data.num_frames()
    }

    /// The duration of the frames written so far, in seconds.
    pub fn duration(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate() as f64
    }

    /// The duration formatted as `h:mm:ss.ss`.
    pub fn hms(&self) -> String {
        format_hms(self.duration())
    }

    /// The metadata that was added, if any.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.list.as_ref().and_then(|list| list.info())
    }

    fn write_samples<S: Sample>(&mut self, frames: &[Vec<S>]) -> Result<()> {
        if self.data_closed {
            return Err(Error::WriteError("cannot write audio after metadata has been appended"));
        }
        if self.channels() == 0 && !self.is_extensible() {
            let width = frames.first().map_or(0, Vec::len);
            if width > 2 && frames.iter().all(|frame| frame.len() == width) {
                self.use_extensible_format()?;
            }
        }
        self.data.write_frames(&mut self.writer, frames)
    }

    /// Rewrites the plain format chunk in the extensible layout, which is
    /// needed for more than two channels.
    ///
    /// Only valid while the data chunk is empty: the metadata, if any, and the
    /// data header are written again after the longer format chunk.
    fn use_extensible_format(&mut self) -> Result<()> {
        debug_assert_eq!(self.data.chunk().size(), 0);
        let spec = WavSpec {
            channels: None,
            extensible: true,
            ..self.spec()
        };
        let start = self.data.format().chunk().start();
        self.writer.seek(SeekFrom::Start(start))?;
        let format = FormatChunk::create(&mut self.writer, &spec)?;
        if let Some(info) = self.list.as_ref().and_then(|list| list.info()).cloned() {
            self.list = Some(ListChunk::create(&mut self.writer, info)?);
        }
        self.data = DataChunk::create(&mut self.writer, format)?;
        Ok(())
    }

    /// Writes integer frames at the current frame.
    ///
    /// For float files, the samples are converted as if they had the bit
    /// depth of the file. Out-of-range samples are clamped, and a warning is
    /// logged the first time that happens.
    pub fn write_int(&mut self, frames: &[Vec<i64>]) -> Result<()> {
        match self.format() {
            WavFormat::IeeeFloat => {
                let bits = self.bits_per_sample();
                let converted: Vec<Vec<f64>> = frames.iter()
                    .map(|frame| frame.iter().map(|&x| int_to_float(x, bits, true)).collect())
                    .collect();
                self.write_samples(&converted)
            }
            _ => self.write_samples(frames),
        }
    }

    /// Writes float frames in the range [-1, 1) at the current frame.
    ///
    /// For integer files, the samples are scaled to the bit depth of the
    /// file and clamped.
    pub fn write_float(&mut self, frames: &[Vec<f64>]) -> Result<()> {
        match self.format() {
            WavFormat::IeeeFloat => self.write_samples(frames),
            _ => {
                let bits = self.bits_per_sample();
                let signed = bits > 8;
                let converted: Vec<Vec<i64>> = frames.iter()
                    .map(|frame| frame.iter().map(|&x| float_to_int(x, bits, signed)).collect())
                    .collect();
                self.write_samples(&converted)
            }
        }
    }

    /// Writes a block of frames, guessing whether it holds float samples.
    ///
    /// See `Frames::looks_like_float` for the guess. An integer block whose
    /// samples are all within [-1, 1] is written as float samples.
    pub fn write(&mut self, frames: &Frames) -> Result<()> {
        match *frames {
            Frames::Float(ref rows) => self.write_float(rows),
            Frames::Int(ref rows) if frames.looks_like_float() => {
                let rows: Vec<Vec<f64>> = rows.iter()
                    .map(|frame| frame.iter().map(|&x| x as f64).collect())
                    .collect();
                self.write_float(&rows)
            }
            Frames::Int(ref rows) => self.write_int(rows),
        }
    }

    /// Moves to a frame relative to `whence`, and returns the absolute frame
    /// index. Writing there overwrites existing frames.
    pub fn seek(&mut self, frame: i64, whence: Whence) -> Result<u32> {
        self.data.seek(&mut self.writer, frame, whence)
    }

    /// The index of the next frame to write.
    pub fn tell(&self) -> u32 {
        self.data.tell()
    }

    /// Adds a `LIST/INFO` chunk with the given fields.
    ///
    /// Field names are those of `InfoItem`, e.g. `"track_number"`. When no
    /// audio has been written yet, the metadata is placed before the data
    /// chunk. Otherwise it is appended after the audio, and no more audio can
    /// be written. Metadata can be added only once.
    pub fn add_metadata<I, K, V>(&mut self, items: I) -> Result<()>
        where I: IntoIterator<Item = (K, V)>,
              K: AsRef<str>,
              V: Into<InfoValue>
    {
        if self.list.is_some() {
            return Err(Error::WriteError("metadata has already been added"));
        }
        let mut info = Metadata::new();
        for (key, value) in items {
            let item: InfoItem = key.as_ref().parse()?;
            let value = value.into();
            // Checked here so that a bad value leaves the file untouched.
            value.to_ascii()?;
            info.insert(item, value);
        }

        if self.data.chunk().size() == 0 {
            // Move the empty data chunk behind the metadata.
            let start = self.data.chunk().start();
            self.writer.seek(SeekFrom::Start(start))?;
            let list = ListChunk::create(&mut self.writer, info)?;
            let format = self.data.format().clone();
            self.data = DataChunk::create(&mut self.writer, format)?;
            self.list = Some(list);
        } else {
            self.data.pad(&mut self.writer)?;
            self.list = Some(ListChunk::create(&mut self.writer, info)?);
            self.data_closed = true;
        }
        Ok(())
    }

    /// Patches all chunk headers with their current sizes.
    fn patch_headers(&mut self) -> Result<()> {
        self.data.finalize(&mut self.writer)?;
        let mut children_len = self.data.format().chunk().total_len() + self.data.chunk().total_len();
        if let Some(ref list) = self.list {
            list.finalize(&mut self.writer)?;
            children_len += list.total_len();
        }
        self.riff.finalize(&mut self.writer, children_len)
    }

    /// Patches the headers so that the file is valid as written so far, and
    /// flushes the underlying writer.
    ///
    /// Writing can continue afterwards.
    pub fn flush(&mut self) -> Result<()> {
        if self.data_closed {
            let position = self.writer.stream_position()?;
            self.patch_headers()?;
            self.writer.seek(SeekFrom::Start(position))?;
        } else {
            // The pad byte is counted in the RIFF size, so it must exist.
            let frame = self.data.tell();
            self.data.pad(&mut self.writer)?;
            self.patch_headers()?;
            self.data.seek(&mut self.writer, frame as i64, Whence::Start)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn finalize_internal(&mut self) -> Result<()> {
        self.finalized = true;
        if !self.data_closed {
            self.data.pad(&mut self.writer)?;
        }
        self.patch_headers()?;
        self.writer.flush()?;
        Ok(())
    }

    /// Pads the data chunk, patches the headers and flushes the writer.
    ///
    /// The underlying writer is not closed here; it is dropped along with
    /// the `WavWriter`.
    pub fn finalize(mut self) -> Result<()> {
        self.finalize_internal()
    }
}

impl<W> Drop for WavWriter<W>
    where W: io::Write + io::Seek
{
    fn drop(&mut self) {
        // Finalizing involves IO that may fail, and a failure could not be
        // reported from here.
        if !self.finalized {
            warn!("WavWriter dropped without finalize; chunk sizes in the file are not valid");
        }
    }
}

impl WavWriter<io::BufWriter<fs::File>> {
    /// Creates a writer that writes the WAVE format to a file.
    ///
    /// This is a convenience constructor that creates the file, wraps it in
    /// a `BufWriter`, and then constructs a `WavWriter` from it.
    pub fn create<P: AsRef<path::Path>>(filename: P, spec: WavSpec)
           -> Result<WavWriter<io::BufWriter<fs::File>>> {
        let file = fs::File::create(filename)?;
        let buf_writer = io::BufWriter::new(file);
        WavWriter::new(buf_writer, spec)
    }
}

#[test]
fn write_le_int_checks_range() {
    let mut buffer = Vec::new();
    buffer.write_le_int(-8_388_608, 3).unwrap();
    buffer.write_le_int(8_388_607, 3).unwrap();
    assert_eq!(buffer, [0x00, 0x00, 0x80, 0xff, 0xff, 0x7f]);
    assert!(buffer.write_le_int(8_388_608, 3).is_err());
    assert!(buffer.write_le_uint(256, 1).is_err());
    assert!(buffer.write_le_uint(1, 9).is_err());
    assert!(buffer.write_le_float(1.0, 2).is_err());
}
