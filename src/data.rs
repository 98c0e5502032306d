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

use std::cmp;
use std::io;

use log::warn;

use super::{Error, Result};
use crate::chunk::{Chunk, ChunkId};
use crate::fmt::FormatChunk;
use crate::read::ReadExt;
use crate::write::WriteExt;

/// Describes how a single sample is stored in the data chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleCodec {
    /// Little-endian integers of `width` bytes.
    Pcm {
        /// Unsigned samples are used for 8 bits per sample only.
        signed: bool,
        /// Bytes per sample, 1 to 8.
        width: u16,
    },
    /// Little-endian IEEE floats of `width` bytes, 4 or 8.
    Float {
        /// Bytes per sample.
        width: u16,
    },
}

impl SampleCodec {
    /// The inclusive range of integers that can be stored, for PCM codecs.
    pub fn int_range(self) -> Option<(i64, i64)> {
        match self {
            SampleCodec::Pcm { signed, width } => Some(pcm_range(signed, width)),
            SampleCodec::Float { .. } => None,
        }
    }
}

fn pcm_range(signed: bool, width: u16) -> (i64, i64) {
    let bits = width as u32 * 8;
    if signed {
        let half = 1i128 << (bits - 1);
        ((-half) as i64, (half - 1) as i64)
    } else {
        let max = (1i128 << bits) - 1;
        (0, cmp::min(max, i64::MAX as i128) as i64)
    }
}

/// A sample type that can be stored in the data chunk.
///
/// `i64` holds PCM samples and `f64` holds IEEE float samples. Using a sample
/// type that does not match the format of the chunk is an error.
pub trait Sample: Copy {
    /// Reads one sample.
    fn decode<R: io::Read>(reader: &mut R, codec: SampleCodec) -> Result<Self>;

    /// Writes one sample, clamping it to the range of the codec.
    ///
    /// Returns whether the value had to be clamped.
    fn encode<W: io::Write>(self, writer: &mut W, codec: SampleCodec) -> Result<bool>;
}

impl Sample for i64 {
    fn decode<R: io::Read>(reader: &mut R, codec: SampleCodec) -> Result<i64> {
        match codec {
            SampleCodec::Pcm { signed: true, width } => Ok(reader.read_le_int(width)?),
            SampleCodec::Pcm { signed: false, width } => {
                // Unsigned samples wider than 63 bits do not occur; 8-bit
                // samples are the only unsigned ones.
                Ok(reader.read_le_uint(width)? as i64)
            }
            SampleCodec::Float { .. } => {
                Err(Error::FormatError("integer samples requested from float data"))
            }
        }
    }

    fn encode<W: io::Write>(self, writer: &mut W, codec: SampleCodec) -> Result<bool> {
        match codec {
            SampleCodec::Pcm { signed, width } => {
                let (min, max) = pcm_range(signed, width);
                let value = cmp::max(min, cmp::min(max, self));
                if signed {
                    writer.write_le_int(value, width)?;
                } else {
                    writer.write_le_uint(value as u64, width)?;
                }
                Ok(value != self)
            }
            SampleCodec::Float { .. } => {
                Err(Error::FormatError("integer samples given for float data"))
            }
        }
    }
}

impl Sample for f64 {
    fn decode<R: io::Read>(reader: &mut R, codec: SampleCodec) -> Result<f64> {
        match codec {
            SampleCodec::Float { width } => Ok(reader.read_le_float(width)?),
            SampleCodec::Pcm { .. } => {
                Err(Error::FormatError("float samples requested from integer data"))
            }
        }
    }

    fn encode<W: io::Write>(self, writer: &mut W, codec: SampleCodec) -> Result<bool> {
        match codec {
            SampleCodec::Float { width } => writer.write_le_float(self, width)?,
            SampleCodec::Pcm { .. } => {
                return Err(Error::FormatError("float samples given for integer data"));
            }
        }
        Ok(false)
    }
}

/// The reference point of a seek, counted in frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Whence {
    /// The first frame.
    #[default]
    Start,
    /// The current frame.
    Current,
    /// One past the last frame.
    End,
}

impl TryFrom<u32> for Whence {
    type Error = Error;

    /// Maps the conventional 0, 1 and 2 to `Start`, `Current` and `End`.
    fn try_from(whence: u32) -> Result<Whence> {
        match whence {
            0 => Ok(Whence::Start),
            1 => Ok(Whence::Current),
            2 => Ok(Whence::End),
            _ => Err(Error::FormatError("invalid seek reference point")),
        }
    }
}

/// The `data` chunk, which holds interleaved frames.
///
/// The chunk owns the format that describes its frames. On a writer, the
/// channel count may still be unknown; it is fixed by the first write.
#[derive(Clone, Debug)]
pub struct DataChunk {
    chunk: Chunk,
    format: FormatChunk,
    /// Set after the first clamped sample; the warning is logged only once.
    warned_saturation: bool,
}

impl DataChunk {
    /// Reads a `data` chunk header at the current position of the stream.
    pub fn read<R: io::Read + io::Seek>(reader: &mut R, format: FormatChunk) -> Result<DataChunk> {
        let header = Chunk::read_header(reader)?;
        DataChunk::parse(header, format)
    }

    /// Wraps an already read header. The content is not touched.
    pub fn parse(chunk: Chunk, format: FormatChunk) -> Result<DataChunk> {
        if chunk.id() != ChunkId::Data {
            return Err(Error::ReadError("expected data chunk"));
        }
        Ok(DataChunk {
            chunk: chunk,
            format: format,
            warned_saturation: false,
        })
    }

    /// Writes an empty `data` chunk at the current position.
    pub fn create<W>(writer: &mut W, format: FormatChunk) -> Result<DataChunk>
        where W: io::Write + io::Seek
    {
        let chunk = Chunk::begin(writer, ChunkId::Data)?;
        Ok(DataChunk {
            chunk: chunk,
            format: format,
            warned_saturation: false,
        })
    }

    /// The header and cursor of the chunk.
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    /// The format that describes the frames.
    pub fn format(&self) -> &FormatChunk {
        &self.format
    }

    /// The number of whole frames in the chunk.
    pub fn num_frames(&self) -> u32 {
        match self.format.block_align() {
            0 => 0,
            block_align => self.chunk.size() / block_align as u32,
        }
    }

    /// The index of the frame at the cursor.
    pub fn tell(&self) -> u32 {
        match self.format.block_align() {
            0 => 0,
            block_align => self.chunk.position() / block_align as u32,
        }
    }

    /// Moves the cursor to the start of the content.
    pub fn rewind<S: io::Seek>(&mut self, stream: &mut S) -> Result<()> {
        self.chunk.seek_content(stream, 0)
    }

    /// Reads up to `num_frames` frames from the cursor, or all remaining
    /// frames when `None`.
    ///
    /// Fewer frames are returned near the end; none once it is reached.
    pub fn read_frames<R, S>(&mut self, reader: &mut R, num_frames: Option<usize>) -> Result<Vec<Vec<S>>>
        where R: io::Read,
              S: Sample
    {
        let remaining = self.num_frames().saturating_sub(self.tell()) as usize;
        let len = num_frames.map_or(remaining, |n| cmp::min(n, remaining));
        let block_align = self.format.block_align() as usize;
        if len == 0 || block_align == 0 {
            return Ok(Vec::new());
        }

        let buffer = self.chunk.read_vec(reader, len * block_align)?;

        let codec = self.format.codec();
        let channels = self.format.channels() as usize;
        let mut input = &buffer[..];
        let mut frames = Vec::with_capacity(len);
        for _ in 0..len {
            let mut frame = Vec::with_capacity(channels);
            for _ in 0..channels {
                frame.push(S::decode(&mut input, codec)?);
            }
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Writes frames at the cursor.
    ///
    /// The first non-empty write fixes the channel count when the format did
    /// not specify one. Samples outside the range of the format are clamped.
    pub fn write_frames<W, S>(&mut self, writer: &mut W, frames: &[Vec<S>]) -> Result<()>
        where W: io::Write,
              S: Sample
    {
        let width = match frames.first() {
            Some(frame) => frame.len(),
            None => return Ok(()),
        };
        if width == 0 {
            return Err(Error::WriteError("frames must hold at least one sample"));
        }
        if frames.iter().any(|frame| frame.len() != width) {
            return Err(Error::WriteError("all frames must hold the same number of samples"));
        }
        let width = u16::try_from(width)
            .map_err(|_| Error::WriteError("too many channels"))?;
        if self.format.channels() == 0 {
            self.format.set_channels(width)?;
        } else if self.format.channels() != width {
            return Err(Error::WriteError("number of samples per frame does not match the channel count"));
        }

        let codec = self.format.codec();
        let mut buffer = Vec::with_capacity(frames.len() * self.format.block_align() as usize);
        let mut clamped = false;
        for frame in frames {
            for &sample in frame {
                clamped |= sample.encode(&mut buffer, codec)?;
            }
        }
        if clamped && !self.warned_saturation {
            self.warned_saturation = true;
            warn!("saturating sample values that do not fit in {} bits", self.format.bits_per_sample());
        }
        self.chunk.write(writer, &buffer)
    }

    /// Moves the cursor to a frame relative to `whence`, and returns the
    /// absolute frame index.
    ///
    /// The target may equal the frame count, but not exceed it.
    pub fn seek<S: io::Seek>(&mut self, stream: &mut S, frame: i64, whence: Whence) -> Result<u32> {
        let num_frames = self.num_frames() as i64;
        let base = match whence {
            Whence::Start => 0,
            Whence::Current => self.tell() as i64,
            Whence::End => num_frames,
        };
        let target = base.checked_add(frame)
            .ok_or(Error::FormatError("frame number out of range"))?;
        if target > num_frames {
            return Err(Error::FormatError("frame number exceeds number of frames"));
        }
        if target < 0 {
            return Err(Error::FormatError("frame number is before the first frame"));
        }
        let position = target as u32 * self.format.block_align() as u32;
        self.chunk.seek_content(stream, position)?;
        Ok(target as u32)
    }

    /// Writes the pad byte after odd-sized content, if needed.
    ///
    /// The stream is left after the pad byte.
    pub fn pad<W>(&mut self, writer: &mut W) -> Result<()>
        where W: io::Write + io::Seek
    {
        let pad = self.chunk.pad();
        self.chunk.skip(writer, false)?;
        self.chunk.write_padding(writer, pad)
    }

    /// Patches the format chunk and the data chunk header.
    pub fn finalize<W>(&mut self, writer: &mut W) -> Result<()>
        where W: io::Write + io::Seek
    {
        self.format.finalize(writer)?;
        self.chunk.finalize(writer, 0)
    }
}

#[test]
fn whence_from_number() {
    assert_eq!(Whence::try_from(0u32).unwrap(), Whence::Start);
    assert_eq!(Whence::try_from(1u32).unwrap(), Whence::Current);
    assert_eq!(Whence::try_from(2u32).unwrap(), Whence::End);
    match Whence::try_from(3u32) {
        Err(Error::FormatError(..)) => {}
        other => panic!("expected format error, got {:?}", other),
    }
}

#[test]
fn int_ranges_follow_signedness() {
    let u8_codec = SampleCodec::Pcm { signed: false, width: 1 };
    assert_eq!(u8_codec.int_range(), Some((0, 255)));
    let i24_codec = SampleCodec::Pcm { signed: true, width: 3 };
    assert_eq!(i24_codec.int_range(), Some((-8_388_608, 8_388_607)));
    let i64_codec = SampleCodec::Pcm { signed: true, width: 8 };
    assert_eq!(i64_codec.int_range(), Some((i64::MIN, i64::MAX)));
    assert_eq!(SampleCodec::Float { width: 4 }.int_range(), None);
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{DataChunk, Whence};
    use crate::fmt::FormatChunk;
    use crate::{Error, WavFormat, WavSpec};

    fn new_chunk(buffer: &mut Cursor<Vec<u8>>, spec: WavSpec) -> DataChunk {
        let format = FormatChunk::create(buffer, &spec).unwrap();
        DataChunk::create(buffer, format).unwrap()
    }

    #[test]
    fn eight_bit_samples_are_unsigned_and_clamped() {
        let mut buffer = Cursor::new(Vec::new());
        let spec = WavSpec { bits_per_sample: 8, ..WavSpec::default() };
        let mut data = new_chunk(&mut buffer, spec);
        data.write_frames(&mut buffer, &[vec![0i64], vec![128], vec![300], vec![-5]]).unwrap();
        let start = data.chunk().content_start() as usize;
        assert_eq!(&buffer.get_ref()[start..], &[0, 128, 255, 0]);
        assert_eq!(data.num_frames(), 4);
        assert_eq!(data.tell(), 4);
    }

    #[test]
    fn channel_count_is_inferred_once() {
        let mut buffer = Cursor::new(Vec::new());
        let mut data = new_chunk(&mut buffer, WavSpec::default());
        data.write_frames(&mut buffer, &[vec![1i64, 2, 3]]).unwrap();
        assert_eq!(data.format().channels(), 3);
        assert_eq!(data.format().block_align(), 6);
        match data.write_frames(&mut buffer, &[vec![1i64, 2]]) {
            Err(Error::WriteError(..)) => {}
            other => panic!("expected write error, got {:?}", other),
        }
    }

    #[test]
    fn ragged_frames_are_rejected_before_inference() {
        let mut buffer = Cursor::new(Vec::new());
        let mut data = new_chunk(&mut buffer, WavSpec::default());
        assert!(data.write_frames(&mut buffer, &[vec![1i64, 2], vec![3]]).is_err());
        assert_eq!(data.format().channels(), 0);
        assert!(data.write_frames(&mut buffer, &[Vec::<i64>::new()]).is_err());
        data.write_frames::<_, i64>(&mut buffer, &[]).unwrap();
        assert_eq!(data.chunk().size(), 0);
    }

    #[test]
    fn sample_type_must_match_format() {
        let mut buffer = Cursor::new(Vec::new());
        let spec = WavSpec { bits_per_sample: 32, format: WavFormat::IeeeFloat, ..WavSpec::default() };
        let mut data = new_chunk(&mut buffer, spec);
        match data.write_frames(&mut buffer, &[vec![1i64]]) {
            Err(Error::FormatError(..)) => {}
            other => panic!("expected format error, got {:?}", other),
        }
        data.write_frames(&mut buffer, &[vec![0.25f64]]).unwrap();
        data.rewind(&mut buffer).unwrap();
        let frames: Vec<Vec<f64>> = data.read_frames(&mut buffer, None).unwrap();
        assert_eq!(frames, vec![vec![0.25]]);
    }

    #[test]
    fn seek_is_bounded_by_frame_count() {
        let mut buffer = Cursor::new(Vec::new());
        let spec = WavSpec { channels: Some(2), ..WavSpec::default() };
        let mut data = new_chunk(&mut buffer, spec);
        let frames: Vec<Vec<i64>> = (0..5).map(|i| vec![i, -i]).collect();
        data.write_frames(&mut buffer, &frames).unwrap();

        assert_eq!(data.seek(&mut buffer, 1, Whence::Start).unwrap(), 1);
        assert_eq!(data.seek(&mut buffer, 2, Whence::Current).unwrap(), 3);
        assert_eq!(data.seek(&mut buffer, -1, Whence::End).unwrap(), 4);
        assert_eq!(data.seek(&mut buffer, 0, Whence::End).unwrap(), 5);
        match data.seek(&mut buffer, 6, Whence::Start) {
            Err(Error::FormatError(..)) => {}
            other => panic!("expected format error, got {:?}", other),
        }
        match data.seek(&mut buffer, -6, Whence::End) {
            Err(Error::FormatError(..)) => {}
            other => panic!("expected format error, got {:?}", other),
        }
        assert_eq!(data.tell(), 5);

        data.seek(&mut buffer, 3, Whence::Start).unwrap();
        let rest: Vec<Vec<i64>> = data.read_frames(&mut buffer, Some(10)).unwrap();
        assert_eq!(rest, vec![vec![3, -3], vec![4, -4]]);
        let none: Vec<Vec<i64>> = data.read_frames(&mut buffer, Some(10)).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn seek_on_empty_chunk_allows_only_zero() {
        let mut buffer = Cursor::new(Vec::new());
        let mut data = new_chunk(&mut buffer, WavSpec::default());
        assert_eq!(data.seek(&mut buffer, 0, Whence::Start).unwrap(), 0);
        assert!(data.seek(&mut buffer, 1, Whence::Start).is_err());
    }

    #[test]
    fn pad_byte_is_not_counted() {
        let mut buffer = Cursor::new(Vec::new());
        let spec = WavSpec { bits_per_sample: 8, channels: Some(1), ..WavSpec::default() };
        let mut data = new_chunk(&mut buffer, spec);
        data.write_frames(&mut buffer, &[vec![1i64], vec![2], vec![3]]).unwrap();
        data.pad(&mut buffer).unwrap();
        data.finalize(&mut buffer).unwrap();
        assert_eq!(data.chunk().size(), 3);
        assert_eq!(data.tell(), 3);
        let end = data.chunk().content_end(true) as usize;
        assert_eq!(buffer.get_ref().len(), end);
        assert_eq!(buffer.get_ref()[end - 1], 0);
    }
}
