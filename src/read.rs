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

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;

use super::{float_to_int, format_hms, int_to_float};
use super::{Error, Frames, Result, WavFormat, WavSpec};
use crate::chunk::{Chunk, ChunkId, RiffChunk, HEADER_LEN};
use crate::data::{DataChunk, Whence};
use crate::fmt::FormatChunk;
use crate::list::{ListChunk, Metadata};

/// Extends the functionality of `io::Read` with additional methods.
///
/// The methods may be used on any type that implements `io::Read`.
pub trait ReadExt: io::Read {
    /// Reads 4 bytes and returns them in an array.
    fn read_4_bytes(&mut self) -> io::Result<[u8; 4]>;

    /// Reads a little-endian unsigned integer of `width` bytes, 1 to 8.
    fn read_le_uint(&mut self, width: u16) -> io::Result<u64>;

    /// Reads a little-endian signed integer of `width` bytes, 1 to 8.
    ///
    /// The sign bit is extended into the unused high bytes.
    fn read_le_int(&mut self, width: u16) -> io::Result<i64>;

    /// Reads a little-endian IEEE float of `width` bytes, 4 or 8.
    fn read_le_float(&mut self, width: u16) -> io::Result<f64>;
}

/// Checks that an integer width is between 1 and 8 bytes.
pub(crate) fn int_width(width: u16) -> io::Result<usize> {
    match width {
        1..=8 => Ok(width as usize),
        _ => Err(io::Error::new(io::ErrorKind::InvalidInput, "integer width must be 1 to 8 bytes")),
    }
}

pub(crate) fn invalid_float_width() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, "float width must be 4 or 8 bytes")
}

impl<R> ReadExt for R
    where R: io::Read
{
    #[inline(always)]
    fn read_4_bytes(&mut self) -> io::Result<[u8; 4]> {
        let mut buf = [0_u8; 4];
        self.read_exact(&mut buf[..])?;
        Ok(buf)
    }

    #[inline(always)]
    fn read_le_uint(&mut self, width: u16) -> io::Result<u64> {
        let width = int_width(width)?;
        self.read_uint::<LittleEndian>(width)
    }

    #[inline(always)]
    fn read_le_int(&mut self, width: u16) -> io::Result<i64> {
        let width = int_width(width)?;
        self.read_int::<LittleEndian>(width)
    }

    #[inline(always)]
    fn read_le_float(&mut self, width: u16) -> io::Result<f64> {
        match width {
            4 => self.read_f32::<LittleEndian>().map(f64::from),
            8 => self.read_f64::<LittleEndian>(),
            _ => Err(invalid_float_width()),
        }
    }
}

/// Scans a wav file from the start and collects its chunks.
///
/// The file must start with a RIFF chunk of form type `WAVE`, and the format
/// chunk must precede the data chunk. Unknown chunks are skipped. Returns the
/// RIFF chunk, the data chunk with its format, and the last `LIST` chunk
/// found, preferring one that carries metadata.
pub fn read_chunks<R>(reader: &mut R) -> Result<(RiffChunk, DataChunk, Option<ListChunk>)>
    where R: io::Read + io::Seek
{
    let file_len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;

    let mut riff = None;
    let mut format = None;
    let mut data = None;
    let mut list: Option<ListChunk> = None;

    while reader.stream_position()? + HEADER_LEN as u64 <= file_len {
        let mut header = Chunk::read_header(reader)?;
        match header.id() {
            ChunkId::Riff => {
                // The children of the RIFF chunk follow its form type.
                riff = Some(RiffChunk::parse(header, reader)?);
                continue;
            }
            _ if riff.is_none() => return Err(Error::ReadError("no RIFF tag found")),
            ChunkId::Fmt => {
                format = Some(FormatChunk::parse(header.clone(), reader)?);
            }
            ChunkId::Data => {
                let format = match format {
                    Some(ref format) => format.clone(),
                    None => return Err(Error::ReadError("data chunk precedes fmt chunk")),
                };
                data = Some(DataChunk::parse(header.clone(), format)?);
            }
            ChunkId::List => {
                let found = ListChunk::parse(header.clone(), reader)?;
                // Record pads may lie beyond the declared size.
                reader.seek(SeekFrom::Start(found.end()))?;
                if found.info().is_some() || list.as_ref().map_or(true, |l| l.info().is_none()) {
                    list = Some(found);
                }
                continue;
            }
            ChunkId::Unknown(tag) => {
                debug!("skipping unknown chunk {:?} of {} bytes",
                       String::from_utf8_lossy(&tag), header.size());
            }
        }
        header.skip(reader, true)?;
    }

    let riff = riff.ok_or(Error::ReadError("no RIFF tag found"))?;
    let data = data.ok_or(Error::ReadError("no data chunk found"))?;
    Ok((riff, data, list))
}

/// A reader that reads the WAVE format from the underlying reader.
///
/// A `WavReader` is a reader of a wav file with a format and a data chunk,
/// and optionally metadata. The reader is positioned at the first frame
/// after construction.
pub struct WavReader<R> {
    reader: R,
    data: DataChunk,
    list: Option<ListChunk>,
}

/// A block of frames produced by `Blocks`.
pub trait Block {
    /// The number of frames in the block.
    fn num_frames(&self) -> usize;
}

impl Block for Frames {
    fn num_frames(&self) -> usize {
        self.len()
    }
}

impl<T> Block for Vec<Vec<T>> {
    fn num_frames(&self) -> usize {
        self.len()
    }
}

/// An iterator that yields blocks of frames read from a `WavReader`.
///
/// Iteration stops when the end of the data is reached, or after the first
/// error has been yielded.
pub struct Blocks<'wr, R, T>
    where R: 'wr
{
    reader: &'wr mut WavReader<R>,
    block_len: Option<usize>,
    read_block: fn(&mut WavReader<R>, Option<usize>) -> Result<T>,
    done: bool,
}

impl<R> WavReader<R>
    where R: io::Read + io::Seek
{
    /// Attempts to create a reader that reads the WAVE format.
    ///
    /// The header is read immediately. Reading the data will be done on
    /// demand.
    pub fn new(mut reader: R) -> Result<WavReader<R>> {
        let (_riff, mut data, list) = read_chunks(&mut reader)?;
        data.rewind(&mut reader)?;
        Ok(WavReader {
            reader: reader,
            data: data,
            list: list,
        })
    }

    /// Returns the properties of the file, suitable for writing a copy.
    pub fn spec(&self) -> WavSpec {
        let format = self.data.format();
        WavSpec {
            sample_rate: format.sample_rate(),
            channels: Some(format.channels()),
            bits_per_sample: format.bits_per_sample(),
            format: format.format(),
            extensible: format.is_extensible(),
        }
    }

    /// The number of channels.
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

    /// The sample format, `Pcm` or `IeeeFloat`, also for extensible files.
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

    /// The number of frames in the file.
    pub fn num_frames(&self) -> u32 {
        self.data.num_frames()
    }

    /// The duration of the file in seconds.
    pub fn duration(&self) -> f64 {
        match self.sample_rate() {
            0 => 0.0,
            rate => self.num_frames() as f64 / rate as f64,
        }
    }

    /// The duration formatted as `h:mm:ss.ss`.
    pub fn hms(&self) -> String {
        format_hms(self.duration())
    }

    /// The `LIST/INFO` metadata, if the file has any.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.list.as_ref().and_then(|list| list.info())
    }

    /// Reads up to `num_frames` frames in the native sample format of the
    /// file, or all remaining frames when `None`.
    pub fn read(&mut self, num_frames: Option<usize>) -> Result<Frames> {
        match self.format() {
            WavFormat::IeeeFloat => Ok(Frames::Float(self.data.read_frames(&mut self.reader, num_frames)?)),
            _ => Ok(Frames::Int(self.data.read_frames(&mut self.reader, num_frames)?)),
        }
    }

    /// Reads frames as integers, converting float samples to the bit depth
    /// of the file.
    pub fn read_int(&mut self, num_frames: Option<usize>) -> Result<Vec<Vec<i64>>> {
        match self.read(num_frames)? {
            Frames::Int(frames) => Ok(frames),
            Frames::Float(frames) => {
                let bits = self.bits_per_sample();
                Ok(frames.into_iter()
                    .map(|frame| frame.into_iter().map(|x| float_to_int(x, bits, true)).collect())
                    .collect())
            }
        }
    }

    /// Reads frames as floats in the range [-1, 1), converting integer
    /// samples.
    pub fn read_float(&mut self, num_frames: Option<usize>) -> Result<Vec<Vec<f64>>> {
        match self.read(num_frames)? {
            Frames::Float(frames) => Ok(frames),
            Frames::Int(frames) => {
                let bits = self.bits_per_sample();
                let signed = bits > 8;
                Ok(frames.into_iter()
                    .map(|frame| frame.into_iter().map(|x| int_to_float(x, bits, signed)).collect())
                    .collect())
            }
        }
    }

    /// Returns an iterator over blocks of `block_len` native frames.
    ///
    /// With `None`, the first block holds all remaining frames.
    pub fn iter(&mut self, block_len: Option<usize>) -> Blocks<R, Frames> {
        Blocks::new(self, block_len, WavReader::read)
    }

    /// Returns an iterator over blocks of integer frames.
    pub fn iter_int(&mut self, block_len: Option<usize>) -> Blocks<R, Vec<Vec<i64>>> {
        Blocks::new(self, block_len, WavReader::read_int)
    }

    /// Returns an iterator over blocks of float frames.
    pub fn iter_float(&mut self, block_len: Option<usize>) -> Blocks<R, Vec<Vec<f64>>> {
        Blocks::new(self, block_len, WavReader::read_float)
    }

    /// Moves to a frame relative to `whence`, and returns the absolute frame
    /// index.
    pub fn seek(&mut self, frame: i64, whence: Whence) -> Result<u32> {
        self.data.seek(&mut self.reader, frame, whence)
    }

    /// The index of the next frame to read.
    pub fn tell(&self) -> u32 {
        self.data.tell()
    }

    /// Destroys the `WavReader` and returns the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl WavReader<io::BufReader<fs::File>> {
    /// Attempts to create a reader that reads from the specified file.
    ///
    /// This is a convenience constructor that opens a `File`, wraps it in a
    /// `BufReader` and then constructs a `WavReader` from it.
    pub fn open<P: AsRef<path::Path>>(filename: P) -> Result<WavReader<io::BufReader<fs::File>>> {
        let file = fs::File::open(filename)?;
        let buf_reader = io::BufReader::new(file);
        WavReader::new(buf_reader)
    }
}

impl<'wr, R, T> Blocks<'wr, R, T>
    where R: io::Read + io::Seek
{
    fn new(reader: &'wr mut WavReader<R>,
           block_len: Option<usize>,
           read_block: fn(&mut WavReader<R>, Option<usize>) -> Result<T>)
           -> Blocks<'wr, R, T> {
        Blocks {
            reader: reader,
            block_len: block_len,
            read_block: read_block,
            done: false,
        }
    }
}

impl<'wr, R, T> Iterator for Blocks<'wr, R, T>
    where R: io::Read + io::Seek,
          T: Block
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        if self.done {
            return None;
        }
        match (self.read_block)(&mut *self.reader, self.block_len) {
            Ok(block) => {
                if block.num_frames() == 0 {
                    self.done = true;
                    None
                } else {
                    Some(Ok(block))
                }
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{ReadExt, WavReader};
    use crate::{Error, WavFormat};

    /// A 16-bit mono file at 8 kHz with the given extra chunks and samples.
    fn wav_bytes(before_data: &[u8], samples: &[i16]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(b"WAVE");
        body.extend_from_slice(b"fmt \x10\x00\x00\x00\x01\x00\x01\x00\x40\x1f\x00\x00\
                                 \x80\x3e\x00\x00\x02\x00\x10\x00");
        body.extend_from_slice(before_data);
        body.extend_from_slice(b"data");
        body.extend_from_slice(&((samples.len() * 2) as u32).to_le_bytes());
        for sample in samples {
            body.extend_from_slice(&sample.to_le_bytes());
        }
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&body);
        bytes
    }

    #[test]
    fn read_le_int_extends_sign() {
        let mut input = &[0xff_u8, 0xff, 0xff, 0x00, 0x00, 0x80][..];
        assert_eq!(input.read_le_int(3).unwrap(), -1);
        assert_eq!(input.read_le_int(3).unwrap(), -8_388_608);
    }

    #[test]
    fn read_le_uint_rejects_bad_width() {
        let mut input = &[0u8; 16][..];
        assert!(input.read_le_uint(0).is_err());
        assert!(input.read_le_uint(9).is_err());
        assert!(input.read_le_float(2).is_err());
    }

    #[test]
    fn reads_minimal_pcm_file() {
        let bytes = wav_bytes(&[], &[0, 1000, -1000]);
        let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.channels(), 1);
        assert_eq!(reader.sample_rate(), 8000);
        assert_eq!(reader.format(), WavFormat::Pcm);
        assert!(!reader.is_extensible());
        assert_eq!(reader.num_frames(), 3);
        assert!(reader.metadata().is_none());
        assert_eq!(reader.read_int(None).unwrap(), vec![vec![0], vec![1000], vec![-1000]]);
    }

    #[test]
    fn unknown_chunks_are_skipped() {
        // An odd-sized chunk, followed by its pad byte.
        let bytes = wav_bytes(b"junk\x03\x00\x00\x00abc\x00", &[7, 8]);
        let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.read_int(None).unwrap(), vec![vec![7], vec![8]]);
    }

    #[test]
    fn blocks_stop_at_the_end() {
        let bytes = wav_bytes(&[], &[1, 2, 3, 4, 5]);
        let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
        let lens: Vec<usize> = reader.iter_int(Some(2))
            .map(|block| block.unwrap().len())
            .collect();
        assert_eq!(lens, vec![2, 2, 1]);
        assert_eq!(reader.tell(), 5);
    }

    #[test]
    fn non_riff_input_is_rejected() {
        let bytes = b"OggS\x00\x02\x00\x00\x00\x00\x00\x00\x00\x00".to_vec();
        match WavReader::new(Cursor::new(bytes)) {
            Err(Error::ReadError(..)) => {}
            other => panic!("expected read error, got {:?}", other.err()),
        }
    }
}
