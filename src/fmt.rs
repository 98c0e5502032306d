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

use std::io;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::warn;

use super::{Error, Result, WavFormat, WavSpec};
use crate::chunk::{Chunk, ChunkId};
use crate::data::SampleCodec;

// The format tags can be found in mmreg.h that is part of the Windows SDK.
// Only these three are handled.
pub const PCM: u16 = 0x0001;
pub const IEEE_FLOAT: u16 = 0x0003;
pub const EXTENSIBLE: u16 = 0xfffe;

/// The length of a WAVEFORMAT struct with `wBitsPerSample`.
const PLAIN_LEN: u32 = 16;

/// The length of a WAVEFORMATEXTENSIBLE struct.
const EXTENSIBLE_LEN: u32 = 40;

/// The value of `cbSize` for WAVEFORMATEXTENSIBLE.
const EXTENSION_LEN: u16 = 22;

/// The last 14 bytes of the KSDATAFORMAT_SUBTYPE GUIDs.
///
/// The sub-format GUID of an extensible chunk is the 16-bit format tag
/// followed by these bytes, e.g. 00000001-0000-0010-8000-00aa00389b71 for PCM.
pub const GUID_SUFFIX: [u8; 14] = [0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00,
                                   0x00, 0xaa, 0x00, 0x38, 0x9b, 0x71];

/// Generates a bitmask with `channels` ones in the least significant bits.
fn channel_mask(channels: u16) -> u32 {
    (0..channels.min(32)).map(|c| 1 << c).fold(0, |a, c| a | c)
}

/// The `fmt ` chunk, in its plain or extensible layout.
#[derive(Clone, Debug)]
pub struct FormatChunk {
    chunk: Chunk,
    /// `Pcm` or `IeeeFloat`; for extensible chunks, the sub-format.
    format: WavFormat,
    extensible: bool,
    channels: u16,
    sample_rate: u32,
    byte_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
    valid_bits_per_sample: u16,
    channel_mask: u32,
}

impl FormatChunk {
    /// Reads a `fmt ` chunk at the current position of the stream.
    pub fn read<R: io::Read + io::Seek>(reader: &mut R) -> Result<FormatChunk> {
        let header = Chunk::read_header(reader)?;
        FormatChunk::parse(header, reader)
    }

    /// Reads the body of a `fmt ` chunk whose header was already read.
    ///
    /// Trailing bytes beyond the fields that are understood are not consumed.
    pub fn parse<R: io::Read>(chunk: Chunk, reader: &mut R) -> Result<FormatChunk> {
        if chunk.id() != ChunkId::Fmt {
            return Err(Error::ReadError("expected fmt chunk"));
        }
        if chunk.size() < PLAIN_LEN {
            return Err(Error::FormatError("invalid fmt chunk size"));
        }

        let format_tag = reader.read_u16::<LittleEndian>()?;
        let channels = reader.read_u16::<LittleEndian>()?;
        let sample_rate = reader.read_u32::<LittleEndian>()?;
        let byte_rate = reader.read_u32::<LittleEndian>()?;
        let block_align = reader.read_u16::<LittleEndian>()?;
        let bits_per_sample = reader.read_u16::<LittleEndian>()?;

        // The number of bits used to store a sample; it must be a multiple of 8.
        if bits_per_sample == 0 || bits_per_sample % 8 != 0 {
            return Err(Error::FormatError("bits per sample is not a positive multiple of 8"));
        }

        let mut fmt = FormatChunk {
            chunk: chunk,
            format: WavFormat::Pcm,
            extensible: false,
            channels: channels,
            sample_rate: sample_rate,
            byte_rate: byte_rate,
            block_align: block_align,
            bits_per_sample: bits_per_sample,
            valid_bits_per_sample: bits_per_sample,
            channel_mask: 0,
        };

        match format_tag {
            PCM => {}
            IEEE_FLOAT => fmt.format = WavFormat::IeeeFloat,
            EXTENSIBLE => fmt.read_extension(reader)?,
            _ => return Err(Error::Unsupported),
        }

        match fmt.format {
            WavFormat::IeeeFloat if bits_per_sample != 32 && bits_per_sample != 64 => {
                return Err(Error::Unsupported);
            }
            WavFormat::Pcm if bits_per_sample > 64 => return Err(Error::Unsupported),
            _ => {}
        }

        // Samples are stored in containers of exactly `bits_per_sample` bits.
        if block_align as u32 != channels as u32 * (bits_per_sample / 8) as u32 {
            return Err(Error::FormatError("block align does not match channels and sample size"));
        }

        Ok(fmt)
    }

    /// Reads the WAVEFORMATEXTENSIBLE fields that follow the plain ones.
    fn read_extension<R: io::Read>(&mut self, reader: &mut R) -> Result<()> {
        // ```
        // typedef struct {
        //     WAVEFORMATEX Format;
        //     union {
        //         WORD wValidBitsPerSample;
        //         WORD wSamplesPerBlock;
        //         WORD wReserved;
        //     } Samples;
        //     DWORD        dwChannelMask;
        //     GUID         SubFormat;
        // } WAVEFORMATEXTENSIBLE;
        // ```
        if self.chunk.size() < EXTENSIBLE_LEN {
            return Err(Error::FormatError("unexpected fmt chunk size"));
        }
        let cb_size = reader.read_u16::<LittleEndian>()?;
        if cb_size < EXTENSION_LEN {
            return Err(Error::FormatError("unexpected WAVEFORMATEXTENSIBLE size"));
        }
        let valid_bits_per_sample = reader.read_u16::<LittleEndian>()?;
        let channel_mask = reader.read_u32::<LittleEndian>()?;
        let sub_format = reader.read_u16::<LittleEndian>()?;
        let mut suffix = [0u8; 14];
        reader.read_exact(&mut suffix)?;

        if suffix != GUID_SUFFIX {
            return Err(Error::Unsupported);
        }
        self.format = match sub_format {
            PCM => WavFormat::Pcm,
            IEEE_FLOAT => WavFormat::IeeeFloat,
            _ => return Err(Error::Unsupported),
        };
        self.extensible = true;
        self.channel_mask = channel_mask;
        // Zero means that all bits are valid.
        if valid_bits_per_sample != 0 {
            self.valid_bits_per_sample = valid_bits_per_sample;
        }
        Ok(())
    }

    /// Writes a `fmt ` chunk for `spec` at the current position.
    ///
    /// When `spec` does not fix the channel count, it is written as zero
    /// until `set_channels` is called and the chunk is finalized.
    pub fn create<W>(writer: &mut W, spec: &WavSpec) -> Result<FormatChunk>
        where W: io::Write + io::Seek
    {
        let chunk = Chunk::begin(writer, ChunkId::Fmt)?;
        let mut fmt = FormatChunk {
            chunk: chunk,
            format: match spec.format {
                WavFormat::Extensible => WavFormat::Pcm,
                format => format,
            },
            extensible: spec.needs_extensible(),
            channels: 0,
            sample_rate: spec.sample_rate,
            byte_rate: 0,
            block_align: 0,
            bits_per_sample: spec.bits_per_sample,
            valid_bits_per_sample: spec.bits_per_sample,
            channel_mask: 0,
        };
        if let Some(channels) = spec.channels {
            fmt.set_channels(channels)?;
        }
        fmt.write_body(writer)?;
        Ok(fmt)
    }

    /// Fixes the channel count and the fields derived from it.
    pub fn set_channels(&mut self, channels: u16) -> Result<()> {
        let block_align = u16::try_from(channels as u32 * self.bytes_per_sample() as u32)
            .map_err(|_| Error::WriteError("too many channels for the sample size"))?;
        let byte_rate = (block_align as u32).checked_mul(self.sample_rate)
            .ok_or(Error::WriteError("byte rate does not fit in 32 bits"))?;
        if !self.extensible && channels > 2 {
            warn!("writing {} channels without WAVE_FORMAT_EXTENSIBLE; \
                   players may not map the channels correctly", channels);
        }
        self.channels = channels;
        self.block_align = block_align;
        self.byte_rate = byte_rate;
        if self.extensible {
            self.channel_mask = channel_mask(channels);
        }
        Ok(())
    }

    fn write_body<W>(&mut self, writer: &mut W) -> Result<()>
        where W: io::Write + io::Seek
    {
        let mut body = Vec::with_capacity(EXTENSIBLE_LEN as usize);
        let format_tag = if self.extensible { EXTENSIBLE } else { self.format.code() };
        body.write_u16::<LittleEndian>(format_tag)?;
        body.write_u16::<LittleEndian>(self.channels)?;
        body.write_u32::<LittleEndian>(self.sample_rate)?;
        body.write_u32::<LittleEndian>(self.byte_rate)?;
        body.write_u16::<LittleEndian>(self.block_align)?;
        body.write_u16::<LittleEndian>(self.bits_per_sample)?;
        if self.extensible {
            body.write_u16::<LittleEndian>(EXTENSION_LEN)?;
            body.write_u16::<LittleEndian>(self.valid_bits_per_sample)?;
            body.write_u32::<LittleEndian>(self.channel_mask)?;
            body.write_u16::<LittleEndian>(self.format.code())?;
            body.extend_from_slice(&GUID_SUFFIX);
        }
        self.chunk.seek_content(writer, 0)?;
        self.chunk.write(writer, &body)
    }

    /// Rewrites the body with the final field values and patches the header.
    pub fn finalize<W>(&mut self, writer: &mut W) -> Result<()>
        where W: io::Write + io::Seek
    {
        self.write_body(writer)?;
        self.chunk.finalize(writer, PLAIN_LEN)
    }

    /// The header and cursor of the chunk.
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    /// The sample format, `Pcm` or `IeeeFloat`.
    pub fn format(&self) -> WavFormat {
        self.format
    }

    /// Whether the chunk uses the WAVEFORMATEXTENSIBLE layout.
    pub fn is_extensible(&self) -> bool {
        self.extensible
    }

    /// The number of channels, 0 while unknown.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// The number of frames per second.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The average number of bytes per second.
    pub fn byte_rate(&self) -> u32 {
        self.byte_rate
    }

    /// The number of bytes per frame.
    pub fn block_align(&self) -> u16 {
        self.block_align
    }

    /// The number of bits used to store a sample.
    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    /// The number of significant bits per sample.
    pub fn valid_bits_per_sample(&self) -> u16 {
        self.valid_bits_per_sample
    }

    /// The speaker position mask, 0 for plain chunks.
    pub fn channel_mask(&self) -> u32 {
        self.channel_mask
    }

    /// The number of bytes used to store a sample.
    pub fn bytes_per_sample(&self) -> u16 {
        self.bits_per_sample / 8
    }

    /// How samples are laid out in the data chunk.
    pub fn codec(&self) -> SampleCodec {
        match self.format {
            WavFormat::IeeeFloat => SampleCodec::Float { width: self.bytes_per_sample() },
            _ => SampleCodec::Pcm {
                // 8-bit samples are unsigned.
                signed: self.bits_per_sample > 8,
                width: self.bytes_per_sample(),
            },
        }
    }
}

#[test]
fn verify_channel_mask() {
    assert_eq!(channel_mask(0), 0);
    assert_eq!(channel_mask(1), 1);
    assert_eq!(channel_mask(2), 3);
    assert_eq!(channel_mask(3), 7);
    assert_eq!(channel_mask(6), 63);
    assert_eq!(channel_mask(40), 0xffff_ffff);
}
