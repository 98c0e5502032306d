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
use std::io::{Read, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::trace;

use super::{Error, Result};
use crate::read::ReadExt;

/// The length of a chunk header: a 4-byte tag and a 32-bit size.
pub const HEADER_LEN: u32 = 8;

/// Chunk contents are aligned to this many bytes.
const ALIGN: u32 = 2;

/// The form type of a RIFF chunk that holds audio.
const WAVE: [u8; 4] = *b"WAVE";

/// Identifies a chunk by its 4-byte tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkId {
    /// The outer `RIFF` container.
    Riff,
    /// The `fmt ` chunk.
    Fmt,
    /// The `data` chunk.
    Data,
    /// A `LIST` chunk.
    List,
    /// Any other chunk.
    Unknown([u8; 4]),
}

impl ChunkId {
    /// Classifies a tag read from a file.
    pub fn from_tag(tag: [u8; 4]) -> ChunkId {
        match &tag {
            b"RIFF" => ChunkId::Riff,
            b"fmt " => ChunkId::Fmt,
            b"data" => ChunkId::Data,
            b"LIST" => ChunkId::List,
            _ => ChunkId::Unknown(tag),
        }
    }

    /// The tag as it is stored in the file.
    pub fn tag(self) -> [u8; 4] {
        match self {
            ChunkId::Riff => *b"RIFF",
            ChunkId::Fmt => *b"fmt ",
            ChunkId::Data => *b"data",
            ChunkId::List => *b"LIST",
            ChunkId::Unknown(tag) => tag,
        }
    }
}

/// The header of a chunk and a cursor into its content.
///
/// `size` is the declared content length, excluding the header and the pad
/// byte that follows odd-sized content. The cursor `position` is relative to
/// the content start. Writing past the current size extends it.
#[derive(Clone, Debug)]
pub struct Chunk {
    id: ChunkId,
    start: u64,
    size: u32,
    position: u32,
}

impl Chunk {
    /// Reads a chunk header at the current position of the stream.
    ///
    /// The stream is left at the start of the content.
    pub fn read_header<R>(reader: &mut R) -> Result<Chunk>
        where R: io::Read + io::Seek
    {
        let start = reader.stream_position()?;
        let tag = reader.read_4_bytes()?;
        let size = reader.read_u32::<LittleEndian>()?;
        Ok(Chunk {
            id: ChunkId::from_tag(tag),
            start: start,
            size: size,
            position: 0,
        })
    }

    /// Writes a header with size zero at the current position of the stream.
    pub fn begin<W>(writer: &mut W, id: ChunkId) -> Result<Chunk>
        where W: io::Write + io::Seek
    {
        let start = writer.stream_position()?;
        writer.write_all(&id.tag())?;
        writer.write_u32::<LittleEndian>(0)?;
        Ok(Chunk {
            id: id,
            start: start,
            size: 0,
            position: 0,
        })
    }

    /// The kind of the chunk.
    pub fn id(&self) -> ChunkId {
        self.id
    }

    /// The absolute offset of the chunk header.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// The declared content length in bytes.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The absolute offset of the first content byte.
    pub fn content_start(&self) -> u64 {
        self.start + HEADER_LEN as u64
    }

    /// The cursor, relative to the content start.
    pub fn position(&self) -> u32 {
        self.position
    }

    /// The number of pad bytes that follow the content, 0 or 1.
    pub fn pad(&self) -> u32 {
        self.size % ALIGN
    }

    /// The number of bytes the chunk occupies, header and pad included.
    pub fn total_len(&self) -> u64 {
        HEADER_LEN as u64 + self.size as u64 + self.pad() as u64
    }

    /// The absolute offset just past the content, and optionally the pad.
    pub fn content_end(&self, include_pad: bool) -> u64 {
        let pad = if include_pad { self.pad() } else { 0 };
        self.content_start() + self.size as u64 + pad as u64
    }

    /// Overrides the declared size, for containers whose size is computed.
    pub fn set_size(&mut self, size: u32) {
        self.size = size;
    }

    /// Moves the stream past the content of the chunk.
    pub fn skip<S: io::Seek>(&mut self, stream: &mut S, include_pad: bool) -> Result<()> {
        stream.seek(SeekFrom::Start(self.content_end(include_pad)))?;
        self.position = self.size;
        Ok(())
    }

    /// Moves the stream to an offset relative to the content start.
    pub fn seek_content<S: io::Seek>(&mut self, stream: &mut S, position: u32) -> Result<()> {
        stream.seek(SeekFrom::Start(self.content_start() + position as u64))?;
        self.position = position;
        Ok(())
    }

    /// Fills the buffer with content at the cursor.
    pub fn read<R: io::Read>(&mut self, reader: &mut R, buf: &mut [u8]) -> Result<()> {
        let end = self.advance(buf.len())
            .ok_or(Error::FormatError("read past the end of the chunk"))?;
        reader.read_exact(buf)?;
        self.position = end;
        Ok(())
    }

    /// Reads `len` bytes of content at the cursor.
    ///
    /// The buffer grows with the bytes actually present, so a size field that
    /// overstates the content does not cause a large allocation.
    pub fn read_vec<R: io::Read>(&mut self, reader: &mut R, len: usize) -> Result<Vec<u8>> {
        let end = self.advance(len)
            .ok_or(Error::FormatError("read past the end of the chunk"))?;
        let mut buf = Vec::new();
        reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
        if buf.len() < len {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        self.position = end;
        Ok(buf)
    }

    /// Writes content at the cursor, growing the size when writing past it.
    pub fn write<W: io::Write>(&mut self, writer: &mut W, bytes: &[u8]) -> Result<()> {
        let end = self.advance(bytes.len())
            .ok_or(Error::WriteError("chunk size would exceed 4 GiB"))?;
        writer.write_all(bytes)?;
        self.position = end;
        self.size = cmp::max(self.size, end);
        Ok(())
    }

    /// Writes zero bytes after the content without counting them in the size.
    ///
    /// The cursor is not moved, so the stream is left `len` bytes past it.
    pub fn write_padding<W: io::Write>(&self, writer: &mut W, len: u32) -> Result<()> {
        for _ in 0..len {
            writer.write_u8(0)?;
        }
        Ok(())
    }

    /// Rewrites the header with the current size.
    ///
    /// Fails when fewer than `min_size` bytes of content have been written.
    /// The stream is left after the header.
    pub fn finalize<W>(&self, writer: &mut W, min_size: u32) -> Result<()>
        where W: io::Write + io::Seek
    {
        if self.size < min_size {
            return Err(Error::WriteError("required data have not been written to the chunk"));
        }
        trace!("patching {:?} chunk at offset {} with size {}", self.id, self.start, self.size);
        writer.seek(SeekFrom::Start(self.start))?;
        writer.write_all(&self.id.tag())?;
        writer.write_u32::<LittleEndian>(self.size)?;
        Ok(())
    }

    fn advance(&self, len: usize) -> Option<u32> {
        u32::try_from(len).ok().and_then(|len| self.position.checked_add(len))
    }
}

/// The outer RIFF container with form type `WAVE`.
#[derive(Clone, Debug)]
pub struct RiffChunk {
    chunk: Chunk,
    form_type: [u8; 4],
}

impl RiffChunk {
    /// Reads a RIFF header and its form type at the current position.
    pub fn read<R: io::Read + io::Seek>(reader: &mut R) -> Result<RiffChunk> {
        let header = Chunk::read_header(reader)?;
        RiffChunk::parse(header, reader)
    }

    /// Reads the form type that follows an already read header.
    pub fn parse<R: io::Read>(mut chunk: Chunk, reader: &mut R) -> Result<RiffChunk> {
        if chunk.id() != ChunkId::Riff {
            return Err(Error::ReadError("no RIFF tag found"));
        }
        let mut form_type = [0u8; 4];
        chunk.read(reader, &mut form_type)?;
        if form_type != WAVE {
            return Err(Error::ReadError("RIFF form type is not WAVE"));
        }
        Ok(RiffChunk {
            chunk: chunk,
            form_type: form_type,
        })
    }

    /// Writes a RIFF header and the `WAVE` form type.
    pub fn create<W: io::Write + io::Seek>(writer: &mut W) -> Result<RiffChunk> {
        let mut chunk = Chunk::begin(writer, ChunkId::Riff)?;
        chunk.write(writer, &WAVE)?;
        Ok(RiffChunk {
            chunk: chunk,
            form_type: WAVE,
        })
    }

    /// The header and cursor of the container.
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    /// Patches the container size to hold the form type and the children.
    ///
    /// `children_len` is the summed `total_len` of the direct children.
    pub fn finalize<W>(&mut self, writer: &mut W, children_len: u64) -> Result<()>
        where W: io::Write + io::Seek
    {
        if self.form_type != WAVE {
            return Err(Error::WriteError("RIFF form type has not been written"));
        }
        let size = u32::try_from(WAVE.len() as u64 + children_len)
            .map_err(|_| Error::WriteError("file size would exceed 4 GiB"))?;
        self.chunk.set_size(size);
        self.chunk.finalize(writer, WAVE.len() as u32)
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::io::Cursor;

    use super::{Chunk, ChunkId, RiffChunk};
    use crate::Error;

    #[test]
    fn write_grows_size_only_past_the_end() {
        let mut buffer = Cursor::new(Vec::new());
        let mut chunk = Chunk::begin(&mut buffer, ChunkId::Data).unwrap();
        chunk.write(&mut buffer, &[1, 2, 3, 4]).unwrap();
        assert_eq!(chunk.size(), 4);
        chunk.seek_content(&mut buffer, 1).unwrap();
        chunk.write(&mut buffer, &[9]).unwrap();
        assert_eq!(chunk.size(), 4);
        assert_eq!(chunk.position(), 2);
        chunk.finalize(&mut buffer, 0).unwrap();
        assert_eq!(buffer.into_inner(), b"data\x04\x00\x00\x00\x01\x09\x03\x04");
    }

    #[test]
    fn odd_sized_chunks_are_padded() {
        let mut buffer = Cursor::new(Vec::new());
        let mut chunk = Chunk::begin(&mut buffer, ChunkId::Unknown(*b"junk")).unwrap();
        chunk.write(&mut buffer, &[1, 2, 3]).unwrap();
        assert_eq!(chunk.pad(), 1);
        assert_eq!(chunk.total_len(), 12);
        assert_eq!(chunk.content_end(false), 11);
        assert_eq!(chunk.content_end(true), 12);
    }

    #[test]
    fn finalize_requires_minimum_size() {
        let mut buffer = Cursor::new(Vec::new());
        let mut chunk = Chunk::begin(&mut buffer, ChunkId::Fmt).unwrap();
        chunk.write(&mut buffer, &[0; 8]).unwrap();
        match chunk.finalize(&mut buffer, 16) {
            Err(Error::WriteError(..)) => {}
            other => panic!("expected write error, got {:?}", other),
        }
    }

    #[test]
    fn header_read_back_matches_written_header() {
        let mut buffer = Cursor::new(Vec::new());
        let mut chunk = Chunk::begin(&mut buffer, ChunkId::List).unwrap();
        chunk.write(&mut buffer, b"INFO").unwrap();
        chunk.finalize(&mut buffer, 4).unwrap();
        buffer.set_position(0);
        let header = Chunk::read_header(&mut buffer).unwrap();
        assert_eq!(header.id(), ChunkId::List);
        assert_eq!(header.size(), 4);
        assert_eq!(header.content_start(), 8);
        assert_eq!(buffer.position(), 8);
    }

    #[test]
    fn read_vec_reports_missing_content() {
        let mut buffer = Cursor::new(b"data\x08\x00\x00\x00\x01\x02\x03".to_vec());
        let mut header = Chunk::read_header(&mut buffer).unwrap();
        assert_eq!(header.read_vec(&mut buffer, 2).unwrap(), vec![1, 2]);
        assert_eq!(header.position(), 2);
        match header.read_vec(&mut buffer, 6) {
            Err(Error::IoError(ref err)) if err.kind() == io::ErrorKind::UnexpectedEof => {}
            other => panic!("expected unexpected EOF, got {:?}", other),
        }
        assert_eq!(header.position(), 2);
    }

    #[test]
    fn skip_tolerates_empty_chunks() {
        let mut buffer = Cursor::new(b"junk\x00\x00\x00\x00data".to_vec());
        let mut header = Chunk::read_header(&mut buffer).unwrap();
        header.skip(&mut buffer, true).unwrap();
        assert_eq!(buffer.position(), 8);
    }

    #[test]
    fn riff_requires_wave_form_type() {
        let mut wave = Cursor::new(b"RIFF\x04\x00\x00\x00WAVE".to_vec());
        assert!(RiffChunk::read(&mut wave).is_ok());

        let mut avi = Cursor::new(b"RIFF\x04\x00\x00\x00AVI ".to_vec());
        match RiffChunk::read(&mut avi) {
            Err(Error::ReadError(..)) => {}
            other => panic!("expected read error, got {:?}", other),
        }

        let mut list = Cursor::new(b"LIST\x04\x00\x00\x00WAVE".to_vec());
        match RiffChunk::read(&mut list) {
            Err(Error::ReadError(..)) => {}
            other => panic!("expected read error, got {:?}", other),
        }
    }

    #[test]
    fn riff_size_covers_form_type_and_children() {
        let mut buffer = Cursor::new(Vec::new());
        let mut riff = RiffChunk::create(&mut buffer).unwrap();
        riff.finalize(&mut buffer, 24 + 12).unwrap();
        assert_eq!(riff.chunk().size(), 40);
        assert_eq!(&buffer.get_ref()[..8], b"RIFF\x28\x00\x00\x00");
    }
}
