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
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::str::FromStr;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use log::debug;

use super::{Error, Result};
use crate::chunk::{Chunk, ChunkId, HEADER_LEN};

/// The list type of a `LIST` chunk with textual metadata.
const INFO: [u8; 4] = *b"INFO";

/// A metadata field that can be stored in a `LIST/INFO` chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InfoItem {
    /// The title, stored as `INAM`.
    Track,
    /// The album or product, stored as `IPRD`.
    Album,
    /// The artist, stored as `IART`.
    Artist,
    /// The creation date, stored as `ICRD`.
    Date,
    /// The track number, stored as `ITRK`.
    TrackNumber,
    /// A free-form comment, stored as `ICMT`.
    Comment,
    /// The genre, stored as `IGNR`.
    Genre,
}

impl InfoItem {
    /// All fields, in storage order.
    pub const ALL: [InfoItem; 7] = [
        InfoItem::Track,
        InfoItem::Album,
        InfoItem::Artist,
        InfoItem::Date,
        InfoItem::TrackNumber,
        InfoItem::Comment,
        InfoItem::Genre,
    ];

    /// The 4-byte tag of the INFO record.
    pub fn tag(self) -> [u8; 4] {
        match self {
            InfoItem::Track => *b"INAM",
            InfoItem::Album => *b"IPRD",
            InfoItem::Artist => *b"IART",
            InfoItem::Date => *b"ICRD",
            InfoItem::TrackNumber => *b"ITRK",
            InfoItem::Comment => *b"ICMT",
            InfoItem::Genre => *b"IGNR",
        }
    }

    /// Looks up the field stored under an INFO record tag.
    pub fn from_tag(tag: [u8; 4]) -> Option<InfoItem> {
        InfoItem::ALL.iter().cloned().find(|item| item.tag() == tag)
    }

    /// The name used to refer to the field, e.g. `track_number`.
    pub fn name(self) -> &'static str {
        match self {
            InfoItem::Track => "track",
            InfoItem::Album => "album",
            InfoItem::Artist => "artist",
            InfoItem::Date => "date",
            InfoItem::TrackNumber => "track_number",
            InfoItem::Comment => "comment",
            InfoItem::Genre => "genre",
        }
    }
}

impl FromStr for InfoItem {
    type Err = Error;

    fn from_str(name: &str) -> Result<InfoItem> {
        InfoItem::ALL.iter().cloned().find(|item| item.name() == name).ok_or(
            Error::WriteError("unknown metadata field, expected one of track, album, \
                               artist, date, track_number, comment, genre"))
    }
}

impl AsRef<str> for InfoItem {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

impl fmt::Display for InfoItem {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// The value of a metadata field.
///
/// Values that parse as an integer when read are returned as `Number`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InfoValue {
    /// Free text.
    Text(String),
    /// An integer, such as a track number.
    Number(i64),
}

impl InfoValue {
    /// Interprets text read from a record.
    fn from_text(text: &str) -> InfoValue {
        match text.trim().parse::<i64>() {
            Ok(number) => InfoValue::Number(number),
            Err(..) => InfoValue::Text(text.to_string()),
        }
    }

    /// The bytes stored in the record, without terminator.
    pub(crate) fn to_ascii(&self) -> Result<Vec<u8>> {
        let text = self.to_string();
        if !text.is_ascii() {
            return Err(Error::WriteError("metadata values must be ASCII text"));
        }
        Ok(text.into_bytes())
    }
}

impl fmt::Display for InfoValue {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            InfoValue::Text(ref text) => formatter.write_str(text),
            InfoValue::Number(number) => write!(formatter, "{}", number),
        }
    }
}

impl<'a> From<&'a str> for InfoValue {
    fn from(text: &'a str) -> InfoValue {
        InfoValue::Text(text.to_string())
    }
}

impl From<String> for InfoValue {
    fn from(text: String) -> InfoValue {
        InfoValue::Text(text)
    }
}

impl From<i64> for InfoValue {
    fn from(number: i64) -> InfoValue {
        InfoValue::Number(number)
    }
}

impl From<i32> for InfoValue {
    fn from(number: i32) -> InfoValue {
        InfoValue::Number(number as i64)
    }
}

impl From<u32> for InfoValue {
    fn from(number: u32) -> InfoValue {
        InfoValue::Number(number as i64)
    }
}

/// Metadata fields and their values.
pub type Metadata = BTreeMap<InfoItem, InfoValue>;

/// A `LIST` chunk. Only lists of type `INFO` carry metadata.
///
/// The pad byte after an odd-sized INFO record is written but not counted in
/// the declared size, so the chunk may occupy more bytes than its header says.
#[derive(Clone, Debug)]
pub struct ListChunk {
    chunk: Chunk,
    info: Option<Metadata>,
    /// The number of content bytes the chunk occupies in the file.
    occupied: u64,
}

impl ListChunk {
    /// Reads a `LIST` chunk at the current position of the stream.
    pub fn read<R: io::Read + io::Seek>(reader: &mut R) -> Result<ListChunk> {
        let header = Chunk::read_header(reader)?;
        ListChunk::parse(header, reader)
    }

    /// Reads the records of a `LIST` chunk whose header was already read.
    ///
    /// Records with unknown tags are skipped. A list of a type other than
    /// `INFO` yields no metadata. Record pad bytes are accepted whether or not
    /// the declared size counts them.
    pub fn parse<R: io::Read + io::Seek>(mut chunk: Chunk, reader: &mut R) -> Result<ListChunk> {
        if chunk.id() != ChunkId::List {
            return Err(Error::ReadError("expected LIST chunk"));
        }
        let size = chunk.size() as u64;
        let mut list_type = [0u8; 4];
        chunk.read(reader, &mut list_type)?;
        if list_type != INFO {
            debug!("ignoring LIST chunk of type {:?}", String::from_utf8_lossy(&list_type));
            return Ok(ListChunk { chunk: chunk, info: None, occupied: size });
        }

        let mut info = Metadata::new();
        let mut record = [0u8; 8];
        // Bytes consumed, not counting record pads.
        let mut counted = INFO.len() as u64;
        let mut occupied = counted;
        while counted + record.len() as u64 <= size {
            chunk.read(reader, &mut record)?;
            let tag = [record[0], record[1], record[2], record[3]];
            let len = LittleEndian::read_u32(&record[4..]) as u64;
            let value_start = chunk.position() as u64;
            if counted + record.len() as u64 + len > size {
                return Err(Error::FormatError("INFO record exceeds its LIST chunk"));
            }

            match InfoItem::from_tag(tag) {
                Some(item) => {
                    let value = chunk.read_vec(reader, len as usize)?;
                    if !value.is_ascii() {
                        return Err(Error::FormatError("INFO values must be ASCII text"));
                    }
                    let text: String = value.iter().map(|&b| b as char).collect();
                    info.insert(item, InfoValue::from_text(text.trim_end_matches('\0')));
                }
                None => {
                    debug!("skipping INFO record {:?}", String::from_utf8_lossy(&tag));
                }
            }

            counted += record.len() as u64 + len;
            occupied = value_start + len + len % 2;
            let next = u32::try_from(occupied)
                .map_err(|_| Error::FormatError("INFO record exceeds its LIST chunk"))?;
            chunk.seek_content(reader, next)?;
        }

        Ok(ListChunk {
            chunk: chunk,
            info: Some(info),
            occupied: cmp::max(occupied, size),
        })
    }

    /// Writes a `LIST/INFO` chunk with the given fields at the current
    /// position.
    ///
    /// The stream is left after the last record and its pad byte.
    pub fn create<W>(writer: &mut W, info: Metadata) -> Result<ListChunk>
        where W: io::Write + io::Seek
    {
        let mut records = Vec::with_capacity(info.len());
        for (item, value) in &info {
            let text = value.to_ascii()?;
            let len = u32::try_from(text.len())
                .map_err(|_| Error::WriteError("metadata value is too long"))?;
            let mut record = Vec::with_capacity(8 + text.len());
            record.extend_from_slice(&item.tag());
            record.write_u32::<LittleEndian>(len)?;
            record.extend_from_slice(&text);
            records.push(record);
        }

        let mut chunk = Chunk::begin(writer, ChunkId::List)?;
        chunk.write(writer, &INFO)?;
        let mut padding = 0;
        for record in &records {
            chunk.write(writer, record)?;
            if record.len() % 2 == 1 {
                chunk.write_padding(writer, 1)?;
                padding += 1;
            }
        }
        let occupied = chunk.size() as u64 + padding;
        Ok(ListChunk { chunk: chunk, info: Some(info), occupied: occupied })
    }

    /// The header and cursor of the chunk.
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    /// The metadata, if this is an `INFO` list.
    pub fn info(&self) -> Option<&Metadata> {
        self.info.as_ref()
    }

    /// The number of bytes the chunk occupies, header and pad bytes included.
    pub fn total_len(&self) -> u64 {
        HEADER_LEN as u64 + self.occupied + self.occupied % 2
    }

    /// The absolute offset just past the chunk and its pad bytes.
    pub fn end(&self) -> u64 {
        self.chunk.start() + self.total_len()
    }

    /// Patches the chunk header.
    pub fn finalize<W>(&self, writer: &mut W) -> Result<()>
        where W: io::Write + io::Seek
    {
        self.chunk.finalize(writer, INFO.len() as u32)
    }
}
