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

use std::io::Cursor;

use wavfile::{read_chunks, Error, InfoItem, InfoValue, WavReader, WavSpec, WavWriter};

fn tags(bytes: &[u8]) -> Vec<[u8; 4]> {
    // Walks the top-level chunks after the RIFF header and form type.
    let mut tags = Vec::new();
    let mut pos = 12;
    while pos + 8 <= bytes.len() {
        let tag = [bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]];
        let size = u32::from_le_bytes([bytes[pos + 4], bytes[pos + 5], bytes[pos + 6], bytes[pos + 7]]) as usize;
        tags.push(tag);
        pos += 8 + size + size % 2;
    }
    tags
}

#[test]
fn metadata_before_audio_precedes_data_chunk() {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut buffer, WavSpec::default()).unwrap();
        writer.add_metadata(vec![
            ("track", InfoValue::from("Song")),
            ("artist", InfoValue::from("Band")),
            ("track_number", InfoValue::from(3)),
        ]).unwrap();
        writer.write_int(&[vec![100, -100], vec![200, -200]]).unwrap();
        writer.finalize().unwrap();
    }

    let bytes = buffer.into_inner();
    assert_eq!(tags(&bytes), vec![*b"fmt ", *b"LIST", *b"data"]);
    let riff_size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    assert_eq!(riff_size + 8, bytes.len());

    let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
    let metadata = reader.metadata().unwrap();
    assert_eq!(metadata[&InfoItem::Track], InfoValue::Text("Song".to_string()));
    assert_eq!(metadata[&InfoItem::Artist], InfoValue::Text("Band".to_string()));
    assert_eq!(metadata[&InfoItem::TrackNumber], InfoValue::Number(3));
    assert_eq!(reader.read_int(None).unwrap(), vec![vec![100, -100], vec![200, -200]]);
}

#[test]
fn metadata_after_audio_follows_data_chunk() {
    let mut buffer = Cursor::new(Vec::new());
    {
        let spec = WavSpec { bits_per_sample: 8, channels: Some(1), ..WavSpec::default() };
        let mut writer = WavWriter::new(&mut buffer, spec).unwrap();
        // An odd number of bytes, so the data chunk needs a pad byte.
        writer.write_int(&[vec![10], vec![20], vec![30]]).unwrap();
        writer.add_metadata(vec![("comment", "odd"), ("genre", "Test")]).unwrap();
        match writer.write_int(&[vec![40]]) {
            Err(Error::WriteError(..)) => {}
            other => panic!("expected write error, got {:?}", other),
        }
        writer.finalize().unwrap();
    }

    let bytes = buffer.into_inner();
    assert_eq!(tags(&bytes), vec![*b"fmt ", *b"data", *b"LIST"]);
    let riff_size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    assert_eq!(riff_size + 8, bytes.len());

    let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
    assert_eq!(reader.num_frames(), 3);
    assert_eq!(reader.read_int(None).unwrap(), vec![vec![10], vec![20], vec![30]]);
    let metadata = reader.metadata().unwrap();
    assert_eq!(metadata.len(), 2);
    assert_eq!(metadata[&InfoItem::Comment], InfoValue::from("odd"));
    assert_eq!(metadata[&InfoItem::Genre], InfoValue::from("Test"));
}

#[test]
fn chunk_scan_exposes_all_chunks() {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut buffer, WavSpec::default()).unwrap();
        writer.add_metadata(vec![("album", "Record")]).unwrap();
        writer.write_int(&[vec![5, 6]]).unwrap();
        writer.finalize().unwrap();
    }

    let (riff, data, list) = read_chunks(&mut buffer).unwrap();
    assert_eq!(riff.chunk().size() as usize + 8, buffer.get_ref().len());
    assert_eq!(data.num_frames(), 1);
    assert_eq!(data.format().block_align(), 4);
    let list = list.unwrap();
    assert_eq!(list.info().unwrap()[&InfoItem::Album], InfoValue::from("Record"));
}

#[test]
fn files_without_metadata_report_none() {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut buffer, WavSpec::default()).unwrap();
        writer.write_int(&[vec![5, 6]]).unwrap();
        writer.finalize().unwrap();
    }
    buffer.set_position(0);
    let reader = WavReader::new(&mut buffer).unwrap();
    assert!(reader.metadata().is_none());
}

#[test]
fn record_pads_before_audio_are_not_counted() {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut buffer, WavSpec::default()).unwrap();
        // Two odd-length values, so two pad bytes the LIST size leaves out.
        writer.add_metadata(vec![("track", "abc"), ("artist", "xyz")]).unwrap();
        writer.write_int(&[vec![7, -7]]).unwrap();
        writer.finalize().unwrap();
    }

    let bytes = buffer.into_inner();
    // fmt chunk, then LIST at offset 36: INFO and two 11-byte records.
    assert_eq!(&bytes[36..44], b"LIST\x1a\x00\x00\x00");
    assert_eq!(&bytes[72..76], b"data");
    let riff_size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    assert_eq!(riff_size + 8, bytes.len());

    let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
    let metadata = reader.metadata().unwrap();
    assert_eq!(metadata[&InfoItem::Track], InfoValue::from("abc"));
    assert_eq!(metadata[&InfoItem::Artist], InfoValue::from("xyz"));
    assert_eq!(reader.read_int(None).unwrap(), vec![vec![7, -7]]);
}

#[test]
fn metadata_survives_switch_to_extensible_format() {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut buffer, WavSpec::default()).unwrap();
        writer.add_metadata(vec![("genre", "Ambient")]).unwrap();
        writer.write_int(&[vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
        writer.finalize().unwrap();
    }

    let bytes = buffer.into_inner();
    assert_eq!(tags(&bytes), vec![*b"fmt ", *b"LIST", *b"data"]);
    assert_eq!(&bytes[12..20], b"fmt \x28\x00\x00\x00");

    let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
    assert!(reader.is_extensible());
    assert_eq!(reader.channels(), 3);
    assert_eq!(reader.metadata().unwrap()[&InfoItem::Genre], InfoValue::from("Ambient"));
    assert_eq!(reader.read_int(None).unwrap(), vec![vec![1, 2, 3], vec![4, 5, 6]]);
}
