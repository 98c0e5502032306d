// Wavfile -- A RIFF/WAVE chunk codec in Rust
// Copyright (C) 2026 The wavfile developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use wavfile::{Frames, WavReader, WavSpec, WavWriter};

fuzz_target!(|data: &[u8]| {
    // Only valid files with at least one channel are of interest.
    let (spec, frames, metadata) = {
        let mut reader = match WavReader::new(Cursor::new(data)) {
            Ok(r) => r,
            Err(..) => return,
        };
        if reader.channels() == 0 || reader.sample_rate() == 0 {
            return;
        }
        let frames = match reader.read(None) {
            Ok(frames) => frames,
            Err(..) => return,
        };
        (reader.spec(), frames, reader.metadata().cloned())
    };

    // Write the frames back with an explicit sample type, so that integer
    // blocks of small magnitude are not taken as floats.
    let mut buffer = Cursor::new(Vec::new());
    {
        // Some readable headers, such as a byte rate beyond 32 bits, cannot
        // be written; neither can text that is not ASCII.
        let mut writer = match WavWriter::new(&mut buffer, spec) {
            Ok(w) => w,
            Err(..) => return,
        };
        if let Some(ref metadata) = metadata {
            if writer.add_metadata(metadata.iter().map(|(k, v)| (*k, v.clone()))).is_err() {
                return;
            }
        }
        match frames {
            Frames::Int(ref rows) => writer.write_int(rows).unwrap(),
            Frames::Float(ref rows) => writer.write_float(rows).unwrap(),
        }
        writer.finalize().unwrap();
    }

    buffer.set_position(0);
    let mut reader = WavReader::new(buffer).expect("Reading wav failed after rewrite.");
    // Plain headers may be rewritten as extensible ones.
    assert_eq!(WavSpec { extensible: false, ..reader.spec() },
               WavSpec { extensible: false, ..spec });
    let frames_after = reader.read(None).unwrap();
    match (&frames, &frames_after) {
        // NaN never compares equal, and its payload may change in the f32
        // round trip.
        (&Frames::Float(ref a), &Frames::Float(ref b)) => {
            let bits = |rows: &Vec<Vec<f64>>| -> Vec<u64> {
                rows.iter().flatten()
                    .map(|x| if x.is_nan() { u64::MAX } else { x.to_bits() })
                    .collect()
            };
            assert_eq!(bits(a), bits(b));
        }
        _ => assert_eq!(frames, frames_after),
    }
});
