// Wavfile -- A RIFF/WAVE chunk codec in Rust
// Copyright (C) 2026 The wavfile developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use wavfile::{WavReader, Whence};

fuzz_target!(|data: &[u8]| {
    let mut reader = match WavReader::new(Cursor::new(data)) {
        Ok(r) => r,
        Err(..) => return,
    };

    let _ = reader.metadata();
    let _ = reader.hms();

    for block in reader.iter(Some(256)) {
        match block {
            Ok(..) => { }
            Err(..) => return,
        }
    }

    // The end of the data is a valid seek target; one past it is not.
    let num_frames = reader.num_frames() as i64;
    assert!(reader.seek(0, Whence::End).is_ok());
    assert!(reader.seek(num_frames + 1, Whence::Start).is_err());
});
