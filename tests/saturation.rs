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

// The logger is process-global, so this file holds a single test.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{Level, LevelFilter, Log, Metadata, Record};
use wavfile::{WavReader, WavSpec, WavWriter};

struct SaturationCounter;

static SATURATION_WARNINGS: AtomicUsize = AtomicUsize::new(0);
static LOGGER: SaturationCounter = SaturationCounter;

impl Log for SaturationCounter {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record) {
        if record.level() == Level::Warn && record.args().to_string().starts_with("saturating") {
            SATURATION_WARNINGS.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn flush(&self) {}
}

fn write_saturated(bits: u16, frames: &[&[Vec<i64>]]) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    {
        let spec = WavSpec { bits_per_sample: bits, channels: Some(1), ..WavSpec::default() };
        let mut writer = WavWriter::new(&mut buffer, spec).unwrap();
        for block in frames {
            writer.write_int(block).unwrap();
        }
        writer.finalize().unwrap();
    }
    buffer.into_inner()
}

#[test]
fn out_of_range_samples_saturate_with_a_single_warning() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Warn);

    // Several out-of-range writes to one file warn once.
    let bytes = write_saturated(16, &[
        &[vec![40000], vec![-40000]],
        &[vec![100]],
        &[vec![1 << 20]],
    ]);
    assert_eq!(SATURATION_WARNINGS.load(Ordering::SeqCst), 1);

    let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
    assert_eq!(reader.read_int(None).unwrap(),
               vec![vec![32767], vec![-32768], vec![100], vec![32767]]);

    // Unsigned 8-bit samples clamp to [0, 255]; a new writer warns again.
    let bytes = write_saturated(8, &[&[vec![-1], vec![256], vec![7]]]);
    assert_eq!(SATURATION_WARNINGS.load(Ordering::SeqCst), 2);

    let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
    assert_eq!(reader.read_int(None).unwrap(), vec![vec![0], vec![255], vec![7]]);

    // 24-bit samples clamp to 24 bits, not to the 32-bit container of i64.
    let bytes = write_saturated(24, &[&[vec![i64::MAX], vec![i64::MIN]]]);
    assert_eq!(SATURATION_WARNINGS.load(Ordering::SeqCst), 3);

    let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
    assert_eq!(reader.read_int(None).unwrap(), vec![vec![8_388_607], vec![-8_388_608]]);

    // In-range writes do not warn.
    write_saturated(16, &[&[vec![32767], vec![-32768]]]);
    assert_eq!(SATURATION_WARNINGS.load(Ordering::SeqCst), 3);
}
