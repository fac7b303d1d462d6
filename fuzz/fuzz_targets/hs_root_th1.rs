#![no_main]

use hs_core::{Histogram1D, ImportOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the class; the decoder must reject, never panic.
    let class_name = if data[0] & 1 == 0 { "TH1D" } else { "TH1F" };
    if let Ok(h) = hs_root::read_histogram(&data[1..], class_name) {
        let _ = Histogram1D::from_external(&h, &ImportOptions::variance());
    }
});
