#![no_main]

use libfuzzer_sys::fuzz_target;
use pngscope::{InspectError, Options};

fuzz_target!(|data: &[u8]| {
    // Put the signature in front most of the time so the chunk scanner sees
    // the input.
    let mut buf = pngscope::signature::PNG_SIGNATURE.to_vec();
    if data.first().map_or(true, |b| b % 8 != 0) {
        buf.extend_from_slice(data);
    } else {
        buf = data.to_vec();
    }

    let report = match pngscope::inspect(&buf, &Options::all()) {
        Ok(report) => report,
        Err(InspectError::Partial { report, .. }) => *report,
        Err(InspectError::Decoding(_)) => return,
    };
    let records = report.chunks.records();
    for pair in records.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
    }
    serde_json::to_vec(&report).unwrap();
});
