#![no_main]
use libfuzzer_sys::fuzz_target;
use linebot_core::buffer::{Sample, SharedSampleBuffer};
use linebot_core::telemetry::handle_request;

fuzz_target!(|data: &[u8]| {
    // Arbitrary request frames against a partially filled ring: the handler
    // must never panic and must answer every frame of 4+ bytes.
    let buffer = SharedSampleBuffer::new(16);
    for t in 0..10u16 {
        buffer.push(Sample {
            timestamp_ms: t,
            left: t as i16,
            right: -(t as i16),
        });
    }
    let response = handle_request(data, &buffer);
    if data.len() >= 4 {
        assert!(response.is_some());
    } else {
        assert!(response.is_none());
    }
});
