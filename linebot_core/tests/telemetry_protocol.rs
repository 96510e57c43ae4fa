//! Wire-level behavior of the telemetry download protocol, both through the
//! pure request handler and end-to-end over a loopback transport.

use linebot_core::buffer::{Sample, SharedSampleBuffer};
use linebot_core::telemetry::{
    CMD_CLOSE_CONN, CMD_GET_HEADER, CMD_GET_RECORD, ERROR_BYTE, SessionControl, TelemetryServer,
    handle_request,
};
use linebot_hardware::LoopbackTransport;
use linebot_traits::Transport;
use std::time::Duration;

fn sample(t: u16) -> Sample {
    Sample {
        timestamp_ms: t,
        left: t as i16 * 2,
        right: -(t as i16),
    }
}

fn request(cmd: u8, index: u16) -> [u8; 4] {
    let idx = index.to_le_bytes();
    [cmd, 0, idx[0], idx[1]]
}

#[test]
fn record_download_reflects_ring_slots_after_wrap() {
    // Six samples into a four-slot ring leave [s4, s5, s2, s3].
    let buf = SharedSampleBuffer::new(4);
    for t in 0..6 {
        buf.push(sample(t));
    }
    for (index, want) in [(0u16, 4u16), (1, 5), (2, 2), (3, 3)] {
        let (resp, ctl) =
            handle_request(&request(CMD_GET_RECORD, index), &buf).expect("response");
        assert_eq!(ctl, SessionControl::Continue);
        assert_eq!(resp.len(), 10);
        assert_eq!(resp[0], CMD_GET_RECORD);
        assert_eq!(resp[1], 6);
        assert_eq!(u16::from_le_bytes([resp[2], resp[3]]), index);
        let mut record = [0u8; 6];
        record.copy_from_slice(&resp[4..]);
        assert_eq!(Sample::decode(&record), sample(want));
    }
}

#[test]
fn out_of_range_index_yields_error_packet() {
    let buf = SharedSampleBuffer::new(4);
    buf.push(sample(0));
    // Only slot 0 holds a sample; slot 1 is still unwritten.
    let (resp, ctl) = handle_request(&request(CMD_GET_RECORD, 1), &buf).expect("response");
    assert_eq!(ctl, SessionControl::Continue);
    assert_eq!(resp, vec![ERROR_BYTE, CMD_GET_RECORD, 0, 1, 0]);
}

#[test]
fn close_drains_the_ring_and_ends_the_session() {
    let buf = SharedSampleBuffer::new(4);
    for t in 0..6 {
        buf.push(sample(t));
    }
    let (resp, ctl) = handle_request(&request(CMD_CLOSE_CONN, 0), &buf).expect("response");
    assert_eq!(resp, vec![CMD_CLOSE_CONN, 0, 0, 0]);
    assert_eq!(ctl, SessionControl::Close);
    assert_eq!(buf.count(), 0);
    // A fresh session starts writing at slot 0 again.
    buf.push(sample(9));
    assert_eq!(buf.lock().get(0), Some(sample(9)));
    assert_eq!(buf.lock().write_index(), 1);
}

#[test]
fn live_count_gates_records_between_requests() {
    // The sampler keeps appending mid-session; an index that was invalid
    // becomes valid once the ring catches up.
    let buf = SharedSampleBuffer::new(8);
    buf.push(sample(0));
    let (resp, _) = handle_request(&request(CMD_GET_RECORD, 1), &buf).expect("response");
    assert_eq!(resp[0], ERROR_BYTE);
    buf.push(sample(1));
    let (resp, _) = handle_request(&request(CMD_GET_RECORD, 1), &buf).expect("response");
    assert_eq!(resp[0], CMD_GET_RECORD);
}

#[test]
fn server_answers_over_a_loopback_link() {
    let (server_side, mut client) = LoopbackTransport::pair();
    let buf = SharedSampleBuffer::new(100);
    buf.push(sample(7));
    let server = TelemetryServer::spawn(server_side, buf.clone(), Duration::from_millis(50));

    let mut resp = [0u8; 16];

    client.send(&request(CMD_GET_HEADER, 0)).expect("send");
    let n = client.recv(&mut resp, Duration::from_secs(2)).expect("recv");
    assert_eq!(&resp[..n], &[CMD_GET_HEADER, 6, 100, 0]);

    // A short frame is ignored: no response, the next request still works.
    client.send(&[CMD_GET_RECORD, 0]).expect("send short");
    client.send(&request(CMD_GET_RECORD, 0)).expect("send");
    let n = client.recv(&mut resp, Duration::from_secs(2)).expect("recv");
    assert_eq!(n, 10);
    assert_eq!(resp[0], CMD_GET_RECORD);
    let mut record = [0u8; 6];
    record.copy_from_slice(&resp[4..10]);
    assert_eq!(Sample::decode(&record), sample(7));

    // Unknown command gets the error packet, session stays open.
    client.send(&request(0x42, 3)).expect("send");
    let n = client.recv(&mut resp, Duration::from_secs(2)).expect("recv");
    assert_eq!(&resp[..n], &[ERROR_BYTE, 0x42, 0, 3, 0]);

    client.send(&request(CMD_CLOSE_CONN, 0)).expect("send");
    let n = client.recv(&mut resp, Duration::from_secs(2)).expect("recv");
    assert_eq!(&resp[..n], &[CMD_CLOSE_CONN, 0, 0, 0]);
    assert_eq!(buf.count(), 0);

    // Session ended by the reader; drop joins the exited thread.
    drop(server);
}

#[test]
fn server_drop_shuts_the_session_down() {
    let (server_side, _client) = LoopbackTransport::pair();
    let buf = SharedSampleBuffer::new(10);
    let server = TelemetryServer::spawn(server_side, buf, Duration::from_millis(20));
    std::thread::sleep(Duration::from_millis(60));
    drop(server); // joins without hanging
}
