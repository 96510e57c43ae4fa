//! Telemetry download client: drives the wire protocol over a loopback link
//! and prints each record as a JSON line.

use eyre::WrapErr;
use linebot_core::buffer::{RECORD_BYTES, Sample, SharedSampleBuffer};
use linebot_core::telemetry::{
    CMD_CLOSE_CONN, CMD_GET_HEADER, CMD_GET_RECORD, ERROR_BYTE, TelemetryServer,
};
use linebot_hardware::LoopbackTransport;
use linebot_traits::Transport;
use std::time::Duration;

fn request(cmd: u8, index: u16) -> [u8; 4] {
    let idx = index.to_le_bytes();
    [cmd, 0, idx[0], idx[1]]
}

fn exchange(
    client: &mut LoopbackTransport,
    req: [u8; 4],
    timeout: Duration,
) -> eyre::Result<Vec<u8>> {
    client
        .send(&req)
        .map_err(|e| eyre::eyre!("telemetry send failed: {e}"))?;
    let mut buf = [0u8; 4 + RECORD_BYTES as usize];
    let n = client
        .recv(&mut buf, timeout)
        .map_err(|e| eyre::eyre!("telemetry recv failed: {e}"))?;
    if n == 0 {
        eyre::bail!("telemetry download timed out");
    }
    Ok(buf[..n].to_vec())
}

/// Download every stored record from `buffer` through the real server loop
/// and print them as JSON lines. Returns the number of records printed.
pub fn download_and_print(
    buffer: &SharedSampleBuffer,
    recv_timeout: Duration,
) -> eyre::Result<usize> {
    let (server_side, mut client) = LoopbackTransport::pair();
    let _server = TelemetryServer::spawn(server_side, buffer.clone(), recv_timeout);
    let timeout = Duration::from_secs(2);

    let header = exchange(&mut client, request(CMD_GET_HEADER, 0), timeout)?;
    if header.len() < 4 || header[0] != CMD_GET_HEADER {
        eyre::bail!("unexpected header response: {header:?}");
    }
    let capacity = u16::from_le_bytes([header[2], header[3]]);
    tracing::debug!(capacity, "telemetry header received");

    let mut printed = 0usize;
    for index in 0..capacity {
        let resp = exchange(&mut client, request(CMD_GET_RECORD, index), timeout)?;
        if resp.first() == Some(&ERROR_BYTE) {
            // Past the last stored record.
            break;
        }
        if resp.len() < 4 + RECORD_BYTES as usize {
            eyre::bail!("truncated record response: {resp:?}");
        }
        let mut record = [0u8; RECORD_BYTES as usize];
        record.copy_from_slice(&resp[4..4 + RECORD_BYTES as usize]);
        let sample = Sample::decode(&record);
        let line = serde_json::json!({
            "index": index,
            "timestamp_ms": sample.timestamp_ms,
            "left": sample.left,
            "right": sample.right,
        });
        println!("{line}");
        printed += 1;
    }

    let bye = exchange(&mut client, request(CMD_CLOSE_CONN, 0), timeout)
        .wrap_err("closing telemetry session")?;
    if bye.first() != Some(&CMD_CLOSE_CONN) {
        eyre::bail!("unexpected close response: {bye:?}");
    }
    Ok(printed)
}
