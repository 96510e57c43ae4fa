//! Telemetry download protocol.
//!
//! Requests are 4-byte little-endian frames: command, reserved, 16-bit
//! record index. The server answers GET_HEADER with the ring geometry,
//! GET_RECORD with one raw record, CLOSE_CONN by draining the ring and
//! ending the session, and anything else with an ERROR packet. Frames
//! shorter than 4 bytes are ignored and the transport re-polled.
//!
//! Each exchange computes its response while holding the ring guard, so the
//! index gate and the slot read see one consistent (write_index, count)
//! snapshot even while the sampler keeps appending between exchanges.

use crate::buffer::{RECORD_BYTES, SharedSampleBuffer};
use linebot_traits::Transport;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub const CMD_GET_HEADER: u8 = 0xF0;
pub const CMD_GET_RECORD: u8 = 0xFF;
pub const CMD_CLOSE_CONN: u8 = 0x00;
/// Leading byte of the ERROR packet; the offending request header follows.
pub const ERROR_BYTE: u8 = 0xAA;
/// Minimum request length to be processed.
pub const REQUEST_BYTES: usize = 4;

/// Parsed view of one 4-byte request header. Lives for a single exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    pub command: u8,
    pub reserved: u8,
    pub index: u16,
}

impl RequestHeader {
    /// Parse a request frame; None for short reads (ignored, re-polled).
    pub fn parse(frame: &[u8]) -> Option<Self> {
        if frame.len() < REQUEST_BYTES {
            return None;
        }
        Some(Self {
            command: frame[0],
            reserved: frame[1],
            index: u16::from_le_bytes([frame[2], frame[3]]),
        })
    }

    fn echo(self) -> [u8; REQUEST_BYTES] {
        let idx = self.index.to_le_bytes();
        [self.command, self.reserved, idx[0], idx[1]]
    }
}

fn header_bytes(command: u8, byte1: u8, index: u16) -> [u8; REQUEST_BYTES] {
    let idx = index.to_le_bytes();
    [command, byte1, idx[0], idx[1]]
}

/// Whether the session continues after an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionControl {
    Continue,
    Close,
}

/// Serve one request frame against the ring. Returns None for frames too
/// short to process (no response is sent); otherwise the response bytes and
/// whether the session stays open.
pub fn handle_request(
    frame: &[u8],
    buffer: &SharedSampleBuffer,
) -> Option<(Vec<u8>, SessionControl)> {
    let header = RequestHeader::parse(frame)?;
    // Guard held for the whole exchange; released on every path below.
    let mut ring = buffer.lock();
    let response = match header.command {
        CMD_GET_HEADER => {
            let capacity = ring.capacity() as u16;
            (
                header_bytes(CMD_GET_HEADER, RECORD_BYTES, capacity).to_vec(),
                SessionControl::Continue,
            )
        }
        CMD_GET_RECORD => match ring.get(usize::from(header.index)) {
            Some(sample) => {
                let mut out =
                    header_bytes(CMD_GET_RECORD, RECORD_BYTES, header.index).to_vec();
                out.extend_from_slice(&sample.encode());
                (out, SessionControl::Continue)
            }
            // Out-of-range index falls through to the error path.
            None => error_packet(header),
        },
        CMD_CLOSE_CONN => {
            ring.clear();
            (
                header_bytes(CMD_CLOSE_CONN, 0, 0).to_vec(),
                SessionControl::Close,
            )
        }
        _ => error_packet(header),
    };
    Some(response)
}

fn error_packet(header: RequestHeader) -> (Vec<u8>, SessionControl) {
    let mut out = Vec::with_capacity(1 + REQUEST_BYTES);
    out.push(ERROR_BYTE);
    out.extend_from_slice(&header.echo());
    // Recovered locally; the session keeps serving.
    (out, SessionControl::Continue)
}

/// Telemetry session thread: polls the transport, answers requests, exits on
/// CLOSE_CONN, transport failure, or drop.
pub struct TelemetryServer {
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl TelemetryServer {
    pub fn spawn<T>(mut transport: T, buffer: SharedSampleBuffer, recv_timeout: Duration) -> Self
    where
        T: Transport + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = shutdown.clone();

        let join_handle = std::thread::spawn(move || {
            let mut frame = [0u8; REQUEST_BYTES];
            loop {
                if shutdown_flag.load(Ordering::Relaxed) {
                    tracing::debug!("telemetry server received shutdown signal");
                    break;
                }
                match transport.recv(&mut frame, recv_timeout) {
                    Ok(n) => {
                        let Some((response, control)) = handle_request(&frame[..n], &buffer)
                        else {
                            // Short read (or poll timeout); re-poll.
                            continue;
                        };
                        if let Err(e) = transport.send(&response) {
                            tracing::warn!(error = %e, "telemetry send failed, ending session");
                            break;
                        }
                        if control == SessionControl::Close {
                            tracing::info!("telemetry session closed by reader");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "telemetry transport error, ending session");
                        break;
                    }
                }
            }
            tracing::trace!("telemetry server exiting cleanly");
        });

        Self {
            shutdown,
            join_handle: Some(join_handle),
        }
    }
}

impl Drop for TelemetryServer {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("telemetry server joined successfully"),
                Err(e) => tracing::warn!(?e, "telemetry server panicked during shutdown"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Sample;

    #[test]
    fn short_frames_are_ignored() {
        let buf = SharedSampleBuffer::new(4);
        assert!(handle_request(&[], &buf).is_none());
        assert!(handle_request(&[CMD_GET_HEADER], &buf).is_none());
        assert!(handle_request(&[CMD_GET_HEADER, 0, 0], &buf).is_none());
    }

    #[test]
    fn header_reports_geometry_not_fill() {
        let buf = SharedSampleBuffer::new(1000);
        buf.push(Sample::default());
        let (resp, ctl) =
            handle_request(&[CMD_GET_HEADER, 0, 0, 0], &buf).expect("response");
        assert_eq!(ctl, SessionControl::Continue);
        assert_eq!(resp, vec![0xF0, 6, 0xE8, 0x03]); // 1000 LE
    }

    #[test]
    fn error_packet_echoes_the_request() {
        let buf = SharedSampleBuffer::new(4);
        let (resp, ctl) = handle_request(&[0x42, 7, 0x34, 0x12], &buf).expect("response");
        assert_eq!(ctl, SessionControl::Continue);
        assert_eq!(resp, vec![ERROR_BYTE, 0x42, 7, 0x34, 0x12]);
    }
}
