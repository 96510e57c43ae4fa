//! Background motion sampling.
//!
//! Spawns a thread that owns the `Odometer`, appends one sample per period
//! into the shared ring, and shuts down promptly when dropped. The thread is
//! the only writer; the telemetry server is the only reader.

use crate::buffer::{Sample, SharedSampleBuffer};
use crossbeam_channel as xch;
use linebot_traits::Odometer;
use linebot_traits::clock::Clock;
use std::time::Duration;

pub struct MotionSampler {
    shutdown: xch::Sender<()>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl MotionSampler {
    /// Spawn the sampling thread at `hz`. Timestamps are milliseconds since
    /// spawn, wrapped into the 16-bit record field.
    pub fn spawn<O, C>(mut odometer: O, buffer: SharedSampleBuffer, hz: u32, clock: C) -> Self
    where
        O: Odometer + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let (shutdown_tx, shutdown_rx) = xch::bounded::<()>(1);
        let period = Duration::from_micros(crate::util::period_us(hz));
        let ticker = xch::tick(period);
        let epoch = clock.now();

        let join_handle = std::thread::spawn(move || {
            loop {
                xch::select! {
                    recv(shutdown_rx) -> _ => {
                        tracing::debug!("sampler thread received shutdown signal");
                        break;
                    }
                    recv(ticker) -> _ => {
                        match odometer.counts() {
                            Ok((left, right)) => {
                                let timestamp_ms = (clock.ms_since(epoch) & 0xFFFF) as u16;
                                buffer.push(Sample { timestamp_ms, left, right });
                            }
                            Err(e) => {
                                // Skip the sample; the ring only ever holds
                                // fully written records.
                                tracing::warn!(error = %e, "odometer read failed, sample skipped");
                            }
                        }
                    }
                }
            }
            tracing::trace!("sampler thread exiting cleanly");
        });

        Self {
            shutdown: shutdown_tx,
            join_handle: Some(join_handle),
        }
    }
}

impl Drop for MotionSampler {
    fn drop(&mut self) {
        // Wake the select immediately; if the thread already exited the
        // channel is disconnected and the send result does not matter.
        let _ = self.shutdown.try_send(());
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("sampler thread joined successfully"),
                Err(e) => tracing::warn!(?e, "sampler thread panicked during shutdown"),
            }
        }
    }
}
