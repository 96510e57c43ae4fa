//! Session orchestration: the supervisory loop plus its two background
//! threads (motion sampler and telemetry server).

use crate::buffer::SharedSampleBuffer;
use crate::error::Result;
use crate::sampler::MotionSampler;
use crate::supervisor::Supervisor;
use crate::telemetry::TelemetryServer;
use linebot_traits::clock::MonotonicClock;
use linebot_traits::{Odometer, Transport};
use std::time::Duration;

/// Run the robot until `stop` returns true, recording odometry in the
/// background and serving telemetry downloads over `transport`.
///
/// Both background threads are joined before this returns; the sample buffer
/// comes back to the caller so a post-run dump can still read it.
pub fn run_session<O, T, F>(
    supervisor: &mut Supervisor,
    odometer: O,
    transport: T,
    telemetry: &linebot_config::TelemetryCfg,
    stop: F,
) -> Result<SharedSampleBuffer>
where
    O: Odometer + Send + 'static,
    T: Transport + Send + 'static,
    F: Fn() -> bool,
{
    let buffer = SharedSampleBuffer::new(telemetry.capacity);

    let sampler = MotionSampler::spawn(
        odometer,
        buffer.clone(),
        telemetry.sampler_hz,
        MonotonicClock::new(),
    );
    let server = TelemetryServer::spawn(
        transport,
        buffer.clone(),
        Duration::from_millis(telemetry.recv_timeout_ms),
    );

    tracing::info!(
        capacity = telemetry.capacity,
        sampler_hz = telemetry.sampler_hz,
        "session start"
    );
    supervisor.begin();
    let run_result = supervisor.run_until(stop);

    // Join the threads before reporting, so a supervisor error still leaves
    // no thread running.
    drop(server);
    drop(sampler);

    run_result?;
    tracing::info!(samples = buffer.count(), "session end");
    Ok(buffer)
}
