pub mod error;

use linebot_traits::{DriveMotor, LightSensor, Odometer, TouchSensor, Transport};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use error::HwError;

/// Simulated light sensor fed by a scripted brightness sequence.
/// Once the script is exhausted the last value repeats, so a scenario can
/// end in a steady state without padding its script.
pub struct SimulatedLineSensor {
    script: VecDeque<u16>,
    last: u16,
}

impl SimulatedLineSensor {
    pub fn scripted(script: impl IntoIterator<Item = u16>) -> Self {
        let script: VecDeque<u16> = script.into_iter().collect();
        let last = script.back().copied().unwrap_or(0);
        Self { script, last }
    }

    pub fn steady(brightness: u16) -> Self {
        Self {
            script: VecDeque::new(),
            last: brightness,
        }
    }
}

impl LightSensor for SimulatedLineSensor {
    fn brightness(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(v) = self.script.pop_front() {
            self.last = v;
        }
        Ok(self.last)
    }
}

/// Shared view of a simulated motor's last commanded duty.
#[derive(Debug, Clone)]
pub struct MotorHandle(Arc<AtomicI32>);

impl MotorHandle {
    pub fn last_pwm(&self) -> i32 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Simulated drive motor that records the last commanded PWM duty.
pub struct SimulatedMotor {
    name: &'static str,
    pwm: Arc<AtomicI32>,
}

impl SimulatedMotor {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            pwm: Arc::new(AtomicI32::new(0)),
        }
    }

    pub fn handle(&self) -> MotorHandle {
        MotorHandle(self.pwm.clone())
    }
}

impl DriveMotor for SimulatedMotor {
    fn set_pwm(&mut self, duty: i8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.pwm.store(i32::from(duty), Ordering::Relaxed);
        tracing::debug!(motor = self.name, duty, "pwm set (simulated)");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.pwm.store(0, Ordering::Relaxed);
        tracing::debug!(motor = self.name, "motor stopped (simulated)");
        Ok(())
    }
}

/// Simulated bump sensor that reports pressed after a fixed number of polls.
pub struct SimulatedTouch {
    press_after: u32,
    polls: AtomicU32,
}

impl SimulatedTouch {
    pub fn press_after(polls: u32) -> Self {
        Self {
            press_after: polls,
            polls: AtomicU32::new(0),
        }
    }

    pub fn never() -> Self {
        Self::press_after(u32::MAX)
    }
}

impl TouchSensor for SimulatedTouch {
    fn is_pressed(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let n = self.polls.fetch_add(1, Ordering::Relaxed);
        Ok(n >= self.press_after)
    }
}

/// Simulated wheel encoders that integrate the attached motors' duty.
/// Counts advance by duty/10 per poll and wrap in i16, matching the 16-bit
/// encoder registers the telemetry record carries.
pub struct SimulatedOdometer {
    left_motor: MotorHandle,
    right_motor: MotorHandle,
    left: i16,
    right: i16,
}

impl SimulatedOdometer {
    pub fn attached(left_motor: MotorHandle, right_motor: MotorHandle) -> Self {
        Self {
            left_motor,
            right_motor,
            left: 0,
            right: 0,
        }
    }
}

impl Odometer for SimulatedOdometer {
    fn counts(&mut self) -> Result<(i16, i16), Box<dyn std::error::Error + Send + Sync>> {
        let dl = (self.left_motor.last_pwm() / 10) as i16;
        let dr = (self.right_motor.last_pwm() / 10) as i16;
        self.left = self.left.wrapping_add(dl);
        self.right = self.right.wrapping_add(dr);
        Ok((self.left, self.right))
    }
}

struct InboxState {
    frames: VecDeque<Vec<u8>>,
    closed: bool,
}

struct Inbox {
    state: Mutex<InboxState>,
    cv: Condvar,
}

impl Inbox {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(InboxState {
                frames: VecDeque::new(),
                closed: false,
            }),
            cv: Condvar::new(),
        })
    }
}

/// In-memory frame-oriented duplex transport. `pair()` returns the two
/// connected endpoints; dropping either closes the link for the other.
pub struct LoopbackTransport {
    inbox: Arc<Inbox>,
    peer: Arc<Inbox>,
}

impl LoopbackTransport {
    pub fn pair() -> (Self, Self) {
        let a = Inbox::new();
        let b = Inbox::new();
        (
            Self {
                inbox: a.clone(),
                peer: b.clone(),
            },
            Self { inbox: b, peer: a },
        )
    }
}

impl Transport for LoopbackTransport {
    fn recv(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        let mut state = self
            .inbox
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let deadline = std::time::Instant::now() + timeout;
        loop {
            if let Some(frame) = state.frames.pop_front() {
                let n = frame.len().min(buf.len());
                buf[..n].copy_from_slice(&frame[..n]);
                return Ok(n);
            }
            if state.closed {
                return Err(Box::new(HwError::Disconnected));
            }
            let now = std::time::Instant::now();
            if now >= deadline {
                return Ok(0);
            }
            let (guard, _) = self
                .inbox
                .cv
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            state = guard;
        }
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut state = self
            .peer
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if state.closed {
            return Err(Box::new(HwError::Disconnected));
        }
        state.frames.push_back(frame.to_vec());
        self.peer.cv.notify_one();
        Ok(())
    }
}

impl Drop for LoopbackTransport {
    fn drop(&mut self) {
        for side in [&self.inbox, &self.peer] {
            let mut state = side
                .state
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            state.closed = true;
            side.cv.notify_all();
        }
    }
}
