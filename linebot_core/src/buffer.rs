//! Fixed-capacity motion sample ring shared between the background sampler
//! and the telemetry server.
//!
//! One mutex guards the (slots, write_index, count) triple as a unit, so a
//! reader mid-drain can never observe a half-advanced cursor.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Wire size of one encoded sample.
pub const RECORD_BYTES: u8 = 6;

/// One recorded motion sample: a wrapping 16-bit millisecond timestamp and
/// the signed wheel encoder pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sample {
    pub timestamp_ms: u16,
    pub left: i16,
    pub right: i16,
}

impl Sample {
    /// Little-endian wire encoding: timestamp, left, right.
    pub fn encode(&self) -> [u8; RECORD_BYTES as usize] {
        let mut out = [0u8; RECORD_BYTES as usize];
        out[0..2].copy_from_slice(&self.timestamp_ms.to_le_bytes());
        out[2..4].copy_from_slice(&self.left.to_le_bytes());
        out[4..6].copy_from_slice(&self.right.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8; RECORD_BYTES as usize]) -> Self {
        Self {
            timestamp_ms: u16::from_le_bytes([bytes[0], bytes[1]]),
            left: i16::from_le_bytes([bytes[2], bytes[3]]),
            right: i16::from_le_bytes([bytes[4], bytes[5]]),
        }
    }
}

/// Overwrite-on-wrap ring of samples. `write_index` advances modulo the
/// capacity; `count` grows to the capacity and stays there, so new samples
/// silently replace the oldest once full.
#[derive(Debug)]
pub struct SampleRing {
    slots: Vec<Sample>,
    write_index: usize,
    count: usize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![Sample::default(); capacity],
            write_index: 0,
            count: 0,
        }
    }

    /// Append one sample. The slot is fully written before `count` moves, so
    /// a reader gated on `count` never sees an uninitialized slot.
    pub fn push(&mut self, sample: Sample) {
        self.slots[self.write_index] = sample;
        self.write_index = (self.write_index + 1) % self.slots.len();
        self.count = (self.count + 1).min(self.slots.len());
    }

    /// Sample at ring slot `index`, if that slot holds a valid sample.
    pub fn get(&self, index: usize) -> Option<Sample> {
        if index < self.count {
            Some(self.slots[index])
        } else {
            None
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn write_index(&self) -> usize {
        self.write_index
    }

    /// Drop all samples and rewind the cursor. Used by CLOSE_CONN so that
    /// slot indices and the count gate stay consistent for the next session.
    pub fn clear(&mut self) {
        self.write_index = 0;
        self.count = 0;
    }
}

/// Cloneable handle to the ring; the sampler appends through one clone while
/// the telemetry server reads through another.
#[derive(Debug, Clone)]
pub struct SharedSampleBuffer {
    inner: Arc<Mutex<SampleRing>>,
}

impl SharedSampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SampleRing::new(capacity))),
        }
    }

    /// Acquire the ring guard. A poisoned lock is recovered rather than
    /// propagated: the ring holds plain data that is valid at every step.
    pub fn lock(&self) -> MutexGuard<'_, SampleRing> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, sample: Sample) {
        self.lock().push(sample);
    }

    pub fn count(&self) -> usize {
        self.lock().count()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }
}
