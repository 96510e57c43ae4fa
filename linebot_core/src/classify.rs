//! Brightness classification: raw sensor readings into White/Gray/Black.
//!
//! Classification is a pure function of (brightness, thresholds); the
//! thresholds are fixed per deployment and never mutated at runtime. Gray is
//! the implicit "uncertain" bucket between the two cutoffs.

use std::collections::VecDeque;

/// Three-way surface classification of one light reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorClass {
    White,
    Gray,
    Black,
}

/// Brightness cutoffs separating the three classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub high: u16,
    pub low: u16,
}

impl Thresholds {
    pub const fn new(high: u16, low: u16) -> Self {
        Self { high, low }
    }

    /// `v > high` is White, `v < low` is Black, anything between is Gray.
    #[inline]
    pub fn classify(&self, brightness: u16) -> SensorClass {
        if brightness > self.high {
            SensorClass::White
        } else if brightness < self.low {
            SensorClass::Black
        } else {
            SensorClass::Gray
        }
    }
}

impl From<linebot_config::Thresholds> for Thresholds {
    fn from(t: linebot_config::Thresholds) -> Self {
        Self {
            high: t.high,
            low: t.low,
        }
    }
}

/// Windowed classifier for one sensor side: averages the last `window`
/// readings before thresholding to knock down single-sample noise.
///
/// Created at FSM episode entry and discarded at exit; the rolling window
/// never outlives the state that owns it.
#[derive(Debug)]
pub struct BrightnessClassifier {
    thresholds: Thresholds,
    window: usize,
    buf: VecDeque<u16>,
}

impl BrightnessClassifier {
    pub fn new(thresholds: Thresholds, window: usize) -> Self {
        let window = window.max(1);
        Self {
            thresholds,
            window,
            buf: VecDeque::with_capacity(window),
        }
    }

    /// Feed one raw reading and classify the windowed average.
    pub fn push(&mut self, brightness: u16) -> SensorClass {
        self.buf.push_back(brightness);
        if self.buf.len() > self.window {
            self.buf.pop_front();
        }
        let sum: u32 = self.buf.iter().copied().map(u32::from).sum();
        let len = self.buf.len() as u32;
        // len >= 1: we just pushed
        let avg = ((sum + len / 2) / len) as u16;
        self.thresholds.classify(avg)
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn reset(&mut self) {
        self.buf.clear();
    }
}
