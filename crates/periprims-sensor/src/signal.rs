//! Turning discharge times into on/off signals.
//!
//! A reflective mark and a dark gap give discharge times in two clusters.
//! [`Thresholds`] splits them with a dead band between, so readings that
//! drift near one boundary do not flap.

use std::time::Duration;

use crate::error::{Result, SensorError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Off,
    On,
    /// Between the two thresholds.
    Ambiguous,
}

impl Signal {
    /// Single-character form used when printing bit streams.
    pub fn as_char(self) -> char {
        match self {
            Signal::Off => '0',
            Signal::On => '1',
            Signal::Ambiguous => '?',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    on: Duration,
    off: Duration,
}

impl Thresholds {
    /// Readings shorter than `off` are [`Signal::Off`], longer than `on` are
    /// [`Signal::On`]. Requires `off <= on`.
    pub fn new(on: Duration, off: Duration) -> Result<Self> {
        if off > on {
            return Err(SensorError::InvalidThresholds { on, off });
        }
        Ok(Self { on, off })
    }

    pub fn from_micros(on: u64, off: u64) -> Result<Self> {
        Self::new(Duration::from_micros(on), Duration::from_micros(off))
    }

    pub fn on(&self) -> Duration {
        self.on
    }

    pub fn off(&self) -> Duration {
        self.off
    }

    pub fn classify(&self, elapsed: Duration) -> Signal {
        if elapsed < self.off {
            Signal::Off
        } else if elapsed > self.on {
            Signal::On
        } else {
            Signal::Ambiguous
        }
    }
}

/// A change of signal reported by [`SignalTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub elapsed: Duration,
    pub signal: Signal,
    /// Position of `elapsed` in the observed range, 0 to 100.
    pub scaled: u8,
}

/// Follows a stream of readings and reports only signal changes.
///
/// Also keeps the smallest and largest reading seen so far, which gives each
/// transition a position within the observed range.
#[derive(Debug, Clone)]
pub struct SignalTracker {
    thresholds: Thresholds,
    range: Option<(Duration, Duration)>,
    last: Option<Signal>,
}

impl SignalTracker {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            range: None,
            last: None,
        }
    }

    /// Smallest and largest reading observed.
    pub fn range(&self) -> Option<(Duration, Duration)> {
        self.range
    }

    /// Feed one reading. Returns a transition when the signal differs from
    /// the last one reported.
    ///
    /// Nothing is reported until at least two distinct readings have been
    /// seen, since a single value gives no range to scale against.
    pub fn observe(&mut self, elapsed: Duration) -> Option<Transition> {
        let (min, max) = match self.range {
            Some((min, max)) => (min.min(elapsed), max.max(elapsed)),
            None => (elapsed, elapsed),
        };
        self.range = Some((min, max));
        if min == max {
            return None;
        }

        let signal = self.thresholds.classify(elapsed);
        if self.last == Some(signal) {
            return None;
        }
        self.last = Some(signal);

        let span = (max - min).as_nanos();
        let scaled = ((elapsed - min).as_nanos() * 100 / span) as u8;
        Some(Transition {
            elapsed,
            signal,
            scaled,
        })
    }
}
