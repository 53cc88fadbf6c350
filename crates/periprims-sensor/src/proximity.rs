use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, SensorError};
use crate::gpio::{Direction, Edge, GpioError, Level, SensePin};

/// How long the pin drives the capacitor before each measurement.
pub const DEFAULT_CHARGE_TIME: Duration = Duration::from_micros(100);

/// Range of discharge times accepted as valid readings, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    min: Duration,
    max: Duration,
}

impl Window {
    pub fn new(min: Duration, max: Duration) -> Result<Self> {
        if min > max {
            return Err(SensorError::InvalidWindow { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn from_micros(min: u64, max: u64) -> Result<Self> {
        Self::new(Duration::from_micros(min), Duration::from_micros(max))
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn contains(&self, elapsed: Duration) -> bool {
        self.min <= elapsed && elapsed <= self.max
    }
}

/// Bounds on one [`Proximity::read`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Charge/sense cycles before giving up. At least one is always made.
    pub max_attempts: u32,
    /// Longest wait for the discharge edge within one cycle.
    pub edge_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            edge_timeout: Duration::from_millis(20),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProximityConfig {
    pub window: Window,
    pub retry: RetryPolicy,
    pub charge_time: Duration,
}

impl ProximityConfig {
    /// Default retry policy and charge time around `window`.
    pub fn new(window: Window) -> Self {
        Self {
            window,
            retry: RetryPolicy::default(),
            charge_time: DEFAULT_CHARGE_TIME,
        }
    }
}

/// One accepted measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    /// Time from end of charge to the discharge edge.
    pub elapsed: Duration,
    /// 1-based attempt that produced the reading.
    pub attempt: u32,
}

impl Reading {
    pub fn as_micros(&self) -> u64 {
        self.elapsed.as_micros() as u64
    }
}

/// Proximity sensor on a single shared charge/sense pin.
///
/// Between reads the pin is an input with falling-edge detection armed. A
/// read never returns with the pin still driven, whatever its outcome.
pub struct Proximity<P: SensePin, C: Clock = SystemClock> {
    pin: P,
    clock: C,
    config: ProximityConfig,
}

impl<P: SensePin> Proximity<P> {
    pub fn new(pin: P, config: ProximityConfig) -> Result<Self> {
        Self::with_clock(pin, SystemClock::new(), config)
    }
}

impl<P: SensePin, C: Clock> Proximity<P, C> {
    /// Take ownership of `pin`, make it an input and arm the falling edge.
    pub fn with_clock(mut pin: P, clock: C, config: ProximityConfig) -> Result<Self> {
        pin.set_direction(Direction::In)?;
        pin.set_edge(Edge::Falling)?;
        debug!(
            min_us = config.window.min().as_micros() as u64,
            max_us = config.window.max().as_micros() as u64,
            max_attempts = config.retry.max_attempts,
            "proximity sensor ready"
        );
        Ok(Self { pin, clock, config })
    }

    pub fn config(&self) -> &ProximityConfig {
        &self.config
    }

    /// Measure until a discharge time falls inside the window.
    ///
    /// Out-of-window readings start a new cycle; a timeout or pin error
    /// ends the read at once.
    pub fn read(&mut self) -> Result<Reading> {
        let result = self.measure();
        if result.is_err() {
            self.release();
        }
        result
    }

    /// Give the pin back.
    pub fn into_inner(self) -> P {
        self.pin
    }

    fn measure(&mut self) -> Result<Reading> {
        let attempts = self.config.retry.max_attempts.max(1);
        for attempt in 1..=attempts {
            let elapsed = self.cycle()?;
            if self.config.window.contains(elapsed) {
                trace!(attempt, elapsed_us = elapsed.as_micros() as u64, "proximity reading");
                return Ok(Reading { elapsed, attempt });
            }
            warn!(
                attempt,
                elapsed_us = elapsed.as_micros() as u64,
                "proximity reading outside window"
            );
        }
        Err(SensorError::RetriesExceeded { attempts })
    }

    /// One charge/sense cycle, returning the discharge time.
    fn cycle(&mut self) -> Result<Duration> {
        let edge_timeout = self.config.retry.edge_timeout;

        self.pin.set_direction(Direction::Out)?;
        self.pin.set_level(Level::High)?;
        self.clock.sleep(self.config.charge_time);
        let start = self.clock.now();
        self.pin.set_direction(Direction::In)?;

        loop {
            let waited = self.clock.now().saturating_sub(start);
            let remaining = edge_timeout.saturating_sub(waited);
            if remaining.is_zero() {
                return Err(SensorError::Timeout(edge_timeout));
            }
            let level = self.pin.get_timeout(remaining).map_err(|err| match err {
                GpioError::Timeout(_) => SensorError::Timeout(edge_timeout),
                other => other.into(),
            })?;
            if level == Level::Low {
                return Ok(self.clock.now().saturating_sub(start));
            }
        }
    }

    fn release(&mut self) {
        if let Err(err) = self.pin.set_direction(Direction::In) {
            warn!(error = %err, "failed to return proximity pin to input");
        }
    }
}

impl<P: SensePin, C: Clock> std::fmt::Debug for Proximity<P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proximity")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
