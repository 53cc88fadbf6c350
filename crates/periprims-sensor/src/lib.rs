//! Reflectance proximity sensing by capacitor discharge timing.
//!
//! The sensor shares a single GPIO pin for charging and sensing: the pin
//! drives a capacitor high, is switched to input, and the time until the
//! capacitor has drained through the phototransistor is the reading.
//! Stronger reflection drains faster, so shorter readings mean a closer
//! object.
//!
//! The pin is consumed through [`SensePin`]; timing goes through [`Clock`].
//!
//! ```
//! use periprims_sensor::{Proximity, ProximityConfig, SensePin, Window};
//!
//! fn measure(pin: impl SensePin) -> periprims_sensor::Result<u64> {
//!     let window = Window::from_micros(200, 2500)?;
//!     let mut sensor = Proximity::new(pin, ProximityConfig::new(window))?;
//!     Ok(sensor.read()?.as_micros())
//! }
//! ```

pub mod clock;
pub mod error;
pub mod gpio;
pub mod proximity;
pub mod signal;

pub use clock::{Clock, SystemClock};
pub use error::{Result, SensorError};
pub use gpio::{Direction, Edge, GpioError, Level, SensePin};
pub use proximity::{
    Proximity, ProximityConfig, Reading, RetryPolicy, Window, DEFAULT_CHARGE_TIME,
};
pub use signal::{Signal, SignalTracker, Thresholds, Transition};
