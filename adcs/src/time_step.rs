use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum TimeStepErrors {
    #[error("time step must be finite, got {0}")]
    NotFinite(f64),
    #[error("time step must be greater than 0.0, got {0}")]
    NotPositive(f64),
}

/// The control period in seconds.
///
/// Every control law divides by the period, so a `TimeStep` can only be
/// built from a finite, strictly positive number.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct TimeStep(f64);

impl TimeStep {
    pub fn new(dt: f64) -> Result<Self, TimeStepErrors> {
        if !dt.is_finite() {
            return Err(TimeStepErrors::NotFinite(dt));
        }
        if dt <= 0.0 {
            return Err(TimeStepErrors::NotPositive(dt));
        }
        Ok(Self(dt))
    }

    pub fn from_hz(rate: f64) -> Result<Self, TimeStepErrors> {
        Self::new(1.0 / rate)
    }

    pub fn seconds(&self) -> f64 {
        self.0
    }

    /// Number of whole control cycles in one second, never less than one.
    pub fn cycles_per_second(&self) -> u32 {
        let cycles = (1.0 / self.0).round();
        if cycles < 1.0 {
            1
        } else if cycles > u32::MAX as f64 {
            u32::MAX
        } else {
            cycles as u32
        }
    }
}

impl Default for TimeStep {
    /// 10 Hz
    fn default() -> Self {
        Self(0.1)
    }
}

impl TryFrom<f64> for TimeStep {
    type Error = TimeStepErrors;
    fn try_from(dt: f64) -> Result<Self, Self::Error> {
        Self::new(dt)
    }
}

impl From<TimeStep> for f64 {
    fn from(dt: TimeStep) -> Self {
        dt.0
    }
}
