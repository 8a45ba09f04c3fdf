use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time_step::TimeStep;

#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum PidErrors {
    #[error("invalid limits: min ({0}) must not be greater than max ({1})")]
    InvalidLimits(f64, f64),
    #[error("limits cannot be NaN")]
    NanLimit,
}

/// Closed interval used to saturate the integrator and the output.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    min: f64,
    max: f64,
}

impl Limits {
    pub fn new(min: f64, max: f64) -> Result<Self, PidErrors> {
        if min.is_nan() || max.is_nan() {
            return Err(PidErrors::NanLimit);
        }
        if min > max {
            return Err(PidErrors::InvalidLimits(min, max));
        }
        Ok(Self { min, max })
    }

    /// [-bound, bound]
    pub fn symmetric(bound: f64) -> Result<Self, PidErrors> {
        Self::new(-bound, bound)
    }

    pub fn unbounded() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct PidState {
    integral: f64,
    previous_error: f64,
}

/// Single axis PID with integrator and output saturation.
#[derive(Clone, Copy, Debug)]
pub struct PidController {
    gains: PidGains,
    state: PidState,
    output_limits: Limits,
    integral_limits: Limits,
}

impl PidController {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            state: PidState::default(),
            output_limits: Limits::unbounded(),
            integral_limits: Limits::unbounded(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.output_limits = limits;
        self
    }

    pub fn with_integral_limits(mut self, limits: Limits) -> Self {
        self.integral_limits = limits;
        self
    }

    pub fn compute(&mut self, setpoint: f64, measured: f64, dt: TimeStep) -> f64 {
        let dt = dt.seconds();
        let error = setpoint - measured;

        self.state.integral = self
            .integral_limits
            .clamp(self.state.integral + error * dt);

        let derivative = (error - self.state.previous_error) / dt;
        self.state.previous_error = error;

        let output = self.gains.kp * error
            + self.gains.ki * self.state.integral
            + self.gains.kd * derivative;
        self.output_limits.clamp(output)
    }

    /// Clears the integrator and derivative memory, gains and limits are kept.
    pub fn reset(&mut self) {
        self.state = PidState::default();
    }

    /// Takes effect on the next `compute`, the stored integral is not clamped retroactively.
    pub fn set_limits(&mut self, min_output: f64, max_output: f64) -> Result<(), PidErrors> {
        self.output_limits = Limits::new(min_output, max_output)?;
        Ok(())
    }

    /// Takes effect on the next `compute`, the stored integral is not clamped retroactively.
    pub fn set_integral_limits(
        &mut self,
        min_integral: f64,
        max_integral: f64,
    ) -> Result<(), PidErrors> {
        self.integral_limits = Limits::new(min_integral, max_integral)?;
        Ok(())
    }

    pub fn gains(&self) -> &PidGains {
        &self.gains
    }

    pub fn limits(&self) -> &Limits {
        &self.output_limits
    }

    pub fn integral_limits(&self) -> &Limits {
        &self.integral_limits
    }

    pub fn integral(&self) -> f64 {
        self.state.integral
    }

    pub fn previous_error(&self) -> f64 {
        self.state.previous_error
    }
}
