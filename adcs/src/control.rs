use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    actuator::ActuatorOutputs,
    mode::ControlMode,
    pid::{Limits, PidController, PidErrors, PidGains},
    time_step::TimeStep,
};

#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum ControlErrors {
    #[error("max torque must be finite and greater than 0.0, got {0}")]
    InvalidMaxTorque(f64),
    #[error("{0}")]
    PidErrors(#[from] PidErrors),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttitudeControllerParameters {
    /// B-dot gain
    pub kp_detumble: f64,
    /// rate damping gains shared by pointing and science
    pub pointing: PidGains,
    /// per axis integrator bound
    pub integral_limit: f64,
    /// N*m
    pub max_torque: f64,
    pub science_scale: f64,
    /// N*m
    pub science_torque_limit: f64,
}

impl Default for AttitudeControllerParameters {
    fn default() -> Self {
        Self {
            kp_detumble: 0.1,
            pointing: PidGains::new(0.05, 0.01, 0.01),
            integral_limit: 1.0,
            max_torque: 0.1,
            science_scale: 0.5,
            science_torque_limit: 0.05,
        }
    }
}

/// Reference for the B-dot derivative.
#[derive(Clone, Copy, Debug, Default)]
struct DetumbleState {
    previous_magnetometer: Vector3<f64>,
    baseline_captured: bool,
}

/// Mode dispatched attitude/rate control laws.
///
/// Owns one rate damping PID per body axis and the B-dot reference. Outputs are
/// saturated by each law, the flight coordinator applies the final actuator limits.
#[derive(Clone, Debug)]
pub struct AttitudeController {
    parameters: AttitudeControllerParameters,
    pid: [PidController; 3],
    detumble: DetumbleState,
    dt: TimeStep,
}

impl AttitudeController {
    pub fn new(
        kp_detumble: f64,
        kp_point: f64,
        kd_point: f64,
        dt: TimeStep,
    ) -> Result<Self, ControlErrors> {
        let mut parameters = AttitudeControllerParameters::default();
        parameters.kp_detumble = kp_detumble;
        parameters.pointing.kp = kp_point;
        parameters.pointing.kd = kd_point;
        Self::from_parameters(parameters, dt)
    }

    pub fn from_parameters(
        parameters: AttitudeControllerParameters,
        dt: TimeStep,
    ) -> Result<Self, ControlErrors> {
        check_torque(parameters.max_torque)?;
        let pid = axis_controllers(&parameters)?;
        Ok(Self {
            parameters,
            pid,
            detumble: DetumbleState::default(),
            dt,
        })
    }

    pub fn compute_control(
        &mut self,
        gyro: &Vector3<f64>,
        magnetometer: &Vector3<f64>,
        _sun_angle: f64,
        mode: ControlMode,
    ) -> ActuatorOutputs {
        // re-entering detumble must recapture the reference
        if mode != ControlMode::Detumble {
            self.reset_detumble();
        }

        match mode {
            ControlMode::Safe => ActuatorOutputs::zeros(),
            ControlMode::Detumble => self.detumble_control(magnetometer),
            ControlMode::Pointing => self.pointing_control(gyro),
            ControlMode::Science => self.science_control(gyro),
        }
    }

    /// Same as `compute_control` for a raw bus mode selector. Values outside
    /// 0..=3 run the Safe law.
    pub fn compute_control_raw(
        &mut self,
        gyro: &Vector3<f64>,
        magnetometer: &Vector3<f64>,
        sun_angle: f64,
        raw_mode: i32,
    ) -> ActuatorOutputs {
        let mode = ControlMode::from_raw_or_safe(raw_mode);
        self.compute_control(gyro, magnetometer, sun_angle, mode)
    }

    /// Drops the B-dot reference so the next Detumble cycle only captures a baseline.
    pub fn reset_detumble(&mut self) {
        if self.detumble.baseline_captured {
            tracing::debug!("b-dot baseline cleared");
        }
        self.detumble.baseline_captured = false;
    }

    fn detumble_control(&mut self, magnetometer: &Vector3<f64>) -> ActuatorOutputs {
        let mut outputs = ActuatorOutputs::zeros();

        if !self.detumble.baseline_captured {
            self.detumble.previous_magnetometer = *magnetometer;
            self.detumble.baseline_captured = true;
            tracing::debug!("b-dot baseline captured");
            return outputs;
        }

        let dt = self.dt.seconds();
        for i in 0..3 {
            let b_dot = (magnetometer[i] - self.detumble.previous_magnetometer[i]) / dt;
            outputs.magnetorquer[i] = (-self.parameters.kp_detumble * b_dot).clamp(-1.0, 1.0);
        }
        self.detumble.previous_magnetometer = *magnetometer;
        outputs
    }

    fn pointing_control(&mut self, gyro: &Vector3<f64>) -> ActuatorOutputs {
        let mut outputs = ActuatorOutputs::zeros();
        let max_torque = self.parameters.max_torque;
        for i in 0..3 {
            // rate damping: drive each body rate to zero
            let torque = self.pid[i].compute(0.0, gyro[i], self.dt);
            outputs.wheel_torques[i] = torque.clamp(-max_torque, max_torque);
        }
        outputs
    }

    fn science_control(&mut self, gyro: &Vector3<f64>) -> ActuatorOutputs {
        let mut outputs = ActuatorOutputs::zeros();
        let limit = self.parameters.science_torque_limit;
        for i in 0..3 {
            let torque = self.pid[i].compute(0.0, gyro[i], self.dt);
            outputs.wheel_torques[i] =
                (torque * self.parameters.science_scale).clamp(-limit, limit);
        }
        outputs
    }

    /// Replaces the per-axis controllers with fresh ones using the new gains.
    ///
    /// The integrators and derivative memory of every axis are discarded.
    pub fn set_gains(
        &mut self,
        kp_detumble: f64,
        kp_point: f64,
        kd_point: f64,
    ) -> Result<(), ControlErrors> {
        let mut parameters = self.parameters;
        parameters.kp_detumble = kp_detumble;
        parameters.pointing.kp = kp_point;
        parameters.pointing.kd = kd_point;
        let pid = axis_controllers(&parameters)?;

        if self.pid.iter().any(|p| p.integral() != 0.0 || p.previous_error() != 0.0) {
            tracing::warn!("gain change discarded rate controller integrator memory");
        }
        self.parameters = parameters;
        self.pid = pid;
        tracing::info!(kp_detumble, kp_point, kd_point, "control gains updated");
        Ok(())
    }

    /// Updates the torque ceiling without touching the controller state.
    pub fn set_max_torque(&mut self, max_torque: f64) -> Result<(), ControlErrors> {
        check_torque(max_torque)?;
        for pid in &mut self.pid {
            pid.set_limits(-max_torque, max_torque)?;
        }
        self.parameters.max_torque = max_torque;
        Ok(())
    }

    pub fn parameters(&self) -> &AttitudeControllerParameters {
        &self.parameters
    }

    pub fn axis(&self, i: usize) -> &PidController {
        &self.pid[i]
    }

    pub fn dt(&self) -> TimeStep {
        self.dt
    }

    pub fn baseline_captured(&self) -> bool {
        self.detumble.baseline_captured
    }
}

fn check_torque(max_torque: f64) -> Result<(), ControlErrors> {
    if !max_torque.is_finite() || max_torque <= 0.0 {
        return Err(ControlErrors::InvalidMaxTorque(max_torque));
    }
    Ok(())
}

fn axis_controllers(
    parameters: &AttitudeControllerParameters,
) -> Result<[PidController; 3], ControlErrors> {
    let pid = PidController::new(parameters.pointing)
        .with_limits(Limits::symmetric(parameters.max_torque)?)
        .with_integral_limits(Limits::symmetric(parameters.integral_limit)?);
    Ok([pid; 3])
}
