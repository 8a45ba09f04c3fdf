use nalgebra::Vector3;
use thiserror::Error;

use crate::{
    actuator::{ActuatorCommand, ActuatorOutputs},
    config::{AdcsConfig, ConfigErrors},
    control::{AttitudeController, ControlErrors},
    fault::{FaultFlags, HealthReport},
    mode::{ControlMode, ModeErrors},
    sensor::SensorSample,
};

#[derive(Debug, Error)]
pub enum CoordinatorErrors {
    #[error("{0}")]
    Config(#[from] ConfigErrors),
    #[error("{0}")]
    Control(#[from] ControlErrors),
    #[error("fault threshold must be finite and greater than 0.0, got {0}")]
    InvalidThreshold(f64),
    #[error("{0}")]
    Mode(#[from] ModeErrors),
}

/// Latest valid sensor values, copied in at the start of each valid cycle.
#[derive(Clone, Copy, Debug, Default)]
struct SensorState {
    gyro: Vector3<f64>,
    magnetometer: Vector3<f64>,
    sun_angle: f64,
}

#[derive(Clone, Copy, Debug, Default)]
struct HealthState {
    control_cycles: u32,
    uptime_seconds: u32,
    consecutive_invalid_frames: u32,
    consecutive_fault_cycles: u32,
}

/// Top level cycle driver.
///
/// Each valid sample runs fault detection, the control law for the current mode
/// and the final actuator saturation. Sensor loss or faults that persist over
/// consecutive cycles latch the coordinator into `ControlMode::Safe`; only an
/// external mode command leaves it.
#[derive(Clone, Debug)]
pub struct FlightCoordinator {
    config: AdcsConfig,
    controller: AttitudeController,
    mode: ControlMode,
    fault_flags: FaultFlags,
    sensors: SensorState,
    outputs: ActuatorOutputs,
    health: HealthState,
}

impl FlightCoordinator {
    pub fn new(config: AdcsConfig) -> Result<Self, CoordinatorErrors> {
        config.validate()?;
        let controller = AttitudeController::from_parameters(
            config.controller_parameters(),
            config.control_period,
        )?;
        let mode = config.initial_mode;
        tracing::info!(
            %mode,
            dt = config.control_period.seconds(),
            "flight coordinator initialized"
        );
        Ok(Self {
            config,
            controller,
            mode,
            fault_flags: FaultFlags::default(),
            sensors: SensorState::default(),
            outputs: ActuatorOutputs::zeros(),
            health: HealthState::default(),
        })
    }

    /// Runs one control cycle. Anomalies never surface as errors here, they show
    /// up in the fault flags and the mode.
    pub fn process_sensor_data(&mut self, sample: SensorSample) {
        if !sample.valid {
            self.health.consecutive_invalid_frames =
                self.health.consecutive_invalid_frames.saturating_add(1);
            tracing::debug!(
                timestamp = sample.timestamp,
                count = self.health.consecutive_invalid_frames,
                "invalid sensor frame, holding last command"
            );
            if self.health.consecutive_invalid_frames > self.config.invalid_frame_limit {
                self.force_safe("consecutive invalid sensor frames");
            }
            return;
        }

        self.sensors = SensorState {
            gyro: sample.gyro,
            magnetometer: sample.magnetometer,
            sun_angle: sample.sun_angle,
        };
        self.health.consecutive_invalid_frames = 0;

        self.perform_fault_detection(&sample);

        // a law whose own inputs are non-finite is skipped for this cycle
        let outputs = if law_inputs_finite(self.mode, &sample) {
            self.controller.compute_control(
                &self.sensors.gyro,
                &self.sensors.magnetometer,
                self.sensors.sun_angle,
                self.mode,
            )
        } else {
            tracing::debug!(mode = %self.mode, "control law inputs not finite, commanding zero");
            ActuatorOutputs::zeros()
        };

        let max_torque = self.controller.parameters().max_torque;
        self.outputs = ActuatorOutputs {
            wheel_torques: outputs.wheel_torques.map(|t| saturate(t, max_torque)),
            magnetorquer: outputs.magnetorquer.map(|m| saturate(m, 1.0)),
        };

        self.health.control_cycles = self.health.control_cycles.wrapping_add(1);
        self.update_health_monitoring();

        tracing::debug!(
            cycle = self.health.control_cycles,
            mode = %self.mode,
            faults = self.fault_flags.bits(),
            "control cycle complete"
        );
    }

    pub fn actuator_commands(&self) -> ActuatorCommand {
        ActuatorCommand {
            wheel_torques: self.outputs.wheel_torques,
            magnetorquer: self.outputs.magnetorquer,
            timestamp: self.health.control_cycles,
        }
    }

    fn perform_fault_detection(&mut self, sample: &SensorSample) {
        self.fault_flags.clear();

        let threshold = self.config.fault_threshold;
        for i in 0..3 {
            if sample.gyro[i].abs() > threshold {
                self.fault_flags.set_rate_fault(i);
            }
        }

        if sample.has_non_finite() {
            self.fault_flags.set_sensor_fault();
        }

        if self.fault_flags.is_empty() {
            self.health.consecutive_fault_cycles = 0;
            return;
        }

        self.health.consecutive_fault_cycles =
            self.health.consecutive_fault_cycles.saturating_add(1);
        tracing::debug!(
            faults = self.fault_flags.bits(),
            count = self.health.consecutive_fault_cycles,
            "fault detected"
        );
        if self.health.consecutive_fault_cycles > self.config.persistent_fault_limit {
            self.force_safe("persistent faults");
        }
    }

    fn update_health_monitoring(&mut self) {
        let cycles_per_second = self.config.control_period.cycles_per_second();
        if self.health.control_cycles % cycles_per_second == 0 {
            self.health.uptime_seconds = self.health.uptime_seconds.wrapping_add(1);
        }
    }

    fn force_safe(&mut self, reason: &str) {
        if self.mode != ControlMode::Safe {
            tracing::warn!(from = %self.mode, reason, "forcing safe mode");
            self.mode = ControlMode::Safe;
            self.controller.reset_detumble();
        }
    }

    pub fn set_control_mode(&mut self, mode: ControlMode) {
        if mode != self.mode {
            tracing::info!(from = %self.mode, to = %mode, "control mode set");
            self.controller.reset_detumble();
        }
        self.mode = mode;
    }

    /// Applies a raw mode selector from the bus. Out of range values leave the mode unchanged.
    pub fn command_mode(&mut self, raw: i32) -> Result<ControlMode, CoordinatorErrors> {
        match ControlMode::try_from(raw) {
            Ok(mode) => {
                self.set_control_mode(mode);
                Ok(mode)
            }
            Err(e) => {
                tracing::warn!(raw, "rejected mode request");
                Err(e.into())
            }
        }
    }

    pub fn set_fault_threshold(&mut self, threshold: f64) -> Result<(), CoordinatorErrors> {
        if !threshold.is_finite() || threshold <= 0.0 {
            tracing::warn!(threshold, "rejected fault threshold");
            return Err(CoordinatorErrors::InvalidThreshold(threshold));
        }
        self.config.fault_threshold = threshold;
        Ok(())
    }

    /// See `AttitudeController::set_gains`, the rate controller memory is discarded.
    pub fn set_gains(
        &mut self,
        kp_detumble: f64,
        kp_point: f64,
        kd_point: f64,
    ) -> Result<(), CoordinatorErrors> {
        self.controller.set_gains(kp_detumble, kp_point, kd_point)?;
        self.config.kp_detumble = kp_detumble;
        self.config.kp_point = kp_point;
        self.config.kd_point = kd_point;
        Ok(())
    }

    /// Sets the torque ceiling for both the control laws and the final saturation.
    pub fn set_max_torque(&mut self, max_torque: f64) -> Result<(), CoordinatorErrors> {
        self.controller.set_max_torque(max_torque)?;
        self.config.max_torque = max_torque;
        Ok(())
    }

    pub fn control_mode(&self) -> ControlMode {
        self.mode
    }

    pub fn fault_flags(&self) -> FaultFlags {
        self.fault_flags
    }

    pub fn control_cycles(&self) -> u32 {
        self.health.control_cycles
    }

    pub fn uptime_seconds(&self) -> u32 {
        self.health.uptime_seconds
    }

    pub fn fault_threshold(&self) -> f64 {
        self.config.fault_threshold
    }

    pub fn max_torque(&self) -> f64 {
        self.config.max_torque
    }

    pub fn config(&self) -> &AdcsConfig {
        &self.config
    }

    pub fn controller(&self) -> &AttitudeController {
        &self.controller
    }

    pub fn gyro(&self) -> &Vector3<f64> {
        &self.sensors.gyro
    }

    pub fn magnetometer(&self) -> &Vector3<f64> {
        &self.sensors.magnetometer
    }

    pub fn sun_angle(&self) -> f64 {
        self.sensors.sun_angle
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            mode: self.mode,
            fault_flags: self.fault_flags,
            control_cycles: self.health.control_cycles,
            uptime_seconds: self.health.uptime_seconds,
            consecutive_invalid_frames: self.health.consecutive_invalid_frames,
            consecutive_fault_cycles: self.health.consecutive_fault_cycles,
        }
    }
}

/// True when every channel the mode's law reads is finite.
fn law_inputs_finite(mode: ControlMode, sample: &SensorSample) -> bool {
    let finite = |v: &Vector3<f64>| v.iter().all(|x| x.is_finite());
    match mode {
        ControlMode::Safe => true,
        ControlMode::Detumble => finite(&sample.magnetometer),
        ControlMode::Pointing | ControlMode::Science => finite(&sample.gyro),
    }
}

/// Clamps to [-bound, bound], NaN saturates to zero.
fn saturate(value: f64, bound: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-bound, bound)
    }
}
