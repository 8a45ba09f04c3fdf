//! Attitude determination and control core.
//!
//! A [`FlightCoordinator`] consumes one [`SensorSample`] per control cycle and
//! produces an [`ActuatorCommand`] for the reaction wheels and magnetorquers,
//! falling back to [`ControlMode::Safe`] on sensor loss or persistent faults.

pub mod actuator;
pub mod app;
pub mod config;
pub mod control;
pub mod coordinator;
pub mod fault;
pub mod interface;
pub mod mode;
pub mod pid;
pub mod sensor;
pub mod time_step;

pub use actuator::{ActuatorCommand, ActuatorOutputs};
pub use app::{AdcsApp, Transport};
pub use config::{AdcsConfig, ConfigErrors};
pub use control::{AttitudeController, ControlErrors};
pub use coordinator::{CoordinatorErrors, FlightCoordinator};
pub use fault::{FaultFlags, HealthReport};
pub use interface::{ActuatorTelemetry, HardwareBuffer, InterfaceErrors, SensorTelemetry};
pub use mode::{ControlMode, ModeErrors};
pub use pid::{Limits, PidController, PidErrors, PidGains};
pub use sensor::SensorSample;
pub use time_step::{TimeStep, TimeStepErrors};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdcsErrors {
    #[error("{0}")]
    Config(#[from] ConfigErrors),
    #[error("{0}")]
    Control(#[from] ControlErrors),
    #[error("{0}")]
    Coordinator(#[from] CoordinatorErrors),
    #[error("{0}")]
    Interface(#[from] InterfaceErrors),
    #[error("{0}")]
    Mode(#[from] ModeErrors),
    #[error("{0}")]
    Pid(#[from] PidErrors),
    #[error("{0}")]
    TimeStep(#[from] TimeStepErrors),
    #[error("transport error: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync>),
}
