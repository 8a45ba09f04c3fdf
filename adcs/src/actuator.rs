use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Raw output of a control law, before the coordinator saturates it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActuatorOutputs {
    pub wheel_torques: Vector3<f64>,
    pub magnetorquer: Vector3<f64>,
}

impl ActuatorOutputs {
    pub fn zeros() -> Self {
        Self::default()
    }
}

/// Commands for the reaction wheels (N*m) and magnetorquers (normalized dipole, +/-1).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuatorCommand {
    pub wheel_torques: Vector3<f64>,
    pub magnetorquer: Vector3<f64>,
    /// control cycle count when the command was read
    pub timestamp: u32,
}
