use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// One cycle of sensor telemetry as delivered by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    /// body rates (rad/s)
    pub gyro: Vector3<f64>,
    pub magnetometer: Vector3<f64>,
    /// rad
    pub sun_angle: f64,
    pub timestamp: u32,
    pub valid: bool,
}

impl SensorSample {
    pub fn new(
        gyro: Vector3<f64>,
        magnetometer: Vector3<f64>,
        sun_angle: f64,
        timestamp: u32,
    ) -> Self {
        Self {
            gyro,
            magnetometer,
            sun_angle,
            timestamp,
            valid: true,
        }
    }

    /// A frame the transport could not validate, its contents are never read.
    pub fn invalid(timestamp: u32) -> Self {
        Self {
            gyro: Vector3::zeros(),
            magnetometer: Vector3::zeros(),
            sun_angle: 0.0,
            timestamp,
            valid: false,
        }
    }

    /// True if any gyro or magnetometer component is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        self.gyro
            .iter()
            .chain(self.magnetometer.iter())
            .any(|v| !v.is_finite())
    }
}
