use bytemuck::{Pod, Zeroable, bytes_of, try_pod_read_unaligned};
use nalgebra::Vector3;
use thiserror::Error;

use crate::{actuator::ActuatorCommand, sensor::SensorSample};

pub const HARDWARE_BUFFER_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum InterfaceErrors {
    #[error("buffer overflow: tried to write {0} bytes into {1}-byte buffer")]
    Overflow(usize, usize),
    #[error("buffer holds {found} bytes but the record is {expected} bytes")]
    SizeMismatch { expected: usize, found: usize },
    #[error("could not decode record: {0}")]
    Decode(bytemuck::PodCastError),
}

/// Fixed capacity byte buffer carrying one bus record.
#[derive(Debug, Clone, Copy)]
pub struct HardwareBuffer {
    data: [u8; HARDWARE_BUFFER_CAPACITY],
    size: usize,
}

impl Default for HardwareBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareBuffer {
    pub fn new() -> Self {
        HardwareBuffer {
            data: [0u8; HARDWARE_BUFFER_CAPACITY],
            size: 0,
        }
    }

    /// Write a record into the buffer
    pub fn write<T: Pod>(&mut self, val: &T) -> Result<(), InterfaceErrors> {
        self.write_bytes(bytes_of(val))
    }

    /// Write a raw byte slice into the buffer
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), InterfaceErrors> {
        if data.len() > self.data.len() {
            return Err(InterfaceErrors::Overflow(data.len(), self.data.len()));
        }
        self.data[..data.len()].copy_from_slice(data);
        self.size = data.len();
        tracing::trace!(bytes = self.size, "hardware buffer written");
        Ok(())
    }

    /// Read a record back out of the buffer, the size must match exactly
    pub fn read<T: Pod>(&self) -> Result<T, InterfaceErrors> {
        let t_size = size_of::<T>();
        if self.size != t_size {
            return Err(InterfaceErrors::SizeMismatch {
                expected: t_size,
                found: self.size,
            });
        }
        // the byte array has no alignment guarantee
        try_pod_read_unaligned(&self.data[..t_size]).map_err(InterfaceErrors::Decode)
    }

    /// Return the used slice of the buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.size]
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Sensor payload as laid out on the bus.
#[derive(Debug, Default, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct SensorTelemetry {
    pub gyro: [f32; 3],
    pub magnetometer: [f32; 3],
    pub sun_angle: f32,
    pub timestamp: u32,
    pub valid: u8,
    pub _padding: [u8; 3],
}

/// Actuator payload as laid out on the bus.
#[derive(Debug, Default, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ActuatorTelemetry {
    pub wheel_torques: [f32; 3],
    pub magnetorquer: [f32; 3],
    pub timestamp: u32,
}

fn widen(v: [f32; 3]) -> Vector3<f64> {
    Vector3::new(v[0] as f64, v[1] as f64, v[2] as f64)
}

fn narrow(v: &Vector3<f64>) -> [f32; 3] {
    [v[0] as f32, v[1] as f32, v[2] as f32]
}

impl From<SensorTelemetry> for SensorSample {
    fn from(telemetry: SensorTelemetry) -> Self {
        Self {
            gyro: widen(telemetry.gyro),
            magnetometer: widen(telemetry.magnetometer),
            sun_angle: telemetry.sun_angle as f64,
            timestamp: telemetry.timestamp,
            valid: telemetry.valid != 0,
        }
    }
}

impl From<&SensorSample> for SensorTelemetry {
    fn from(sample: &SensorSample) -> Self {
        Self {
            gyro: narrow(&sample.gyro),
            magnetometer: narrow(&sample.magnetometer),
            sun_angle: sample.sun_angle as f32,
            timestamp: sample.timestamp,
            valid: sample.valid as u8,
            _padding: [0; 3],
        }
    }
}

impl From<&ActuatorCommand> for ActuatorTelemetry {
    fn from(command: &ActuatorCommand) -> Self {
        Self {
            wheel_torques: narrow(&command.wheel_torques),
            magnetorquer: narrow(&command.magnetorquer),
            timestamp: command.timestamp,
        }
    }
}

impl From<ActuatorTelemetry> for ActuatorCommand {
    fn from(telemetry: ActuatorTelemetry) -> Self {
        Self {
            wheel_torques: widen(telemetry.wheel_torques),
            magnetorquer: widen(telemetry.magnetorquer),
            timestamp: telemetry.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        assert_eq!(size_of::<SensorTelemetry>(), 36);
        assert_eq!(size_of::<ActuatorTelemetry>(), 28);
    }

    #[test]
    fn test_sensor_frame_decode() {
        let telemetry = SensorTelemetry {
            gyro: [0.5, -0.25, 0.125],
            magnetometer: [2.0, 4.0, -8.0],
            sun_angle: 1.5,
            timestamp: 42,
            valid: 1,
            _padding: [0; 3],
        };
        let mut buffer = HardwareBuffer::new();
        buffer.write(&telemetry).unwrap();
        assert_eq!(buffer.len(), 36);

        let sample = SensorSample::from(buffer.read::<SensorTelemetry>().unwrap());
        assert_eq!(sample.gyro, Vector3::new(0.5, -0.25, 0.125));
        assert_eq!(sample.magnetometer, Vector3::new(2.0, 4.0, -8.0));
        assert_eq!(sample.sun_angle, 1.5);
        assert_eq!(sample.timestamp, 42);
        assert!(sample.valid);
    }

    #[test]
    fn test_any_nonzero_valid_byte_is_valid() {
        let telemetry = SensorTelemetry {
            valid: 0x7f,
            ..Default::default()
        };
        assert!(SensorSample::from(telemetry).valid);
        assert!(!SensorSample::from(SensorTelemetry::default()).valid);
    }

    #[test]
    fn test_wrong_record_rejected() {
        let mut buffer = HardwareBuffer::new();
        buffer.write(&ActuatorTelemetry::default()).unwrap();
        assert_eq!(
            buffer.read::<SensorTelemetry>(),
            Err(InterfaceErrors::SizeMismatch {
                expected: 36,
                found: 28
            })
        );
    }

    #[test]
    fn test_overflow_rejected() {
        let mut buffer = HardwareBuffer::new();
        let data = [0u8; HARDWARE_BUFFER_CAPACITY + 1];
        assert_eq!(
            buffer.write_bytes(&data),
            Err(InterfaceErrors::Overflow(HARDWARE_BUFFER_CAPACITY + 1, HARDWARE_BUFFER_CAPACITY))
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_actuator_frame_encode() {
        let command = ActuatorCommand {
            wheel_torques: Vector3::new(0.1, -0.05, 0.0),
            magnetorquer: Vector3::new(-1.0, 0.5, 1.0),
            timestamp: 7,
        };
        let telemetry = ActuatorTelemetry::from(&command);
        assert_eq!(telemetry.wheel_torques, [0.1f32, -0.05, 0.0]);
        assert_eq!(telemetry.magnetorquer, [-1.0f32, 0.5, 1.0]);
        assert_eq!(telemetry.timestamp, 7);
    }
}
