use std::collections::VecDeque;

use adcs::{
    ActuatorCommand, ActuatorTelemetry, HardwareBuffer, InterfaceErrors, SensorSample,
    SensorTelemetry, Transport,
};

/// In-memory software bus carrying encoded sensor and actuator records.
#[derive(Debug, Default)]
pub struct BusTransport {
    inbound: VecDeque<HardwareBuffer>,
    outbound: Vec<HardwareBuffer>,
}

impl BusTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes a sample the way the sensor driver would publish it.
    pub fn publish(&mut self, sample: &SensorSample) -> Result<(), InterfaceErrors> {
        let mut buffer = HardwareBuffer::new();
        buffer.write(&SensorTelemetry::from(sample))?;
        self.inbound.push_back(buffer);
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    /// Decodes every command sent so far.
    pub fn sent_commands(&self) -> Result<Vec<ActuatorCommand>, InterfaceErrors> {
        self.outbound
            .iter()
            .map(|buffer| Ok(ActuatorCommand::from(buffer.read::<ActuatorTelemetry>()?)))
            .collect()
    }
}

impl Transport for BusTransport {
    type Error = InterfaceErrors;

    fn receive(&mut self) -> Result<Option<SensorSample>, InterfaceErrors> {
        match self.inbound.pop_front() {
            Some(buffer) => Ok(Some(buffer.read::<SensorTelemetry>()?.into())),
            None => Ok(None),
        }
    }

    fn send(&mut self, command: &ActuatorCommand) -> Result<(), InterfaceErrors> {
        let mut buffer = HardwareBuffer::new();
        buffer.write(&ActuatorTelemetry::from(command))?;
        self.outbound.push(buffer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_bus_carries_records() {
        let mut bus = BusTransport::new();
        let sample = SensorSample::new(
            Vector3::new(0.5, 0.25, -0.125),
            Vector3::new(1.0, 2.0, 4.0),
            0.5,
            9,
        );
        bus.publish(&sample).unwrap();
        bus.publish(&SensorSample::invalid(10)).unwrap();
        assert_eq!(bus.pending(), 2);

        assert_eq!(bus.receive().unwrap(), Some(sample));
        let invalid = bus.receive().unwrap().unwrap();
        assert!(!invalid.valid);
        assert_eq!(invalid.timestamp, 10);
        assert_eq!(bus.receive().unwrap(), None);

        let command = ActuatorCommand {
            wheel_torques: Vector3::new(0.0625, 0.0, -0.03125),
            magnetorquer: Vector3::new(1.0, -0.5, 0.0),
            timestamp: 3,
        };
        bus.send(&command).unwrap();
        assert_eq!(bus.sent_commands().unwrap(), vec![command]);
    }
}
