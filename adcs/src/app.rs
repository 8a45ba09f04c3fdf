use crate::{
    AdcsErrors,
    actuator::ActuatorCommand,
    config::AdcsConfig,
    coordinator::FlightCoordinator,
    fault::HealthReport,
    sensor::SensorSample,
};

/// Message bus boundary: one sample in and one command out per cycle.
pub trait Transport {
    type Error: std::error::Error + Send + Sync + 'static;
    /// Blocks until the next sample arrives. `None` ends the stream.
    fn receive(&mut self) -> Result<Option<SensorSample>, Self::Error>;
    fn send(&mut self, command: &ActuatorCommand) -> Result<(), Self::Error>;
}

/// Host handle owning one coordinator and its transport.
///
/// Construction is the one-time initialization and `shutdown` consumes the
/// handle, so neither can run twice.
pub struct AdcsApp<T: Transport> {
    coordinator: FlightCoordinator,
    transport: T,
}

impl<T: Transport> AdcsApp<T> {
    pub fn init(config: AdcsConfig, transport: T) -> Result<Self, AdcsErrors> {
        let coordinator = FlightCoordinator::new(config)?;
        tracing::info!("adcs app started");
        Ok(Self {
            coordinator,
            transport,
        })
    }

    /// Receives one sample, runs the cycle and sends the resulting command.
    /// Returns `Ok(false)` once the transport has no more samples.
    pub fn step(&mut self) -> Result<bool, AdcsErrors> {
        let sample = match self.transport.receive().map_err(transport_error)? {
            Some(sample) => sample,
            None => return Ok(false),
        };
        self.coordinator.process_sensor_data(sample);
        // invalid frames still publish the held command
        let command = self.coordinator.actuator_commands();
        self.transport.send(&command).map_err(transport_error)?;
        Ok(true)
    }

    /// Steps until the transport runs dry, returning the number of samples handled.
    pub fn run(&mut self) -> Result<usize, AdcsErrors> {
        let mut count = 0;
        while self.step()? {
            count += 1;
        }
        Ok(count)
    }

    pub fn coordinator(&self) -> &FlightCoordinator {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut FlightCoordinator {
        &mut self.coordinator
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn shutdown(self) -> (T, HealthReport) {
        let health = self.coordinator.health();
        tracing::info!(
            cycles = health.control_cycles,
            mode = %health.mode,
            "adcs app stopped"
        );
        (self.transport, health)
    }
}

fn transport_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> AdcsErrors {
    AdcsErrors::Transport(Box::new(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::ControlMode;
    use nalgebra::Vector3;
    use std::collections::VecDeque;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("link down")]
    struct LinkDown;

    #[derive(Default)]
    struct QueueTransport {
        inbound: VecDeque<SensorSample>,
        outbound: Vec<ActuatorCommand>,
        fail_send: bool,
    }

    impl Transport for QueueTransport {
        type Error = LinkDown;
        fn receive(&mut self) -> Result<Option<SensorSample>, LinkDown> {
            Ok(self.inbound.pop_front())
        }
        fn send(&mut self, command: &ActuatorCommand) -> Result<(), LinkDown> {
            if self.fail_send {
                return Err(LinkDown);
            }
            self.outbound.push(*command);
            Ok(())
        }
    }

    fn valid(gyro: [f64; 3]) -> SensorSample {
        SensorSample::new(gyro.into(), Vector3::zeros(), 0.0, 0)
    }

    #[test]
    fn test_one_command_per_sample() {
        let mut transport = QueueTransport::default();
        transport.inbound.extend([
            valid([0.1, 0.0, 0.0]),
            SensorSample::invalid(1),
            valid([0.1, 0.0, 0.0]),
        ]);
        let config = AdcsConfig::default().with_initial_mode(ControlMode::Pointing);
        let mut app = AdcsApp::init(config, transport).unwrap();
        assert_eq!(app.run().unwrap(), 3);

        let (transport, health) = app.shutdown();
        assert_eq!(transport.outbound.len(), 3);
        // the invalid frame republishes the first command
        assert_eq!(transport.outbound[0], transport.outbound[1]);
        assert_eq!(transport.outbound[2].timestamp, 2);
        assert_eq!(health.control_cycles, 2);
        assert_eq!(health.mode, ControlMode::Pointing);
    }

    #[test]
    fn test_transport_errors_propagate() {
        let mut transport = QueueTransport::default();
        transport.inbound.push_back(valid([0.0; 3]));
        transport.fail_send = true;
        let mut app = AdcsApp::init(AdcsConfig::default(), transport).unwrap();
        assert!(matches!(app.step(), Err(AdcsErrors::Transport(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AdcsConfig::default().with_max_torque(-0.1);
        assert!(AdcsApp::init(config, QueueTransport::default()).is_err());
    }
}
