use std::{
    collections::HashMap,
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use adcs::FlightCoordinator;
use csv::Writer;
use thiserror::Error;

pub type ResultWriter = Writer<BufWriter<File>>;

#[derive(Debug, Error)]
pub enum ResultErrors {
    #[error("{0}")]
    Csv(#[from] csv::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("no result writer with id {0}")]
    WriterNotFound(u32),
}

/// Owns one csv writer per logged component.
pub struct ResultManager {
    writers: HashMap<u32, ResultWriter>,
    pub result_path: PathBuf,
    next_id: u32,
}

impl ResultManager {
    pub fn new(result_path: PathBuf) -> Self {
        Self {
            writers: HashMap::new(),
            result_path,
            next_id: 0,
        }
    }

    pub fn new_writer(
        &mut self,
        name: &str,
        path: &Path,
        headers: &[&str],
    ) -> Result<u32, ResultErrors> {
        // Ensure the directory exists
        std::fs::create_dir_all(path)?;

        let filename = name.to_string() + ".csv";
        let file = File::create(path.join(filename))?;
        let mut writer = Writer::from_writer(BufWriter::new(file));
        writer.write_record(headers)?;

        let id = self.next_id;
        self.writers.insert(id, writer);
        self.next_id += 1;
        tracing::debug!(name, id, "result writer created");
        Ok(id)
    }

    pub fn write_record(&mut self, id: u32, content: &[String]) -> Result<(), ResultErrors> {
        let writer = self
            .writers
            .get_mut(&id)
            .ok_or(ResultErrors::WriterNotFound(id))?;
        writer.write_record(content)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), ResultErrors> {
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

pub trait AdcsResult {
    /// The state being logged
    type Source;
    /// Creates the result file for this component
    fn new_result(&mut self, results: &mut ResultManager) -> Result<(), ResultErrors>;
    /// Writes the next entry in the result file
    fn write_result(
        &self,
        source: &Self::Source,
        results: &mut ResultManager,
    ) -> Result<(), ResultErrors>;
}

const COORDINATOR_HEADERS: [&str; 16] = [
    "cycle",
    "mode",
    "fault_flags",
    "gyro[x]",
    "gyro[y]",
    "gyro[z]",
    "magnetometer[x]",
    "magnetometer[y]",
    "magnetometer[z]",
    "sun_angle",
    "wheel_torque[x]",
    "wheel_torque[y]",
    "wheel_torque[z]",
    "magnetorquer[x]",
    "magnetorquer[y]",
    "magnetorquer[z]",
];

/// Per-cycle log of a flight coordinator's inputs, mode and commands.
#[derive(Debug, Default)]
pub struct CoordinatorLog {
    result_id: Option<u32>,
}

impl CoordinatorLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AdcsResult for CoordinatorLog {
    type Source = FlightCoordinator;

    fn new_result(&mut self, results: &mut ResultManager) -> Result<(), ResultErrors> {
        let folder = results.result_path.join("software");
        let id = results.new_writer("fsw_adcs", &folder, &COORDINATOR_HEADERS)?;
        self.result_id = Some(id);
        Ok(())
    }

    fn write_result(
        &self,
        fc: &FlightCoordinator,
        results: &mut ResultManager,
    ) -> Result<(), ResultErrors> {
        let Some(id) = self.result_id else {
            return Ok(());
        };
        let cmd = fc.actuator_commands();
        let gyro = fc.gyro();
        let mag = fc.magnetometer();
        results.write_record(
            id,
            &[
                cmd.timestamp.to_string(),
                fc.control_mode().to_string(),
                fc.fault_flags().bits().to_string(),
                gyro[0].to_string(),
                gyro[1].to_string(),
                gyro[2].to_string(),
                mag[0].to_string(),
                mag[1].to_string(),
                mag[2].to_string(),
                fc.sun_angle().to_string(),
                cmd.wheel_torques[0].to_string(),
                cmd.wheel_torques[1].to_string(),
                cmd.wheel_torques[2].to_string(),
                cmd.magnetorquer[0].to_string(),
                cmd.magnetorquer[1].to_string(),
                cmd.magnetorquer[2].to_string(),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adcs::{AdcsConfig, ControlMode, SensorSample};
    use nalgebra::Vector3;

    #[test]
    fn test_coordinator_log() {
        let path = std::env::temp_dir().join("adcs_result_test_coordinator_log");
        let mut results = ResultManager::new(path.clone());

        let mut fc = FlightCoordinator::new(
            AdcsConfig::default().with_initial_mode(ControlMode::Pointing),
        )
        .unwrap();
        fc.process_sensor_data(SensorSample::new(
            Vector3::new(0.1, 0.0, 0.0),
            Vector3::zeros(),
            0.0,
            0,
        ));

        let mut log = CoordinatorLog::new();
        // nothing is written before the file exists
        log.write_result(&fc, &mut results).unwrap();
        log.new_result(&mut results).unwrap();
        log.write_result(&fc, &mut results).unwrap();
        results.flush().unwrap();

        let contents = std::fs::read_to_string(path.join("software").join("fsw_adcs.csv")).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap().split(',').count(), 16);
        let row: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(row[0], "1");
        assert_eq!(row[1], "pointing");
        assert_eq!(row[3], "0.1");
        assert!(lines.next().is_none());
        let _ = std::fs::remove_dir_all(&path);
    }

    #[test]
    fn test_unknown_writer() {
        let mut results = ResultManager::new(std::env::temp_dir());
        assert!(matches!(
            results.write_record(3, &[]),
            Err(ResultErrors::WriterNotFound(3))
        ));
    }
}
