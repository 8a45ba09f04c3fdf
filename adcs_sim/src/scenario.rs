use std::{fs, path::Path};

use adcs::SensorSample;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioErrors {
    #[error("could not read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse scenario: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("scenario has no frames")]
    Empty,
}

fn default_valid() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioFrame {
    pub gyro: [f64; 3],
    pub magnetometer: [f64; 3],
    #[serde(default)]
    pub sun_angle: f64,
    #[serde(default = "default_valid")]
    pub valid: bool,
}

impl ScenarioFrame {
    pub fn to_sample(&self, timestamp: u32) -> SensorSample {
        SensorSample {
            gyro: Vector3::from(self.gyro),
            magnetometer: Vector3::from(self.magnetometer),
            sun_angle: self.sun_angle,
            timestamp,
            valid: self.valid,
        }
    }
}

/// Raw mode selector sent before the given frame is processed.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ModeCommand {
    pub at_frame: usize,
    pub mode: i32,
}

/// A recorded pass of sensor frames plus ground commands to replay.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub frames: Vec<ScenarioFrame>,
    #[serde(default)]
    pub mode_commands: Vec<ModeCommand>,
    #[serde(default)]
    pub fault_threshold: Option<f64>,
}

impl Scenario {
    pub fn from_ron_str(s: &str) -> Result<Self, ScenarioErrors> {
        let scenario: Self = ron::from_str(s)?;
        if scenario.frames.is_empty() {
            return Err(ScenarioErrors::Empty);
        }
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioErrors> {
        Self::from_ron_str(&fs::read_to_string(path)?)
    }

    pub fn samples(&self) -> impl Iterator<Item = SensorSample> + '_ {
        self.frames
            .iter()
            .enumerate()
            .map(|(i, frame)| frame.to_sample(i as u32))
    }

    pub fn mode_commands_at(&self, frame: usize) -> impl Iterator<Item = &ModeCommand> + '_ {
        self.mode_commands
            .iter()
            .filter(move |command| command.at_frame == frame)
    }
}
