use std::{fs, path::Path};

use ron::ser::{PrettyConfig, to_string_pretty};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    control::AttitudeControllerParameters, mode::ControlMode, pid::PidGains, time_step::TimeStep,
};

#[derive(Debug, Error)]
pub enum ConfigErrors {
    #[error("could not access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("could not serialize config: {0}")]
    Serialize(#[from] ron::Error),
    #[error("'{0}' must be finite and greater than 0.0, got {1}")]
    NotPositive(&'static str, f64),
    #[error("'{0}' must be finite, got {1}")]
    NotFinite(&'static str, f64),
}

/// Tunable parameters of the flight coordinator and its control laws.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdcsConfig {
    /// seconds per control cycle
    pub control_period: TimeStep,
    pub kp_detumble: f64,
    pub kp_point: f64,
    pub ki_point: f64,
    pub kd_point: f64,
    pub integral_limit: f64,
    /// N*m
    pub max_torque: f64,
    /// rad/s
    pub fault_threshold: f64,
    /// invalid frames tolerated before the forced safe fallback
    pub invalid_frame_limit: u32,
    /// faulted cycles tolerated before the forced safe fallback
    pub persistent_fault_limit: u32,
    pub science_scale: f64,
    /// N*m
    pub science_torque_limit: f64,
    pub initial_mode: ControlMode,
}

impl Default for AdcsConfig {
    fn default() -> Self {
        Self {
            control_period: TimeStep::default(),
            kp_detumble: 0.1,
            kp_point: 0.05,
            ki_point: 0.01,
            kd_point: 0.01,
            integral_limit: 1.0,
            max_torque: 0.1,
            fault_threshold: 0.5,
            invalid_frame_limit: 5,
            persistent_fault_limit: 3,
            science_scale: 0.5,
            science_torque_limit: 0.05,
            initial_mode: ControlMode::Safe,
        }
    }
}

impl AdcsConfig {
    pub fn from_ron_str(s: &str) -> Result<Self, ConfigErrors> {
        let config: Self = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigErrors> {
        let contents = fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigErrors> {
        Ok(to_string_pretty(self, PrettyConfig::new())?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigErrors> {
        fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigErrors> {
        positive("max_torque", self.max_torque)?;
        positive("fault_threshold", self.fault_threshold)?;
        positive("integral_limit", self.integral_limit)?;
        positive("science_torque_limit", self.science_torque_limit)?;
        finite("kp_detumble", self.kp_detumble)?;
        finite("kp_point", self.kp_point)?;
        finite("ki_point", self.ki_point)?;
        finite("kd_point", self.kd_point)?;
        finite("science_scale", self.science_scale)?;
        Ok(())
    }

    pub fn with_control_period(mut self, dt: TimeStep) -> Self {
        self.control_period = dt;
        self
    }

    pub fn with_gains(mut self, kp_detumble: f64, kp_point: f64, kd_point: f64) -> Self {
        self.kp_detumble = kp_detumble;
        self.kp_point = kp_point;
        self.kd_point = kd_point;
        self
    }

    pub fn with_max_torque(mut self, max_torque: f64) -> Self {
        self.max_torque = max_torque;
        self
    }

    pub fn with_fault_threshold(mut self, threshold: f64) -> Self {
        self.fault_threshold = threshold;
        self
    }

    pub fn with_initial_mode(mut self, mode: ControlMode) -> Self {
        self.initial_mode = mode;
        self
    }

    pub fn controller_parameters(&self) -> AttitudeControllerParameters {
        AttitudeControllerParameters {
            kp_detumble: self.kp_detumble,
            pointing: PidGains::new(self.kp_point, self.ki_point, self.kd_point),
            integral_limit: self.integral_limit,
            max_torque: self.max_torque,
            science_scale: self.science_scale,
            science_torque_limit: self.science_torque_limit,
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigErrors> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigErrors::NotPositive(name, value));
    }
    Ok(())
}

fn finite(name: &'static str, value: f64) -> Result<(), ConfigErrors> {
    if !value.is_finite() {
        return Err(ConfigErrors::NotFinite(name, value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AdcsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_ron_round_trip() {
        let config = AdcsConfig::default()
            .with_gains(0.2, 0.06, 0.02)
            .with_initial_mode(ControlMode::Detumble);
        let s = config.to_ron_string().unwrap();
        assert_eq!(AdcsConfig::from_ron_str(&s).unwrap(), config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = AdcsConfig::from_ron_str("(max_torque: 0.2, initial_mode: Pointing)").unwrap();
        assert_eq!(config.max_torque, 0.2);
        assert_eq!(config.initial_mode, ControlMode::Pointing);
        assert_eq!(config.fault_threshold, 0.5);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            AdcsConfig::from_ron_str("(fault_threshold: -1.0)"),
            Err(ConfigErrors::NotPositive("fault_threshold", _))
        ));
        // zero period fails while parsing the TimeStep
        assert!(matches!(
            AdcsConfig::from_ron_str("(control_period: 0.0)"),
            Err(ConfigErrors::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join("adcs_config_test_save_and_load.ron");
        let config = AdcsConfig::default().with_max_torque(0.3);
        config.save(&path).unwrap();
        assert_eq!(AdcsConfig::load(&path).unwrap(), config);
        let _ = std::fs::remove_file(&path);
    }
}
