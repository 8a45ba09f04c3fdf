use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum ModeErrors {
    #[error(
        "invalid control mode {0}, expected 0 (safe), 1 (detumble), 2 (pointing) or 3 (science)"
    )]
    InvalidMode(i32),
}

/// Control modes with their fixed bus encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ControlMode {
    /// Zero actuation
    #[default]
    Safe = 0,
    /// B-dot law on the magnetorquers
    Detumble = 1,
    /// Rate damping on the reaction wheels
    Pointing = 2,
    /// Low authority rate damping on the reaction wheels
    Science = 3,
}

impl ControlMode {
    pub const ALL: [ControlMode; 4] = [
        ControlMode::Safe,
        ControlMode::Detumble,
        ControlMode::Pointing,
        ControlMode::Science,
    ];

    /// Decodes a raw mode selector, anything out of range is treated as Safe.
    pub fn from_raw_or_safe(raw: i32) -> Self {
        Self::try_from(raw).unwrap_or(ControlMode::Safe)
    }

    pub fn as_raw(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            ControlMode::Safe => "safe",
            ControlMode::Detumble => "detumble",
            ControlMode::Pointing => "pointing",
            ControlMode::Science => "science",
        }
    }
}

impl TryFrom<i32> for ControlMode {
    type Error = ModeErrors;
    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(ControlMode::Safe),
            1 => Ok(ControlMode::Detumble),
            2 => Ok(ControlMode::Pointing),
            3 => Ok(ControlMode::Science),
            _ => Err(ModeErrors::InvalidMode(raw)),
        }
    }
}

impl From<ControlMode> for u8 {
    fn from(mode: ControlMode) -> Self {
        mode.as_raw()
    }
}

impl std::fmt::Display for ControlMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_round_trip() {
        for mode in ControlMode::ALL {
            assert_eq!(ControlMode::try_from(mode.as_raw() as i32), Ok(mode));
        }
    }

    #[test]
    fn test_out_of_range_is_safe() {
        assert_eq!(ControlMode::try_from(5), Err(ModeErrors::InvalidMode(5)));
        assert_eq!(ControlMode::from_raw_or_safe(5), ControlMode::Safe);
        assert_eq!(ControlMode::from_raw_or_safe(-1), ControlMode::Safe);
        assert_eq!(ControlMode::from_raw_or_safe(3), ControlMode::Science);
    }
}
