use serde::{Deserialize, Serialize};

use crate::mode::ControlMode;

/// Fault bitmask for a single control cycle.
///
/// Bits 0-2 are the per-axis rate checks, bit 3 is the sensor value sanity check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaultFlags(u8);

impl FaultFlags {
    pub const RATE_X: u8 = 0x01;
    pub const RATE_Y: u8 = 0x02;
    pub const RATE_Z: u8 = 0x04;
    pub const SENSOR: u8 = 0x08;

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & (Self::RATE_X | Self::RATE_Y | Self::RATE_Z | Self::SENSOR))
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// axis in 0..3
    pub fn set_rate_fault(&mut self, axis: usize) {
        debug_assert!(axis < 3);
        self.0 |= 1 << axis;
    }

    pub fn rate_fault(&self, axis: usize) -> bool {
        axis < 3 && self.0 & (1 << axis) != 0
    }

    pub fn set_sensor_fault(&mut self) {
        self.0 |= Self::SENSOR;
    }

    pub fn sensor_fault(&self) -> bool {
        self.0 & Self::SENSOR != 0
    }
}

impl From<FaultFlags> for u8 {
    fn from(flags: FaultFlags) -> Self {
        flags.0
    }
}

/// Read-only snapshot of the coordinator health counters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub mode: ControlMode,
    pub fault_flags: FaultFlags,
    pub control_cycles: u32,
    pub uptime_seconds: u32,
    pub consecutive_invalid_frames: u32,
    pub consecutive_fault_cycles: u32,
}

impl std::fmt::Display for HealthReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "mode:               {}", self.mode)?;
        writeln!(f, "fault flags:        {:#06b}", self.fault_flags.bits())?;
        writeln!(f, "control cycles:     {}", self.control_cycles)?;
        writeln!(f, "uptime (s):         {}", self.uptime_seconds)?;
        writeln!(f, "invalid frames:     {}", self.consecutive_invalid_frames)?;
        write!(f, "fault cycles:       {}", self.consecutive_fault_cycles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_bits() {
        let mut flags = FaultFlags::default();
        assert!(flags.is_empty());
        flags.set_rate_fault(1);
        flags.set_sensor_fault();
        assert_eq!(flags.bits(), FaultFlags::RATE_Y | FaultFlags::SENSOR);
        assert!(!flags.rate_fault(0));
        assert!(flags.rate_fault(1));
        assert!(!flags.rate_fault(3));
        assert!(flags.sensor_fault());
        flags.clear();
        assert!(flags.is_empty());
    }

    #[test]
    fn test_from_bits_masks_unused() {
        assert_eq!(FaultFlags::from_bits(0xff).bits(), 0x0f);
    }
}
