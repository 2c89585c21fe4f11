// Drive status reporting

use std::collections::BTreeMap;

use serde::Serialize;

/// Which kinematics variant a status snapshot describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveKind {
    TankDrive,
    CarDrive,
    Turret,
}

/// Snapshot of a drive system's readiness and capabilities.
///
/// `available_operations` is derived from device availability at the moment
/// of the call, never cached, so it always reflects the true state.
#[derive(Debug, Clone, Serialize)]
pub struct DriveStatus {
    pub initialized: bool,
    #[serde(rename = "drive_system_type")]
    pub kind: DriveKind,
    pub devices: BTreeMap<String, bool>,
    pub available_operations: Vec<&'static str>,
}

impl DriveStatus {
    pub fn new(kind: DriveKind, initialized: bool) -> Self {
        Self {
            initialized,
            kind,
            devices: BTreeMap::new(),
            available_operations: Vec::new(),
        }
    }

    /// Record one device's availability
    pub fn device(mut self, name: &str, available: bool) -> Self {
        self.devices.insert(name.to_string(), available);
        self
    }

    pub fn supports(&self, operation: &str) -> bool {
        self.available_operations.iter().any(|op| *op == operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_field_names_are_stable() {
        let mut status = DriveStatus::new(DriveKind::TankDrive, true)
            .device("drive_L_motor", true)
            .device("drive_R_motor", false);
        status.available_operations.push("limited_movement");

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"drive_system_type\":\"tank_drive\""));
        assert!(json.contains("\"drive_L_motor\":true"));
        assert!(json.contains("\"available_operations\":[\"limited_movement\"]"));
    }
}
