// Device registry: named actuators, availability tracking, safe calls
//
// Every fallible device interaction funnels through here. Construction
// failures are recorded once at registration time and never retried;
// operation failures are logged and converted to None. Above this boundary
// the drive systems branch only on availability.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::device::actuator::{DeviceError, RotaryActuator, StopAction};

type Handle = Mutex<Box<dyn RotaryActuator>>;

/// Outcome of a registration that offered a fallback handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Primary,
    Fallback,
    Missing,
}

/// Availability counts and name lists
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySummary {
    pub total: usize,
    pub available: usize,
    pub missing: usize,
    pub available_devices: Vec<String>,
    pub missing_devices: Vec<String>,
}

/// Tracks every named device and whether it is usable.
///
/// The mapping is mutated only during the registration phase; afterwards the
/// registry is shared immutably and per-device mutexes provide the interior
/// mutability the actuator calls need.
#[derive(Default)]
pub struct DeviceRegistry {
    devices: HashMap<String, Option<Handle>>,
    available: Vec<String>,
    missing: Vec<String>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to construct and register a device under `name`.
    ///
    /// A failed factory marks the name missing; the error is logged and
    /// never propagated. Returns whether the device ended up available.
    pub fn register_attempt<F>(&mut self, name: &str, factory: F) -> bool
    where
        F: FnOnce() -> Result<Box<dyn RotaryActuator>, DeviceError>,
    {
        self.forget(name);
        match factory() {
            Ok(device) => {
                self.devices.insert(name.to_string(), Some(Mutex::new(device)));
                self.available.push(name.to_string());
                info!("{} initialized", name);
                true
            }
            Err(e) => {
                self.devices.insert(name.to_string(), None);
                self.missing.push(name.to_string());
                warn!("{} not found: {}", name, e);
                false
            }
        }
    }

    /// As `register_attempt`, but a failed primary with a fallback handle
    /// installs the fallback and still counts the name available. Whether
    /// the fallback is in use is only visible in the return value; the
    /// registry keeps no real-vs-fallback distinction.
    pub fn register_with_fallback<F>(
        &mut self,
        name: &str,
        factory: F,
        fallback: Option<Box<dyn RotaryActuator>>,
    ) -> Registration
    where
        F: FnOnce() -> Result<Box<dyn RotaryActuator>, DeviceError>,
    {
        if self.register_attempt(name, factory) {
            return Registration::Primary;
        }
        match fallback {
            Some(device) => {
                info!("using fallback device for {}", name);
                self.devices.insert(name.to_string(), Some(Mutex::new(device)));
                self.missing.retain(|n| n != name);
                self.available.push(name.to_string());
                Registration::Fallback
            }
            None => Registration::Missing,
        }
    }

    // Drop any previous registration so the available/missing lists keep
    // partitioning the key set.
    fn forget(&mut self, name: &str) {
        self.devices.remove(name);
        self.available.retain(|n| n != name);
        self.missing.retain(|n| n != name);
    }

    pub fn is_available(&self, name: &str) -> bool {
        matches!(self.devices.get(name), Some(Some(_)))
    }

    /// True only if every listed device is available. Vacuously true for an
    /// empty list.
    pub fn all_available(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.is_available(name))
    }

    /// Run an arbitrary operation against a device.
    ///
    /// Absent device: no action, returns None. Failed operation (including a
    /// capability mismatch): logged with device and operation context,
    /// returns None. This is the only place device faults are observed.
    pub fn with_device<T, F>(&self, name: &str, operation: &'static str, f: F) -> Option<T>
    where
        F: FnOnce(&mut dyn RotaryActuator) -> Result<T, DeviceError>,
    {
        let Some(Some(handle)) = self.devices.get(name) else {
            debug!("skipping {} on {}: device not available", operation, name);
            return None;
        };
        let Ok(mut device) = handle.lock() else {
            warn!("skipping {} on {}: handle poisoned", operation, name);
            return None;
        };
        match f(device.as_mut()) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{} failed on {}: {}", operation, name, e);
                None
            }
        }
    }

    // === Fixed-method wrappers over the capability set ===
    //
    // Command wrappers report whether the call landed on a device; reads
    // keep the optional result.

    pub fn run(&self, name: &str, speed: i32) -> bool {
        self.with_device(name, "run", |device| device.run(speed))
            .is_some()
    }

    pub fn stop(&self, name: &str, action: StopAction) -> bool {
        self.with_device(name, "stop", |device| device.stop(action))
            .is_some()
    }

    pub fn reset_angle(&self, name: &str, angle: i32) -> bool {
        self.with_device(name, "reset_angle", |device| device.reset_angle(angle))
            .is_some()
    }

    pub fn angle(&self, name: &str) -> Option<i32> {
        self.with_device(name, "angle", |device| device.angle())
    }

    pub fn run_target(
        &self,
        name: &str,
        speed: i32,
        angle: i32,
        then: StopAction,
        wait: bool,
    ) -> bool {
        self.with_device(name, "run_target", |device| {
            device.run_target(speed, angle, then, wait)
        })
        .is_some()
    }

    pub fn summary(&self) -> RegistrySummary {
        RegistrySummary {
            total: self.devices.len(),
            available: self.available.len(),
            missing: self.missing.len(),
            available_devices: self.available.clone(),
            missing_devices: self.missing.clone(),
        }
    }

    /// Log the availability of every registered device
    pub fn log_status(&self) {
        let summary = self.summary();
        info!(
            "devices: {}/{} available",
            summary.available, summary.total
        );
        for name in &summary.available_devices {
            info!("  + {}", name);
        }
        for name in &summary.missing_devices {
            info!("  - {}", name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::actuator::SimMotor;

    fn failing_factory() -> Result<Box<dyn RotaryActuator>, DeviceError> {
        Err(DeviceError::OperationFailed {
            reason: "no such port".to_string(),
        })
    }

    #[test]
    fn test_register_success() {
        let mut registry = DeviceRegistry::new();
        let (motor, _probe) = SimMotor::new();
        assert!(registry.register_attempt("drive_L_motor", move || Ok(Box::new(motor))));
        assert!(registry.is_available("drive_L_motor"));

        let summary = registry.summary();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.available, 1);
        assert_eq!(summary.missing, 0);
    }

    #[test]
    fn test_register_failure_marks_missing() {
        let mut registry = DeviceRegistry::new();
        assert!(!registry.register_attempt("steer_motor", failing_factory));
        assert!(!registry.is_available("steer_motor"));

        let summary = registry.summary();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.available, 0);
        assert_eq!(summary.missing, 1);
        assert_eq!(summary.missing_devices, vec!["steer_motor".to_string()]);
        assert_eq!(summary.total, summary.available + summary.missing);
    }

    #[test]
    fn test_unknown_device_is_safe() {
        let registry = DeviceRegistry::new();
        assert!(!registry.is_available("nope"));
        assert!(!registry.run("nope", 500));
        assert_eq!(registry.angle("nope"), None);
    }

    #[test]
    fn test_all_available() {
        let mut registry = DeviceRegistry::new();
        let (motor, _probe) = SimMotor::new();
        registry.register_attempt("drive_L_motor", move || Ok(Box::new(motor)));
        registry.register_attempt("drive_R_motor", failing_factory);

        // Empty requirement lists are vacuously satisfied
        assert!(registry.all_available(&[]));
        assert!(registry.all_available(&["drive_L_motor"]));
        assert!(!registry.all_available(&["drive_L_motor", "drive_R_motor"]));
    }

    #[test]
    fn test_operation_error_becomes_none() {
        let mut registry = DeviceRegistry::new();
        let (motor, probe) = SimMotor::new();
        registry.register_attempt("drive_L_motor", move || Ok(Box::new(motor)));

        let result: Option<()> = registry.with_device("drive_L_motor", "self_test", |_| {
            Err(DeviceError::OperationFailed {
                reason: "transient fault".to_string(),
            })
        });
        assert_eq!(result, None);

        // The device is still usable afterwards
        assert!(registry.run("drive_L_motor", 200));
        assert_eq!(probe.speed(), 200);
    }

    #[test]
    fn test_capability_mismatch_becomes_none() {
        struct VelocityOnlyMotor;
        impl RotaryActuator for VelocityOnlyMotor {
            fn run(&mut self, _speed: i32) -> Result<(), DeviceError> {
                Ok(())
            }
            fn stop(&mut self, _action: StopAction) -> Result<(), DeviceError> {
                Ok(())
            }
        }

        let mut registry = DeviceRegistry::new();
        registry.register_attempt("turret_motor", || Ok(Box::new(VelocityOnlyMotor)));

        assert!(registry.run("turret_motor", 100));
        assert!(!registry.run_target("turret_motor", 200, 45, StopAction::Hold, false));
        assert_eq!(registry.angle("turret_motor"), None);
    }

    #[test]
    fn test_fallback_installed_on_failure() {
        let mut registry = DeviceRegistry::new();
        let (fallback, probe) = SimMotor::new();
        let outcome =
            registry.register_with_fallback("steer_motor", failing_factory, Some(Box::new(fallback)));

        assert_eq!(outcome, Registration::Fallback);
        assert!(registry.is_available("steer_motor"));

        let summary = registry.summary();
        assert_eq!(summary.available, 1);
        assert_eq!(summary.missing, 0);

        registry.run("steer_motor", 300);
        assert_eq!(probe.speed(), 300);
    }

    #[test]
    fn test_fallback_absent_stays_missing() {
        let mut registry = DeviceRegistry::new();
        let outcome = registry.register_with_fallback("steer_motor", failing_factory, None);
        assert_eq!(outcome, Registration::Missing);
        assert!(!registry.is_available("steer_motor"));
    }

    #[test]
    fn test_primary_success_ignores_fallback() {
        let mut registry = DeviceRegistry::new();
        let (primary, primary_probe) = SimMotor::new();
        let (fallback, fallback_probe) = SimMotor::new();
        let outcome = registry.register_with_fallback(
            "steer_motor",
            move || Ok(Box::new(primary)),
            Some(Box::new(fallback)),
        );

        assert_eq!(outcome, Registration::Primary);
        registry.run("steer_motor", 400);
        assert_eq!(primary_probe.speed(), 400);
        assert_eq!(fallback_probe.speed(), 0);
    }

    #[test]
    fn test_reregistration_keeps_partition() {
        let mut registry = DeviceRegistry::new();
        registry.register_attempt("drive_L_motor", failing_factory);
        let (motor, _probe) = SimMotor::new();
        registry.register_attempt("drive_L_motor", move || Ok(Box::new(motor)));

        let summary = registry.summary();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.available, 1);
        assert_eq!(summary.missing, 0);
        assert_eq!(summary.available_devices, vec!["drive_L_motor".to_string()]);
    }
}
