// Rotary actuator contract and the simulated backend
//
// Real hardware bindings live outside this crate; everything in here and
// above talks to motors through the RotaryActuator trait. SimMotor is the
// in-crate backend used by the binary, the demos, and the tests.

use std::sync::{Arc, Mutex};

/// What a motor does with its load once a command ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopAction {
    /// Cut power and let the load spin down freely
    Coast,
    /// Short the windings for passive braking
    Brake,
    /// Actively hold the current angle
    #[default]
    Hold,
}

/// Error types for device construction and operation
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("device not connected")]
    NotFound,

    #[error("operation {operation} not supported by this device")]
    CapabilityMismatch { operation: &'static str },

    #[error("device operation failed: {reason}")]
    OperationFailed { reason: String },
}

/// The fixed capability set the control core relies on.
///
/// `run` and `stop` are mandatory. The angle-bearing operations default to
/// `CapabilityMismatch` so a plain velocity motor can fill a slot that never
/// uses them; the registry turns the mismatch into a logged no-op.
pub trait RotaryActuator: Send {
    /// Run at a signed speed in degrees per second until further notice
    fn run(&mut self, speed: i32) -> Result<(), DeviceError>;

    /// Halt, applying the given stop action
    fn stop(&mut self, action: StopAction) -> Result<(), DeviceError>;

    /// Redefine the current physical position as `angle` degrees
    fn reset_angle(&mut self, _angle: i32) -> Result<(), DeviceError> {
        Err(DeviceError::CapabilityMismatch {
            operation: "reset_angle",
        })
    }

    /// Current shaft angle in degrees
    fn angle(&mut self) -> Result<i32, DeviceError> {
        Err(DeviceError::CapabilityMismatch { operation: "angle" })
    }

    /// Rotate to `angle` at `speed`, then apply `then`. With `wait` false
    /// the call returns while the move is still in progress.
    fn run_target(
        &mut self,
        _speed: i32,
        _angle: i32,
        _then: StopAction,
        _wait: bool,
    ) -> Result<(), DeviceError> {
        Err(DeviceError::CapabilityMismatch {
            operation: "run_target",
        })
    }
}

/// Observable state of a simulated motor
#[derive(Debug, Clone, Default)]
pub struct SimMotorState {
    pub speed: i32,
    pub angle: i32,
    pub running: bool,
    /// Last positional command, as (speed, angle)
    pub last_target: Option<(i32, i32)>,
    /// Number of stop commands received
    pub stops: u32,
}

/// Shared view into a SimMotor, for the demos and the tests
#[derive(Debug, Clone)]
pub struct MotorProbe {
    state: Arc<Mutex<SimMotorState>>,
}

impl MotorProbe {
    pub fn snapshot(&self) -> SimMotorState {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }

    pub fn speed(&self) -> i32 {
        self.snapshot().speed
    }

    pub fn running(&self) -> bool {
        self.snapshot().running
    }

    pub fn angle(&self) -> i32 {
        self.snapshot().angle
    }

    pub fn last_target(&self) -> Option<(i32, i32)> {
        self.snapshot().last_target
    }

    pub fn stops(&self) -> u32 {
        self.snapshot().stops
    }

    /// Move the simulated shaft, as if the load were back-driven
    pub fn set_angle(&self, angle: i32) {
        if let Ok(mut state) = self.state.lock() {
            state.angle = angle;
        }
    }
}

/// Simulated motor. Positional moves complete instantly.
#[derive(Debug)]
pub struct SimMotor {
    state: Arc<Mutex<SimMotorState>>,
}

impl SimMotor {
    pub fn new() -> (Self, MotorProbe) {
        let state = Arc::new(Mutex::new(SimMotorState::default()));
        let probe = MotorProbe {
            state: Arc::clone(&state),
        };
        (Self { state }, probe)
    }

    fn with_state(&self, f: impl FnOnce(&mut SimMotorState)) -> Result<(), DeviceError> {
        let mut state = self.state.lock().map_err(|_| DeviceError::OperationFailed {
            reason: "state lock poisoned".to_string(),
        })?;
        f(&mut state);
        Ok(())
    }
}

impl RotaryActuator for SimMotor {
    fn run(&mut self, speed: i32) -> Result<(), DeviceError> {
        self.with_state(|state| {
            state.speed = speed;
            state.running = true;
        })
    }

    fn stop(&mut self, _action: StopAction) -> Result<(), DeviceError> {
        self.with_state(|state| {
            state.speed = 0;
            state.running = false;
            state.stops += 1;
        })
    }

    fn reset_angle(&mut self, angle: i32) -> Result<(), DeviceError> {
        self.with_state(|state| {
            state.angle = angle;
        })
    }

    fn angle(&mut self) -> Result<i32, DeviceError> {
        let state = self.state.lock().map_err(|_| DeviceError::OperationFailed {
            reason: "state lock poisoned".to_string(),
        })?;
        Ok(state.angle)
    }

    fn run_target(
        &mut self,
        speed: i32,
        angle: i32,
        _then: StopAction,
        _wait: bool,
    ) -> Result<(), DeviceError> {
        // The simulated shaft reaches the target immediately
        self.with_state(|state| {
            state.last_target = Some((speed, angle));
            state.angle = angle;
            state.speed = 0;
            state.running = false;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A motor with only the mandatory capability set
    struct VelocityOnlyMotor;

    impl RotaryActuator for VelocityOnlyMotor {
        fn run(&mut self, _speed: i32) -> Result<(), DeviceError> {
            Ok(())
        }

        fn stop(&mut self, _action: StopAction) -> Result<(), DeviceError> {
            Ok(())
        }
    }

    #[test]
    fn test_optional_capabilities_default_to_mismatch() {
        let mut motor = VelocityOnlyMotor;
        assert!(matches!(
            motor.angle(),
            Err(DeviceError::CapabilityMismatch { operation: "angle" })
        ));
        assert!(matches!(
            motor.reset_angle(0),
            Err(DeviceError::CapabilityMismatch { .. })
        ));
        assert!(matches!(
            motor.run_target(200, 45, StopAction::Hold, false),
            Err(DeviceError::CapabilityMismatch { .. })
        ));
    }

    #[test]
    fn test_sim_motor_run_and_stop() {
        let (mut motor, probe) = SimMotor::new();
        motor.run(500).unwrap();
        assert_eq!(probe.speed(), 500);
        assert!(probe.running());

        motor.stop(StopAction::Coast).unwrap();
        assert_eq!(probe.speed(), 0);
        assert!(!probe.running());
        assert_eq!(probe.stops(), 1);
    }

    #[test]
    fn test_sim_motor_positional_move() {
        let (mut motor, probe) = SimMotor::new();
        motor.run_target(200, 45, StopAction::Hold, false).unwrap();
        assert_eq!(probe.last_target(), Some((200, 45)));
        assert_eq!(probe.angle(), 45);
        assert!(!probe.running());
    }

    #[test]
    fn test_sim_motor_reset_angle() {
        let (mut motor, probe) = SimMotor::new();
        probe.set_angle(77);
        motor.reset_angle(0).unwrap();
        assert_eq!(probe.angle(), 0);
        assert_eq!(motor.angle().unwrap(), 0);
    }
}
