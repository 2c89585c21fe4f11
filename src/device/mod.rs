// Device layer
//
// Provides:
// - The rotary actuator capability contract and its error type
// - A simulated motor backend with an observable probe
// - The registry that tracks availability and wraps every device call

pub mod actuator;
pub mod registry;

pub use actuator::{DeviceError, MotorProbe, RotaryActuator, SimMotor, SimMotorState, StopAction};
pub use registry::{DeviceRegistry, Registration, RegistrySummary};
