// Car drive: one steering motor plus two rear drive motors
//
// Steering and propulsion are decoupled. The steering motor takes an
// amplified joystick command on its own, while both drive motors share one
// speed; a small threshold keeps the drivetrain from buzzing on near-zero
// commands.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::config::{
    self, DEFAULT_DRIFT_SPEED, DEFAULT_DRIVE_SPEED, DEFAULT_STEER_SPEED, SPEED_MIN,
};
use crate::device::{DeviceRegistry, StopAction};
use crate::drive::status::{DriveKind, DriveStatus};
use crate::drive::{validate_speed, validate_speed_within, DriveSystem};

// Drive commands at or below this magnitude stop the motors instead of
// sending a near-zero PWM that only makes them whine
const MOVE_THRESHOLD: i32 = 10;

// Fixed amplification from steering input to steering motor speed
const STEER_GAIN: i32 = 2;

pub struct CarDrive {
    registry: Arc<DeviceRegistry>,
    steer_motor: &'static str,
    left_motor: &'static str,
    right_motor: &'static str,
    initialized: bool,
    default_drive_speed: i32,
    default_steer_speed: i32,
    drift_speed: i32,
}

impl CarDrive {
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self {
            registry,
            steer_motor: config::STEER_MOTOR,
            left_motor: config::LEFT_MOTOR,
            right_motor: config::RIGHT_MOTOR,
            initialized: false,
            default_drive_speed: DEFAULT_DRIVE_SPEED,
            default_steer_speed: DEFAULT_STEER_SPEED,
            drift_speed: DEFAULT_DRIFT_SPEED,
        }
    }

    /// Stop only the steering motor
    pub fn stop_steering(&mut self) {
        self.registry.stop(self.steer_motor, StopAction::Coast);
    }

    /// Stop only the drive motors
    pub fn stop_drive_motors(&mut self) {
        self.registry.stop(self.left_motor, StopAction::Coast);
        self.registry.stop(self.right_motor, StopAction::Coast);
    }

    pub fn set_drive_speed(&mut self, speed: i32) {
        self.default_drive_speed = validate_speed(speed);
    }

    pub fn set_steer_speed(&mut self, speed: i32) {
        self.default_steer_speed = validate_speed(speed);
    }

    /// Default speeds as (drive, steer, drift)
    pub fn default_speeds(&self) -> (i32, i32, i32) {
        (
            self.default_drive_speed,
            self.default_steer_speed,
            self.drift_speed,
        )
    }

    fn finish_steering_after(&mut self, duration: Option<Duration>) {
        if let Some(d) = duration {
            thread::sleep(d);
            self.stop_steering();
        }
    }

    fn finish_drive_after(&mut self, duration: Option<Duration>) {
        if let Some(d) = duration {
            thread::sleep(d);
            self.stop_drive_motors();
        }
    }
}

impl DriveSystem for CarDrive {
    fn initialize(&mut self) -> bool {
        // Partial capability by design: steering alone makes the car usable
        self.initialized = self.registry.is_available(self.steer_motor);
        debug!("car drive initialized: {}", self.initialized);
        self.initialized
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn move_forward(&mut self, speed: i32, duration: Option<Duration>) {
        let v = validate_speed(speed);
        // Physical forward is the negative command direction
        self.registry.run(self.left_motor, -v);
        self.registry.run(self.right_motor, -v);
        self.finish_drive_after(duration);
    }

    fn move_backward(&mut self, speed: i32, duration: Option<Duration>) {
        let v = validate_speed(speed);
        self.registry.run(self.left_motor, v);
        self.registry.run(self.right_motor, v);
        self.finish_drive_after(duration);
    }

    fn turn_left(&mut self, speed: i32, duration: Option<Duration>) {
        let v = validate_speed(speed);
        self.registry.run(self.steer_motor, -v);
        self.finish_steering_after(duration);
    }

    fn turn_right(&mut self, speed: i32, duration: Option<Duration>) {
        let v = validate_speed(speed);
        self.registry.run(self.steer_motor, v);
        self.finish_steering_after(duration);
    }

    fn move_with_steering(&mut self, drive_speed: i32, steer_input: i32) {
        let drive = validate_speed(drive_speed);
        let steer = validate_speed(steer_input);

        // Steering first, amplified and independent of drive speed
        self.registry.run(self.steer_motor, steer * STEER_GAIN);

        if drive.abs() > MOVE_THRESHOLD {
            self.registry.run(self.left_motor, -drive);
            self.registry.run(self.right_motor, -drive);
        } else {
            self.stop_drive_motors();
        }
    }

    fn drift_left(&mut self, speed: i32) {
        let v = validate_speed_within(speed, SPEED_MIN, self.drift_speed);
        self.registry.run(self.steer_motor, -v);
        self.registry.run(self.left_motor, -v);
        self.registry.run(self.right_motor, v);
    }

    fn drift_right(&mut self, speed: i32) {
        let v = validate_speed_within(speed, SPEED_MIN, self.drift_speed);
        self.registry.run(self.steer_motor, v);
        self.registry.run(self.left_motor, v);
        self.registry.run(self.right_motor, -v);
    }

    fn stop(&mut self) {
        self.stop_steering();
        self.stop_drive_motors();
    }

    fn status(&self) -> DriveStatus {
        let steer = self.registry.is_available(self.steer_motor);
        let left = self.registry.is_available(self.left_motor);
        let right = self.registry.is_available(self.right_motor);

        let mut status = DriveStatus::new(DriveKind::CarDrive, self.initialized)
            .device(self.steer_motor, steer)
            .device(self.left_motor, left)
            .device(self.right_motor, right);

        if steer {
            status
                .available_operations
                .extend(["steering", "turn_left", "turn_right"]);
        }
        if left && right {
            status
                .available_operations
                .extend(["move_forward", "move_backward", "drift"]);
        }
        if steer && left && right {
            status.available_operations.push("full_car_control");
        }

        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LEFT_MOTOR, RIGHT_MOTOR, STEER_MOTOR};
    use crate::device::{MotorProbe, SimMotor};

    fn rig() -> (CarDrive, MotorProbe, MotorProbe, MotorProbe) {
        let mut registry = DeviceRegistry::new();
        let (steer, steer_probe) = SimMotor::new();
        let (left, left_probe) = SimMotor::new();
        let (right, right_probe) = SimMotor::new();
        registry.register_attempt(STEER_MOTOR, move || Ok(Box::new(steer)));
        registry.register_attempt(LEFT_MOTOR, move || Ok(Box::new(left)));
        registry.register_attempt(RIGHT_MOTOR, move || Ok(Box::new(right)));

        let mut car = CarDrive::new(Arc::new(registry));
        assert!(car.initialize());
        (car, steer_probe, left_probe, right_probe)
    }

    #[test]
    fn test_steering_is_amplified() {
        let (mut car, steer, left, right) = rig();
        car.move_with_steering(500, 300);

        assert_eq!(steer.speed(), 600);
        assert_eq!(left.speed(), -500);
        assert_eq!(right.speed(), -500);
    }

    #[test]
    fn test_sub_threshold_drive_stops_motors() {
        let (mut car, steer, left, right) = rig();
        car.move_forward(500, None);

        car.move_with_steering(10, 300);
        assert_eq!(steer.speed(), 600);
        assert_eq!(left.speed(), 0);
        assert_eq!(right.speed(), 0);
        assert!(!left.running());
        assert!(!right.running());

        // Just over the threshold the motors run again
        car.move_with_steering(11, 300);
        assert_eq!(left.speed(), -11);
        assert_eq!(right.speed(), -11);
    }

    #[test]
    fn test_turns_only_touch_steering() {
        let (mut car, steer, left, right) = rig();

        car.turn_left(400, None);
        assert_eq!(steer.speed(), -400);
        assert_eq!(left.speed(), 0);
        assert_eq!(right.speed(), 0);

        car.turn_right(400, None);
        assert_eq!(steer.speed(), 400);
    }

    #[test]
    fn test_drift_pattern() {
        let (mut car, steer, left, right) = rig();

        car.drift_left(500);
        assert_eq!(steer.speed(), -500);
        assert_eq!(left.speed(), -500);
        assert_eq!(right.speed(), 500);

        car.drift_right(500);
        assert_eq!(steer.speed(), 500);
        assert_eq!(left.speed(), 500);
        assert_eq!(right.speed(), -500);
    }

    #[test]
    fn test_stop_halts_everything() {
        let (mut car, steer, left, right) = rig();
        car.move_with_steering(500, 300);

        car.stop();
        assert_eq!(steer.speed(), 0);
        assert_eq!(left.speed(), 0);
        assert_eq!(right.speed(), 0);

        // Second stop is still safe
        car.stop();
        assert!(!steer.running());
    }

    #[test]
    fn test_initialize_needs_only_steering() {
        let mut registry = DeviceRegistry::new();
        let (steer, _probe) = SimMotor::new();
        registry.register_attempt(STEER_MOTOR, move || Ok(Box::new(steer)));

        let mut car = CarDrive::new(Arc::new(registry));
        assert!(car.initialize());

        let status = car.status();
        assert!(status.supports("steering"));
        assert!(status.supports("turn_left"));
        assert!(!status.supports("move_forward"));
        assert!(!status.supports("full_car_control"));
    }

    #[test]
    fn test_status_with_all_devices() {
        let (car, _steer, _left, _right) = rig();
        let status = car.status();

        assert_eq!(status.kind, DriveKind::CarDrive);
        assert!(status.supports("steering"));
        assert!(status.supports("move_forward"));
        assert!(status.supports("drift"));
        assert!(status.supports("full_car_control"));
    }

    #[test]
    fn test_without_devices_nothing_panics() {
        let mut car = CarDrive::new(Arc::new(DeviceRegistry::new()));
        assert!(!car.initialize());

        car.move_with_steering(500, 300);
        car.drift_left(800);
        car.stop();

        assert!(car.status().available_operations.is_empty());
    }
}
