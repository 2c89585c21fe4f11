// Tank drive: differential steering over left and right track motors
//
// Steering comes entirely from the speed difference between the tracks. The
// joystick path uses an asymmetric differential: the inner track slows or
// reverses with the full steering factor while the outer track speeds up by
// half of it, which turns much tighter than slowing the inner track alone.
// The outer-track boost is deliberate and load-bearing for handling feel.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::config::{
    self, DEFAULT_DRIFT_SPEED, DEFAULT_DRIVE_SPEED, DEFAULT_TURN_SPEED, SPEED_MIN,
};
use crate::device::{DeviceRegistry, StopAction};
use crate::drive::status::{DriveKind, DriveStatus};
use crate::drive::{validate_speed, validate_speed_within, DriveSystem};

// Steering factors this close to zero drive straight
const STEER_DEADZONE: f32 = 0.05;

pub struct TankDrive {
    registry: Arc<DeviceRegistry>,
    left_motor: &'static str,
    right_motor: &'static str,
    initialized: bool,
    default_drive_speed: i32,
    default_turn_speed: i32,
    drift_speed: i32,
    // Joystick steering multiplier: 1.0 normal, 2.0 aggressive
    steering_sensitivity: f32,
}

impl TankDrive {
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self {
            registry,
            left_motor: config::LEFT_MOTOR,
            right_motor: config::RIGHT_MOTOR,
            initialized: false,
            default_drive_speed: DEFAULT_DRIVE_SPEED,
            default_turn_speed: DEFAULT_TURN_SPEED,
            drift_speed: DEFAULT_DRIFT_SPEED,
            steering_sensitivity: 2.0,
        }
    }

    /// Joystick entry point. Zero input stops the tracks outright instead of
    /// streaming zero-speed run commands at a stopped robot.
    pub fn joystick_control(&mut self, drive_speed: i32, steer_input: i32) {
        let drive = validate_speed(drive_speed);
        let steer = validate_speed(steer_input);
        if drive == 0 && steer == 0 {
            self.stop();
            return;
        }
        self.move_with_steering(drive, steer);
    }

    /// Command each track directly
    pub fn set_motor_speeds(&mut self, left_speed: i32, right_speed: i32) {
        self.registry.run(self.left_motor, validate_speed(left_speed));
        self.registry.run(self.right_motor, validate_speed(right_speed));
    }

    /// Rotate in place, tracks counter-rotating at full speed
    pub fn pivot_left(&mut self, speed: i32, duration: Option<Duration>) {
        let v = validate_speed(speed);
        self.registry.run(self.left_motor, v);
        self.registry.run(self.right_motor, -v);
        self.finish_after(duration);
    }

    /// Rotate in place, tracks counter-rotating at full speed
    pub fn pivot_right(&mut self, speed: i32, duration: Option<Duration>) {
        let v = validate_speed(speed);
        self.registry.run(self.left_motor, -v);
        self.registry.run(self.right_motor, v);
        self.finish_after(duration);
    }

    /// Update the default speeds; `None` leaves a value unchanged
    pub fn set_default_speeds(
        &mut self,
        drive_speed: Option<i32>,
        turn_speed: Option<i32>,
        drift_speed: Option<i32>,
    ) {
        if let Some(v) = drive_speed {
            self.default_drive_speed = validate_speed(v);
        }
        if let Some(v) = turn_speed {
            self.default_turn_speed = validate_speed(v);
        }
        if let Some(v) = drift_speed {
            self.drift_speed = validate_speed(v);
        }
    }

    /// Default speeds as (drive, turn, drift)
    pub fn default_speeds(&self) -> (i32, i32, i32) {
        (
            self.default_drive_speed,
            self.default_turn_speed,
            self.drift_speed,
        )
    }

    pub fn set_steering_sensitivity(&mut self, sensitivity: f32) {
        self.steering_sensitivity = sensitivity.clamp(0.1, 5.0);
    }

    pub fn steering_sensitivity(&self) -> f32 {
        self.steering_sensitivity
    }

    fn finish_after(&mut self, duration: Option<Duration>) {
        if let Some(d) = duration {
            thread::sleep(d);
            self.stop();
        }
    }
}

impl DriveSystem for TankDrive {
    fn initialize(&mut self) -> bool {
        // Differential steering needs both tracks
        self.initialized = self
            .registry
            .all_available(&[self.left_motor, self.right_motor]);
        debug!("tank drive initialized: {}", self.initialized);
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
        self.finish_after(duration);
    }

    fn move_backward(&mut self, speed: i32, duration: Option<Duration>) {
        let v = validate_speed(speed);
        self.registry.run(self.left_motor, v);
        self.registry.run(self.right_motor, v);
        self.finish_after(duration);
    }

    fn turn_left(&mut self, speed: i32, duration: Option<Duration>) {
        let v = validate_speed(speed);
        // Inner track reversed at half speed for a sharp turn
        self.registry.run(self.left_motor, v / 2);
        self.registry.run(self.right_motor, -v);
        self.finish_after(duration);
    }

    fn turn_right(&mut self, speed: i32, duration: Option<Duration>) {
        let v = validate_speed(speed);
        self.registry.run(self.left_motor, -v);
        self.registry.run(self.right_motor, v / 2);
        self.finish_after(duration);
    }

    fn move_with_steering(&mut self, drive_speed: i32, steer_input: i32) {
        let drive = validate_speed(drive_speed);
        let steer = validate_speed(steer_input);

        let base = (-drive) as f32;
        let steer_factor =
            (steer as f32 / 1000.0 * self.steering_sensitivity).clamp(-1.0, 1.0);

        let (left, right) = if steer_factor.abs() < STEER_DEADZONE {
            (base, base)
        } else if steer_factor < 0.0 {
            // Reduce or reverse the inner track, boost the outer by half
            (
                base * (1.0 + steer_factor),
                base * (1.0 - steer_factor / 2.0),
            )
        } else {
            (
                base * (1.0 - steer_factor / 2.0),
                base * (1.0 + steer_factor),
            )
        };

        self.registry.run(self.left_motor, left as i32);
        self.registry.run(self.right_motor, right as i32);
    }

    fn drift_left(&mut self, speed: i32) {
        let v = validate_speed_within(speed, SPEED_MIN, self.drift_speed);
        self.registry.run(self.left_motor, v);
        self.registry.run(self.right_motor, -v);
    }

    fn drift_right(&mut self, speed: i32) {
        let v = validate_speed_within(speed, SPEED_MIN, self.drift_speed);
        self.registry.run(self.left_motor, -v);
        self.registry.run(self.right_motor, v);
    }

    fn stop(&mut self) {
        self.registry.stop(self.left_motor, StopAction::Coast);
        self.registry.stop(self.right_motor, StopAction::Coast);
    }

    fn status(&self) -> DriveStatus {
        let left = self.registry.is_available(self.left_motor);
        let right = self.registry.is_available(self.right_motor);

        let mut status = DriveStatus::new(DriveKind::TankDrive, self.initialized)
            .device(self.left_motor, left)
            .device(self.right_motor, right);

        if left && right {
            status.available_operations.extend([
                "move_forward",
                "move_backward",
                "turn_left",
                "turn_right",
                "drift_left",
                "drift_right",
                "differential_steering",
            ]);
        } else if left || right {
            status.available_operations.push("limited_movement");
        }

        status
    }
}
