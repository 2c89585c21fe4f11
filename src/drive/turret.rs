// Turret: a single rotational actuator with two control modes
//
// Positional mode maps the stick to a target angle inside soft limits and
// tracks the robot like a gimbal; velocity mode maps the stick to a
// proportional rotation speed. Homing defines whatever position the turret
// currently holds as the zero angle, so the robot should boot with the
// turret centered.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config;
use crate::device::{DeviceRegistry, StopAction};
use crate::drive::status::{DriveKind, DriveStatus};
use crate::drive::{validate_speed_within, DriveSystem};

// Stick magnitudes below this read as centered
const JOYSTICK_DEADZONE: i32 = 10;
// Target changes within this many degrees are ignored, which keeps stick
// jitter from streaming redundant positional commands
const ANGLE_THRESHOLD: i32 = 2;
// Full stick deflection on either side
const JOYSTICK_RANGE: i32 = 100;
// Speed used for positional moves, in degrees per second
const POSITIONING_SPEED: i32 = 200;

const DEFAULT_MIN_ANGLE: i32 = -90;
const DEFAULT_MAX_ANGLE: i32 = 90;
// Velocity-mode ceiling, degrees per second
const DEFAULT_MAX_SPEED: i32 = 360;

pub struct Turret {
    registry: Arc<DeviceRegistry>,
    motor: &'static str,
    initialized: bool,
    // Last commanded target, persisted for the jitter hysteresis
    current_target_angle: i32,
    min_angle: i32,
    max_angle: i32,
    max_speed: i32,
}

impl Turret {
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self {
            registry,
            motor: config::TURRET_MOTOR,
            initialized: false,
            current_target_angle: 0,
            min_angle: DEFAULT_MIN_ANGLE,
            max_angle: DEFAULT_MAX_ANGLE,
            max_speed: DEFAULT_MAX_SPEED,
        }
    }

    /// Define the current physical position as center. Calibration, not
    /// motion: the shaft does not move.
    pub fn home_turret(&mut self) {
        self.registry.reset_angle(self.motor, 0);
        self.current_target_angle = 0;
    }

    /// Positional mode: stick deflection becomes a target angle
    pub fn joystick_control(&mut self, x_axis: i32, _y_axis: i32) {
        if !self.registry.is_available(self.motor) {
            return;
        }

        let x = if x_axis.abs() < JOYSTICK_DEADZONE { 0 } else { x_axis };
        let target = self.scale_joystick_to_angle(x);

        if (target - self.current_target_angle).abs() > ANGLE_THRESHOLD {
            self.move_to_angle(target);
            self.current_target_angle = target;
        }
    }

    /// Map a stick value to the angle range. Each side scales against its
    /// own limit, so asymmetric limits stay reachable at full deflection.
    pub fn scale_joystick_to_angle(&self, joystick_value: i32) -> i32 {
        let v = joystick_value.clamp(-JOYSTICK_RANGE, JOYSTICK_RANGE);
        if v >= 0 {
            v * self.max_angle / JOYSTICK_RANGE
        } else {
            v * self.min_angle.abs() / JOYSTICK_RANGE
        }
    }

    /// Velocity mode: stick deflection becomes a rotation speed. Inside the
    /// deadzone the motor is stopped rather than sent a near-zero command.
    pub fn speed_control(&mut self, x_axis: i32, _y_axis: i32) {
        if !self.registry.is_available(self.motor) {
            return;
        }

        if x_axis.abs() <= JOYSTICK_DEADZONE {
            self.stop();
            return;
        }

        let speed = validate_speed_within(
            x_axis * self.max_speed / JOYSTICK_RANGE,
            -self.max_speed,
            self.max_speed,
        );
        self.registry.run(self.motor, speed);
    }

    /// Issue a positional command, clamped to the soft limits. Does not
    /// touch the hysteresis target.
    pub fn move_to_angle(&mut self, target_angle: i32) {
        let target = target_angle.clamp(self.min_angle, self.max_angle);
        self.registry
            .run_target(self.motor, POSITIONING_SPEED, target, StopAction::Hold, false);
    }

    /// Current shaft angle, or 0 when the motor is absent or unreadable
    pub fn current_angle(&self) -> i32 {
        self.registry.angle(self.motor).unwrap_or(0)
    }

    /// Target of the last issued positional command
    pub fn current_target(&self) -> i32 {
        self.current_target_angle
    }

    pub fn set_angle_limits(&mut self, min_angle: i32, max_angle: i32) {
        self.min_angle = min_angle;
        self.max_angle = max_angle;
        debug!("turret angle limits set to {}..{}", min_angle, max_angle);
    }

    pub fn set_max_speed(&mut self, max_speed: i32) {
        self.max_speed = max_speed;
    }

    pub fn max_speed(&self) -> i32 {
        self.max_speed
    }

    /// Camera tracking nudge: rotate toward a horizontal pixel offset
    pub fn track_offset(&mut self, offset: i32) {
        let speed = validate_speed_within(offset, -self.max_speed, self.max_speed);
        self.registry.run(self.motor, speed);
    }
}

impl DriveSystem for Turret {
    fn initialize(&mut self) -> bool {
        self.initialized = self.registry.is_available(self.motor);
        if self.initialized {
            // Wherever the turret sits at boot becomes the center reference
            self.home_turret();
        }
        debug!("turret initialized: {}", self.initialized);
        self.initialized
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    // Linear motion does not apply to a turret
    fn move_forward(&mut self, _speed: i32, _duration: Option<Duration>) {}

    fn move_backward(&mut self, _speed: i32, _duration: Option<Duration>) {}

    fn turn_left(&mut self, _speed: i32, _duration: Option<Duration>) {
        self.move_to_angle(self.min_angle);
    }

    fn turn_right(&mut self, _speed: i32, _duration: Option<Duration>) {
        self.move_to_angle(self.max_angle);
    }

    fn move_with_steering(&mut self, _drive_speed: i32, _steer_input: i32) {}

    fn stop(&mut self) {
        // Hold position so the turret does not sag under load
        self.registry.stop(self.motor, StopAction::Hold);
    }

    fn status(&self) -> DriveStatus {
        let motor = self.registry.is_available(self.motor);

        let mut status =
            DriveStatus::new(DriveKind::Turret, self.initialized).device(self.motor, motor);

        if motor {
            status
                .available_operations
                .extend(["positional_control", "speed_control", "homing"]);
        }

        status
    }
}
