// Loop rate, timeouts, device names, and the command envelope
use std::time::Duration;

// Control loop frequency
pub const LOOP_HZ: u64 = 50;

// Input timeout for the watchdog
pub const INPUT_TIMEOUT: Duration = Duration::from_millis(250);

// How often the runtime logs a drive status snapshot
pub const STATUS_PERIOD: Duration = Duration::from_secs(5);

// Device names shared by the registry and the drive systems
pub const LEFT_MOTOR: &str = "drive_L_motor";
pub const RIGHT_MOTOR: &str = "drive_R_motor";
pub const STEER_MOTOR: &str = "steer_motor";
pub const TURRET_MOTOR: &str = "turret_motor";

// Speed command envelope applied before any value reaches a device
pub const SPEED_MIN: i32 = -1000;
pub const SPEED_MAX: i32 = 1000;

// Per-axis rest detection on the drive stick, in axis units (-1000..1000)
pub const STICK_DEADZONE: i32 = 200;

// Default speeds for maneuvers that do not take one from the stick
pub const DEFAULT_DRIVE_SPEED: i32 = 1000;
pub const DEFAULT_TURN_SPEED: i32 = 500;
pub const DEFAULT_STEER_SPEED: i32 = 1000;
pub const DEFAULT_DRIFT_SPEED: i32 = 1000;
