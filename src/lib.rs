// Gamepad-driven drive runtime for an EV3-class brick
//
// Provides:
// - A device registry that degrades gracefully over missing hardware
// - Tank, car, and turret drive systems behind one capability contract
// - A 50 Hz control loop with an input-staleness watchdog

pub mod config;
pub mod device;
pub mod drive;
pub mod messages;
pub mod runtime;
pub mod teleop;
