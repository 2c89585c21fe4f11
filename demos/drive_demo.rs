// Drive demo: walk the tank drive through each maneuver on the sim rig
//
// Runs the maneuvers in sequence and reads the per-track commands back from
// the motor probes, the way a bench test would read them off hardware.
//
// Usage: cargo run --example drive_demo

use std::sync::Arc;
use std::time::Duration;

use ev3_pad_runtime::config::{LEFT_MOTOR, RIGHT_MOTOR};
use ev3_pad_runtime::device::{DeviceRegistry, MotorProbe, SimMotor};
use ev3_pad_runtime::drive::{DriveSystem, TankDrive};

fn print_tracks(step: &str, left: &MotorProbe, right: &MotorProbe) {
    println!(
        "  {:<28} left={:>5}  right={:>5}",
        step,
        left.speed(),
        right.speed()
    );
}

fn main() {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let mut registry = DeviceRegistry::new();
    let (left_motor, left) = SimMotor::new();
    let (right_motor, right) = SimMotor::new();
    registry.register_attempt(LEFT_MOTOR, move || Ok(Box::new(left_motor)));
    registry.register_attempt(RIGHT_MOTOR, move || Ok(Box::new(right_motor)));

    let mut tank = TankDrive::new(Arc::new(registry));
    println!("tank initialized: {}", tank.initialize());

    // Tone the defaults down for the walkthrough
    tank.set_default_speeds(Some(800), Some(400), Some(600));
    let (drive_speed, turn_speed, drift_speed) = tank.default_speeds();

    println!();
    println!("Step 1: joystick control");
    tank.joystick_control(drive_speed, 0);
    print_tracks("straight ahead", &left, &right);
    tank.joystick_control(drive_speed, 300);
    print_tracks("steering differential", &left, &right);
    tank.joystick_control(0, 0);
    print_tracks("stick released", &left, &right);

    println!();
    println!("Step 2: fixed-ratio turns");
    tank.turn_left(turn_speed, None);
    print_tracks("turn left", &left, &right);
    tank.turn_right(turn_speed, None);
    print_tracks("turn right", &left, &right);
    tank.pivot_left(turn_speed, None);
    print_tracks("pivot left", &left, &right);

    println!();
    println!("Step 3: drift");
    tank.drift_left(drift_speed);
    print_tracks("drift left", &left, &right);
    tank.drift_right(drift_speed);
    print_tracks("drift right", &left, &right);

    println!();
    println!("Step 4: timed move (auto-stop after 300 ms)");
    tank.move_forward(drive_speed, Some(Duration::from_millis(300)));
    print_tracks("after the timed move", &left, &right);

    println!();
    println!(
        "status: {}",
        serde_json::to_string_pretty(&tank.status()).unwrap()
    );
}
