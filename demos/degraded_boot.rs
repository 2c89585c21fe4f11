// Degraded boot demo: bring the rig up with hardware missing
//
// The steering motor comes up normally, the left drive motor falls back to a
// spare handle, and the right drive motor stays unplugged. The car drive
// still initializes on steering alone and every command lands only on what
// exists.
//
// Usage: cargo run --example degraded_boot

use std::sync::Arc;

use ev3_pad_runtime::config::{LEFT_MOTOR, RIGHT_MOTOR, STEER_MOTOR};
use ev3_pad_runtime::device::{DeviceError, DeviceRegistry, Registration, SimMotor};
use ev3_pad_runtime::drive::{CarDrive, DriveSystem};

fn main() {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let mut registry = DeviceRegistry::new();

    let (steer_motor, steer) = SimMotor::new();
    registry.register_attempt(STEER_MOTOR, move || Ok(Box::new(steer_motor)));

    // Primary construction fails, so the spare handle takes over
    let (spare_motor, spare) = SimMotor::new();
    let outcome = registry.register_with_fallback(
        LEFT_MOTOR,
        || {
            Err(DeviceError::OperationFailed {
                reason: "no motor on port A".to_string(),
            })
        },
        Some(Box::new(spare_motor)),
    );
    println!("left drive motor registration: {:?}", outcome);
    assert_eq!(outcome, Registration::Fallback);

    // Nothing plugged in at all on this one
    registry.register_attempt(RIGHT_MOTOR, || Err(DeviceError::NotFound));

    registry.log_status();
    println!(
        "summary: {}",
        serde_json::to_string(&registry.summary()).unwrap()
    );

    let mut car = CarDrive::new(Arc::new(registry));
    println!();
    println!("car initialized (steering alone is enough): {}", car.initialize());

    // The command lands on the steering motor and the fallback; the missing
    // right motor is skipped silently
    car.move_with_steering(500, 300);
    println!("steer motor command: {}", steer.speed());
    println!("left motor (fallback) command: {}", spare.speed());

    car.stop();
    println!();
    println!(
        "status: {}",
        serde_json::to_string_pretty(&car.status()).unwrap()
    );
}
