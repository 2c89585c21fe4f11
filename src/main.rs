use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ev3_pad_runtime::config::{LEFT_MOTOR, RIGHT_MOTOR, STEER_MOTOR, TURRET_MOTOR};
use ev3_pad_runtime::device::{DeviceError, DeviceRegistry, SimMotor};
use ev3_pad_runtime::drive::{CarDrive, DriveSystem, TankDrive, Turret};
use ev3_pad_runtime::messages::InputEvent;
use ev3_pad_runtime::runtime::{self, Runtime};
use ev3_pad_runtime::teleop;

/// Gamepad-driven drive runtime with graceful device degradation
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Drive variant to run
    #[arg(long, value_enum, default_value = "tank")]
    drive: DriveVariant,

    /// Leave a device unplugged to exercise degraded mode (repeatable)
    #[arg(long = "without", value_name = "DEVICE")]
    without: Vec<String>,

    /// Skip the turret even if its motor is present
    #[arg(long)]
    no_turret: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DriveVariant {
    Tank,
    Car,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();

    let device_names: &[&str] = match args.drive {
        DriveVariant::Tank => &[LEFT_MOTOR, RIGHT_MOTOR, TURRET_MOTOR],
        DriveVariant::Car => &[STEER_MOTOR, LEFT_MOTOR, RIGHT_MOTOR, TURRET_MOTOR],
    };

    // The real hardware bindings live behind the RotaryActuator seam; this
    // binary runs the simulated rig and lets --without model unplugged ports
    let mut registry = DeviceRegistry::new();
    for &name in device_names {
        if args.without.iter().any(|w| w == name) {
            registry.register_attempt(name, || Err(DeviceError::NotFound));
        } else {
            registry.register_attempt(name, || {
                let (motor, _probe) = SimMotor::new();
                Ok(Box::new(motor))
            });
        }
    }
    registry.log_status();
    let registry = Arc::new(registry);

    let mut drive: Box<dyn DriveSystem + Send> = match args.drive {
        DriveVariant::Tank => Box::new(TankDrive::new(Arc::clone(&registry))),
        DriveVariant::Car => Box::new(CarDrive::new(Arc::clone(&registry))),
    };
    info!("drive initialized: {}", drive.initialize());

    let turret = if args.no_turret {
        None
    } else {
        let mut turret = Turret::new(Arc::clone(&registry));
        if turret.initialize() {
            Some(turret)
        } else {
            info!("turret motor not available, turret disabled");
            None
        }
    };

    let (event_tx, event_rx) = mpsc::channel::<InputEvent>(64);
    let keyboard = tokio::task::spawn_blocking(move || teleop::run(event_tx));

    if let Err(e) = runtime::run(Runtime::new(drive, turret), event_rx).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }

    match keyboard.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => eprintln!("Teleop error: {}", e),
        Err(e) => eprintln!("Teleop task panicked: {}", e),
    }
}
