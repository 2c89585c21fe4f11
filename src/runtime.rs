// 50 Hz control loop with an input watchdog
//
// Input producers push normalized events into an mpsc channel; the loop
// drains whatever arrived each tick and the watchdog stops the robot when
// the producer goes quiet. Without it, a crashed gamepad daemon would leave
// the last motion command running forever.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::config::{INPUT_TIMEOUT, LOOP_HZ, STATUS_PERIOD, STICK_DEADZONE};
use crate::drive::{DriveSystem, Turret};
use crate::messages::{BlockDetection, Button, GamepadState, InputEvent, RuntimeHealth};

// Blocks smaller than this in both dimensions are noise, not targets
const MIN_BLOCK_SIZE: i32 = 10;
// Horizontal pixel the camera reports for a centered target
const CAMERA_CENTER_X: i32 = 150;
// Drive stick units per turret stick unit
const TURRET_STICK_SCALE: i32 = 10;
// Speed for button-driven maneuvers
const BUTTON_SPEED: i32 = 1000;

pub struct Runtime {
    drive: Box<dyn DriveSystem + Send>,
    turret: Option<Turret>,
    sticks: GamepadState,
    input_received_at: Instant,
    has_input: bool,
    health: RuntimeHealth,
    // Suppresses redundant stop commands while the robot is already stopped
    drive_stopped: bool,
    shutdown: bool,
}

impl Runtime {
    pub fn new(drive: Box<dyn DriveSystem + Send>, turret: Option<Turret>) -> Self {
        Self {
            drive,
            turret,
            sticks: GamepadState::default(),
            input_received_at: Instant::now(),
            has_input: false,
            health: RuntimeHealth::InputStale, // Stale until the first event
            drive_stopped: true,
            shutdown: false,
        }
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown
    }

    /// Feed one event from a producer
    pub fn dispatch(&mut self, event: InputEvent) {
        match event {
            InputEvent::Sticks(state) => self.on_sticks(state),
            InputEvent::ButtonPressed(button) => self.on_button_pressed(button),
            InputEvent::ButtonReleased(button) => self.on_button_released(button),
            InputEvent::BlockDetected(block) => self.on_block(block),
        }
    }

    /// Watchdog pass, run once per loop tick
    pub fn tick(&mut self) {
        let stale = !self.has_input || self.input_received_at.elapsed() > INPUT_TIMEOUT;
        if stale {
            if self.health != RuntimeHealth::InputStale {
                warn!(
                    "input stale ({:?} old), stopping robot",
                    self.input_received_at.elapsed()
                );
                self.stop_drive();
                if let Some(turret) = &mut self.turret {
                    turret.stop();
                }
            }
            self.health = RuntimeHealth::InputStale;
        } else {
            self.health = RuntimeHealth::Ok;
        }
    }

    /// Unconditional halt of everything the runtime owns
    pub fn stop_all(&mut self) {
        self.drive.stop();
        self.drive_stopped = true;
        if let Some(turret) = &mut self.turret {
            turret.stop();
        }
    }

    pub fn drive_status(&self) -> crate::drive::DriveStatus {
        self.drive.status()
    }

    fn mark_input(&mut self) {
        self.input_received_at = Instant::now();
        self.has_input = true;
    }

    fn on_sticks(&mut self, state: GamepadState) {
        self.sticks = state;
        self.mark_input();
        self.apply_sticks();
    }

    fn apply_sticks(&mut self) {
        // HID sign convention: pushing up or left reads negative, so both
        // axes are negated on the way into the drive system
        let forward = if self.sticks.left_y.abs() < STICK_DEADZONE {
            0
        } else {
            -self.sticks.left_y
        };
        let steer = if self.sticks.left_x.abs() < STICK_DEADZONE {
            0
        } else {
            -self.sticks.left_x
        };

        if forward == 0 && steer == 0 {
            self.stop_drive();
        } else {
            self.drive.move_with_steering(forward, steer);
            self.drive_stopped = false;
        }

        if let Some(turret) = &mut self.turret {
            turret.joystick_control(
                self.sticks.right_x / TURRET_STICK_SCALE,
                self.sticks.right_y / TURRET_STICK_SCALE,
            );
        }
    }

    fn on_button_pressed(&mut self, button: Button) {
        self.mark_input();
        match button {
            Button::Left => {
                self.drive.drift_left(BUTTON_SPEED);
                self.drive_stopped = false;
            }
            Button::Right => {
                self.drive.drift_right(BUTTON_SPEED);
                self.drive_stopped = false;
            }
            Button::Up => {
                self.drive.move_forward(BUTTON_SPEED, None);
                self.drive_stopped = false;
            }
            Button::Down => {
                self.drive.move_backward(BUTTON_SPEED, None);
                self.drive_stopped = false;
            }
            Button::Options => {
                info!("shutdown requested");
                self.shutdown = true;
            }
            // Speaker and camera lamp belong to out-of-scope collaborators
            Button::Cross | Button::L1 | Button::R1 => {
                debug!("unhandled button: {:?}", button);
            }
        }
    }

    fn on_button_released(&mut self, button: Button) {
        self.mark_input();
        if matches!(
            button,
            Button::Left | Button::Right | Button::Up | Button::Down
        ) {
            self.stop_drive();
        }
    }

    fn on_block(&mut self, block: BlockDetection) {
        if block.width <= MIN_BLOCK_SIZE && block.height <= MIN_BLOCK_SIZE {
            return;
        }
        if let Some(turret) = &mut self.turret {
            turret.track_offset(block.x_center() - CAMERA_CENTER_X);
        }
    }

    fn stop_drive(&mut self) {
        if !self.drive_stopped {
            self.drive.stop();
            self.drive_stopped = true;
        }
    }
}

pub async fn run(
    mut runtime: Runtime,
    mut events: mpsc::Receiver<InputEvent>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));
    let status_every = (STATUS_PERIOD.as_millis() as u64 * LOOP_HZ / 1000).max(1);
    let mut ticks: u64 = 0;

    info!(
        "runtime started: {} Hz loop, {} ms input watchdog",
        LOOP_HZ,
        INPUT_TIMEOUT.as_millis()
    );

    loop {
        tick.tick().await;

        // Drain everything the producers queued since the last tick
        loop {
            match events.try_recv() {
                Ok(event) => runtime.dispatch(event),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    info!("input channel closed, shutting down");
                    runtime.shutdown = true;
                    break;
                }
            }
        }

        runtime.tick();

        ticks += 1;
        if ticks % status_every == 0 {
            match serde_json::to_string(&runtime.drive_status()) {
                Ok(json) => info!("health: {:?}, drive status: {}", runtime.health(), json),
                Err(e) => warn!("failed to serialize drive status: {}", e),
            }
        }

        if runtime.shutdown_requested() {
            break;
        }
    }

    // Leave every actuator halted on the way out
    runtime.stop_all();
    info!("runtime stopped");
    Ok(())
}
