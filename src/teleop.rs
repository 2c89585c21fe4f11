// Keyboard stand-in for the gamepad producer
//
// WASD drives, J/L swings the turret, arrow keys drift and nudge, R/F
// changes the speed notch, Space centers the sticks, Q or Esc quits.
// Terminals report no key-release events, so held keys are emulated with a
// short timeout: an axis snaps back to center once its key stops repeating,
// and an arrow "release" fires the same way.

use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tokio::sync::mpsc;
use tracing::info;

use crate::messages::{Button, GamepadState, InputEvent};

// Stick deflection per speed notch, in axis units
const SPEEDS: [i32; 3] = [300, 600, 1000];
// Axes snap back to center after this long without a movement key
const INPUT_TIMEOUT_MS: u64 = 150;
// Arrow keys count as released after this long without a repeat
const ARROW_TIMEOUT_MS: u64 = 200;
// Poll cadence, roughly the runtime loop rate
const POLL_MS: u64 = 20;

/// Read keys and publish normalized gamepad events until the user quits.
/// Blocks the calling thread; run it under spawn_blocking.
pub fn run(events: mpsc::Sender<InputEvent>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    enable_raw_mode()?;
    let result = pump_keys(&events);
    disable_raw_mode()?;
    result
}

fn pump_keys(
    events: &mpsc::Sender<InputEvent>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut speed_idx: usize = 0;
    let mut sticks = GamepadState::default();
    let mut last_movement = Instant::now();
    let mut held_arrow: Option<Button> = None;
    let mut last_arrow = Instant::now();

    info!("controls: WASD=drive, J/L=turret, arrows=drift and nudge, R/F=speed, Space=stop, Q=quit");
    print_speed(speed_idx);

    loop {
        if event::poll(Duration::from_millis(POLL_MS))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match code {
                    // Drive stick, HID convention: up and left read negative
                    KeyCode::Char('w') if pressed => {
                        sticks.left_y = -SPEEDS[speed_idx];
                        last_movement = Instant::now();
                    }
                    KeyCode::Char('s') if pressed => {
                        sticks.left_y = SPEEDS[speed_idx];
                        last_movement = Instant::now();
                    }
                    KeyCode::Char('a') if pressed => {
                        sticks.left_x = -SPEEDS[speed_idx];
                        last_movement = Instant::now();
                    }
                    KeyCode::Char('d') if pressed => {
                        sticks.left_x = SPEEDS[speed_idx];
                        last_movement = Instant::now();
                    }

                    // Turret stick
                    KeyCode::Char('j') if pressed => {
                        sticks.right_x = -SPEEDS[speed_idx];
                        last_movement = Instant::now();
                    }
                    KeyCode::Char('l') if pressed => {
                        sticks.right_x = SPEEDS[speed_idx];
                        last_movement = Instant::now();
                    }

                    // Arrow buttons, forwarded as press events with an
                    // emulated release
                    KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down if pressed => {
                        let button = match code {
                            KeyCode::Left => Button::Left,
                            KeyCode::Right => Button::Right,
                            KeyCode::Up => Button::Up,
                            _ => Button::Down,
                        };
                        if held_arrow != Some(button) {
                            if let Some(previous) = held_arrow {
                                send(events, InputEvent::ButtonReleased(previous))?;
                            }
                            send(events, InputEvent::ButtonPressed(button))?;
                            held_arrow = Some(button);
                        }
                        last_arrow = Instant::now();
                    }

                    // Speed notch
                    KeyCode::Char('r') if pressed => {
                        speed_idx = (speed_idx + 1).min(SPEEDS.len() - 1);
                        print_speed(speed_idx);
                    }
                    KeyCode::Char('f') if pressed => {
                        speed_idx = speed_idx.saturating_sub(1);
                        print_speed(speed_idx);
                    }

                    KeyCode::Char(' ') if pressed => {
                        sticks = GamepadState::default();
                    }

                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,

                    _ => {}
                }
            }
        }

        // Emulated releases
        if last_movement.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            sticks = GamepadState::default();
        }
        if let Some(button) = held_arrow {
            if last_arrow.elapsed() > Duration::from_millis(ARROW_TIMEOUT_MS) {
                send(events, InputEvent::ButtonReleased(button))?;
                held_arrow = None;
            }
        }

        // Publish the current snapshot at a fixed rate
        send(events, InputEvent::Sticks(sticks))?;
    }

    // Let the runtime shut down with us
    let _ = events.blocking_send(InputEvent::ButtonPressed(Button::Options));
    Ok(())
}

fn send(
    events: &mpsc::Sender<InputEvent>,
    event: InputEvent,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    events
        .blocking_send(event)
        .map_err(|_| "input channel closed".into())
}

fn print_speed(idx: usize) {
    let label = ["LOW", "MED", "HIGH"][idx];
    info!("speed: {}", label);
}
