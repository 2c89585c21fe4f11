// Normalized input events consumed by the runtime
//
// The gamepad daemon, the network remote, and the camera are upstream
// producers; this module is the contract they all speak. Axis scaling and
// debounce happen on the producer side.

use serde::{Deserialize, Serialize};

// Snapshot of both sticks. Axes are normalized to -1000..1000 and follow the
// HID convention: pushing a stick up or left reads negative. The dispatch
// layer negates where the drive systems want the opposite sign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamepadState {
    pub left_x: i32,
    pub left_y: i32,
    pub right_x: i32,
    pub right_y: i32,
}

impl GamepadState {
    /// True when every axis sits at center
    pub fn at_rest(&self) -> bool {
        *self == Self::default()
    }
}

/// Discrete gamepad buttons the runtime reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    Cross,
    Options,
    L1,
    R1,
    Up,
    Down,
    Left,
    Right,
}

/// One detected camera block, bounding box in pixels
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BlockDetection {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BlockDetection {
    /// Horizontal center of the bounding box
    pub fn x_center(&self) -> i32 {
        self.x + self.width / 2
    }
}

/// Event stream from the input producers to the runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEvent {
    Sticks(GamepadState),
    ButtonPressed(Button),
    ButtonReleased(Button),
    BlockDetected(BlockDetection),
}

/// Health status reported by the runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    InputStale,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_x_center() {
        let block = BlockDetection {
            x: 100,
            y: 20,
            width: 40,
            height: 30,
        };
        assert_eq!(block.x_center(), 120);
    }

    #[test]
    fn test_at_rest() {
        assert!(GamepadState::default().at_rest());
        let moved = GamepadState {
            left_y: -300,
            ..Default::default()
        };
        assert!(!moved.at_rest());
    }
}
