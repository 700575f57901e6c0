// Key -> movement intent mapping
//
// W/S drive forward/backward, A/D turn left/right, L lifts all legs,
// R resets to the standing stance. Case-insensitive; anything else is neutral.

use tracing::{debug, info};

/// What the operator asked for on this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MovementIntent {
    /// -1 backward, 0 none, +1 forward
    pub forward: i8,
    /// -1 right, 0 none, +1 left
    pub turn: i8,
    pub lift: bool,
    pub reset: bool,
}

impl MovementIntent {
    pub fn neutral() -> Self {
        Self::default()
    }

    /// True when the intent asks the gait engine to step
    pub fn is_locomotion(&self) -> bool {
        self.forward != 0 || self.turn != 0
    }
}

/// Interpret the most recent key press of this tick (or none)
pub fn interpret(key: Option<char>) -> MovementIntent {
    let Some(key) = key else {
        return MovementIntent::neutral();
    };

    let mut intent = MovementIntent::neutral();
    match key.to_ascii_uppercase() {
        'W' => {
            intent.forward = 1;
            info!("Moving forward");
        }
        'S' => {
            intent.forward = -1;
            info!("Moving backward");
        }
        'A' => {
            intent.turn = 1;
            info!("Turning left");
        }
        'D' => {
            intent.turn = -1;
            info!("Turning right");
        }
        'L' => {
            intent.lift = true;
            info!("Lifting legs");
        }
        'R' => {
            intent.reset = true;
            info!("Resetting position");
        }
        other => debug!("Ignoring key {:?}", other),
    }
    intent
}
