// Actuation port: the narrow interface between the controller and whatever
// moves the joints (simulated model or servo bus).

use crate::legs::JointId;
use crate::motor::FeetechError;

#[derive(Debug, thiserror::Error)]
pub enum ActuationError {
    #[error("No actuator responding for joint {joint}")]
    DeviceUnavailable { joint: JointId },

    #[error("Cannot open servo bus on {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: FeetechError,
    },

    #[error("Servo bus error on joint {joint}: {source}")]
    Bus {
        joint: JointId,
        #[source]
        source: FeetechError,
    },
}

pub type Result<T> = std::result::Result<T, ActuationError>;

pub trait ActuationPort {
    /// Command `joint` toward `angle` (rad) at no more than `max_velocity` (rad/s)
    fn set_target(&mut self, joint: JointId, angle: f32, max_velocity: f32) -> Result<()>;

    /// Last measured angle of `joint` (rad). Diagnostic only.
    fn read_angle(&mut self, joint: JointId) -> Result<f32>;

    /// Let `dt` seconds of host time pass. Hardware runs on its own clock.
    fn advance(&mut self, _dt: f32) {}
}

impl<P: ActuationPort + ?Sized> ActuationPort for Box<P> {
    fn set_target(&mut self, joint: JointId, angle: f32, max_velocity: f32) -> Result<()> {
        (**self).set_target(joint, angle, max_velocity)
    }

    fn read_angle(&mut self, joint: JointId) -> Result<f32> {
        (**self).read_angle(joint)
    }

    fn advance(&mut self, dt: f32) {
        (**self).advance(dt)
    }
}

/// Port that records every command, for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingPort {
    pub commands: Vec<(JointId, f32, f32)>,
    /// Reject the `set_target` call with this index (counted over the
    /// port's lifetime), as a servo timeout would
    pub fail_on_call: Option<usize>,
    calls: usize,
}

#[cfg(test)]
impl RecordingPort {
    pub fn last_target(&self, joint: JointId) -> Option<f32> {
        self.commands
            .iter()
            .rev()
            .find(|(j, _, _)| *j == joint)
            .map(|&(_, angle, _)| angle)
    }
}

#[cfg(test)]
impl ActuationPort for RecordingPort {
    fn set_target(&mut self, joint: JointId, angle: f32, max_velocity: f32) -> Result<()> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_on_call == Some(call) {
            return Err(ActuationError::Bus {
                joint,
                source: FeetechError::Timeout { id: 0 },
            });
        }
        self.commands.push((joint, angle, max_velocity));
        Ok(())
    }

    fn read_angle(&mut self, joint: JointId) -> Result<f32> {
        Ok(self.last_target(joint).unwrap_or(0.0))
    }
}
