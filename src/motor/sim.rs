// In-process joint model used when no servos are attached
//
// Each joint slews toward its target at no more than the commanded
// velocity, so measured angles lag targets the way real actuators do.

use crate::actuation::{ActuationPort, Result};
use crate::legs::{JOINT_COUNT, JointId};

#[derive(Debug, Clone, Copy, Default)]
struct SimJoint {
    angle: f32,
    target: f32,
    max_velocity: f32,
}

/// Twelve simulated joints, all starting at 0 rad
#[derive(Debug, Default)]
pub struct SimulatedJoints {
    joints: [SimJoint; JOINT_COUNT],
}

impl SimulatedJoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self, joint: JointId) -> f32 {
        self.joints[joint.index()].target
    }
}

impl ActuationPort for SimulatedJoints {
    fn set_target(&mut self, joint: JointId, angle: f32, max_velocity: f32) -> Result<()> {
        let sim = &mut self.joints[joint.index()];
        sim.target = angle;
        sim.max_velocity = max_velocity.abs();
        Ok(())
    }

    fn read_angle(&mut self, joint: JointId) -> Result<f32> {
        Ok(self.joints[joint.index()].angle)
    }

    fn advance(&mut self, dt: f32) {
        for sim in &mut self.joints {
            let max_step = sim.max_velocity * dt;
            let error = sim.target - sim.angle;
            if error.abs() <= max_step {
                sim.angle = sim.target;
            } else {
                sim.angle += max_step.copysign(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legs::{JointRole, Leg};

    const KNEE: JointId = JointId::new(Leg::LeftFront, JointRole::Knee);

    #[test]
    fn test_starts_at_zero() {
        let mut sim = SimulatedJoints::new();
        for joint in JointId::all() {
            assert_eq!(sim.read_angle(joint).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_velocity_limited() {
        let mut sim = SimulatedJoints::new();
        sim.set_target(KNEE, 1.0, 1.0).unwrap();
        sim.advance(0.25);
        assert!((sim.read_angle(KNEE).unwrap() - 0.25).abs() < 1e-6);
        assert_eq!(sim.target(KNEE), 1.0);
    }

    #[test]
    fn test_settles_on_target() {
        let mut sim = SimulatedJoints::new();
        sim.set_target(KNEE, -0.5, 1.0).unwrap();
        for _ in 0..100 {
            sim.advance(0.02);
        }
        assert_eq!(sim.read_angle(KNEE).unwrap(), -0.5);
    }

    #[test]
    fn test_no_motion_without_time() {
        let mut sim = SimulatedJoints::new();
        sim.set_target(KNEE, 1.0, 1.0).unwrap();
        assert_eq!(sim.read_angle(KNEE).unwrap(), 0.0);
    }
}
