// Message types exchanged with teleop and monitoring over zenoh

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_STANCE;
use crate::legs::{JointId, JointRole, Leg};

// Key press from a remote teleop -> runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCommand {
    pub key: char,
}

/// Target angles (rad) for the three joints of one leg
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegPose {
    pub abduction: f32,
    pub hip: f32,
    pub knee: f32,
}

impl LegPose {
    pub const fn new(abduction: f32, hip: f32, knee: f32) -> Self {
        Self {
            abduction,
            hip,
            knee,
        }
    }

    pub fn from_array([abduction, hip, knee]: [f32; 3]) -> Self {
        Self::new(abduction, hip, knee)
    }

    pub fn angle(&self, role: JointRole) -> f32 {
        match role {
            JointRole::Abduction => self.abduction,
            JointRole::Hip => self.hip,
            JointRole::Knee => self.knee,
        }
    }
}

impl Default for LegPose {
    fn default() -> Self {
        Self::from_array(DEFAULT_STANCE)
    }
}

// Last commanded pose, runtime -> monitoring. Defaults to the standing stance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TargetPose {
    pub left_front: LegPose,
    pub right_front: LegPose,
    pub left_hind: LegPose,
    pub right_hind: LegPose,
}

impl TargetPose {
    /// Every leg at its default standing angles
    pub fn standing() -> Self {
        Self::default()
    }

    /// Same leg pose on all four legs
    pub fn uniform(leg: LegPose) -> Self {
        Self {
            left_front: leg,
            right_front: leg,
            left_hind: leg,
            right_hind: leg,
        }
    }

    pub fn angle(&self, joint: JointId) -> f32 {
        self[joint.leg].angle(joint.role)
    }

    /// All twelve (joint, angle) targets, leg-major
    pub fn targets(&self) -> impl Iterator<Item = (JointId, f32)> + '_ {
        JointId::all().map(move |joint| (joint, self.angle(joint)))
    }
}

impl Index<Leg> for TargetPose {
    type Output = LegPose;

    fn index(&self, leg: Leg) -> &Self::Output {
        match leg {
            Leg::LeftFront => &self.left_front,
            Leg::RightFront => &self.right_front,
            Leg::LeftHind => &self.left_hind,
            Leg::RightHind => &self.right_hind,
        }
    }
}

impl IndexMut<Leg> for TargetPose {
    fn index_mut(&mut self, leg: Leg) -> &mut Self::Output {
        match leg {
            Leg::LeftFront => &mut self.left_front,
            Leg::RightFront => &mut self.right_front,
            Leg::LeftHind => &mut self.left_hind,
            Leg::RightHind => &mut self.right_hind,
        }
    }
}

/// Supervisor state published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MotionState {
    #[default]
    Standing,
    Moving,
    Lifted,
}

// Per-tick status, runtime -> monitoring
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MotionStatus {
    pub state: MotionState,
    pub phase: f32,
    pub moving: bool,
}
