// Trot gait engine
//
// Diagonal pairs move in unison: {LF, RH} swing during the first half of the
// cycle while {RF, LH} hold stance, then the pairs swap. Each swing half is a
// lift quarter (hip raised) followed by a plant quarter (hip at default).
// Open loop, in joint space, as fixed offsets from the standing stance.

use crate::config::{STEP_HEIGHT, STEP_LENGTH, TURN_OFFSET};
use crate::legs::Leg;
use crate::messages::{LegPose, TargetPose};

/// Phase values are snapped to this grid so that repeated increments land
/// exactly on the quarter-cycle boundaries.
const PHASE_RESOLUTION: f32 = 1e6;

/// Normalized position within one gait cycle, always in [0, 1)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct GaitPhase(f32);

impl GaitPhase {
    pub fn new(value: f32) -> Self {
        Self(wrap(value))
    }

    pub fn zero() -> Self {
        Self(0.0)
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Step forward by `increment`, wrapping modulo one cycle
    pub fn advance(&mut self, increment: f32) {
        self.0 = wrap(self.0 + increment);
    }

    /// Diagonal pair currently in swing
    pub fn swing_pair(self) -> [Leg; 2] {
        if self.0 < 0.5 {
            [Leg::LeftFront, Leg::RightHind]
        } else {
            [Leg::RightFront, Leg::LeftHind]
        }
    }

    /// Which part of the stride `leg` is in at this phase
    pub fn stride(self, leg: Leg) -> Stride {
        if !self.swing_pair().contains(&leg) {
            return Stride::Stance;
        }
        let lift_until = if self.0 < 0.5 { 0.25 } else { 0.75 };
        if self.0 < lift_until {
            Stride::Swing(SwingStage::Lift)
        } else {
            Stride::Swing(SwingStage::Plant)
        }
    }
}

fn wrap(value: f32) -> f32 {
    let snapped = (value * PHASE_RESOLUTION).round() / PHASE_RESOLUTION;
    let wrapped = snapped.rem_euclid(1.0);
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwingStage {
    /// Foot off the ground, hip raised
    Lift,
    /// Foot coming down, hip back at default
    Plant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stride {
    Swing(SwingStage),
    Stance,
}

/// Joint targets for one leg.
///
/// Swinging legs advance the knee by `forward * STEP_LENGTH`; planted legs
/// push it back by the same amount. The abduction offset depends only on the
/// body side: left legs subtract `turn * TURN_OFFSET`, right legs add it.
pub fn leg_targets(leg: Leg, stride: Stride, forward: f32, turn: f32) -> LegPose {
    let [abduction, hip, knee] = leg.default_angles();
    let abduction = abduction + leg.turn_sign() * turn * TURN_OFFSET;

    match stride {
        Stride::Swing(stage) => {
            let hip = match stage {
                SwingStage::Lift => hip - STEP_HEIGHT,
                SwingStage::Plant => hip,
            };
            LegPose::new(abduction, hip, knee + forward * STEP_LENGTH)
        }
        Stride::Stance => LegPose::new(abduction, hip, knee - forward * STEP_LENGTH),
    }
}

/// Full-body trot pose at `phase` for the commanded intent.
///
/// Pure: the same inputs always give the same pose, and the phase is never
/// advanced here.
pub fn compute_trot_targets(phase: GaitPhase, forward: i8, turn: i8) -> TargetPose {
    let (forward, turn) = (f32::from(forward), f32::from(turn));
    let mut pose = TargetPose::standing();
    for leg in Leg::ALL {
        pose[leg] = leg_targets(leg, phase.stride(leg), forward, turn);
    }
    pose
}
