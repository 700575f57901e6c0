// Leg model: four legs, three joints each, and the standing configuration
//
// Joints are addressed by JointId (a Leg x JointRole pair); its index()
// selects a slot in fixed 12-entry tables instead of looking devices up by name.

use std::fmt::{self, Display};

use crate::config::DEFAULT_STANCE;

/// Four legs × three joints
pub const JOINT_COUNT: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Leg {
    LeftFront = 0,
    RightFront = 1,
    LeftHind = 2,
    RightHind = 3,
}

impl Leg {
    pub const ALL: [Leg; 4] = [Leg::LeftFront, Leg::RightFront, Leg::LeftHind, Leg::RightHind];

    /// Device-name prefix ("LF", "RF", "LH", "RH")
    pub fn prefix(self) -> &'static str {
        match self {
            Leg::LeftFront => "LF",
            Leg::RightFront => "RF",
            Leg::LeftHind => "LH",
            Leg::RightHind => "RH",
        }
    }

    pub fn is_left(self) -> bool {
        matches!(self, Leg::LeftFront | Leg::LeftHind)
    }

    /// Sign applied to turn offsets on this leg's abduction joint: left legs
    /// subtract, right legs add.
    pub fn turn_sign(self) -> f32 {
        if self.is_left() { -1.0 } else { 1.0 }
    }

    /// The three joints of this leg in [abduction, hip, knee] order
    pub fn joints(self) -> [JointId; 3] {
        JointRole::ALL.map(|role| JointId::new(self, role))
    }

    /// Default standing angles in [abduction, hip, knee] order
    pub fn default_angles(self) -> [f32; 3] {
        DEFAULT_STANCE
    }
}

impl Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leg::LeftFront => f.write_str("left front"),
            Leg::RightFront => f.write_str("right front"),
            Leg::LeftHind => f.write_str("left hind"),
            Leg::RightHind => f.write_str("right hind"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointRole {
    /// Hip abduction/adduction (HAA)
    Abduction = 0,
    /// Hip flexion/extension (HFE)
    Hip = 1,
    /// Knee flexion/extension (KFE)
    Knee = 2,
}

impl JointRole {
    pub const ALL: [JointRole; 3] = [JointRole::Abduction, JointRole::Hip, JointRole::Knee];

    pub fn suffix(self) -> &'static str {
        match self {
            JointRole::Abduction => "HAA",
            JointRole::Hip => "HFE",
            JointRole::Knee => "KFE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JointId {
    pub leg: Leg,
    pub role: JointRole,
}

impl JointId {
    pub const fn new(leg: Leg, role: JointRole) -> Self {
        Self { leg, role }
    }

    /// All twelve joints, leg-major (LF_HAA, LF_HFE, LF_KFE, RF_HAA, ...)
    pub fn all() -> impl Iterator<Item = JointId> {
        Leg::ALL.into_iter().flat_map(Leg::joints)
    }

    /// Position in the leg-major 12-entry table
    pub fn index(self) -> usize {
        self.leg as usize * 3 + self.role as usize
    }

    pub fn default_angle(self) -> f32 {
        self.leg.default_angles()[self.role as usize]
    }

    /// Parse a device name such as "LF_HFE"
    pub fn from_name(name: &str) -> Option<Self> {
        let (prefix, suffix) = name.split_once('_')?;
        let leg = Leg::ALL.into_iter().find(|leg| leg.prefix() == prefix)?;
        let role = JointRole::ALL.into_iter().find(|role| role.suffix() == suffix)?;
        Some(Self::new(leg, role))
    }
}

impl Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.leg.prefix(), self.role.suffix())
    }
}
