// Leg servo driver: the twelve joints of the quadruped on one Feetech bus
//
// Maps each joint to a servo ID and converts between joint radians and
// servo steps (4096 per revolution, 2048 at zero).

use std::f32::consts::TAU;

use tracing::{debug, info, warn};

use super::feetech::{self, FeetechBus};
use crate::actuation::{ActuationError, ActuationPort, Result};
use crate::config::SERVO_IDS;
use crate::legs::{JOINT_COUNT, JointId};

const STEPS_PER_REVOLUTION: f32 = 4096.0;
const STEPS_PER_RAD: f32 = STEPS_PER_REVOLUTION / TAU;
const CENTER_STEP: f32 = 2048.0;

/// Radians -> goal position steps, clamped to the servo range
pub fn rad_to_steps(angle: f32) -> u16 {
    (CENTER_STEP + angle * STEPS_PER_RAD)
        .round()
        .clamp(0.0, STEPS_PER_REVOLUTION - 1.0) as u16
}

/// Position steps -> radians
pub fn steps_to_rad(steps: u16) -> f32 {
    (steps as f32 - CENTER_STEP) / STEPS_PER_RAD
}

/// rad/s -> steps/s. Never 0, which the servo reads as "full speed".
pub fn speed_to_steps(max_velocity: f32) -> u16 {
    (max_velocity.abs() * STEPS_PER_RAD)
        .round()
        .clamp(1.0, u16::MAX as f32) as u16
}

pub struct LegServoDriver {
    bus: FeetechBus,
    servo_ids: [u8; JOINT_COUNT],
}

impl LegServoDriver {
    /// Open the bus and bring every leg servo up in position mode.
    ///
    /// Fails if any of the twelve servos does not answer: the gait cannot
    /// run with a joint missing.
    pub fn open(port: &str) -> Result<Self> {
        info!("Opening servo bus on {}", port);
        let bus = FeetechBus::open(port).map_err(|source| ActuationError::Open {
            port: port.to_string(),
            source,
        })?;

        let mut servo_ids = [0u8; JOINT_COUNT];
        for joint in JointId::all() {
            servo_ids[joint.index()] = SERVO_IDS[joint.leg as usize][joint.role as usize];
        }

        let mut driver = Self { bus, servo_ids };
        driver.initialize()?;
        Ok(driver)
    }

    fn initialize(&mut self) -> Result<()> {
        for joint in JointId::all() {
            let id = self.servo_ids[joint.index()];
            if self.bus.ping(id).map_err(|source| ActuationError::Bus { joint, source })? {
                debug!("Servo {} ({}) responding", id, joint);
            } else {
                warn!("Servo {} ({}) not responding to ping", id, joint);
                return Err(ActuationError::DeviceUnavailable { joint });
            }
        }

        for joint in JointId::all() {
            let id = self.servo_ids[joint.index()];
            self.configure(id)
                .map_err(|source| ActuationError::Bus { joint, source })?;
        }

        info!("All {} leg servos in position mode", JOINT_COUNT);
        Ok(())
    }

    fn configure(&mut self, id: u8) -> feetech::Result<()> {
        // operating mode only changes with torque off
        self.bus.set_torque(id, false)?;
        self.bus.set_position_mode(id)?;
        self.bus.set_torque(id, true)
    }

    /// Let the legs go limp
    pub fn disable_torque(&mut self) -> Result<()> {
        info!("Disabling torque on all leg servos");
        for joint in JointId::all() {
            self.bus
                .set_torque(self.servo_ids[joint.index()], false)
                .map_err(|source| ActuationError::Bus { joint, source })?;
        }
        Ok(())
    }
}

impl ActuationPort for LegServoDriver {
    fn set_target(&mut self, joint: JointId, angle: f32, max_velocity: f32) -> Result<()> {
        let id = self.servo_ids[joint.index()];
        self.bus
            .set_goal(id, rad_to_steps(angle), speed_to_steps(max_velocity))
            .map_err(|source| ActuationError::Bus { joint, source })
    }

    fn read_angle(&mut self, joint: JointId) -> Result<f32> {
        let steps = self
            .bus
            .present_position(self.servo_ids[joint.index()])
            .map_err(|source| ActuationError::Bus { joint, source })?;
        Ok(steps_to_rad(steps))
    }
}

impl Drop for LegServoDriver {
    fn drop(&mut self) {
        if let Err(e) = self.disable_torque() {
            warn!("Failed to release leg servos on drop: {}", e);
        }
    }
}
