// Joint actuation backends
//
// Provides:
// - Feetech STS serial protocol (position mode)
// - Twelve-servo leg driver over that bus
// - Simulated joints for running without hardware

mod driver;
pub mod feetech;
mod sim;

pub use driver::{LegServoDriver, rad_to_steps, speed_to_steps, steps_to_rad};
pub use feetech::{FeetechBus, FeetechError};
pub use sim::SimulatedJoints;
