// Gait constants, timeouts, topics, servo configuration
use clap::{Parser, ValueEnum};

// Joint speed limit for every pose command (rad/s)
pub const MAX_VELOCITY: f32 = 1.0;

// Trot trajectory offsets (rad)
pub const STEP_HEIGHT: f32 = 0.2; // hip raise during the swing sub-phase
pub const STEP_LENGTH: f32 = 0.3; // knee offset that advances / pushes the foot
pub const TURN_OFFSET: f32 = 0.1; // abduction offset per unit of turn

// Gait phase advance per commanded tick (fraction of a full cycle)
pub const PHASE_INCREMENT: f32 = 0.05;

// Seconds without a locomotion command before the robot settles back to standing
pub const IDLE_TIMEOUT: f64 = 0.5;

// Standing pose shared by all four legs: [abduction, hip, knee] (rad)
pub const DEFAULT_STANCE: [f32; 3] = [0.0, -0.5, 1.0];

// Leg-lift test pose applied to all four legs: [abduction, hip, knee] (rad)
pub const LIFT_POSE: [f32; 3] = [0.0, -0.3, 0.6];

// Measured-angle readout period (seconds of host time)
pub const DIAGNOSTIC_PERIOD: f64 = 1.0;

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Zenoh topics
pub const TOPIC_CMD_KEY: &str = "quadruped/cmd/key"; // remote key presses
pub const TOPIC_RT_JOINTS: &str = "quadruped/rt/joints"; // commanded pose
pub const TOPIC_STATE_MOTION: &str = "quadruped/state/motion"; // supervisor status

// Serial port for the Feetech servo bus
pub const SERVO_PORT: &str = "/dev/ttyUSB0";

// Servo IDs in leg order (LF, RF, LH, RH), each as [abduction, hip, knee]
pub const SERVO_IDS: [[u8; 3]; 4] = [[1, 2, 3], [4, 5, 6], [7, 8, 9], [10, 11, 12]];

/// Where joint targets go
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// In-process joint model, no hardware needed
    Sim,
    /// Feetech STS servos on a serial bus
    Feetech,
}

/// Trot controller for a 12-joint quadruped (WASD move, L lift, R reset, Q quit)
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct RuntimeOptions {
    /// Actuator backend
    #[arg(long, value_enum, default_value_t = Backend::Sim)]
    pub backend: Backend,

    /// Serial port used by the feetech backend
    #[arg(long, default_value = SERVO_PORT)]
    pub port: String,

    /// Control loop rate in Hz
    #[arg(long, default_value_t = LOOP_HZ, value_parser = clap::value_parser!(u64).range(1..=1000))]
    pub hz: u64,

    /// Run without a zenoh session (no remote keys, nothing published)
    #[arg(long)]
    pub offline: bool,

    /// Ignore the local terminal and only take keys from zenoh
    #[arg(long)]
    pub no_keyboard: bool,
}

impl RuntimeOptions {
    /// Duration of one control tick in seconds
    pub fn time_step(&self) -> f64 {
        1.0 / self.hz as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = RuntimeOptions::parse_from(["quadruped-trot-runtime"]);
        assert_eq!(opts.backend, Backend::Sim);
        assert_eq!(opts.hz, LOOP_HZ);
        assert!(!opts.offline);
        assert!((opts.time_step() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_feetech_options() {
        let opts = RuntimeOptions::parse_from([
            "quadruped-trot-runtime",
            "--backend",
            "feetech",
            "--port",
            "/dev/ttyACM1",
            "--offline",
        ]);
        assert_eq!(opts.backend, Backend::Feetech);
        assert_eq!(opts.port, "/dev/ttyACM1");
        assert!(opts.offline);
    }

    #[test]
    fn test_zero_hz_rejected() {
        assert!(RuntimeOptions::try_parse_from(["quadruped-trot-runtime", "--hz", "0"]).is_err());
    }
}
