// Motion supervisor: per-tick state machine deciding between trotting,
// holding the lift pose, standing, and the idle timeout back to standing.
//
// Priority each tick: reset > locomotion > lift > idle timeout > hold.

use tracing::{debug, info};

use crate::actuation::{ActuationPort, Result};
use crate::command::MovementIntent;
use crate::config::{IDLE_TIMEOUT, LIFT_POSE, MAX_VELOCITY, PHASE_INCREMENT};
use crate::gait::{GaitPhase, compute_trot_targets};
use crate::messages::{LegPose, MotionState, MotionStatus, TargetPose};

/// Everything the control loop mutates, owned by the supervisor
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    pub mode: MotionState,
    pub phase: GaitPhase,
    /// Last pose sent to the actuators
    pub pose: TargetPose,
    /// Set by locomotion commands, cleared by reset and the idle timeout
    pub moving: bool,
    /// Host time of the last locomotion command (seconds)
    pub last_command_time: f64,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            mode: MotionState::Standing,
            phase: GaitPhase::zero(),
            pose: TargetPose::standing(),
            moving: false,
            last_command_time: 0.0,
        }
    }
}

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    /// Reset to the standing stance
    Reset,
    /// Advanced the gait one step
    Step,
    /// Applied the lift pose
    Lift,
    /// Motion timed out, back to standing
    IdleStop,
    /// Nothing commanded
    Hold,
}

impl TickAction {
    /// True when this tick sent a new pose to the actuators
    pub fn commanded_pose(self) -> bool {
        !matches!(self, TickAction::Hold)
    }
}

#[derive(Debug, Default)]
pub struct MotionSupervisor {
    state: ControllerState,
}

impl MotionSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn status(&self) -> MotionStatus {
        MotionStatus {
            state: self.state.mode,
            phase: self.state.phase.value(),
            moving: self.state.moving,
        }
    }

    /// Put the robot in its standing stance before the first tick
    pub fn start<P: ActuationPort + ?Sized>(&mut self, port: &mut P) -> Result<()> {
        self.stand(port)
    }

    /// Run one control tick at host time `now` (seconds).
    ///
    /// State only changes once all twelve targets were accepted; on error the
    /// previous state is kept and the next tick recomputes from it.
    pub fn tick<P: ActuationPort + ?Sized>(
        &mut self,
        intent: MovementIntent,
        now: f64,
        port: &mut P,
    ) -> Result<TickAction> {
        if intent.reset {
            self.stand(port)?;
            return Ok(TickAction::Reset);
        }

        if intent.is_locomotion() {
            let mut phase = self.state.phase;
            phase.advance(PHASE_INCREMENT);
            let pose = compute_trot_targets(phase, intent.forward, intent.turn);
            self.command_pose(port, pose)?;

            if self.state.mode != MotionState::Moving {
                info!(
                    "Trotting (forward={}, turn={})",
                    intent.forward, intent.turn
                );
            }
            self.state.mode = MotionState::Moving;
            self.state.moving = true;
            self.state.phase = phase;
            self.state.last_command_time = now;
            debug!("Gait phase {:.2}", phase.value());
            return Ok(TickAction::Step);
        }

        if intent.lift {
            self.command_pose(port, TargetPose::uniform(LegPose::from_array(LIFT_POSE)))?;
            if self.state.mode != MotionState::Lifted {
                info!("Holding lift pose");
            }
            self.state.mode = MotionState::Lifted;
            return Ok(TickAction::Lift);
        }

        let idle_for = now - self.state.last_command_time;
        if self.state.moving && idle_for > IDLE_TIMEOUT {
            info!("No command for {:.2}s, standing", idle_for);
            self.stand(port)?;
            return Ok(TickAction::IdleStop);
        }

        Ok(TickAction::Hold)
    }

    /// Standing stance, phase cleared, motion stopped
    fn stand<P: ActuationPort + ?Sized>(&mut self, port: &mut P) -> Result<()> {
        self.command_pose(port, TargetPose::standing())?;
        if self.state.mode != MotionState::Standing {
            info!("Standing");
        }
        self.state.mode = MotionState::Standing;
        self.state.phase = GaitPhase::zero();
        self.state.moving = false;
        Ok(())
    }

    /// Send all twelve targets, then remember them as the commanded pose
    fn command_pose<P: ActuationPort + ?Sized>(
        &mut self,
        port: &mut P,
        pose: TargetPose,
    ) -> Result<()> {
        for (joint, angle) in pose.targets() {
            port.set_target(joint, angle, MAX_VELOCITY)?;
        }
        self.state.pose = pose;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuation::RecordingPort;
    use crate::command::interpret;
    use crate::legs::{JointId, JointRole, Leg};

    const DT: f64 = 0.02;

    fn forward() -> MovementIntent {
        interpret(Some('w'))
    }

    fn started() -> (MotionSupervisor, RecordingPort) {
        let mut supervisor = MotionSupervisor::new();
        let mut port = RecordingPort::default();
        supervisor.start(&mut port).unwrap();
        (supervisor, port)
    }

    fn assert_standing(supervisor: &MotionSupervisor, port: &RecordingPort) {
        let state = supervisor.state();
        assert_eq!(state.mode, MotionState::Standing);
        assert_eq!(state.phase.value(), 0.0);
        assert!(!state.moving);
        assert_eq!(state.pose, TargetPose::standing());
        for joint in JointId::all() {
            assert_eq!(port.last_target(joint), Some(joint.default_angle()));
        }
    }

    #[test]
    fn test_start_commands_standing_stance() {
        let (supervisor, port) = started();
        assert_eq!(port.commands.len(), 12);
        assert!(port.commands.iter().all(|&(_, _, v)| v == MAX_VELOCITY));
        assert_standing(&supervisor, &port);
    }

    #[test]
    fn test_hold_sends_nothing() {
        let (mut supervisor, mut port) = started();
        port.commands.clear();
        for i in 0..50 {
            let action = supervisor
                .tick(MovementIntent::neutral(), i as f64 * DT, &mut port)
                .unwrap();
            assert_eq!(action, TickAction::Hold);
        }
        assert!(port.commands.is_empty());
    }

    #[test]
    fn test_step_emits_every_joint_once() {
        let (mut supervisor, mut port) = started();
        port.commands.clear();
        let action = supervisor.tick(forward(), DT, &mut port).unwrap();
        assert_eq!(action, TickAction::Step);
        assert_eq!(port.commands.len(), 12);
        let joints: Vec<JointId> = port.commands.iter().map(|&(j, _, _)| j).collect();
        assert_eq!(joints, JointId::all().collect::<Vec<_>>());
        assert_eq!(supervisor.state().mode, MotionState::Moving);
        assert!(supervisor.state().moving);
        assert!((supervisor.state().phase.value() - PHASE_INCREMENT).abs() < 1e-6);
    }

    #[test]
    fn test_pair_alternates_after_ten_steps() {
        let (mut supervisor, mut port) = started();
        let lf_hip = JointId::new(Leg::LeftFront, JointRole::Hip);
        let rf_hip = JointId::new(Leg::RightFront, JointRole::Hip);

        for i in 1..=9 {
            supervisor.tick(forward(), i as f64 * DT, &mut port).unwrap();
        }
        assert_eq!(supervisor.state().phase.swing_pair(), [Leg::LeftFront, Leg::RightHind]);

        supervisor.tick(forward(), 10.0 * DT, &mut port).unwrap();
        assert_eq!(supervisor.state().phase.value(), 0.5);
        assert_eq!(supervisor.state().phase.swing_pair(), [Leg::RightFront, Leg::LeftHind]);
        // RF now lifting, LF planted
        assert!(port.last_target(rf_hip).unwrap() < -0.6);
        assert_eq!(port.last_target(lf_hip), Some(-0.5));

        for i in 11..=20 {
            supervisor.tick(forward(), i as f64 * DT, &mut port).unwrap();
        }
        assert_eq!(supervisor.state().phase.value(), 0.0);
    }

    #[test]
    fn test_reset_from_any_state() {
        // from mid-stride
        let (mut supervisor, mut port) = started();
        for i in 1..=7 {
            supervisor.tick(forward(), i as f64 * DT, &mut port).unwrap();
        }
        let action = supervisor.tick(interpret(Some('r')), 8.0 * DT, &mut port).unwrap();
        assert_eq!(action, TickAction::Reset);
        assert_standing(&supervisor, &port);

        // from lifted
        supervisor.tick(interpret(Some('l')), 9.0 * DT, &mut port).unwrap();
        assert_eq!(supervisor.state().mode, MotionState::Lifted);
        supervisor.tick(interpret(Some('R')), 10.0 * DT, &mut port).unwrap();
        assert_standing(&supervisor, &port);

        // from standing
        supervisor.tick(interpret(Some('r')), 11.0 * DT, &mut port).unwrap();
        assert_standing(&supervisor, &port);
    }

    #[test]
    fn test_idle_timeout_returns_to_standing() {
        let (mut supervisor, mut port) = started();
        supervisor.tick(forward(), 1.0, &mut port).unwrap();
        supervisor.tick(forward(), 1.02, &mut port).unwrap();

        // inside the grace window the gait pose is held
        let action = supervisor.tick(MovementIntent::neutral(), 1.5, &mut port).unwrap();
        assert_eq!(action, TickAction::Hold);
        assert_eq!(supervisor.state().mode, MotionState::Moving);

        let action = supervisor.tick(MovementIntent::neutral(), 1.53, &mut port).unwrap();
        assert_eq!(action, TickAction::IdleStop);
        assert_standing(&supervisor, &port);

        // timeout fires only once
        let action = supervisor.tick(MovementIntent::neutral(), 3.0, &mut port).unwrap();
        assert_eq!(action, TickAction::Hold);
    }

    #[test]
    fn test_standing_never_times_out() {
        let (mut supervisor, mut port) = started();
        port.commands.clear();
        let action = supervisor.tick(MovementIntent::neutral(), 100.0, &mut port).unwrap();
        assert_eq!(action, TickAction::Hold);
        assert!(port.commands.is_empty());
    }

    #[test]
    fn test_lift_while_moving_keeps_phase_and_timestamp() {
        let (mut supervisor, mut port) = started();
        for i in 1..=3 {
            supervisor.tick(forward(), i as f64 * DT, &mut port).unwrap();
        }
        let phase = supervisor.state().phase;
        let last_command_time = supervisor.state().last_command_time;

        let action = supervisor.tick(interpret(Some('L')), 4.0 * DT, &mut port).unwrap();
        assert_eq!(action, TickAction::Lift);

        let state = supervisor.state();
        assert_eq!(state.mode, MotionState::Lifted);
        assert_eq!(state.phase, phase);
        assert_eq!(state.last_command_time, last_command_time);
        assert!(state.moving);
        for leg in Leg::ALL {
            assert_eq!(state.pose[leg], LegPose::from_array(LIFT_POSE));
        }
        for joint in JointId::all() {
            assert_eq!(port.last_target(joint), Some(state.pose.angle(joint)));
        }
    }

    #[test]
    fn test_lift_while_moving_times_out_to_standing() {
        let (mut supervisor, mut port) = started();
        for i in 1..=3 {
            supervisor.tick(forward(), i as f64 * DT, &mut port).unwrap();
        }
        let last_command_time = supervisor.state().last_command_time;
        supervisor.tick(interpret(Some('l')), 4.0 * DT, &mut port).unwrap();

        // still lifted inside the grace window
        let action = supervisor
            .tick(MovementIntent::neutral(), last_command_time + 0.4, &mut port)
            .unwrap();
        assert_eq!(action, TickAction::Hold);
        assert_eq!(supervisor.state().mode, MotionState::Lifted);

        let action = supervisor
            .tick(MovementIntent::neutral(), last_command_time + IDLE_TIMEOUT + 0.02, &mut port)
            .unwrap();
        assert_eq!(action, TickAction::IdleStop);
        assert_standing(&supervisor, &port);
    }

    #[test]
    fn test_lift_from_standing_holds() {
        let (mut supervisor, mut port) = started();
        supervisor.tick(interpret(Some('l')), 0.1, &mut port).unwrap();
        let action = supervisor.tick(MovementIntent::neutral(), 10.0, &mut port).unwrap();
        assert_eq!(action, TickAction::Hold);
        assert_eq!(supervisor.state().mode, MotionState::Lifted);
    }

    #[test]
    fn test_locomotion_resumes_from_lift() {
        let (mut supervisor, mut port) = started();
        supervisor.tick(interpret(Some('l')), 0.1, &mut port).unwrap();
        supervisor.tick(interpret(Some('a')), 0.12, &mut port).unwrap();
        assert_eq!(supervisor.state().mode, MotionState::Moving);
        assert_eq!(supervisor.state().last_command_time, 0.12);
    }

    #[test]
    fn test_failed_write_keeps_previous_state() {
        let (mut supervisor, mut port) = started();
        supervisor.tick(forward(), DT, &mut port).unwrap();
        let before = supervisor.state().clone();

        // sixth write of the next step is rejected
        port.fail_on_call = Some(port.commands.len() + 5);
        assert!(supervisor.tick(forward(), 2.0 * DT, &mut port).is_err());
        assert_eq!(supervisor.state(), &before);

        // the following tick recomputes and sends the full pose
        port.commands.clear();
        let action = supervisor.tick(forward(), 3.0 * DT, &mut port).unwrap();
        assert_eq!(action, TickAction::Step);
        assert_eq!(port.commands.len(), 12);
        let state = supervisor.state();
        assert!((state.phase.value() - 2.0 * PHASE_INCREMENT).abs() < 1e-6);
        assert_eq!(state.last_command_time, 3.0 * DT);
        for joint in JointId::all() {
            assert_eq!(port.last_target(joint), Some(state.pose.angle(joint)));
        }
    }

    #[test]
    fn test_failed_reset_is_retried() {
        let (mut supervisor, mut port) = started();
        supervisor.tick(forward(), DT, &mut port).unwrap();
        port.fail_on_call = Some(port.commands.len());
        assert!(supervisor.tick(interpret(Some('r')), 2.0 * DT, &mut port).is_err());
        assert_eq!(supervisor.state().mode, MotionState::Moving);

        supervisor.tick(interpret(Some('r')), 3.0 * DT, &mut port).unwrap();
        assert_standing(&supervisor, &port);
    }

    #[test]
    fn test_status_reflects_state() {
        let (mut supervisor, mut port) = started();
        supervisor.tick(forward(), DT, &mut port).unwrap();
        let status = supervisor.status();
        assert_eq!(status.state, MotionState::Moving);
        assert!(status.moving);
        assert_eq!(status.phase, supervisor.state().phase.value());
    }
}
