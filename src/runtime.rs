// Control loop: one tick per host time step
//
// Each tick polls input, lets the motion supervisor pick and command a pose,
// advances the actuators, then publishes the pose and supervisor status.

use std::time::Duration;

use tokio::time::interval;
use tracing::{info, warn};

use crate::actuation::{ActuationError, ActuationPort};
use crate::command::interpret;
use crate::config::{
    Backend, DIAGNOSTIC_PERIOD, RuntimeOptions, TOPIC_CMD_KEY, TOPIC_RT_JOINTS, TOPIC_STATE_MOTION,
};
use crate::input::Keyboard;
use crate::legs::{JointId, JointRole, Leg};
use crate::messages::KeyCommand;
use crate::motor::{LegServoDriver, SimulatedJoints};
use crate::supervisor::{MotionSupervisor, TickAction};

/// Joint whose measured angle is logged once per period
const DIAGNOSTIC_JOINT: JointId = JointId::new(Leg::LeftFront, JointRole::Hip);

pub struct Runtime {
    supervisor: MotionSupervisor,
    port: Box<dyn ActuationPort>,
    time_step: f64,
    ticks: u64,
}

impl Runtime {
    /// Take ownership of the actuators and command the standing stance
    pub fn new(mut port: Box<dyn ActuationPort>, time_step: f64) -> Result<Self, ActuationError> {
        let mut supervisor = MotionSupervisor::new();
        supervisor.start(&mut port)?;
        Ok(Self {
            supervisor,
            port,
            time_step,
            ticks: 0,
        })
    }

    /// Host time in seconds
    pub fn now(&self) -> f64 {
        self.ticks as f64 * self.time_step
    }

    pub fn supervisor(&self) -> &MotionSupervisor {
        &self.supervisor
    }

    /// Run one tick with the latest key pressed during it.
    ///
    /// A failed actuator write ends only this tick; host time still advances
    /// and the next tick recomputes the full pose.
    pub fn step(&mut self, key: Option<char>) -> Result<TickAction, ActuationError> {
        self.ticks += 1;
        let now = self.now();

        let intent = interpret(key);
        let result = self.supervisor.tick(intent, now, &mut self.port);
        self.port.advance(self.time_step as f32);

        if now % DIAGNOSTIC_PERIOD < self.time_step {
            match self.port.read_angle(DIAGNOSTIC_JOINT) {
                Ok(angle) => info!("{} measured: {:.3} rad", DIAGNOSTIC_JOINT, angle),
                Err(e) => warn!("Failed to read {}: {}", DIAGNOSTIC_JOINT, e),
            }
        }
        result
    }

    /// Like [`Runtime::step`], but a failed tick is logged and treated as a hold
    pub fn step_or_hold(&mut self, key: Option<char>) -> TickAction {
        self.step(key).unwrap_or_else(|e| {
            warn!("Tick at {:.2}s failed: {}", self.now(), e);
            TickAction::Hold
        })
    }
}

fn open_backend(options: &RuntimeOptions) -> Result<Box<dyn ActuationPort>, ActuationError> {
    match options.backend {
        Backend::Sim => {
            info!("Using simulated joints");
            Ok(Box::new(SimulatedJoints::new()))
        }
        Backend::Feetech => Ok(Box::new(LegServoDriver::open(&options.port)?)),
    }
}

pub async fn run(options: RuntimeOptions) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut runtime = Runtime::new(open_backend(&options)?, options.time_step())?;

    let session = if options.offline {
        info!("Offline: no zenoh session");
        None
    } else {
        info!("Opening Zenoh session...");
        Some(zenoh::open(zenoh::Config::default()).await?)
    };
    let (subscriber, pub_joints, pub_state) = match &session {
        Some(session) => {
            info!("Subscribed to: {}", TOPIC_CMD_KEY);
            info!("Publishing to: {}, {}", TOPIC_RT_JOINTS, TOPIC_STATE_MOTION);
            (
                Some(session.declare_subscriber(TOPIC_CMD_KEY).await?),
                Some(session.declare_publisher(TOPIC_RT_JOINTS).await?),
                Some(session.declare_publisher(TOPIC_STATE_MOTION).await?),
            )
        }
        None => (None, None, None),
    };

    let mut keyboard = if options.no_keyboard {
        None
    } else {
        Some(Keyboard::open()?)
    };

    let mut tick = interval(Duration::from_secs_f64(options.time_step()));
    info!("Controller started: {}Hz loop", options.hz);
    info!("Use WASD to move, L to lift legs, R to reset position, Q to quit.");

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }

        // 1. Latest local key, then latest remote key
        let mut key = None;
        if let Some(keyboard) = keyboard.as_mut() {
            let polled = keyboard.poll()?;
            if polled.quit {
                info!("Quit requested");
                break;
            }
            key = polled.key;
        }
        if let Some(subscriber) = &subscriber {
            while let Ok(Some(sample)) = subscriber.try_recv() {
                let payload = sample.payload().to_bytes();
                match serde_json::from_slice::<KeyCommand>(&payload) {
                    Ok(cmd) => key = key.or(Some(cmd.key)),
                    Err(e) => warn!("Failed to parse key command: {}", e),
                }
            }
        }

        // 2. Supervisor tick and actuation (write errors are retried next tick)
        let action = runtime.step_or_hold(key);

        // 3. Publish pose when it changed, status every tick
        if let Some(publisher) = &pub_joints {
            if action.commanded_pose() {
                let pose_json = serde_json::to_string(&runtime.supervisor().state().pose)?;
                publisher.put(pose_json).await?;
            }
        }
        if let Some(publisher) = &pub_state {
            let status_json = serde_json::to_string(&runtime.supervisor().status())?;
            publisher.put(status_json).await?;
        }
    }

    info!("Controller stopped");
    Ok(())
}
