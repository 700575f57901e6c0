// Remote teleop: forwards key presses to a running controller over zenoh
//
// W/S forward/backward, A/D turn, L lift, R reset, Q quit.
// One message per key event; holding a key relies on terminal auto-repeat,
// and the controller's idle timeout stops the gait shortly after release.
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::Duration;
use tracing::info;

use quadruped_trot_runtime::config::TOPIC_CMD_KEY;
use quadruped_trot_runtime::input::is_quit;
use quadruped_trot_runtime::messages::KeyCommand;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_KEY).await?;

    info!("Controls: WASD=move, L=lift, R=reset, Q=quit");

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        if !event::poll(Duration::from_millis(20))? {
            continue;
        }
        let Event::Key(key_event) = event::read()? else {
            continue;
        };
        if key_event.kind == KeyEventKind::Release {
            continue;
        }

        if is_quit(&key_event) {
            break;
        }
        if let KeyCode::Char(key) = key_event.code {
            let cmd = serde_json::to_string(&KeyCommand { key })?;
            publisher.put(cmd).await?;
        }
    }

    Ok(())
}
