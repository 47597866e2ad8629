// Keyboard teleop: W/S drive, A/D turn, H toggle hold, Space stop, Q quit
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::{Duration, Instant};
use tracing::info;

use cropally_drive_runtime::config::{DEFAULT_KEY_PREFIX, KEY_CLIENT, KEY_CMD, KEY_REPLY, client_key};
use cropally_drive_runtime::messages::DriveCommand;

const SPEED_STEP: f32 = 0.25;
const TURN_STEP: f32 = 0.25;
const SEND_PERIOD: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let prefix = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string());
    let client = format!("teleop-{}", std::process::id());

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    // The runtime sees us as connected while this token is alive
    let _token = session
        .liveliness()
        .declare_token(client_key(&prefix, KEY_CLIENT, &client))
        .await?;
    let replies = session
        .declare_subscriber(client_key(&prefix, KEY_REPLY, &client))
        .await?;
    let cmd_key = client_key(&prefix, KEY_CMD, &client);

    info!("Connected as {}", client);
    info!("Controls: W/S=drive, A/D=turn, H=hold, Space=stop, Q=quit");

    enable_raw_mode()?;
    let result = run_teleop(&session, &cmd_key, &replies).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    session: &zenoh::Session,
    cmd_key: &str,
    replies: &zenoh::pubsub::Subscriber<zenoh::handlers::FifoChannelHandler<zenoh::sample::Sample>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut speed: f32 = 0.0;
    let mut turn: f32 = 0.0;
    let mut hold = false;
    let mut last_sent: Option<Instant> = None;

    loop {
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match code {
                    KeyCode::Char('w') if pressed => speed = (speed + SPEED_STEP).min(1.0),
                    KeyCode::Char('s') if pressed => speed = (speed - SPEED_STEP).max(-1.0),
                    KeyCode::Char('d') if pressed => turn = (turn + TURN_STEP).min(1.0),
                    KeyCode::Char('a') if pressed => turn = (turn - TURN_STEP).max(-1.0),
                    KeyCode::Char('h') if pressed => {
                        hold = !hold;
                        print!("Hold: {}\r\n", if hold { "ON" } else { "OFF" });
                    }
                    KeyCode::Char(' ') if pressed => {
                        speed = 0.0;
                        turn = 0.0;
                    }
                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,
                    _ => {}
                }
            }
        }

        if last_sent.is_none_or(|t| t.elapsed() >= SEND_PERIOD) {
            let cmd = DriveCommand::new(speed, turn).with_hold(hold);
            session.put(cmd_key, serde_json::to_string(&cmd)?).await?;
            last_sent = Some(Instant::now());
        }

        while let Ok(Some(sample)) = replies.try_recv() {
            let text = String::from_utf8_lossy(&sample.payload().to_bytes()).into_owned();
            print!("<- {}\r\n", text);
        }
    }

    // Leave the robot stopped
    let stop = DriveCommand::new(0.0, 0.0).with_hold(false);
    session.put(cmd_key, serde_json::to_string(&stop)?).await?;

    Ok(())
}
