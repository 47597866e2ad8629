// Control loop with command freshness watchdog
// One cooperative loop: drain channel events (each handled to completion),
// then run the freshness check. Nothing here blocks between the two.

use std::time::Instant;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::channel::{ChannelEvent, CommandChannel, Reply};
use crate::config::{Args, WELCOME_TEXT};
use crate::freshness::{DriveRequest, FreshnessMonitor};
use crate::messages::{CommandError, DriveCommand, DriveState};
use crate::motor::{ActuationPort, MotorDriver, SerialBridge, SimulatedPort};

/// Owns the freshness state and the motors; only the loop touches it
pub struct Runtime<P: ActuationPort> {
    monitor: FreshnessMonitor,
    driver: MotorDriver<P>,
}

impl<P: ActuationPort> Runtime<P> {
    pub fn new(driver: MotorDriver<P>, monitor: FreshnessMonitor) -> Self {
        Self { monitor, driver }
    }

    /// Handle one channel event; returns the text to send back, if any
    pub fn handle_event(&mut self, event: ChannelEvent, now: Instant) -> Option<Reply> {
        match event {
            ChannelEvent::Connected(client) => {
                info!("[{}] Connected", client);
                Some(Reply {
                    client,
                    text: WELCOME_TEXT.to_string(),
                })
            }
            ChannelEvent::Disconnected(client) => {
                info!("[{}] Disconnected, stopping motors", client);
                // Freshness state (and hold) is left as is
                if let Err(e) = self.driver.stop() {
                    warn!("Failed to stop motors: {}", e);
                }
                None
            }
            ChannelEvent::Message { client, payload } => {
                let text = self.on_message(&client, &payload, now)?;
                Some(Reply { client, text })
            }
        }
    }

    /// Decode and apply a command; the reply is only produced for accepted commands
    fn on_message(&mut self, client: &str, payload: &[u8], now: Instant) -> Option<String> {
        let cmd = match DriveCommand::decode(payload) {
            Ok(cmd) => cmd,
            Err(CommandError::Incomplete) => {
                debug!("[{}] Ignoring command without speed/turn", client);
                return None;
            }
            Err(e) => {
                warn!("[{}] Failed to parse command: {}", client, e);
                return None;
            }
        };

        let request = self.monitor.accept(&cmd, now);
        self.drive(request);

        match serde_json::to_string(&self.monitor.status()) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Failed to encode status: {}", e);
                None
            }
        }
    }

    /// Periodic freshness check
    pub fn on_tick(&mut self, now: Instant) {
        if let Some(request) = self.monitor.check(now) {
            self.drive(request);
            warn!("Command timeout - motors stopped");
        }
    }

    fn drive(&mut self, request: DriveRequest) {
        if let Err(e) = self.driver.drive(request.speed, request.turn) {
            warn!("Failed to apply drive command: {}", e);
        }
    }

    pub fn state(&self) -> DriveState {
        self.monitor.state()
    }

    pub fn monitor(&self) -> &FreshnessMonitor {
        &self.monitor
    }

    pub fn driver(&self) -> &MotorDriver<P> {
        &self.driver
    }
}

pub async fn run(args: Args) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match &args.motor_port {
        Some(port) => {
            let mut bridge = SerialBridge::open(port)?;
            if !bridge.ping()? {
                warn!("Motor bridge on {} is not answering, continuing anyway", port);
            }
            run_with_port(bridge, &args).await
        }
        None => {
            warn!("No motor port given, running with simulated motors");
            run_with_port(SimulatedPort::new(), &args).await
        }
    }
}

async fn run_with_port<P: ActuationPort>(
    port: P,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut channel = CommandChannel::open(&args.key_prefix).await?;

    let mut driver = MotorDriver::new(port);
    driver.initialize()?;

    let monitor = FreshnessMonitor::new(Instant::now(), args.cmd_timeout());
    let mut runtime = Runtime::new(driver, monitor);
    let mut tick = interval(args.tick_period());

    info!(
        "Runtime started: {}Hz loop, {}ms command timeout",
        args.loop_hz,
        runtime.monitor().timeout().as_millis()
    );

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }

        // 1. Handle every pending event in order
        for event in channel.drain() {
            if let Some(reply) = runtime.handle_event(event, Instant::now()) {
                channel.send(&reply).await;
            }
        }

        // 2. Watchdog
        runtime.on_tick(Instant::now());
    }

    Ok(())
}
