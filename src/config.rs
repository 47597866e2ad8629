// Timeouts, key expressions, drive limits and CLI options
use std::time::Duration;

use clap::Parser;

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Command freshness window: older commands are stopped unless held
pub const CMD_TIMEOUT: Duration = Duration::from_millis(2000);

// 8-bit PWM range on the motor driver
pub const MAX_POWER: u8 = 255;

// Below this the motors draw current but don't overcome static friction
pub const MIN_EFFECTIVE_POWER: u8 = 50;

// Text sent to every client on connect
pub const WELCOME_TEXT: &str = "Connected to Crop Ally Robot";

// Zenoh key expressions (prefix is prepended at runtime)
pub const DEFAULT_KEY_PREFIX: &str = "cropally";
pub const KEY_CLIENT: &str = "client"; // liveliness tokens, one per client
pub const KEY_CMD: &str = "cmd"; // client -> runtime
pub const KEY_REPLY: &str = "reply"; // runtime -> client

// Serial bridge to the L298N driver board
pub const BRIDGE_BAUDRATE: u32 = 115_200;

/// Command line options for the runtime binary
#[derive(Debug, Clone, Parser)]
#[command(name = "cropally-drive-runtime", about = "Differential drive runtime for the Crop Ally robot")]
pub struct Args {
    /// Serial port of the motor bridge. Runs against a simulated port when omitted.
    #[arg(long)]
    pub motor_port: Option<String>,

    /// Zenoh key prefix shared with the clients
    #[arg(long, default_value = DEFAULT_KEY_PREFIX)]
    pub key_prefix: String,

    /// Control loop frequency in Hz
    #[arg(long, default_value_t = LOOP_HZ)]
    pub loop_hz: u64,

    /// Command freshness window in milliseconds
    #[arg(long, default_value_t = CMD_TIMEOUT.as_millis() as u64)]
    pub cmd_timeout_ms: u64,
}

impl Args {
    pub fn cmd_timeout(&self) -> Duration {
        Duration::from_millis(self.cmd_timeout_ms)
    }

    /// Loop period, never shorter than 1 ms (the interval timer rejects zero)
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis((1000 / self.loop_hz.max(1)).max(1))
    }
}

/// Builds `<prefix>/<kind>/<client>`
pub fn client_key(prefix: &str, kind: &str, client: &str) -> String {
    format!("{}/{}/{}", prefix, kind, client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["cropally-drive-runtime"]);
        assert_eq!(args.motor_port, None);
        assert_eq!(args.key_prefix, "cropally");
        assert_eq!(args.cmd_timeout(), Duration::from_millis(2000));
        assert_eq!(args.tick_period(), Duration::from_millis(20));
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "cropally-drive-runtime",
            "--motor-port",
            "/dev/ttyUSB0",
            "--loop-hz",
            "0",
            "--cmd-timeout-ms",
            "500",
        ]);
        assert_eq!(args.motor_port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(args.cmd_timeout(), Duration::from_millis(500));
        // Zero Hz is clamped instead of dividing by zero
        assert_eq!(args.tick_period(), Duration::from_millis(1000));
    }

    #[test]
    fn test_fast_loop_period_is_never_zero() {
        for hz in ["1000", "2000", "18446744073709551615"] {
            let args = Args::parse_from(["cropally-drive-runtime", "--loop-hz", hz]);
            assert_eq!(args.tick_period(), Duration::from_millis(1), "loop_hz {}", hz);
        }
        let args = Args::parse_from(["cropally-drive-runtime", "--loop-hz", "400"]);
        assert_eq!(args.tick_period(), Duration::from_millis(2));
    }

    #[test]
    fn test_client_key() {
        assert_eq!(client_key("cropally", KEY_CMD, "a1"), "cropally/cmd/a1");
    }
}
