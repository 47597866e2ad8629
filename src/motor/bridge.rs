// Serial bridge to the L298N motor driver board
//
// The board owns the H-bridge pins and PWM channels; we send it small frames:
// Packet format: [0xAA, 0x55, WHEEL, Length, Instruction, Params..., Checksum]

use serialport::{self, SerialPort};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::debug;

use super::port::{ActuationPort, Direction, Wheel};
use crate::config::BRIDGE_BAUDRATE;

pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Packet header bytes
const HEADER: [u8; 2] = [0xAA, 0x55];

/// Wheel byte for frames addressed to the board itself
const BOARD_ID: u8 = 0xFE;

/// Instruction set
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Instruction {
    Ping = 0x01,
    SetDirection = 0x10, // 1 byte: 0=stop, 1=forward, 2=reverse
    SetPower = 0x11,     // 1 byte: PWM duty 0-255
}

fn direction_code(direction: Direction) -> u8 {
    match direction {
        Direction::Stop => 0,
        Direction::Forward => 1,
        Direction::Reverse => 2,
    }
}

/// Error types for bridge communication
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response from bridge: {reason}")]
    InvalidResponse { reason: String },

    #[error("Checksum mismatch in bridge response")]
    ChecksumMismatch,

    #[error("Timeout waiting for bridge response")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Motor bridge - serial link to the driver board
pub struct SerialBridge<S = Box<dyn SerialPort>> {
    port: S,
}

impl SerialBridge {
    /// Open a new connection to the bridge
    pub fn open(port_name: &str) -> Result<Self> {
        Self::open_with_baudrate(port_name, BRIDGE_BAUDRATE)
    }

    /// Open with custom baudrate
    pub fn open_with_baudrate(port_name: &str, baudrate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        Ok(Self { port })
    }
}

impl<S: Read + Write> SerialBridge<S> {
    /// Wrap an already open byte stream
    pub fn from_stream(port: S) -> Self {
        Self { port }
    }

    /// Checksum over everything after the header
    fn checksum(data: &[u8]) -> u8 {
        let sum: u16 = data.iter().map(|&b| b as u16).sum();
        (!sum & 0xFF) as u8
    }

    fn build_packet(id: u8, instruction: Instruction, params: &[u8]) -> Vec<u8> {
        let length = (params.len() + 2) as u8; // params + instruction + checksum
        let mut packet = Vec::with_capacity(6 + params.len());

        packet.extend_from_slice(&HEADER);
        packet.push(id);
        packet.push(length);
        packet.push(instruction as u8);
        packet.extend_from_slice(params);

        let checksum = Self::checksum(&packet[2..]);
        packet.push(checksum);

        packet
    }

    fn send_packet(&mut self, packet: &[u8]) -> Result<()> {
        self.port.write_all(packet)?;
        self.port.flush()?;
        Ok(())
    }

    /// Read a status frame: [header, id, length, status, checksum]
    fn read_response(&mut self) -> Result<()> {
        let mut frame = [0u8; 6];
        self.port.read_exact(&mut frame).map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                BridgeError::Timeout
            } else {
                BridgeError::Io(e)
            }
        })?;

        if frame[..2] != HEADER {
            return Err(BridgeError::InvalidResponse {
                reason: format!("Invalid header: {:02X?}", &frame[..2]),
            });
        }
        if frame[2] != BOARD_ID {
            return Err(BridgeError::InvalidResponse {
                reason: format!("Unexpected id 0x{:02X}", frame[2]),
            });
        }
        if Self::checksum(&frame[2..5]) != frame[5] {
            return Err(BridgeError::ChecksumMismatch);
        }
        if frame[4] != 0 {
            return Err(BridgeError::InvalidResponse {
                reason: format!("Error status 0x{:02X}", frame[4]),
            });
        }
        Ok(())
    }

    /// Ping the board to check that it's connected
    pub fn ping(&mut self) -> Result<bool> {
        let packet = Self::build_packet(BOARD_ID, Instruction::Ping, &[]);
        self.send_packet(&packet)?;

        match self.read_response() {
            Ok(()) => Ok(true),
            Err(BridgeError::Timeout) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // Drive frames are fire-and-forget, the board doesn't answer them
    fn write_wheel(&mut self, wheel: Wheel, instruction: Instruction, value: u8) -> Result<()> {
        let packet = Self::build_packet(wheel.id(), instruction, &[value]);
        debug!("Bridge {:?} {} = {}", instruction, wheel, value);
        self.send_packet(&packet)
    }
}

impl<S: Read + Write> ActuationPort for SerialBridge<S> {
    type Error = BridgeError;

    fn set_direction(&mut self, wheel: Wheel, direction: Direction) -> Result<()> {
        self.write_wheel(wheel, Instruction::SetDirection, direction_code(direction))
    }

    fn set_power(&mut self, wheel: Wheel, power: u8) -> Result<()> {
        self.write_wheel(wheel, Instruction::SetPower, power)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    /// In-memory stream: reads from a canned response, captures writes
    struct FakeSerial {
        rx: Cursor<Vec<u8>>,
        tx: Vec<u8>,
    }

    impl FakeSerial {
        fn new(response: Vec<u8>) -> Self {
            Self {
                rx: Cursor::new(response),
                tx: Vec::new(),
            }
        }
    }

    impl Read for FakeSerial {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.rx.read(buf)?;
            if n == 0 && !buf.is_empty() {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "no data"));
            }
            Ok(n)
        }
    }

    impl Write for FakeSerial {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.tx.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    type TestBridge = SerialBridge<FakeSerial>;

    fn status_frame(status: u8) -> Vec<u8> {
        let body = [BOARD_ID, 2, status];
        let mut frame = HEADER.to_vec();
        frame.extend_from_slice(&body);
        frame.push(TestBridge::checksum(&body));
        frame
    }

    #[test]
    fn test_checksum() {
        // ~(2 + 3 + 0x11 + 128) = ~150 = 105
        let data = [2u8, 3, 0x11, 128];
        assert_eq!(TestBridge::checksum(&data), 105);
    }

    #[test]
    fn test_build_packet() {
        let packet = TestBridge::build_packet(Wheel::LeftRear.id(), Instruction::SetPower, &[255]);
        assert_eq!(packet.len(), 7);
        assert_eq!(&packet[..2], &HEADER);
        assert_eq!(packet[2], 2); // LeftRear
        assert_eq!(packet[3], 3); // value + instruction + checksum
        assert_eq!(packet[4], 0x11);
        assert_eq!(packet[5], 255);
        assert_eq!(packet[6], TestBridge::checksum(&packet[2..6]));
    }

    #[test]
    fn test_set_direction_frame() {
        let mut bridge = SerialBridge::from_stream(FakeSerial::new(Vec::new()));
        bridge.set_direction(Wheel::RightFront, Direction::Reverse).unwrap();

        let tx = &bridge.port.tx;
        assert_eq!(tx[2], 1); // RightFront
        assert_eq!(tx[4], 0x10);
        assert_eq!(tx[5], 2); // reverse
    }

    #[test]
    fn test_ping_ok() {
        let mut bridge = SerialBridge::from_stream(FakeSerial::new(status_frame(0)));
        assert!(bridge.ping().unwrap());
    }

    #[test]
    fn test_ping_timeout_is_not_an_error() {
        let mut bridge = SerialBridge::from_stream(FakeSerial::new(Vec::new()));
        assert!(!bridge.ping().unwrap());
    }

    #[test]
    fn test_ping_bad_checksum() {
        let mut frame = status_frame(0);
        frame[5] ^= 0xFF;
        let mut bridge = SerialBridge::from_stream(FakeSerial::new(frame));
        assert!(matches!(bridge.ping(), Err(BridgeError::ChecksumMismatch)));
    }

    #[test]
    fn test_ping_error_status() {
        let mut bridge = SerialBridge::from_stream(FakeSerial::new(status_frame(4)));
        assert!(matches!(
            bridge.ping(),
            Err(BridgeError::InvalidResponse { .. })
        ));
    }
}
