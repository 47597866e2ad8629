// Actuation port: the boundary between the drive pipeline and motor outputs

use std::convert::Infallible;
use std::fmt;

use tracing::debug;

/// The four independently driven wheels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wheel {
    LeftFront,
    RightFront,
    LeftRear,
    RightRear,
}

impl Wheel {
    pub const ALL: [Wheel; 4] = [
        Wheel::LeftFront,
        Wheel::RightFront,
        Wheel::LeftRear,
        Wheel::RightRear,
    ];

    pub fn is_left(self) -> bool {
        matches!(self, Wheel::LeftFront | Wheel::LeftRear)
    }

    /// Index into per-wheel arrays, same order as `ALL`
    pub fn index(self) -> usize {
        self as usize
    }

    /// Wheel id used on the serial bridge
    pub fn id(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Wheel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Wheel::LeftFront => "left-front",
            Wheel::RightFront => "right-front",
            Wheel::LeftRear => "left-rear",
            Wheel::RightRear => "right-rear",
        };
        f.write_str(name)
    }
}

/// H-bridge direction for one motor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Forward,
    Reverse,
    #[default]
    Stop,
}

impl Direction {
    pub fn from_fraction(fraction: f32) -> Self {
        if fraction > 0.0 {
            Direction::Forward
        } else if fraction < 0.0 {
            Direction::Reverse
        } else {
            Direction::Stop
        }
    }
}

/// Operations a motor output backend must implement
pub trait ActuationPort {
    type Error: std::error::Error + Send + Sync + 'static;

    fn set_direction(&mut self, wheel: Wheel, direction: Direction) -> Result<(), Self::Error>;

    fn set_power(&mut self, wheel: Wheel, power: u8) -> Result<(), Self::Error>;
}

/// In-memory port for running without hardware
/// Keeps the last applied direction/power per wheel.
#[derive(Debug, Default)]
pub struct SimulatedPort {
    directions: [Direction; 4],
    powers: [u8; 4],
}

impl SimulatedPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn direction(&self, wheel: Wheel) -> Direction {
        self.directions[wheel.index()]
    }

    pub fn power(&self, wheel: Wheel) -> u8 {
        self.powers[wheel.index()]
    }
}

impl ActuationPort for SimulatedPort {
    type Error = Infallible;

    fn set_direction(&mut self, wheel: Wheel, direction: Direction) -> Result<(), Infallible> {
        if self.directions[wheel.index()] != direction {
            debug!("[sim] {} direction {:?}", wheel, direction);
        }
        self.directions[wheel.index()] = direction;
        Ok(())
    }

    fn set_power(&mut self, wheel: Wheel, power: u8) -> Result<(), Infallible> {
        if self.powers[wheel.index()] != power {
            debug!("[sim] {} power {}", wheel, power);
        }
        self.powers[wheel.index()] = power;
        Ok(())
    }
}
