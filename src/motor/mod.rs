// Motor control module for the Crop Ally 4-wheel base
//
// Provides:
// - Differential drive mixing (speed/turn -> left/right fractions)
// - Power mapping to 8-bit drive signals, with the minimum power floor
// - Actuation port trait, simulated port and serial bridge to the driver board
// - High-level motor driver API

pub mod bridge;
mod driver;
pub mod kinematics;
pub mod port;
pub mod power;

pub use bridge::{BridgeError, SerialBridge};
pub use driver::MotorDriver;
pub use kinematics::{SideTarget, SideTargets, clamp_unit, mix, mix_sides};
pub use port::{ActuationPort, Direction, SimulatedPort, Wheel};
pub use power::{ActuationPlan, DriveSignal, map, map_wheel};

#[cfg(test)]
pub(crate) use driver::tests::RecordingPort;
