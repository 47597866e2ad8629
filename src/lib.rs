// Crop Ally drive runtime
//
// Remote-controlled differential drive for a 4-wheel robot:
// commands arrive over Zenoh, are mixed into left/right targets, quantized to
// 8-bit drive signals and applied to the motor bridge. A freshness watchdog
// stops the robot when commands stop arriving.

pub mod channel;
pub mod config;
pub mod freshness;
pub mod messages;
pub mod motor;
pub mod runtime;
