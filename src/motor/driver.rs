// High-level motor driver for the Crop Ally base
//
// Applies actuation plans produced by the drive pipeline to any
// ActuationPort (serial bridge or simulation).

use tracing::{debug, info, warn};

use super::kinematics::mix_sides;
use super::port::{ActuationPort, Wheel};
use super::power::ActuationPlan;

/// High-level motor driver for the 4-wheel differential base
pub struct MotorDriver<P: ActuationPort> {
    port: P,
    last_plan: Option<ActuationPlan>,
}

impl<P: ActuationPort> MotorDriver<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            last_plan: None,
        }
    }

    /// Bring every wheel to a known stopped state
    ///
    /// Call once before sending drive commands.
    pub fn initialize(&mut self) -> Result<(), P::Error> {
        info!("Initializing motors (all stop)");
        self.stop()
    }

    /// Mix, map and apply a speed/turn command
    pub fn drive(&mut self, speed: f32, turn: f32) -> Result<ActuationPlan, P::Error> {
        let sides = mix_sides(speed, turn);
        let plan = ActuationPlan::from_sides(&sides);
        debug!(
            "Speed: {:.2}, Turn: {:.2} | Left: {:.2} ({}), Right: {:.2} ({})",
            speed,
            turn,
            sides.left.fraction,
            plan.signal(Wheel::LeftFront).power,
            sides.right.fraction,
            plan.signal(Wheel::RightFront).power,
        );
        self.apply(&plan)?;
        Ok(plan)
    }

    /// Send a plan to the port: direction first, then power, per wheel
    pub fn apply(&mut self, plan: &ActuationPlan) -> Result<(), P::Error> {
        for (wheel, signal) in plan.iter() {
            self.port.set_direction(wheel, signal.direction)?;
            self.port.set_power(wheel, signal.power)?;
        }
        self.last_plan = Some(*plan);
        Ok(())
    }

    /// Stop all motors immediately
    pub fn stop(&mut self) -> Result<(), P::Error> {
        debug!("Stopping all motors");
        self.apply(&ActuationPlan::all_stop())
    }

    /// Last plan successfully applied to the port
    pub fn last_plan(&self) -> Option<&ActuationPlan> {
        self.last_plan.as_ref()
    }

    pub fn port(&self) -> &P {
        &self.port
    }
}

impl<P: ActuationPort> Drop for MotorDriver<P> {
    fn drop(&mut self) {
        // Never leave the motors running when the driver goes away
        if let Err(e) = self.stop() {
            warn!("Failed to stop motors on drop: {}", e);
        }
    }
}
