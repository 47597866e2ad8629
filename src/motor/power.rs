// Power mapping: side fraction -> quantized 8-bit drive signal per wheel

use super::kinematics::{SideTarget, SideTargets};
use super::port::{Direction, Wheel};
use crate::config::{MAX_POWER, MIN_EFFECTIVE_POWER};

/// Quantized actuation value for one wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriveSignal {
    pub direction: Direction,
    pub power: u8,
}

impl DriveSignal {
    pub const STOP: DriveSignal = DriveSignal {
        direction: Direction::Stop,
        power: 0,
    };
}

/// Map a signed fraction to a direction and power level
///
/// Any nonzero fraction gets at least `MIN_EFFECTIVE_POWER`, including ones
/// that would round down to 0.
pub fn map(fraction: f32) -> DriveSignal {
    let direction = Direction::from_fraction(fraction);
    let scaled = (fraction.abs().min(1.0) * MAX_POWER as f32).round() as u8;
    let power = match direction {
        Direction::Stop => 0,
        Direction::Forward | Direction::Reverse => scaled.max(MIN_EFFECTIVE_POWER),
    };

    DriveSignal { direction, power }
}

/// Rear-left reverse boost.
///
/// The rear-left drive on the reference chassis underperforms in reverse, so
/// it always runs at full power when reversing. Applies to that wheel only.
/// A zero fraction maps to Stop, so the boost never fires without a reverse request.
pub fn rear_left_reverse_boost(wheel: Wheel, signal: DriveSignal) -> DriveSignal {
    if wheel == Wheel::LeftRear && signal.direction == Direction::Reverse {
        DriveSignal {
            power: MAX_POWER,
            ..signal
        }
    } else {
        signal
    }
}

/// Map a side fraction for a specific wheel, including per-wheel policy
pub fn map_wheel(wheel: Wheel, fraction: f32) -> DriveSignal {
    rear_left_reverse_boost(wheel, map(fraction))
}

/// One drive signal per wheel, ready for the actuation port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuationPlan {
    signals: [DriveSignal; 4],
}

impl ActuationPlan {
    pub fn from_sides(sides: &SideTargets) -> Self {
        let mut signals = [DriveSignal::STOP; 4];
        for wheel in Wheel::ALL {
            let side: &SideTarget = if wheel.is_left() {
                &sides.left
            } else {
                &sides.right
            };
            signals[wheel.index()] = map_wheel(wheel, side.fraction);
        }
        Self { signals }
    }

    /// Every wheel Stop/0
    pub fn all_stop() -> Self {
        Self {
            signals: [DriveSignal::STOP; 4],
        }
    }

    pub fn signal(&self, wheel: Wheel) -> DriveSignal {
        self.signals[wheel.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Wheel, DriveSignal)> + '_ {
        Wheel::ALL.into_iter().map(|wheel| (wheel, self.signal(wheel)))
    }

    pub fn is_stopped(&self) -> bool {
        self.signals.iter().all(|s| *s == DriveSignal::STOP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::kinematics::mix_sides;

    #[test]
    fn test_zero_is_stop() {
        assert_eq!(map(0.0), DriveSignal::STOP);
    }

    #[test]
    fn test_direction_follows_sign() {
        for f in [0.001, 0.2, 0.5, 1.0] {
            assert_eq!(map(f).direction, Direction::Forward);
            assert_eq!(map(-f).direction, Direction::Reverse);
        }
    }

    #[test]
    fn test_full_scale_and_rounding() {
        assert_eq!(map(1.0).power, 255);
        assert_eq!(map(-1.0).power, 255);
        // 0.5 * 255 = 127.5 rounds up
        assert_eq!(map(0.5).power, 128);
        assert_eq!(map(0.3).power, 77);
    }

    #[test]
    fn test_minimum_power_floor() {
        // Anything that would quantize to 1..=49 is raised to 50
        for f in [0.0025, 0.01, 0.1, 0.19, 49.0 / 255.0] {
            assert_eq!(map(f).power, 50, "fraction {}", f);
            assert_eq!(map(-f).power, 50, "fraction {}", -f);
        }
        assert_eq!(map(50.0 / 255.0).power, 50);
        assert_eq!(map(51.0 / 255.0).power, 51);
    }

    #[test]
    fn test_floor_covers_fractions_that_round_to_zero() {
        let signal = map(0.001);
        assert_eq!(signal.power, 50);
        assert_eq!(signal.direction, Direction::Forward);
        assert_eq!(map(-f32::MIN_POSITIVE).power, 50);
    }

    #[test]
    fn test_rear_left_reverse_boost() {
        for f in [-0.05, -0.3, -0.99, -1.0] {
            assert_eq!(map_wheel(Wheel::LeftRear, f).power, 255);
            assert_eq!(map_wheel(Wheel::LeftRear, f).direction, Direction::Reverse);
        }
        // Forward and stop are untouched
        assert_eq!(map_wheel(Wheel::LeftRear, 0.3).power, 77);
        assert_eq!(map_wheel(Wheel::LeftRear, 0.0), DriveSignal::STOP);
    }

    #[test]
    fn test_boost_only_on_rear_left() {
        for wheel in [Wheel::LeftFront, Wheel::RightFront, Wheel::RightRear] {
            assert_eq!(map_wheel(wheel, -0.3).power, 77);
            assert_eq!(map_wheel(wheel, -0.05).power, 50);
        }
    }

    #[test]
    fn test_plan_full_forward() {
        let plan = ActuationPlan::from_sides(&mix_sides(1.0, 0.0));
        for (_, signal) in plan.iter() {
            assert_eq!(signal.direction, Direction::Forward);
            assert_eq!(signal.power, 255);
        }
        assert!(!plan.is_stopped());
    }

    #[test]
    fn test_plan_spin_in_place() {
        // Half turn: left side reverses, right goes forward
        let plan = ActuationPlan::from_sides(&mix_sides(0.0, 0.3));
        assert_eq!(plan.signal(Wheel::LeftFront).direction, Direction::Reverse);
        assert_eq!(plan.signal(Wheel::LeftFront).power, 77);
        assert_eq!(plan.signal(Wheel::LeftRear).power, 255);
        assert_eq!(plan.signal(Wheel::RightFront).direction, Direction::Forward);
        assert_eq!(plan.signal(Wheel::RightRear).power, 77);
    }

    #[test]
    fn test_all_stop_plan() {
        let plan = ActuationPlan::all_stop();
        assert!(plan.is_stopped());
        assert_eq!(plan, ActuationPlan::from_sides(&SideTargets::zero()));
    }
}
