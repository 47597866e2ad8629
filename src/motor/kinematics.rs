// Differential (skid steer) kinematics for the Crop Ally 4-wheel base
// Converts an arcade-style (speed, turn) command to left/right side fractions.

use super::Direction;

/// Target for one side of the base: signed fraction of full speed
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SideTarget {
    pub fraction: f32,
    pub direction: Direction,
}

impl SideTarget {
    pub fn new(fraction: f32) -> Self {
        Self {
            fraction,
            direction: Direction::from_fraction(fraction),
        }
    }
}

/// Left/right side targets
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SideTargets {
    pub left: SideTarget,
    pub right: SideTarget,
}

impl SideTargets {
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Mix speed and turn into (left, right) fractions in [-1, 1]
///
/// Inputs are clamped, never rejected. When either side would exceed unit
/// magnitude both are scaled down together, which keeps the turn curvature.
pub fn mix(speed: f32, turn: f32) -> (f32, f32) {
    let speed = clamp_unit(speed);
    let turn = clamp_unit(turn);

    let mut left = speed - turn;
    let mut right = speed + turn;

    let max = left.abs().max(right.abs());
    if max > 1.0 {
        left /= max;
        right /= max;
    }

    (left, right)
}

/// Mix and tag each side with its direction
pub fn mix_sides(speed: f32, turn: f32) -> SideTargets {
    let (left, right) = mix(speed, turn);
    SideTargets {
        left: SideTarget::new(left),
        right: SideTarget::new(right),
    }
}

/// Clamp to [-1, 1]; NaN has no meaningful direction, treat it as stop
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_points() {
        assert_eq!(mix(0.0, 0.0), (0.0, 0.0));
        assert_eq!(mix(1.0, 0.0), (1.0, 1.0));
        assert_eq!(mix(0.0, 1.0), (-1.0, 1.0));
        assert_eq!(mix(0.5, 0.5), (0.0, 1.0));
    }

    #[test]
    fn test_rescale_preserves_ratio() {
        // raw (0, 2) -> divided by 2
        assert_eq!(mix(1.0, 1.0), (0.0, 1.0));

        // raw (0.25, 1.75) -> both scaled by 1/1.75
        let (left, right) = mix(1.0, 0.75);
        assert!((right - 1.0).abs() < 1e-6);
        assert!((left - 0.25 / 1.75).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_inputs_are_clamped() {
        assert_eq!(mix(5.0, 0.0), (1.0, 1.0));
        assert_eq!(mix(-3.0, 0.0), (-1.0, -1.0));
        assert_eq!(mix(0.0, -10.0), (1.0, -1.0));
        assert_eq!(mix(f32::NAN, 0.5), (-0.5, 0.5));
        assert_eq!(mix(f32::INFINITY, f32::NEG_INFINITY), (1.0, 0.0));
    }

    #[test]
    fn test_output_never_exceeds_unit() {
        let steps: Vec<f32> = (-20..=20).map(|i| i as f32 / 20.0).collect();
        for &speed in &steps {
            for &turn in &steps {
                let (left, right) = mix(speed, turn);
                assert!(
                    left.abs().max(right.abs()) <= 1.0,
                    "mix({}, {}) = ({}, {})",
                    speed,
                    turn,
                    left,
                    right
                );
            }
        }
    }

    #[test]
    fn test_side_directions() {
        let sides = mix_sides(0.0, 0.5);
        assert_eq!(sides.left.direction, Direction::Reverse);
        assert_eq!(sides.right.direction, Direction::Forward);

        let sides = mix_sides(0.5, 0.5);
        assert_eq!(sides.left.direction, Direction::Stop);
        assert_eq!(sides.right.direction, Direction::Forward);
    }
}
