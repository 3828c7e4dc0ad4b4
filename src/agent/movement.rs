//! Axis-sequential travel: x is driven into the tolerance band first, then y.
//! Every step moves a full `step`, so the agent never travels diagonally and
//! may stop anywhere inside the band.

use crate::types::Position;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    /// Distance covered per tick.
    pub step: f64,
    pub tolerance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    SteppedX,
    SteppedY,
    Arrived,
}

impl Kinematics {
    pub fn new(step: f64, tolerance: f64) -> Self {
        Self { step, tolerance }
    }

    /// Advances `position` by at most one step toward `goal`.
    pub fn advance(&self, position: &mut Position, goal: Position) -> MoveOutcome {
        if let Some(next) = self.step_axis(position.x, goal.x) {
            position.x = next;
            MoveOutcome::SteppedX
        } else if let Some(next) = self.step_axis(position.y, goal.y) {
            position.y = next;
            MoveOutcome::SteppedY
        } else {
            MoveOutcome::Arrived
        }
    }

    fn step_axis(&self, current: f64, target: f64) -> Option<f64> {
        if current < target - self.tolerance {
            Some(current + self.step)
        } else if current > target + self.tolerance {
            Some(current - self.step)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinematics() -> Kinematics {
        Kinematics::new(0.02, 0.1)
    }

    #[test]
    fn test_x_moves_before_y() {
        let mut position = Position::new(0.0, 0.0);
        let outcome = kinematics().advance(&mut position, Position::new(1.0, 1.0));

        assert_eq!(outcome, MoveOutcome::SteppedX);
        assert_eq!(position, Position::new(0.02, 0.0));
    }

    #[test]
    fn test_y_moves_once_x_in_band() {
        let mut position = Position::new(0.95, 0.0);
        let outcome = kinematics().advance(&mut position, Position::new(1.0, -1.0));

        assert_eq!(outcome, MoveOutcome::SteppedY);
        assert_eq!(position, Position::new(0.95, -0.02));
    }

    #[test]
    fn test_negative_direction() {
        let mut position = Position::new(5.0, 0.0);
        kinematics().advance(&mut position, Position::new(0.0, 0.0));
        assert!((position.x - 4.98).abs() < 1e-12);
    }

    #[test]
    fn test_arrived_leaves_position_untouched() {
        let mut position = Position::new(0.93, 2.05);
        let goal = Position::new(1.0, 2.0);
        let outcome = kinematics().advance(&mut position, goal);

        assert_eq!(outcome, MoveOutcome::Arrived);
        assert_eq!(position, Position::new(0.93, 2.05));
    }

    #[test]
    fn test_walk_is_manhattan() {
        let k = kinematics();
        let goal = Position::new(-0.5, 0.7);
        let mut position = Position::new(0.0, 0.0);
        let mut y_started = false;
        let mut arrived = false;

        for _ in 0..1000 {
            let before = position;
            match k.advance(&mut position, goal) {
                MoveOutcome::SteppedX => {
                    assert!(!y_started, "x moved after y started");
                    assert_eq!(before.y, position.y);
                    assert!(((position.x - before.x).abs() - k.step).abs() < 1e-12);
                }
                MoveOutcome::SteppedY => {
                    y_started = true;
                    assert_eq!(before.x, position.x);
                    assert!(((position.y - before.y).abs() - k.step).abs() < 1e-12);
                }
                MoveOutcome::Arrived => {
                    arrived = true;
                    break;
                }
            }
        }

        assert!(arrived);
        assert!((position.x - goal.x).abs() <= k.tolerance + 1e-9);
        assert!((position.y - goal.y).abs() <= k.tolerance + 1e-9);
    }
}
