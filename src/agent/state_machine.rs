use serde::{Deserialize, Serialize};

use crate::error::{KarisError, Result};
use crate::types::{Mode, ReachedGoal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlEvent {
    GoalAccepted,
    GoalReached,
    FinePositionRequested { deadline: u32, basis: ReachedGoal },
    FinePositionCompleted,
    LiftRequested,
}

impl ControlEvent {
    fn command(&self) -> &'static str {
        match self {
            ControlEvent::GoalAccepted => "set_goal",
            ControlEvent::GoalReached => "goal_reached",
            ControlEvent::FinePositionRequested { .. } => "request_fine_position",
            ControlEvent::FinePositionCompleted => "fine_position_completed",
            ControlEvent::LiftRequested => "request_lift_operation",
        }
    }
}

pub struct KarisStateMachine;

impl KarisStateMachine {
    /// Applies `event` to `mode` in place and returns the new mode. Entering an
    /// episode always starts its counter at zero.
    pub fn transition(mode: &mut Mode, event: ControlEvent) -> Result<Mode> {
        let new_mode = match (*mode, event) {
            (Mode::Waiting, ControlEvent::GoalAccepted) => Mode::Driving,
            (Mode::Driving, ControlEvent::GoalReached) => Mode::Waiting,

            // Guarded by the reached flags alone, so a new episode may also
            // interrupt a running one.
            (_, ControlEvent::FinePositionRequested { deadline, basis }) => {
                Mode::FinePositioning {
                    ticks: 0,
                    deadline,
                    basis,
                }
            }
            (Mode::FinePositioning { .. }, ControlEvent::FinePositionCompleted) => Mode::Waiting,

            (Mode::Waiting, ControlEvent::LiftRequested) => Mode::LiftOperating { ticks: 0 },

            (current, event) => {
                return Err(KarisError::precondition(
                    event.command(),
                    current.kind(),
                    format!("no transition from {} on {:?}", current.kind(), event),
                ));
            }
        };

        *mode = new_mode;
        Ok(new_mode)
    }
}
