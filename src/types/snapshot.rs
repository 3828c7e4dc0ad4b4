use serde::{Deserialize, Serialize};

use super::{ModeKind, Position};

/// Read-only view of the agent, taken under the controller lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub name: String,
    pub mode: ModeKind,
    pub battery_charge: f64,
    pub position: Position,
    pub goal: Position,
    pub goal_reached_primary: bool,
    pub goal_reached_secondary: bool,
    pub lift_deployed: bool,
    pub tick: u64,
    pub episode_ticks: Option<u32>,
    pub fine_pos_deadline: Option<u32>,
}

impl AgentSnapshot {
    pub fn status_line(&self) -> String {
        format!(
            "name: {} \t state: {} \t charge: {:.3} \t pos_x: {:.3} \t pos_y: {:.3}",
            self.name, self.mode, self.battery_charge, self.position.x, self.position.y
        )
    }
}
