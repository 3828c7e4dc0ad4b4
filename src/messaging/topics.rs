use serde::Serialize;

use crate::types::OutboundMessage;

/// Topic shared by every agent for fleet-wide robot information.
pub const ROBOT_INFORMATION: &str = "/karis_robot_information";

/// Topic names for one agent, all prefixed with `/{name}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topics {
    pub goal: String,
    pub position_command: String,
    pub fine_position_reset: String,
    pub lift_command: String,
    pub navigation_status: String,
    pub battery_status: String,
    pub fine_position_done: String,
    pub lift_status: String,
    pub robot_information: String,
}

impl Topics {
    pub fn for_agent(name: &str) -> Self {
        let topic = |suffix: &str| format!("/{}/{}", name, suffix);
        Self {
            goal: topic("move_base_simple/goal"),
            position_command: topic("position_command"),
            fine_position_reset: topic("fp_reset_command"),
            lift_command: topic("karis_lift_command"),
            navigation_status: topic("karis_navigation_status"),
            battery_status: topic("karis_battery_status"),
            // Misspelled on the wire; existing subscribers listen on this name.
            fine_position_done: topic("status_fp_2_administartion"),
            lift_status: topic("karis_lift_status"),
            robot_information: ROBOT_INFORMATION.to_string(),
        }
    }

    pub fn route(&self, message: &OutboundMessage) -> &str {
        match message {
            OutboundMessage::BatteryStatus { .. } => &self.battery_status,
            OutboundMessage::NavigationStatus { .. } => &self.navigation_status,
            OutboundMessage::FinePositionDone { .. } => &self.fine_position_done,
            OutboundMessage::LiftStatus { .. } => &self.lift_status,
            OutboundMessage::RobotInformation { .. } => &self.robot_information,
        }
    }
}
