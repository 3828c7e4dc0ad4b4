use serde::{Deserialize, Serialize};

use super::ModeKind;

/// Commands delivered to the agent by the messaging layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundCommand {
    SetGoal { x: f64, y: f64 },
    PositionCommand { value: i8 },
    FinePositionReset,
    LiftCommand,
}

impl InboundCommand {
    /// Value of a `PositionCommand` that asks for fine positioning.
    pub const FINE_POSITION_REQUEST: i8 = 1;

    pub fn name(&self) -> &'static str {
        match self {
            InboundCommand::SetGoal { .. } => "set_goal",
            InboundCommand::PositionCommand { .. } => "position_command",
            InboundCommand::FinePositionReset => "fine_position_reset",
            InboundCommand::LiftCommand => "lift_command",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum NavigationCode {
    Idle = 0,
    Driving = 2,
    GoalReached = 3,
}

impl From<NavigationCode> for u8 {
    fn from(code: NavigationCode) -> Self {
        code as u8
    }
}

impl TryFrom<u8> for NavigationCode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(NavigationCode::Idle),
            2 => Ok(NavigationCode::Driving),
            3 => Ok(NavigationCode::GoalReached),
            other => Err(format!("unknown navigation status code {}", other)),
        }
    }
}

/// Messages the agent publishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    BatteryStatus {
        charge: i16,
    },
    NavigationStatus {
        code: NavigationCode,
    },
    FinePositionDone {
        value: i8,
    },
    LiftStatus {
        deployed: bool,
    },
    RobotInformation {
        name: String,
        mode: ModeKind,
        charge: f64,
        x: f64,
        y: f64,
    },
}

impl OutboundMessage {
    /// Battery charge as published: truncated toward zero and saturated to i16.
    pub fn battery(charge: f64) -> Self {
        OutboundMessage::BatteryStatus {
            charge: charge as i16,
        }
    }

    pub fn fine_position_done() -> Self {
        OutboundMessage::FinePositionDone { value: 1 }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::BatteryStatus { .. } => "battery_status",
            OutboundMessage::NavigationStatus { .. } => "navigation_status",
            OutboundMessage::FinePositionDone { .. } => "fine_position_done",
            OutboundMessage::LiftStatus { .. } => "lift_status",
            OutboundMessage::RobotInformation { .. } => "robot_information",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inbound_set_goal_from_json() {
        let cmd: InboundCommand =
            serde_json::from_value(json!({"type": "set_goal", "x": 1.5, "y": -2.0})).unwrap();
        assert_eq!(cmd, InboundCommand::SetGoal { x: 1.5, y: -2.0 });
        assert_eq!(cmd.name(), "set_goal");
    }

    #[test]
    fn test_inbound_unit_commands_from_json() {
        let reset: InboundCommand =
            serde_json::from_value(json!({"type": "fine_position_reset"})).unwrap();
        let lift: InboundCommand = serde_json::from_value(json!({"type": "lift_command"})).unwrap();

        assert_eq!(reset, InboundCommand::FinePositionReset);
        assert_eq!(lift, InboundCommand::LiftCommand);
    }

    #[test]
    fn test_navigation_code_serializes_as_number() {
        let msg = OutboundMessage::NavigationStatus {
            code: NavigationCode::GoalReached,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["code"], 3);
    }

    #[test]
    fn test_unknown_navigation_code_rejected() {
        assert!(NavigationCode::try_from(1).is_err());
    }

    #[test]
    fn test_battery_charge_truncates_and_saturates() {
        assert_eq!(
            OutboundMessage::battery(999.99),
            OutboundMessage::BatteryStatus { charge: 999 }
        );
        assert_eq!(
            OutboundMessage::battery(-0.5),
            OutboundMessage::BatteryStatus { charge: 0 }
        );
        assert_eq!(
            OutboundMessage::battery(1.0e9),
            OutboundMessage::BatteryStatus { charge: i16::MAX }
        );
    }
}
