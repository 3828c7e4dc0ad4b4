use serde::{Deserialize, Serialize};

use super::battery::{Battery, DrainRates};
use super::movement::{Kinematics, MoveOutcome};
use super::random::JitterSource;
use super::state_machine::{ControlEvent, KarisStateMachine};
use crate::config::SimConfig;
use crate::error::{KarisError, Result};
use crate::types::{
    AgentSnapshot, InboundCommand, Mode, ModeKind, NavigationCode, OutboundMessage, Position,
    ReachedGoal,
};

/// The four values a simulated agent is started from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentParams {
    pub name: String,
    pub initial_charge: i32,
    pub start_x: f64,
    pub start_y: f64,
}

impl AgentParams {
    pub fn new(name: impl Into<String>, initial_charge: i32, start_x: f64, start_y: f64) -> Self {
        Self {
            name: name.into(),
            initial_charge,
            start_x,
            start_y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalOutcome {
    Accepted,
    /// The goal equals the current position; nothing changes.
    AlreadyThere,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub mode: ModeKind,
    pub drained: f64,
    pub messages: Vec<OutboundMessage>,
}

#[derive(Debug, Clone, Copy)]
struct EpisodeTiming {
    base_fine_pos_ticks: u32,
    jitter_ticks: i32,
    base_lift_ticks: u32,
}

/// Owns the whole simulated agent. Commands and ticks must be serialized by the
/// caller.
pub struct AgentController {
    name: String,
    mode: Mode,
    battery: Battery,
    position: Position,
    goal: Position,
    goal_reached_primary: bool,
    goal_reached_secondary: bool,
    lift_deployed: bool,
    tick: u64,
    kinematics: Kinematics,
    timing: EpisodeTiming,
    jitter: Box<dyn JitterSource>,
}

impl AgentController {
    pub fn new(
        params: AgentParams,
        config: &SimConfig,
        jitter: Box<dyn JitterSource>,
    ) -> Result<Self> {
        config.validate()?;

        let position = Position::new(params.start_x, params.start_y);
        let mut controller = Self {
            name: params.name,
            mode: Mode::Waiting,
            battery: Battery::new(
                params.initial_charge,
                DrainRates::from_profile(&config.drain, config.loop_frequency_hz),
            ),
            position,
            goal: position,
            goal_reached_primary: false,
            goal_reached_secondary: false,
            lift_deployed: false,
            tick: 0,
            kinematics: Kinematics::new(config.step_per_tick(), config.tolerance),
            timing: EpisodeTiming {
                base_fine_pos_ticks: config.base_fine_pos_ticks(),
                jitter_ticks: config.fine_pos_jitter_ticks,
                base_lift_ticks: config.base_lift_ticks(),
            },
            jitter,
        };

        if config.initial_mode()? == ModeKind::Driving {
            if let Some(goal) = config.initial_goal {
                controller.set_goal(goal.x, goal.y)?;
            }
        }

        Ok(controller)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn goal(&self) -> Position {
        self.goal
    }

    pub fn battery_charge(&self) -> f64 {
        self.battery.charge
    }

    pub fn is_battery_depleted(&self) -> bool {
        self.battery.is_depleted()
    }

    pub fn drain_rates(&self) -> DrainRates {
        self.battery.rates
    }

    pub fn goal_reached_primary(&self) -> bool {
        self.goal_reached_primary
    }

    pub fn goal_reached_secondary(&self) -> bool {
        self.goal_reached_secondary
    }

    pub fn lift_deployed(&self) -> bool {
        self.lift_deployed
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn set_goal(&mut self, x: f64, y: f64) -> Result<GoalOutcome> {
        if self.mode != Mode::Waiting {
            return Err(KarisError::precondition(
                "set_goal",
                self.mode.kind(),
                "new goals are only accepted while waiting",
            ));
        }

        let goal = Position::new(x, y);
        if goal == self.position {
            log::debug!("{}: goal ({}, {}) equals current position", self.name, x, y);
            return Ok(GoalOutcome::AlreadyThere);
        }

        KarisStateMachine::transition(&mut self.mode, ControlEvent::GoalAccepted)?;
        self.goal = goal;
        self.goal_reached_primary = false;
        log::info!("{}: new goal x: {} y: {}", self.name, x, y);
        Ok(GoalOutcome::Accepted)
    }

    /// Starts a fine-positioning episode and returns its deadline in ticks.
    pub fn request_fine_position(&mut self) -> Result<u32> {
        let basis = if self.goal_reached_primary {
            ReachedGoal::Primary
        } else if self.goal_reached_secondary {
            ReachedGoal::Secondary
        } else {
            return Err(KarisError::precondition(
                "request_fine_position",
                self.mode.kind(),
                "no goal has been reached",
            ));
        };

        let jitter = self
            .jitter
            .sample(-self.timing.jitter_ticks, self.timing.jitter_ticks);
        let deadline = (i64::from(self.timing.base_fine_pos_ticks) + i64::from(jitter))
            .clamp(0, i64::from(u32::MAX)) as u32;

        KarisStateMachine::transition(
            &mut self.mode,
            ControlEvent::FinePositionRequested { deadline, basis },
        )?;
        log::info!(
            "{}: fine positioning from {:?} goal, deadline {} ticks",
            self.name,
            basis,
            deadline
        );
        Ok(deadline)
    }

    /// Reserved; fine-position resets currently have no effect.
    pub fn reset_fine_position(&mut self) {}

    pub fn request_lift_operation(&mut self) -> Result<()> {
        if self.mode != Mode::Waiting || !self.goal_reached_secondary {
            return Err(KarisError::precondition(
                "request_lift_operation",
                self.mode.kind(),
                "lift needs a waiting agent at the fine-positioned goal",
            ));
        }

        KarisStateMachine::transition(&mut self.mode, ControlEvent::LiftRequested)?;
        log::info!("{}: lift operation started", self.name);
        Ok(())
    }

    /// Applies a wire command. Rejections are logged and leave the state as it was.
    pub fn handle(&mut self, command: InboundCommand) -> Result<()> {
        let result = match command {
            InboundCommand::SetGoal { x, y } => self.set_goal(x, y).map(|_| ()),
            InboundCommand::PositionCommand { value }
                if value == InboundCommand::FINE_POSITION_REQUEST =>
            {
                self.request_fine_position().map(|_| ())
            }
            InboundCommand::PositionCommand { value } => {
                log::debug!("{}: ignoring position command {}", self.name, value);
                Ok(())
            }
            InboundCommand::FinePositionReset => {
                self.reset_fine_position();
                Ok(())
            }
            InboundCommand::LiftCommand => self.request_lift_operation(),
        };

        if let Err(e) = &result {
            log::warn!("{}: {}", self.name, e);
        }
        result
    }

    /// Advances the simulation by one control-loop period.
    pub fn tick(&mut self) -> TickReport {
        self.tick += 1;
        let mut messages = Vec::new();

        match self.mode {
            Mode::Waiting => {}
            Mode::Driving => self.drive(),
            Mode::FinePositioning { .. } => {
                if self.advance_fine_position() {
                    messages.push(OutboundMessage::fine_position_done());
                }
            }
            Mode::LiftOperating { .. } => {
                if self.advance_lift() {
                    messages.push(OutboundMessage::LiftStatus {
                        deployed: self.lift_deployed,
                    });
                }
            }
        }

        let mode = self.mode.kind();
        let drained = self.battery.drain(mode);

        messages.push(OutboundMessage::battery(self.battery.charge));
        messages.push(OutboundMessage::NavigationStatus {
            code: self.navigation_code(),
        });
        messages.push(OutboundMessage::RobotInformation {
            name: self.name.clone(),
            mode,
            charge: self.battery.charge,
            x: self.position.x,
            y: self.position.y,
        });

        TickReport {
            tick: self.tick,
            mode,
            drained,
            messages,
        }
    }

    pub fn navigation_code(&self) -> NavigationCode {
        match self.mode {
            Mode::Driving => NavigationCode::Driving,
            _ if self.goal_reached_primary => NavigationCode::GoalReached,
            _ => NavigationCode::Idle,
        }
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        let fine_pos_deadline = match self.mode {
            Mode::FinePositioning { deadline, .. } => Some(deadline),
            _ => None,
        };

        AgentSnapshot {
            name: self.name.clone(),
            mode: self.mode.kind(),
            battery_charge: self.battery.charge,
            position: self.position,
            goal: self.goal,
            goal_reached_primary: self.goal_reached_primary,
            goal_reached_secondary: self.goal_reached_secondary,
            lift_deployed: self.lift_deployed,
            tick: self.tick,
            episode_ticks: self.mode.episode_ticks(),
            fine_pos_deadline,
        }
    }

    fn drive(&mut self) {
        if self.kinematics.advance(&mut self.position, self.goal) != MoveOutcome::Arrived {
            return;
        }

        self.goal_reached_primary = true;
        if let Err(e) = KarisStateMachine::transition(&mut self.mode, ControlEvent::GoalReached) {
            log::error!("{}: {}", self.name, e);
            return;
        }
        log::info!(
            "{}: reached goal at ({:.3}, {:.3})",
            self.name,
            self.position.x,
            self.position.y
        );
    }

    /// Returns true when the episode completed on this tick.
    fn advance_fine_position(&mut self) -> bool {
        let Mode::FinePositioning {
            ticks,
            deadline,
            basis,
        } = &mut self.mode
        else {
            return false;
        };

        *ticks = ticks.saturating_add(1);
        if *ticks < *deadline {
            return false;
        }

        // Legacy toggle: the flag that was not the basis becomes the reached one.
        match *basis {
            ReachedGoal::Primary => {
                self.goal_reached_secondary = true;
                self.goal_reached_primary = false;
            }
            ReachedGoal::Secondary => {
                self.goal_reached_primary = true;
                self.goal_reached_secondary = false;
            }
        }

        if let Err(e) =
            KarisStateMachine::transition(&mut self.mode, ControlEvent::FinePositionCompleted)
        {
            log::error!("{}: {}", self.name, e);
            return false;
        }
        log::info!("{}: fine positioning complete", self.name);
        true
    }

    /// Returns true when the lift toggled on this tick. Once past the lift
    /// time the toggle repeats every tick until a command changes the mode.
    fn advance_lift(&mut self) -> bool {
        let Mode::LiftOperating { ticks } = &mut self.mode else {
            return false;
        };

        *ticks = ticks.saturating_add(1);
        if *ticks < self.timing.base_lift_ticks {
            return false;
        }

        self.lift_deployed = !self.lift_deployed;
        log::debug!(
            "{}: lift {}",
            self.name,
            if self.lift_deployed { "extended" } else { "retracted" }
        );
        true
    }
}
