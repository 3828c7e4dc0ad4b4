pub mod battery;
pub mod controller;
pub mod movement;
pub mod random;
pub mod state_machine;

pub use battery::{Battery, DrainRates};
pub use controller::{AgentController, AgentParams, GoalOutcome, TickReport};
pub use movement::{Kinematics, MoveOutcome};
pub use random::{FixedJitter, JitterSource, SeededJitter};
pub use state_machine::{ControlEvent, KarisStateMachine};
