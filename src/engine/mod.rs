pub mod control_loop;

pub use control_loop::{ControlLoop, SharedController};
