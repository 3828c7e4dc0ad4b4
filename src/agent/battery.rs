use serde::{Deserialize, Serialize};

use crate::config::DrainProfile;
use crate::types::ModeKind;

/// Per-tick drain for each mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrainRates {
    pub drive: f64,
    pub wait: f64,
    pub fine_pos: f64,
    pub lift: f64,
}

impl DrainRates {
    pub fn from_profile(profile: &DrainProfile, loop_frequency_hz: u32) -> Self {
        let hz = loop_frequency_hz as f64;
        Self {
            drive: profile.driving / hz,
            wait: profile.waiting / hz,
            fine_pos: profile.fine_positioning / hz,
            lift: profile.lift / hz,
        }
    }

    pub fn for_mode(&self, mode: ModeKind) -> f64 {
        match mode {
            ModeKind::Driving => self.drive,
            ModeKind::Waiting => self.wait,
            ModeKind::FinePositioning => self.fine_pos,
            ModeKind::LiftOperating => self.lift,
        }
    }
}

/// Charge in permille. Nothing recharges it and it is allowed to go negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Battery {
    pub charge: f64,
    pub rates: DrainRates,
}

impl Battery {
    pub fn new(initial_charge: i32, rates: DrainRates) -> Self {
        Self {
            charge: initial_charge as f64,
            rates,
        }
    }

    /// Subtracts one tick of drain for `mode` and returns the amount drained.
    pub fn drain(&mut self, mode: ModeKind) -> f64 {
        let amount = self.rates.for_mode(mode);
        self.charge -= amount;
        amount
    }

    pub fn is_depleted(&self) -> bool {
        self.charge <= 0.0
    }
}
