//! Truth-or-dare score tallies.
//!
//! Two per-player counters ride along with the shared progression. A
//! completed prompt bumps the acting player's tally; a skipped prompt
//! deducts one but never drives the tally below zero.

use serde::{Deserialize, Serialize};

/// Which half of the couple is acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Player {
    One,
    Two,
}

/// Per-player truth-or-dare tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TodTallies {
    pub player1: u32,
    pub player2: u32,
}

impl TodTallies {
    /// Current tally for one player.
    #[must_use]
    pub const fn tally(&self, player: Player) -> u32 {
        match player {
            Player::One => self.player1,
            Player::Two => self.player2,
        }
    }

    /// A prompt was completed.
    pub fn record_complete(&mut self, player: Player) {
        let slot = self.slot(player);
        *slot = slot.saturating_add(1);
    }

    /// A prompt was skipped. The tally floors at zero.
    pub fn record_skip(&mut self, player: Player) {
        let slot = self.slot(player);
        *slot = slot.saturating_sub(1);
    }

    fn slot(&mut self, player: Player) -> &mut u32 {
        match player {
            Player::One => &mut self.player1,
            Player::Two => &mut self.player2,
        }
    }
}
