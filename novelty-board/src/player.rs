//! Acting-player view and the declarative effects handlers return.
use serde::{Deserialize, Serialize};

use crate::card::DeckKind;

/// The minimal player state handlers read. The game loop owns the authoritative copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    #[serde(default)]
    pub position: usize,
    pub cash: i64,
    #[serde(default)]
    pub in_jail: bool,
    /// Face values from the most recent roll, one per die.
    #[serde(default)]
    pub last_roll: Vec<u32>,
    #[serde(default)]
    pub get_out_of_jail_cards: u8,
}

impl Player {
    #[must_use]
    pub fn new(name: impl Into<String>, cash: i64) -> Self {
        Self {
            name: name.into(),
            position: 0,
            cash,
            in_jail: false,
            last_roll: Vec::new(),
            get_out_of_jail_cards: 0,
        }
    }

    /// Builder-style position override, mostly for fixtures.
    #[must_use]
    pub fn at(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_roll(mut self, roll: Vec<u32>) -> Self {
        self.last_roll = roll;
        self
    }

    #[must_use]
    pub fn roll_total(&self) -> u32 {
        self.last_roll.iter().sum()
    }
}

/// What a handler asks the game loop to do. Handlers never mutate state directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    #[default]
    None,
    MoveTo {
        position: usize,
        collect_go: bool,
    },
    MoveBy { offset: i64 },
    PayBank(i64),
    ReceiveFromBank(i64),
    PayEachPlayer(i64),
    CollectFromEachPlayer(i64),
    GoToJail,
    /// Spend one held get-out-of-jail card.
    UseJailCard,
    LeaveJail,
    DrawCard(DeckKind),
    Auction { location: String },
    SkipTurns(u8),
    Sequence(Vec<Effect>),
}

impl Effect {
    /// Signed cash delta against the bank, ignoring player-to-player transfers.
    #[must_use]
    pub fn bank_delta(&self) -> i64 {
        match self {
            Self::PayBank(amount) => amount.saturating_neg(),
            Self::ReceiveFromBank(amount) => *amount,
            Self::Sequence(steps) => steps
                .iter()
                .map(Self::bank_delta)
                .fold(0, i64::saturating_add),
            _ => 0,
        }
    }

    /// Signed cash transfer from the bank: positive receives, negative pays.
    #[must_use]
    pub const fn bank_transfer(amount: i64) -> Self {
        if amount >= 0 {
            Self::ReceiveFromBank(amount)
        } else {
            Self::PayBank(amount.saturating_neg())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_delta_sums_sequences() {
        let effect = Effect::Sequence(vec![
            Effect::PayBank(50),
            Effect::LeaveJail,
            Effect::ReceiveFromBank(200),
        ]);
        assert_eq!(effect.bank_delta(), 150);
        assert_eq!(Effect::bank_transfer(-15), Effect::PayBank(15));
        assert_eq!(Effect::bank_transfer(15), Effect::ReceiveFromBank(15));
    }

    #[test]
    fn roll_total_sums_faces() {
        let player = Player::new("p1", 1500).with_roll(vec![3, 4]);
        assert_eq!(player.roll_total(), 7);
    }
}
