//! Declarative board description consumed at construction time.
//!
//! Unknown fields are ignored throughout so descriptions can carry annotations
//! for other tools. Structural checks happen in [`crate::board::Board::from_schema`],
//! not here.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dice::{DieDistribution, DieType};
use crate::error::{BoardError, BoardResult};
use crate::registry::HookId;

const DEFAULT_CLASSIC_BOARD: &str = include_str!("../assets/data/classic_board.json");

/// Complete board description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSchema {
    pub locations: LocationsSchema,
    /// Cell index of the location literally named "Go".
    #[serde(default)]
    pub go_position: usize,
    #[serde(flatten)]
    pub knobs: BoardKnobs,
    pub die: DiceSchema,
    pub cards: CardsSchema,
    #[serde(default)]
    pub players: PlayersSchema,
    #[serde(default = "BoardSchema::default_rent_strategy")]
    pub rent_strategy: String,
    /// Hook handler overrides applied on top of the defaults.
    #[serde(default)]
    pub hooks: BTreeMap<HookId, String>,
}

impl BoardSchema {
    fn default_rent_strategy() -> String {
        String::from("standard_rent")
    }

    /// Load a board description from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a board description.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The bundled 40-cell classic board.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled asset fails to parse.
    pub fn classic() -> Result<Self, serde_json::Error> {
        Self::from_json(DEFAULT_CLASSIC_BOARD)
    }
}

/// Board-level scalar knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardKnobs {
    #[serde(default = "BoardKnobs::default_go_increment")]
    pub go_increment: i64,
    /// Fraction of the mortgage charged as interest when unmortgaging.
    #[serde(default = "BoardKnobs::default_mortgage_percentage")]
    pub mortgage_percentage: f64,
    #[serde(default = "BoardKnobs::default_jail_fine")]
    pub jail_fine: i64,
    #[serde(default = "BoardKnobs::default_starting_cash")]
    pub starting_cash: i64,
    #[serde(default = "BoardKnobs::default_house_limit_before_hotel")]
    pub house_limit_before_hotel: u8,
    #[serde(default = "BoardKnobs::default_total_houses")]
    pub total_houses: u32,
    #[serde(default = "BoardKnobs::default_total_hotels")]
    pub total_hotels: u32,
    /// Fraction of the price the bank pays when a property is sold back.
    #[serde(default = "BoardKnobs::default_property_sell_percentage")]
    pub property_sell_percentage: f64,
}

impl BoardKnobs {
    const fn default_go_increment() -> i64 {
        200
    }

    const fn default_mortgage_percentage() -> f64 {
        0.1
    }

    const fn default_jail_fine() -> i64 {
        50
    }

    const fn default_starting_cash() -> i64 {
        1500
    }

    const fn default_house_limit_before_hotel() -> u8 {
        4
    }

    const fn default_total_houses() -> u32 {
        32
    }

    const fn default_total_hotels() -> u32 {
        12
    }

    const fn default_property_sell_percentage() -> f64 {
        0.5
    }
}

impl Default for BoardKnobs {
    fn default() -> Self {
        Self {
            go_increment: Self::default_go_increment(),
            mortgage_percentage: Self::default_mortgage_percentage(),
            jail_fine: Self::default_jail_fine(),
            starting_cash: Self::default_starting_cash(),
            house_limit_before_hotel: Self::default_house_limit_before_hotel(),
            total_houses: Self::default_total_houses(),
            total_hotels: Self::default_total_hotels(),
            property_sell_percentage: Self::default_property_sell_percentage(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationsSchema {
    /// Declared number of board cells.
    pub location_count: usize,
    /// Optional explicit ordering of distinct location names; checked against positions.
    #[serde(default)]
    pub location_sequence: Vec<String>,
    pub location_states: Vec<LocationSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSpec {
    pub name: String,
    pub start_position: usize,
    pub end_position: usize,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(flatten)]
    pub class: LocationClassSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "loc_class", rename_all = "snake_case")]
pub enum LocationClassSpec {
    Action {
        perform_action: String,
    },
    DoNothing,
    RealEstate {
        price: i64,
        price_per_house: i64,
        rent: i64,
        rent_1_house: i64,
        rent_2_houses: i64,
        rent_3_houses: i64,
        rent_4_houses: i64,
        rent_hotel: i64,
        mortgage: i64,
        #[serde(default)]
        num_houses: u8,
        #[serde(default)]
        num_hotels: u8,
        #[serde(default)]
        owned_by: Option<String>,
    },
    Tax {
        amount_due: i64,
    },
    Railroad {
        price: i64,
        mortgage: i64,
        #[serde(default = "default_railroad_dues")]
        railroad_dues: BTreeMap<String, i64>,
        #[serde(default)]
        owned_by: Option<String>,
    },
    Utility {
        price: i64,
        mortgage: i64,
        #[serde(default = "default_die_multiples")]
        die_multiples: BTreeMap<String, i64>,
        #[serde(default)]
        owned_by: Option<String>,
    },
}

// Keys stay strings here: these maps sit behind internally tagged enums, which
// buffer content and lose serde_json's integer-key coercion.
fn default_railroad_dues() -> BTreeMap<String, i64> {
    [("1", 25), ("2", 50), ("3", 100), ("4", 200)]
        .into_iter()
        .map(|(owned, dues)| (owned.to_string(), dues))
        .collect()
}

fn default_die_multiples() -> BTreeMap<String, i64> {
    [("1", 4), ("2", 10)]
        .into_iter()
        .map(|(owned, multiple)| (owned.to_string(), multiple))
        .collect()
}

/// Convert an owned-count keyed table into numeric keys.
///
/// # Errors
///
/// Returns [`BoardError::Configuration`] when a key is not a small positive integer.
pub fn owned_count_table(
    location: &str,
    table: &BTreeMap<String, i64>,
) -> BoardResult<BTreeMap<u8, i64>> {
    table
        .iter()
        .map(|(key, value)| {
            key.trim()
                .parse::<u8>()
                .ok()
                .filter(|owned| *owned > 0)
                .map(|owned| (owned, *value))
                .ok_or_else(|| {
                    BoardError::configuration(format!(
                        "`{location}` has invalid owned-count key `{key}`"
                    ))
                })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceSchema {
    pub die_count: usize,
    pub die_state: Vec<Vec<u32>>,
    #[serde(default)]
    pub die_state_distribution: DieDistribution,
    #[serde(default)]
    pub die_type: DieType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardsSchema {
    pub chance: DeckSchema,
    pub community_chest: DeckSchema,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DeckSchema {
    #[serde(default)]
    pub card_count: Option<usize>,
    pub card_states: Vec<CardSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSpec {
    pub name: String,
    #[serde(default = "default_num")]
    pub num: usize,
    pub action: String,
    #[serde(flatten)]
    pub kind: CardKindSpec,
}

const fn default_num() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "card_type", rename_all = "snake_case")]
pub enum CardKindSpec {
    Movement { destination: String },
    MovementPayment {
        destination: String,
        amount: i64,
    },
    ContingentMovement {
        contingency: String,
    },
    MovementRelative {
        new_relative_position: i64,
    },
    CashFromBank { amount: i64 },
    ContingentCashFromBank {
        contingency: String,
    },
    CashFromPlayers {
        amount_per_player: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlayersSchema {
    #[serde(default)]
    pub player_count: usize,
    #[serde(default)]
    pub player_names: Vec<String>,
}
