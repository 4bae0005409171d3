//! Location variants.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{BoardError, BoardResult};
use crate::registry::{Binding, ExtensionRegistry, LocationFn};
use crate::schema::{LocationClassSpec, LocationSpec, owned_count_table};

/// Index of a location in the board's arena. Stable across topology mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub usize);

/// Variant tag of a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocClass {
    Action,
    DoNothing,
    RealEstate,
    Tax,
    Railroad,
    Utility,
}

/// Rent tiers of a real estate location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentTier {
    Base,
    OneHouse,
    TwoHouses,
    ThreeHouses,
    FourHouses,
    Hotel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RentTiers {
    pub base: i64,
    pub one_house: i64,
    pub two_houses: i64,
    pub three_houses: i64,
    pub four_houses: i64,
    pub hotel: i64,
}

impl RentTiers {
    #[must_use]
    pub const fn get(&self, tier: RentTier) -> i64 {
        match tier {
            RentTier::Base => self.base,
            RentTier::OneHouse => self.one_house,
            RentTier::TwoHouses => self.two_houses,
            RentTier::ThreeHouses => self.three_houses,
            RentTier::FourHouses => self.four_houses,
            RentTier::Hotel => self.hotel,
        }
    }

    pub const fn set(&mut self, tier: RentTier, amount: i64) {
        match tier {
            RentTier::Base => self.base = amount,
            RentTier::OneHouse => self.one_house = amount,
            RentTier::TwoHouses => self.two_houses = amount,
            RentTier::ThreeHouses => self.three_houses = amount,
            RentTier::FourHouses => self.four_houses = amount,
            RentTier::Hotel => self.hotel = amount,
        }
    }

    /// Tier for a house count; anything past four houses reads the four-house tier.
    #[must_use]
    pub const fn for_houses(houses: u8) -> RentTier {
        match houses {
            0 => RentTier::Base,
            1 => RentTier::OneHouse,
            2 => RentTier::TwoHouses,
            3 => RentTier::ThreeHouses,
            _ => RentTier::FourHouses,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RealEstate {
    pub price: i64,
    pub price_per_house: i64,
    pub rents: RentTiers,
    pub mortgage: i64,
    pub num_houses: u8,
    pub num_hotels: u8,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Railroad {
    pub price: i64,
    pub mortgage: i64,
    pub owner: Option<String>,
    /// Dues keyed by how many railroads the owner holds.
    pub dues: BTreeMap<u8, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Utility {
    pub price: i64,
    pub mortgage: i64,
    pub owner: Option<String>,
    /// Dice-total multiplier keyed by how many utilities the owner holds.
    pub die_multiples: BTreeMap<u8, i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "loc_class", rename_all = "snake_case")]
pub enum LocationKind {
    Action {
        perform_action: Binding<LocationFn>,
    },
    DoNothing,
    RealEstate(RealEstate),
    Tax { amount_due: i64 },
    Railroad(Railroad),
    Utility(Utility),
}

/// One named cell range on the board.
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub name: String,
    /// First cell occupied.
    pub start_position: usize,
    /// One past the last cell occupied.
    pub end_position: usize,
    pub color: Option<String>,
    #[serde(flatten)]
    pub kind: LocationKind,
}

impl Location {
    /// Materialize a location from its declarative spec.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Configuration`] for an empty span or malformed dues tables, and
    /// [`BoardError::UnknownExtension`] when an action location names an unregistered handler.
    pub fn from_spec(spec: &LocationSpec, registry: &ExtensionRegistry) -> BoardResult<Self> {
        if spec.end_position <= spec.start_position {
            return Err(BoardError::configuration(format!(
                "`{}` spans no cells ({}..{})",
                spec.name, spec.start_position, spec.end_position
            )));
        }
        let kind = match &spec.class {
            LocationClassSpec::Action { perform_action } => LocationKind::Action {
                perform_action: registry.resolve_location(perform_action)?,
            },
            LocationClassSpec::DoNothing => LocationKind::DoNothing,
            LocationClassSpec::RealEstate {
                price,
                price_per_house,
                rent,
                rent_1_house,
                rent_2_houses,
                rent_3_houses,
                rent_4_houses,
                rent_hotel,
                mortgage,
                num_houses,
                num_hotels,
                owned_by,
            } => LocationKind::RealEstate(RealEstate {
                price: *price,
                price_per_house: *price_per_house,
                rents: RentTiers {
                    base: *rent,
                    one_house: *rent_1_house,
                    two_houses: *rent_2_houses,
                    three_houses: *rent_3_houses,
                    four_houses: *rent_4_houses,
                    hotel: *rent_hotel,
                },
                mortgage: *mortgage,
                num_houses: *num_houses,
                num_hotels: *num_hotels,
                owner: owned_by.clone(),
            }),
            LocationClassSpec::Tax { amount_due } => LocationKind::Tax {
                amount_due: *amount_due,
            },
            LocationClassSpec::Railroad {
                price,
                mortgage,
                railroad_dues,
                owned_by,
            } => LocationKind::Railroad(Railroad {
                price: *price,
                mortgage: *mortgage,
                owner: owned_by.clone(),
                dues: owned_count_table(&spec.name, railroad_dues)?,
            }),
            LocationClassSpec::Utility {
                price,
                mortgage,
                die_multiples,
                owned_by,
            } => LocationKind::Utility(Utility {
                price: *price,
                mortgage: *mortgage,
                owner: owned_by.clone(),
                die_multiples: owned_count_table(&spec.name, die_multiples)?,
            }),
        };
        Ok(Self {
            name: spec.name.clone(),
            start_position: spec.start_position,
            end_position: spec.end_position,
            color: spec.color.clone(),
            kind,
        })
    }

    #[must_use]
    pub const fn loc_class(&self) -> LocClass {
        match self.kind {
            LocationKind::Action { .. } => LocClass::Action,
            LocationKind::DoNothing => LocClass::DoNothing,
            LocationKind::RealEstate(_) => LocClass::RealEstate,
            LocationKind::Tax { .. } => LocClass::Tax,
            LocationKind::Railroad(_) => LocClass::Railroad,
            LocationKind::Utility(_) => LocClass::Utility,
        }
    }

    /// Number of contiguous cells occupied.
    #[must_use]
    pub const fn span(&self) -> usize {
        self.end_position.saturating_sub(self.start_position)
    }

    #[must_use]
    pub const fn occupies(&self, cell: usize) -> bool {
        cell >= self.start_position && cell < self.end_position
    }

    #[must_use]
    pub const fn is_property(&self) -> bool {
        matches!(
            self.kind,
            LocationKind::RealEstate(_) | LocationKind::Railroad(_) | LocationKind::Utility(_)
        )
    }

    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        match &self.kind {
            LocationKind::RealEstate(estate) => estate.owner.as_deref(),
            LocationKind::Railroad(railroad) => railroad.owner.as_deref(),
            LocationKind::Utility(utility) => utility.owner.as_deref(),
            _ => None,
        }
    }

    /// Assign or clear ownership.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] when the location cannot be owned.
    pub fn set_owner(&mut self, owner: Option<String>) -> BoardResult<()> {
        match &mut self.kind {
            LocationKind::RealEstate(estate) => estate.owner = owner,
            LocationKind::Railroad(railroad) => railroad.owner = owner,
            LocationKind::Utility(utility) => utility.owner = owner,
            _ => return Err(not_a(&self.name, "property")),
        }
        Ok(())
    }

    #[must_use]
    pub const fn price(&self) -> Option<i64> {
        match &self.kind {
            LocationKind::RealEstate(estate) => Some(estate.price),
            LocationKind::Railroad(railroad) => Some(railroad.price),
            LocationKind::Utility(utility) => Some(utility.price),
            _ => None,
        }
    }

    #[must_use]
    pub const fn mortgage(&self) -> Option<i64> {
        match &self.kind {
            LocationKind::RealEstate(estate) => Some(estate.mortgage),
            LocationKind::Railroad(railroad) => Some(railroad.mortgage),
            LocationKind::Utility(utility) => Some(utility.mortgage),
            _ => None,
        }
    }

    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] when the location has no price.
    pub fn set_price(&mut self, price: i64) -> BoardResult<()> {
        match &mut self.kind {
            LocationKind::RealEstate(estate) => estate.price = price,
            LocationKind::Railroad(railroad) => railroad.price = price,
            LocationKind::Utility(utility) => utility.price = price,
            _ => return Err(not_a(&self.name, "property")),
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] when the location cannot be mortgaged.
    pub fn set_mortgage(&mut self, mortgage: i64) -> BoardResult<()> {
        match &mut self.kind {
            LocationKind::RealEstate(estate) => estate.mortgage = mortgage,
            LocationKind::Railroad(railroad) => railroad.mortgage = mortgage,
            LocationKind::Utility(utility) => utility.mortgage = mortgage,
            _ => return Err(not_a(&self.name, "property")),
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] unless this is real estate.
    pub fn real_estate_mut(&mut self) -> BoardResult<&mut RealEstate> {
        match &mut self.kind {
            LocationKind::RealEstate(estate) => Ok(estate),
            _ => Err(not_a(&self.name, "real estate location")),
        }
    }

    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] unless this is a railroad.
    pub fn railroad_mut(&mut self) -> BoardResult<&mut Railroad> {
        match &mut self.kind {
            LocationKind::Railroad(railroad) => Ok(railroad),
            _ => Err(not_a(&self.name, "railroad")),
        }
    }

    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] unless this is a utility.
    pub fn utility_mut(&mut self) -> BoardResult<&mut Utility> {
        match &mut self.kind {
            LocationKind::Utility(utility) => Ok(utility),
            _ => Err(not_a(&self.name, "utility")),
        }
    }
}

fn not_a(name: &str, what: &str) -> BoardError {
    BoardError::validation(format!("`{name}` is not a {what}"))
}
