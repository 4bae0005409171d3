//! Attribute operators: one named update per mutable field.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::board::Board;
use crate::card::{CardKind, DeckKind};
use crate::error::{BoardError, BoardResult};
use crate::location::{LocationKind, RentTier};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum LocationUpdate {
    Price(i64),
    PricePerHouse(i64),
    Rent {
        tier: RentTier,
        amount: i64,
    },
    Mortgage(i64),
    TaxAmount(i64),
    /// `None` removes the location from every color group.
    Color(Option<String>),
    RailroadDues {
        owned: u8,
        amount: i64,
    },
    UtilityMultiplier {
        owned: u8,
        multiple: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum CardUpdate {
    /// Cash amount of a `cash_from_bank` or `movement_payment` card.
    Amount(i64),
    Destination(String),
    RelativeOffset(i64),
    AmountPerPlayer(i64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "knob", content = "value", rename_all = "snake_case")]
pub enum BoardUpdate {
    GoIncrement(i64),
    MortgagePercentage(f64),
    JailFine(i64),
    StartingCash(i64),
    HouseLimitBeforeHotel(u8),
    TotalHouses(u32),
    TotalHotels(u32),
    PropertySellPercentage(f64),
}

impl BoardUpdate {
    #[must_use]
    pub const fn knob(&self) -> &'static str {
        match self {
            Self::GoIncrement(_) => "go_increment",
            Self::MortgagePercentage(_) => "mortgage_percentage",
            Self::JailFine(_) => "jail_fine",
            Self::StartingCash(_) => "starting_cash",
            Self::HouseLimitBeforeHotel(_) => "house_limit_before_hotel",
            Self::TotalHouses(_) => "total_houses",
            Self::TotalHotels(_) => "total_hotels",
            Self::PropertySellPercentage(_) => "property_sell_percentage",
        }
    }
}

fn non_negative(what: &str, amount: i64) -> BoardResult<i64> {
    if amount < 0 {
        return Err(BoardError::validation(format!(
            "{what} cannot be negative ({amount})"
        )));
    }
    Ok(amount)
}

fn fraction(what: &str, value: f64) -> BoardResult<f64> {
    if !(0.0..=1.0).contains(&value) {
        return Err(BoardError::validation(format!(
            "{what} must lie in 0..=1, got {value}"
        )));
    }
    Ok(value)
}

fn owned_key(owned: u8) -> BoardResult<u8> {
    if owned == 0 {
        return Err(BoardError::validation("owned count must be at least 1"));
    }
    Ok(owned)
}

pub(super) fn update_location(
    board: &mut Board,
    name: &str,
    update: &LocationUpdate,
) -> BoardResult<()> {
    if let LocationUpdate::Color(color) = update {
        return board.recolor(name, color.clone());
    }
    let location = board.location_mut(name)?;
    match update {
        LocationUpdate::Price(price) => location.set_price(non_negative("price", *price)?),
        LocationUpdate::PricePerHouse(price) => {
            location.real_estate_mut()?.price_per_house = non_negative("price per house", *price)?;
            Ok(())
        }
        LocationUpdate::Rent { tier, amount } => {
            let amount = non_negative("rent", *amount)?;
            location.real_estate_mut()?.rents.set(*tier, amount);
            Ok(())
        }
        LocationUpdate::Mortgage(mortgage) => {
            location.set_mortgage(non_negative("mortgage", *mortgage)?)
        }
        LocationUpdate::TaxAmount(amount) => {
            let amount = non_negative("tax", *amount)?;
            match &mut location.kind {
                LocationKind::Tax { amount_due } => {
                    *amount_due = amount;
                    Ok(())
                }
                _ => Err(BoardError::validation(format!(
                    "`{name}` is not a tax location"
                ))),
            }
        }
        LocationUpdate::RailroadDues { owned, amount } => {
            let owned = owned_key(*owned)?;
            let amount = non_negative("railroad dues", *amount)?;
            location.railroad_mut()?.dues.insert(owned, amount);
            Ok(())
        }
        LocationUpdate::UtilityMultiplier { owned, multiple } => {
            let owned = owned_key(*owned)?;
            let multiple = non_negative("utility multiple", *multiple)?;
            location.utility_mut()?.die_multiples.insert(owned, multiple);
            Ok(())
        }
        LocationUpdate::Color(_) => Ok(()),
    }
}

pub(super) fn update_card(
    board: &mut Board,
    deck: DeckKind,
    card: &str,
    update: &CardUpdate,
) -> BoardResult<()> {
    if let CardUpdate::Destination(destination) = update {
        board.id_of(destination)?;
    }
    let pile = board.pile_mut(deck);
    let Some(template) = pile.template(card) else {
        return Err(BoardError::validation(format!(
            "{} has no card named `{card}`",
            deck.as_str()
        )));
    };
    let accepted = matches!(
        (update, &template.kind),
        (
            CardUpdate::Amount(_),
            CardKind::CashFromBank { .. } | CardKind::MovementPayment { .. }
        ) | (
            CardUpdate::Destination(_),
            CardKind::Movement { .. } | CardKind::MovementPayment { .. }
        ) | (CardUpdate::RelativeOffset(_), CardKind::MovementRelative { .. })
            | (CardUpdate::AmountPerPlayer(_), CardKind::CashFromPlayers { .. })
    );
    if !accepted {
        return Err(BoardError::validation(format!(
            "`{card}` is a {:?} card and has no such field",
            template.card_type()
        )));
    }

    let names = BTreeSet::from([card.to_string()]);
    for copy in pile.cards_named_mut(&names) {
        match (&mut copy.kind, update) {
            (
                CardKind::CashFromBank { amount } | CardKind::MovementPayment { amount, .. },
                CardUpdate::Amount(value),
            )
            | (CardKind::MovementRelative { offset: amount }, CardUpdate::RelativeOffset(value))
            | (
                CardKind::CashFromPlayers {
                    amount_per_player: amount,
                },
                CardUpdate::AmountPerPlayer(value),
            ) => *amount = *value,
            (
                CardKind::Movement { destination } | CardKind::MovementPayment { destination, .. },
                CardUpdate::Destination(value),
            ) => destination.clone_from(value),
            _ => {}
        }
    }
    Ok(())
}

pub(super) fn update_board(board: &mut Board, update: &BoardUpdate) -> BoardResult<()> {
    let knobs = &mut board.knobs;
    match *update {
        BoardUpdate::GoIncrement(value) => {
            knobs.go_increment = non_negative("go increment", value)?;
        }
        BoardUpdate::MortgagePercentage(value) => {
            knobs.mortgage_percentage = fraction("mortgage percentage", value)?;
        }
        BoardUpdate::JailFine(value) => knobs.jail_fine = non_negative("jail fine", value)?,
        BoardUpdate::StartingCash(value) => {
            knobs.starting_cash = non_negative("starting cash", value)?;
        }
        BoardUpdate::HouseLimitBeforeHotel(value) => knobs.house_limit_before_hotel = value,
        BoardUpdate::TotalHouses(value) => knobs.total_houses = value,
        BoardUpdate::TotalHotels(value) => knobs.total_hotels = value,
        BoardUpdate::PropertySellPercentage(value) => {
            knobs.property_sell_percentage = fraction("property sell percentage", value)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ExtensionRegistry;
    use crate::schema::BoardSchema;

    fn classic() -> Board {
        Board::from_schema(
            &BoardSchema::classic().unwrap(),
            &ExtensionRegistry::with_defaults(),
        )
        .unwrap()
    }

    #[test]
    fn rent_tier_and_tax_updates() {
        let mut board = classic();
        update_location(
            &mut board,
            "Boardwalk",
            &LocationUpdate::Rent {
                tier: RentTier::Hotel,
                amount: 2500,
            },
        )
        .unwrap();
        update_location(&mut board, "Income Tax", &LocationUpdate::TaxAmount(150)).unwrap();
        let LocationKind::RealEstate(boardwalk) = &board.location("Boardwalk").unwrap().kind else {
            panic!("Boardwalk is real estate");
        };
        assert_eq!(boardwalk.rents.hotel, 2500);
        assert!(matches!(
            board.location("Income Tax").unwrap().kind,
            LocationKind::Tax { amount_due: 150 }
        ));
    }

    #[test]
    fn field_must_exist_on_the_variant() {
        let mut board = classic();
        for (name, update) in [
            ("Reading Railroad", LocationUpdate::PricePerHouse(10)),
            ("Go", LocationUpdate::Price(10)),
            ("Boardwalk", LocationUpdate::TaxAmount(10)),
            ("Boardwalk", LocationUpdate::Price(-1)),
            (
                "Water Works",
                LocationUpdate::UtilityMultiplier {
                    owned: 0,
                    multiple: 4,
                },
            ),
        ] {
            let err = update_location(&mut board, name, &update).unwrap_err();
            assert!(matches!(err, BoardError::Validation(_)), "{name}");
        }
    }

    #[test]
    fn color_update_repairs_the_index() {
        let mut board = classic();
        update_location(
            &mut board,
            "Baltic Avenue",
            &LocationUpdate::Color(Some("Blue".to_string())),
        )
        .unwrap();
        let brown: Vec<&str> = board
            .color_group("Brown")
            .into_iter()
            .map(|loc| loc.name.as_str())
            .collect();
        assert_eq!(brown, vec!["Mediterranean Avenue"]);
        assert_eq!(board.color_group("Blue").len(), 3);
        board.validate().unwrap();
    }

    #[test]
    fn card_update_reaches_copies_and_template() {
        let mut board = classic();
        update_card(
            &mut board,
            DeckKind::CommunityChest,
            "bank_error",
            &CardUpdate::Amount(500),
        )
        .unwrap();
        let pile = board.pile(DeckKind::CommunityChest);
        let amounts: Vec<i64> = pile
            .deck()
            .cards()
            .iter()
            .chain(pile.template("bank_error"))
            .filter(|card| card.name == "bank_error")
            .filter_map(|card| match card.kind {
                CardKind::CashFromBank { amount } => Some(amount),
                _ => None,
            })
            .collect();
        assert_eq!(amounts, vec![500, 500]);
    }

    #[test]
    fn card_update_checks_variant_and_destination() {
        let mut board = classic();
        assert!(
            update_card(
                &mut board,
                DeckKind::Chance,
                "advance_to_go",
                &CardUpdate::Amount(10)
            )
            .is_err()
        );
        assert!(
            update_card(
                &mut board,
                DeckKind::Chance,
                "advance_to_go",
                &CardUpdate::Destination("Atlantis".to_string())
            )
            .is_err()
        );
        update_card(
            &mut board,
            DeckKind::Chance,
            "advance_to_go",
            &CardUpdate::Destination("Boardwalk".to_string()),
        )
        .unwrap();
    }

    #[test]
    fn knob_fractions_are_bounded() {
        let mut board = classic();
        update_board(&mut board, &BoardUpdate::MortgagePercentage(0.2)).unwrap();
        assert!((board.knobs().mortgage_percentage - 0.2).abs() < f64::EPSILON);
        assert!(update_board(&mut board, &BoardUpdate::PropertySellPercentage(1.5)).is_err());
        assert!(update_board(&mut board, &BoardUpdate::MortgagePercentage(f64::NAN)).is_err());
        update_board(&mut board, &BoardUpdate::GoIncrement(400)).unwrap();
        assert_eq!(board.knobs().go_increment, 400);
        assert!(matches!(
            update_board(&mut board, &BoardUpdate::GoIncrement(-500)),
            Err(BoardError::Validation(_))
        ));
        assert_eq!(board.knobs().go_increment, 400);
    }
}
