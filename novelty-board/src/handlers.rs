//! Fixed startup table of handlers.
//!
//! Every handler here is an ordinary function registered under a symbolic name.
//! Novelties swap behavior by rebinding names, so the alternates that ship with
//! the engine live alongside the defaults.
use crate::board::Board;
use crate::card::{Card, CardKind, DeckKind};
use crate::dice::{biased_die_roll, uniform_die_roll};
use crate::location::{LocClass, Location, LocationKind, RentTiers};
use crate::numbers::{apply_fraction, usize_to_i64};
use crate::player::{Effect, Player};
use crate::registry::{ExtensionRegistry, Handler};

/// Populate `registry` with every built-in handler.
pub fn register_defaults(registry: &mut ExtensionRegistry) {
    let cards: [(&str, crate::registry::CardFn); 13] = [
        ("move_player", move_player),
        ("move_player_and_pay", move_player_and_pay),
        ("go_to_jail", card_go_to_jail),
        ("move_player_relative", move_player_relative),
        ("bank_cash_transaction", bank_cash_transaction),
        ("contingent_bank_cash_transaction", run_contingency),
        ("contingent_movement", run_contingency),
        ("player_cash_transaction", player_cash_transaction),
        ("calculate_general_repair_cost", calculate_general_repair_cost),
        ("calculate_street_repair_cost", calculate_street_repair_cost),
        (
            "alternate_contingency_function_SR_1",
            alternate_contingency_function_sr_1,
        ),
        ("move_to_nearest_railroad", move_to_nearest_railroad),
        ("move_to_nearest_utility", move_to_nearest_utility),
    ];
    for (name, handler) in cards {
        registry.register(name, Handler::Card(handler));
    }

    let locations: [(&str, crate::registry::LocationFn); 4] = [
        ("pick_card_from_chance", pick_card_from_chance),
        ("pick_card_from_community_chest", pick_card_from_community_chest),
        ("go_to_jail_location", location_go_to_jail),
        ("do_nothing", location_do_nothing),
    ];
    for (name, handler) in locations {
        registry.register(name, Handler::Location(handler));
    }

    let hooks: [(&str, crate::registry::HookFn); 16] = [
        ("default_post_roll_movement", default_post_roll_movement),
        ("default_tax_payment", default_tax_payment),
        ("default_auction", default_auction),
        ("default_trade", no_effect),
        ("default_pass_go", default_pass_go),
        ("default_jail_entry", default_jail_entry),
        ("default_jail_fine", default_jail_fine),
        ("default_negative_cash", no_effect),
        ("default_phase_action", no_effect),
        ("max_die_post_roll_movement", max_die_post_roll_movement),
        ("percentage_tax_payment", percentage_tax_payment),
        ("no_auction", no_effect),
        ("double_pass_go", double_pass_go),
        ("jail_entry_with_lost_turns", jail_entry_with_lost_turns),
        ("doubled_jail_fine", doubled_jail_fine),
        ("negative_cash_goes_to_jail", negative_cash_goes_to_jail),
    ];
    for (name, handler) in hooks {
        registry.register(name, Handler::Hook(handler));
    }

    registry.register("standard_rent", Handler::Rent(standard_rent));
    registry.register(
        "price_percentage_rent",
        Handler::Rent(price_percentage_rent),
    );
    registry.register("uniform_die_roll", Handler::DieRoll(uniform_die_roll));
    registry.register("biased_die_roll", Handler::DieRoll(biased_die_roll));
}

fn destination_move(player: &Player, board: &Board, destination: &str) -> Effect {
    board
        .location(destination)
        .map_or(Effect::None, |loc| Effect::MoveTo {
            position: loc.start_position,
            collect_go: loc.start_position < player.position,
        })
}

fn move_player(player: &Player, card: &Card, board: &Board) -> Effect {
    match &card.kind {
        CardKind::Movement { destination } | CardKind::MovementPayment { destination, .. } => {
            destination_move(player, board, destination)
        }
        _ => Effect::None,
    }
}

fn move_player_and_pay(player: &Player, card: &Card, board: &Board) -> Effect {
    match &card.kind {
        CardKind::MovementPayment {
            destination,
            amount,
        } => Effect::Sequence(vec![
            destination_move(player, board, destination),
            Effect::PayBank(*amount),
        ]),
        _ => move_player(player, card, board),
    }
}

fn card_go_to_jail(_player: &Player, _card: &Card, _board: &Board) -> Effect {
    Effect::GoToJail
}

fn move_player_relative(_player: &Player, card: &Card, _board: &Board) -> Effect {
    match card.kind {
        CardKind::MovementRelative { offset } => Effect::MoveBy { offset },
        _ => Effect::None,
    }
}

fn bank_cash_transaction(_player: &Player, card: &Card, _board: &Board) -> Effect {
    match card.kind {
        CardKind::CashFromBank { amount } => Effect::bank_transfer(amount),
        _ => Effect::None,
    }
}

/// Delegate to the card's contingency slot.
fn run_contingency(player: &Player, card: &Card, board: &Board) -> Effect {
    card.contingency()
        .map_or(Effect::None, |contingency| {
            (contingency.handler())(player, card, board)
        })
}

fn player_cash_transaction(_player: &Player, card: &Card, _board: &Board) -> Effect {
    match card.kind {
        CardKind::CashFromPlayers { amount_per_player } if amount_per_player >= 0 => {
            Effect::CollectFromEachPlayer(amount_per_player)
        }
        CardKind::CashFromPlayers { amount_per_player } => {
            Effect::PayEachPlayer(amount_per_player.saturating_neg())
        }
        _ => Effect::None,
    }
}

/// Houses and hotels across everything `player` owns.
fn improvements(player: &Player, board: &Board) -> (i64, i64) {
    board
        .owned_by(&player.name)
        .fold((0, 0), |(houses, hotels), loc| match &loc.kind {
            LocationKind::RealEstate(estate) => (
                houses + i64::from(estate.num_houses),
                hotels + i64::from(estate.num_hotels),
            ),
            _ => (houses, hotels),
        })
}

fn repair_cost(player: &Player, board: &Board, per_house: i64, per_hotel: i64) -> Effect {
    let (houses, hotels) = improvements(player, board);
    let cost = houses * per_house + hotels * per_hotel;
    if cost == 0 {
        Effect::None
    } else {
        Effect::PayBank(cost)
    }
}

fn calculate_general_repair_cost(player: &Player, _card: &Card, board: &Board) -> Effect {
    repair_cost(player, board, 25, 100)
}

fn calculate_street_repair_cost(player: &Player, _card: &Card, board: &Board) -> Effect {
    repair_cost(player, board, 40, 115)
}

/// Repairs charged per owned property instead of per improvement.
fn alternate_contingency_function_sr_1(player: &Player, _card: &Card, board: &Board) -> Effect {
    let owned = usize_to_i64(board.owned_by(&player.name).count());
    let (_, hotels) = improvements(player, board);
    let cost = owned * 30 + hotels * 50;
    if cost == 0 {
        Effect::None
    } else {
        Effect::PayBank(cost)
    }
}

/// First cell strictly ahead of `player` in `cells`, wrapping past Go.
fn nearest_ahead(player: &Player, cells: &[usize]) -> Effect {
    let ahead = cells.iter().copied().find(|cell| *cell > player.position);
    match (ahead, cells.first()) {
        (Some(position), _) => Effect::MoveTo {
            position,
            collect_go: false,
        },
        (None, Some(&position)) => Effect::MoveTo {
            position,
            collect_go: true,
        },
        (None, None) => Effect::None,
    }
}

fn move_to_nearest_railroad(player: &Player, _card: &Card, board: &Board) -> Effect {
    nearest_ahead(player, board.railroad_positions())
}

fn move_to_nearest_utility(player: &Player, _card: &Card, board: &Board) -> Effect {
    nearest_ahead(player, board.utility_positions())
}

fn pick_card_from_chance(_player: &Player, _location: &Location, _board: &Board) -> Effect {
    Effect::DrawCard(DeckKind::Chance)
}

fn pick_card_from_community_chest(
    _player: &Player,
    _location: &Location,
    _board: &Board,
) -> Effect {
    Effect::DrawCard(DeckKind::CommunityChest)
}

fn location_go_to_jail(_player: &Player, _location: &Location, _board: &Board) -> Effect {
    Effect::GoToJail
}

fn location_do_nothing(_player: &Player, _location: &Location, _board: &Board) -> Effect {
    Effect::None
}

fn no_effect(_player: &Player, _board: &Board) -> Effect {
    Effect::None
}

fn default_post_roll_movement(player: &Player, _board: &Board) -> Effect {
    Effect::MoveBy {
        offset: i64::from(player.roll_total()),
    }
}

/// Move by the largest die only.
fn max_die_post_roll_movement(player: &Player, _board: &Board) -> Effect {
    Effect::MoveBy {
        offset: i64::from(player.last_roll.iter().copied().max().unwrap_or(0)),
    }
}

fn default_tax_payment(player: &Player, board: &Board) -> Effect {
    match board.location_at(player.position).map(|loc| &loc.kind) {
        Some(LocationKind::Tax { amount_due }) => Effect::PayBank(*amount_due),
        _ => Effect::None,
    }
}

/// Tax is ten percent of the player's cash, whatever the location says.
fn percentage_tax_payment(player: &Player, board: &Board) -> Effect {
    match board.location_at(player.position).map(Location::loc_class) {
        Some(LocClass::Tax) => Effect::PayBank(apply_fraction(player.cash.max(0), 0.1)),
        _ => Effect::None,
    }
}

fn default_auction(player: &Player, board: &Board) -> Effect {
    board
        .location_at(player.position)
        .filter(|loc| loc.is_property() && loc.owner().is_none())
        .map_or(Effect::None, |loc| Effect::Auction {
            location: loc.name.clone(),
        })
}

fn default_pass_go(_player: &Player, board: &Board) -> Effect {
    Effect::ReceiveFromBank(board.knobs().go_increment)
}

fn double_pass_go(_player: &Player, board: &Board) -> Effect {
    Effect::ReceiveFromBank(board.knobs().go_increment.saturating_mul(2))
}

fn default_jail_entry(_player: &Player, _board: &Board) -> Effect {
    Effect::GoToJail
}

fn jail_entry_with_lost_turns(_player: &Player, _board: &Board) -> Effect {
    Effect::Sequence(vec![Effect::GoToJail, Effect::SkipTurns(2)])
}

/// A held card is spent before any fine is charged.
fn release_from_jail(player: &Player, fine: i64) -> Effect {
    if !player.in_jail {
        Effect::None
    } else if player.get_out_of_jail_cards > 0 {
        Effect::Sequence(vec![Effect::UseJailCard, Effect::LeaveJail])
    } else {
        Effect::Sequence(vec![Effect::PayBank(fine), Effect::LeaveJail])
    }
}

fn default_jail_fine(player: &Player, board: &Board) -> Effect {
    release_from_jail(player, board.knobs().jail_fine)
}

fn doubled_jail_fine(player: &Player, board: &Board) -> Effect {
    release_from_jail(player, board.knobs().jail_fine.saturating_mul(2))
}

fn negative_cash_goes_to_jail(player: &Player, _board: &Board) -> Effect {
    if player.cash < 0 {
        Effect::GoToJail
    } else {
        Effect::None
    }
}

/// Rent by house/hotel tier, railroads and utilities by how many the owner holds.
pub fn standard_rent(location: &Location, board: &Board, dice_total: u32) -> i64 {
    let Some(owner) = location.owner() else {
        return 0;
    };
    match &location.kind {
        LocationKind::RealEstate(estate) => {
            if estate.num_hotels > 0 {
                return estate.rents.hotel;
            }
            let tier = RentTiers::for_houses(estate.num_houses);
            let rent = estate.rents.get(tier);
            let doubled = estate.num_houses == 0
                && location
                    .color
                    .as_deref()
                    .is_some_and(|color| board.owns_color_group(owner, color));
            if doubled { rent.saturating_mul(2) } else { rent }
        }
        LocationKind::Railroad(railroad) => {
            let owned = owned_key(board.owned_count(owner, LocClass::Railroad));
            railroad.dues.get(&owned).copied().unwrap_or(0)
        }
        LocationKind::Utility(utility) => {
            let owned = owned_key(board.owned_count(owner, LocClass::Utility));
            utility
                .die_multiples
                .get(&owned)
                .copied()
                .unwrap_or(0)
                .saturating_mul(i64::from(dice_total))
        }
        _ => 0,
    }
}

/// Flat rent of ten percent of the price for any owned property.
pub fn price_percentage_rent(location: &Location, _board: &Board, _dice_total: u32) -> i64 {
    match (location.owner(), location.price()) {
        (Some(_), Some(price)) => apply_fraction(price, 0.1),
        _ => 0,
    }
}

fn owned_key(count: usize) -> u8 {
    u8::try_from(count).unwrap_or(u8::MAX)
}
