//! The board aggregate.
//!
//! A [`Board`] owns every location in an arena indexed by [`LocationId`]. The
//! cell sequence stores one id per cell, so a location spanning three cells
//! appears three times in a row. Railroad/utility index sets, the Go and Jail
//! positions, and the color index are derived from the sequence and must be
//! rebuilt whenever the layout changes.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hasher;
use twox_hash::XxHash64;

use crate::card::{CardKind, CardPile, Deck, DeckKind};
use crate::dice::{DiceStreams, Die};
use crate::error::{BoardError, BoardResult};
use crate::history::MutationHistory;
use crate::location::{LocClass, Location, LocationId, LocationKind};
use crate::player::{Effect, Player};
use crate::registry::{Binding, ExtensionRegistry, HookBindings, HookFn, HookId, RentFn};
use crate::schema::{BoardKnobs, BoardSchema};

/// Name of the start location.
pub const GO: &str = "Go";
/// Name of the jail location.
pub const JAIL: &str = "In Jail/Just Visiting";

/// Upper bound on the cell count of any layout, declared or resized.
pub const MAX_CELLS: usize = 4096;

/// Sorted cell indices.
pub type IndexSet = SmallVec<[usize; 8]>;

/// Whether the board may currently be mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardPhase {
    #[default]
    Setup,
    InGame,
}

/// The most recent topology novelty, for downstream introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologyNovelty {
    GlobalReordering,
    ColorReordering { color: String },
    Granularity { location: String },
}

#[derive(Debug, Clone)]
pub struct Board {
    pub(crate) locations: Vec<Location>,
    pub(crate) by_name: HashMap<String, LocationId>,
    pub(crate) sequence: Vec<LocationId>,
    pub(crate) railroad_positions: IndexSet,
    pub(crate) utility_positions: IndexSet,
    pub(crate) jail_position: usize,
    pub(crate) go_position: usize,
    pub(crate) color_groups: BTreeMap<String, BTreeSet<LocationId>>,
    pub(crate) chance: CardPile,
    pub(crate) community_chest: CardPile,
    pub(crate) dice: Vec<Die>,
    pub(crate) hooks: HookBindings,
    pub(crate) rent_strategy: Binding<RentFn>,
    pub(crate) knobs: BoardKnobs,
    pub(crate) player_names: Vec<String>,
    pub(crate) history: MutationHistory,
    pub(crate) active_topology: Option<TopologyNovelty>,
    pub(crate) phase: BoardPhase,
    /// Locations each topology operator has touched in the current mutation session.
    pub(crate) session_touched: BTreeMap<&'static str, BTreeSet<LocationId>>,
}

impl Board {
    /// Build a board from its declarative description.
    ///
    /// Construction is all-or-nothing: any error means no board exists.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] when cells overlap, leave gaps, or disagree with the
    /// declared location count; [`BoardError::Configuration`] for malformed or inconsistent
    /// input (duplicate names, a `go_position` that does not name "Go", die or card count
    /// mismatches); and [`BoardError::UnknownExtension`] for unregistered handler names.
    pub fn from_schema(schema: &BoardSchema, registry: &ExtensionRegistry) -> BoardResult<Self> {
        let mut locations = Vec::with_capacity(schema.locations.location_states.len());
        let mut by_name = HashMap::new();
        for spec in &schema.locations.location_states {
            let id = LocationId(locations.len());
            if by_name.insert(spec.name.clone(), id).is_some() {
                return Err(BoardError::configuration(format!(
                    "location `{}` is declared more than once",
                    spec.name
                )));
            }
            locations.push(Location::from_spec(spec, registry)?);
        }

        let sequence = realize_sequence(&locations, schema.locations.location_count)?;
        if !schema.locations.location_sequence.is_empty() {
            let realized: Vec<&str> = distinct_order(&sequence)
                .into_iter()
                .map(|id| locations[id.0].name.as_str())
                .collect();
            if realized != schema.locations.location_sequence {
                return Err(BoardError::configuration(
                    "location_sequence disagrees with declared positions",
                ));
            }
        }

        let go_id = by_name
            .get(GO)
            .copied()
            .ok_or_else(|| BoardError::configuration("no location is named `Go`"))?;
        let go_ok = sequence.get(schema.go_position) == Some(&go_id)
            && locations[go_id.0].start_position == schema.go_position;
        if !go_ok {
            return Err(BoardError::configuration(format!(
                "go_position {} does not name `{GO}`",
                schema.go_position
            )));
        }
        if !by_name.contains_key(JAIL) {
            return Err(BoardError::configuration(format!(
                "no location is named `{JAIL}`"
            )));
        }

        let chance = CardPile::from_schema(DeckKind::Chance, &schema.cards.chance, registry)?;
        let community_chest = CardPile::from_schema(
            DeckKind::CommunityChest,
            &schema.cards.community_chest,
            registry,
        )?;

        let die_schema = &schema.die;
        if die_schema.die_count != die_schema.die_state.len() {
            return Err(BoardError::configuration(format!(
                "die_count is {} but {} face sets are listed",
                die_schema.die_count,
                die_schema.die_state.len()
            )));
        }
        let dice = die_schema
            .die_state
            .iter()
            .map(|faces| {
                Die::new(
                    faces.clone(),
                    die_schema.die_state_distribution,
                    die_schema.die_type,
                    registry,
                )
                .map_err(|err| match err {
                    BoardError::Validation(msg) => BoardError::Configuration(msg),
                    other => other,
                })
            })
            .collect::<BoardResult<Vec<_>>>()?;

        let mut hooks = HookBindings::default();
        for hook in HookId::ALL {
            registry.rebind(&mut hooks, hook, hook.default_handler())?;
        }
        for (hook, name) in &schema.hooks {
            registry.rebind(&mut hooks, *hook, name)?;
        }
        let rent_strategy = registry.resolve_rent(&schema.rent_strategy)?;

        let players = &schema.players;
        if players.player_count != 0
            && !players.player_names.is_empty()
            && players.player_count != players.player_names.len()
        {
            return Err(BoardError::configuration(format!(
                "player_count is {} but {} names are listed",
                players.player_count,
                players.player_names.len()
            )));
        }

        let mut board = Self {
            locations,
            by_name,
            sequence,
            railroad_positions: IndexSet::new(),
            utility_positions: IndexSet::new(),
            jail_position: 0,
            go_position: schema.go_position,
            color_groups: BTreeMap::new(),
            chance,
            community_chest,
            dice,
            hooks,
            rent_strategy,
            knobs: schema.knobs.clone(),
            player_names: players.player_names.clone(),
            history: MutationHistory::default(),
            active_topology: None,
            phase: BoardPhase::Setup,
            session_touched: BTreeMap::new(),
        };
        board.check_card_destinations()?;
        board.rebuild_derived()?;
        board.rebuild_color_groups();
        board.validate()?;
        Ok(board)
    }

    fn check_card_destinations(&self) -> BoardResult<()> {
        for pile in [&self.chance, &self.community_chest] {
            for card in pile.deck().cards() {
                let destination = match &card.kind {
                    CardKind::Movement { destination }
                    | CardKind::MovementPayment { destination, .. } => destination,
                    _ => continue,
                };
                if !self.by_name.contains_key(destination) {
                    return Err(BoardError::configuration(format!(
                        "card `{}` moves to unknown location `{destination}`",
                        card.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    #[must_use]
    pub fn location(&self, name: &str) -> Option<&Location> {
        self.by_name.get(name).map(|id| &self.locations[id.0])
    }

    pub(crate) fn id_of(&self, name: &str) -> BoardResult<LocationId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| BoardError::validation(format!("no location named `{name}`")))
    }

    pub(crate) fn location_mut(&mut self, name: &str) -> BoardResult<&mut Location> {
        let id = self.id_of(name)?;
        Ok(&mut self.locations[id.0])
    }

    /// Location resident at `cell`.
    #[must_use]
    pub fn location_at(&self, cell: usize) -> Option<&Location> {
        self.sequence.get(cell).map(|id| &self.locations[id.0])
    }

    /// Resident location name for every cell, in order.
    #[must_use]
    pub fn cell_names(&self) -> Vec<&str> {
        self.sequence
            .iter()
            .map(|id| self.locations[id.0].name.as_str())
            .collect()
    }

    /// Each location once, in board order.
    #[must_use]
    pub fn locations_in_order(&self) -> Vec<&Location> {
        distinct_order(&self.sequence)
            .into_iter()
            .map(|id| &self.locations[id.0])
            .collect()
    }

    /// Each location name once, in board order.
    #[must_use]
    pub fn location_names(&self) -> Vec<String> {
        self.locations_in_order()
            .into_iter()
            .map(|loc| loc.name.clone())
            .collect()
    }

    #[must_use]
    pub fn railroad_positions(&self) -> &[usize] {
        &self.railroad_positions
    }

    #[must_use]
    pub fn utility_positions(&self) -> &[usize] {
        &self.utility_positions
    }

    #[must_use]
    pub const fn jail_position(&self) -> usize {
        self.jail_position
    }

    #[must_use]
    pub const fn go_position(&self) -> usize {
        self.go_position
    }

    /// Locations currently in `color`, in board order.
    #[must_use]
    pub fn color_group(&self, color: &str) -> Vec<&Location> {
        let mut group: Vec<&Location> = self
            .color_groups
            .get(color)
            .into_iter()
            .flatten()
            .map(|id| &self.locations[id.0])
            .collect();
        group.sort_by_key(|loc| loc.start_position);
        group
    }

    pub fn colors(&self) -> impl Iterator<Item = &str> {
        self.color_groups.keys().map(String::as_str)
    }

    #[must_use]
    pub const fn pile(&self, kind: DeckKind) -> &CardPile {
        match kind {
            DeckKind::Chance => &self.chance,
            DeckKind::CommunityChest => &self.community_chest,
        }
    }

    pub(crate) const fn pile_mut(&mut self, kind: DeckKind) -> &mut CardPile {
        match kind {
            DeckKind::Chance => &mut self.chance,
            DeckKind::CommunityChest => &mut self.community_chest,
        }
    }

    #[must_use]
    pub const fn deck(&self, kind: DeckKind) -> &Deck {
        self.pile(kind).deck()
    }

    #[must_use]
    pub fn dice(&self) -> &[Die] {
        &self.dice
    }

    #[must_use]
    pub const fn hooks(&self) -> &HookBindings {
        &self.hooks
    }

    #[must_use]
    pub fn hook(&self, hook: HookId) -> Option<&Binding<HookFn>> {
        self.hooks.get(hook)
    }

    #[must_use]
    pub fn rent_strategy(&self) -> &str {
        self.rent_strategy.name()
    }

    #[must_use]
    pub const fn knobs(&self) -> &BoardKnobs {
        &self.knobs
    }

    #[must_use]
    pub const fn history(&self) -> &MutationHistory {
        &self.history
    }

    #[must_use]
    pub const fn active_topology(&self) -> Option<&TopologyNovelty> {
        self.active_topology.as_ref()
    }

    #[must_use]
    pub const fn phase(&self) -> BoardPhase {
        self.phase
    }

    /// Hand the board to a game loop. Novelties are rejected until [`Self::finish_game`].
    pub const fn start_game(&mut self) {
        self.phase = BoardPhase::InGame;
    }

    /// Take the board back after a game and open a fresh mutation session.
    pub fn finish_game(&mut self) {
        self.phase = BoardPhase::Setup;
        self.session_touched.clear();
    }

    pub(crate) fn ensure_mutable(&self) -> BoardResult<()> {
        match self.phase {
            BoardPhase::Setup => Ok(()),
            BoardPhase::InGame => Err(BoardError::validation("board is in use by a running game")),
        }
    }

    /// Record that `operator` touched `ids` in this session, failing on overlap.
    pub(crate) fn claim_topology_targets(
        &mut self,
        operator: &'static str,
        ids: &BTreeSet<LocationId>,
    ) -> BoardResult<()> {
        let touched = self.session_touched.entry(operator).or_default();
        if let Some(overlap) = ids.iter().find(|id| touched.contains(id)) {
            return Err(BoardError::validation(format!(
                "{operator} already rearranged `{}` in this session",
                self.locations[overlap.0].name
            )));
        }
        touched.extend(ids.iter().copied());
        Ok(())
    }

    /// Players seated with the board's starting cash.
    #[must_use]
    pub fn seat_players(&self) -> Vec<Player> {
        self.player_names
            .iter()
            .map(|name| Player::new(name.clone(), self.knobs.starting_cash).at(self.go_position))
            .collect()
    }

    /// Roll every die once, each from its own stream.
    pub fn roll_dice(&self, streams: &mut DiceStreams) -> Vec<u32> {
        self.dice
            .iter()
            .enumerate()
            .map(|(index, die)| die.roll(streams.stream(index)))
            .collect()
    }

    /// Rent owed on `name` under the board's current rent strategy.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] when no such location exists.
    pub fn rent_for(&self, name: &str, dice_total: u32) -> BoardResult<i64> {
        let id = self.id_of(name)?;
        Ok((self.rent_strategy.handler())(&self.locations[id.0], self, dice_total))
    }

    /// Invoke the handler bound at `hook`.
    #[must_use]
    pub fn invoke_hook(&self, hook: HookId, player: &Player) -> Effect {
        self.hooks
            .get(hook)
            .map_or(Effect::None, |binding| (binding.handler())(player, self))
    }

    /// Run an action location's bound handler.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] when `name` is unknown or not an action location.
    pub fn perform_action(&self, name: &str, player: &Player) -> BoardResult<Effect> {
        let id = self.id_of(name)?;
        let location = &self.locations[id.0];
        match &location.kind {
            LocationKind::Action { perform_action } => {
                Ok((perform_action.handler())(player, location, self))
            }
            _ => Err(BoardError::validation(format!(
                "`{name}` is not an action location"
            ))),
        }
    }

    /// Record a purchase, sale, or foreclosure.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] when `name` is unknown or cannot be owned.
    pub fn assign_owner(&mut self, name: &str, owner: Option<String>) -> BoardResult<()> {
        self.location_mut(name)?.set_owner(owner)
    }

    /// Locations owned by `owner`.
    pub fn owned_by<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a Location> + 'a {
        self.locations
            .iter()
            .filter(move |loc| loc.owner() == Some(owner))
    }

    /// How many locations of `class` `owner` holds.
    #[must_use]
    pub fn owned_count(&self, owner: &str, class: LocClass) -> usize {
        self.owned_by(owner)
            .filter(|loc| loc.loc_class() == class)
            .count()
    }

    /// True when `owner` holds every location of `color`.
    #[must_use]
    pub fn owns_color_group(&self, owner: &str, color: &str) -> bool {
        self.color_groups.get(color).is_some_and(|group| {
            !group.is_empty()
                && group
                    .iter()
                    .all(|id| self.locations[id.0].owner() == Some(owner))
        })
    }

    /// Move a location between color buckets, never leaving it indexed under both.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] when no such location exists.
    pub(crate) fn recolor(&mut self, name: &str, color: Option<String>) -> BoardResult<()> {
        let id = self.id_of(name)?;
        if let Some(old) = self.locations[id.0].color.take()
            && let Some(bucket) = self.color_groups.get_mut(&old)
        {
            bucket.remove(&id);
            if bucket.is_empty() {
                self.color_groups.remove(&old);
            }
        }
        if let Some(new) = &color {
            self.color_groups.entry(new.clone()).or_default().insert(id);
        }
        self.locations[id.0].color = color;
        Ok(())
    }

    fn rebuild_color_groups(&mut self) {
        self.color_groups = derive_color_groups(&self.locations);
    }

    /// Recompute index sets and Go/Jail positions from the current sequence.
    pub(crate) fn rebuild_derived(&mut self) -> BoardResult<()> {
        let (railroads, utilities) = scan_index_sets(&self.locations, &self.sequence);
        self.railroad_positions = railroads;
        self.utility_positions = utilities;
        self.go_position = self.locations[self.id_of(GO)?.0].start_position;
        self.jail_position = self.locations[self.id_of(JAIL)?.0].start_position;
        Ok(())
    }

    /// Install a new layout. `positions` is indexed by location id.
    ///
    /// The candidate layout is checked before anything is written.
    pub(crate) fn commit_layout(
        &mut self,
        sequence: Vec<LocationId>,
        positions: &[(usize, usize)],
    ) -> BoardResult<()> {
        check_layout(&sequence, positions)?;
        for (loc, &(start, end)) in self.locations.iter_mut().zip(positions) {
            loc.start_position = start;
            loc.end_position = end;
        }
        self.sequence = sequence;
        self.rebuild_derived()
    }

    /// Exhaustively re-check every structural invariant.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] describing the first violated invariant.
    pub fn validate(&self) -> BoardResult<()> {
        if self.sequence.is_empty() {
            return Err(BoardError::validation("board has no cells"));
        }
        let positions: Vec<(usize, usize)> = self
            .locations
            .iter()
            .map(|loc| (loc.start_position, loc.end_position))
            .collect();
        check_layout(&self.sequence, &positions)?;

        let span_total: usize = self.locations.iter().map(Location::span).sum();
        if span_total != self.sequence.len() {
            return Err(BoardError::validation(format!(
                "spans sum to {span_total} over {} cells",
                self.sequence.len()
            )));
        }
        for (name, id) in &self.by_name {
            if self.locations[id.0].name != *name {
                return Err(BoardError::validation(format!(
                    "name index for `{name}` points at `{}`",
                    self.locations[id.0].name
                )));
            }
        }

        let (railroads, utilities) = scan_index_sets(&self.locations, &self.sequence);
        if railroads != self.railroad_positions {
            return Err(BoardError::validation(format!(
                "railroad positions {:?} do not match cells {railroads:?}",
                self.railroad_positions
            )));
        }
        if utilities != self.utility_positions {
            return Err(BoardError::validation(format!(
                "utility positions {:?} do not match cells {utilities:?}",
                self.utility_positions
            )));
        }
        for (name, position) in [(GO, self.go_position), (JAIL, self.jail_position)] {
            let start = self.locations[self.id_of(name)?.0].start_position;
            if start != position {
                return Err(BoardError::validation(format!(
                    "`{name}` starts at {start} but is indexed at {position}"
                )));
            }
        }
        if derive_color_groups(&self.locations) != self.color_groups {
            return Err(BoardError::validation("color index is out of date"));
        }
        Ok(())
    }

    /// Serializable view of everything novelties can change.
    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot<'_> {
        BoardSnapshot {
            locations: self.locations_in_order(),
            railroad_positions: &self.railroad_positions,
            utility_positions: &self.utility_positions,
            go_position: self.go_position,
            jail_position: self.jail_position,
            chance: self.chance.deck(),
            community_chest: self.community_chest.deck(),
            dice: &self.dice,
            hooks: &self.hooks,
            rent_strategy: &self.rent_strategy,
            knobs: &self.knobs,
            active_topology: self.active_topology.as_ref(),
        }
    }

    /// Stable hash of [`Self::snapshot`].
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let bytes = serde_json::to_vec(&self.snapshot()).unwrap_or_default();
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(&bytes);
        hasher.finish()
    }
}

/// Borrowed, serializable view of a board.
#[derive(Debug, Serialize)]
pub struct BoardSnapshot<'a> {
    pub locations: Vec<&'a Location>,
    pub railroad_positions: &'a [usize],
    pub utility_positions: &'a [usize],
    pub go_position: usize,
    pub jail_position: usize,
    pub chance: &'a Deck,
    pub community_chest: &'a Deck,
    pub dice: &'a [Die],
    pub hooks: &'a HookBindings,
    pub rent_strategy: &'a Binding<RentFn>,
    pub knobs: &'a BoardKnobs,
    pub active_topology: Option<&'a TopologyNovelty>,
}

/// Lay out cells from each location's declared range.
fn realize_sequence(locations: &[Location], declared: usize) -> BoardResult<Vec<LocationId>> {
    let len = locations
        .iter()
        .map(|loc| loc.end_position)
        .max()
        .unwrap_or(0);
    if len != declared {
        return Err(BoardError::validation(format!(
            "declared {declared} cells but locations cover {len}"
        )));
    }
    if len > MAX_CELLS {
        return Err(BoardError::validation(format!(
            "{len} cells exceeds the {MAX_CELLS} cell limit"
        )));
    }
    let mut cells: Vec<Option<LocationId>> = vec![None; len];
    for (index, loc) in locations.iter().enumerate() {
        for cell in loc.start_position..loc.end_position {
            if let Some(other) = cells[cell] {
                return Err(BoardError::validation(format!(
                    "`{}` and `{}` both occupy cell {cell}",
                    locations[other.0].name, loc.name
                )));
            }
            cells[cell] = Some(LocationId(index));
        }
    }
    cells
        .into_iter()
        .enumerate()
        .map(|(cell, slot)| {
            slot.ok_or_else(|| BoardError::validation(format!("cell {cell} has no location")))
        })
        .collect()
}

/// Each id once, in first-occurrence order.
pub(crate) fn distinct_order(sequence: &[LocationId]) -> Vec<LocationId> {
    let mut seen = HashSet::new();
    sequence
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Collect every cell whose resident is a railroad or a utility.
fn scan_index_sets(locations: &[Location], sequence: &[LocationId]) -> (IndexSet, IndexSet) {
    let mut railroads = IndexSet::new();
    let mut utilities = IndexSet::new();
    for (cell, id) in sequence.iter().enumerate() {
        match locations[id.0].loc_class() {
            LocClass::Railroad => railroads.push(cell),
            LocClass::Utility => utilities.push(cell),
            _ => {}
        }
    }
    (railroads, utilities)
}

fn derive_color_groups(locations: &[Location]) -> BTreeMap<String, BTreeSet<LocationId>> {
    let mut groups: BTreeMap<String, BTreeSet<LocationId>> = BTreeMap::new();
    for (index, loc) in locations.iter().enumerate() {
        if let Some(color) = &loc.color {
            groups
                .entry(color.clone())
                .or_default()
                .insert(LocationId(index));
        }
    }
    groups
}

/// Every cell maps to a location whose range covers it, and every range is contiguous.
fn check_layout(sequence: &[LocationId], positions: &[(usize, usize)]) -> BoardResult<()> {
    for (cell, id) in sequence.iter().enumerate() {
        let Some(&(start, end)) = positions.get(id.0) else {
            return Err(BoardError::validation(format!(
                "cell {cell} references unknown location {}",
                id.0
            )));
        };
        if cell < start || cell >= end {
            return Err(BoardError::validation(format!(
                "cell {cell} lies outside its location's range {start}..{end}"
            )));
        }
    }
    for (index, &(start, end)) in positions.iter().enumerate() {
        if end <= start || end > sequence.len() {
            return Err(BoardError::validation(format!(
                "location {index} has invalid range {start}..{end}"
            )));
        }
        if sequence[start..end].iter().any(|id| id.0 != index) {
            return Err(BoardError::validation(format!(
                "location {index} does not own all of {start}..{end}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        CardKindSpec, CardSpec, CardsSchema, DeckSchema, DiceSchema, LocationClassSpec,
        LocationSpec, LocationsSchema, PlayersSchema,
    };

    fn spec(name: &str, start: usize, end: usize, class: LocationClassSpec) -> LocationSpec {
        LocationSpec {
            name: name.to_string(),
            start_position: start,
            end_position: end,
            color: None,
            class,
        }
    }

    fn schema(states: Vec<LocationSpec>, count: usize, go_position: usize) -> BoardSchema {
        BoardSchema {
            locations: LocationsSchema {
                location_count: count,
                location_sequence: Vec::new(),
                location_states: states,
            },
            go_position,
            knobs: BoardKnobs::default(),
            die: DiceSchema {
                die_count: 2,
                die_state: vec![vec![1, 2, 3, 4, 5, 6]; 2],
                die_state_distribution: crate::dice::DieDistribution::Uniform,
                die_type: crate::dice::DieType::Consecutive,
            },
            cards: CardsSchema {
                chance: DeckSchema::default(),
                community_chest: DeckSchema::default(),
            },
            players: PlayersSchema::default(),
            rent_strategy: "standard_rent".to_string(),
            hooks: BTreeMap::new(),
        }
    }

    fn four_cells() -> Vec<LocationSpec> {
        vec![
            spec("A", 0, 1, LocationClassSpec::DoNothing),
            spec(GO, 1, 2, LocationClassSpec::DoNothing),
            spec("B", 2, 3, LocationClassSpec::DoNothing),
            spec(JAIL, 3, 4, LocationClassSpec::DoNothing),
        ]
    }

    #[test]
    fn builds_and_indexes_small_board() {
        let board =
            Board::from_schema(&schema(four_cells(), 4, 1), &ExtensionRegistry::with_defaults())
                .unwrap();
        assert_eq!(board.len(), 4);
        assert_eq!(board.go_position(), 1);
        assert_eq!(board.jail_position(), 3);
        assert_eq!(board.cell_names(), vec!["A", GO, "B", JAIL]);
        assert_eq!(board.hooks().len(), HookId::ALL.len());
    }

    #[test]
    fn count_mismatch_is_validation_error() {
        let err =
            Board::from_schema(&schema(four_cells(), 5, 1), &ExtensionRegistry::with_defaults())
                .unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));
    }

    #[test]
    fn go_position_must_name_go() {
        let err =
            Board::from_schema(&schema(four_cells(), 4, 0), &ExtensionRegistry::with_defaults())
                .unwrap_err();
        assert!(matches!(err, BoardError::Configuration(_)));
    }

    #[test]
    fn gaps_and_overlaps_are_rejected() {
        let registry = ExtensionRegistry::with_defaults();
        let mut gap = four_cells();
        gap[2] = spec("B", 3, 4, LocationClassSpec::DoNothing);
        gap[3] = spec(JAIL, 4, 5, LocationClassSpec::DoNothing);
        assert!(matches!(
            Board::from_schema(&schema(gap, 5, 1), &registry),
            Err(BoardError::Validation(_))
        ));

        let mut overlap = four_cells();
        overlap[2] = spec("B", 1, 3, LocationClassSpec::DoNothing);
        assert!(matches!(
            Board::from_schema(&schema(overlap, 4, 1), &registry),
            Err(BoardError::Validation(_))
        ));
    }

    #[test]
    fn declared_ranges_past_the_cell_limit_are_rejected() {
        let registry = ExtensionRegistry::with_defaults();
        let mut huge = four_cells();
        huge[3] = spec(JAIL, 3, usize::MAX, LocationClassSpec::DoNothing);
        assert!(matches!(
            Board::from_schema(&schema(huge.clone(), 4, 1), &registry),
            Err(BoardError::Validation(_))
        ));
        assert!(matches!(
            Board::from_schema(&schema(huge, usize::MAX, 1), &registry),
            Err(BoardError::Validation(_))
        ));
    }

    #[test]
    fn unregistered_handlers_abort_construction() {
        let registry = ExtensionRegistry::with_defaults();

        let mut states = four_cells();
        states[2] = spec(
            "B",
            2,
            3,
            LocationClassSpec::Action {
                perform_action: "no_such_action".to_string(),
            },
        );
        let err = Board::from_schema(&schema(states, 4, 1), &registry).unwrap_err();
        assert!(matches!(
            err,
            BoardError::UnknownExtension { ref name, .. } if name == "no_such_action"
        ));

        let card = |action: &str, kind: CardKindSpec| CardSpec {
            name: "windfall".to_string(),
            num: 1,
            action: action.to_string(),
            kind,
        };
        let bad_decks = [
            card("no_such_card", CardKindSpec::CashFromBank { amount: 50 }),
            card(
                "contingent_bank_cash_transaction",
                CardKindSpec::ContingentCashFromBank {
                    contingency: "no_such_contingency".to_string(),
                },
            ),
            // registered, but as a rent strategy
            card("standard_rent", CardKindSpec::CashFromBank { amount: 50 }),
        ];
        for bad in bad_decks {
            let mut with_card = schema(four_cells(), 4, 1);
            with_card.cards.chance.card_states.push(bad);
            assert!(matches!(
                Board::from_schema(&with_card, &registry),
                Err(BoardError::UnknownExtension { .. })
            ));
        }
    }

    #[test]
    fn players_are_seated_on_go_with_starting_cash() {
        let mut board = Board::from_schema(
            &BoardSchema::classic().unwrap(),
            &ExtensionRegistry::with_defaults(),
        )
        .unwrap();
        board.granularity_novelty(GO, 3).unwrap();
        let mut order = board.location_names();
        order.rotate_left(1);
        board.global_reordering(&order).unwrap();
        let players = board.seat_players();
        assert_eq!(players.len(), 4);
        assert_eq!(players[0].name, "player_1");
        assert!(players.iter().all(|player| {
            player.cash == 1500
                && player.position == board.go_position()
                && !player.in_jail
                && player.get_out_of_jail_cards == 0
        }));
        assert_eq!(board.go_position(), 39);
        assert_eq!(board.location_at(players[3].position).unwrap().name, GO);
    }

    #[test]
    fn multi_cell_railroad_is_indexed_per_cell() {
        let mut states = four_cells();
        states[2] = spec(
            "Wide Railroad",
            2,
            4,
            LocationClassSpec::Railroad {
                price: 200,
                mortgage: 100,
                railroad_dues: BTreeMap::from([("1".to_string(), 25)]),
                owned_by: None,
            },
        );
        states[3] = spec(JAIL, 4, 5, LocationClassSpec::DoNothing);
        let board =
            Board::from_schema(&schema(states, 5, 1), &ExtensionRegistry::with_defaults())
                .unwrap();
        assert_eq!(board.railroad_positions(), &[2, 3]);
        assert_eq!(board.locations_in_order().len(), 4);
    }

    #[test]
    fn recolor_moves_between_buckets() {
        let mut states = four_cells();
        states[0].color = Some("Brown".to_string());
        states[2].color = Some("Brown".to_string());
        let mut board =
            Board::from_schema(&schema(states, 4, 1), &ExtensionRegistry::with_defaults())
                .unwrap();
        board.recolor("A", Some("Blue".to_string())).unwrap();
        assert_eq!(board.color_group("Brown").len(), 1);
        assert_eq!(board.color_group("Blue")[0].name, "A");
        board.recolor("B", None).unwrap();
        assert!(board.colors().all(|color| color != "Brown"));
        board.validate().unwrap();
    }

    #[test]
    fn game_lease_blocks_mutation() {
        let mut board =
            Board::from_schema(&schema(four_cells(), 4, 1), &ExtensionRegistry::with_defaults())
                .unwrap();
        board.start_game();
        assert!(board.ensure_mutable().is_err());
        board.finish_game();
        assert!(board.ensure_mutable().is_ok());
    }

    #[test]
    fn fingerprint_tracks_layout_changes() {
        let mut board =
            Board::from_schema(&schema(four_cells(), 4, 1), &ExtensionRegistry::with_defaults())
                .unwrap();
        let before = board.fingerprint();
        assert_eq!(before, board.clone().fingerprint());
        board.recolor("A", Some("Red".to_string())).unwrap();
        assert_ne!(before, board.fingerprint());
    }
}
