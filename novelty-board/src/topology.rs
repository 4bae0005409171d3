//! Layout mutations: reordering locations and resizing one location's span.
//!
//! Every operation computes the complete new cell sequence and position table
//! first, then hands both to [`Board::commit_layout`], which refuses anything
//! that does not validate. A failed call leaves the board exactly as it was.
use std::collections::{HashMap, HashSet};
use std::iter::repeat_n;

use crate::board::{Board, MAX_CELLS, distinct_order};
use crate::error::{BoardError, BoardResult};
use crate::location::LocationId;

/// A candidate layout: the flat cell sequence and a `(start, end)` per location id.
struct Layout {
    sequence: Vec<LocationId>,
    positions: Vec<(usize, usize)>,
}

impl Board {
    /// Reorder every location to follow `names`.
    ///
    /// Each location keeps its span and starts at the cumulative cell offset of
    /// its slot, so for single-cell boards the location at index `i` lands on
    /// cell `i`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] when a name is unknown or repeated, or when
    /// `names` does not list every location exactly once.
    pub fn global_reordering(&mut self, names: &[String]) -> BoardResult<()> {
        let mut seen = HashSet::with_capacity(names.len());
        let mut order = Vec::with_capacity(names.len());
        for name in names {
            let id = self.id_of(name)?;
            if !seen.insert(id) {
                return Err(BoardError::validation(format!(
                    "`{name}` appears more than once in the new order"
                )));
            }
            order.push(id);
        }
        let layout = self.lay_out(&order, |id| self.locations[id.0].span());
        if order.len() != self.locations.len() || layout.sequence.len() != self.sequence.len() {
            return Err(BoardError::validation(format!(
                "new order names {} of {} locations",
                order.len(),
                self.locations.len()
            )));
        }
        self.commit_layout(layout.sequence, &layout.positions)
    }

    /// Rearrange the listed members of `color` into the given relative order.
    ///
    /// The listed locations trade slots among themselves; every other location,
    /// including unlisted members of the group, stays where it is.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] when `color` has no group, a listed name is
    /// unknown, repeated, or not in the group, or the substitution does not cover
    /// exactly the listed names.
    pub fn color_reordering(&mut self, locations: &[String], color: &str) -> BoardResult<()> {
        let Some(group) = self.color_groups.get(color) else {
            return Err(BoardError::validation(format!("no color group `{color}`")));
        };
        let mut listed = Vec::with_capacity(locations.len());
        let mut seen = HashSet::with_capacity(locations.len());
        for name in locations {
            let id = self.id_of(name)?;
            if !group.contains(&id) {
                return Err(BoardError::validation(format!(
                    "`{name}` is not in color group `{color}`"
                )));
            }
            if !seen.insert(id) {
                return Err(BoardError::validation(format!(
                    "`{name}` is listed more than once"
                )));
            }
            listed.push(id);
        }

        let mut slots = listed.clone();
        slots.sort_by_key(|id| self.locations[id.0].start_position);
        let substitution: HashMap<LocationId, LocationId> =
            slots.into_iter().zip(listed.iter().copied()).collect();

        let mut applied = 0;
        let names: Vec<String> = distinct_order(&self.sequence)
            .into_iter()
            .map(|id| {
                let resident = match substitution.get(&id) {
                    Some(&to) => {
                        applied += 1;
                        to
                    }
                    None => id,
                };
                self.locations[resident.0].name.clone()
            })
            .collect();
        if applied != locations.len() {
            return Err(BoardError::validation(format!(
                "substitution covers {applied} slots for {} listed locations",
                locations.len()
            )));
        }
        self.global_reordering(&names)
    }

    /// Stretch or shrink `name` so that it ends at `new_end_position`.
    ///
    /// `new_end_position == start_position` collapses the location to one cell.
    /// Locations after it shift by the change in span.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] when the location is unknown, the new end
    /// lies before its start, or the resized layout does not add up.
    pub fn granularity_novelty(&mut self, name: &str, new_end_position: usize) -> BoardResult<()> {
        let target = self.id_of(name)?;
        let (start, end) = {
            let loc = &self.locations[target.0];
            (loc.start_position, loc.end_position)
        };
        if new_end_position < start {
            return Err(BoardError::validation(format!(
                "`{name}` starts at {start}; cannot end at {new_end_position}"
            )));
        }
        let new_span = (new_end_position - start).max(1);
        let old_span = end - start;
        let expected_len = (self.sequence.len() - old_span)
            .checked_add(new_span)
            .filter(|len| *len <= MAX_CELLS)
            .ok_or_else(|| {
                BoardError::validation(format!(
                    "`{name}` ending at {new_end_position} exceeds {MAX_CELLS} cells"
                ))
            })?;

        let order = distinct_order(&self.sequence);
        let layout = self.lay_out(&order, |id| {
            if id == target {
                new_span
            } else {
                self.locations[id.0].span()
            }
        });

        let emitted = layout.sequence.iter().filter(|id| **id == target).count();
        let (new_start, new_end) = layout.positions[target.0];
        if emitted != new_span || new_end - new_start != new_span || new_start != start {
            return Err(BoardError::validation(format!(
                "`{name}` was laid out over {emitted} cells, expected {new_span}"
            )));
        }
        if layout.sequence.len() != expected_len {
            return Err(BoardError::validation(format!(
                "resized board has {} cells, expected {expected_len}",
                layout.sequence.len()
            )));
        }
        self.commit_layout(layout.sequence, &layout.positions)
    }

    /// Emit each location of `order` for `span_of(id)` consecutive cells.
    ///
    /// Locations missing from `order` keep their old positions; the commit check
    /// rejects such a layout.
    fn lay_out(&self, order: &[LocationId], span_of: impl Fn(LocationId) -> usize) -> Layout {
        let mut sequence = Vec::with_capacity(self.sequence.len());
        let mut positions: Vec<(usize, usize)> = self
            .locations
            .iter()
            .map(|loc| (loc.start_position, loc.end_position))
            .collect();
        for &id in order {
            let start = sequence.len();
            sequence.extend(repeat_n(id, span_of(id)));
            positions[id.0] = (start, sequence.len());
        }
        Layout {
            sequence,
            positions,
        }
    }
}
