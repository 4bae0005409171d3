//! Cardinality operators: die face sets, die count, deck composition.
use std::collections::BTreeMap;

use crate::board::Board;
use crate::card::{DeckKind, ExpectedTotal};
use crate::dice::{Die, DieDistribution, DieType};
use crate::error::{BoardError, BoardResult};
use crate::registry::ExtensionRegistry;
use crate::run_log::RunLog;

pub(super) fn die_faces(board: &mut Board, die: usize, faces: &[u32]) -> BoardResult<()> {
    let count = board.dice.len();
    let Some(target) = board.dice.get_mut(die) else {
        return Err(BoardError::validation(format!(
            "no die {die}; the board has {count}"
        )));
    };
    target.set_faces(faces.to_vec())
}

/// Replace the dice. New dice inherit the distribution and type of the current first die.
pub(super) fn die_count(
    board: &mut Board,
    count: usize,
    faces: &[Vec<u32>],
    registry: &ExtensionRegistry,
) -> BoardResult<()> {
    if count == 0 {
        return Err(BoardError::validation("a board needs at least one die"));
    }
    if faces.len() != count {
        return Err(BoardError::configuration(format!(
            "die count is {count} but {} face sets are listed",
            faces.len()
        )));
    }
    let (distribution, die_type) = board.dice.first().map_or(
        (DieDistribution::default(), DieType::default()),
        |die| (die.distribution(), die.die_type()),
    );
    let dice = faces
        .iter()
        .map(|set| Die::new(set.clone(), distribution, die_type, registry))
        .collect::<BoardResult<Vec<_>>>()?;
    board.dice = dice;
    Ok(())
}

pub(super) fn deck_composition(
    board: &mut Board,
    deck: DeckKind,
    counts: &BTreeMap<String, usize>,
    expected: Option<ExpectedTotal>,
    log: &mut RunLog,
) -> BoardResult<()> {
    board.pile_mut(deck).rebuild(counts, expected, log)
}
