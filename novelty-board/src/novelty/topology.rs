//! Topology operators. Each claims its targets for the current mutation session,
//! runs the layout change, and flags itself as the board's active topology novelty.
use std::collections::BTreeSet;

use crate::board::{Board, TopologyNovelty};
use crate::error::BoardResult;
use crate::location::LocationId;

fn claim_names(
    board: &mut Board,
    operator: &'static str,
    names: &[String],
) -> BoardResult<()> {
    let ids = names
        .iter()
        .map(|name| board.id_of(name))
        .collect::<BoardResult<BTreeSet<LocationId>>>()?;
    board.claim_topology_targets(operator, &ids)
}

pub(super) fn global_reordering(board: &mut Board, sequence: &[String]) -> BoardResult<()> {
    claim_names(board, "global_reordering", sequence)?;
    board.global_reordering(sequence)?;
    board.active_topology = Some(TopologyNovelty::GlobalReordering);
    Ok(())
}

pub(super) fn color_reordering(
    board: &mut Board,
    locations: &[String],
    color: &str,
) -> BoardResult<()> {
    claim_names(board, "color_reordering", locations)?;
    board.color_reordering(locations, color)?;
    board.active_topology = Some(TopologyNovelty::ColorReordering {
        color: color.to_string(),
    });
    Ok(())
}

pub(super) fn granularity(board: &mut Board, location: &str, new_end: usize) -> BoardResult<()> {
    claim_names(board, "granularity", &[location.to_string()])?;
    board.granularity_novelty(location, new_end)?;
    board.active_topology = Some(TopologyNovelty::Granularity {
        location: location.to_string(),
    });
    Ok(())
}
