use novelty_board::{
    Board, BoardError, BoardSchema, ExtensionRegistry, GO, JAIL, LocClass, Novelty, RunLog,
    TopologyNovelty,
};
use serde_json::json;
use std::collections::BTreeMap;

fn classic() -> Board {
    Board::from_schema(
        &BoardSchema::classic().expect("classic board parses"),
        &ExtensionRegistry::with_defaults(),
    )
    .expect("classic board builds")
}

fn four_cell_board() -> Board {
    let schema = BoardSchema::from_json(
        &json!({
            "locations": {
                "location_count": 4,
                "location_sequence": ["A", "Go", "B", "In Jail/Just Visiting"],
                "location_states": [
                    {"name": "A", "start_position": 0, "end_position": 1,
                     "loc_class": "do_nothing"},
                    {"name": "Go", "start_position": 1, "end_position": 2,
                     "loc_class": "do_nothing"},
                    {"name": "B", "start_position": 2, "end_position": 3,
                     "loc_class": "do_nothing"},
                    {"name": "In Jail/Just Visiting", "start_position": 3, "end_position": 4,
                     "loc_class": "do_nothing", "notes": "ignored"}
                ]
            },
            "go_position": 1,
            "die": {"die_count": 2, "die_state": [[1, 2, 3, 4, 5, 6], [1, 2, 3, 4, 5, 6]]},
            "cards": {"chance": {"card_states": []}, "community_chest": {"card_states": []}},
            "players": {"player_count": 2, "player_names": ["player_1", "player_2"]}
        })
        .to_string(),
    )
    .expect("fixture parses");
    Board::from_schema(&schema, &ExtensionRegistry::with_defaults()).expect("fixture builds")
}

fn positions(board: &Board) -> BTreeMap<String, (usize, usize)> {
    board
        .locations_in_order()
        .into_iter()
        .map(|loc| (loc.name.clone(), (loc.start_position, loc.end_position)))
        .collect()
}

/// Every property that must hold after any layout change.
fn assert_layout_invariants(board: &Board) {
    let span_total: usize = board.locations_in_order().iter().map(|loc| loc.span()).sum();
    assert_eq!(span_total, board.len());

    let mut railroads = Vec::new();
    let mut utilities = Vec::new();
    for cell in 0..board.len() {
        let resident = board.location_at(cell).expect("every cell has a resident");
        assert!(resident.occupies(cell), "{} misplaced at {cell}", resident.name);
        match resident.loc_class() {
            LocClass::Railroad => railroads.push(cell),
            LocClass::Utility => utilities.push(cell),
            _ => {}
        }
    }
    assert_eq!(board.railroad_positions(), railroads.as_slice());
    assert_eq!(board.utility_positions(), utilities.as_slice());
    assert_eq!(board.location_at(board.go_position()).unwrap().name, GO);
    assert_eq!(board.location_at(board.jail_position()).unwrap().name, JAIL);
    board.validate().expect("board validates");
}

#[test]
fn stretching_go_on_the_four_cell_board() {
    let mut board = four_cell_board();
    let mut log = RunLog::new("example");
    Novelty::Granularity {
        location: GO.to_string(),
        new_end_position: 5,
    }
    .apply(&mut board, &ExtensionRegistry::with_defaults(), &mut log)
    .unwrap();
    let expected: BTreeMap<String, (usize, usize)> = [
        ("A", (0, 1)),
        (GO, (1, 5)),
        ("B", (5, 6)),
        (JAIL, (6, 7)),
    ]
    .into_iter()
    .map(|(name, range)| (name.to_string(), range))
    .collect();
    assert_eq!(board.len(), 7);
    assert_eq!(positions(&board), expected);
    assert_eq!(board.go_position(), 1);
    assert_eq!(board.jail_position(), 6);
    assert_eq!(
        board.active_topology(),
        Some(&TopologyNovelty::Granularity {
            location: GO.to_string()
        })
    );
    assert_layout_invariants(&board);
}

#[test]
fn classic_board_satisfies_layout_invariants() {
    let board = classic();
    assert_eq!(board.len(), 40);
    assert_eq!(board.railroad_positions(), &[5, 15, 25, 35]);
    assert_eq!(board.utility_positions(), &[12, 28]);
    assert_eq!(board.jail_position(), 10);
    assert_layout_invariants(&board);
}

#[test]
fn identity_reordering_changes_nothing() {
    let mut board = classic();
    let before = positions(&board);
    let order = board.location_names();
    board.global_reordering(&order).unwrap();
    assert_eq!(positions(&board), before);
    board.global_reordering(&order).unwrap();
    assert_eq!(positions(&board), before);
}

#[test]
fn reversal_preserves_names_and_spans() {
    let mut board = classic();
    board.granularity_novelty("Short Line", 37).unwrap();
    let spans: BTreeMap<String, usize> = board
        .locations_in_order()
        .into_iter()
        .map(|loc| (loc.name.clone(), loc.span()))
        .collect();

    let mut order = board.location_names();
    order.reverse();
    board.global_reordering(&order).unwrap();

    let after: BTreeMap<String, usize> = board
        .locations_in_order()
        .into_iter()
        .map(|loc| (loc.name.clone(), loc.span()))
        .collect();
    assert_eq!(after, spans);
    assert_eq!(board.location_names(), order);
    assert_eq!(board.location_at(0).unwrap().name, "Boardwalk");
    assert_eq!(board.go_position(), board.len() - 1);
    assert_layout_invariants(&board);
}

#[test]
fn no_op_granularity_leaves_layout_untouched() {
    let mut board = classic();
    for name in ["Go", "Reading Railroad", "Electric Company", "Boardwalk"] {
        let before = positions(&board);
        let railroads = board.railroad_positions().to_vec();
        let end = board.location(name).unwrap().end_position;
        board.granularity_novelty(name, end).unwrap();
        assert_eq!(positions(&board), before, "{name}");
        assert_eq!(board.railroad_positions(), railroads.as_slice());
    }
}

#[test]
fn growing_by_k_shifts_only_later_locations() {
    for (name, k) in [
        ("Reading Railroad", 1),
        ("Water Works", 2),
        ("Go", 3),
        ("Boardwalk", 4),
    ] {
        let mut board = classic();
        let before = positions(&board);
        let (start, end) = before[name];
        board.granularity_novelty(name, end + k).unwrap();
        assert_eq!(board.len(), 40 + k, "{name}");
        for (other, (old_start, old_end)) in &before {
            let now = positions(&board)[other.as_str()];
            if other == name {
                assert_eq!(now, (start, end + k));
            } else if *old_start > start {
                assert_eq!(now, (old_start + k, old_end + k), "{other} after {name}");
            } else {
                assert_eq!(now, (*old_start, *old_end), "{other} before {name}");
            }
        }
        assert_layout_invariants(&board);
    }
}

#[test]
fn collapse_and_shrink_keep_requested_span() {
    let mut board = classic();
    board.granularity_novelty("B&O Railroad", 29).unwrap();
    assert_eq!(board.location("B&O Railroad").unwrap().span(), 4);
    assert_eq!(board.railroad_positions(), &[5, 15, 25, 26, 27, 28, 38]);

    board.granularity_novelty("B&O Railroad", 27).unwrap();
    assert_eq!(board.location("B&O Railroad").unwrap().span(), 2);
    assert_eq!(board.len(), 41);

    board.granularity_novelty("B&O Railroad", 25).unwrap();
    assert_eq!(board.location("B&O Railroad").unwrap().span(), 1);
    assert_eq!(board.len(), 40);
    assert_eq!(board.railroad_positions(), &[5, 15, 25, 35]);
    assert_layout_invariants(&board);
}

#[test]
fn color_reordering_then_granularity_stays_consistent() {
    let mut board = classic();
    let mut log = RunLog::new("mixed");
    let registry = ExtensionRegistry::with_defaults();
    Novelty::ColorReordering {
        color: "Orange".to_string(),
        locations: vec![
            "New York Avenue".to_string(),
            "St. James Place".to_string(),
            "Tennessee Avenue".to_string(),
        ],
    }
    .apply(&mut board, &registry, &mut log)
    .unwrap();
    assert_eq!(board.location_at(16).unwrap().name, "New York Avenue");
    assert_eq!(board.location_at(18).unwrap().name, "St. James Place");
    assert_eq!(board.location_at(19).unwrap().name, "Tennessee Avenue");
    assert_eq!(board.location_at(17).unwrap().name, "Community Chest 2");

    Novelty::Granularity {
        location: "Electric Company".to_string(),
        new_end_position: 15,
    }
    .apply(&mut board, &registry, &mut log)
    .unwrap();
    assert_eq!(board.utility_positions(), &[12, 13, 14, 30]);
    assert_eq!(board.location_at(18).unwrap().name, "New York Avenue");
    assert_layout_invariants(&board);
}

#[test]
fn rejected_topology_leaves_board_and_session_untouched() {
    let mut board = classic();
    let mut log = RunLog::new("rejected");
    let registry = ExtensionRegistry::with_defaults();
    let before = board.fingerprint();
    let mut order = board.location_names();
    order.pop();
    let err = Novelty::GlobalReordering { sequence: order }
        .apply(&mut board, &registry, &mut log)
        .unwrap_err();
    assert!(matches!(err.source, BoardError::Validation(_)));
    assert_eq!(board.fingerprint(), before);
    assert_eq!(board.active_topology(), None);

    let full = board.location_names();
    Novelty::GlobalReordering { sequence: full }
        .apply(&mut board, &registry, &mut log)
        .unwrap();
    assert_eq!(board.active_topology(), Some(&TopologyNovelty::GlobalReordering));
}
