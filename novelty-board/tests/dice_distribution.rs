use novelty_board::{
    Board, BoardSchema, DiceStreams, Die, DieDistribution, DieType, ExtensionRegistry, Novelty,
    RunLog, biased_weights,
};
use std::collections::BTreeMap;
use std::convert::TryFrom;

const SAMPLE_SIZE: usize = 20_000;
const TOLERANCE: f64 = 0.02;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn frequencies(rolls: &[u32]) -> BTreeMap<u32, f64> {
    let total = f64::from(u32::try_from(rolls.len()).expect("sample fits u32"));
    let mut counts: BTreeMap<u32, u32> = BTreeMap::new();
    for roll in rolls {
        *counts.entry(*roll).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(face, count)| (face, f64::from(count) / total))
        .collect()
}

#[test]
fn biased_weights_are_face_over_sum() {
    let weights = biased_weights(&[1, 2, 3]);
    for (weight, expected) in weights.iter().zip([1.0 / 6.0, 2.0 / 6.0, 3.0 / 6.0]) {
        assert!((weight - expected).abs() < 1e-12, "{weights:?}");
    }
}

#[test]
fn biased_die_converges_to_its_weights() {
    init_logging();
    let registry = ExtensionRegistry::with_defaults();
    let die = Die::new(
        vec![1, 2, 3],
        DieDistribution::Biased,
        DieType::Consecutive,
        &registry,
    )
    .unwrap();
    let mut streams = DiceStreams::from_user_seed(0x5EED, 1);
    let rolls: Vec<u32> = (0..SAMPLE_SIZE)
        .map(|_| die.roll(streams.stream(0)))
        .collect();
    let observed = frequencies(&rolls);
    for (face, expected) in [(1, 1.0 / 6.0), (2, 2.0 / 6.0), (3, 3.0 / 6.0)] {
        let freq = observed.get(&face).copied().unwrap_or_default();
        assert!(
            (freq - expected).abs() <= TOLERANCE,
            "face {face} drifted: observed {freq:.4}, expected {expected:.4}"
        );
    }
}

#[test]
fn uniform_die_respects_type_filter() {
    let registry = ExtensionRegistry::with_defaults();
    let die = Die::new(
        vec![1, 2, 3, 4, 5, 6],
        DieDistribution::Uniform,
        DieType::EvenOnly,
        &registry,
    )
    .unwrap();
    let mut streams = DiceStreams::from_user_seed(7, 1);
    let rolls: Vec<u32> = (0..SAMPLE_SIZE)
        .map(|_| die.roll(streams.stream(0)))
        .collect();
    let observed = frequencies(&rolls);
    assert_eq!(observed.keys().copied().collect::<Vec<_>>(), vec![2, 4, 6]);
    for freq in observed.values() {
        assert!((freq - 1.0 / 3.0).abs() <= TOLERANCE, "{observed:?}");
    }
}

#[test]
fn streams_are_reproducible_per_seed() {
    let board = Board::from_schema(
        &BoardSchema::classic().unwrap(),
        &ExtensionRegistry::with_defaults(),
    )
    .unwrap();
    let mut first = DiceStreams::from_user_seed(42, board.dice().len());
    let mut second = DiceStreams::from_user_seed(42, board.dice().len());
    let a: Vec<Vec<u32>> = (0..50).map(|_| board.roll_dice(&mut first)).collect();
    let b: Vec<Vec<u32>> = (0..50).map(|_| board.roll_dice(&mut second)).collect();
    assert_eq!(a, b);
    assert!(a.iter().flatten().all(|face| (1..=6).contains(face)));

    let mut other = DiceStreams::from_user_seed(43, board.dice().len());
    let c: Vec<Vec<u32>> = (0..50).map(|_| board.roll_dice(&mut other)).collect();
    assert_ne!(a, c);
}

#[test]
fn distribution_novelty_switches_every_die_to_biased() {
    init_logging();
    let registry = ExtensionRegistry::with_defaults();
    let mut board = Board::from_schema(&BoardSchema::classic().unwrap(), &registry).unwrap();
    let mut log = RunLog::new("dice");
    Novelty::DieDistribution {
        die: None,
        distribution: DieDistribution::Biased,
    }
    .apply(&mut board, &registry, &mut log)
    .unwrap();
    Novelty::DieFaces {
        die: 0,
        faces: vec![1, 2, 3],
    }
    .apply(&mut board, &registry, &mut log)
    .unwrap();

    let mut streams = DiceStreams::from_user_seed(99, board.dice().len());
    let first_die: Vec<u32> = (0..SAMPLE_SIZE)
        .map(|_| board.roll_dice(&mut streams)[0])
        .collect();
    let observed = frequencies(&first_die);
    assert!((observed[&3] - 0.5).abs() <= TOLERANCE, "{observed:?}");
    assert!(board.dice().iter().all(|die| die.roll_strategy() == "biased_die_roll"));
}
