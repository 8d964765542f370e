mod common;

use common::{department, hard, overbooked, rng, tight_capacity, tree, tree_with};
use rstest::rstest;
use schedforge::model::{Assignment, Day, SlotId};
use schedforge::rules::ConstraintOracle;
use schedforge::search::{SearchLimits, SearchOutcome};
use std::time::{Duration, Instant};

fn slot_counts(a: &Assignment, slots: usize) -> Vec<usize> {
    let mut counts = vec![0; slots];
    for (_, s) in a.assigned() {
        counts[s.index()] += 1;
    }
    counts
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(42)]
#[case(1234)]
#[case(987_654_321)]
fn test_cold_start_is_fully_feasible(#[case] seed: u64) {
    let ctx = department().build();
    let oracle = hard(&ctx);
    let mut t = tree(&ctx);

    let found = t
        .search(ctx.initial(), &mut rng(seed))
        .unwrap()
        .found()
        .expect("department problem is solvable");

    assert!(found.is_complete());
    assert!(
        oracle.is_fully_feasible(&found),
        "violations: {:?}",
        oracle.violations(&found)
    );
}

#[test]
fn test_same_seed_same_schedule() {
    let ctx = department().build();
    let a = tree(&ctx).search(ctx.initial(), &mut rng(99)).unwrap();
    let b = tree(&ctx).search(ctx.initial(), &mut rng(99)).unwrap();
    assert_eq!(a, b, "Search must be reproducible for a fixed seed");
}

#[test]
fn test_reused_tree_is_reproducible() {
    let ctx = department().build();
    let mut t = tree(&ctx);
    let first = t.search(ctx.initial(), &mut rng(5)).unwrap();
    let _ = t.search(ctx.initial(), &mut rng(6)).unwrap();
    let again = t.search(ctx.initial(), &mut rng(5)).unwrap();
    assert_eq!(first, again);
}

#[test]
fn test_tight_capacity_is_never_exceeded() {
    let ctx = tight_capacity().build();
    let mut t = tree(&ctx);
    let maxes: Vec<usize> = ctx.slots().iter().map(|s| s.max).collect();

    for seed in 0..200 {
        let found = t
            .search(ctx.initial(), &mut rng(seed))
            .unwrap()
            .found()
            .expect("4 classes fit in 1 + 2 + 1 places");
        let counts = slot_counts(&found, ctx.slots().len());
        for (i, (&count, &max)) in counts.iter().zip(&maxes).enumerate() {
            assert!(count <= max, "seed {}: slot {} holds {} > {}", seed, i, count, max);
        }
    }
}

#[test]
fn test_partial_assignment_is_kept() {
    let ctx = department().build();
    let fixed = ctx.class_index("CPSC 231 LEC 01").unwrap();
    let slot = ctx
        .find_slot(schedforge::model::SlotKind::Course, Day::Monday, 8 * 60)
        .unwrap();

    for seed in 0..20 {
        let found = tree(&ctx)
            .search(ctx.initial(), &mut rng(seed))
            .unwrap()
            .found()
            .unwrap();
        assert_eq!(found.get(fixed), Some(slot));
    }
}

#[test]
fn test_evening_section_lands_in_evening_slot() {
    let ctx = department().build();
    let evening = ctx.class_index("CPSC 441 LEC 90").unwrap();
    let found = tree(&ctx)
        .search(ctx.initial(), &mut rng(3))
        .unwrap()
        .found()
        .unwrap();
    let slot = ctx.slot(found.get(evening).unwrap());
    assert!(slot.is_evening());
}

#[test]
fn test_unsolvable_problem_is_exhausted() {
    let ctx = overbooked().build();
    let mut t = tree(&ctx);
    let outcome = t.search(ctx.initial(), &mut rng(1)).unwrap();

    assert_eq!(outcome, SearchOutcome::Exhausted);
    assert_eq!(t.frontier_len(), 0);
    assert!(t.stats().dead_ends > 0);
}

#[test]
fn test_infeasible_start_is_exhausted_without_expanding() {
    let ctx = tight_capacity().build();
    // Two classes in the single-place slot.
    let mut start = ctx.initial().clone();
    start.set(0, Some(SlotId(0)));
    start.set(1, Some(SlotId(0)));

    let mut t = tree(&ctx);
    let outcome = t.search(&start, &mut rng(1)).unwrap();
    assert_eq!(outcome, SearchOutcome::Exhausted);
    assert_eq!(t.stats().expansions, 0);
}

#[test]
fn test_wrong_length_is_an_error() {
    let ctx = department().build();
    let result = tree(&ctx).search(&Assignment::unassigned(3), &mut rng(1));
    assert!(result.is_err());
}

#[test]
fn test_small_cap_never_reports_a_larger_frontier() {
    let ctx = department().build();
    let oracle = hard(&ctx);
    let limits = SearchLimits::builder()
        .frontier_cap(12)
        .max_restarts(10_000)
        .build();
    let mut t = tree_with(&ctx, limits);

    for seed in 0..10 {
        let outcome = t.search(ctx.initial(), &mut rng(seed)).unwrap();
        assert!(t.stats().peak_frontier <= 12);
        if let SearchOutcome::Found(a) = outcome {
            assert!(oracle.is_fully_feasible(&a));
        }
    }
}

#[test]
fn test_expired_deadline_stops_immediately() {
    let ctx = department().build();
    let limits = SearchLimits::builder()
        .deadline(Instant::now() - Duration::from_millis(1))
        .build();
    let mut t = tree_with(&ctx, limits);
    let outcome = t.search(ctx.initial(), &mut rng(1)).unwrap();
    assert_eq!(outcome, SearchOutcome::Exhausted);
    assert_eq!(t.stats().expansions, 0);
}

#[test]
fn test_altern_only_yields_viable_children() {
    let ctx = tight_capacity().build();
    let oracle = hard(&ctx);
    let t = tree(&ctx);

    let mut partial = ctx.initial().clone();
    partial.set(0, Some(SlotId(0)));
    // Slot 0 is full, so class 1 can only go to slots 1 or 2.
    let children = t.altern(&partial, 1);
    assert_eq!(children.len(), 2);
    for child in &children {
        assert!(oracle.is_partially_feasible(child));
        assert_ne!(child.get(1), Some(SlotId(0)));
    }
}
