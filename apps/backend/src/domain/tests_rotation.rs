use proptest::prelude::*;

use crate::domain::state::{index_offset, next_index, next_unattempted, TeamId};

fn roster(n: usize) -> Vec<TeamId> {
    (1..=n as i64).collect()
}

#[test]
fn next_index_wraps_at_roster_end() {
    assert_eq!(next_index(0, 3), 1);
    assert_eq!(next_index(1, 3), 2);
    assert_eq!(next_index(2, 3), 0);
    assert_eq!(next_index(0, 1), 0);
}

#[test]
fn next_unattempted_skips_teams_that_already_tried() {
    let teams = roster(4);
    // Teams 2 and 3 already attempted; from index 0 the scan lands on team 4.
    assert_eq!(next_unattempted(&teams, &[2, 3], 0), Some((3, 4)));
}

#[test]
fn next_unattempted_wraps_past_the_end() {
    let teams = roster(3);
    // From the last index with only team 2 attempted, the scan wraps to team 1.
    assert_eq!(next_unattempted(&teams, &[2, 3], 2), Some((0, 1)));
}

#[test]
fn next_unattempted_is_none_when_everyone_tried() {
    let teams = roster(3);
    assert_eq!(next_unattempted(&teams, &[1, 2, 3], 1), None);
}

#[test]
fn next_unattempted_never_returns_the_origin_when_it_attempted() {
    let teams = roster(2);
    // Team 1 attempted and passed from index 0; only team 2 remains.
    assert_eq!(next_unattempted(&teams, &[1], 0), Some((1, 2)));
}

proptest! {
    /// Stepping n times from any index visits every index exactly once.
    #[test]
    fn rotation_covers_the_roster(start in 0usize..8, n in 1usize..8) {
        let start = start % n;
        let mut seen = vec![false; n];
        let mut idx = start;
        for _ in 0..n {
            prop_assert!(!seen[idx]);
            seen[idx] = true;
            idx = next_index(idx, n);
        }
        prop_assert_eq!(idx, start);
        prop_assert!(seen.iter().all(|&s| s));
    }

    /// The scan result is always a team outside the attempted set, and
    /// `None` exactly when the attempted set covers the roster.
    #[test]
    fn scan_result_is_unattempted(
        n in 1usize..8,
        from in 0usize..8,
        mask in proptest::collection::vec(any::<bool>(), 8),
    ) {
        let teams = roster(n);
        let from = from % n;
        let attempted: Vec<TeamId> = teams
            .iter()
            .zip(&mask)
            .filter(|(_, &m)| m)
            .map(|(&t, _)| t)
            .collect();
        match next_unattempted(&teams, &attempted, from) {
            Some((idx, team)) => {
                prop_assert_eq!(teams[idx], team);
                prop_assert!(!attempted.contains(&team));
            }
            None => prop_assert_eq!(attempted.len(), n),
        }
    }

    #[test]
    fn offset_stays_in_bounds(idx in 0usize..16, delta in 0usize..32, n in 1usize..8) {
        prop_assert!(index_offset(idx % n, delta, n) < n);
    }
}
