//! Playback planning
//!
//! A plan is `repeat_count` rounds, each a fresh shuffle of every pair index.
//! When a round would open with the pair that closed the previous round, its
//! first two entries are swapped. That single swap is the only anti-repeat
//! measure; with one pair the repeat is unavoidable.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{FlashtapeError, Result};

/// Immutable playback order of clip-pair indices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPlan")]
pub struct PlaybackPlan {
    clip_count: usize,
    repeat_count: usize,
    seed: u64,
    order: Vec<usize>,
}

/// Unchecked plan as read from JSON
#[derive(Deserialize)]
struct RawPlan {
    clip_count: usize,
    repeat_count: usize,
    seed: u64,
    order: Vec<usize>,
}

impl TryFrom<RawPlan> for PlaybackPlan {
    type Error = FlashtapeError;

    fn try_from(raw: RawPlan) -> Result<Self> {
        PlaybackPlan::from_order(raw.clip_count, raw.repeat_count, raw.seed, raw.order)
    }
}

impl PlaybackPlan {
    /// Plan `repeat_count` shuffled rounds over `clip_count` pairs
    ///
    /// # Errors
    /// * `InvalidArgument` - If `clip_count` is 0 or `repeat_count` is below 1
    pub fn generate(clip_count: usize, repeat_count: usize, seed: Option<u64>) -> Result<Self> {
        SequencePlanner::new(seed).plan(clip_count, repeat_count)
    }

    /// Build a plan from an explicit order
    ///
    /// # Errors
    /// * `InvalidArgument` - If the counts are out of range, the order has the
    ///   wrong length, or a round is not a permutation of `0..clip_count`
    pub fn from_order(
        clip_count: usize,
        repeat_count: usize,
        seed: u64,
        order: Vec<usize>,
    ) -> Result<Self> {
        let expected = planned_len(clip_count, repeat_count)?;
        if order.len() != expected {
            return Err(FlashtapeError::invalid(
                "order",
                format!(
                    "expected {} entries ({} pairs x {} rounds), got {}",
                    expected,
                    clip_count,
                    repeat_count,
                    order.len()
                ),
            ));
        }

        for (r, round) in order.chunks(clip_count).enumerate() {
            let mut seen = vec![false; clip_count];
            for &index in round {
                if index >= clip_count || seen[index] {
                    return Err(FlashtapeError::invalid(
                        "order",
                        format!(
                            "round {} is not a permutation of 0..{}: {:?}",
                            r + 1,
                            clip_count,
                            round
                        ),
                    ));
                }
                seen[index] = true;
            }
        }

        Ok(Self {
            clip_count,
            repeat_count,
            seed,
            order,
        })
    }

    /// Pair indices in playback order
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clip_count(&self) -> usize {
        self.clip_count
    }

    pub fn repeat_count(&self) -> usize {
        self.repeat_count
    }

    /// Seed the shuffle was drawn from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Iterate over rounds, each a permutation of `0..clip_count`
    pub fn rounds(&self) -> impl Iterator<Item = &[usize]> {
        self.order.chunks(self.clip_count)
    }
}

/// Seeded shuffle planner
pub struct SequencePlanner {
    seed: u64,
    rng: ChaCha8Rng,
}

impl SequencePlanner {
    /// Create a planner; without a seed a random one is drawn
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn plan(&mut self, clip_count: usize, repeat_count: usize) -> Result<PlaybackPlan> {
        let mut order = Vec::with_capacity(planned_len(clip_count, repeat_count)?);
        for _ in 0..repeat_count {
            let mut round: Vec<usize> = (0..clip_count).collect();
            round.shuffle(&mut self.rng);
            append_round(&mut order, round);
        }

        log::debug!(
            "Planned {} entries ({} pairs x {} rounds, seed {})",
            order.len(),
            clip_count,
            repeat_count,
            self.seed
        );

        Ok(PlaybackPlan {
            clip_count,
            repeat_count,
            seed: self.seed,
            order,
        })
    }
}

/// Total entries for `repeat_count` rounds of `clip_count` pairs
fn planned_len(clip_count: usize, repeat_count: usize) -> Result<usize> {
    if clip_count == 0 {
        return Err(FlashtapeError::invalid("clip_count", "there are no clip pairs to play"));
    }
    if repeat_count < 1 {
        return Err(FlashtapeError::invalid(
            "repeat_count",
            format!("must be at least 1, got {}", repeat_count),
        ));
    }
    clip_count.checked_mul(repeat_count).ok_or_else(|| {
        FlashtapeError::invalid(
            "repeat_count",
            format!("{} pairs x {} rounds is too long a plan", clip_count, repeat_count),
        )
    })
}

/// Append a round, swapping its first two entries if it would repeat the last one played
fn append_round(order: &mut Vec<usize>, mut round: Vec<usize>) {
    if let (Some(&last), Some(&first)) = (order.last(), round.first()) {
        if first == last && round.len() > 1 {
            round.swap(0, 1);
        }
    }
    order.extend(round);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn is_permutation(round: &[usize], n: usize) -> bool {
        let mut sorted = round.to_vec();
        sorted.sort_unstable();
        sorted == (0..n).collect::<Vec<_>>()
    }

    #[test_case(1, 1 ; "single pair single round")]
    #[test_case(1, 5 ; "single pair many rounds")]
    #[test_case(2, 3 ; "two pairs")]
    #[test_case(7, 1 ; "one round")]
    #[test_case(10, 4 ; "typical deck")]
    #[test_case(50, 3 ; "large deck")]
    fn test_plan_completeness(n: usize, repeats: usize) {
        for seed in 0..20 {
            let plan = PlaybackPlan::generate(n, repeats, Some(seed)).unwrap();
            assert_eq!(plan.len(), n * repeats);
            assert_eq!(plan.rounds().count(), repeats);
            for round in plan.rounds() {
                assert!(is_permutation(round, n), "not a permutation: {:?}", round);
            }
        }
    }

    #[test]
    fn test_invalid_arguments() {
        let err = PlaybackPlan::generate(0, 2, Some(1)).unwrap_err();
        assert!(matches!(err, FlashtapeError::InvalidArgument { .. }));

        let err = PlaybackPlan::generate(3, 0, Some(1)).unwrap_err();
        assert!(matches!(err, FlashtapeError::InvalidArgument { .. }));
    }

    #[test]
    fn test_same_seed_same_plan() {
        let a = PlaybackPlan::generate(12, 3, Some(42)).unwrap();
        let b = PlaybackPlan::generate(12, 3, Some(42)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.seed(), 42);
    }

    #[test]
    fn test_unseeded_plan_records_its_seed() {
        let plan = PlaybackPlan::generate(8, 2, None).unwrap();
        let replay = PlaybackPlan::generate(8, 2, Some(plan.seed())).unwrap();
        assert_eq!(plan, replay);
    }

    #[test]
    fn test_append_round_swaps_on_repeat() {
        let mut order = vec![0, 1, 2];
        append_round(&mut order, vec![2, 0, 1]);
        assert_eq!(order, vec![0, 1, 2, 0, 2, 1]);
    }

    #[test]
    fn test_append_round_leaves_distinct_boundary() {
        let mut order = vec![0, 1, 2];
        append_round(&mut order, vec![1, 2, 0]);
        assert_eq!(order, vec![0, 1, 2, 1, 2, 0]);
    }

    #[test]
    fn test_single_pair_cannot_avoid_repeat() {
        let plan = PlaybackPlan::generate(1, 3, Some(7)).unwrap();
        assert_eq!(plan.order(), &[0, 0, 0]);
    }

    #[test]
    fn test_boundary_swap_applied_to_naive_shuffle() {
        // Replay the same random stream without the swap rule and compare
        let mut collisions = 0;
        for seed in 0..200 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let naive: Vec<Vec<usize>> = (0..2)
                .map(|_| {
                    let mut round: Vec<usize> = (0..2).collect();
                    round.shuffle(&mut rng);
                    round
                })
                .collect();

            let plan = PlaybackPlan::generate(2, 2, Some(seed)).unwrap();
            let order = plan.order();
            assert_eq!(&order[..2], naive[0].as_slice());

            if naive[0][1] == naive[1][0] {
                collisions += 1;
                assert_ne!(order[2], naive[1][0]);
                assert_eq!(&order[2..], &[naive[1][1], naive[1][0]]);
            } else {
                assert_eq!(&order[2..], naive[1].as_slice());
            }
            assert_ne!(order[1], order[2]);
        }
        assert!(collisions > 0, "no seed produced a boundary repeat");
    }

    #[test]
    fn test_no_adjacent_repeat_across_boundaries() {
        for seed in 0..50 {
            let plan = PlaybackPlan::generate(5, 6, Some(seed)).unwrap();
            for r in 1..plan.repeat_count() {
                let boundary = r * plan.clip_count();
                assert_ne!(plan.order()[boundary - 1], plan.order()[boundary]);
            }
        }
    }

    #[test]
    fn test_oversized_plan_rejected() {
        let err = PlaybackPlan::generate(usize::MAX, 2, Some(1)).unwrap_err();
        assert!(matches!(err, FlashtapeError::InvalidArgument { .. }));
    }

    #[test]
    fn test_from_order_accepts_permutations() {
        let plan = PlaybackPlan::from_order(3, 2, 0, vec![2, 0, 1, 1, 2, 0]).unwrap();
        assert_eq!(plan.order(), &[2, 0, 1, 1, 2, 0]);
        assert_eq!(plan.rounds().count(), 2);
    }

    #[test_case(0, 1, vec![0] ; "zero pairs")]
    #[test_case(2, 0, vec![] ; "zero rounds")]
    #[test_case(3, 1, vec![0, 1] ; "short order")]
    #[test_case(3, 1, vec![0, 1, 3] ; "index out of range")]
    #[test_case(3, 1, vec![0, 1, 1] ; "duplicate in round")]
    #[test_case(2, 2, vec![0, 1, 0, 0] ; "second round not a permutation")]
    fn test_from_order_rejects(clip_count: usize, repeat_count: usize, order: Vec<usize>) {
        let err = PlaybackPlan::from_order(clip_count, repeat_count, 0, order).unwrap_err();
        assert!(matches!(err, FlashtapeError::InvalidArgument { .. }));
    }

    #[test]
    fn test_invalid_json_plan_rejected() {
        let zero = r#"{"clip_count":0,"repeat_count":1,"seed":1,"order":[0]}"#;
        assert!(serde_json::from_str::<PlaybackPlan>(zero).is_err());

        let out_of_range = r#"{"clip_count":2,"repeat_count":1,"seed":1,"order":[0,5]}"#;
        assert!(serde_json::from_str::<PlaybackPlan>(out_of_range).is_err());
    }

    #[test]
    fn test_plan_serializes_to_json() {
        let plan = PlaybackPlan::generate(3, 2, Some(9)).unwrap();
        let json = serde_json::to_string(&plan).unwrap();
        let back: PlaybackPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(plan, back);
    }
}
