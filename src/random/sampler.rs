use tracing::warn;

use crate::{
    error::{DescentError, Result},
    random::RngState,
    sets::heap::PointId,
};

/// Draws `n` pairwise-distinct integers from `0..pool` by rejection sampling.
///
/// Each draw is `next_int() mod pool` (floor modulo, so negative draws still
/// land in range) and is kept only if it was not already accepted in this
/// call. Acceptance is checked by a linear scan, which is cheap for the small
/// `n` used when seeding neighbor lists.
///
/// # Contract
/// The caller must guarantee `n <= pool`. With `n > pool` the loop can never
/// accept enough values and **does not terminate**. Use
/// [`try_rejection_sample`] when the sizes are not known to be compatible.
///
/// # Panics
/// Panics if `pool == 0` and `n > 0` (modulo by zero).
///
/// # Example
/// ```
/// use descent::random::{RngState, rejection_sample};
///
/// let mut state = RngState::new([12345, 67890, 13579]);
/// let picked = rejection_sample(5, 10, &mut state);
/// assert_eq!(picked, vec![1, 5, 0, 3, 2]);
/// ```
pub fn rejection_sample(n: usize, pool: usize, rng: &mut RngState) -> Vec<PointId> {
    let mut result: Vec<PointId> = Vec::with_capacity(n);
    while result.len() < n {
        let j = (rng.next_int() as i64).rem_euclid(pool as i64) as PointId;
        if !result.contains(&j) {
            result.push(j);
        }
    }
    result
}

/// Checked form of [`rejection_sample`]: refuses `n > pool` up front instead of
/// looping forever. The generator is left untouched on refusal.
pub fn try_rejection_sample(n: usize, pool: usize, rng: &mut RngState) -> Result<Vec<PointId>> {
    if n > pool {
        warn!(n, pool, "refusing a rejection sample larger than its pool");
        return Err(DescentError::SampleExceedsPool { n, pool });
    }
    Ok(rejection_sample(n, pool, rng))
}
