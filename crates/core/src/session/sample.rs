use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::Question;

/// Draw up to `limit` questions uniformly at random, without replacement.
///
/// Duplicate ids in `pool` count once. The returned order is random and
/// independent of the pool's storage order.
pub fn sample_questions<R: Rng + ?Sized>(
    pool: Vec<Question>,
    limit: usize,
    rng: &mut R,
) -> Vec<Question> {
    let mut seen = HashSet::with_capacity(pool.len());
    let mut unique: Vec<Question> = pool.into_iter().filter(|q| seen.insert(q.id())).collect();
    unique.shuffle(rng);
    unique.truncate(limit);
    unique
}
