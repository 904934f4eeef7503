//! Feedback mask generation: binomial-approximated random literal sampling
//! plus the uniform draws used for patch and offending-literal selection.
//!
//! Grounded on `cb_initialize_random_streams` in the reference kernel: a
//! normal approximation to `Binomial(F, p)` picks how many literals to
//! flag, then that many distinct feature indices are drawn by rejection
//! sampling. The reference's `normal()` comes from a `fast_rand.h` this
//! pack's retrieval didn't keep; Box-Muller stands in for it here since
//! `embeddenator` reaches for plain `rand` rather than a distributions
//! crate for every other random draw in this codebase (see `vsa.rs`'s
//! `StdRng`/`SliceRandom` use).

use rand::Rng;

use crate::config::WORD_BITS;

/// Draw one standard-normal sample via Box-Muller.
///
/// Box-Muller naturally produces a pair; only the cosine branch is taken
/// since callers draw at most once per clause per feedback call and the
/// cost of discarding the sine branch is negligible next to the rejection
/// sampling that follows.
fn standard_normal(rng: &mut impl Rng) -> f64 {
    // `gen::<f64>()` is in [0, 1); nudge away from 0 so `ln` stays finite.
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Sample `feedback_to_ta`, a `num_chunks`-word mask where each of the
/// `num_features` literals is independently flagged with probability
/// `p = 1/s`, approximated by drawing a normal count and then choosing
/// that many distinct literals without replacement.
///
/// `mask` is fully overwritten (zeroed first), mirroring the `memset` in
/// `cb_initialize_random_streams` — callers must not rely on prior content.
pub fn sample_feedback_mask(rng: &mut impl Rng, num_features: usize, s: f64, mask: &mut [u32]) {
    mask.fill(0);

    let p = 1.0 / s;
    let mean = num_features as f64 * p;
    let variance = mean * (1.0 - p);
    let z = standard_normal(rng);
    let raw = mean + z * variance.sqrt();

    let active = if raw < 0.0 {
        0
    } else if raw > num_features as f64 {
        num_features
    } else {
        raw.round() as usize
    };

    let mut chosen = 0usize;
    while chosen < active {
        let f = rng.gen_range(0..num_features);
        let word = f / WORD_BITS as usize;
        let bit = f % WORD_BITS as usize;
        if mask[word] & (1 << bit) == 0 {
            mask[word] |= 1 << bit;
            chosen += 1;
        }
        // Collisions are retried — matches the rejection loop in
        // cb_initialize_random_streams rather than capping attempts.
    }
}

/// Uniformly pick one of `count` candidates (by index into whatever the
/// caller's candidate list is), as used for random patch selection in
/// [`crate::eval`] and random offending-literal tie-breaking in
/// [`crate::feedback`].
#[inline]
pub fn uniform_index(rng: &mut impl Rng, count: usize) -> usize {
    rng.gen_range(0..count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn mask_never_sets_bits_beyond_num_features() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let num_features = 20;
        let num_chunks = (num_features + 31) / 32;
        let mut mask = vec![0u32; num_chunks];

        for _ in 0..200 {
            sample_feedback_mask(&mut rng, num_features, 3.0, &mut mask);
            for f in num_features..num_chunks * 32 {
                let word = f / 32;
                let bit = f % 32;
                assert_eq!(mask[word] & (1 << bit), 0);
            }
        }
    }

    #[test]
    fn mask_overwrites_stale_content() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut mask = vec![u32::MAX; 1];
        sample_feedback_mask(&mut rng, 10, 1000.0, &mut mask);
        // s huge => p tiny => expected active count near 0, so most runs
        // clear far more bits than they set; stale all-ones must not survive.
        assert_ne!(mask[0], u32::MAX);
    }

    #[test]
    fn uniform_index_stays_in_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..1000 {
            let i = uniform_index(&mut rng, 7);
            assert!(i < 7);
        }
    }

    #[test]
    fn higher_specificity_yields_sparser_masks_on_average() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let num_features = 1000;
        let mut mask = vec![0u32; (num_features + 31) / 32];

        let mut total_sparse = 0u32;
        let mut total_dense = 0u32;
        for _ in 0..50 {
            sample_feedback_mask(&mut rng, num_features, 50.0, &mut mask);
            total_sparse += mask.iter().map(|w| w.count_ones()).sum::<u32>();
            sample_feedback_mask(&mut rng, num_features, 2.0, &mut mask);
            total_dense += mask.iter().map(|w| w.count_ones()).sum::<u32>();
        }
        assert!(total_sparse < total_dense);
    }
}
