//! Outer drivers (§4.7 `BankOps`): the [`ClauseBank`] type owning the state
//! arrays, offsetting into them per clause, and exposing the five
//! operations from §2 as methods.
//!
//! Mirrors how `embeddenator`'s `BlockSparseTritVec` (`block_sparse.rs`)
//! owns its backing storage and validates call-boundary preconditions with
//! `assert!`/`debug_assert!` rather than threading `Result` through every
//! hot-path call — per §7, the only recoverable error here is bad
//! construction parameters, handled in [`ClauseBankConfig::validate`].

use rand::Rng;

use crate::config::ClauseBankConfig;
use crate::error::ClauseBankError;
use crate::{bitops, eval, feedback};

#[cfg(feature = "logging")]
use tracing::trace;

/// A bit-packed bank of `C` clauses, each `K = ceil(F / 32)` chunks of
/// Tsetlin-automaton state, evaluated and trained against patches of a
/// structured example.
///
/// Allocated zero-initialized (§3 Lifecycle): action bits start at `0`
/// (all-exclude) by convention, `ind_state` and `clause_and_target` start
/// empty/all-zero. All operations are in-place; there is no serialization
/// surface here — that is the external driver's responsibility.
pub struct ClauseBank {
    config: ClauseBankConfig,
    num_chunks: usize,
    filter: u32,
    ta_state: Vec<u32>,
    ind_state: Vec<u32>,
    clause_and_target: Vec<u32>,
}

impl ClauseBank {
    /// Construct a zero-initialized bank, validating `config` (§7, §10.2).
    pub fn new(config: ClauseBankConfig) -> Result<Self, ClauseBankError> {
        config.validate()?;

        let num_chunks = config.num_chunks();
        let filter = config.tail_filter();

        let ta_len = config.num_clauses * num_chunks * config.num_state_bits_ta as usize;
        let ind_len = config.num_clauses * num_chunks * config.num_state_bits_ind as usize;
        let cat_len = config.num_clauses * num_chunks;

        Ok(Self {
            config,
            num_chunks,
            filter,
            ta_state: vec![0; ta_len],
            ind_state: vec![0; ind_len],
            clause_and_target: vec![0; cat_len],
        })
    }

    /// The bank's immutable parameters.
    #[inline]
    pub fn config(&self) -> &ClauseBankConfig {
        &self.config
    }

    /// `K = ceil(F / 32)`, the number of chunks per clause.
    #[inline]
    pub fn num_chunks(&self) -> usize {
        self.num_chunks
    }

    /// The tail-chunk word mask (§3).
    #[inline]
    pub fn filter(&self) -> u32 {
        self.filter
    }

    /// Read-only access to the full TA state array, `[clause][chunk][bitplane]`.
    #[inline]
    pub fn ta_state(&self) -> &[u32] {
        &self.ta_state
    }

    /// Read-only access to the full inclusion-indicator state array.
    #[inline]
    pub fn ind_state(&self) -> &[u32] {
        &self.ind_state
    }

    /// Read-only access to the Type III polarity ledger, `[clause][chunk]`.
    #[inline]
    pub fn clause_and_target(&self) -> &[u32] {
        &self.clause_and_target
    }

    /// Mutable access to the full TA state array — for driver-side bank
    /// initialization (e.g. seeding non-default starting states). Ordinary
    /// training never needs this; prefer the feedback operations.
    #[inline]
    pub fn ta_state_mut(&mut self) -> &mut [u32] {
        &mut self.ta_state
    }

    #[inline]
    fn ta_stride(&self) -> usize {
        self.num_chunks * self.config.num_state_bits_ta as usize
    }

    #[inline]
    fn ind_stride(&self) -> usize {
        self.num_chunks * self.config.num_state_bits_ind as usize
    }

    fn assert_xi_len(&self, xi: &[u32]) {
        assert_eq!(
            xi.len(),
            self.config.num_patches * self.num_chunks,
            "Xi must have num_patches * num_chunks words"
        );
    }

    fn assert_literal_active_len(&self, literal_active: &[u32]) {
        assert_eq!(
            literal_active.len(),
            self.num_chunks,
            "literal_active must have num_chunks words"
        );
    }

    fn assert_clause_active_len(&self, clause_active: &[bool]) {
        assert_eq!(
            clause_active.len(),
            self.config.num_clauses,
            "clause_active must have num_clauses entries"
        );
    }

    /// §2.1 **PredictEval**: one clause-vote bit per clause, honoring the
    /// all-exclude guard (§4.3).
    pub fn predict_eval(&self, xi: &[u32], clause_output: &mut [bool]) {
        self.assert_xi_len(xi);
        assert_eq!(clause_output.len(), self.config.num_clauses);

        #[cfg(feature = "logging")]
        trace!(clauses = self.config.num_clauses, patches = self.config.num_patches, "predict_eval");

        let stride = self.ta_stride();
        let b_ta = self.config.num_state_bits_ta as usize;
        for j in 0..self.config.num_clauses {
            let column = &self.ta_state[j * stride..(j + 1) * stride];
            clause_output[j] = eval::predict_eval(
                column,
                self.num_chunks,
                b_ta,
                self.filter,
                self.config.num_patches,
                xi,
            );
        }
    }

    /// §2.2 **UpdateEval**: like `PredictEval` but honoring `literal_active`
    /// and without the all-exclude guard.
    pub fn update_eval(&self, xi: &[u32], literal_active: &[u32], clause_output: &mut [bool]) {
        self.assert_xi_len(xi);
        self.assert_literal_active_len(literal_active);
        assert_eq!(clause_output.len(), self.config.num_clauses);

        #[cfg(feature = "logging")]
        trace!(clauses = self.config.num_clauses, "update_eval");

        let stride = self.ta_stride();
        let b_ta = self.config.num_state_bits_ta as usize;
        for j in 0..self.config.num_clauses {
            let column = &self.ta_state[j * stride..(j + 1) * stride];
            clause_output[j] = eval::update_eval(
                column,
                self.num_chunks,
                b_ta,
                self.filter,
                self.config.num_patches,
                literal_active,
                xi,
            );
        }
    }

    /// §2.3 **PatchwiseEval**: one output bit per (clause, patch), row-major
    /// `[clause][patch]`.
    pub fn patchwise_eval(&self, xi: &[u32], output: &mut [bool]) {
        self.assert_xi_len(xi);
        assert_eq!(output.len(), self.config.num_clauses * self.config.num_patches);

        #[cfg(feature = "logging")]
        trace!(clauses = self.config.num_clauses, "patchwise_eval");

        let stride = self.ta_stride();
        let b_ta = self.config.num_state_bits_ta as usize;
        let p = self.config.num_patches;
        for j in 0..self.config.num_clauses {
            let column = &self.ta_state[j * stride..(j + 1) * stride];
            let out_row = &mut output[j * p..(j + 1) * p];
            eval::patchwise_eval(column, self.num_chunks, b_ta, self.filter, p, xi, out_row);
        }
    }

    /// §2.5 **LiteralFrequency**: count inclusion of each literal across
    /// all clauses (top bit-plane set bits).
    pub fn literal_frequency(&self, literal_count: &mut [u32]) {
        assert_eq!(literal_count.len(), self.config.num_features);

        #[cfg(feature = "logging")]
        trace!(clauses = self.config.num_clauses, "literal_frequency");

        literal_count.fill(0);
        let stride = self.ta_stride();
        let b_ta = self.config.num_state_bits_ta as usize;
        for j in 0..self.config.num_clauses {
            let column = &self.ta_state[j * stride..(j + 1) * stride];
            for f in 0..self.config.num_features {
                let chunk = f / 32;
                let bit = f % 32;
                let action = bitops::top_plane(column, b_ta, chunk);
                if action & (1 << bit) != 0 {
                    literal_count[f] += 1;
                }
            }
        }
    }

    /// §4.4 **Feedback I**: reward-or-erode, gated per clause by
    /// `clause_active` and the `update_p` Bernoulli draw.
    pub fn feedback_i(
        &mut self,
        xi: &[u32],
        literal_active: &[u32],
        clause_active: &[bool],
        rng: &mut impl Rng,
    ) {
        self.assert_xi_len(xi);
        self.assert_literal_active_len(literal_active);
        self.assert_clause_active_len(clause_active);

        let stride = self.ta_stride();
        let b_ta = self.config.num_state_bits_ta as usize;
        let mut patch_scratch = vec![0usize; self.config.num_patches];
        let mut mask_scratch = vec![0u32; self.num_chunks];
        let mut applied = 0usize;

        for j in 0..self.config.num_clauses {
            if !clause_active[j] || rng.gen::<f64>() > self.config.update_p {
                continue;
            }
            applied += 1;
            let column = &mut self.ta_state[j * stride..(j + 1) * stride];
            feedback::feedback_i(
                column,
                self.num_chunks,
                b_ta,
                self.filter,
                self.config.num_patches,
                self.config.num_features,
                self.config.s,
                self.config.boost_true_positive_feedback,
                literal_active,
                xi,
                &mut patch_scratch,
                &mut mask_scratch,
                rng,
            );
        }

        #[cfg(feature = "logging")]
        trace!(applied, "feedback_i");
    }

    /// §4.5 **Feedback II**: falsity-sharpening.
    pub fn feedback_ii(
        &mut self,
        xi: &[u32],
        literal_active: &[u32],
        clause_active: &[bool],
        rng: &mut impl Rng,
    ) {
        self.assert_xi_len(xi);
        self.assert_literal_active_len(literal_active);
        self.assert_clause_active_len(clause_active);

        let stride = self.ta_stride();
        let b_ta = self.config.num_state_bits_ta as usize;
        let mut patch_scratch = vec![0usize; self.config.num_patches];
        let mut applied = 0usize;

        for j in 0..self.config.num_clauses {
            if !clause_active[j] || rng.gen::<f64>() > self.config.update_p {
                continue;
            }
            applied += 1;
            let column = &mut self.ta_state[j * stride..(j + 1) * stride];
            feedback::feedback_ii(
                column,
                self.num_chunks,
                b_ta,
                self.filter,
                self.config.num_patches,
                literal_active,
                xi,
                &mut patch_scratch,
                rng,
            );
        }

        #[cfg(feature = "logging")]
        trace!(applied, "feedback_ii");
    }

    /// §4.6 **Feedback III**: meta-inclusion with polarity ledger. Unlike
    /// Types I/II, the `update_p` gate here only covers the final TA-state
    /// decrement — the inclusion-indicator update and literal inversion run
    /// for every active clause regardless.
    pub fn feedback_iii(
        &mut self,
        xi: &[u32],
        literal_active: &[u32],
        clause_active: &[bool],
        target: bool,
        rng: &mut impl Rng,
    ) {
        self.assert_xi_len(xi);
        self.assert_literal_active_len(literal_active);
        self.assert_clause_active_len(clause_active);

        let ta_stride = self.ta_stride();
        let ind_stride = self.ind_stride();
        let b_ta = self.config.num_state_bits_ta as usize;
        let b_ind = self.config.num_state_bits_ind as usize;
        let mut patch_scratch = vec![0usize; self.config.num_patches];
        let mut touched = 0usize;

        for j in 0..self.config.num_clauses {
            if !clause_active[j] {
                continue;
            }
            touched += 1;
            let ta_column = &mut self.ta_state[j * ta_stride..(j + 1) * ta_stride];
            let ind_column = &mut self.ind_state[j * ind_stride..(j + 1) * ind_stride];
            let cat_row = &mut self.clause_and_target[j * self.num_chunks..(j + 1) * self.num_chunks];

            feedback::feedback_iii(
                ta_column,
                ind_column,
                cat_row,
                self.num_chunks,
                b_ta,
                b_ind,
                self.filter,
                self.config.num_patches,
                self.config.update_p,
                self.config.d,
                target,
                literal_active,
                xi,
                &mut patch_scratch,
                rng,
            );
        }

        #[cfg(feature = "logging")]
        trace!(touched, target, "feedback_iii");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn config(num_features: usize, num_clauses: usize, num_patches: usize) -> ClauseBankConfig {
        ClauseBankConfig {
            num_features,
            num_clauses,
            num_patches,
            num_state_bits_ta: 8,
            num_state_bits_ind: 8,
            s: 3.0,
            d: 2.0,
            update_p: 1.0,
            boost_true_positive_feedback: false,
        }
    }

    /// Invariant 3: an inactive clause's state must be untouched by any
    /// feedback call.
    #[test]
    fn inactive_clause_is_unchanged_by_all_feedback_rules() {
        let bank_cfg = config(16, 4, 3);
        let mut bank = ClauseBank::new(bank_cfg).unwrap();
        let num_chunks = bank.num_chunks();

        let xi = vec![0xFFFF_FFFFu32; 3 * num_chunks];
        let literal_active = vec![0xFFFF_FFFFu32; num_chunks];
        let clause_active = vec![false; 4]; // nobody active
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let before_ta = bank.ta_state().to_vec();
        let before_ind = bank.ind_state().to_vec();
        let before_cat = bank.clause_and_target().to_vec();

        bank.feedback_i(&xi, &literal_active, &clause_active, &mut rng);
        bank.feedback_ii(&xi, &literal_active, &clause_active, &mut rng);
        bank.feedback_iii(&xi, &literal_active, &clause_active, true, &mut rng);

        assert_eq!(bank.ta_state(), before_ta.as_slice());
        assert_eq!(bank.ind_state(), before_ind.as_slice());
        assert_eq!(bank.clause_and_target(), before_cat.as_slice());
    }

    /// Invariant 5: Type II never decrements (monotonic non-decreasing
    /// counter values through any sequence of Type II calls), Type Ia never
    /// touches ind_state.
    #[test]
    fn feedback_ii_never_decrements_counters() {
        let bank_cfg = config(32, 2, 2);
        let mut bank = ClauseBank::new(bank_cfg).unwrap();
        let num_chunks = bank.num_chunks();

        let xi = vec![0x0000_0000u32, 0xFFFF_FFFFu32]; // patch0 empty, patch1 full
        let literal_active = vec![0xFFFF_FFFFu32; num_chunks];
        let clause_active = vec![true; 2];
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let counter_value = |bank: &ClauseBank, j: usize, k: usize, lane: u32| -> u32 {
            let stride = bank.num_chunks() * 8;
            let col = &bank.ta_state()[j * stride + k * 8..j * stride + (k + 1) * 8];
            let mut v = 0u32;
            for (b, &plane) in col.iter().enumerate() {
                if plane & (1 << lane) != 0 {
                    v |= 1 << b;
                }
            }
            v
        };

        let before: Vec<u32> = (0..2)
            .flat_map(|j| (0..num_chunks).map(move |k| (j, k)))
            .map(|(j, k)| counter_value(&bank, j, k, 0))
            .collect();

        for _ in 0..20 {
            bank.feedback_ii(&xi, &literal_active, &clause_active, &mut rng);
        }

        let after: Vec<u32> = (0..2)
            .flat_map(|j| (0..num_chunks).map(move |k| (j, k)))
            .map(|(j, k)| counter_value(&bank, j, k, 0))
            .collect();

        for (b, a) in before.iter().zip(after.iter()) {
            assert!(a >= b, "Type II must never decrement: {a} < {b}");
        }
    }

    /// Invariant 6: LiteralFrequency counts exactly the set top-plane bits.
    #[test]
    fn literal_frequency_counts_action_bits() {
        let bank_cfg = config(40, 3, 1);
        let mut bank = ClauseBank::new(bank_cfg).unwrap();
        let num_chunks = bank.num_chunks();
        let b_ta = 8usize;
        let stride = num_chunks * b_ta;

        // Manually set a few action bits (top bit-plane) across clauses.
        {
            let state = bank.ta_state_mut();
            // clause 0, literal 0 included
            state[0 * stride + 0 * b_ta + (b_ta - 1)] |= 1 << 0;
            // clause 1, literal 0 included
            state[1 * stride + 0 * b_ta + (b_ta - 1)] |= 1 << 0;
            // clause 2, literal 33 included (chunk 1, bit 1)
            state[2 * stride + 1 * b_ta + (b_ta - 1)] |= 1 << 1;
        }

        let mut counts = vec![0u32; 40];
        bank.literal_frequency(&mut counts);
        assert_eq!(counts[0], 2);
        assert_eq!(counts[33], 1);
        assert_eq!(counts.iter().sum::<u32>(), 3);
    }

    /// Invariant 4: with literal_active all-ones, UpdateEval equals
    /// PredictEval except for the all-exclude rule.
    #[test]
    fn update_eval_matches_predict_eval_without_all_exclude_guard() {
        let bank_cfg = config(32, 1, 2);
        let bank = ClauseBank::new(bank_cfg).unwrap();
        let num_chunks = bank.num_chunks();

        // All-exclude clause (zero-initialized) should read 0 for Predict
        // but 1 for Update, because Update skips the all-exclude guard.
        let xi = vec![0xFFFF_FFFFu32; 2 * num_chunks];
        let literal_active = vec![0xFFFF_FFFFu32; num_chunks];

        let mut predict_out = vec![false; 1];
        let mut update_out = vec![false; 1];
        bank.predict_eval(&xi, &mut predict_out);
        bank.update_eval(&xi, &literal_active, &mut update_out);

        assert!(!predict_out[0]);
        assert!(update_out[0]);
    }

    /// Invariant 2: two banks agreeing on bits < F and disagreeing only on
    /// padding bits >= F produce identical outputs from every eval mode.
    #[test]
    fn tail_padding_bits_never_affect_output() {
        let bank_cfg = config(20, 1, 1); // F=20, K=1, padding bits 20..31
        let mut bank_a = ClauseBank::new(bank_cfg).unwrap();
        let mut bank_b = ClauseBank::new(bank_cfg).unwrap();

        // Set identical action bits within F, but differing padding bits.
        bank_a.ta_state_mut()[7] = 0b1111_1111_1111_1111_1111; // low 20 bits set
        bank_b.ta_state_mut()[7] = 0b1111_1111_1111_1111_1111 | (0b111 << 20); // padding bits also set

        let xi = vec![0xFFFF_FFFFu32];
        let literal_active = vec![0xFFFF_FFFFu32];

        let mut out_a = vec![false; 1];
        let mut out_b = vec![false; 1];

        bank_a.predict_eval(&xi, &mut out_a);
        bank_b.predict_eval(&xi, &mut out_b);
        assert_eq!(out_a, out_b);

        bank_a.update_eval(&xi, &literal_active, &mut out_a);
        bank_b.update_eval(&xi, &literal_active, &mut out_b);
        assert_eq!(out_a, out_b);

        let mut pw_a = vec![false; 1];
        let mut pw_b = vec![false; 1];
        bank_a.patchwise_eval(&xi, &mut pw_a);
        bank_b.patchwise_eval(&xi, &mut pw_b);
        assert_eq!(pw_a, pw_b);
    }
}
