//! The three reinforcement rules (§4.4–4.6) and the single-offending-literal
//! search they share.
//!
//! Like [`crate::eval`], each rule is its own function rather than a trait
//! object or enum dispatch — "no inheritance, no dynamic dispatch" per the
//! Design Notes; variant behavior is enumerated, not virtualized.
//!
//! All functions take state slices already sliced to one clause, and
//! assume the caller (`bank::ClauseBank`) has already checked
//! `clause_active[j]` — that gate lives in the outer per-clause loop, not
//! here, matching the reference kernel's `if (!clause_active[j]) continue;`
//! placed once per clause, ahead of any rule-specific logic.

use rand::Rng;

use crate::bitops::{self, top_plane};
use crate::eval::feedback_eval;
use crate::random::{sample_feedback_mask, uniform_index};

/// Type I feedback (§4.4): reward-or-erode.
///
/// Caller must have already checked the per-clause `update_p` Bernoulli
/// gate — unlike Type III, that gate covers this rule's entire body, so
/// it's cheaper for the bank's outer loop to skip the call outright than
/// to thread a "should I do anything" flag through.
#[allow(clippy::too_many_arguments)]
pub fn feedback_i(
    ta_state: &mut [u32],
    num_chunks: usize,
    num_state_bits_ta: usize,
    filter: u32,
    num_patches: usize,
    num_features: usize,
    s: f64,
    boost_true_positive_feedback: bool,
    literal_active: &[u32],
    xi: &[u32],
    patch_scratch: &mut [usize],
    mask_scratch: &mut [u32],
    rng: &mut impl Rng,
) {
    let clause_patch = {
        // feedback_eval only reads ta_state; reborrow immutably for the call.
        let ta_state_ro: &[u32] = ta_state;
        feedback_eval(
            ta_state_ro,
            num_chunks,
            num_state_bits_ta,
            filter,
            num_patches,
            literal_active,
            xi,
            patch_scratch,
            rng,
        )
    };

    sample_feedback_mask(rng, num_features, s, mask_scratch);

    match clause_patch {
        Some(patch) => {
            // Type Ia: reward literals that fired truly, erode those
            // contributing to a false match.
            for k in 0..num_chunks {
                let l = literal_active[k];
                let x = xi[patch * num_chunks + k];
                let r = mask_scratch[k];
                let col = bitops::chunk_column_mut(ta_state, num_state_bits_ta, k);

                if boost_true_positive_feedback {
                    bitops::inc(col, l & x);
                } else {
                    bitops::inc(col, l & x & !r);
                }
                bitops::dec(col, l & !x & r);
            }
        }
        None => {
            // Type Ib: no patch matched, erode randomly-selected literals.
            for k in 0..num_chunks {
                let l = literal_active[k];
                let r = mask_scratch[k];
                let col = bitops::chunk_column_mut(ta_state, num_state_bits_ta, k);
                bitops::dec(col, l & r);
            }
        }
    }
}

/// Type II feedback (§4.5): falsity-sharpening. Only fires on a wrongly
/// matching clause; adds literals whose inclusion would have made the
/// clause false on the chosen patch. Never decrements.
#[allow(clippy::too_many_arguments)]
pub fn feedback_ii(
    ta_state: &mut [u32],
    num_chunks: usize,
    num_state_bits_ta: usize,
    filter: u32,
    num_patches: usize,
    literal_active: &[u32],
    xi: &[u32],
    patch_scratch: &mut [usize],
    rng: &mut impl Rng,
) {
    let clause_patch = {
        let ta_state_ro: &[u32] = ta_state;
        feedback_eval(
            ta_state_ro,
            num_chunks,
            num_state_bits_ta,
            filter,
            num_patches,
            literal_active,
            xi,
            patch_scratch,
            rng,
        )
    };

    let Some(patch) = clause_patch else { return };

    for k in 0..num_chunks {
        let l = literal_active[k];
        let x = xi[patch * num_chunks + k];
        let action = top_plane(ta_state, num_state_bits_ta, k);
        let col = bitops::chunk_column_mut(ta_state, num_state_bits_ta, k);
        bitops::inc(col, l & !x & !action);
    }
}

/// Type III feedback (§4.6): meta-inclusion with polarity ledger.
///
/// `update_p` only gates the final TA-state decrement (step 4); the
/// inclusion-indicator update, literal inversion, and offending-literal
/// search all run unconditionally once a clause is active, exactly as in
/// the reference kernel (its `update_p` check appears only once, right
/// before the closing `dec` loop).
#[allow(clippy::too_many_arguments)]
pub fn feedback_iii(
    ta_state: &mut [u32],
    ind_state: &mut [u32],
    clause_and_target: &mut [u32],
    num_chunks: usize,
    num_state_bits_ta: usize,
    num_state_bits_ind: usize,
    filter: u32,
    num_patches: usize,
    update_p: f64,
    d: f64,
    target: bool,
    literal_active: &[u32],
    xi: &[u32],
    patch_scratch: &mut [usize],
    rng: &mut impl Rng,
) {
    let clause_patch = {
        let ta_state_ro: &[u32] = ta_state;
        feedback_eval(
            ta_state_ro,
            num_chunks,
            num_state_bits_ta,
            filter,
            num_patches,
            literal_active,
            xi,
            patch_scratch,
            rng,
        )
    };

    match clause_patch {
        Some(patch) => {
            if target && rng.gen::<f64>() <= (1.0 - 1.0 / d) {
                for k in 0..num_chunks {
                    let l = literal_active[k];
                    let cat = clause_and_target[k];
                    let x = xi[patch * num_chunks + k];
                    let col = bitops::chunk_column_mut(ind_state, num_state_bits_ind, k);
                    bitops::inc(col, l & cat & x);
                }
            }

            for k in 0..num_chunks {
                let l = literal_active[k];
                let cat = clause_and_target[k];
                let x = xi[patch * num_chunks + k];
                let col = bitops::chunk_column_mut(ind_state, num_state_bits_ind, k);
                bitops::dec(col, l & !cat & x);
            }

            // Literal inversion (§4.6, §9): on a positive target the
            // ledger flips; on a negative target it only grows. No
            // comment in the reference justifies the asymmetry — it is
            // preserved here exactly, see SPEC_FULL.md §10.6.
            for k in 0..num_chunks {
                let cat = clause_and_target[k];
                let add = !cat;
                let remove = if target { cat } else { 0 };
                clause_and_target[k] = (cat | add) & !remove;
            }
        }
        None => {
            let ta_state_ro: &[u32] = ta_state;
            if let Some(literal) = find_offending_literal(
                ta_state_ro,
                num_chunks,
                num_state_bits_ta,
                filter,
                num_patches,
                literal_active,
                xi,
                patch_scratch,
                rng,
            ) {
                let chunk = literal / 32;
                let bit_mask = 1u32 << (literal % 32);
                if clause_and_target[chunk] & bit_mask == 0 {
                    clause_and_target[chunk] |= bit_mask;
                } else if target {
                    clause_and_target[chunk] &= !bit_mask;
                }
            }
        }
    }

    if rng.gen::<f64>() <= update_p {
        for k in 0..num_chunks {
            let l = literal_active[k];
            let ind_top = top_plane(ind_state, num_state_bits_ind, k);
            let col = bitops::chunk_column_mut(ta_state, num_state_bits_ta, k);
            bitops::dec(col, l & !ind_top);
        }
    }
}

/// Scan all patches for the single literal whose action bit disagrees with
/// that patch (§4.6 "single-offending-literal search"); returns `None` if
/// any examined patch disagrees in more than one literal, or if no patch
/// disagrees in exactly one.
///
/// `scratch` is caller-owned, length `num_patches`.
///
/// # Quirk (preserved intentionally, see SPEC_FULL.md §10.6)
///
/// In the reference kernel the tail chunk's disagreement check sits
/// directly inside the per-patch loop body, *not* inside the non-tail
/// chunk loop — so a tail-chunk `break` exits the whole patch scan, not
/// just the current patch. The reference also clears its
/// `max_one_offending_literal` flag in that same tail-chunk conflict
/// branch, so the patch *currently* being scanned when the tail chunk
/// conflicts is discarded too, not just the patches after it — a non-tail
/// finding earlier in the same patch does not survive a tail-chunk
/// conflict. Earlier patches' own findings are kept; no further patches
/// are examined at all once the abort fires.
#[allow(clippy::too_many_arguments)]
pub fn find_offending_literal(
    ta_state: &[u32],
    num_chunks: usize,
    num_state_bits_ta: usize,
    filter: u32,
    num_patches: usize,
    literal_active: &[u32],
    xi: &[u32],
    scratch: &mut [usize],
    rng: &mut impl Rng,
) -> Option<usize> {
    debug_assert!(scratch.len() >= num_patches);
    let mut count = 0usize;

    for patch in 0..num_patches {
        let row = &xi[patch * num_chunks..(patch + 1) * num_chunks];
        let mut max_one = true;
        let mut found: Option<usize> = None;
        let mut abort_scan = false;

        for k in 0..num_chunks.saturating_sub(1) {
            let action = top_plane(ta_state, num_state_bits_ta, k);
            let offending = (action & (row[k] | !literal_active[k])) ^ action;
            if offending.count_ones() > 1 {
                max_one = false;
                break;
            } else if offending != 0 {
                if found.is_none() {
                    found = Some(k * 32 + offending.trailing_zeros() as usize);
                } else {
                    max_one = false;
                    break;
                }
            }
        }

        // Tail chunk: evaluated unconditionally, not gated on `max_one`
        // from the loop above — matches the reference exactly.
        let tail = num_chunks - 1;
        let action = top_plane(ta_state, num_state_bits_ta, tail);
        let offending = (action & (row[tail] | !literal_active[tail]) & filter) ^ (action & filter);
        if offending.count_ones() > 1 {
            abort_scan = true;
            max_one = false;
        } else if offending != 0 {
            if found.is_none() {
                found = Some(tail * 32 + offending.trailing_zeros() as usize);
            } else {
                abort_scan = true;
                max_one = false;
            }
        }

        if max_one {
            if let Some(id) = found {
                scratch[count] = id;
                count += 1;
            }
        }

        if abort_scan {
            break;
        }
    }

    if count == 0 {
        None
    } else {
        Some(scratch[uniform_index(rng, count)])
    }
}
