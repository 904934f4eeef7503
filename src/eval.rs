//! The four clause evaluation modes (§4.3).
//!
//! All four share the same chunk-matching shape: for each patch, walk the
//! non-tail chunks testing `(action_bits[k] & X) == action_bits[k]`,
//! short-circuiting on the first mismatch, then check the tail chunk with
//! both sides masked by `filter`. They differ only in what `X` is and what
//! gets emitted — kept as four free functions rather than one
//! parameterized routine plus a mode enum, since the per-mode differences
//! (the `all_exclude` tracking in `Predict`, the match-set collection in
//! `Feedback`) don't share enough shape to be worth threading through a
//! single generic body; this mirrors how the reference kernel gives each
//! mode its own `cb_calculate_clause_output_*` function rather than one
//! parameterized routine.
//!
//! All functions take `ta_state` already sliced to one clause (length
//! `num_chunks * num_state_bits_ta`, `[chunk][bitplane]` order) and `xi`
//! sliced to one example (length `num_patches * num_chunks`,
//! `[patch][chunk]` order).

use rand::Rng;

use crate::bitops::top_plane as action_word;
use crate::random::uniform_index;

/// `Predict` mode: `1` iff some patch matches and the clause includes at
/// least one literal (the "all-exclude" guard, §4.3 — a clause with no
/// included literals never votes at prediction time).
pub fn predict_eval(
    ta_state: &[u32],
    num_chunks: usize,
    num_state_bits_ta: usize,
    filter: u32,
    num_patches: usize,
    xi: &[u32],
) -> bool {
    for patch in 0..num_patches {
        let row = &xi[patch * num_chunks..(patch + 1) * num_chunks];
        let mut output = true;
        let mut all_exclude = true;

        for k in 0..num_chunks.saturating_sub(1) {
            let action = action_word(ta_state, num_state_bits_ta, k);
            output = (action & row[k]) == action;
            if !output {
                break;
            }
            all_exclude = all_exclude && action == 0;
        }

        if !output {
            continue;
        }

        let tail = num_chunks - 1;
        let action = action_word(ta_state, num_state_bits_ta, tail);
        output = (action & row[tail] & filter) == (action & filter);
        all_exclude = all_exclude && (action & filter) == 0;

        if output && !all_exclude {
            return true;
        }
    }
    false
}

/// `Update` mode: `1` iff some patch matches, where masked-out literals
/// (`literal_active[k] == 0` at that bit) are treated as satisfied
/// (`X = Xi | ~literal_active`). Deliberately does *not* apply the
/// all-exclude guard — callers relying on `UpdateEval` as a feedback
/// prelude depend on this.
pub fn update_eval(
    ta_state: &[u32],
    num_chunks: usize,
    num_state_bits_ta: usize,
    filter: u32,
    num_patches: usize,
    literal_active: &[u32],
    xi: &[u32],
) -> bool {
    for patch in 0..num_patches {
        let row = &xi[patch * num_chunks..(patch + 1) * num_chunks];
        let mut output = true;

        for k in 0..num_chunks.saturating_sub(1) {
            let action = action_word(ta_state, num_state_bits_ta, k);
            let x = row[k] | !literal_active[k];
            output = (action & x) == action;
            if !output {
                break;
            }
        }

        if !output {
            continue;
        }

        let tail = num_chunks - 1;
        let action = action_word(ta_state, num_state_bits_ta, tail);
        let x = row[tail] | !literal_active[tail];
        if (action & x & filter) == (action & filter) {
            return true;
        }
    }
    false
}

/// `Patchwise` mode: one output bit per patch, `X = Xi` (no literal-active
/// override).
pub fn patchwise_eval(
    ta_state: &[u32],
    num_chunks: usize,
    num_state_bits_ta: usize,
    filter: u32,
    num_patches: usize,
    xi: &[u32],
    output: &mut [bool],
) {
    debug_assert_eq!(output.len(), num_patches);
    for patch in 0..num_patches {
        let row = &xi[patch * num_chunks..(patch + 1) * num_chunks];
        let mut out = true;

        for k in 0..num_chunks.saturating_sub(1) {
            let action = action_word(ta_state, num_state_bits_ta, k);
            out = (action & row[k]) == action;
            if !out {
                break;
            }
        }

        if out {
            let tail = num_chunks - 1;
            let action = action_word(ta_state, num_state_bits_ta, tail);
            out = (action & row[tail] & filter) == (action & filter);
        }

        output[patch] = out;
    }
}

/// `Feedback` mode: same matching as `Update` (masked-out literals treated
/// as satisfied), but collects the set of matching patches and returns the
/// clause output bit plus one patch chosen uniformly at random among
/// matches — the prelude every feedback rule runs first.
///
/// `scratch` is caller-owned, length `num_patches`; overwritten freely.
/// Returns `None` when no patch matches (`clause_output = 0`).
pub fn feedback_eval(
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
        let mut output = true;

        for k in 0..num_chunks.saturating_sub(1) {
            let action = action_word(ta_state, num_state_bits_ta, k);
            let x = row[k] | !literal_active[k];
            output = (action & x) == action;
            if !output {
                break;
            }
        }

        if output {
            let tail = num_chunks - 1;
            let action = action_word(ta_state, num_state_bits_ta, tail);
            let x = row[tail] | !literal_active[tail];
            output = (action & x & filter) == (action & filter);
        }

        if output {
            scratch[count] = patch;
            count += 1;
        }
    }

    if count == 0 {
        return None;
    }
    let pick = uniform_index(rng, count);
    Some(scratch[pick])
}
