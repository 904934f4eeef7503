//! Convolutional Tsetlin Machine clause bank kernel
//!
//! A bit-packed bank of propositional clauses, each built from a fixed pool
//! of Tsetlin automata, together with the inference and feedback routines
//! that evaluate clauses against patches of a structured example and update
//! each automaton's counter state in response to Type I, Type II, and
//! Type III reinforcement.
//!
//! This crate is the learning kernel only. Dataset marshalling, the
//! label-level ensemble of class polarities, threshold-based feedback
//! probability, command-line wrappers, configuration *loading*, and model
//! serialization are an external driver's responsibility — this crate
//! exposes the five core operations and nothing more.
//!
//! # Quick Start
//!
//! ```
//! use ctm_clause_bank::{ClauseBank, ClauseBankConfig};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let config = ClauseBankConfig {
//!     num_features: 8,
//!     num_clauses: 4,
//!     num_patches: 2,
//!     num_state_bits_ta: 8,
//!     num_state_bits_ind: 8,
//!     s: 3.0,
//!     d: 2.0,
//!     update_p: 1.0,
//!     boost_true_positive_feedback: false,
//! };
//! let mut bank = ClauseBank::new(config).expect("valid config");
//!
//! let num_chunks = bank.num_chunks();
//! let xi = vec![0xFFFF_FFFFu32; 2 * num_chunks]; // 2 patches, all literals set
//! let literal_active = vec![0xFFFF_FFFFu32; num_chunks];
//! let clause_active = vec![true; 4];
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! bank.feedback_i(&xi, &literal_active, &clause_active, &mut rng);
//!
//! let mut clause_output = vec![false; 4];
//! bank.predict_eval(&xi, &mut clause_output);
//! ```
//!
//! # Core Concepts
//!
//! - A **clause** is a conjunction over literals, represented as `K*B_ta`
//!   words of bit-sliced Tsetlin-automaton state (plus, for Type III,
//!   `K*B_ind` words of inclusion-indicator state and `K` polarity-ledger
//!   words).
//! - A **patch** is one of `P` receptive-field windows of an example; a
//!   clause fires if *any* patch matches.
//! - The **action bit** (top bit-plane of a TA counter) decides whether a
//!   literal is included in its clause.
//!
//! # Modules
//!
//! - [`config`]: bank parameters and their validation.
//! - [`error`]: the one recoverable error path (bad construction parameters).
//! - [`bitops`]: saturating bit-sliced counter increment/decrement.
//! - [`random`]: feedback mask sampling and uniform draws.
//! - [`eval`]: the four clause evaluation modes.
//! - [`feedback`]: the three reinforcement rules.
//! - [`bank`]: [`ClauseBank`], the outer driver tying the above together.

pub mod bank;
pub mod bitops;
pub mod config;
pub mod error;
pub mod eval;
pub mod feedback;
pub mod random;

pub use bank::ClauseBank;
pub use config::{ClauseBankConfig, WORD_BITS};
pub use error::ClauseBankError;
