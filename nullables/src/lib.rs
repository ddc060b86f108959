//! Nullable infrastructure for deterministic testing.
//!
//! The ledger core reads wall-clock time through the [`Clock`](vigil_types::Clock)
//! trait. This crate provides a test-friendly implementation that only moves
//! when told to, so block timestamps (and therefore block hashes) are
//! reproducible across runs.

pub mod clock;

pub use clock::NullClock;
