//! # payout-engine
//!
//! Settlement engine for recurring shared-stakes game ledgers.
//!
//! Given per-session participant rows, the engine computes signed net
//! positions (collapsing aliases of the same person), settles them into a
//! small set of point-to-point transfers under per-debtor transfer caps with
//! a bank fallback, cancels circular 3-party transfer chains, and annotates
//! every transfer with the recipient's preferred payment channel.
//!
//! ## Architecture
//!
//! - **core** — Foundational types: identities and aliases, exact money
//!   parsing, participant records, the net-position ledger
//! - **engine** — Capped greedy settlement, 3-cycle cancellation,
//!   post-settlement reconciliation
//! - **payment** — Payment-method directory and instruction binding
//! - **simulation** — Random ledger generation for stress testing
//!
//! Every stage is a pure function of its input: identical inputs produce an
//! identical, identically ordered transfer list.

pub mod core;
pub mod engine;
pub mod payment;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::identity::{CanonicalKey, Name};
    pub use crate::core::positions::PositionLedger;
    pub use crate::core::record::ParticipantRecord;
    pub use crate::engine::cycles::cancel_cycles;
    pub use crate::engine::reconcile::reconcile;
    pub use crate::engine::settle::{settle, SettleConfig, SettleError, Transfer};
    pub use crate::payment::directory::PaymentDirectory;
    pub use crate::payment::instruction::{bind, PayoutRow};
}
