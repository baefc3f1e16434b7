//! Core enforcement engine for pacekeeper
//!
//! This crate is the heart of the system, containing:
//! - Schedule evaluation (may work proceed right now, and under what label)
//! - Epoch compilation (recurring daily rules projected onto absolute time)
//! - Break enforcement derived from the session ledger
//! - The `check` entrypoint the launcher invokes before starting work
//!
//! Everything here is invocation-scoped: one clock snapshot in, one decision
//! out, state read from and written back to disk through `pacekeeper-store`.
//! No internal failure ever blocks the operator; every ambiguous or broken
//! state resolves toward "allow".

mod breaks;
mod check;
mod epochs;
mod evaluate;

pub use breaks::*;
pub use check::*;
pub use epochs::*;
pub use evaluate::*;
