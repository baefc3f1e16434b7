//! The check entrypoint
//!
//! Everything a launcher needs before starting work: load the policy,
//! classify the instant, reconcile orphans, enforce breaks, and refresh the
//! session-state snapshot for the mid-session checker. The only externally
//! visible outcomes are proceed, proceed-with-warning, and hard-block;
//! internal failures of any kind resolve toward "proceed".

use crate::{BlockReason, BreakStatus, Evaluation, check_break, compile_snapshot, evaluate};
use chrono::{DateTime, Utc};
use pacekeeper_config::{Enforcement, MessageKind, Policy, load_policy};
use pacekeeper_store::FileStore;
use std::path::PathBuf;
use tracing::{info, warn};

/// Inputs to a single check invocation.
#[derive(Debug)]
pub struct CheckRequest<'a> {
    /// Policy candidate locations, closest scope first.
    pub policy_paths: &'a [PathBuf],
    /// Where the ledger, snapshot, and markers live.
    pub store: &'a FileStore,
    /// Suppress all blocking outcomes (the snapshot is still refreshed).
    pub force: bool,
    /// The single clock snapshot for this invocation.
    pub now: DateTime<Utc>,
}

/// What the launcher should do.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// Start the session. A notice is present when an advisory-mode policy
    /// downgraded a block to a warning.
    Proceed { notice: Option<String> },
    /// Start the session, but the allowed window is closing.
    WindDown { notice: Option<String> },
    /// Do not start the session.
    Blocked {
        cause: BlockCause,
        notice: Option<String>,
    },
}

/// What blocked the check.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockCause {
    Schedule(BlockReason),
    Break { minutes_left: i64 },
}

impl CheckOutcome {
    /// Exit-code contract with the launcher: 0 proceed, 1 blocked, 2 wind-down.
    pub fn exit_code(&self) -> i32 {
        match self {
            CheckOutcome::Proceed { .. } => 0,
            CheckOutcome::Blocked { .. } => 1,
            CheckOutcome::WindDown { .. } => 2,
        }
    }

    pub fn notice(&self) -> Option<&str> {
        match self {
            CheckOutcome::Proceed { notice }
            | CheckOutcome::WindDown { notice }
            | CheckOutcome::Blocked { notice, .. } => notice.as_deref(),
        }
    }
}

/// Run the full check flow.
pub fn check(request: &CheckRequest<'_>) -> CheckOutcome {
    let now = request.now;
    let force = request.force;

    let Some(policy) = load_policy(request.policy_paths) else {
        // No policy means no enforcement, and nothing to snapshot
        return CheckOutcome::Proceed { notice: None };
    };

    match evaluate(&policy, now) {
        Evaluation::Blocked(reason) if !force => {
            let notice = notice_for_reason(&policy, &reason);
            if policy.enforcement == Enforcement::Advisory {
                info!(reason = ?reason, "Schedule block downgraded to advisory");
                write_snapshot(request.store, &policy, now);
                return CheckOutcome::Proceed { notice };
            }
            info!(reason = ?reason, "Schedule block");
            return CheckOutcome::Blocked {
                cause: BlockCause::Schedule(reason),
                notice,
            };
        }
        Evaluation::WindDown if !force => {
            // The session may proceed, so the snapshot is still refreshed
            write_snapshot(request.store, &policy, now);
            return CheckOutcome::WindDown {
                notice: nonempty(policy.messages.for_kind(MessageKind::WindDown)),
            };
        }
        _ => {}
    }

    if let Err(err) = request.store.reconcile_orphans(now) {
        warn!(error = %err, "Orphan reconciliation failed, continuing");
    }

    let ledger = request.store.load_ledger();
    if let BreakStatus::Owed { minutes_left } =
        check_break(&ledger, policy.limits.min_break_minutes, now)
    {
        if !force {
            let notice = Some(format!("Need {minutes_left} more minutes of break."));
            if policy.enforcement == Enforcement::Advisory {
                write_snapshot(request.store, &policy, now);
                return CheckOutcome::Proceed { notice };
            }
            return CheckOutcome::Blocked {
                cause: BlockCause::Break { minutes_left },
                notice,
            };
        }
    }

    write_snapshot(request.store, &policy, now);
    CheckOutcome::Proceed { notice: None }
}

fn notice_for_reason(policy: &Policy, reason: &BlockReason) -> Option<String> {
    let kind = match reason {
        BlockReason::OutsideHours => MessageKind::OutsideHours,
        BlockReason::BlockedDay => MessageKind::BlockedDay,
        BlockReason::BlockedPeriod { .. } => MessageKind::BlockedPeriod,
    };
    nonempty(policy.messages.for_kind(kind))
}

fn nonempty(message: &str) -> Option<String> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn write_snapshot(store: &FileStore, policy: &Policy, now: DateTime<Utc>) {
    let snapshot = compile_snapshot(policy, now);
    if let Err(err) = store.write_snapshot(&snapshot) {
        // A missing snapshot only dulls the mid-session checker; never block
        warn!(error = %err, "Failed to write session state");
    }
}
