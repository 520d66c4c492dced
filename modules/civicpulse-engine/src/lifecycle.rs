//! Lifecycle state machine for reports and tasks.
//!
//! These functions validate edges only; entity guards (task existence,
//! proof presence, reporter identity) live with the coordinator. A
//! transition outside the table fails `InvalidTransition` and callers
//! apply no mutation.

use civicpulse_common::{CivicPulseError, ReportStatus, TaskStatus};

pub fn report_transition_allowed(from: ReportStatus, to: ReportStatus) -> bool {
    use ReportStatus::*;
    matches!(
        (from, to),
        // Content-verification oracle confirms an open report.
        (Open, Verified)
        // Task assignment.
        | (Open, Assigned)
        | (Verified, Assigned)
        // Staff submits proof.
        | (Assigned, UserVerification)
        // Citizen confirms the proof.
        | (UserVerification, Resolved)
        // Citizen rejects the proof; task returns to rework.
        | (UserVerification, Assigned)
        // Citizen self-resolves.
        | (Verified, Resolved)
        | (Assigned, Resolved)
    )
}

pub fn check_report_transition(
    from: ReportStatus,
    to: ReportStatus,
) -> Result<(), CivicPulseError> {
    if report_transition_allowed(from, to) {
        Ok(())
    } else {
        Err(CivicPulseError::invalid_transition(from, to))
    }
}

pub fn task_transition_allowed(from: TaskStatus, to: TaskStatus) -> bool {
    use TaskStatus::*;
    matches!(
        (from, to),
        (Pending, InProgress)
        // Staff may submit proof straight from PENDING.
        | (Pending, UserVerification)
        | (InProgress, UserVerification)
        // Citizen confirms.
        | (UserVerification, Completed)
        // Citizen rejects; rework loop.
        | (UserVerification, Pending)
        // Closeout: AI-gated resolution or citizen self-resolve.
        | (Pending, Resolved)
        | (InProgress, Resolved)
        | (UserVerification, Resolved)
    )
}

pub fn check_task_transition(from: TaskStatus, to: TaskStatus) -> Result<(), CivicPulseError> {
    if task_transition_allowed(from, to) {
        Ok(())
    } else {
        Err(CivicPulseError::invalid_transition(from, to))
    }
}
