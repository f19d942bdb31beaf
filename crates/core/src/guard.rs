use crate::model::Progress;

pub const LEAVE_WARNING: &str = "Are you sure you want to leave? Your progress will be saved.";

/// How the user is trying to leave the assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveSignal {
    /// In-app navigation (sidebar links, buttons).
    RouteChange,
    /// The platform's "leaving page" signal (window or tab close).
    WindowClose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDecision {
    Allow,
    Confirm(&'static str),
}

impl LeaveDecision {
    #[must_use]
    pub fn needs_confirmation(self) -> bool {
        matches!(self, LeaveDecision::Confirm(_))
    }
}

/// Both signals are judged the same way: warn only while an attempt is part-way done.
#[must_use]
pub fn leave_decision(progress: Progress, _signal: LeaveSignal) -> LeaveDecision {
    if progress.is_partial() {
        LeaveDecision::Confirm(LEAVE_WARNING)
    } else {
        LeaveDecision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warns_only_for_partial_progress() {
        for signal in [LeaveSignal::RouteChange, LeaveSignal::WindowClose] {
            assert_eq!(leave_decision(Progress::NONE, signal), LeaveDecision::Allow);
            assert_eq!(leave_decision(Progress::COMPLETE, signal), LeaveDecision::Allow);
            assert_eq!(
                leave_decision(Progress::new(40.0), signal),
                LeaveDecision::Confirm(LEAVE_WARNING)
            );
        }
    }
}
