use dioxus::prelude::*;
use strand_core::{LeaveDecision, LeaveSignal};

use super::scripts;

/// What each way of leaving the assessment needs right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeavePolicy {
    route_change: LeaveDecision,
    window_close: LeaveDecision,
}

impl LeavePolicy {
    pub const ALLOW: Self = Self {
        route_change: LeaveDecision::Allow,
        window_close: LeaveDecision::Allow,
    };

    /// Ask `decide` once per signal.
    #[must_use]
    pub fn judge(decide: impl Fn(LeaveSignal) -> LeaveDecision) -> Self {
        Self {
            route_change: decide(LeaveSignal::RouteChange),
            window_close: decide(LeaveSignal::WindowClose),
        }
    }

    #[must_use]
    pub fn decision(self, signal: LeaveSignal) -> LeaveDecision {
        match signal {
            LeaveSignal::RouteChange => self.route_change,
            LeaveSignal::WindowClose => self.window_close,
        }
    }
}

/// Shared "are you sure you want to leave?" state. The assessment view writes
/// it; the sidebar and the window close handler read it.
#[derive(Clone, Copy)]
pub struct LeaveGuard {
    policy: Signal<LeavePolicy>,
}

impl LeaveGuard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            policy: Signal::new(LeavePolicy::ALLOW),
        }
    }

    /// Current decision for `signal`, read without subscribing.
    #[must_use]
    pub fn decision(&self, signal: LeaveSignal) -> LeaveDecision {
        self.policy.peek().decision(signal)
    }

    pub fn set(&mut self, policy: LeavePolicy) {
        if *self.policy.peek() != policy {
            self.policy.set(policy);
        }
    }

    pub fn clear(&mut self) {
        self.set(LeavePolicy::ALLOW);
    }

    /// `true` when in-app navigation may proceed.
    pub async fn confirm_leave(self) -> bool {
        self.confirm(LeaveSignal::RouteChange).await
    }

    /// `true` when the window may close.
    pub async fn confirm_close(self) -> bool {
        self.confirm(LeaveSignal::WindowClose).await
    }

    async fn confirm(self, signal: LeaveSignal) -> bool {
        match self.decision(signal) {
            LeaveDecision::Allow => true,
            LeaveDecision::Confirm(message) => scripts::confirm(message).await,
        }
    }
}

impl Default for LeaveGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_core::LEAVE_WARNING;

    #[test]
    fn policy_keeps_one_decision_per_signal() {
        let policy = LeavePolicy::judge(|signal| match signal {
            LeaveSignal::RouteChange => LeaveDecision::Allow,
            LeaveSignal::WindowClose => LeaveDecision::Confirm(LEAVE_WARNING),
        });
        assert_eq!(policy.decision(LeaveSignal::RouteChange), LeaveDecision::Allow);
        assert!(policy.decision(LeaveSignal::WindowClose).needs_confirmation());
        assert_ne!(policy, LeavePolicy::ALLOW);
    }

    #[test]
    fn allow_never_asks() {
        for signal in [LeaveSignal::RouteChange, LeaveSignal::WindowClose] {
            assert!(!LeavePolicy::ALLOW.decision(signal).needs_confirmation());
        }
    }
}
