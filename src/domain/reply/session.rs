use crate::domain::quota::QuotaIdentity;

/// Phases of a single reply attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Evaluating,
    Blocked,
    AdRequired,
    Ready,
    Generating,
    Committing,
    Done,
    Failed,
}

impl SessionPhase {
    pub fn can_transition_to(self, next: SessionPhase) -> bool {
        use SessionPhase::*;
        matches!(
            (self, next),
            (Idle, Evaluating)
                | (Evaluating, Blocked)
                | (Evaluating, AdRequired)
                | (Evaluating, Ready)
                | (Evaluating, Failed)
                | (AdRequired, Ready)
                | (AdRequired, Blocked)
                // re-check after the ad boundary
                | (Ready, Blocked)
                | (Ready, Failed)
                | (Ready, Generating)
                | (Generating, Committing)
                | (Generating, Failed)
                | (Committing, Done)
                | (Committing, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionPhase::Blocked | SessionPhase::Done | SessionPhase::Failed
        )
    }
}

/// Current phase of one attempt, with every transition logged
#[derive(Debug)]
pub(crate) struct PhaseTracker<'a> {
    identity: &'a QuotaIdentity,
    phase: SessionPhase,
}

impl<'a> PhaseTracker<'a> {
    pub(crate) fn new(identity: &'a QuotaIdentity, phase: SessionPhase) -> Self {
        Self { identity, phase }
    }

    pub(crate) fn advance(&mut self, next: SessionPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal reply phase transition {:?} -> {:?}",
            self.phase,
            next
        );
        tracing::debug!(
            identity = %self.identity,
            from = ?self.phase,
            to = ?next,
            "Reply phase transition"
        );
        self.phase = next;
    }

    pub(crate) fn phase(&self) -> SessionPhase {
        self.phase
    }
}
