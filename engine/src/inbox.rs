//! Messages delivered to the orchestrator's owner context.

use switchyard_types::FlowId;

use crate::delegate::DelegateEvent;
use crate::presenter::PresenterOp;

/// Identifies one presenter call so its completion can be matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(u64);

impl TransitionId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TransitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[derive(Debug)]
pub(crate) enum Signal {
    Completed {
        transition: TransitionId,
        op: PresenterOp,
        flow: FlowId,
    },
    Delegate(DelegateEvent),
}
