//! The presentation collaborator.
//!
//! A [`Presenter`] shows and hides controller surfaces. The work may be
//! asynchronous (animated); the presenter reports completion through the
//! single-use [`Completion`] it is handed. The orchestrator is the only caller
//! and never issues a second call before the previous completion arrives.

use std::fmt;

use tokio::sync::mpsc::UnboundedSender;

use switchyard_types::FlowId;

use crate::controller::FlowController;
use crate::inbox::{Signal, TransitionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenterOp {
    Present,
    Dismiss,
}

impl fmt::Display for PresenterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PresenterOp::Present => "present",
            PresenterOp::Dismiss => "dismiss",
        })
    }
}

pub trait Presenter {
    /// Show `controller`'s surface. `completion` must be fired exactly once,
    /// including for non-animated or zero-duration presentations.
    fn present(&mut self, controller: &dyn FlowController, animated: bool, completion: Completion);

    /// Remove `controller`'s surface. Same completion contract as `present`.
    fn dismiss(&mut self, controller: &dyn FlowController, animated: bool, completion: Completion);
}

/// Single-use completion token for one presenter call.
///
/// Consumed by [`Completion::complete`], so it cannot fire twice. It is `Send`
/// and may be fired from another task. Dropping it unfired leaves the
/// orchestrator waiting forever; there is no timeout.
///
/// ```compile_fail,E0382
/// fn fire_twice(completion: switchyard_engine::Completion) {
///     completion.complete();
///     completion.complete();
/// }
/// ```
#[must_use = "the orchestrator stalls until the completion fires"]
pub struct Completion {
    pending: Option<(TransitionId, PresenterOp)>,
    flow: FlowId,
    inbox: UnboundedSender<Signal>,
}

impl Completion {
    pub(crate) fn new(
        inbox: UnboundedSender<Signal>,
        transition: TransitionId,
        op: PresenterOp,
        flow: FlowId,
    ) -> Self {
        Self {
            pending: Some((transition, op)),
            flow,
            inbox,
        }
    }

    pub fn complete(mut self) {
        if let Some((transition, op)) = self.pending.take() {
            let signal = Signal::Completed {
                transition,
                op,
                flow: self.flow.clone(),
            };
            if self.inbox.send(signal).is_err() {
                tracing::debug!(flow = %self.flow, %op, "orchestrator gone; completion dropped");
            }
        }
    }

    #[must_use]
    pub fn flow(&self) -> &FlowId {
        &self.flow
    }

    #[must_use]
    pub fn op(&self) -> Option<PresenterOp> {
        self.pending.map(|(_, op)| op)
    }

    #[must_use]
    pub fn transition(&self) -> Option<TransitionId> {
        self.pending.map(|(transition, _)| transition)
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("flow", &self.flow)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some((transition, op)) = self.pending {
            tracing::warn!(
                flow = %self.flow,
                %transition,
                %op,
                "presenter dropped completion without firing; orchestrator stalled"
            );
        }
    }
}
