//! The upward channel from a controller to whoever orchestrates it.
//!
//! Controllers hold a [`DelegateHandle`], never the orchestrator itself. The
//! handle is non-owning: the orchestrator's lifetime does not depend on any
//! controller it owns, and a controller must tolerate its delegate going away.
//! Once the orchestrator is dropped, raised events are discarded.

use std::fmt;

use tokio::sync::mpsc::WeakUnboundedSender;

use switchyard_types::{FlowData, FlowId};

use crate::inbox::Signal;

/// Events a controller raises about its own flow or a hand-off.
pub trait FlowControllerDelegate {
    /// The controller finished its work normally.
    fn ended(&self, flow: FlowId);
    /// The user dismissed the controller.
    fn canceled(&self, flow: FlowId);
    /// The controller asks for a different flow to start.
    fn begin(&self, flow: FlowId, data: Option<FlowData>);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DelegateEvent {
    Ended(FlowId),
    Canceled(FlowId),
    Begin {
        flow: FlowId,
        data: Option<FlowData>,
    },
}

impl DelegateEvent {
    #[must_use]
    pub fn flow(&self) -> &FlowId {
        match self {
            DelegateEvent::Ended(flow)
            | DelegateEvent::Canceled(flow)
            | DelegateEvent::Begin { flow, .. } => flow,
        }
    }
}

/// Weak back-reference into an orchestrator's inbox.
#[derive(Clone, Default)]
pub struct DelegateHandle {
    inbox: Option<WeakUnboundedSender<Signal>>,
}

impl DelegateHandle {
    pub(crate) fn attached(inbox: WeakUnboundedSender<Signal>) -> Self {
        Self { inbox: Some(inbox) }
    }

    /// A handle with no orchestrator behind it. Every event is dropped.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// Whether an orchestrator is still listening.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.inbox
            .as_ref()
            .and_then(WeakUnboundedSender::upgrade)
            .is_some_and(|tx| !tx.is_closed())
    }

    fn raise(&self, event: DelegateEvent) {
        let Some(tx) = self.inbox.as_ref().and_then(WeakUnboundedSender::upgrade) else {
            tracing::warn!(flow = %event.flow(), "no orchestrator attached; event dropped");
            return;
        };
        let flow = event.flow().clone();
        if tx.send(Signal::Delegate(event)).is_err() {
            tracing::warn!(flow = %flow, "orchestrator gone; event dropped");
        }
    }
}

impl fmt::Debug for DelegateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateHandle")
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl FlowControllerDelegate for DelegateHandle {
    fn ended(&self, flow: FlowId) {
        self.raise(DelegateEvent::Ended(flow));
    }

    fn canceled(&self, flow: FlowId) {
        self.raise(DelegateEvent::Canceled(flow));
    }

    fn begin(&self, flow: FlowId, data: Option<FlowData>) {
        self.raise(DelegateEvent::Begin { flow, data });
    }
}
