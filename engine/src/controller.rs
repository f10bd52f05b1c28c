//! Flow controllers and the factory that builds them.

use switchyard_types::{FlowData, FlowId};

use crate::delegate::DelegateHandle;

/// Owns the lifecycle of one active flow instance.
///
/// Every verb is invoked by the orchestrator only:
///
/// - `begin` exactly once, just before the controller first occupies a slot
/// - `pause` / `resume` any number of times, advisory
/// - `end` exactly once; the controller is not reused afterwards
///
/// Implementations typically embed a [`switchyard_types::Lifecycle`] to track
/// their own activity state.
pub trait FlowController {
    fn flow(&self) -> &FlowId;

    /// Fixed at creation. Decides which slot the controller may occupy.
    fn is_modal(&self) -> bool;

    /// Installs the non-owning back-reference to the orchestrator.
    fn set_delegate(&mut self, delegate: DelegateHandle);

    fn begin(&mut self, data: Option<FlowData>);

    fn pause(&mut self);

    fn resume(&mut self);

    /// Irrevocable termination. The returned payload is forwarded to the
    /// continuation policy when the flow ended normally.
    fn end(&mut self) -> Option<FlowData>;
}

/// Builds a controller for a requested flow.
///
/// Must always succeed. Not being able to build a controller for a flow the
/// application asked for is a configuration error, so implementations panic
/// rather than return an error.
pub trait ControllerFactory {
    fn controller(&mut self, flow: &FlowId, data: Option<&FlowData>) -> Box<dyn FlowController>;
}

impl<F> ControllerFactory for F
where
    F: FnMut(&FlowId, Option<&FlowData>) -> Box<dyn FlowController>,
{
    fn controller(&mut self, flow: &FlowId, data: Option<&FlowData>) -> Box<dyn FlowController> {
        self(flow, data)
    }
}
