//! What the orchestrator does when a controller raises a delegate event.
//!
//! [`DelegateRouting`] maps each event to orchestrator [`Request`]s. The stock
//! behaviour lives in the free functions [`default_ended`],
//! [`default_canceled`] and [`default_begin`], bundled as [`DefaultRouting`].
//! Integrators implement the trait themselves and call the defaults for the
//! events they do not want to change.

use std::collections::BTreeMap;

use serde::Deserialize;

use switchyard_types::{FlowData, FlowId};

use crate::delegate::DelegateEvent;

/// What to do once an `End` request has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterEnd {
    Stop,
    /// Consult the continuation policy and begin its successor, if any.
    Continue,
}

/// Unit of orchestrator work. `animated: None` uses the configured default.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Begin {
        flow: FlowId,
        data: Option<FlowData>,
        animated: Option<bool>,
    },
    End {
        flow: FlowId,
        animated: Option<bool>,
        then: AfterEnd,
    },
}

impl Request {
    #[must_use]
    pub fn begin(flow: FlowId, data: Option<FlowData>) -> Self {
        Request::Begin {
            flow,
            data,
            animated: None,
        }
    }

    #[must_use]
    pub fn end(flow: FlowId) -> Self {
        Request::End {
            flow,
            animated: None,
            then: AfterEnd::Stop,
        }
    }

    #[must_use]
    pub fn then_continue(self) -> Self {
        match self {
            Request::End { flow, animated, .. } => Request::End {
                flow,
                animated,
                then: AfterEnd::Continue,
            },
            begin @ Request::Begin { .. } => begin,
        }
    }

    #[must_use]
    pub fn with_animation(self, value: bool) -> Self {
        match self {
            Request::Begin { flow, data, .. } => Request::Begin {
                flow,
                data,
                animated: Some(value),
            },
            Request::End { flow, then, .. } => Request::End {
                flow,
                animated: Some(value),
                then,
            },
        }
    }

    #[must_use]
    pub fn flow(&self) -> &FlowId {
        match self {
            Request::Begin { flow, .. } | Request::End { flow, .. } => flow,
        }
    }
}

pub trait DelegateRouting {
    fn ended(&self, flow: FlowId) -> Vec<Request>;
    fn canceled(&self, flow: FlowId) -> Vec<Request>;
    fn begin(&self, flow: FlowId, data: Option<FlowData>) -> Vec<Request>;
}

/// End the flow, then begin whatever the continuation policy names.
#[must_use]
pub fn default_ended(flow: FlowId) -> Vec<Request> {
    vec![Request::end(flow).then_continue()]
}

/// End the flow. No continuation lookup.
#[must_use]
pub fn default_canceled(flow: FlowId) -> Vec<Request> {
    vec![Request::end(flow)]
}

/// Hand off to the requested flow.
#[must_use]
pub fn default_begin(flow: FlowId, data: Option<FlowData>) -> Vec<Request> {
    vec![Request::begin(flow, data)]
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRouting;

impl DelegateRouting for DefaultRouting {
    fn ended(&self, flow: FlowId) -> Vec<Request> {
        default_ended(flow)
    }

    fn canceled(&self, flow: FlowId) -> Vec<Request> {
        default_canceled(flow)
    }

    fn begin(&self, flow: FlowId, data: Option<FlowData>) -> Vec<Request> {
        default_begin(flow, data)
    }
}

pub(crate) fn route(routing: &dyn DelegateRouting, event: DelegateEvent) -> Vec<Request> {
    match event {
        DelegateEvent::Ended(flow) => routing.ended(flow),
        DelegateEvent::Canceled(flow) => routing.canceled(flow),
        DelegateEvent::Begin { flow, data } => routing.begin(flow, data),
    }
}

/// Picks the flow that follows a normally ended one.
pub trait ContinuationPolicy {
    /// `outcome` is whatever the ended controller returned from `end`.
    fn next_flow(&self, after: &FlowId, outcome: Option<&FlowData>) -> Option<FlowId>;
}

impl<F> ContinuationPolicy for F
where
    F: Fn(&FlowId, Option<&FlowData>) -> Option<FlowId>,
{
    fn next_flow(&self, after: &FlowId, outcome: Option<&FlowData>) -> Option<FlowId> {
        self(after, outcome)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoContinuation;

impl ContinuationPolicy for NoContinuation {
    fn next_flow(&self, _after: &FlowId, _outcome: Option<&FlowData>) -> Option<FlowId> {
        None
    }
}

/// Static `after -> next` table, usually read from config.
///
/// ```toml
/// [continuation]
/// "AppFlow::Login" = "AppFlow::Dashboard"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ContinuationTable(BTreeMap<FlowId, FlowId>);

impl ContinuationTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, after: FlowId, next: FlowId) -> Self {
        self.0.insert(after, next);
        self
    }

    pub fn insert(&mut self, after: FlowId, next: FlowId) -> Option<FlowId> {
        self.0.insert(after, next)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ContinuationPolicy for ContinuationTable {
    fn next_flow(&self, after: &FlowId, _outcome: Option<&FlowData>) -> Option<FlowId> {
        self.0.get(after).cloned()
    }
}
