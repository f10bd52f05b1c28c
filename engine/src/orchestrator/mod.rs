//! The orchestrator: two slots, one inbox, and the transition rules.
//!
//! # Slots
//!
//! At most one primary controller and at most one modal controller. A
//! controller in a slot has been begun and not yet ended. Only the
//! orchestrator mutates the slots.
//!
//! # Ordering
//!
//! The outgoing controller's `end`/`pause` and its `Presenter::dismiss` are
//! issued together. The incoming controller's `begin` and `Presenter::present`
//! are issued only after that dismissal's completion arrives, so a new surface
//! is never built while the old one is still being torn down. Slot assignment
//! happens once, right after `begin`.
//!
//! # Owner context
//!
//! Everything runs on whichever context calls into the orchestrator; there is
//! no locking and the type is not `Send`. Presenter completions and delegate
//! events land in an inbox and are applied by [`Orchestrator::process_signals`]
//! (non-blocking, for tick loops) or [`Orchestrator::settle`] (awaits until
//! idle). Those completions are the only suspension points.
//!
//! # In-flight requests
//!
//! While a dismiss/present chain is pending, new requests queue FIFO and run
//! once it finishes, so presenter calls never interleave. With
//! `coalesce_duplicates`, a `begin` that repeats the last queued request is
//! dropped; coalescing never changes where the slots end up.

mod transition;


use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use switchyard_types::{
    Flow, FlowData, FlowId, Lifecycle, LifecycleError, LifecycleState, Slot,
};

use crate::config::{ModalUnderlay, OrchestratorSettings};
use crate::controller::{ControllerFactory, FlowController};
use crate::delegate::DelegateHandle;
use crate::inbox::{Signal, TransitionId};
use crate::presenter::{Completion, Presenter, PresenterOp};
use crate::routing::{
    AfterEnd, ContinuationPolicy, DefaultRouting, DelegateRouting, NoContinuation, Request, route,
};

pub use transition::{TransitionClass, classify};

/// A controller sitting in a slot, plus what the orchestrator has done to it.
struct Occupant {
    controller: Box<dyn FlowController>,
    lifecycle: Lifecycle,
    presented: bool,
}

impl Occupant {
    fn flow(&self) -> &FlowId {
        self.controller.flow()
    }

    fn is(&self, flow: &FlowId) -> bool {
        self.flow().is_equal(flow)
    }

    fn pause(&mut self) {
        self.controller.pause();
        track(self.controller.flow(), self.lifecycle.pause());
    }

    fn resume(&mut self) {
        self.controller.resume();
        track(self.controller.flow(), self.lifecycle.resume());
    }

    fn end(&mut self) -> Option<FlowData> {
        let payload = self.controller.end();
        track(self.controller.flow(), self.lifecycle.end());
        payload
    }

    fn view(&self) -> OccupantView {
        OccupantView {
            flow: self.flow().clone(),
            state: self.lifecycle.state(),
            presented: self.presented,
        }
    }
}

fn track(flow: &FlowId, result: Result<LifecycleState, LifecycleError>) {
    if let Err(err) = result {
        tracing::warn!(flow = %flow, error = %err, "lifecycle contract violated");
    }
}

/// Work left once the awaited presenter call completes.
enum Then {
    Finish,
    /// Begin and present `incoming` now that the outgoing surface is gone.
    Install {
        incoming: Box<dyn FlowController>,
        data: Option<FlowData>,
        animated: bool,
    },
    /// The modal is gone: present a deferred primary if needed, then resume it.
    RestorePrimary { animated: bool },
    ResumePrimary,
}

struct InFlight {
    transition: TransitionId,
    op: PresenterOp,
    /// Ended controller, kept alive until its dismissal completes.
    outgoing: Option<Box<dyn FlowController>>,
    then: Then,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupantView {
    pub flow: FlowId,
    pub state: LifecycleState,
    pub presented: bool,
}

/// Point-in-time view of both slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSnapshot {
    pub primary: Option<OccupantView>,
    pub modal: Option<OccupantView>,
    pub in_flight: bool,
    pub queued: usize,
}

pub struct Orchestrator {
    factory: Box<dyn ControllerFactory>,
    presenter: Box<dyn Presenter>,
    routing: Box<dyn DelegateRouting>,
    continuation: Box<dyn ContinuationPolicy>,
    settings: OrchestratorSettings,
    primary: Option<Occupant>,
    modal: Option<Occupant>,
    in_flight: Option<InFlight>,
    queue: VecDeque<Request>,
    next_transition: u64,
    inbox_tx: UnboundedSender<Signal>,
    inbox_rx: UnboundedReceiver<Signal>,
}

impl Orchestrator {
    /// Creates an empty orchestrator with stock delegate routing and no
    /// continuation policy.
    pub fn new(
        factory: impl ControllerFactory + 'static,
        presenter: impl Presenter + 'static,
        settings: OrchestratorSettings,
    ) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            factory: Box::new(factory),
            presenter: Box::new(presenter),
            routing: Box::new(DefaultRouting),
            continuation: Box::new(NoContinuation),
            settings,
            primary: None,
            modal: None,
            in_flight: None,
            queue: VecDeque::new(),
            next_transition: 0,
            inbox_tx,
            inbox_rx,
        }
    }

    pub fn with_routing(mut self, routing: impl DelegateRouting + 'static) -> Self {
        self.routing = Box::new(routing);
        self
    }

    pub fn with_continuation(mut self, policy: impl ContinuationPolicy + 'static) -> Self {
        self.continuation = Box::new(policy);
        self
    }

    /// Starts `flow`, or resumes it if it already occupies a slot.
    pub fn begin_flow(&mut self, flow: impl Flow, data: Option<FlowData>, animated: bool) {
        self.submit(Request::begin(flow.flow_id(), data).with_animation(animated));
    }

    /// Ends `flow` if it occupies a slot. Otherwise a no-op: a controller may
    /// ask to end after it has already been superseded.
    pub fn end_flow(&mut self, flow: impl Flow, animated: bool) {
        self.submit(Request::end(flow.flow_id()).with_animation(animated));
    }

    /// Queues a request and runs as much as can run without waiting.
    pub fn submit(&mut self, request: Request) {
        self.enqueue(request);
        self.process_signals();
    }

    /// Applies every signal already in the inbox and runs queued requests
    /// until a presenter completion is awaited or nothing is left.
    pub fn process_signals(&mut self) {
        loop {
            while let Ok(signal) = self.inbox_rx.try_recv() {
                self.handle_signal(signal);
            }
            if self.in_flight.is_some() {
                return;
            }
            let Some(request) = self.queue.pop_front() else {
                return;
            };
            self.execute(request);
        }
    }

    /// Waits for presenter completions until nothing is in flight or queued.
    ///
    /// A presenter that never completes makes this wait forever.
    pub async fn settle(&mut self) {
        loop {
            self.process_signals();
            if self.is_idle() {
                return;
            }
            match self.inbox_rx.recv().await {
                Some(signal) => self.handle_signal(signal),
                // Unreachable while we hold `inbox_tx`.
                None => return,
            }
        }
    }

    #[must_use]
    pub fn primary(&self) -> Option<&FlowId> {
        self.primary.as_ref().map(Occupant::flow)
    }

    #[must_use]
    pub fn modal(&self) -> Option<&FlowId> {
        self.modal.as_ref().map(Occupant::flow)
    }

    /// Lifecycle state of the occupant servicing `flow`, if any.
    #[must_use]
    pub fn lifecycle_of(&self, flow: &FlowId) -> Option<LifecycleState> {
        self.occupants()
            .find(|occupant| occupant.is(flow))
            .map(|occupant| occupant.lifecycle.state())
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.queue.is_empty()
    }

    #[must_use]
    pub fn settings(&self) -> OrchestratorSettings {
        self.settings
    }

    /// A delegate handle for event sources other than controllers.
    #[must_use]
    pub fn delegate_handle(&self) -> DelegateHandle {
        DelegateHandle::attached(self.inbox_tx.downgrade())
    }

    #[must_use]
    pub fn snapshot(&self) -> SlotSnapshot {
        SlotSnapshot {
            primary: self.primary.as_ref().map(Occupant::view),
            modal: self.modal.as_ref().map(Occupant::view),
            in_flight: self.in_flight.is_some(),
            queued: self.queue.len(),
        }
    }

    fn occupants(&self) -> impl Iterator<Item = &Occupant> {
        self.primary.iter().chain(self.modal.iter())
    }

    fn next_transition_id(&mut self) -> TransitionId {
        self.next_transition += 1;
        TransitionId::new(self.next_transition)
    }

    fn enqueue(&mut self, request: Request) {
        // Only a begin directly behind an identical begin merges: the second
        // would just resume what the first installs. Anything queued between
        // them can change the outcome, so both stay.
        if self.settings.coalesce_duplicates
            && let Request::Begin { flow, .. } = &request
            && matches!(self.queue.back(), Some(Request::Begin { flow: last, .. }) if last == flow)
        {
            tracing::debug!(flow = %flow, "begin repeats the last queued request; coalesced");
            return;
        }
        self.queue.push_back(request);
    }

    fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Delegate(event) => {
                tracing::debug!(flow = %event.flow(), ?event, "delegate event");
                for request in route(self.routing.as_ref(), event) {
                    self.enqueue(request);
                }
            }
            Signal::Completed {
                transition,
                op,
                flow,
            } => {
                let awaited = self
                    .in_flight
                    .as_ref()
                    .is_some_and(|pending| pending.transition == transition && pending.op == op);
                if !awaited {
                    tracing::warn!(flow = %flow, %transition, %op, "stale presenter completion ignored");
                    return;
                }
                let Some(done) = self.in_flight.take() else {
                    return;
                };
                tracing::debug!(flow = %flow, %transition, %op, "presenter call completed");
                drop(done.outgoing);
                self.run_then(done.then);
            }
        }
    }

    fn execute(&mut self, request: Request) {
        match request {
            Request::Begin {
                flow,
                data,
                animated,
            } => {
                let animated = animated.unwrap_or(self.settings.animated);
                self.execute_begin(flow, data, animated);
            }
            Request::End {
                flow,
                animated,
                then,
            } => {
                let animated = animated.unwrap_or(self.settings.animated);
                self.execute_end(flow, animated, then);
            }
        }
    }

    fn execute_begin(&mut self, flow: FlowId, data: Option<FlowData>, animated: bool) {
        if let Some(primary) = self.primary.as_mut().filter(|occupant| occupant.is(&flow)) {
            tracing::debug!(flow = %flow, "flow is already primary; resuming");
            primary.resume();
            return;
        }
        if let Some(modal) = self.modal.as_mut().filter(|occupant| occupant.is(&flow)) {
            tracing::debug!(flow = %flow, "flow is already modal; resuming");
            modal.resume();
            return;
        }

        let mut next = self.factory.controller(&flow, data.as_ref());
        assert!(
            next.flow().is_equal(&flow),
            "controller factory built {} for requested flow {flow}",
            next.flow()
        );
        next.set_delegate(self.delegate_handle());

        let class = classify(self.primary.is_some(), self.modal.is_some(), next.is_modal());
        tracing::debug!(flow = %flow, modal = next.is_modal(), %class, "classified transition");

        match class {
            TransitionClass::ReplaceModal => {
                let outgoing = self.modal.take();
                let then = Then::Install {
                    incoming: next,
                    data,
                    animated,
                };
                self.retire(outgoing, animated, then);
            }
            TransitionClass::PrimaryUnderModal | TransitionClass::ReplacePrimary => {
                let outgoing = self.primary.take();
                let then = Then::Install {
                    incoming: next,
                    data,
                    animated,
                };
                self.retire(outgoing, animated, then);
            }
            TransitionClass::Direct => {
                if next.is_modal()
                    && let Some(primary) = self.primary.as_mut()
                {
                    primary.pause();
                }
                self.install(next, data, animated);
            }
        }
    }

    fn execute_end(&mut self, flow: FlowId, animated: bool, then: AfterEnd) {
        let outcome = if self.primary.as_ref().is_some_and(|p| p.is(&flow)) {
            let outgoing = self.primary.take();
            self.retire(outgoing, animated, Then::Finish)
        } else if self.modal.as_ref().is_some_and(|m| m.is(&flow)) {
            let outgoing = self.modal.take();
            self.retire(outgoing, animated, Then::RestorePrimary { animated })
        } else {
            tracing::debug!(flow = %flow, "end requested for inactive flow; ignored");
            None
        };

        if then == AfterEnd::Continue
            && let Some(next) = self.continuation.next_flow(&flow, outcome.as_ref())
        {
            tracing::debug!(after = %flow, next = %next, "continuation selected");
            self.queue.push_front(Request::begin(next, None));
        }
    }

    /// Ends `outgoing` and dismisses it; `then` runs once the dismissal
    /// completes (immediately if there is nothing to dismiss).
    fn retire(&mut self, outgoing: Option<Occupant>, animated: bool, then: Then) -> Option<FlowData> {
        let Some(mut occupant) = outgoing else {
            self.run_then(then);
            return None;
        };

        let payload = occupant.end();
        tracing::info!(flow = %occupant.flow(), "flow ended; slot cleared");

        if occupant.presented {
            let transition = self.next_transition_id();
            issue(
                self.presenter.as_mut(),
                &self.inbox_tx,
                transition,
                PresenterOp::Dismiss,
                occupant.controller.as_ref(),
                animated,
            );
            self.in_flight = Some(InFlight {
                transition,
                op: PresenterOp::Dismiss,
                outgoing: Some(occupant.controller),
                then,
            });
        } else {
            tracing::debug!(flow = %occupant.flow(), "never presented; nothing to dismiss");
            drop(occupant);
            self.run_then(then);
        }
        payload
    }

    /// Begins `controller`, presents it unless it is deferred beneath a
    /// modal, and assigns its slot.
    fn install(&mut self, mut controller: Box<dyn FlowController>, data: Option<FlowData>, animated: bool) {
        let slot = Slot::for_modal(controller.is_modal());
        let mut lifecycle = Lifecycle::new();
        controller.begin(data);
        track(controller.flow(), lifecycle.begin(slot));

        let under_modal = slot == Slot::Primary && self.modal.is_some();
        if under_modal {
            controller.pause();
            track(controller.flow(), lifecycle.pause());
        }
        let present_now = !under_modal || self.settings.modal_underlay == ModalUnderlay::Beneath;

        let in_flight = if present_now {
            let transition = self.next_transition_id();
            issue(
                self.presenter.as_mut(),
                &self.inbox_tx,
                transition,
                PresenterOp::Present,
                controller.as_ref(),
                animated,
            );
            Some(InFlight {
                transition,
                op: PresenterOp::Present,
                outgoing: None,
                then: Then::Finish,
            })
        } else {
            None
        };

        tracing::info!(flow = %controller.flow(), %slot, presented = present_now, "slot assigned");
        let occupant = Occupant {
            controller,
            lifecycle,
            presented: present_now,
        };
        let target = match slot {
            Slot::Primary => &mut self.primary,
            Slot::Modal => &mut self.modal,
        };
        debug_assert!(target.is_none(), "{slot} slot must be vacated before install");
        *target = Some(occupant);
        self.in_flight = in_flight;
    }

    fn restore_primary(&mut self, animated: bool) {
        let needs_present = match &self.primary {
            Some(primary) => !primary.presented,
            None => return,
        };
        if !needs_present {
            if let Some(primary) = self.primary.as_mut() {
                primary.resume();
            }
            return;
        }

        let transition = self.next_transition_id();
        let Some(primary) = self.primary.as_mut() else {
            return;
        };
        primary.presented = true;
        issue(
            self.presenter.as_mut(),
            &self.inbox_tx,
            transition,
            PresenterOp::Present,
            primary.controller.as_ref(),
            animated,
        );
        self.in_flight = Some(InFlight {
            transition,
            op: PresenterOp::Present,
            outgoing: None,
            then: Then::ResumePrimary,
        });
    }

    fn run_then(&mut self, then: Then) {
        match then {
            Then::Finish => {}
            Then::Install {
                incoming,
                data,
                animated,
            } => self.install(incoming, data, animated),
            Then::RestorePrimary { animated } => self.restore_primary(animated),
            Then::ResumePrimary => {
                if let Some(primary) = self.primary.as_mut() {
                    primary.resume();
                }
            }
        }
    }
}

fn issue(
    presenter: &mut dyn Presenter,
    inbox: &UnboundedSender<Signal>,
    transition: TransitionId,
    op: PresenterOp,
    controller: &dyn FlowController,
    animated: bool,
) {
    let completion = Completion::new(inbox.clone(), transition, op, controller.flow().clone());
    tracing::debug!(flow = %controller.flow(), %transition, %op, animated, "presenter call");
    match op {
        PresenterOp::Present => presenter.present(controller, animated, completion),
        PresenterOp::Dismiss => presenter.dismiss(controller, animated, completion),
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("settings", &self.settings)
            .field("slots", &self.snapshot())
            .finish_non_exhaustive()
    }
}
