//! Controllers driving transitions through their delegate.

use serde_json::json;
use switchyard_engine::{
    ContinuationTable, DelegateRouting, FlowControllerDelegate, Request, default_begin,
    default_ended,
};
use switchyard_types::{FlowData, FlowId};

use crate::common::{AppFlow, Rig, id};

#[test]
fn controller_hands_off_to_another_flow() {
    let mut rig = Rig::sync();
    rig.orchestrator.begin_flow(AppFlow::Dashboard, None, false);
    rig.take();

    rig.delegate(AppFlow::Dashboard)
        .begin(id(AppFlow::Reports), Some(FlowData::new(json!({"id": 7}))));
    assert!(rig.take().is_empty(), "delegate events wait for the owner");

    rig.orchestrator.process_signals();
    assert_eq!(
        rig.take(),
        [
            "build Reports",
            "Dashboard.end",
            "dismiss Dashboard",
            r#"Reports.begin {"id":7}"#,
            "present Reports",
        ]
    );
}

#[test]
fn delegate_event_waits_for_in_flight_transition() {
    let mut rig = Rig::manual();
    rig.orchestrator.begin_flow(AppFlow::Login, None, false);
    rig.delegate(AppFlow::Login).canceled(id(AppFlow::Login));
    rig.orchestrator.process_signals();

    // Present of Login is still in flight, so the cancel waits.
    assert_eq!(rig.primary(), Some(id(AppFlow::Login)));
    rig.take();

    rig.complete_next();
    assert_eq!(rig.take(), ["Login.end", "dismiss Login"]);
    rig.complete_next();
    assert_eq!(rig.primary(), None);
    assert!(rig.orchestrator.is_idle());
}

#[test]
fn superseded_controller_end_is_ignored() {
    let mut rig = Rig::sync();
    rig.orchestrator.begin_flow(AppFlow::Dashboard, None, false);
    let stale = rig.delegate(AppFlow::Dashboard);
    rig.orchestrator.begin_flow(AppFlow::Reports, None, false);
    rig.take();

    stale.canceled(id(AppFlow::Dashboard));
    rig.orchestrator.process_signals();
    assert!(rig.take().is_empty());
    assert_eq!(rig.primary(), Some(id(AppFlow::Reports)));
}

#[test]
fn delegate_outlives_orchestrator() {
    let mut rig = Rig::sync();
    rig.orchestrator.begin_flow(AppFlow::Login, None, false);
    let handle = rig.delegate(AppFlow::Login);
    assert!(handle.is_attached());

    drop(rig);
    assert!(!handle.is_attached());
    handle.ended(id(AppFlow::Login));
}

/// Treats a cancel like a normal end, so continuations still apply.
struct CancelContinues;

impl DelegateRouting for CancelContinues {
    fn ended(&self, flow: FlowId) -> Vec<Request> {
        default_ended(flow)
    }

    fn canceled(&self, flow: FlowId) -> Vec<Request> {
        vec![Request::end(flow).then_continue()]
    }

    fn begin(&self, flow: FlowId, data: Option<FlowData>) -> Vec<Request> {
        default_begin(flow, data)
    }
}

#[test]
fn custom_routing_overrides_one_event() {
    let mut rig = Rig::builder()
        .routing(CancelContinues)
        .continuation(ContinuationTable::new().with(id(AppFlow::Share), id(AppFlow::Reports)))
        .build();
    rig.orchestrator.begin_flow(AppFlow::Share, None, false);
    rig.delegate(AppFlow::Share).canceled(id(AppFlow::Share));
    rig.orchestrator.process_signals();

    assert_eq!(rig.modal(), None);
    assert_eq!(rig.primary(), Some(id(AppFlow::Reports)));
}

#[test]
fn external_handle_reaches_routing() {
    let mut rig = Rig::sync();
    rig.orchestrator.begin_flow(AppFlow::Dashboard, None, false);
    rig.orchestrator
        .delegate_handle()
        .begin(id(AppFlow::Share), None);
    rig.orchestrator.process_signals();
    assert_eq!(rig.modal(), Some(id(AppFlow::Share)));
}
