//! Orchestrator guarantees that must hold for every flow and slot.

use serde_json::json;
use switchyard_engine::{ContinuationTable, FlowControllerDelegate};
use switchyard_types::{Flow, FlowData, FlowExt, FlowId};

use crate::common::{AppFlow, Rig, id};

fn count(journal: &[String], entry: &str) -> usize {
    journal.iter().filter(|e| e.as_str() == entry).count()
}

fn position(journal: &[String], entry: &str) -> usize {
    journal
        .iter()
        .position(|e| e == entry)
        .unwrap_or_else(|| panic!("{entry:?} missing from {journal:?}"))
}

#[test]
fn repeated_begin_resumes_without_rebuilding() {
    for flow in [AppFlow::Dashboard, AppFlow::Share] {
        let mut rig = Rig::sync();
        rig.orchestrator.begin_flow(flow, None, false);
        rig.take();

        rig.orchestrator
            .begin_flow(flow, Some(FlowData::new(json!({"ignored": true}))), false);
        let journal = rig.take();
        assert_eq!(journal, [format!("{flow}.resume")], "{flow}");
        assert_eq!(count(&journal, &format!("{flow}.begin")), 0);
    }
}

#[test]
fn modals_replace_rather_than_stack() {
    let mut rig = Rig::builder().modal(AppFlow::Settings).build();
    rig.orchestrator.begin_flow(AppFlow::Dashboard, None, false);
    rig.orchestrator.begin_flow(AppFlow::Settings, None, false);
    rig.take();

    rig.orchestrator.begin_flow(AppFlow::Share, None, false);
    let journal = rig.take();
    assert!(position(&journal, "Settings.end") < position(&journal, "Share.begin"));
    assert_eq!(rig.modal(), Some(id(AppFlow::Share)));
    assert_eq!(rig.primary(), Some(id(AppFlow::Dashboard)));
    // The primary stays paused throughout the swap.
    assert_eq!(count(&journal, "Dashboard.resume"), 0);
    assert_eq!(count(&journal, "Dashboard.pause"), 0);
}

#[test]
fn ending_modal_resumes_primary_exactly_once() {
    let mut rig = Rig::sync();
    rig.orchestrator.begin_flow(AppFlow::Dashboard, None, false);
    rig.orchestrator.begin_flow(AppFlow::Share, None, false);
    rig.take();

    rig.orchestrator.end_flow(AppFlow::Share, false);
    let journal = rig.take();
    assert_eq!(count(&journal, "Dashboard.resume"), 1);
    assert_eq!(rig.modal(), None);

    // A late second end is a no-op.
    rig.orchestrator.end_flow(AppFlow::Share, false);
    assert!(rig.take().is_empty());
}

#[test]
fn ended_flow_continues_exactly_once() {
    let continuation =
        ContinuationTable::new().with(id(AppFlow::Login), id(AppFlow::Dashboard));
    let mut rig = Rig::builder().continuation(continuation).build();

    rig.orchestrator.begin_flow(AppFlow::Login, None, false);
    rig.take();

    rig.delegate(AppFlow::Login).ended(id(AppFlow::Login));
    rig.orchestrator.process_signals();

    let journal = rig.take();
    assert_eq!(
        journal,
        [
            "Login.end",
            "dismiss Login",
            "build Dashboard",
            "Dashboard.begin",
            "present Dashboard",
        ]
    );
    assert_eq!(count(&journal, "build Dashboard"), 1);
    assert_eq!(rig.primary(), Some(id(AppFlow::Dashboard)));
}

#[test]
fn canceled_flow_never_continues() {
    let continuation =
        ContinuationTable::new().with(id(AppFlow::Share), id(AppFlow::Reports));
    let mut rig = Rig::builder().continuation(continuation).build();

    rig.orchestrator.begin_flow(AppFlow::Share, None, false);
    rig.take();

    rig.delegate(AppFlow::Share).canceled(id(AppFlow::Share));
    rig.orchestrator.process_signals();

    assert_eq!(rig.take(), ["Share.end", "dismiss Share"]);
    assert_eq!(rig.modal(), None);
    assert_eq!(rig.primary(), None);
}

#[test]
fn continuation_sees_end_payload() {
    let policy = |after: &FlowId, outcome: Option<&FlowData>| {
        let admin = outcome
            .and_then(|data| data.get("admin"))
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        (after == &id(AppFlow::Login)).then(|| {
            if admin {
                id(AppFlow::Reports)
            } else {
                id(AppFlow::Dashboard)
            }
        })
    };
    let mut rig = Rig::builder()
        .end_payload(AppFlow::Login, FlowData::new(json!({"admin": true})))
        .continuation(policy)
        .build();

    rig.orchestrator.begin_flow(AppFlow::Login, None, false);
    rig.delegate(AppFlow::Login).ended(id(AppFlow::Login));
    rig.orchestrator.process_signals();

    assert_eq!(rig.primary(), Some(id(AppFlow::Reports)));
}

#[test]
fn replacement_begins_only_after_dismiss_completes() {
    let mut rig = Rig::manual();
    rig.orchestrator.begin_flow(AppFlow::Dashboard, None, false);
    rig.complete_next();
    rig.take();

    rig.orchestrator.begin_flow(AppFlow::Reports, None, false);
    assert_eq!(
        rig.take(),
        ["build Reports", "Dashboard.end", "dismiss Dashboard"]
    );
    assert_eq!(rig.primary(), None, "slot is assigned only after begin");

    rig.complete_next();
    assert_eq!(rig.take(), ["Reports.begin", "present Reports"]);
    assert_eq!(rig.primary(), Some(id(AppFlow::Reports)));

    rig.complete_next();
    assert!(rig.orchestrator.is_idle());
}

#[test]
fn modal_end_resume_waits_for_dismissal() {
    let mut rig = Rig::manual();
    rig.orchestrator.begin_flow(AppFlow::Dashboard, None, false);
    rig.complete_next();
    rig.orchestrator.begin_flow(AppFlow::Share, None, false);
    rig.complete_next();
    rig.take();

    rig.orchestrator.end_flow(AppFlow::Share, false);
    assert_eq!(rig.take(), ["Share.end", "dismiss Share"]);

    rig.complete_next();
    assert_eq!(rig.take(), ["Dashboard.resume"]);
}

switchyard_types::flow_set! {
    enum OtherFlow {
        Login,
    }
}

#[test]
fn identity_is_total_across_kinds() {
    let app: &dyn Flow = &AppFlow::Login;
    let other: &dyn Flow = &OtherFlow::Login;
    assert!(!app.is_equal(other));
    assert!(!other.is_equal(app));

    assert!(AppFlow::Login.is_equal(&AppFlow::Login));
    assert!(AppFlow::Login.is_equal(&id(AppFlow::Login)));
    assert!(id(AppFlow::Login).is_equal(&id(AppFlow::Login)));
    assert!(!AppFlow::Login.is_equal(&AppFlow::Dashboard));
}

#[test]
fn foreign_kind_never_matches_a_slot() {
    let mut rig = Rig::sync();
    rig.orchestrator.begin_flow(AppFlow::Login, None, false);
    rig.take();

    rig.orchestrator.end_flow(OtherFlow::Login, false);
    assert!(rig.take().is_empty());
    assert_eq!(rig.primary(), Some(id(AppFlow::Login)));
}
