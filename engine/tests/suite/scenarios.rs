//! End-to-end slot transitions with a synchronous presenter.

use serde_json::json;
use switchyard_engine::{ModalUnderlay, OrchestratorSettings};
use switchyard_types::{FlowData, LifecycleState};

use crate::common::{AppFlow, Rig, id};

/// Rig whose `Settings` flow is modal, as in the dashboard scenarios.
fn settings_modal_rig() -> Rig {
    Rig::builder().modal(AppFlow::Settings).build()
}

#[test]
fn first_begin_builds_and_presents_primary() {
    let mut rig = Rig::sync();
    rig.orchestrator.begin_flow(AppFlow::Login, None, false);

    assert_eq!(rig.take(), ["build Login", "Login.begin", "present Login"]);
    assert_eq!(rig.primary(), Some(id(AppFlow::Login)));
    assert_eq!(rig.modal(), None);
    assert!(rig.orchestrator.is_idle());
}

#[test]
fn begin_of_current_primary_only_resumes() {
    let mut rig = Rig::sync();
    rig.orchestrator.begin_flow(AppFlow::Login, None, false);
    rig.take();

    rig.orchestrator.begin_flow(AppFlow::Login, None, false);
    assert_eq!(rig.take(), ["Login.resume"]);
    assert_eq!(rig.primary(), Some(id(AppFlow::Login)));
}

#[test]
fn modal_over_primary_pauses_primary() {
    let mut rig = settings_modal_rig();
    rig.orchestrator.begin_flow(AppFlow::Dashboard, None, false);
    rig.take();

    rig.orchestrator.begin_flow(AppFlow::Settings, None, false);
    assert_eq!(
        rig.take(),
        [
            "build Settings",
            "Dashboard.pause",
            "Settings.begin",
            "present Settings",
        ]
    );
    assert_eq!(rig.modal(), Some(id(AppFlow::Settings)));
    assert_eq!(rig.primary(), Some(id(AppFlow::Dashboard)));
    assert_eq!(
        rig.orchestrator.lifecycle_of(&id(AppFlow::Dashboard)),
        Some(LifecycleState::Paused)
    );
    assert_eq!(
        rig.orchestrator.lifecycle_of(&id(AppFlow::Settings)),
        Some(LifecycleState::ModalActive)
    );
}

#[test]
fn ending_modal_resumes_primary() {
    let mut rig = settings_modal_rig();
    rig.orchestrator.begin_flow(AppFlow::Dashboard, None, false);
    rig.orchestrator.begin_flow(AppFlow::Settings, None, false);
    rig.take();

    rig.orchestrator.end_flow(AppFlow::Settings, false);
    assert_eq!(
        rig.take(),
        ["Settings.end", "dismiss Settings", "Dashboard.resume"]
    );
    assert_eq!(rig.modal(), None);
    assert_eq!(rig.primary(), Some(id(AppFlow::Dashboard)));
    assert_eq!(
        rig.orchestrator.lifecycle_of(&id(AppFlow::Dashboard)),
        Some(LifecycleState::Active)
    );
}

#[test]
fn non_modal_begin_replaces_primary() {
    let mut rig = Rig::sync();
    rig.orchestrator.begin_flow(AppFlow::Dashboard, None, false);
    rig.take();

    let data = FlowData::new(json!({"range": "q3"}));
    rig.orchestrator
        .begin_flow(AppFlow::Reports, Some(data), false);
    assert_eq!(
        rig.take(),
        [
            "build Reports",
            "Dashboard.end",
            "dismiss Dashboard",
            r#"Reports.begin {"range":"q3"}"#,
            "present Reports",
        ]
    );
    assert_eq!(rig.primary(), Some(id(AppFlow::Reports)));
    assert_eq!(rig.orchestrator.lifecycle_of(&id(AppFlow::Dashboard)), None);
}

#[test]
fn ending_primary_clears_slot() {
    let mut rig = Rig::sync();
    rig.orchestrator.begin_flow(AppFlow::Dashboard, None, false);
    rig.take();

    rig.orchestrator.end_flow(AppFlow::Dashboard, false);
    assert_eq!(rig.take(), ["Dashboard.end", "dismiss Dashboard"]);
    assert_eq!(rig.primary(), None);
    assert!(rig.orchestrator.is_idle());
}

#[test]
fn ending_inactive_flow_is_ignored() {
    let mut rig = Rig::sync();
    rig.orchestrator.begin_flow(AppFlow::Dashboard, None, false);
    rig.take();

    rig.orchestrator.end_flow(AppFlow::Reports, false);
    assert!(rig.take().is_empty());
    assert_eq!(rig.primary(), Some(id(AppFlow::Dashboard)));
}

#[test]
fn modal_on_empty_orchestrator() {
    let mut rig = Rig::sync();
    rig.orchestrator.begin_flow(AppFlow::Share, None, false);

    assert_eq!(rig.take(), ["build Share", "Share.begin", "present Share"]);
    assert_eq!(rig.modal(), Some(id(AppFlow::Share)));
    assert_eq!(rig.primary(), None);

    rig.orchestrator.end_flow(AppFlow::Share, false);
    assert_eq!(rig.take(), ["Share.end", "dismiss Share"]);
    assert_eq!(rig.modal(), None);
}

#[test]
fn non_modal_under_modal_is_deferred_until_modal_ends() {
    let mut rig = Rig::sync();
    rig.orchestrator.begin_flow(AppFlow::Dashboard, None, false);
    rig.orchestrator.begin_flow(AppFlow::Share, None, false);
    rig.take();

    rig.orchestrator.begin_flow(AppFlow::Reports, None, false);
    assert_eq!(
        rig.take(),
        [
            "build Reports",
            "Dashboard.end",
            "dismiss Dashboard",
            "Reports.begin",
            "Reports.pause",
        ]
    );
    assert_eq!(rig.primary(), Some(id(AppFlow::Reports)));
    assert_eq!(rig.modal(), Some(id(AppFlow::Share)));
    let snapshot = rig.orchestrator.snapshot();
    assert!(!snapshot.primary.expect("primary").presented);

    rig.orchestrator.end_flow(AppFlow::Share, false);
    assert_eq!(
        rig.take(),
        [
            "Share.end",
            "dismiss Share",
            "present Reports",
            "Reports.resume",
        ]
    );
    assert_eq!(
        rig.orchestrator.lifecycle_of(&id(AppFlow::Reports)),
        Some(LifecycleState::Active)
    );
}

#[test]
fn non_modal_under_modal_beneath_presents_immediately() {
    let mut rig = Rig::builder()
        .settings(OrchestratorSettings {
            animated: false,
            modal_underlay: ModalUnderlay::Beneath,
            coalesce_duplicates: true,
        })
        .build();
    rig.orchestrator.begin_flow(AppFlow::Share, None, false);
    rig.take();

    rig.orchestrator.begin_flow(AppFlow::Reports, None, false);
    assert_eq!(
        rig.take(),
        [
            "build Reports",
            "Reports.begin",
            "Reports.pause",
            "present Reports",
        ]
    );

    rig.orchestrator.end_flow(AppFlow::Share, false);
    assert_eq!(
        rig.take(),
        ["Share.end", "dismiss Share", "Reports.resume"]
    );
}

#[test]
fn animation_flag_reaches_presenter() {
    let mut rig = Rig::sync();
    rig.orchestrator.begin_flow(AppFlow::Login, None, true);
    assert_eq!(
        rig.take(),
        ["build Login", "Login.begin", "present Login (animated)"]
    );
}

#[test]
fn configured_animation_default_applies_to_routed_requests() {
    let mut rig = Rig::builder()
        .settings(OrchestratorSettings::default())
        .build();
    rig.orchestrator
        .submit(switchyard_engine::Request::begin(id(AppFlow::Login), None));
    assert_eq!(
        rig.take(),
        ["build Login", "Login.begin", "present Login (animated)"]
    );
}
