//! Sample application wired to the orchestrator.
//!
//! Six screens, two of them modal, one guided onboarding flow with its own
//! step trail, and a presenter that "animates" by sleeping through a
//! [`TransitionEffect`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tokio::time::Instant;

use switchyard_engine::{
    Completion, ContinuationTable, ControllerFactory, DelegateHandle, FlowController,
    Orchestrator, Presenter, SwitchyardConfig,
};
use switchyard_types::{
    EffectPhase, FlowData, FlowId, FlowStep, Lifecycle, LifecycleError, LifecycleState, Slot,
    StepRegistry, StepTrail, TransitionEffect, TransitionKind, flow_set,
};

flow_set! {
    /// Screens of the sample application.
    pub enum AppFlow {
        Login,
        Dashboard,
        Reports,
        Settings,
        Share,
        Onboarding,
    }
}

impl AppFlow {
    #[must_use]
    pub const fn is_modal(self) -> bool {
        matches!(self, AppFlow::Settings | AppFlow::Share)
    }
}

/// Login and onboarding both lead to the dashboard.
#[must_use]
pub fn default_continuations() -> ContinuationTable {
    ContinuationTable::new()
        .with(AppFlow::Login.into(), AppFlow::Dashboard.into())
        .with(AppFlow::Onboarding.into(), AppFlow::Dashboard.into())
}

/// Builds the demo orchestrator. A non-empty `[continuation]` table in the
/// config replaces the default one.
pub fn orchestrator(config: &SwitchyardConfig, switchboard: &Switchboard) -> Orchestrator {
    let continuation = if config.continuation.is_empty() {
        default_continuations()
    } else {
        config.continuation.clone()
    };
    let factory = DemoFactory {
        switchboard: switchboard.clone(),
    };
    let presenter = TerminalPresenter::new(Duration::from_millis(config.effect_ms()));
    Orchestrator::new(factory, presenter, config.orchestrator_settings())
        .with_continuation(continuation)
}

/// Delegate handles of every controller built so far, so the script driver
/// can act on behalf of a controller.
#[derive(Clone, Default)]
pub struct Switchboard(Rc<RefCell<HashMap<FlowId, DelegateHandle>>>);

impl Switchboard {
    fn install(&self, flow: FlowId, delegate: DelegateHandle) {
        self.0.borrow_mut().insert(flow, delegate);
    }

    /// Handle of the most recent controller built for `flow`.
    #[must_use]
    pub fn delegate(&self, flow: AppFlow) -> Option<DelegateHandle> {
        let id = FlowId::from(flow);
        self.0.borrow().get(&id).cloned()
    }
}

struct DemoFactory {
    switchboard: Switchboard,
}

impl ControllerFactory for DemoFactory {
    fn controller(&mut self, flow: &FlowId, _data: Option<&FlowData>) -> Box<dyn FlowController> {
        let flow = match AppFlow::try_from(flow) {
            Ok(flow) => flow,
            Err(foreign) => panic!("no controller registered: {foreign}"),
        };
        match flow {
            AppFlow::Onboarding => Box::new(OnboardingController::new(self.switchboard.clone())),
            other => Box::new(ScreenController::new(other, self.switchboard.clone())),
        }
    }
}

fn record(flow: &FlowId, verb: &str, result: Result<LifecycleState, LifecycleError>) {
    match result {
        Ok(state) => tracing::info!(flow = %flow, verb, ?state, "controller lifecycle"),
        Err(err) => tracing::warn!(flow = %flow, verb, error = %err, "controller lifecycle misuse"),
    }
}

/// A plain screen. Login reports who signed in when it ends.
struct ScreenController {
    flow: AppFlow,
    id: FlowId,
    lifecycle: Lifecycle,
    switchboard: Switchboard,
    data: Option<FlowData>,
}

impl ScreenController {
    fn new(flow: AppFlow, switchboard: Switchboard) -> Self {
        Self {
            flow,
            id: flow.into(),
            lifecycle: Lifecycle::new(),
            switchboard,
            data: None,
        }
    }
}

impl FlowController for ScreenController {
    fn flow(&self) -> &FlowId {
        &self.id
    }

    fn is_modal(&self) -> bool {
        self.flow.is_modal()
    }

    fn set_delegate(&mut self, delegate: DelegateHandle) {
        self.switchboard.install(self.id.clone(), delegate);
    }

    fn begin(&mut self, data: Option<FlowData>) {
        let slot = Slot::for_modal(self.is_modal());
        record(&self.id, "begin", self.lifecycle.begin(slot));
        self.data = data;
    }

    fn pause(&mut self) {
        record(&self.id, "pause", self.lifecycle.pause());
    }

    fn resume(&mut self) {
        record(&self.id, "resume", self.lifecycle.resume());
    }

    fn end(&mut self) -> Option<FlowData> {
        record(&self.id, "end", self.lifecycle.end());
        if self.flow != AppFlow::Login {
            return None;
        }
        let user = self
            .data
            .as_ref()
            .and_then(|data| data.get("user"))
            .cloned()
            .unwrap_or_else(|| json!("guest"));
        Some(FlowData::new(json!({ "signed_in": true, "user": user })))
    }
}

/// Onboarding payload: the steps to walk through, in order. `back` pops.
#[derive(Debug, Default, Deserialize)]
struct OnboardingPlan {
    #[serde(default)]
    steps: Vec<String>,
}

const DEFAULT_STEPS: [&str; 4] = ["welcome", "profile", "permissions", "review"];

/// Steps and the panel each one renders into. `review` reuses the profile
/// form, so reaching it pops the trail back to that entry.
const PANELS: [(&str, &str); 4] = [
    ("welcome", "intro"),
    ("profile", "profile-form"),
    ("permissions", "permission-list"),
    ("review", "profile-form"),
];

struct OnboardingController {
    id: FlowId,
    lifecycle: Lifecycle,
    switchboard: Switchboard,
    registry: StepRegistry<&'static str>,
    trail: StepTrail<&'static str>,
}

impl OnboardingController {
    fn new(switchboard: Switchboard) -> Self {
        let id = FlowId::from(AppFlow::Onboarding);
        let mut registry = StepRegistry::new();
        for (step, panel) in PANELS {
            if let Err(err) = registry.register(FlowStep::new(id.clone(), step), panel) {
                tracing::warn!(error = %err, "onboarding step table is inconsistent");
            }
        }
        Self {
            id,
            lifecycle: Lifecycle::new(),
            switchboard,
            registry,
            trail: StepTrail::new(),
        }
    }

    fn walk(&mut self, steps: &[String]) {
        for name in steps {
            if name == "back" {
                let popped = self.trail.back();
                tracing::info!(flow = %self.id, popped = ?popped.map(|s| s.key().to_string()), "onboarding back");
                continue;
            }
            let step = FlowStep::new(self.id.clone(), name.as_str());
            match self.trail.show(&self.registry, &step) {
                Ok(change) => {
                    tracing::info!(flow = %self.id, %step, ?change, depth = self.trail.len(), "onboarding step");
                }
                Err(err) => tracing::warn!(flow = %self.id, error = %err, "skipping onboarding step"),
            }
        }
    }
}

impl FlowController for OnboardingController {
    fn flow(&self) -> &FlowId {
        &self.id
    }

    fn is_modal(&self) -> bool {
        false
    }

    fn set_delegate(&mut self, delegate: DelegateHandle) {
        self.switchboard.install(self.id.clone(), delegate);
    }

    fn begin(&mut self, data: Option<FlowData>) {
        record(&self.id, "begin", self.lifecycle.begin(Slot::Primary));
        let plan = match data.map(|data| data.decode::<OnboardingPlan>()) {
            Some(Ok(plan)) => plan,
            Some(Err(err)) => {
                tracing::warn!(flow = %self.id, error = %err, "ignoring onboarding payload");
                OnboardingPlan::default()
            }
            None => OnboardingPlan::default(),
        };
        let steps = if plan.steps.is_empty() {
            DEFAULT_STEPS.iter().map(ToString::to_string).collect()
        } else {
            plan.steps
        };
        self.walk(&steps);
    }

    fn pause(&mut self) {
        record(&self.id, "pause", self.lifecycle.pause());
    }

    fn resume(&mut self) {
        record(&self.id, "resume", self.lifecycle.resume());
    }

    fn end(&mut self) -> Option<FlowData> {
        record(&self.id, "end", self.lifecycle.end());
        let trail: Vec<&str> = self.trail.steps().map(FlowStep::key).collect();
        Some(FlowData::new(json!({
            "trail": trail,
            "at": self.trail.current().map(FlowStep::key),
        })))
    }
}

const FRAME: Duration = Duration::from_millis(16);

/// Prints each transition and completes it once its effect has run out.
pub struct TerminalPresenter {
    duration: Duration,
}

impl TerminalPresenter {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    fn run(
        &self,
        kind: TransitionKind,
        controller: &dyn FlowController,
        animated: bool,
        completion: Completion,
    ) {
        let flow = controller.flow().clone();
        let mut effect = TransitionEffect::for_request(kind, animated, self.duration);
        let verb = match kind {
            TransitionKind::Present => "present",
            TransitionKind::Dismiss => "dismiss",
        };
        let layer = if controller.is_modal() { "modal" } else { "primary" };
        println!("{verb:>8} {flow} [{layer}]");

        tokio::spawn(async move {
            let started = Instant::now();
            let mut frames = 0u32;
            while let EffectPhase::Running { .. } = effect.phase() {
                let step = FRAME.min(effect.remaining());
                tokio::time::sleep(step).await;
                effect.advance(step);
                frames += 1;
            }
            tracing::debug!(
                flow = %flow,
                verb,
                frames,
                elapsed = ?started.elapsed(),
                "effect finished"
            );
            completion.complete();
        });
    }
}

impl Presenter for TerminalPresenter {
    fn present(&mut self, controller: &dyn FlowController, animated: bool, completion: Completion) {
        self.run(TransitionKind::Present, controller, animated, completion);
    }

    fn dismiss(&mut self, controller: &dyn FlowController, animated: bool, completion: Completion) {
        self.run(TransitionKind::Dismiss, controller, animated, completion);
    }
}
