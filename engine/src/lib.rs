//! Flow orchestration engine for Switchyard.
//!
//! This crate owns the two-slot state machine (one primary flow, at most one
//! modal flow on top) and nothing else. Rendering is delegated to a
//! [`Presenter`]; controllers are built on demand by a [`ControllerFactory`]
//! and talk back through a [`DelegateHandle`].

#![allow(clippy::missing_errors_doc)]

mod config;
mod controller;
mod delegate;
mod inbox;
mod orchestrator;
mod presenter;
mod routing;

pub use switchyard_types;

pub use config::{
    CONFIG_ENV, ConfigError, ModalUnderlay, OrchestratorConfig, OrchestratorSettings,
    PresentationConfig, SwitchyardConfig, config_path,
};
pub use controller::{ControllerFactory, FlowController};
pub use delegate::{DelegateEvent, DelegateHandle, FlowControllerDelegate};
pub use inbox::TransitionId;
pub use orchestrator::{
    OccupantView, Orchestrator, SlotSnapshot, TransitionClass, classify,
};
pub use presenter::{Completion, Presenter, PresenterOp};
pub use routing::{
    AfterEnd, ContinuationPolicy, ContinuationTable, DefaultRouting, DelegateRouting,
    NoContinuation, Request, default_begin, default_canceled, default_ended,
};
