//! Core domain types for Switchyard.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies:
//! flow identity, step identity, payloads, and controller lifecycle tracking.
//! Everything here can be used from any layer of the application.

#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod effect;
mod flow;
mod lifecycle;
mod payload;
mod step;

pub use effect::{EffectPhase, TransitionEffect, TransitionKind};
pub use flow::{Flow, FlowExt, FlowId, FlowIdParseError, FlowKey, FlowKind, ForeignFlow};
pub use lifecycle::{Lifecycle, LifecycleError, LifecycleState, Slot, Verb};
pub use payload::{FlowData, PayloadError};
pub use step::{FlowStep, StepRegistry, StepRegistryError, StepTrail, TrailChange};
