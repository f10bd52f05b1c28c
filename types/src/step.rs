//! Step identity inside a flow, and the registry presentation layers use to
//! deduplicate visual entries.
//!
//! A multi-view flow moves through steps. The orchestrator never looks at
//! them; a presenter maps each step to a presentation key through an explicit
//! [`StepRegistry`] and keeps a [`StepTrail`] of what is on screen.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flow::FlowId;

/// Identity of one step, scoped to the flow that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowStep {
    flow: FlowId,
    key: String,
}

impl FlowStep {
    #[must_use]
    pub fn new(flow: FlowId, key: impl Into<String>) -> Self {
        Self {
            flow,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn flow(&self) -> &FlowId {
        &self.flow
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn belongs_to(&self, flow: &FlowId) -> bool {
        self.flow == *flow
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.flow, self.key)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StepRegistryError {
    #[error("step {0} is already registered")]
    AlreadyRegistered(FlowStep),
    #[error("step {0} has no presentation key")]
    Unregistered(FlowStep),
}

/// Explicit mapping from step identity to presentation key.
#[derive(Debug, Clone)]
pub struct StepRegistry<K> {
    keys: HashMap<FlowStep, K>,
}

impl<K> Default for StepRegistry<K> {
    fn default() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }
}

impl<K> StepRegistry<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, step: FlowStep, key: K) -> Result<(), StepRegistryError> {
        if self.keys.contains_key(&step) {
            return Err(StepRegistryError::AlreadyRegistered(step));
        }
        self.keys.insert(step, key);
        Ok(())
    }

    #[must_use]
    pub fn key_for(&self, step: &FlowStep) -> Option<&K> {
        self.keys.get(step)
    }

    #[must_use]
    pub fn contains(&self, step: &FlowStep) -> bool {
        self.keys.contains_key(step)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// What [`StepTrail::show`] did to the trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailChange {
    Pushed,
    /// An entry with the same presentation key already existed; everything
    /// above it was removed.
    PoppedTo { removed: usize },
    Unchanged,
}

/// Ordered visual entries of one controller, deduplicated by presentation key.
#[derive(Debug, Clone)]
pub struct StepTrail<K> {
    entries: Vec<(FlowStep, K)>,
}

impl<K> Default for StepTrail<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: Clone + PartialEq> StepTrail<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(
        &mut self,
        registry: &StepRegistry<K>,
        step: &FlowStep,
    ) -> Result<TrailChange, StepRegistryError> {
        let key = registry
            .key_for(step)
            .ok_or_else(|| StepRegistryError::Unregistered(step.clone()))?;

        match self.entries.iter().position(|(_, existing)| existing == key) {
            Some(index) => {
                let removed = self.entries.len() - index - 1;
                self.entries.truncate(index + 1);
                // Same visual entry, possibly reached through a different step.
                self.entries[index].0 = step.clone();
                if removed == 0 {
                    Ok(TrailChange::Unchanged)
                } else {
                    Ok(TrailChange::PoppedTo { removed })
                }
            }
            None => {
                self.entries.push((step.clone(), key.clone()));
                Ok(TrailChange::Pushed)
            }
        }
    }

    pub fn back(&mut self) -> Option<FlowStep> {
        self.entries.pop().map(|(step, _)| step)
    }

    #[must_use]
    pub fn current(&self) -> Option<&FlowStep> {
        self.entries.last().map(|(step, _)| step)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn steps(&self) -> impl Iterator<Item = &FlowStep> {
        self.entries.iter().map(|(step, _)| step)
    }
}
