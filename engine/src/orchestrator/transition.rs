//! Transition classification.
//!
//! Pure decision table: given which slots are occupied and whether the
//! incoming controller is modal, which transition runs. Requests for a flow
//! that already occupies a slot never get here; they resume that occupant.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionClass {
    /// Modal up, modal incoming: end and dismiss the current modal, then
    /// begin and present the new one. Modals never stack.
    ReplaceModal,
    /// Modal up, non-modal incoming: the modal keeps display priority and the
    /// new controller becomes the (paused) primary.
    PrimaryUnderModal,
    /// No modal, primary up, non-modal incoming: end and dismiss the primary,
    /// then begin and present the new one.
    ReplacePrimary,
    /// Nothing to tear down: pause the primary if a modal is incoming, then
    /// begin and present.
    Direct,
}

impl fmt::Display for TransitionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransitionClass::ReplaceModal => "replace-modal",
            TransitionClass::PrimaryUnderModal => "primary-under-modal",
            TransitionClass::ReplacePrimary => "replace-primary",
            TransitionClass::Direct => "direct",
        })
    }
}

#[must_use]
pub fn classify(primary_present: bool, modal_present: bool, next_is_modal: bool) -> TransitionClass {
    match (modal_present, next_is_modal) {
        (true, true) => TransitionClass::ReplaceModal,
        (true, false) => TransitionClass::PrimaryUnderModal,
        (false, false) if primary_present => TransitionClass::ReplacePrimary,
        (false, _) => TransitionClass::Direct,
    }
}
