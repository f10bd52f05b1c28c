//! Timing for presentation effects.
//!
//! Presenters that animate a surface in or out drive a [`TransitionEffect`]
//! and fire their completion once it reports [`EffectPhase::Completed`].

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectPhase {
    Running { progress: f32 },
    Completed,
}

fn normalized_progress(elapsed: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }

    let elapsed = elapsed.as_secs_f32();
    let total = duration.as_secs_f32();
    (elapsed / total).clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
struct EffectTimer {
    elapsed: Duration,
    duration: Duration,
}

impl EffectTimer {
    fn new(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration,
        }
    }

    fn advance(&mut self, delta: Duration) {
        self.elapsed = self.elapsed.saturating_add(delta);
    }

    fn progress(&self) -> f32 {
        normalized_progress(self.elapsed, self.duration)
    }

    fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Present,
    Dismiss,
}

#[derive(Debug, Clone)]
pub struct TransitionEffect {
    kind: TransitionKind,
    timer: EffectTimer,
}

impl TransitionEffect {
    #[must_use]
    pub fn new(kind: TransitionKind, duration: Duration) -> Self {
        Self {
            kind,
            timer: EffectTimer::new(duration),
        }
    }

    /// Zero-length effect for non-animated transitions.
    #[must_use]
    pub fn instant(kind: TransitionKind) -> Self {
        Self::new(kind, Duration::ZERO)
    }

    #[must_use]
    pub fn for_request(kind: TransitionKind, animated: bool, duration: Duration) -> Self {
        if animated {
            Self::new(kind, duration)
        } else {
            Self::instant(kind)
        }
    }

    pub fn advance(&mut self, delta: Duration) {
        self.timer.advance(delta);
    }

    #[must_use]
    pub fn phase(&self) -> EffectPhase {
        if self.timer.is_finished() {
            EffectPhase::Completed
        } else {
            EffectPhase::Running {
                progress: self.timer.progress(),
            }
        }
    }

    #[must_use]
    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.timer.remaining()
    }
}
