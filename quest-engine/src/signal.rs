//! Activity signals fed into the engine.

use crate::eligibility::SignalContext;
use quest_core::{Progress, THROW_PROJECTILE};
use serde::{Deserialize, Serialize};

/// One unit of observed activity.
///
/// `context` is the eligibility evaluator for this signal; by default the
/// values the signal source attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSignal<E = SignalContext> {
    pub signal_type: String,
    pub magnitude: Progress,
    /// Replace stored progress with `magnitude` instead of adding to it.
    #[serde(default)]
    pub absolute_override: bool,
    pub context: E,
}

impl<E> ProgressSignal<E> {
    pub fn new(signal_type: impl Into<String>, magnitude: impl Into<Progress>, context: E) -> Self {
        Self {
            signal_type: signal_type.into(),
            magnitude: magnitude.into(),
            absolute_override: false,
            context,
        }
    }

    pub fn with_override(mut self, absolute_override: bool) -> Self {
        self.absolute_override = absolute_override;
        self
    }
}

impl ProgressSignal<SignalContext> {
    /// A subject launched one projectile of `entity_type`.
    pub fn projectile_launch(entity_type: impl Into<String>) -> Self {
        Self::new(
            THROW_PROJECTILE,
            1u32,
            SignalContext::empty().root(entity_type),
        )
    }
}
