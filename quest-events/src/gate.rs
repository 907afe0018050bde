//! Gate trait and the synchronous listener gate.

use quest_core::{NotificationError, Progress, ProgressionEvent, QuestResult};
use std::fmt;
use std::sync::{Arc, RwLock};

// ============================================================================
// GATE OUTCOME
// ============================================================================

/// What the receivers decided about a proposed advancement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateOutcome {
    pub vetoed: bool,
    /// Delta to commit, possibly shrunk by a listener.
    pub delta: Progress,
}

impl GateOutcome {
    pub fn accepted(delta: Progress) -> Self {
        Self {
            vetoed: false,
            delta,
        }
    }

    pub fn vetoed(delta: Progress) -> Self {
        Self {
            vetoed: true,
            delta,
        }
    }

    pub fn from_event(event: &ProgressionEvent) -> Self {
        Self {
            vetoed: event.is_cancelled(),
            delta: event.added_progress(),
        }
    }
}

// ============================================================================
// TRAITS
// ============================================================================

/// Publishes progression events and reports the receivers' decision.
///
/// `publish` blocks until the outcome is known.
pub trait NotificationGate: Send + Sync {
    fn publish(&self, event: ProgressionEvent) -> QuestResult<GateOutcome>;
}

/// A receiver of progression events.
///
/// Listeners may call [`ProgressionEvent::cancel`] or
/// [`ProgressionEvent::set_added_progress`]. Plain closures are listeners.
pub trait ProgressionListener: Send + Sync {
    fn on_progression(&self, event: &mut ProgressionEvent) -> Result<(), NotificationError>;

    fn name(&self) -> &str {
        "anonymous"
    }
}

impl<F> ProgressionListener for F
where
    F: Fn(&mut ProgressionEvent) + Send + Sync,
{
    fn on_progression(&self, event: &mut ProgressionEvent) -> Result<(), NotificationError> {
        self(event);
        Ok(())
    }
}

// ============================================================================
// LISTENER GATE
// ============================================================================

/// Ordered list of listeners invoked on the publishing thread.
#[derive(Default)]
pub struct ListenerGate {
    listeners: RwLock<Vec<Arc<dyn ProgressionListener>>>,
}

impl ListenerGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener. Listeners run in registration order.
    pub fn register(&self, listener: impl ProgressionListener + 'static) {
        let mut listeners = match self.listeners.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        listeners.push(Arc::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.snapshot().len()
    }

    /// Run the listeners against `event` in order, stopping at the first
    /// cancellation.
    pub fn dispatch(&self, event: &mut ProgressionEvent) -> Result<(), NotificationError> {
        for listener in self.snapshot() {
            listener.on_progression(event)?;
            if event.is_cancelled() {
                tracing::debug!(
                    quest = %event.quest,
                    user = %event.user_id,
                    listener = listener.name(),
                    "Progression vetoed"
                );
                break;
            }
        }
        Ok(())
    }

    // Listeners run outside the lock so they may register further listeners.
    fn snapshot(&self) -> Vec<Arc<dyn ProgressionListener>> {
        match self.listeners.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl fmt::Debug for ListenerGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerGate")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl NotificationGate for ListenerGate {
    fn publish(&self, mut event: ProgressionEvent) -> QuestResult<GateOutcome> {
        self.dispatch(&mut event)?;
        Ok(GateOutcome::from_event(&event))
    }
}

// ============================================================================
// TESTS
// ============================================================================
