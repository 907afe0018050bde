//! Host-dispatched gate.
//!
//! Some hosts require their event bus to be driven from one execution
//! context. [`HostDispatchGate`] sends each event to a [`HostDispatcher`]
//! running on that context and blocks the engine thread until the reply
//! arrives.

use crate::gate::{GateOutcome, ListenerGate, NotificationGate};
use quest_core::{NotificationError, ProgressionEvent, QuestResult};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// One event awaiting a decision from the host.
#[derive(Debug)]
pub struct DispatchRequest {
    pub event: ProgressionEvent,
    pub reply: oneshot::Sender<QuestResult<GateOutcome>>,
}

/// Engine-side handle of the host channel.
#[derive(Debug, Clone)]
pub struct HostDispatchGate {
    requests: mpsc::UnboundedSender<DispatchRequest>,
}

impl HostDispatchGate {
    /// Create a connected gate and dispatcher. The dispatcher must be spawned
    /// on the host runtime with [`HostDispatcher::run`].
    pub fn connect(listeners: Arc<ListenerGate>) -> (Self, HostDispatcher) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self { requests: tx },
            HostDispatcher {
                requests: rx,
                listeners,
            },
        )
    }

    /// True once the dispatcher has stopped.
    pub fn is_closed(&self) -> bool {
        self.requests.is_closed()
    }
}

impl NotificationGate for HostDispatchGate {
    /// Blocks the calling thread. Must not be called from inside an async
    /// context.
    fn publish(&self, event: ProgressionEvent) -> QuestResult<GateOutcome> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(DispatchRequest { event, reply })
            .map_err(|_| NotificationError::HostUnavailable)?;
        response
            .blocking_recv()
            .map_err(|_| NotificationError::HostUnavailable)?
    }
}

/// Host-side task that runs listeners for events sent by the engine.
#[derive(Debug)]
pub struct HostDispatcher {
    requests: mpsc::UnboundedReceiver<DispatchRequest>,
    listeners: Arc<ListenerGate>,
}

impl HostDispatcher {
    /// Serve requests until every [`HostDispatchGate`] handle is dropped.
    pub async fn run(mut self) {
        tracing::debug!("Host dispatcher started");
        while let Some(request) = self.requests.recv().await {
            self.handle(request);
        }
        tracing::debug!("Host dispatcher stopped");
    }

    fn handle(&self, request: DispatchRequest) {
        let DispatchRequest { event, reply } = request;
        let quest = event.quest.clone();
        let outcome = self.listeners.publish(event);
        if reply.send(outcome).is_err() {
            tracing::warn!(quest = %quest, "Engine stopped waiting for dispatch reply");
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use quest_core::{Progress, QuestError, QuestKey};
    use uuid::Uuid;

    fn event(proposed: u32) -> ProgressionEvent {
        ProgressionEvent::new(
            Uuid::now_v7(),
            QuestKey {
                category: "week-2".to_string(),
                id: "miner".to_string(),
            },
            Progress::ZERO,
            Progress::from(proposed),
            false,
        )
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn test_round_trip_through_host() {
        let rt = runtime();
        let listeners = Arc::new(ListenerGate::new());
        listeners.register(|e: &mut ProgressionEvent| e.set_added_progress(Progress::new(2)));

        let (gate, dispatcher) = HostDispatchGate::connect(listeners);
        rt.spawn(dispatcher.run());

        let outcome = gate.publish(event(5)).unwrap();
        assert_eq!(outcome, GateOutcome::accepted(Progress::new(2)));
    }

    #[test]
    fn test_veto_through_host() {
        let rt = runtime();
        let listeners = Arc::new(ListenerGate::new());
        listeners.register(|e: &mut ProgressionEvent| e.cancel());

        let (gate, dispatcher) = HostDispatchGate::connect(listeners);
        rt.spawn(dispatcher.run());

        assert!(gate.publish(event(5)).unwrap().vetoed);
    }

    #[test]
    fn test_dropped_dispatcher_is_unavailable() {
        let (gate, dispatcher) = HostDispatchGate::connect(Arc::new(ListenerGate::new()));
        drop(dispatcher);

        assert!(gate.is_closed());
        assert_eq!(
            gate.publish(event(1)),
            Err(QuestError::Notification(NotificationError::HostUnavailable))
        );
    }

    #[test]
    fn test_dispatcher_stops_when_gates_drop() {
        let rt = runtime();
        let (gate, dispatcher) = HostDispatchGate::connect(Arc::new(ListenerGate::new()));
        let handle = rt.spawn(dispatcher.run());
        drop(gate);

        rt.block_on(handle).unwrap();
    }
}
