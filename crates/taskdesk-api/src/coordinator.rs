//! Single-flight refresh coordination.
//!
//! Owns the refresh state machine and the queue of requests waiting on the
//! in-flight refresh. Both live behind one mutex, which is never held across
//! an `.await`: admission (check-and-set or enqueue) and settlement (drain
//! and reset) are each a single critical section.

use crate::{ApiResponse, ApiResult, RequestDescriptor};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use taskdesk_auth::{RefreshMachine, RefreshMachineInput, RefreshMachineState, RefreshPhase};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// A request that hit 401 while a refresh was in flight.
pub(crate) struct PendingRequest {
    pub(crate) descriptor: RequestDescriptor,
    responder: oneshot::Sender<ApiResult<ApiResponse>>,
}

impl PendingRequest {
    /// Deliver the final outcome to the suspended caller.
    pub(crate) fn settle(self, result: ApiResult<ApiResponse>) {
        if self.responder.send(result).is_err() {
            debug!(path = %self.descriptor.path, "Queued caller went away before settlement");
        }
    }
}

/// What a request that just received a 401 should do next.
pub(crate) enum Admission {
    /// Run the refresh cycle, then replay.
    Lead,
    /// Wait for the in-flight refresh to settle this request.
    Wait(oneshot::Receiver<ApiResult<ApiResponse>>),
    /// The token already changed since this request was sent; replay with it.
    Replay(String),
}

struct CoordinatorState {
    machine: RefreshMachine,
    queue: VecDeque<PendingRequest>,
}

pub(crate) struct RefreshCoordinator {
    state: Mutex<CoordinatorState>,
}

impl RefreshCoordinator {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(CoordinatorState {
                machine: RefreshMachine::new(),
                queue: VecDeque::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn phase(&self) -> RefreshPhase {
        RefreshPhase::from(self.lock().machine.state())
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.lock().queue.len()
    }

    /// Decide the fate of a request that received a 401.
    ///
    /// `sent_with` is the bearer the request carried; `current_token` reads
    /// the persisted access token and is only consulted while idle.
    pub(crate) fn admit<F>(
        &self,
        descriptor: &RequestDescriptor,
        sent_with: Option<&str>,
        current_token: F,
    ) -> Admission
    where
        F: FnOnce() -> Option<String>,
    {
        let mut state = self.lock();

        if *state.machine.state() == RefreshMachineState::Idle {
            if let Some(current) = current_token() {
                if sent_with != Some(current.as_str()) {
                    return Admission::Replay(current);
                }
            }
        }

        match state.machine.consume(&RefreshMachineInput::Unauthorized) {
            Ok(_) => Admission::Lead,
            Err(_) => {
                let (responder, receiver) = oneshot::channel();
                state.queue.push_back(PendingRequest {
                    descriptor: descriptor.clone(),
                    responder,
                });
                debug!(
                    path = %descriptor.path,
                    queue_depth = state.queue.len(),
                    "Refresh in flight, request queued"
                );
                Admission::Wait(receiver)
            }
        }
    }

    /// End the refresh cycle: return to idle and hand back every queued
    /// request, oldest first.
    pub(crate) fn settle(&self) -> Vec<PendingRequest> {
        let mut state = self.lock();
        if state
            .machine
            .consume(&RefreshMachineInput::Settled)
            .is_err()
        {
            warn!("Refresh settled while no refresh was in flight");
        }
        state.queue.drain(..).collect()
    }
}
