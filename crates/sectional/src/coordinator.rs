//! Update coordination: the per-adapter transaction state machine
//! and the queue of deferred requests.
//!
//! At most one transaction touches the container at a time. A request
//! arriving while one is in flight is queued and started strictly
//! after it; the adapter drains the queue as a single driver, so
//! requests never interleave. A reload supersedes every update still
//! waiting in the queue.

use std::collections::VecDeque;

/// Completion callback for an update or reload request. Receives
/// `true` when the transaction finished, `false` when it was aborted
/// or dropped.
pub type Completion = Box<dyn FnOnce(bool) + Send>;

/// Phase of the transaction currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateState {
    /// No transaction in flight.
    #[default]
    Idle,
    /// Snapshotting objects and computing the delta.
    Diffing,
    /// Mutating controllers and the container.
    Applying,
}

/// A deferred request waiting for the in-flight transaction.
pub(crate) enum UpdateRequest {
    /// An incremental update (`perform_update`).
    Update(Completion),
    /// A full reload (`reload`).
    Reload(Completion),
}

/// FIFO of deferred requests plus the in-flight state.
///
/// The queue itself never executes anything; the adapter begins a
/// transaction with [`try_begin`](UpdateQueue::try_begin) and keeps
/// pulling follow-up work with [`take_next`](UpdateQueue::take_next)
/// until the queue reports idle.
pub(crate) struct UpdateQueue {
    state: UpdateState,
    pending: VecDeque<UpdateRequest>,
}

impl UpdateQueue {
    pub(crate) fn new() -> Self {
        Self {
            state: UpdateState::Idle,
            pending: VecDeque::new(),
        }
    }

    pub(crate) fn state(&self) -> UpdateState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: UpdateState) {
        self.state = state;
    }

    /// Claims the driver role. Returns `true` and moves to `Diffing`
    /// if no transaction was in flight; the caller must then drive
    /// the queue to completion.
    pub(crate) fn try_begin(&mut self) -> bool {
        if self.state == UpdateState::Idle {
            self.state = UpdateState::Diffing;
            true
        } else {
            false
        }
    }

    /// Defers an update behind the in-flight transaction.
    pub(crate) fn enqueue_update(&mut self, completion: Completion) {
        self.pending.push_back(UpdateRequest::Update(completion));
    }

    /// Defers a reload, dropping every update still waiting in the
    /// queue. Returns the dropped updates' completions; the caller
    /// invokes them with `false` outside the queue lock.
    pub(crate) fn enqueue_reload(&mut self, completion: Completion) -> Vec<Completion> {
        let mut dropped = Vec::new();
        let mut kept = VecDeque::new();
        for request in self.pending.drain(..) {
            match request {
                UpdateRequest::Update(c) => dropped.push(c),
                reload @ UpdateRequest::Reload(_) => kept.push_back(reload),
            }
        }
        self.pending = kept;
        self.pending.push_back(UpdateRequest::Reload(completion));
        dropped
    }

    /// Pulls the next deferred request, or returns the queue to idle.
    pub(crate) fn take_next(&mut self) -> Option<UpdateRequest> {
        match self.pending.pop_front() {
            Some(request) => {
                self.state = UpdateState::Diffing;
                Some(request)
            }
            None => {
                self.state = UpdateState::Idle;
                None
            }
        }
    }
}
