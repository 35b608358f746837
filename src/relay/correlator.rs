// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Request queue and correlator.
//!
//! Outbound requests wait in a FIFO queue until the relay drains it; each
//! drained request moves into the pending map under its id, in the same step
//! that transmits it. A pending entry is removed exactly once, when its first
//! resolution arrives. Completions are one-shot senders consumed on use, so
//! a caller can never be notified twice.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::errors::RelayError;
use crate::models::{JsonRpcRequest, JsonRpcResponse, RequestId};

pub type Outcome = Result<JsonRpcResponse, RelayError>;

/// Sending half of a request's one-time notification.
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<Outcome>,
}

impl Completion {
    pub fn new(id: RequestId) -> (Self, PendingResponse) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, PendingResponse { id, rx })
    }

    pub fn complete(self, outcome: Outcome) {
        if self.tx.send(outcome).is_err() {
            trace!("Caller dropped its response handle");
        }
    }
}

/// Handle the caller awaits for a relayed request's outcome.
///
/// Yields [`RelayError::SessionClosed`] if the relay is dropped while the
/// request is still queued or pending.
#[derive(Debug)]
pub struct PendingResponse {
    id: RequestId,
    rx: oneshot::Receiver<Outcome>,
}

impl PendingResponse {
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// Non-blocking check; `None` while the request is unresolved.
    pub fn try_outcome(&mut self) -> Option<Outcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(RelayError::SessionClosed)),
        }
    }
}

impl Future for PendingResponse {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(RelayError::SessionClosed)))
    }
}

#[derive(Debug)]
pub struct QueueItem {
    pub request: JsonRpcRequest,
    completion: Completion,
}

#[derive(Debug)]
pub struct PendingEntry {
    pub request: JsonRpcRequest,
    completion: Completion,
}

impl PendingEntry {
    pub fn complete(self, outcome: Outcome) {
        self.completion.complete(outcome);
    }
}

#[derive(Debug, Default)]
pub struct Correlator {
    queue: VecDeque<QueueItem>,
    pending: HashMap<RequestId, PendingEntry>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail of the queue, whatever the channel state.
    pub fn enqueue(&mut self, request: JsonRpcRequest, completion: Completion) {
        trace!("Queued {} ({})", request.id, request.method);
        self.queue.push_back(QueueItem {
            request,
            completion,
        });
    }

    /// Transmit queued requests head first, registering each as pending
    /// before the next is popped. Returns how many were transmitted.
    ///
    /// A request whose id is already pending, or whose transmission fails,
    /// is completed with the error and never enters the pending map.
    pub fn drain<F>(&mut self, mut transmit: F) -> usize
    where
        F: FnMut(&JsonRpcRequest) -> Result<(), RelayError>,
    {
        let mut sent = 0;
        while let Some(item) = self.queue.pop_front() {
            let id = item.request.id.clone();
            if self.pending.contains_key(&id) {
                warn!("Request id {} already pending, rejecting duplicate", id);
                item.completion
                    .complete(Err(RelayError::DuplicateRequestId(id)));
                continue;
            }

            match transmit(&item.request) {
                Ok(()) => {
                    self.pending.insert(
                        id,
                        PendingEntry {
                            request: item.request,
                            completion: item.completion,
                        },
                    );
                    sent += 1;
                }
                Err(e) => {
                    warn!("Failed to transmit {}: {}", id, e);
                    item.completion.complete(Err(e));
                }
            }
        }
        sent
    }

    /// Remove the pending entry for `id` without completing it.
    pub fn take(&mut self, id: &RequestId) -> Option<PendingEntry> {
        let entry = self.pending.remove(id);
        if entry.is_none() {
            debug!("No pending request for id {}, ignoring", id);
        }
        entry
    }

    /// Complete and remove the pending entry for `id`. Unknown ids are a
    /// no-op; returns whether an entry was resolved.
    pub fn resolve(&mut self, id: &RequestId, outcome: Outcome) -> bool {
        match self.take(id) {
            Some(entry) => {
                entry.complete(outcome);
                true
            }
            None => false,
        }
    }

    /// Deny every request still waiting in the queue. Pending entries are
    /// left untouched. Returns how many were denied.
    pub fn deny_queued(&mut self) -> usize {
        let denied = self.queue.len();
        for item in self.queue.drain(..) {
            item.completion.complete(Err(RelayError::UserDenied));
        }
        denied
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: &RequestId) -> bool {
        self.pending.contains_key(id)
    }
}
