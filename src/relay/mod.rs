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

//! Public RPC façade.
//!
//! [`Relay`] is the handle a host application holds. Clones share one
//! [`RelayState`]; every operation on it is synchronous and the lock is
//! never held across an await point, so façade calls and the inbound
//! dispatch loop interleave freely on the same runtime.

pub mod correlator;
pub mod dispatcher;
pub mod session;

pub use correlator::{Completion, Correlator, PendingResponse};
pub use dispatcher::InboundMessage;
pub use session::{EventCallback, SessionState, Subscribers};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::channel::{ChannelEndpoint, ChannelState, FrameEndpoint, FrameHost};
use crate::config::RelayConfig;
use crate::constants::{methods, msg};
use crate::errors::{ConfigError, RelayError};
use crate::ids::{IdSource, UuidIds};
use crate::models::{Envelope, InboundEvent, JsonRpcRequest, JsonRpcResponse};
use dispatcher::Dispatcher;

/// Everything the relay mutates, owned in one place.
#[derive(Debug, Default)]
pub struct RelayState {
    pub(crate) channel: ChannelState,
    pub(crate) session: SessionState,
    pub(crate) correlator: Correlator,
    pub(crate) subscribers: Subscribers,
}

impl RelayState {
    /// Flush the queue to the endpoint. Does nothing until the channel is ready.
    pub(crate) fn drain<E: ChannelEndpoint>(&mut self, endpoint: &E) -> usize {
        if !self.channel.is_ready() {
            trace!(
                "Channel not ready, holding {} request(s)",
                self.correlator.queued_len()
            );
            return 0;
        }
        self.correlator.drain(|request| {
            let envelope = Envelope::with_payload(msg::REQUEST, request)?;
            endpoint.send(envelope);
            Ok(())
        })
    }
}

pub struct Relay<E: ChannelEndpoint = FrameEndpoint> {
    state: Arc<Mutex<RelayState>>,
    endpoint: Arc<E>,
    ids: Arc<dyn IdSource>,
}

impl<E: ChannelEndpoint> Clone for Relay<E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            endpoint: Arc::clone(&self.endpoint),
            ids: Arc::clone(&self.ids),
        }
    }
}

impl Relay<FrameEndpoint> {
    /// Validate `config` against the host page and start the frame.
    ///
    /// Configuration errors are returned before any frame is created.
    /// Must be called from within a tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics outside a tokio runtime, as the frame task is spawned here.
    pub fn new<H: FrameHost>(config: RelayConfig, host: Arc<H>) -> Result<Self, ConfigError> {
        config.validate(&host.hostname())?;
        let endpoint = FrameEndpoint::spawn(host, &config)?;
        info!(network = %config.network, "Relay created for {}", endpoint.authority_origin());
        Ok(Self::with_endpoint(endpoint, Arc::new(UuidIds)))
    }
}

impl<E: ChannelEndpoint> Relay<E> {
    pub fn with_endpoint(endpoint: E, ids: Arc<dyn IdSource>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RelayState::default())),
            endpoint: Arc::new(endpoint),
            ids,
        }
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    fn lock(&self) -> MutexGuard<'_, RelayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a request for the remote authority.
    pub fn send_async(&self, request: JsonRpcRequest) -> PendingResponse {
        let (completion, handle) = Completion::new(request.id.clone());
        let mut state = self.lock();
        state.correlator.enqueue(request, completion);
        state.drain(&*self.endpoint);
        handle
    }

    /// Answer a read-only request from session state.
    ///
    /// Only `eth_accounts`, `eth_coinbase`, `net_version` and
    /// `eth_uninstallFilter` are served; the last one is also relayed
    /// asynchronously and its outcome discarded.
    pub fn send(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse, RelayError> {
        let result = {
            let state = self.lock();
            match request.method.as_str() {
                methods::ETH_ACCOUNTS => json!(state
                    .session
                    .account()
                    .map(|account| vec![account])
                    .unwrap_or_default()),
                methods::ETH_COINBASE => json!(state.session.account()),
                methods::NET_VERSION => json!(state.session.network()),
                methods::ETH_UNINSTALL_FILTER => Value::Bool(true),
                other => return Err(RelayError::UnsupportedSyncMethod(other.to_string())),
            }
        };

        if request.method == methods::ETH_UNINSTALL_FILTER {
            drop(self.send_async(request.clone()));
        }
        Ok(JsonRpcResponse::success(request.id.clone(), result))
    }

    pub fn set_default_email(&self, email: &str) -> PendingResponse {
        self.out_of_band(methods::SET_DEFAULT_EMAIL, vec![json!(email)])
    }

    pub fn show_portis(&self) -> PendingResponse {
        self.out_of_band(methods::SHOW_PORTIS, Vec::new())
    }

    fn out_of_band(&self, method: &str, params: Vec<Value>) -> PendingResponse {
        let request = JsonRpcRequest::new(self.ids.next_id(), method, params);
        debug!("Out-of-band {} as {}", method, request.id);
        self.send_async(request)
    }

    /// Register a callback for an event emitted by the remote authority.
    /// Names are not validated; unknown names never fire.
    pub fn on<F>(&self, event_name: impl Into<String>, callback: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.lock().subscribers.register(event_name, Arc::new(callback));
    }

    /// Always `true`; the relay has no liveness notion.
    pub fn is_connected(&self) -> bool {
        true
    }

    pub fn is_portis(&self) -> bool {
        true
    }

    pub fn account(&self) -> Option<String> {
        self.lock().session.account().map(str::to_string)
    }

    pub fn network(&self) -> Option<String> {
        self.lock().session.network().map(str::to_string)
    }

    pub fn is_ready(&self) -> bool {
        self.lock().channel.is_ready()
    }

    pub fn queued_count(&self) -> usize {
        self.lock().correlator.queued_len()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().correlator.pending_len()
    }

    /// Handle one message from the host's messaging primitive.
    ///
    /// Messages from any origin other than the authority's are ignored
    /// entirely. Subscriber callbacks run after the state lock is released.
    pub fn dispatch(&self, event: InboundEvent) {
        if !self.endpoint.accepts_origin(&event.origin) {
            trace!("Ignoring message from foreign origin {}", event.origin);
            return;
        }

        let message = match serde_json::from_value::<Envelope>(event.data)
            .and_then(InboundMessage::decode)
        {
            Ok(message) => message,
            Err(e) => {
                debug!("Ignoring undecodable message: {}", e);
                return;
            }
        };

        let deliveries = {
            let mut state = self.lock();
            Dispatcher::new(&mut *state, &*self.endpoint).handle(message)
        };
        for delivery in deliveries {
            delivery.run();
        }
    }

    /// Dispatch inbound events until every sender is dropped.
    pub async fn run(&self, mut inbound: mpsc::Receiver<InboundEvent>) {
        while let Some(event) = inbound.recv().await {
            self.dispatch(event);
        }
        info!("Inbound channel closed, dispatch loop exiting");
    }
}
