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

//! Protocol dispatcher.
//!
//! Decodes inbound envelopes into [`InboundMessage`] and applies each one to
//! the relay state. Every message is handled on its own; the only carried
//! state is the channel readiness, the session and the correlator, and the
//! dispatcher touches the correlator only through its public operations.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, trace};

use crate::channel::ChannelEndpoint;
use crate::constants::{events, msg, relay};
use crate::errors::RelayError;
use crate::models::{Envelope, JsonRpcResponse, RequestId};
use crate::relay::session::EventCallback;
use crate::relay::RelayState;

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum InboundMessage {
    Ready,
    Response(JsonRpcResponse),
    Show,
    Hide,
    /// `id: None` is a broadcast denial of every queued request
    Denied { id: Option<RequestId> },
    Login { address: Value },
    PurchaseInitiated(Value),
    /// Forward compatibility: unknown types are ignored
    Unknown(String),
}

#[derive(Deserialize)]
struct DenialPayload {
    #[serde(default)]
    id: Option<RequestId>,
}

#[derive(Deserialize)]
struct LoginPayload {
    #[serde(default)]
    address: Value,
}

impl InboundMessage {
    pub fn decode(envelope: Envelope) -> Result<Self, serde_json::Error> {
        let payload = envelope.payload.unwrap_or(Value::Null);
        let message = match envelope.msg_type.as_str() {
            msg::READY => Self::Ready,
            msg::RESPONSE => Self::Response(serde_json::from_value(payload)?),
            msg::SHOW => Self::Show,
            msg::HIDE => Self::Hide,
            msg::USER_DENIED => Self::Denied {
                id: serde_json::from_value::<Option<DenialPayload>>(payload)?.and_then(|p| p.id),
            },
            msg::LOGIN => Self::Login {
                address: serde_json::from_value::<LoginPayload>(payload)?.address,
            },
            msg::PURCHASE_INITIATED => Self::PurchaseInitiated(payload),
            other => Self::Unknown(other.to_string()),
        };
        Ok(message)
    }
}

/// A subscriber callback to run once the state lock is released.
pub struct Delivery {
    callback: EventCallback,
    payload: Value,
}

impl Delivery {
    pub fn run(self) {
        (self.callback)(&self.payload);
    }
}

pub(crate) struct Dispatcher<'a, E: ChannelEndpoint> {
    state: &'a mut RelayState,
    endpoint: &'a E,
}

impl<'a, E: ChannelEndpoint> Dispatcher<'a, E> {
    pub(crate) fn new(state: &'a mut RelayState, endpoint: &'a E) -> Self {
        Self { state, endpoint }
    }

    pub(crate) fn handle(self, message: InboundMessage) -> Vec<Delivery> {
        match message {
            InboundMessage::Ready => {
                if self.state.channel.mark_ready() {
                    info!(
                        "Remote authority ready, flushing {} queued request(s)",
                        self.state.correlator.queued_len()
                    );
                }
                self.state.drain(self.endpoint);
            }
            InboundMessage::Response(response) => {
                if let Some(entry) = self.state.correlator.take(&response.id) {
                    trace!("Response for {} ({})", response.id, entry.request.method);
                    self.state.session.observe(&entry.request.method, &response);
                    entry.complete(Ok(response));
                }
                self.state.drain(self.endpoint);
            }
            InboundMessage::Show => self.endpoint.show(),
            InboundMessage::Hide => self.endpoint.hide(),
            InboundMessage::Denied { id: Some(id) } => {
                if self
                    .state
                    .correlator
                    .resolve(&id, Err(RelayError::UserDenied))
                {
                    info!("User denied request {}", id);
                }
                self.state.drain(self.endpoint);
            }
            InboundMessage::Denied { id: None } => {
                let denied = self.state.correlator.deny_queued();
                info!("User denied {} queued request(s)", denied);
                self.state.drain(self.endpoint);
            }
            InboundMessage::Login { address } => {
                return self.deliver(
                    events::LOGIN,
                    json!({ "provider": relay::PROVIDER, "address": address }),
                );
            }
            InboundMessage::PurchaseInitiated(payload) => {
                return self.deliver(events::PURCHASE_INITIATED, payload);
            }
            InboundMessage::Unknown(msg_type) => {
                trace!("Ignoring unknown message type '{}'", msg_type);
            }
        }
        Vec::new()
    }

    fn deliver(&self, event_name: &str, payload: Value) -> Vec<Delivery> {
        self.state
            .subscribers
            .listeners(event_name)
            .into_iter()
            .map(|callback| Delivery {
                callback,
                payload: payload.clone(),
            })
            .collect()
    }
}
