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

//! Session state and event subscribers.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::constants::methods;
use crate::models::JsonRpcResponse;

/// Account and network last reported by the remote authority.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionState {
    account: Option<String>,
    network: Option<String>,
}

impl SessionState {
    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn network(&self) -> Option<&str> {
        self.network.as_deref()
    }

    /// Update the cached fields from the response to `method`, if it is an
    /// account or network query.
    pub fn observe(&mut self, method: &str, response: &JsonRpcResponse) {
        let result = response.result.as_ref();
        match method {
            methods::ETH_ACCOUNTS | methods::ETH_COINBASE => {
                // eth_accounts answers with a list, eth_coinbase with a single address
                let first = match result {
                    Some(Value::Array(items)) => items.first(),
                    other => other,
                };
                self.account = first.and_then(Value::as_str).map(str::to_string);
                debug!("Session account is now {:?}", self.account);
            }
            methods::NET_VERSION => {
                self.network = result.and_then(scalar_string);
                debug!("Session network is now {:?}", self.network);
            }
            _ => {}
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub type EventCallback = Arc<dyn Fn(&Value) + Send + Sync>;

struct Subscriber {
    event_name: String,
    callback: EventCallback,
}

/// Append-only subscriber list; delivery follows registration order.
#[derive(Default)]
pub struct Subscribers {
    entries: Vec<Subscriber>,
}

impl Subscribers {
    pub fn register(&mut self, event_name: impl Into<String>, callback: EventCallback) {
        self.entries.push(Subscriber {
            event_name: event_name.into(),
            callback,
        });
    }

    /// Callbacks registered under `event_name`, in registration order.
    pub fn listeners(&self, event_name: &str) -> Vec<EventCallback> {
        self.entries
            .iter()
            .filter(|s| s.event_name == event_name)
            .map(|s| Arc::clone(&s.callback))
            .collect()
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|s| &s.event_name))
            .finish()
    }
}
