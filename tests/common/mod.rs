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

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use portis_relay::ids::SequentialIds;
use portis_relay::{ChannelEndpoint, Envelope, InboundEvent, JsonRpcRequest, Relay, RequestId};
use serde_json::{json, Value};

pub const ORIGIN: &str = "https://app.portis.io";

/// Endpoint that records everything the relay asks of it.
#[derive(Default)]
pub struct RecordingEndpoint {
    sent: Mutex<Vec<Envelope>>,
    shows: AtomicUsize,
    hides: AtomicUsize,
}

impl RecordingEndpoint {
    pub fn sent(&self) -> Vec<Envelope> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_ids(&self) -> Vec<RequestId> {
        self.sent()
            .into_iter()
            .map(|env| {
                assert_eq!(env.msg_type, "request");
                let req: JsonRpcRequest = serde_json::from_value(env.payload.unwrap()).unwrap();
                req.id
            })
            .collect()
    }

    pub fn shows(&self) -> usize {
        self.shows.load(Ordering::SeqCst)
    }

    pub fn hides(&self) -> usize {
        self.hides.load(Ordering::SeqCst)
    }
}

impl ChannelEndpoint for RecordingEndpoint {
    fn send(&self, envelope: Envelope) {
        self.sent.lock().unwrap().push(envelope);
    }

    fn show(&self) {
        self.shows.fetch_add(1, Ordering::SeqCst);
    }

    fn hide(&self) {
        self.hides.fetch_add(1, Ordering::SeqCst);
    }

    fn authority_origin(&self) -> &str {
        ORIGIN
    }
}

pub fn relay() -> Relay<RecordingEndpoint> {
    Relay::with_endpoint(
        RecordingEndpoint::default(),
        Arc::new(SequentialIds::starting_at(1000)),
    )
}

pub fn from_authority<E: ChannelEndpoint>(relay: &Relay<E>, data: Value) {
    relay.dispatch(InboundEvent::new(ORIGIN, data));
}

pub fn ready<E: ChannelEndpoint>(relay: &Relay<E>) {
    from_authority(relay, json!({"msgType": "ready"}));
}

pub fn respond<E: ChannelEndpoint>(relay: &Relay<E>, id: Value, result: Value) {
    from_authority(
        relay,
        json!({
            "msgType": "response",
            "payload": {"id": id, "jsonrpc": "2.0", "result": result}
        }),
    );
}

pub fn request(id: i64, method: &str) -> JsonRpcRequest {
    JsonRpcRequest::new(id, method, vec![])
}
