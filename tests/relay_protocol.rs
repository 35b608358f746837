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

mod common;

use std::sync::{Arc, Mutex};

use common::{from_authority, ready, relay, request, respond, ORIGIN};
use portis_relay::{InboundEvent, JsonRpcRequest, JsonRpcResponse, RelayError, RequestId};
use serde_json::{json, Value};

#[test]
fn test_request_before_ready_is_sent_once_at_ready() {
    let relay = relay();
    let mut handle = relay.send_async(request(1, "eth_accounts"));

    assert!(relay.endpoint().sent().is_empty());
    assert_eq!(relay.queued_count(), 1);

    ready(&relay);

    assert_eq!(relay.endpoint().sent_ids(), vec![RequestId::Num(1)]);
    assert_eq!(relay.queued_count(), 0);
    assert_eq!(relay.pending_count(), 1);
    assert!(handle.try_outcome().is_none());

    // A repeated readiness signal must not resend anything.
    ready(&relay);
    assert_eq!(relay.endpoint().sent().len(), 1);
}

#[test]
fn test_request_after_ready_is_sent_immediately() {
    let relay = relay();
    ready(&relay);

    let _handle = relay.send_async(request(2, "eth_blockNumber"));

    assert_eq!(relay.endpoint().sent_ids(), vec![RequestId::Num(2)]);
    assert_eq!(relay.pending_count(), 1);
}

#[test]
fn test_accounts_response_completes_and_caches_account() {
    let relay = relay();
    let mut handle = relay.send_async(request(1, "eth_accounts"));
    ready(&relay);

    respond(&relay, json!(1), json!(["0xabc"]));

    let response = handle.try_outcome().unwrap().unwrap();
    assert_eq!(response.id, RequestId::Num(1));
    assert_eq!(response.result, Some(json!(["0xabc"])));
    assert_eq!(relay.pending_count(), 0);

    let sync = relay.send(&request(9, "eth_accounts")).unwrap();
    assert_eq!(sync.result, Some(json!(["0xabc"])));
    assert_eq!(
        relay.send(&request(10, "eth_coinbase")).unwrap().result,
        Some(json!("0xabc"))
    );
    assert_eq!(relay.account().as_deref(), Some("0xabc"));
}

#[test]
fn test_network_response_caches_network() {
    let relay = relay();
    ready(&relay);
    let mut handle = relay.send_async(request(4, "net_version"));

    respond(&relay, json!(4), json!("3"));

    assert!(handle.try_outcome().unwrap().is_ok());
    assert_eq!(relay.network().as_deref(), Some("3"));
    assert_eq!(
        relay.send(&request(5, "net_version")).unwrap().result,
        Some(json!("3"))
    );
}

#[test]
fn test_sync_reads_before_any_session_data() {
    let relay = relay();
    assert_eq!(
        relay.send(&request(1, "eth_accounts")).unwrap().result,
        Some(json!([]))
    );
    assert_eq!(
        relay.send(&request(2, "eth_coinbase")).unwrap().result,
        Some(Value::Null)
    );
    assert_eq!(
        relay.send(&request(3, "net_version")).unwrap().result,
        Some(Value::Null)
    );
}

#[test]
fn test_unknown_response_id_leaves_state_unchanged() {
    let relay = relay();
    ready(&relay);
    let mut pending = relay.send_async(request(1, "eth_accounts"));

    respond(&relay, json!(77), json!(["0xdead"]));
    respond(&relay, json!("1"), json!(["0xdead"]));

    assert_eq!(relay.pending_count(), 1);
    assert!(pending.try_outcome().is_none());
    assert_eq!(relay.account(), None);
    assert_eq!(relay.endpoint().sent().len(), 1);
}

#[test]
fn test_duplicate_response_is_ignored() {
    let relay = relay();
    ready(&relay);
    let mut handle = relay.send_async(request(1, "eth_accounts"));

    respond(&relay, json!(1), json!(["0xabc"]));
    respond(&relay, json!(1), json!(["0xother"]));

    assert_eq!(
        handle.try_outcome().unwrap().unwrap().result,
        Some(json!(["0xabc"]))
    );
    assert_eq!(relay.account().as_deref(), Some("0xabc"));
}

#[test]
fn test_targeted_denial_resolves_only_that_request() {
    let relay = relay();
    ready(&relay);
    let mut denied = relay.send_async(request(1, "eth_sendTransaction"));
    let mut other = relay.send_async(request(2, "eth_sign"));

    from_authority(&relay, json!({"msgType": "user-denied", "payload": {"id": 1}}));

    assert!(matches!(denied.try_outcome(), Some(Err(RelayError::UserDenied))));
    assert!(other.try_outcome().is_none());
    assert_eq!(relay.pending_count(), 1);
}

#[test]
fn test_targeted_denial_leaves_queued_requests_alone() {
    let relay = relay();
    let mut queued = relay.send_async(request(3, "eth_sign"));

    from_authority(&relay, json!({"msgType": "user-denied", "payload": {"id": 3}}));

    // Not yet dispatched, so there is no pending entry to deny.
    assert!(queued.try_outcome().is_none());
    assert_eq!(relay.queued_count(), 1);
}

#[test]
fn test_broadcast_denial_empties_queue() {
    let relay = relay();
    let mut first = relay.send_async(request(10, "eth_sign"));
    let mut second = relay.send_async(request(11, "personal_sign"));

    from_authority(&relay, json!({"msgType": "user-denied"}));

    assert!(matches!(first.try_outcome(), Some(Err(RelayError::UserDenied))));
    assert!(matches!(second.try_outcome(), Some(Err(RelayError::UserDenied))));
    assert_eq!(relay.queued_count(), 0);

    ready(&relay);
    assert!(relay.endpoint().sent().is_empty());
}

#[test]
fn test_broadcast_denial_does_not_reach_dispatched_requests() {
    let relay = relay();
    ready(&relay);
    let mut in_flight = relay.send_async(request(1, "eth_sendTransaction"));

    from_authority(&relay, json!({"msgType": "user-denied", "payload": {}}));

    // Only queued requests are denied by a broadcast; this one stays pending.
    assert!(in_flight.try_outcome().is_none());
    assert_eq!(relay.pending_count(), 1);

    respond(&relay, json!(1), json!("0xhash"));
    assert_eq!(
        in_flight.try_outcome().unwrap().unwrap().result,
        Some(json!("0xhash"))
    );
}

#[test]
fn test_foreign_origin_is_fully_ignored() {
    let relay = relay();
    let logins = Arc::new(Mutex::new(0));
    {
        let logins = Arc::clone(&logins);
        relay.on("login", move |_: &Value| *logins.lock().unwrap() += 1);
    }
    let mut handle = relay.send_async(request(1, "eth_accounts"));

    for origin in ["https://evil.example", "https://app.portis.io.evil.example", ""] {
        for data in [
            json!({"msgType": "ready"}),
            json!({"msgType": "show"}),
            json!({"msgType": "login", "payload": {"address": "0xabc"}}),
            json!({"msgType": "user-denied"}),
        ] {
            relay.dispatch(InboundEvent::new(origin, data));
        }
    }

    assert!(!relay.is_ready());
    assert!(relay.endpoint().sent().is_empty());
    assert_eq!(relay.endpoint().shows(), 0);
    assert_eq!(*logins.lock().unwrap(), 0);
    assert!(handle.try_outcome().is_none());
    assert_eq!(relay.queued_count(), 1);
}

#[test]
fn test_show_and_hide_reach_the_endpoint() {
    let relay = relay();
    from_authority(&relay, json!({"msgType": "show"}));
    from_authority(&relay, json!({"msgType": "hide"}));
    from_authority(&relay, json!({"msgType": "show"}));

    assert_eq!(relay.endpoint().shows(), 2);
    assert_eq!(relay.endpoint().hides(), 1);
}

#[test]
fn test_login_subscribers_called_in_order_with_provider() {
    let relay = relay();
    let seen = Arc::new(Mutex::new(Vec::new()));
    for tag in ["first", "second"] {
        let seen = Arc::clone(&seen);
        relay.on("login", move |payload: &Value| {
            seen.lock().unwrap().push((tag, payload.clone()));
        });
    }

    from_authority(&relay, json!({"msgType": "login", "payload": {"address": "0xabc"}}));

    let seen = seen.lock().unwrap();
    let expected = json!({"provider": "portis", "address": "0xabc"});
    assert_eq!(
        *seen,
        vec![("first", expected.clone()), ("second", expected)]
    );
}

#[test]
fn test_purchase_event_payload_passes_through() {
    let relay = relay();
    let seen = Arc::new(Mutex::new(None));
    {
        let seen = Arc::clone(&seen);
        relay.on("purchase-initiated", move |payload: &Value| {
            *seen.lock().unwrap() = Some(payload.clone());
        });
    }

    let payload = json!({"provider": "portis", "purchaseId": "p-1"});
    from_authority(
        &relay,
        json!({"msgType": "purchase-initiated", "payload": payload.clone()}),
    );

    assert_eq!(*seen.lock().unwrap(), Some(payload));
}

#[test]
fn test_subscriber_may_call_back_into_relay() {
    let relay = relay();
    let observed = Arc::new(Mutex::new(None));
    {
        let inner = relay.clone();
        let observed = Arc::clone(&observed);
        relay.on("login", move |_: &Value| {
            *observed.lock().unwrap() = Some(inner.queued_count());
            drop(inner.show_portis());
        });
    }

    from_authority(&relay, json!({"msgType": "login", "payload": {"address": "0xabc"}}));

    assert_eq!(*observed.lock().unwrap(), Some(0));
    assert_eq!(relay.queued_count(), 1);
}

#[test]
fn test_unknown_events_and_messages_are_ignored() {
    let relay = relay();
    relay.on("no-such-event", |_: &Value| panic!("must never fire"));

    from_authority(&relay, json!({"msgType": "something-new", "payload": {"x": 1}}));
    from_authority(&relay, json!({"no": "envelope"}));
    from_authority(&relay, json!("not even an object"));
    from_authority(&relay, json!({"msgType": "response", "payload": "garbage"}));

    assert!(!relay.is_ready());
    assert!(relay.endpoint().sent().is_empty());
}

#[test]
fn test_sync_send_rejects_methods_outside_allow_list() {
    let relay = relay();
    let err = relay.send(&request(1, "eth_sendTransaction")).unwrap_err();
    assert!(matches!(err, RelayError::UnsupportedSyncMethod(ref m) if m == "eth_sendTransaction"));
    assert_eq!(relay.queued_count(), 0);
}

#[test]
fn test_uninstall_filter_answers_true_and_relays() {
    let relay = relay();
    ready(&relay);
    let req = JsonRpcRequest::new(8, "eth_uninstallFilter", vec![json!("0x1")]);

    let response = relay.send(&req).unwrap();

    assert_eq!(response, JsonRpcResponse::success(RequestId::Num(8), json!(true)));
    assert_eq!(relay.endpoint().sent_ids(), vec![RequestId::Num(8)]);

    // The discarded handle does not prevent the eventual response from resolving.
    respond(&relay, json!(8), json!(true));
    assert_eq!(relay.pending_count(), 0);
}

#[test]
fn test_out_of_band_requests() {
    let relay = relay();
    ready(&relay);

    let email = relay.set_default_email("user@example.com");
    let show = relay.show_portis();

    assert_eq!(email.id(), &RequestId::Num(1000));
    assert_eq!(show.id(), &RequestId::Num(1001));

    let sent: Vec<JsonRpcRequest> = relay
        .endpoint()
        .sent()
        .into_iter()
        .map(|env| serde_json::from_value(env.payload.unwrap()).unwrap())
        .collect();
    assert_eq!(sent[0].method, "setDefaultEmail");
    assert_eq!(sent[0].params, vec![json!("user@example.com")]);
    assert_eq!(sent[1].method, "showPortis");
    assert!(sent[1].params.is_empty());
}

#[test]
fn test_wire_payload_matches_host_request() {
    let relay = relay();
    ready(&relay);
    let req = JsonRpcRequest::new("abc", "eth_getBalance", vec![json!("0x1"), json!("latest")]);
    let _handle = relay.send_async(req);

    let sent = relay.endpoint().sent();
    assert_eq!(
        serde_json::to_value(&sent[0]).unwrap(),
        json!({
            "msgType": "request",
            "payload": {
                "id": "abc",
                "jsonrpc": "2.0",
                "method": "eth_getBalance",
                "params": ["0x1", "latest"]
            }
        })
    );
}

#[test]
fn test_always_connected() {
    let relay = relay();
    assert!(relay.is_connected());
    assert!(relay.is_portis());
    from_authority(&relay, json!({"msgType": "ready"}));
    assert!(relay.is_connected());
}

#[tokio::test]
async fn test_dispatch_loop_resolves_awaiting_caller() {
    let relay = relay();
    let (tx, rx) = tokio::sync::mpsc::channel(8);
    let runner = relay.clone();
    let loop_task = tokio::spawn(async move { runner.run(rx).await });

    let handle = relay.send_async(request(1, "eth_accounts"));

    tx.send(InboundEvent::new(ORIGIN, json!({"msgType": "ready"})))
        .await
        .unwrap();
    tx.send(InboundEvent::new(
        ORIGIN,
        json!({"msgType": "response", "payload": {"id": 1, "result": ["0xabc"]}}),
    ))
    .await
    .unwrap();

    let response = handle.await.unwrap();
    assert_eq!(response.result, Some(json!(["0xabc"])));
    assert_eq!(relay.account().as_deref(), Some("0xabc"));

    drop(tx);
    loop_task.await.unwrap();
}

#[tokio::test]
async fn test_dropped_relay_closes_outstanding_handles() {
    let relay = relay();
    let handle = relay.send_async(request(1, "eth_accounts"));
    drop(relay);

    assert!(matches!(handle.await, Err(RelayError::SessionClosed)));
}
