mod common;

use common::{ready, relay, request, respond};
use portis_relay::RequestId;
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;

proptest! {
    #[test]
    fn test_fifo_order_across_readiness(
        ids in prop::collection::vec(any::<i64>(), 0..40),
        split in 0..40usize
    ) {
        let relay = relay();
        let split = split.min(ids.len());
        let (before, after) = ids.split_at(split);

        let _handles: Vec<_> = before
            .iter()
            .map(|id| relay.send_async(request(*id, "eth_getBalance")))
            .collect();
        prop_assert!(relay.endpoint().sent().is_empty());

        ready(&relay);
        let _more: Vec<_> = after
            .iter()
            .map(|id| relay.send_async(request(*id, "eth_getBalance")))
            .collect();

        // Repeated ids are rejected while the first is still pending.
        let mut seen = HashSet::new();
        let expected: Vec<RequestId> = ids
            .iter()
            .filter(|id| seen.insert(**id))
            .map(|id| RequestId::Num(*id))
            .collect();
        prop_assert_eq!(relay.endpoint().sent_ids(), expected);
        prop_assert_eq!(relay.pending_count(), seen.len());
        prop_assert_eq!(relay.queued_count(), 0);
    }

    #[test]
    fn test_each_request_resolves_at_most_once(
        responses in prop::collection::vec(0..8i64, 0..32)
    ) {
        let relay = relay();
        ready(&relay);
        let mut handles: Vec<_> = (0..8i64)
            .map(|id| relay.send_async(request(id, "eth_call")))
            .collect();

        for id in &responses {
            respond(&relay, json!(id), json!(id));
        }

        for (id, handle) in handles.iter_mut().enumerate() {
            let answered = responses.contains(&(id as i64));
            match handle.try_outcome() {
                Some(Ok(response)) => {
                    prop_assert!(answered);
                    prop_assert_eq!(response.result, Some(json!(id)));
                }
                Some(Err(e)) => prop_assert!(false, "unexpected error {}", e),
                None => prop_assert!(!answered),
            }
        }
        prop_assert_eq!(
            relay.pending_count(),
            8 - responses.iter().collect::<HashSet<_>>().len()
        );
    }
}
