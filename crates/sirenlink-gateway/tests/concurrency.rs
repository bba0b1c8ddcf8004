#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;
use tokio::task::JoinSet;

use sirenlink_core::error::{LookupFailure, RouteError, TransportError};
use sirenlink_core::protocol::{decode_inbound, ConnectionId, InboundEvent};
use sirenlink_gateway::dispatch::{ConnectionCtx, EventRouter};
use sirenlink_gateway::realtime::{ConnectionRegistry, Outbox, PreparedMsg};

/// Counts alerts, split by whether the owner had already finished disconnecting.
#[derive(Default)]
struct AlertCounter {
    left: AtomicBool,
    alerts: AtomicUsize,
    after_leave: AtomicUsize,
}

impl Outbox for AlertCounter {
    fn deliver(&self, msg: &PreparedMsg) -> Result<(), TransportError> {
        if msg.event() == "emergencyAlert" {
            if self.left.load(Ordering::SeqCst) {
                self.after_leave.fetch_add(1, Ordering::SeqCst);
            } else {
                self.alerts.fetch_add(1, Ordering::SeqCst);
            }
        }
        Ok(())
    }
}

fn event(frame: serde_json::Value) -> InboundEvent {
    decode_inbound(&frame.to_string()).unwrap()
}

const POLICE: usize = 48;
const EMERGENCIES: usize = 64;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_register_disconnect_and_emergency() {
    let router = Arc::new(EventRouter::new(Arc::new(ConnectionRegistry::default())));
    let counters: Vec<Arc<AlertCounter>> = (0..POLICE).map(|_| Arc::new(AlertCounter::default())).collect();

    let mut tasks = JoinSet::new();

    for (i, counter) in counters.iter().enumerate() {
        let router = Arc::clone(&router);
        let counter = Arc::clone(counter);
        tasks.spawn(async move {
            let ctx = ConnectionCtx::new(ConnectionId::new(format!("police-{i}")), counter.clone());
            router
                .route(&ctx, event(json!({"event": "registerRole", "data": {"role": "Traffic Police"}})))
                .await
                .unwrap();
            tokio::task::yield_now().await;
            if i % 2 == 0 {
                router
                    .route(&ctx, event(json!({"event": "disconnect"})))
                    .await
                    .unwrap();
                counter.left.store(true, Ordering::SeqCst);
            }
        });
    }

    for i in 0..EMERGENCIES {
        let router = Arc::clone(&router);
        tasks.spawn(async move {
            let ctx = ConnectionCtx::new(
                ConnectionId::new(format!("amb-{i}")),
                Arc::new(AlertCounter::default()),
            );
            let res = router
                .route(&ctx, event(json!({"event": "emergency", "data": {"licensePlate": format!("KA-{i}")}})))
                .await;
            match res {
                Ok(report) => assert_eq!(report.delivered, 2),
                Err(e) => assert_eq!(e, RouteError::Lookup(LookupFailure::NoResponderAvailable)),
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        joined.unwrap();
    }

    let live: HashSet<ConnectionId> = router.registry().connection_ids().await.into_iter().collect();
    let expected: HashSet<ConnectionId> = (0..POLICE)
        .filter(|i| i % 2 == 1)
        .map(|i| ConnectionId::new(format!("police-{i}")))
        .collect();
    assert_eq!(live, expected);

    for c in &counters {
        assert_eq!(c.after_leave.load(Ordering::SeqCst), 0);
    }

    // With survivors in place every further emergency lands on a live responder.
    let ctx = ConnectionCtx::new("amb-late".into(), Arc::new(AlertCounter::default()));
    let report = router
        .route(&ctx, event(json!({"event": "emergency", "data": {"licensePlate": "KA-LATE"}})))
        .await
        .unwrap();
    assert_eq!(report.delivered, 2);
    let hits: usize = counters
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 2 == 1)
        .map(|(_, c)| c.alerts.load(Ordering::SeqCst))
        .sum();
    assert!(hits >= 1);
}
