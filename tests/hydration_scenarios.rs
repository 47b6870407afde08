//! End-to-end hydration over HTTP.
//!
//! Local events come from the in-memory store; remote services are mock
//! HTTP servers answering the batch event endpoint from a fixed event set.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use evented_hydrate::clients::HttpEventSource;
use evented_hydrate::config::{HttpTransportConfig, HydrationConfig, RemoteEndpointConfig};
use evented_hydrate::storage::MockEventStore;
use evented_hydrate::test_utils::{at, event_at, order_applier, shipment_assigned, OrderProjection};
use evented_hydrate::{
    Event, EventRequester, ForeignEventsRequest, HydrationEngine, HydrationError,
};

const EVENTS_PATH: &str = "/internal/events";

/// Answers batch requests from a fixed event set, like a real service would.
struct EventsResponder {
    events: Vec<Event>,
}

impl Respond for EventsResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let Ok(body) = serde_json::from_slice::<ForeignEventsRequest>(&request.body) else {
            return ResponseTemplate::new(400);
        };
        let mut events: Vec<&Event> = self
            .events
            .iter()
            .filter(|e| body.foreign_ids.contains(&e.aggregate_root_id))
            .filter(|e| e.visible_at(body.point_in_time))
            .collect();
        events.sort_by_key(|e| e.timestamp);
        ResponseTemplate::new(200).set_body_json(events)
    }
}

async fn service_with(events: Vec<Event>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(EVENTS_PATH))
        .respond_with(EventsResponder { events })
        .mount(&server)
        .await;
    server
}

fn events_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), EVENTS_PATH)
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map_or(0, |r| r.len())
}

fn transport() -> Arc<HttpEventSource> {
    let config = HttpTransportConfig {
        min_delay_ms: 1,
        max_delay_ms: 5,
        ..HttpTransportConfig::default()
    };
    Arc::new(HttpEventSource::new(config).unwrap())
}

fn local() -> EventRequester<OrderProjection> {
    EventRequester::local()
}

#[tokio::test]
async fn test_order_hydrates_from_local_and_two_remotes() {
    let customer = Uuid::new_v4();
    let items = [Uuid::new_v4(), Uuid::new_v4()];
    let shipment = Uuid::new_v4();

    let store = Arc::new(MockEventStore::new());
    store
        .add(vec![
            event_at(customer, 1, "CustomerRegistered"),
            shipment_assigned(customer, 4, shipment),
            event_at(customer, 90, "CustomerClosed"),
        ])
        .await;
    let inventory = service_with(vec![
        event_at(items[0], 2, "ItemReserved"),
        event_at(items[1], 3, "ItemReserved"),
    ])
    .await;
    let shipping = service_with(vec![
        event_at(shipment, 5, "ShipmentPacked"),
        event_at(shipment, 6, "ShipmentDispatched"),
    ])
    .await;

    let order = OrderProjection::new(customer)
        .with_line_items(vec![Some(items[0]), None, Some(items[1])]);

    let results = HydrationEngine::new(vec![order.clone()])
        .with_local_store(store.clone())
        .with_transport(transport())
        .with_applier(order_applier())
        .add_requester(local().required_single(|o| o.customer_id))
        .unwrap()
        .add_requester(
            EventRequester::remote(events_url(&inventory))
                .unwrap()
                .list(|o: &OrderProjection| o.line_item_ids.clone().unwrap_or_default()),
        )
        .unwrap()
        .add_dependent_requester(
            EventRequester::remote(events_url(&shipping))
                .unwrap()
                .single(|o: &OrderProjection| Some(o.shipment_id)),
        )
        .unwrap()
        .get_events(Some(at(60)))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].projection_id, order.id);
    let commands: Vec<_> = results[0]
        .events
        .iter()
        .map(|e| e.command_name.as_str())
        .collect();
    assert_eq!(
        commands,
        vec![
            "CustomerRegistered",
            "ItemReserved",
            "ItemReserved",
            "AssignShipment",
            "ShipmentPacked",
            "ShipmentDispatched",
        ]
    );

    assert_eq!(store.query_count().await, 1);
    assert_eq!(request_count(&inventory).await, 1);
    assert_eq!(request_count(&shipping).await, 1);
}

#[tokio::test]
async fn test_named_remotes_from_config() {
    let item = Uuid::new_v4();
    let inventory = service_with(vec![event_at(item, 1, "ItemReserved")]).await;

    let config = HydrationConfig {
        remotes: vec![RemoteEndpointConfig {
            name: "inventory".to_string(),
            url: events_url(&inventory),
        }],
        ..HydrationConfig::for_test()
    };

    let order = OrderProjection::new(Uuid::new_v4()).with_line_items(vec![Some(item)]);
    let transport = Arc::new(HttpEventSource::new(config.transport.clone()).unwrap());

    let results = HydrationEngine::new(vec![order])
        .with_transport(transport)
        .with_config(&config.engine)
        .add_requester(
            EventRequester::remote_named(&config, "inventory")
                .unwrap()
                .list(|o: &OrderProjection| o.line_item_ids.clone().unwrap_or_default()),
        )
        .unwrap()
        .get_events(None)
        .await
        .unwrap();

    assert_eq!(results[0].events.len(), 1);
    assert!(matches!(
        EventRequester::<OrderProjection>::remote_named(&config, "billing"),
        Err(HydrationError::Configuration(_))
    ));
}

#[tokio::test]
async fn test_failing_remote_yields_no_partial_result() {
    let customer = Uuid::new_v4();
    let store = Arc::new(MockEventStore::new());
    store.add(vec![event_at(customer, 1, "CustomerRegistered")]).await;

    let broken = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&broken)
        .await;

    let order = OrderProjection::new(customer).with_line_items(vec![Some(Uuid::new_v4())]);
    let result = HydrationEngine::new(vec![order])
        .with_local_store(store)
        .with_transport(transport())
        .add_requester(local().required_single(|o| o.customer_id))
        .unwrap()
        .add_requester(
            EventRequester::remote(events_url(&broken))
                .unwrap()
                .list(|o: &OrderProjection| o.line_item_ids.clone().unwrap_or_default()),
        )
        .unwrap()
        .get_events(None)
        .await;

    assert!(matches!(result, Err(HydrationError::Transport(_))));
}

#[tokio::test]
async fn test_cancel_during_slow_remote() {
    let slow = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([]))
                .set_delay(Duration::from_secs(20)),
        )
        .mount(&slow)
        .await;

    let order = OrderProjection::new(Uuid::new_v4()).with_line_items(vec![Some(Uuid::new_v4())]);
    let engine = HydrationEngine::new(vec![order])
        .with_transport(transport())
        .add_requester(
            EventRequester::remote(events_url(&slow))
                .unwrap()
                .list(|o: &OrderProjection| o.line_item_ids.clone().unwrap_or_default()),
        )
        .unwrap();

    let (tx, rx) = tokio::sync::watch::channel(false);
    let cancel = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let _ = tx.send(true);
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        engine.get_events_until_cancelled(None, rx),
    )
    .await
    .expect("cancellation should end the call promptly");

    assert!(matches!(result, Err(HydrationError::Cancelled)));
    cancel.await.unwrap();
}
