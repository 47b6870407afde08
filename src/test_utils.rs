//! Test fixtures.
//!
//! A small order read model with every selector shape the engine supports:
//! an always-set customer id, an optional warehouse id, an optional list of
//! line item ids, and two dependent fields that only get populated by
//! applying events (`shipment_id` and `carrier_ids`).

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::event::Event;
use crate::interfaces::{EventApplier, Projection};

/// Payload key an event uses to assign the dependent shipment id.
pub const SHIPMENT_ID_KEY: &str = "shipmentId";
/// Payload key an event uses to assign the dependent carrier ids.
pub const CARRIER_IDS_KEY: &str = "carrierIds";

/// Order read model used across the test suites.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderProjection {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub warehouse_id: Option<Uuid>,
    pub line_item_ids: Option<Vec<Option<Uuid>>>,
    /// Nil until an event assigns it.
    pub shipment_id: Uuid,
    /// Empty until an event assigns it.
    pub carrier_ids: Vec<Uuid>,
}

impl OrderProjection {
    pub fn new(customer_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            warehouse_id: None,
            line_item_ids: None,
            shipment_id: Uuid::nil(),
            carrier_ids: Vec::new(),
        }
    }

    pub fn with_warehouse(mut self, warehouse_id: Uuid) -> Self {
        self.warehouse_id = Some(warehouse_id);
        self
    }

    pub fn with_line_items(mut self, items: Vec<Option<Uuid>>) -> Self {
        self.line_item_ids = Some(items);
        self
    }
}

impl Projection for OrderProjection {
    fn projection_id(&self) -> Uuid {
        self.id
    }
}

/// Applier that copies `shipmentId` / `carrierIds` out of event payloads.
pub fn order_applier() -> EventApplier<OrderProjection> {
    Arc::new(|mut order: OrderProjection, event: &Event| {
        if let Some(id) = event
            .payload
            .get(SHIPMENT_ID_KEY)
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
        {
            order.shipment_id = id;
        }
        if let Some(ids) = event.payload.get(CARRIER_IDS_KEY).and_then(|v| v.as_array()) {
            order.carrier_ids = ids
                .iter()
                .filter_map(|v| v.as_str())
                .filter_map(|s| Uuid::parse_str(s).ok())
                .collect();
        }
        order
    })
}

/// Fixed base instant so ordering assertions are stable.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Instant `offset_secs` after [`base_time`].
pub fn at(offset_secs: i64) -> DateTime<Utc> {
    base_time() + chrono::Duration::seconds(offset_secs)
}

/// Event for `aggregate` at `offset_secs` with an empty payload.
pub fn event_at(aggregate: Uuid, offset_secs: i64, command: &str) -> Event {
    Event::new(aggregate, at(offset_secs), command, json!({}))
}

/// Event that assigns the dependent shipment id when applied.
pub fn shipment_assigned(aggregate: Uuid, offset_secs: i64, shipment_id: Uuid) -> Event {
    Event::new(
        aggregate,
        at(offset_secs),
        "AssignShipment",
        json!({ SHIPMENT_ID_KEY: shipment_id.to_string() }),
    )
}

/// Event that assigns the dependent carrier ids when applied.
pub fn carriers_assigned(aggregate: Uuid, offset_secs: i64, carriers: &[Uuid]) -> Event {
    let ids: Vec<String> = carriers.iter().map(Uuid::to_string).collect();
    Event::new(
        aggregate,
        at(offset_secs),
        "AssignCarriers",
        json!({ CARRIER_IDS_KEY: ids }),
    )
}
