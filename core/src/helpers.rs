//! Helper objects layered on top of the raw verbs.
//!
//! # Design
//! Each helper borrows the client and turns a handful of common ShipStation
//! calls into typed answers (a count, an id, a yes/no). Unlike the verbs,
//! helpers decode response bodies, so they can also fail with
//! `ApiError::Deserialization` or `ApiError::UnexpectedResponse`.
//!
//! `HelperKind` is the closed set of helpers a property-style name can
//! resolve to; `ShipStation::access` uses it to decide between returning a
//! helper and returning the client.

use serde::Serialize;
use serde_json::Value;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use crate::client::{RequestOptions, ShipStation};
use crate::error::ApiError;
use crate::http::HttpResponse;

const AWAITING_SHIPMENT: &str = "awaiting_shipment";
const SHIPPED: &str = "shipped";

/// Names of the available helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum HelperKind {
    Orders,
    Shipments,
}

impl HelperKind {
    /// Resolve a property-style name by upper-casing its first character,
    /// so `orders` and `Orders` both select `HelperKind::Orders`.
    pub fn from_property(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        let first = chars.next()?;
        let capitalised: String = first.to_uppercase().chain(chars).collect();
        HelperKind::iter().find(|kind| kind.to_string() == capitalised)
    }
}

/// A helper bound to a client.
#[derive(Debug)]
pub enum Helper<'a> {
    Orders(Orders<'a>),
    Shipments(Shipments<'a>),
}

/// Result of `ShipStation::access`.
#[derive(Debug)]
pub enum Accessed<'a> {
    Client(&'a mut ShipStation),
    Helper(Helper<'a>),
}

/// Order lookups and mutations.
#[derive(Debug, Clone, Copy)]
pub struct Orders<'a> {
    client: &'a ShipStation,
}

impl<'a> Orders<'a> {
    pub fn new(client: &'a ShipStation) -> Self {
        Self { client }
    }

    /// Create or update an order. ShipStation upserts on `orderKey`.
    pub fn create<T>(&self, order: &T) -> Result<Value, ApiError>
    where
        T: Serialize + ?Sized,
    {
        let response = self.client.post_json("/orders/createorder", order)?;
        decode(&response)
    }

    pub fn get(&self, order_id: u64) -> Result<Value, ApiError> {
        let response = self
            .client
            .get(&format!("/orders/{order_id}"), &RequestOptions::new())?;
        decode(&response)
    }

    pub fn delete(&self, order_id: u64) -> Result<HttpResponse, ApiError> {
        self.client
            .delete(&format!("/orders/{order_id}"), &RequestOptions::new())
    }

    /// Number of orders in `awaiting_shipment` status.
    pub fn awaiting_shipment_count(&self) -> Result<u64, ApiError> {
        let options = RequestOptions::new().query("orderStatus", AWAITING_SHIPMENT);
        let page = decode(&self.client.get("/orders", &options)?)?;
        page.get("total")
            .and_then(Value::as_u64)
            .ok_or_else(|| ApiError::UnexpectedResponse("order list without a total".into()))
    }

    /// Id of the order whose `orderNumber` equals `order_number` exactly.
    pub fn order_id(&self, order_number: &str) -> Result<Option<u64>, ApiError> {
        match self.find_by_order_number(order_number)? {
            Some(order) => order
                .get("orderId")
                .and_then(Value::as_u64)
                .map(Some)
                .ok_or_else(|| ApiError::UnexpectedResponse("order without an orderId".into())),
            None => Ok(None),
        }
    }

    pub fn exists_by_order_number(&self, order_number: &str) -> Result<bool, ApiError> {
        Ok(self.find_by_order_number(order_number)?.is_some())
    }

    /// Unknown order numbers are reported as not shipped.
    pub fn is_shipped(&self, order_number: &str) -> Result<bool, ApiError> {
        Ok(self
            .find_by_order_number(order_number)?
            .and_then(|order| order.get("orderStatus").and_then(Value::as_str).map(|s| s == SHIPPED))
            .unwrap_or(false))
    }

    fn find_by_order_number(&self, order_number: &str) -> Result<Option<Value>, ApiError> {
        let options = RequestOptions::new().query("orderNumber", order_number);
        let page = decode(&self.client.get("/orders", &options)?)?;
        let orders = list_field(page, "orders")?;
        // The API filter is a prefix match.
        Ok(orders
            .into_iter()
            .find(|order| order.get("orderNumber").and_then(Value::as_str) == Some(order_number)))
    }
}

/// Shipment lookups.
#[derive(Debug, Clone, Copy)]
pub struct Shipments<'a> {
    client: &'a ShipStation,
}

impl<'a> Shipments<'a> {
    pub fn new(client: &'a ShipStation) -> Self {
        Self { client }
    }

    pub fn for_order_number(&self, order_number: &str) -> Result<Vec<Value>, ApiError> {
        let options = RequestOptions::new().query("orderNumber", order_number);
        let page = decode(&self.client.get("/shipments", &options)?)?;
        list_field(page, "shipments")
    }
}

fn decode(response: &HttpResponse) -> Result<Value, ApiError> {
    serde_json::from_str(&response.body).map_err(ApiError::Deserialization)
}

fn list_field(mut page: Value, field: &str) -> Result<Vec<Value>, ApiError> {
    match page.get_mut(field).map(Value::take) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(ApiError::UnexpectedResponse(format!(
            "response without a `{field}` array"
        ))),
    }
}
