//! Blocking client for the ShipStation REST API.
//!
//! # Overview
//! `ShipStation` sends every request with a Basic `Authorization` header
//! derived from the API key and secret, returns responses untouched, and
//! pauses briefly when ShipStation's rate-limit headers say the current window
//! is nearly spent.
//!
//! # Design
//! - Requests are built as plain data (`HttpRequest`) and executed by a
//!   `Transport`, so tests can observe the wire format without a socket.
//! - The four verbs (`get`, `post`, `update`, `delete`) never decode bodies.
//!   `helpers` holds the few typed lookups that do.
//! - There is no global client. Build one at startup from `ShipStationConfig`
//!   and pass it to whatever needs it.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod helpers;
pub mod http;
pub mod rate_limit;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use client::{Credentials, RequestOptions, ShipStation, BASE_URL};
pub use config::{publish_template, ShipStationConfig};
pub use endpoint::Endpoint;
pub use error::{ApiError, ConfigError};
pub use helpers::{Accessed, Helper, HelperKind, Orders, Shipments};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use rate_limit::RateLimit;
pub use transport::{Transport, UreqTransport};
