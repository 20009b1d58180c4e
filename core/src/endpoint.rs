//! The fixed set of ShipStation resource collections.

use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// A ShipStation resource collection.
///
/// `Display` renders the bare name (`orders`); `path` renders the
/// slash-wrapped prefix (`/orders/`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Endpoint {
    Accounts,
    Carriers,
    Customers,
    Fulfillments,
    #[default]
    Orders,
    Products,
    Shipments,
    Stores,
    Users,
    Warehouses,
    Webhooks,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Accounts => "/accounts/",
            Endpoint::Carriers => "/carriers/",
            Endpoint::Customers => "/customers/",
            Endpoint::Fulfillments => "/fulfillments/",
            Endpoint::Orders => "/orders/",
            Endpoint::Products => "/products/",
            Endpoint::Shipments => "/shipments/",
            Endpoint::Stores => "/stores/",
            Endpoint::Users => "/users/",
            Endpoint::Warehouses => "/warehouses/",
            Endpoint::Webhooks => "/webhooks/",
        }
    }

    /// Look up an endpoint by its property-style name.
    ///
    /// The name is wrapped as `/name/` and compared against the allow-list
    /// exactly, so `Orders` and `orders/` do not match.
    pub fn from_name(name: &str) -> Option<Self> {
        let wrapped = format!("/{name}/");
        Endpoint::iter().find(|endpoint| endpoint.path() == wrapped)
    }
}
