//! Authenticated, rate-limit aware client for the ShipStation REST API.
//!
//! # Design
//! `ShipStation` holds the resolved origin, the precomputed `Authorization`
//! header and a shared `Transport`. Each verb is split into a pure `build_*`
//! method that produces an `HttpRequest` and a call that dispatches it:
//! execute, reject non-2xx statuses, apply the rate-limit cooldown, and hand
//! the raw response back. Bodies are never decoded here; see `helpers` for the
//! few calls that interpret ShipStation's JSON.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use tracing::{debug, trace, warn};
use url::Url;

use crate::config::ShipStationConfig;
use crate::endpoint::Endpoint;
use crate::error::{ApiError, ConfigError};
use crate::helpers::{Accessed, Helper, HelperKind, Orders, Shipments};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::rate_limit::{RateLimit, DEFAULT_COOLDOWN};
use crate::transport::{Transport, UreqTransport};

/// Production origin of the ShipStation API.
pub const BASE_URL: &str = "https://ssapi.shipstation.com";

const AUTHORIZATION: &str = "Authorization";
const CONTENT_TYPE: &str = "content-type";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// API key and secret. Both are guaranteed non-empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    api_secret: String,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Self::from_parts(Some(api_key.into()), Some(api_secret.into()))
    }

    /// Build credentials from values that may be unset. Empty strings count
    /// as unset.
    pub fn from_parts(
        api_key: Option<String>,
        api_secret: Option<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key.filter(|key| !key.is_empty());
        let api_secret = api_secret.filter(|secret| !secret.is_empty());
        match (api_key, api_secret) {
            (Some(api_key), Some(api_secret)) => Ok(Self {
                api_key,
                api_secret,
            }),
            (None, None) => Err(ConfigError::MissingCredentials {
                missing: "api_key and api_secret",
            }),
            (None, Some(_)) => Err(ConfigError::MissingCredentials { missing: "api_key" }),
            (Some(_), None) => Err(ConfigError::MissingCredentials {
                missing: "api_secret",
            }),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// `Basic base64(api_key:api_secret)`.
    pub fn authorization_header(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.api_key, self.api_secret));
        format!("Basic {token}")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Query parameters and extra headers for `get` and `delete`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Blocking ShipStation client.
///
/// Cloning is cheap and gives the clone its own current-endpoint field, so
/// each call context can select endpoints without synchronisation.
#[derive(Clone)]
pub struct ShipStation {
    base_url: Url,
    authorization: String,
    endpoint: Endpoint,
    cooldown: Duration,
    transport: Arc<dyn Transport>,
}

impl ShipStation {
    pub fn new(credentials: &Credentials) -> Self {
        let base_url = Url::parse(BASE_URL).expect("BASE_URL is a valid url");
        Self {
            base_url,
            authorization: credentials.authorization_header(),
            endpoint: Endpoint::default(),
            cooldown: DEFAULT_COOLDOWN,
            transport: Arc::new(UreqTransport::new()),
        }
    }

    /// Construct from loaded configuration, failing if either credential is
    /// unset.
    pub fn from_config(config: &ShipStationConfig) -> Result<Self, ApiError> {
        let credentials = config.credentials()?;
        let mut client = Self::new(&credentials);
        if let Some(base_url) = &config.base_url {
            client = client.with_base_url(base_url)?;
        }
        Ok(client)
    }

    /// Point the client at a different origin (sandbox, mock server).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ApiError> {
        self.base_url = Url::parse(base_url).map_err(|source| ApiError::InvalidUri {
            uri: base_url.to_string(),
            source,
        })?;
        Ok(self)
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    // -----------------------------------------------------------------------
    // Endpoint bookkeeping and helpers
    // -----------------------------------------------------------------------

    /// The endpoint most recently selected. Never substituted into request
    /// URLs; callers always pass explicit URIs to the verbs.
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn set_endpoint(&mut self, endpoint: Endpoint) -> &mut Self {
        self.endpoint = endpoint;
        self
    }

    /// Select the endpoint named `name` if it is in the allow-list. Unknown
    /// names leave the current endpoint untouched.
    pub fn with_endpoint(&mut self, name: &str) -> &mut Self {
        match Endpoint::from_name(name) {
            Some(endpoint) => {
                trace!(%endpoint, "selected endpoint");
                self.endpoint = endpoint;
            }
            None => trace!(name, "ignoring unknown endpoint name"),
        }
        self
    }

    /// Property-style access: selects the endpoint when `name` is in the
    /// allow-list, then returns the matching helper if one exists, or the
    /// client itself otherwise.
    pub fn access(&mut self, name: &str) -> Accessed<'_> {
        self.with_endpoint(name);
        match HelperKind::from_property(name) {
            Some(kind) => Accessed::Helper(self.helper(kind)),
            None => Accessed::Client(self),
        }
    }

    pub fn helper(&self, kind: HelperKind) -> Helper<'_> {
        match kind {
            HelperKind::Orders => Helper::Orders(Orders::new(self)),
            HelperKind::Shipments => Helper::Shipments(Shipments::new(self)),
        }
    }

    pub fn orders(&self) -> Orders<'_> {
        Orders::new(self)
    }

    pub fn shipments(&self) -> Shipments<'_> {
        Shipments::new(self)
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_get(&self, uri: &str, options: &RequestOptions) -> Result<HttpRequest, ApiError> {
        self.build_request(HttpMethod::Get, uri, options, None)
    }

    pub fn build_delete(
        &self,
        uri: &str,
        options: &RequestOptions,
    ) -> Result<HttpRequest, ApiError> {
        self.build_request(HttpMethod::Delete, uri, options, None)
    }

    pub fn build_post<K, V>(&self, uri: &str, fields: &[(K, V)]) -> Result<HttpRequest, ApiError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter())
            .finish();
        self.build_request(
            HttpMethod::Post,
            uri,
            &RequestOptions::default(),
            Some((FORM_CONTENT_TYPE, body)),
        )
    }

    pub fn build_post_json<T>(&self, uri: &str, body: &T) -> Result<HttpRequest, ApiError>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_string(body).map_err(ApiError::Serialization)?;
        self.build_request(
            HttpMethod::Post,
            uri,
            &RequestOptions::default(),
            Some((JSON_CONTENT_TYPE, body)),
        )
    }

    pub fn build_update<T>(&self, uri: &str, body: &T) -> Result<HttpRequest, ApiError>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_string(body).map_err(ApiError::Serialization)?;
        self.build_request(
            HttpMethod::Put,
            uri,
            &RequestOptions::default(),
            Some((JSON_CONTENT_TYPE, body)),
        )
    }

    fn build_request(
        &self,
        method: HttpMethod,
        uri: &str,
        options: &RequestOptions,
        body: Option<(&str, String)>,
    ) -> Result<HttpRequest, ApiError> {
        let mut url = self.base_url.join(uri).map_err(|source| ApiError::InvalidUri {
            uri: uri.to_string(),
            source,
        })?;
        if !options.query.is_empty() {
            url.query_pairs_mut().extend_pairs(options.query.iter());
        }

        let mut headers = vec![(AUTHORIZATION.to_string(), self.authorization.clone())];
        let body = body.map(|(content_type, body)| {
            headers.push((CONTENT_TYPE.to_string(), content_type.to_string()));
            body
        });
        for (name, value) in &options.headers {
            match headers
                .iter_mut()
                .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            {
                Some(existing) => existing.1 = value.clone(),
                None => headers.push((name.clone(), value.clone())),
            }
        }

        Ok(HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
        })
    }

    // -----------------------------------------------------------------------
    // Verbs
    // -----------------------------------------------------------------------

    pub fn get(&self, uri: &str, options: &RequestOptions) -> Result<HttpResponse, ApiError> {
        self.dispatch(self.build_get(uri, options)?)
    }

    /// POST with `fields` sent as `application/x-www-form-urlencoded`.
    pub fn post<K, V>(&self, uri: &str, fields: &[(K, V)]) -> Result<HttpResponse, ApiError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.dispatch(self.build_post(uri, fields)?)
    }

    /// POST with a JSON body, as ShipStation's create calls expect.
    pub fn post_json<T>(&self, uri: &str, body: &T) -> Result<HttpResponse, ApiError>
    where
        T: Serialize + ?Sized,
    {
        self.dispatch(self.build_post_json(uri, body)?)
    }

    pub fn delete(&self, uri: &str, options: &RequestOptions) -> Result<HttpResponse, ApiError> {
        self.dispatch(self.build_delete(uri, options)?)
    }

    /// PUT with a JSON body.
    pub fn update<T>(&self, uri: &str, body: &T) -> Result<HttpResponse, ApiError>
    where
        T: Serialize + ?Sized,
    {
        self.dispatch(self.build_update(uri, body)?)
    }

    fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = check_status(self.transport.execute(&request)?)?;
        debug!(status = response.status, "received response");
        self.sleep_if_rate_limited(&response);
        Ok(response)
    }

    /// Pause for the cooldown when the rate-limit headers say the window is
    /// close to exhausted. Returns whether a pause happened.
    pub fn sleep_if_rate_limited(&self, response: &HttpResponse) -> bool {
        let Some(limit) = RateLimit::from_response(response) else {
            trace!("response carries no usable rate-limit headers");
            return false;
        };
        if !limit.should_pause() {
            return false;
        }
        warn!(
            remaining = limit.remaining,
            reset = limit.reset,
            cooldown_ms = self.cooldown.as_millis() as u64,
            "approaching rate limit, pausing"
        );
        thread::sleep(self.cooldown);
        true
    }
}

impl fmt::Debug for ShipStation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShipStation")
            .field("base_url", &self.base_url.as_str())
            .field("endpoint", &self.endpoint)
            .field("cooldown", &self.cooldown)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

/// Turn non-success statuses into `ApiError::HttpStatus`.
fn check_status(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.is_success() {
        return Ok(response);
    }
    Err(ApiError::HttpStatus {
        status: response.status,
        body: response.body,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::test_support::{ok_response, RecordingTransport};

    fn credentials() -> Credentials {
        Credentials::new("key", "secret").unwrap()
    }

    fn client_with(transport: &Arc<RecordingTransport>) -> ShipStation {
        ShipStation::new(&credentials())
            .with_transport(transport.clone())
            .with_cooldown(Duration::from_millis(50))
    }

    #[test]
    fn authorization_header_is_basic_base64() {
        assert_eq!(credentials().authorization_header(), "Basic a2V5OnNlY3JldA==");
    }

    #[test]
    fn credentials_reject_missing_or_empty_values() {
        assert!(matches!(
            Credentials::from_parts(None, Some("secret".into())),
            Err(ConfigError::MissingCredentials { missing: "api_key" })
        ));
        assert!(matches!(
            Credentials::new("key", ""),
            Err(ConfigError::MissingCredentials {
                missing: "api_secret"
            })
        ));
        assert!(Credentials::from_parts(None, None).is_err());
    }

    #[test]
    fn credentials_debug_hides_secret() {
        let rendered = format!("{:?}", credentials());
        assert!(rendered.contains("key"));
        assert!(!rendered.contains("\"secret\""));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn default_client_targets_production_origin() {
        let client = ShipStation::new(&credentials());
        assert_eq!(client.base_url(), "https://ssapi.shipstation.com/");
        assert_eq!(client.endpoint(), Endpoint::Orders);
        assert_eq!(client.cooldown(), DEFAULT_COOLDOWN);
    }

    #[test]
    fn build_get_passes_query_and_headers_through() {
        let client = ShipStation::new(&credentials());
        let options = RequestOptions::new()
            .query("orderStatus", "awaiting_shipment")
            .query("page", "2")
            .header("X-Partner", "acme");
        let req = client.build_get("/orders", &options).unwrap();

        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "https://ssapi.shipstation.com/orders?orderStatus=awaiting_shipment&page=2"
        );
        assert_eq!(req.header("authorization"), Some("Basic a2V5OnNlY3JldA=="));
        assert_eq!(req.header("x-partner"), Some("acme"));
        assert!(req.body.is_none());
    }

    #[test]
    fn build_get_resolves_relative_uris_against_origin() {
        let client = ShipStation::new(&credentials());
        let req = client.build_get("orders/123", &RequestOptions::new()).unwrap();
        assert_eq!(req.url, "https://ssapi.shipstation.com/orders/123");
    }

    #[test]
    fn option_headers_override_defaults() {
        let client = ShipStation::new(&credentials());
        let options = RequestOptions::new().header("authorization", "Bearer other");
        let req = client.build_delete("/webhooks/7", &options).unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header("Authorization"), Some("Bearer other"));
    }

    #[test]
    fn from_config_requires_secret() {
        let config = ShipStationConfig {
            api_key: Some("key".to_string()),
            api_secret: None,
            base_url: None,
        };
        let err = ShipStation::from_config(&config).unwrap_err();
        assert!(
            matches!(
                err,
                ApiError::Config(ConfigError::MissingCredentials {
                    missing: "api_secret"
                })
            ),
            "{err}"
        );
    }

    #[test]
    fn from_config_applies_base_url() {
        let config = ShipStationConfig {
            api_key: Some("key".to_string()),
            api_secret: Some("secret".to_string()),
            base_url: Some("http://127.0.0.1:4000".to_string()),
        };
        let client = ShipStation::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:4000/");
        assert_eq!(client.authorization(), "Basic a2V5OnNlY3JldA==");
        let req = client.build_get("/stores", &RequestOptions::new()).unwrap();
        assert_eq!(req.url, "http://127.0.0.1:4000/stores");
    }

    #[test]
    fn build_post_form_encodes_fields() {
        let client = ShipStation::new(&credentials());
        let req = client
            .build_post(
                "/orders/holduntil",
                &[("orderId", "42"), ("holdUntilDate", "2026-11-01 & later")],
            )
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("content-type"), Some(FORM_CONTENT_TYPE));
        assert_eq!(
            req.body.as_deref(),
            Some("orderId=42&holdUntilDate=2026-11-01+%26+later")
        );
    }

    #[test]
    fn build_update_puts_json() {
        let client = ShipStation::new(&credentials());
        let body = serde_json::json!({"productId": 9, "sku": "ABC"});
        let req = client.build_update("/products/9", &body).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "https://ssapi.shipstation.com/products/9");
        assert_eq!(req.header("content-type"), Some(JSON_CONTENT_TYPE));
        let sent: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent, body);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ShipStation::new(&credentials()).with_base_url("not a url").unwrap_err();
        assert!(matches!(err, ApiError::InvalidUri { .. }));
    }

    #[test]
    fn verbs_return_response_verbatim() {
        let transport = Arc::new(RecordingTransport::new(vec![HttpResponse {
            status: 200,
            headers: vec![("X-Custom".to_string(), "1".to_string())],
            body: r#"{"orders":[]}"#.to_string(),
        }]));
        let client = client_with(&transport);

        let resp = client.get("/orders", &RequestOptions::new()).unwrap();
        assert_eq!(resp.body, r#"{"orders":[]}"#);
        assert_eq!(resp.header("x-custom"), Some("1"));

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Get);
    }

    #[test]
    fn each_verb_uses_its_method() {
        let transport = Arc::new(RecordingTransport::new(vec![
            ok_response(),
            ok_response(),
            ok_response(),
            ok_response(),
        ]));
        let client = client_with(&transport);

        client.get("/stores", &RequestOptions::new()).unwrap();
        client.post("/stores", &[("storeName", "Main")]).unwrap();
        client.update("/stores/1", &serde_json::json!({"storeName": "Main"})).unwrap();
        client.delete("/stores/1", &RequestOptions::new()).unwrap();

        let methods: Vec<HttpMethod> = transport.requests().iter().map(|r| r.method).collect();
        assert_eq!(
            methods,
            vec![HttpMethod::Get, HttpMethod::Post, HttpMethod::Put, HttpMethod::Delete]
        );
    }

    #[test]
    fn non_success_status_is_an_error() {
        let transport = Arc::new(RecordingTransport::new(vec![HttpResponse {
            status: 404,
            headers: Vec::new(),
            body: "not found".to_string(),
        }]));
        let err = client_with(&transport)
            .get("/orders/1", &RequestOptions::new())
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpStatus { status: 404, ref body } if body == "not found"));
    }

    #[test]
    fn plenty_of_quota_does_not_pause() {
        let client = ShipStation::new(&credentials()).with_cooldown(Duration::from_secs(30));
        let resp = crate::test_support::rate_limited_response("10", "5");
        let started = Instant::now();
        assert!(!client.sleep_if_rate_limited(&resp));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn low_quota_pauses_for_cooldown() {
        let client = ShipStation::new(&credentials()).with_cooldown(Duration::from_millis(80));
        let resp = crate::test_support::rate_limited_response("2", "5");
        let started = Instant::now();
        assert!(client.sleep_if_rate_limited(&resp));
        assert!(started.elapsed() >= Duration::from_millis(80));
    }

    #[test]
    fn zero_remaining_pauses_without_panicking() {
        let client = ShipStation::new(&credentials()).with_cooldown(Duration::from_millis(10));
        let resp = crate::test_support::rate_limited_response("0", "30");
        assert!(client.sleep_if_rate_limited(&resp));
    }

    #[test]
    fn dispatch_pauses_before_returning() {
        let transport = Arc::new(RecordingTransport::new(vec![
            crate::test_support::rate_limited_response("1", "40"),
        ]));
        let client = client_with(&transport);
        let started = Instant::now();
        client.get("/orders", &RequestOptions::new()).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn with_endpoint_selects_known_names_only() {
        let mut client = ShipStation::new(&credentials());
        client.with_endpoint("carriers");
        assert_eq!(client.endpoint(), Endpoint::Carriers);
        client.with_endpoint("labels");
        assert_eq!(client.endpoint(), Endpoint::Carriers);
    }

    #[test]
    fn access_unknown_name_returns_client_unchanged() {
        let mut client = ShipStation::new(&credentials());
        client.set_endpoint(Endpoint::Stores);
        match client.access("labels") {
            Accessed::Client(handle) => assert_eq!(handle.endpoint(), Endpoint::Stores),
            Accessed::Helper(_) => panic!("no helper named Labels"),
        }
        assert_eq!(client.endpoint(), Endpoint::Stores);
    }

    #[test]
    fn access_endpoint_without_helper_returns_client() {
        let mut client = ShipStation::new(&credentials());
        assert!(matches!(client.access("warehouses"), Accessed::Client(_)));
        assert_eq!(client.endpoint(), Endpoint::Warehouses);
    }

    #[test]
    fn access_orders_selects_endpoint_and_returns_helper() {
        let mut client = ShipStation::new(&credentials());
        client.set_endpoint(Endpoint::Users);
        assert!(matches!(client.access("orders"), Accessed::Helper(Helper::Orders(_))));
        assert_eq!(client.endpoint(), Endpoint::Orders);
    }

    #[test]
    fn clones_track_endpoints_independently() {
        let mut first = ShipStation::new(&credentials());
        let mut second = first.clone();
        first.with_endpoint("customers");
        second.with_endpoint("products");
        assert_eq!(first.endpoint(), Endpoint::Customers);
        assert_eq!(second.endpoint(), Endpoint::Products);
    }
}
