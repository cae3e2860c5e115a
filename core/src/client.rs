//! Generic REST client: endpoint resolution, request dispatch and the call
//! surface vendor clients build on.
//!
//! # Design
//! `RestClient` owns a read-only pair of endpoint registries (single-call
//! and bulk), the construction-time configuration, a credential holder and
//! a `Transport`. A call resolves a logical endpoint name into a URL, shapes
//! an `HttpRequest` from the per-call `CallOptions`, executes it once and
//! classifies the response:
//!
//! | status            | body      | result                       |
//! |-------------------|-----------|------------------------------|
//! | 2xx               | non-empty | `Reply::Json`, or `Reply::Raw` if not JSON |
//! | 2xx               | empty     | `Reply::Empty`               |
//! | 429               | any       | `Error::TooManyRequests`     |
//! | anything else     | any       | `Error::FailedRequest`       |
//!
//! Nothing is cached or carried between calls. Concurrent use of one client
//! is not a goal; the client is `Sync` only if its transport is.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::credential::Credential;
use crate::endpoint::{EndpointRegistry, PathParams};
use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::pagination::Pages;
use crate::transport::UreqTransport;

/// Status used for verbs the client does not implement.
pub const UNIMPLEMENTED_METHOD_STATUS: u16 = 418;

/// Outcome category of an HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    SuccessWithBody,
    SuccessEmpty,
    RateLimited,
    Failed,
}

impl ResponseClass {
    pub fn of(response: &HttpResponse) -> Self {
        if response.status == 429 {
            ResponseClass::RateLimited
        } else if !response.is_success() {
            ResponseClass::Failed
        } else if response.body.is_empty() {
            ResponseClass::SuccessEmpty
        } else {
            ResponseClass::SuccessWithBody
        }
    }
}

/// Successful result of a single call.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Parsed JSON body.
    Json(Value),
    /// The response itself: requested via `raw_response`, or the body was
    /// not JSON.
    Raw(HttpResponse),
    /// 2xx with no body.
    Empty,
}

impl Reply {
    pub fn into_json(self) -> Option<Value> {
        match self {
            Reply::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Reply::Empty)
    }
}

/// Per-call options. `Default` builds fresh, empty collections every time.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOptions {
    /// Values for the endpoint's path placeholders.
    pub params: PathParams,
    pub body: Option<Value>,
    /// Merged over the default headers. When present, no `Content-Type` is
    /// added implicitly.
    pub headers: Option<Vec<(String, String)>>,
    pub query: Vec<(String, String)>,
    pub method: HttpMethod,
    pub timeout: Option<Duration>,
    /// Sent as the `page_size` query parameter.
    pub page_size: Option<u32>,
    /// Retries after a timeout, applied to bulk page fetches only.
    pub retries: u32,
    pub raw_response: bool,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            params: PathParams::new(),
            body: None,
            headers: None,
            query: Vec::new(),
            method: HttpMethod::Get,
            timeout: None,
            page_size: None,
            retries: 1,
            raw_response: false,
        }
    }
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_param(mut self, placeholder: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(placeholder.into(), value.into());
        self
    }

    pub fn with_params(mut self, params: PathParams) -> Self {
        self.params.extend(params);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_raw_response(mut self) -> Self {
        self.raw_response = true;
        self
    }
}

/// Shared REST client core. Vendor clients hold one and delegate to it.
#[derive(Debug, Clone)]
pub struct RestClient<T = UreqTransport> {
    config: ClientConfig,
    credential: Credential,
    endpoints: EndpointRegistry,
    bulk_endpoints: EndpointRegistry,
    transport: T,
}

impl RestClient<UreqTransport> {
    pub fn new(
        config: ClientConfig,
        endpoints: EndpointRegistry,
        bulk_endpoints: EndpointRegistry,
    ) -> Self {
        Self::with_transport(config, endpoints, bulk_endpoints, UreqTransport::new())
    }
}

impl<T: Transport> RestClient<T> {
    /// The configured `authorization` moves into the credential holder;
    /// `config().authorization` is `None` afterwards.
    pub fn with_transport(
        mut config: ClientConfig,
        endpoints: EndpointRegistry,
        bulk_endpoints: EndpointRegistry,
        transport: T,
    ) -> Self {
        let credential = Credential::new(config.authorization.take());
        Self {
            config,
            credential,
            endpoints,
            bulk_endpoints,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn endpoints(&self) -> &EndpointRegistry {
        &self.endpoints
    }

    pub fn bulk_endpoints(&self) -> &EndpointRegistry {
        &self.bulk_endpoints
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Replace the `Authorization` value sent from the next call on.
    pub fn refresh_credential(&mut self, credential: impl Into<String>) {
        self.credential.replace(credential);
    }

    /// Resolve a single-call endpoint, falling back to the bulk registry.
    pub fn resolve(&self, name: &str, params: &PathParams) -> Result<String> {
        let registry = if self.endpoints.contains(name) {
            &self.endpoints
        } else {
            &self.bulk_endpoints
        };
        registry.resolve(&self.config.base_url, name, params)
    }

    /// Resolve against the bulk registry only.
    pub fn resolve_bulk(&self, name: &str, params: &PathParams) -> Result<String> {
        if !self.bulk_endpoints.contains(name) {
            return Err(Error::UnsupportedBulkEndpoint(name.to_string()));
        }
        self.bulk_endpoints
            .resolve(&self.config.base_url, name, params)
    }

    /// `accept`, the current credential and the configured extra headers.
    pub fn default_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        if let Some(credential) = self.credential.get() {
            set_header(&mut headers, "Authorization", credential);
        }
        for (name, value) in &self.config.additional_headers {
            set_header(&mut headers, name, value);
        }
        headers
    }

    /// Shape the request for `url` from the per-call options.
    pub fn build_request(&self, url: String, options: &CallOptions) -> Result<HttpRequest> {
        let mut headers = self.default_headers();
        match &options.headers {
            Some(overrides) => {
                for (name, value) in overrides {
                    set_header(&mut headers, name, value);
                }
            }
            None if options.method.carries_body() => {
                set_header(&mut headers, "Content-Type", "application/json");
            }
            None => {}
        }

        let mut query = options.query.clone();
        if let Some(page_size) = options.page_size {
            set_query(&mut query, "page_size", &page_size.to_string());
        }

        let body = options
            .body
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| Error::Serialization(e.to_string()))?;

        Ok(HttpRequest {
            method: options.method.clone(),
            url,
            headers,
            query,
            body,
            timeout: options.timeout.unwrap_or(self.config.timeout),
        })
    }

    /// Execute `request` once and classify the response.
    pub fn dispatch(&self, request: &HttpRequest, raw_response: bool) -> Result<Reply> {
        let response = match &request.method {
            HttpMethod::Other(verb) => HttpResponse {
                status: UNIMPLEMENTED_METHOD_STATUS,
                headers: Vec::new(),
                body: format!("Method {} not implemented", verb.to_uppercase()),
            },
            _ => self.transport.execute(request).map_err(|err| {
                warn!(
                    method = %request.method,
                    url = %request.url,
                    error = %err,
                    "request failed"
                );
                err
            })?,
        };
        debug!(
            method = %request.method,
            url = %request.url,
            status = response.status,
            "request dispatched"
        );
        classify(response, raw_response)
    }

    /// Resolve `endpoint`, then issue exactly one request.
    pub fn request(&self, endpoint: &str, options: CallOptions) -> Result<Reply> {
        let url = self.resolve(endpoint, &options.params)?;
        let request = self.build_request(url, &options)?;
        self.dispatch(&request, options.raw_response)
    }

    /// Like `request`, deserializing the JSON body into `D`.
    pub fn request_as<D: DeserializeOwned>(&self, endpoint: &str, options: CallOptions) -> Result<D> {
        match self.request(endpoint, options)? {
            Reply::Json(value) => {
                serde_json::from_value(value).map_err(|e| Error::Deserialization(e.to_string()))
            }
            Reply::Empty => Err(Error::Deserialization(format!(
                "{endpoint} returned an empty body"
            ))),
            Reply::Raw(response) => Err(Error::Deserialization(format!(
                "{endpoint} returned a non-JSON body (status {})",
                response.status
            ))),
        }
    }

    /// Lazily walk every page of a bulk endpoint.
    ///
    /// Fails before any request if `endpoint` is not a bulk endpoint or its
    /// placeholders are missing. Each call starts a fresh walk. Pages are
    /// always fetched with GET; `method`, `body` and `raw_response` in
    /// `options` are ignored.
    pub fn pages(&self, endpoint: &str, options: CallOptions) -> Result<Pages<'_, T>> {
        let url = self.resolve_bulk(endpoint, &options.params)?;
        Ok(Pages::new(self, endpoint, url, options))
    }

    /// Every item of every page, in arrival order.
    pub fn bulk_fetch(&self, endpoint: &str, options: CallOptions) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        for page in self.pages(endpoint, options)? {
            items.extend(page?);
        }
        Ok(items)
    }

    pub fn bulk_fetch_as<D: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: CallOptions,
    ) -> Result<Vec<D>> {
        self.bulk_fetch(endpoint, options)?
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(|e| Error::Deserialization(e.to_string())))
            .collect()
    }
}

/// Map a response onto a `Reply` or a typed error.
pub fn classify(response: HttpResponse, raw_response: bool) -> Result<Reply> {
    match ResponseClass::of(&response) {
        ResponseClass::RateLimited => Err(Error::TooManyRequests),
        ResponseClass::Failed => Err(Error::FailedRequest {
            status: response.status,
            reason: response.body,
        }),
        _ if raw_response => Ok(Reply::Raw(response)),
        ResponseClass::SuccessEmpty => Ok(Reply::Empty),
        ResponseClass::SuccessWithBody => match serde_json::from_str(&response.body) {
            Ok(value) => Ok(Reply::Json(value)),
            Err(_) => Ok(Reply::Raw(response)),
        },
    }
}

/// Insert or replace a header, comparing names case-insensitively.
fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
        Some(entry) => entry.1 = value.to_string(),
        None => headers.push((name.to_string(), value.to_string())),
    }
}

pub(crate) fn set_query(query: &mut Vec<(String, String)>, key: &str, value: &str) {
    query.retain(|(k, _)| k != key);
    query.push((key.to_string(), value.to_string()));
}
