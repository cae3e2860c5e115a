//! Synchronous REST client core shared by vendor API wrappers.
//!
//! # Overview
//! A vendor client registers its endpoints by logical name, then calls
//! through `RestClient`, which resolves the name into a URL, performs one
//! blocking HTTP call and classifies the response into a `Reply` or a typed
//! `Error`. List endpoints registered as bulk endpoints can be walked page by
//! page with `RestClient::pages`, or flattened with `RestClient::bulk_fetch`.
//!
//! # Design
//! - `EndpointRegistry` is built once per client and only read afterwards.
//! - `HttpRequest` / `HttpResponse` are plain data; the `Transport` trait is
//!   the only I/O boundary. `UreqTransport` is the production transport.
//! - Per-call state (`CallOptions`, the page token) lives on the caller's
//!   stack; nothing is carried across calls except the credential, which is
//!   replaced explicitly through `RestClient::refresh_credential`.
//! - Vendor clients compose a `RestClient` rather than extending it;
//!   `ZoomClient` is the reference example.

pub mod client;
pub mod config;
pub mod credential;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod pagination;
pub mod transport;
pub mod types;
pub mod zoom;

#[cfg(test)]
mod testing;

pub use client::{classify, CallOptions, Reply, ResponseClass, RestClient};
pub use config::{ClientConfig, PaginationConfig};
pub use credential::Credential;
pub use endpoint::{path_params, EndpointRegistry, EndpointSpec, PathParams};
pub use error::{Error, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use pagination::{extract_page, Page, PageToken, Pages};
pub use transport::UreqTransport;
pub use types::{Meeting, UpdateMeeting, User};
pub use zoom::ZoomClient;
