//! Token-paginated bulk fetching.
//!
//! # Design
//! A list endpoint answers each request with a JSON object holding one data
//! field plus paging bookkeeping (`next_page_token`, `page_count`, ...). The
//! walk starts without a token, sends the token from each page as a query
//! parameter on the next request, and stops when a page carries no token.
//!
//! `Pages` is the lazy view: one request per `next()`, strictly sequential.
//! It has no page limit, so an upstream that hands out tokens forever keeps
//! it walking forever. A request that times out is retried up to
//! `CallOptions::retries` times; every other error ends the walk.

use std::iter::FusedIterator;

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{set_query, CallOptions, Reply, RestClient};
use crate::config::PaginationConfig;
use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest, Transport, TransportError};

/// Where a walk stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageToken {
    Start,
    Next(String),
    Done,
}

/// Data and continuation token pulled out of one page body.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub data: Vec<Value>,
    pub next_token: Option<String>,
}

/// Split a page body into its data and next-page token.
///
/// The data is the first top-level field, in document order, that is not a
/// paging field. An array is taken item by item, a null or absent field is an
/// empty page and any other value is a page of one. A null, empty-string or
/// absent token means there is no next page. Returns `None` if `body` is not
/// an object.
pub fn extract_page(body: Value, pagination: &PaginationConfig) -> Option<Page> {
    let Value::Object(fields) = body else {
        return None;
    };

    let next_token = fields.get(&pagination.token_field).and_then(token_string);
    let data = fields
        .into_iter()
        .find(|(name, _)| !pagination.is_metadata(name))
        .map(|(_, value)| value);

    let data = match data {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other],
    };

    Some(Page { data, next_token })
}

fn token_string(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Lazy sequence of pages from a bulk endpoint.
pub struct Pages<'a, T> {
    client: &'a RestClient<T>,
    endpoint: String,
    url: String,
    options: CallOptions,
    token: PageToken,
    fetched: usize,
}

impl<'a, T: Transport> Pages<'a, T> {
    pub(crate) fn new(client: &'a RestClient<T>, endpoint: &str, url: String, mut options: CallOptions) -> Self {
        // Every page is a plain GET whose body is parsed.
        options.method = HttpMethod::Get;
        options.body = None;
        options.raw_response = false;
        Self {
            client,
            endpoint: endpoint.to_string(),
            url,
            options,
            token: PageToken::Start,
            fetched: 0,
        }
    }

    pub fn token(&self) -> &PageToken {
        &self.token
    }

    /// Pages successfully fetched so far.
    pub fn pages_fetched(&self) -> usize {
        self.fetched
    }

    fn fetch_page(&mut self) -> Result<Vec<Value>> {
        let client = self.client;
        let pagination = &client.config().pagination;
        let mut request = client.build_request(self.url.clone(), &self.options)?;
        if let PageToken::Next(token) = &self.token {
            set_query(&mut request.query, &pagination.token_field, token);
        }

        let page = match self.send(&request)? {
            Reply::Json(body) => extract_page(body, pagination)
                .ok_or_else(|| Error::UnexpectedPage(self.endpoint.clone()))?,
            Reply::Empty => Page {
                data: Vec::new(),
                next_token: None,
            },
            Reply::Raw(_) => return Err(Error::UnexpectedPage(self.endpoint.clone())),
        };

        self.fetched += 1;
        debug!(
            endpoint = %self.endpoint,
            page = self.fetched,
            items = page.data.len(),
            more = page.next_token.is_some(),
            "page fetched"
        );
        self.token = match page.next_token {
            Some(token) => PageToken::Next(token),
            None => PageToken::Done,
        };
        Ok(page.data)
    }

    fn send(&self, request: &HttpRequest) -> Result<Reply> {
        let mut attempt = 0;
        loop {
            match self.client.dispatch(request, false) {
                Err(Error::Transport(TransportError::Timeout)) if attempt < self.options.retries => {
                    attempt += 1;
                    warn!(
                        endpoint = %self.endpoint,
                        attempt,
                        retries = self.options.retries,
                        "page request timed out, retrying"
                    );
                }
                outcome => return outcome,
            }
        }
    }
}

impl<T: Transport> Iterator for Pages<'_, T> {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.token == PageToken::Done {
            return None;
        }
        let page = self.fetch_page();
        if page.is_err() {
            self.token = PageToken::Done;
        }
        Some(page)
    }
}

impl<T: Transport> FusedIterator for Pages<'_, T> {}
