//! Zoom REST client built on `RestClient`.
//!
//! Zoom's list endpoints use exactly the default paging envelope
//! (`next_page_token`, `page_count`, `page_number`, `page_size`,
//! `total_records`), so the core's defaults apply unchanged.

use crate::client::{CallOptions, RestClient};
use crate::config::ClientConfig;
use crate::endpoint::EndpointRegistry;
use crate::error::{Error, Result};
use crate::http::{HttpMethod, Transport};
use crate::transport::UreqTransport;
use crate::types::{Meeting, UpdateMeeting, User};

pub const DEFAULT_BASE_URL: &str = "https://api.zoom.us/v2";

/// Largest page Zoom serves on list endpoints.
const MAX_PAGE_SIZE: u32 = 300;

fn endpoints() -> EndpointRegistry {
    EndpointRegistry::new()
        .templated("user", "/users/<user_id>", ["<user_id>"])
        .templated("meeting", "/meetings/<meeting_id>", ["<meeting_id>"])
}

fn bulk_endpoints() -> EndpointRegistry {
    EndpointRegistry::new()
        .literal("users", "/users")
        .templated("meetings", "/users/<user_id>/meetings", ["<user_id>"])
}

#[derive(Debug, Clone)]
pub struct ZoomClient<T = UreqTransport> {
    inner: RestClient<T>,
}

impl ZoomClient<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }

    /// Configure from `ZOOM_BASE_URL`, `ZOOM_AUTHORIZATION` and
    /// `ZOOM_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        ClientConfig::from_env("ZOOM").map(Self::new)
    }
}

impl<T: Transport> ZoomClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            inner: RestClient::with_transport(config, endpoints(), bulk_endpoints(), transport),
        }
    }

    /// The underlying client, for endpoints without a named operation.
    pub fn rest(&self) -> &RestClient<T> {
        &self.inner
    }

    /// Swap in a freshly issued OAuth access token.
    pub fn refresh_token(&mut self, access_token: &str) {
        self.inner.refresh_credential(format!("Bearer {access_token}"));
    }

    /// All users, optionally filtered by status (`active`, `inactive`,
    /// `pending`).
    pub fn list_users(&self, status: Option<&str>) -> Result<Vec<User>> {
        let mut options = CallOptions::new().with_page_size(MAX_PAGE_SIZE);
        if let Some(status) = status {
            options = options.with_query("status", status);
        }
        self.inner.bulk_fetch_as("users", options)
    }

    pub fn get_user(&self, user_id: &str) -> Result<User> {
        self.inner
            .request_as("user", CallOptions::new().with_param("<user_id>", user_id))
    }

    pub fn list_meetings(&self, user_id: &str) -> Result<Vec<Meeting>> {
        self.inner.bulk_fetch_as(
            "meetings",
            CallOptions::new()
                .with_param("<user_id>", user_id)
                .with_page_size(MAX_PAGE_SIZE),
        )
    }

    pub fn get_meeting(&self, meeting_id: u64) -> Result<Meeting> {
        self.inner.request_as(
            "meeting",
            CallOptions::new().with_param("<meeting_id>", meeting_id),
        )
    }

    /// Zoom answers a successful update with 204 and no body.
    pub fn update_meeting(&self, meeting_id: u64, update: &UpdateMeeting) -> Result<()> {
        let body = serde_json::to_value(update).map_err(|e| Error::Serialization(e.to_string()))?;
        self.inner
            .request(
                "meeting",
                CallOptions::new()
                    .with_method(HttpMethod::Patch)
                    .with_param("<meeting_id>", meeting_id)
                    .with_body(body),
            )
            .map(drop)
    }

    pub fn delete_meeting(&self, meeting_id: u64) -> Result<()> {
        self.inner
            .request(
                "meeting",
                CallOptions::new()
                    .with_method(HttpMethod::Delete)
                    .with_param("<meeting_id>", meeting_id),
            )
            .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{response, MockTransport};
    use serde_json::{json, Value};

    fn zoom(transport: &MockTransport) -> ZoomClient<&MockTransport> {
        ZoomClient::with_transport(
            ClientConfig::new(DEFAULT_BASE_URL).with_authorization("Bearer t0"),
            transport,
        )
    }

    #[test]
    fn list_users_walks_every_page() {
        let first = json!({
            "page_count": 2, "page_number": 1, "page_size": 1, "total_records": 2,
            "next_page_token": "n1",
            "users": [{"id": "u1", "email": "a@example.edu"}]
        });
        let last = json!({
            "page_count": 2, "page_number": 2, "page_size": 1, "total_records": 2,
            "next_page_token": "",
            "users": [{"id": "u2", "email": "b@example.edu", "status": "active"}]
        });
        let transport = MockTransport::new()
            .respond(response(200, &first.to_string()))
            .respond(response(200, &last.to_string()));

        let users = zoom(&transport).list_users(Some("active")).unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, "u1");
        assert_eq!(users[1].status.as_deref(), Some("active"));
        let sent = transport.requests();
        assert_eq!(sent[0].url, "https://api.zoom.us/v2/users");
        assert_eq!(sent[0].query_value("page_size"), Some("300"));
        assert_eq!(sent[0].query_value("status"), Some("active"));
        assert_eq!(sent[1].query_value("next_page_token"), Some("n1"));
    }

    #[test]
    fn get_meeting_substitutes_numeric_id() {
        let body = json!({"id": 85746065, "topic": "Office hours", "duration": 30});
        let transport = MockTransport::new().respond(response(200, &body.to_string()));

        let meeting = zoom(&transport).get_meeting(85746065).unwrap();

        assert_eq!(meeting.topic, "Office hours");
        assert_eq!(meeting.duration, Some(30));
        assert_eq!(
            transport.last_request().unwrap().url,
            "https://api.zoom.us/v2/meetings/85746065"
        );
    }

    #[test]
    fn update_meeting_sends_patch_with_partial_body() {
        let transport = MockTransport::new().respond(response(204, ""));
        let update = UpdateMeeting {
            topic: Some("Renamed".to_string()),
            duration: None,
        };

        zoom(&transport).update_meeting(7, &update).unwrap();

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.method, HttpMethod::Patch);
        assert_eq!(sent.header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"topic": "Renamed"}));
    }

    #[test]
    fn missing_user_surfaces_failed_request() {
        let transport = MockTransport::new().respond(response(404, r#"{"code":1001}"#));
        let err = zoom(&transport).get_user("ghost").unwrap_err();
        assert!(matches!(err, Error::FailedRequest { status: 404, .. }));
    }

    #[test]
    fn empty_user_id_is_rejected_locally() {
        let transport = MockTransport::new();
        let err = zoom(&transport).get_user("").unwrap_err();
        assert!(matches!(err, Error::MissingElement(ref p) if p == "<user_id>"));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn refreshed_token_is_sent_as_bearer() {
        let transport = MockTransport::new().respond(response(204, ""));
        let mut client = zoom(&transport);
        client.refresh_token("t1");
        client.delete_meeting(1).unwrap();
        assert_eq!(
            transport.last_request().unwrap().header("authorization"),
            Some("Bearer t1")
        );
    }
}
