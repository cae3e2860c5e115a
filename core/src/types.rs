//! DTOs for the Zoom client.
//!
//! Only the fields the client reads are modelled; unknown fields in
//! responses are ignored.

use serde::{Deserialize, Serialize};

/// A user account as returned by `/users` and `/users/{user_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// A scheduled meeting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Meeting {
    pub id: u64,
    pub topic: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
}

/// Request payload for updating a meeting. Only the fields present are
/// applied; omitted fields stay unchanged upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMeeting {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}
