use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

pub const DEFAULT_PAGE_SIZE: usize = 30;
pub const MAX_PAGE_SIZE: usize = 300;
/// How long the first `/slow` request stalls before answering.
pub const SLOW_FIRST_RESPONSE: Duration = Duration::from_secs(3);

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Meeting {
    pub id: u64,
    pub host_id: String,
    pub topic: String,
    pub duration: u32,
}

#[derive(Deserialize)]
pub struct UpdateMeeting {
    pub topic: Option<String>,
    pub duration: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page_size: Option<usize>,
    pub next_page_token: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default)]
pub struct Store {
    pub users: Vec<User>,
    pub meetings: BTreeMap<u64, Meeting>,
}

/// Five users; `u1` hosts three meetings and `u2` hosts one.
pub fn seed() -> Store {
    let users = (1..=5)
        .map(|n| User {
            id: format!("u{n}"),
            email: format!("user{n}@example.edu"),
            first_name: format!("First{n}"),
            last_name: format!("Last{n}"),
            status: if n == 5 { "inactive" } else { "active" }.to_string(),
        })
        .collect();

    let meetings = [
        (1001, "u1", "Advising"),
        (1002, "u1", "Office hours"),
        (1003, "u1", "Faculty senate"),
        (2001, "u2", "Orientation"),
    ]
    .into_iter()
    .map(|(id, host, topic)| {
        (
            id,
            Meeting {
                id,
                host_id: host.to_string(),
                topic: topic.to_string(),
                duration: 30,
            },
        )
    })
    .collect();

    Store { users, meetings }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub slow_hits: Arc<AtomicUsize>,
}

pub fn app() -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(seed())),
        slow_hits: Arc::new(AtomicUsize::new(0)),
    };
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{user_id}", get(get_user))
        .route("/users/{user_id}/meetings", get(list_meetings))
        .route(
            "/meetings/{meeting_id}",
            get(get_meeting).patch(update_meeting).delete(delete_meeting),
        )
        .route("/throttled", any(throttled))
        .route("/echo", any(echo))
        .route("/plain", get(plain))
        .route("/empty", any(empty))
        .route("/slow", get(slow))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, code: u32, message: &str) -> ApiError {
    (status, Json(json!({"code": code, "message": message})))
}

/// Slice `items` into the page named by `query`, wrapped in the paging
/// envelope with the data under `field`. The last page carries an empty
/// token.
pub fn paginate<T: Serialize>(field: &str, items: &[T], query: &PageQuery) -> Result<Value, ApiError> {
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = match query.next_page_token.as_deref() {
        None | Some("") => 0,
        Some(token) => token
            .strip_prefix("off-")
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|n| *n < items.len())
            .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, 300, "Invalid next_page_token"))?,
    };

    let end = (offset + page_size).min(items.len());
    let next_page_token = if end < items.len() {
        format!("off-{end}")
    } else {
        String::new()
    };

    let mut body = Map::new();
    body.insert("page_count".to_string(), json!(items.len().div_ceil(page_size)));
    body.insert("page_number".to_string(), json!(offset / page_size + 1));
    body.insert("page_size".to_string(), json!(page_size));
    body.insert("total_records".to_string(), json!(items.len()));
    body.insert("next_page_token".to_string(), json!(next_page_token));
    body.insert(field.to_string(), json!(&items[offset..end]));
    Ok(Value::Object(body))
}

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let store = state.db.read().await;
    let users: Vec<&User> = store
        .users
        .iter()
        .filter(|u| query.status.as_deref().map_or(true, |s| u.status == s))
        .collect();
    paginate("users", &users, &query).map(Json)
}

async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let store = state.db.read().await;
    store
        .users
        .iter()
        .find(|u| u.id == user_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, 1001, "User does not exist"))
}

async fn list_meetings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let store = state.db.read().await;
    if !store.users.iter().any(|u| u.id == user_id) {
        return Err(api_error(StatusCode::NOT_FOUND, 1001, "User does not exist"));
    }
    let meetings: Vec<&Meeting> = store
        .meetings
        .values()
        .filter(|m| m.host_id == user_id)
        .collect();
    paginate("meetings", &meetings, &query).map(Json)
}

async fn get_meeting(
    State(state): State<AppState>,
    Path(meeting_id): Path<u64>,
) -> Result<Json<Meeting>, ApiError> {
    let store = state.db.read().await;
    store
        .meetings
        .get(&meeting_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, 3001, "Meeting does not exist"))
}

async fn update_meeting(
    State(state): State<AppState>,
    Path(meeting_id): Path<u64>,
    Json(input): Json<UpdateMeeting>,
) -> Result<StatusCode, ApiError> {
    let mut store = state.db.write().await;
    let meeting = store
        .meetings
        .get_mut(&meeting_id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, 3001, "Meeting does not exist"))?;
    if let Some(topic) = input.topic {
        meeting.topic = topic;
    }
    if let Some(duration) = input.duration {
        meeting.duration = duration;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_meeting(
    State(state): State<AppState>,
    Path(meeting_id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    let mut store = state.db.write().await;
    store
        .meetings
        .remove(&meeting_id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, 3001, "Meeting does not exist"))
}

async fn throttled() -> ApiError {
    api_error(
        StatusCode::TOO_MANY_REQUESTS,
        429,
        "You have reached the maximum per-second rate limit",
    )
}

/// Reflect the request back as JSON.
async fn echo(
    method: Method,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    body: String,
) -> Json<Value> {
    let headers: Map<String, Value> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), json!(v)))
        })
        .collect();
    Json(json!({
        "method": method.as_str(),
        "headers": headers,
        "query": query,
        "body": body,
    }))
}

async fn plain() -> &'static str {
    "pong"
}

async fn empty() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn slow(State(state): State<AppState>) -> Json<Value> {
    let hit = state.slow_hits.fetch_add(1, Ordering::SeqCst);
    if hit == 0 {
        debug!("stalling first /slow request");
        tokio::time::sleep(SLOW_FIRST_RESPONSE).await;
    }
    Json(json!({"next_page_token": "", "hits": [hit + 1]}))
}
