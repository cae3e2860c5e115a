//! End-to-end tests against the live mock upstream.
//!
//! # Design
//! Starts the mock server on a random port, then drives `RestClient` and
//! `ZoomClient` over real HTTP through `UreqTransport`. Checks that
//! resolution, dispatch, classification and pagination agree with an actual
//! server, including header handling and the timeout retry.

use std::net::SocketAddr;
use std::time::Duration;

use restclient_core::{
    CallOptions, ClientConfig, EndpointRegistry, Error, HttpMethod, Reply, RestClient,
    TransportError, UpdateMeeting, ZoomClient,
};
use serde_json::{json, Value};

/// Start the mock server on a random port and return its address.
fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn fixtures_client(addr: SocketAddr, config: impl FnOnce(ClientConfig) -> ClientConfig) -> RestClient {
    let endpoints = EndpointRegistry::new()
        .literal("echo", "/echo")
        .literal("throttled", "/throttled")
        .literal("plain", "/plain")
        .literal("empty", "/empty")
        .templated("user", "/users/<user_id>", ["<user_id>"]);
    let bulk = EndpointRegistry::new()
        .literal("users", "/users")
        .literal("slow", "/slow");
    RestClient::new(config(ClientConfig::new(format!("http://{addr}"))), endpoints, bulk)
}

#[test]
fn zoom_client_lifecycle() {
    let addr = start_server();
    let zoom = ZoomClient::new(
        ClientConfig::new(format!("http://{addr}")).with_authorization("Bearer test"),
    );

    // Step 1: every user, walked across pages of 300 (a single page here).
    let users = zoom.list_users(None).unwrap();
    assert_eq!(users.len(), 5);
    assert_eq!(users[0].id, "u1");

    // Step 2: status filter is passed through as a query parameter.
    let inactive = zoom.list_users(Some("inactive")).unwrap();
    assert_eq!(inactive.len(), 1);
    assert_eq!(inactive[0].id, "u5");

    // Step 3: a single user.
    let user = zoom.get_user("u3").unwrap();
    assert_eq!(user.email, "user3@example.edu");

    // Step 4: meetings for a host.
    let meetings = zoom.list_meetings("u1").unwrap();
    assert_eq!(meetings.len(), 3);

    // Step 5: update, then read back.
    let update = UpdateMeeting {
        topic: Some("Renamed".to_string()),
        duration: None,
    };
    zoom.update_meeting(1001, &update).unwrap();
    let meeting = zoom.get_meeting(1001).unwrap();
    assert_eq!(meeting.topic, "Renamed");
    assert_eq!(meeting.duration, Some(30));

    // Step 6: delete, then the meeting is gone.
    zoom.delete_meeting(1001).unwrap();
    let err = zoom.get_meeting(1001).unwrap_err();
    assert!(matches!(err, Error::FailedRequest { status: 404, .. }));
    assert_eq!(zoom.list_meetings("u1").unwrap().len(), 2);

    // Step 7: unknown user.
    let err = zoom.get_user("nobody").unwrap_err();
    match err {
        Error::FailedRequest { status, reason } => {
            assert_eq!(status, 404);
            assert!(reason.contains("User does not exist"));
        }
        other => panic!("expected FailedRequest, got {other:?}"),
    }
}

#[test]
fn bulk_fetch_walks_small_pages_in_order() {
    let addr = start_server();
    let client = fixtures_client(addr, |c| c);

    let mut pages = client
        .pages("users", CallOptions::new().with_page_size(2))
        .unwrap();
    let sizes: Vec<usize> = pages.by_ref().map(|page| page.unwrap().len()).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
    assert_eq!(pages.pages_fetched(), 3);

    let users = client
        .bulk_fetch("users", CallOptions::new().with_page_size(2))
        .unwrap();
    let ids: Vec<&str> = users.iter().map(|u| u["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["u1", "u2", "u3", "u4", "u5"]);
}

#[test]
fn headers_query_and_body_reach_the_server() {
    let addr = start_server();
    let client = fixtures_client(addr, |c| {
        c.with_authorization("Token abc").with_header("X-Client", "restclient")
    });

    let reply = client
        .request(
            "echo",
            CallOptions::new()
                .with_method(HttpMethod::Post)
                .with_query("term", "fall")
                .with_body(json!({"course": "BIO-101"})),
        )
        .unwrap();
    let echoed = reply.into_json().unwrap();

    assert_eq!(echoed["method"], "POST");
    assert_eq!(echoed["headers"]["authorization"], "Token abc");
    assert_eq!(echoed["headers"]["accept"], "application/json");
    assert_eq!(echoed["headers"]["content-type"], "application/json");
    assert_eq!(echoed["headers"]["x-client"], "restclient");
    assert_eq!(echoed["query"], json!([["term", "fall"]]));
    let body: Value = serde_json::from_str(echoed["body"].as_str().unwrap()).unwrap();
    assert_eq!(body, json!({"course": "BIO-101"}));
}

#[test]
fn every_supported_verb_is_dispatched() {
    let addr = start_server();
    let client = fixtures_client(addr, |c| c);

    for method in [
        HttpMethod::Get,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Patch,
        HttpMethod::Post,
        HttpMethod::Put,
    ] {
        let reply = client
            .request("echo", CallOptions::new().with_method(method.clone()))
            .unwrap();
        assert_eq!(reply.into_json().unwrap()["method"], method.as_str());
    }

    // HEAD answers without a body.
    let reply = client
        .request("echo", CallOptions::new().with_method(HttpMethod::Head))
        .unwrap();
    assert!(reply.is_empty());
}

#[test]
fn response_classes_over_the_wire() {
    let addr = start_server();
    let client = fixtures_client(addr, |c| c);

    let err = client.request("throttled", CallOptions::new()).unwrap_err();
    assert!(matches!(err, Error::TooManyRequests));

    let reply = client.request("empty", CallOptions::new()).unwrap();
    assert_eq!(reply, Reply::Empty);

    match client.request("plain", CallOptions::new()).unwrap() {
        Reply::Raw(response) => {
            assert_eq!(response.status, 200);
            assert_eq!(response.body, "pong");
        }
        other => panic!("expected raw reply, got {other:?}"),
    }

    let reply = client
        .request("user", CallOptions::new().with_param("<user_id>", "u1").with_raw_response())
        .unwrap();
    match reply {
        Reply::Raw(response) => {
            assert!(response.header("content-type").unwrap().contains("application/json"))
        }
        other => panic!("expected raw reply, got {other:?}"),
    }
}

#[test]
fn timed_out_page_is_retried() {
    let addr = start_server();
    let client = fixtures_client(addr, |c| c.with_timeout(Duration::from_millis(500)));

    // The first /slow request stalls past the timeout; the retry is served.
    let items = client.bulk_fetch("slow", CallOptions::new()).unwrap();
    assert_eq!(items, vec![json!(2)]);
}

#[test]
fn timeout_without_retries_surfaces() {
    let addr = start_server();
    let client = fixtures_client(addr, |c| c.with_timeout(Duration::from_millis(500)));

    let err = client
        .bulk_fetch("slow", CallOptions::new().with_retries(0))
        .unwrap_err();
    assert!(matches!(err, Error::Transport(TransportError::Timeout)));
}

#[test]
fn unreachable_upstream_is_a_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let client = fixtures_client(addr, |c| c);

    let err = client.request("echo", CallOptions::new()).unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}
