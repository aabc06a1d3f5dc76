// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Line-delimited stdio transport tests over in-memory streams.

use serde_json::Value;
use strava_mcp::config::Config;
use strava_mcp::mcp::transport::serve;

mod common;
use common::{create_test_app, ride};

async fn run_session(input: &str) -> Vec<Value> {
    let app = create_test_app(
        Config::default(),
        vec![ride(1, "Morning Ride", "MountainBikeRide")],
    );
    let mut output = Vec::new();

    serve(app.state.mcp.clone(), input.as_bytes(), &mut output)
        .await
        .unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_one_response_per_request_line() {
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n",
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"get_activity","arguments":{"activity_id":1}}}"#,
        "\n",
    );

    let responses = run_session(input).await;

    // the notification and the blank line produce nothing
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "strava");
    assert_eq!(responses[1]["id"], 2);
    assert_eq!(
        responses[1]["result"]["structuredContent"]["name"],
        "Morning Ride"
    );
}

#[tokio::test]
async fn test_garbage_line_gets_parse_error() {
    let responses = run_session("this is not json\n").await;

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert_eq!(responses[0]["id"], Value::Null);
}

#[tokio::test]
async fn test_invalid_request_keeps_id() {
    let responses = run_session(r#"{"jsonrpc":"2.0","id":7}"#).await;

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["error"]["code"], -32600);
    assert_eq!(responses[0]["id"], 7);
}
