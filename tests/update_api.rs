//! End-to-end tests of the update API over real HTTP.

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::time::Duration;

mod common;

#[tokio::test]
async fn test_query_update_rewrites_and_reloads() {
    let api = common::start_api("a=1\nb=2\nc=3", "cat", |_| {}).await;

    let res = common::client()
        .get(api.url("/pgbouncer?b=&d=9"))
        .send()
        .await
        .expect("API unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "RELOAD");

    let ini = api.ini();
    let lines: Vec<&str> = ini.lines().collect();
    assert!(lines.contains(&"a=1"));
    assert!(lines.contains(&"c=3"));
    assert!(lines.contains(&"d=9"));
    assert!(!lines.iter().any(|l| l.starts_with("b=")));

    api.shutdown.trigger();
}

#[tokio::test]
async fn test_empty_file_gets_single_entry() {
    let api = common::start_api("", "cat", |_| {}).await;

    let res = common::client()
        .post(api.url("/"))
        .form(&[("x", "5")])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(api.ini(), "x=5");
    api.shutdown.trigger();
}

#[tokio::test]
async fn test_query_beats_body_beats_upload() {
    let api = common::start_api("[pgbouncer]", "cat", |_| {}).await;

    let form = Form::new()
        .text("pool_mode", "transaction")
        .text("auth_type", "md5")
        .part("auth_file", Part::bytes(b"\"app\" \"secret\"".to_vec()).file_name("users.txt"))
        .part("auth_type", Part::bytes(b"unused".to_vec()).file_name("unused.txt"));

    let res = common::client()
        .post(api.url("/?pool_mode=session"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let auth_file = api.dir.path().join("auth_file");
    assert_eq!(std::fs::read(&auth_file).unwrap(), b"\"app\" \"secret\"");

    let ini = api.ini();
    let lines: Vec<&str> = ini.lines().collect();
    assert_eq!(lines[0], "[pgbouncer]");
    assert!(lines.contains(&"pool_mode=session"));
    assert!(lines.contains(&"auth_type=md5"));
    assert!(lines.contains(&format!("auth_file={}", auth_file.display()).as_str()));
    assert_eq!(lines.len(), 4);

    api.shutdown.trigger();
}

#[tokio::test]
async fn test_json_body() {
    let api = common::start_api("max_client_conn=10\nverbose=1", "cat", |_| {}).await;

    let res = common::client()
        .put(api.url("/"))
        .json(&serde_json::json!({ "max_client_conn": 200, "verbose": null }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(api.ini(), "max_client_conn=200");
    api.shutdown.trigger();
}

#[tokio::test]
async fn test_unconfirmed_reload_reports_output() {
    let api = common::start_api("a=1", "echo 'error: syntax'", |_| {}).await;

    let res = common::client()
        .get(api.url("/?a=2"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert!(res.text().await.unwrap().contains("error: syntax"));
    // The new file is in place even though the reload was not confirmed
    assert_eq!(api.ini(), "a=2");
    api.shutdown.trigger();
}

#[tokio::test]
async fn test_reload_timeout_is_gateway_timeout() {
    let api = common::start_api("a=1", "sleep 5", |c| c.reload.timeout_secs = 1).await;

    let res = common::client()
        .get(api.url("/?a=2"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    api.shutdown.trigger();
}

#[tokio::test]
async fn test_request_timed_out_in_queue_leaves_file_alone() {
    // Each reload takes 3s; a request gives up after 5s.
    let api = common::start_api("a=1", "sleep 3; cat", |c| {
        c.reload.timeout_secs = 4;
        c.timeouts.request_secs = 5;
    })
    .await;

    let mut tasks = Vec::new();
    for key in ["first", "second", "third"] {
        let url = api.url(&format!("/?{}=1", key));
        tasks.push(tokio::spawn(async move {
            common::client().get(url).send().await.unwrap().status()
        }));
        tokio::time::sleep(Duration::from_millis(150)).await;
    }
    let mut statuses = Vec::new();
    for task in tasks {
        statuses.push(task.await.unwrap());
    }
    assert_eq!(statuses[0], StatusCode::OK);
    assert_eq!(statuses[2], StatusCode::REQUEST_TIMEOUT);

    // Give the worker time to reach the abandoned third job.
    tokio::time::sleep(Duration::from_secs(2)).await;
    let ini = api.ini();
    assert!(ini.contains("first=1"));
    assert!(!ini.contains("third="), "{}", ini);
    api.shutdown.trigger();
}

#[tokio::test]
async fn test_oversized_body_is_payload_too_large() {
    let api = common::start_api("a=1", "cat", |c| c.security.max_body_size = 64).await;

    let res = common::client()
        .post(api.url("/"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body(format!("a={}", "x".repeat(1024)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(api.ini(), "a=1");
    api.shutdown.trigger();
}

#[tokio::test]
async fn test_upload_name_traversal_rejected() {
    let api = common::start_api("a=1", "cat", |_| {}).await;

    let form = Form::new().part("..", Part::bytes(b"x".to_vec()).file_name("x"));
    let res = common::client()
        .post(api.url("/"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(api.ini(), "a=1");
    api.shutdown.trigger();
}

#[tokio::test]
async fn test_basic_auth() {
    let api = common::start_api("a=1", "cat", |c| {
        c.auth.username = "admin".into();
        c.auth.password = "secret".into();
    })
    .await;
    let client = common::client();

    let res = client.get(api.url("/?a=2")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key("www-authenticate"));

    let res = client
        .get(api.url("/?a=2"))
        .basic_auth("admin", Some("wrong"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(api.ini(), "a=1");

    let res = client
        .get(api.url("/?a=2"))
        .basic_auth("admin", Some("secret"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(api.ini(), "a=2");

    api.shutdown.trigger();
}
