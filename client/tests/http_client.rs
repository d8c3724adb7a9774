use mockito::{Matcher, Server, ServerGuard};
use rql_client::rql::field;
use rql_client::{Client, ClientConfig, ClientError, MutateResponse};
use serde_json::{json, Value};

fn client_for(server: &ServerGuard, page_size: usize) -> Client {
    let config = ClientConfig {
        page_size,
        ..ClientConfig::new(server.url())
    };
    Client::new(config).unwrap()
}

fn page_query(offset: usize) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::Regex("^eq\\(kind,book\\)&".to_string()),
        Matcher::UrlEncoded("limit".into(), "2".into()),
        Matcher::UrlEncoded("offset".into(), offset.to_string()),
    ])
}

#[tokio::test]
async fn test_paginated_walk_over_http() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/v1/items")
        .match_query(page_query(0))
        .with_header("content-type", "application/json")
        .with_header("content-range", "items 0-1/3")
        .with_body(r#"[{"id":1,"kind":"book"},{"id":2,"kind":"book"}]"#)
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/v1/items")
        .match_query(page_query(2))
        .with_header("content-type", "application/json")
        .with_header("content-range", "items 2-2/3")
        .with_body(r#"[{"id":3,"kind":"book"}]"#)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server, 2);
    let mut books = client
        .namespace("v1")
        .collection("items")
        .filter(field("kind").eq("book").unwrap());

    let records = books.collect_records().await.unwrap();
    let ids: Vec<Value> = records.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
    assert_eq!(books.count().await.unwrap(), Some(3));

    // Replayed from cache, no further requests.
    assert_eq!(books.collect_records().await.unwrap().len(), 3);
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_remote_error_surfaces_status_and_body() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1/items")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"detail":"unknown field"}"#)
        .create_async()
        .await;

    let client = client_for(&server, 10);
    let mut view = client.namespace("v1").collection("items").view();
    match view.first().await {
        Err(ClientError::Remote { status, body }) => {
            assert_eq!(status, 400);
            assert!(body.contains("unknown field"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_create_and_action_over_http() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/v1/orders")
        .match_body(Matcher::Json(json!({"sku": "A-1"})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":9,"sku":"A-1"}"#)
        .create_async()
        .await;
    let cancel = server
        .mock("POST", "/v1/orders/9/cancel")
        .with_status(204)
        .create_async()
        .await;

    let client = client_for(&server, 10);
    let orders = client.namespace("v1").collection("orders");
    let created = orders.create(&json!({"sku": "A-1"})).await.unwrap();
    assert_eq!(created, MutateResponse::Json(json!({"id": 9, "sku": "A-1"})));

    let cancelled = orders.resource(9).action("cancel").call(None).await.unwrap();
    assert_eq!(cancelled, MutateResponse::Empty);
    create.assert_async().await;
    cancel.assert_async().await;
}

#[tokio::test]
async fn test_client_from_config_file() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/users")
        .match_header("authorization", "Token abc")
        .match_query(Matcher::UrlEncoded("limit".into(), "5".into()))
        .with_header("content-type", "application/json")
        .with_header("content-range", "items 0-0/1")
        .with_body(r#"[{"id":"u1"}]"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("client.toml");
    std::fs::write(
        &path,
        format!(
            "endpoint = \"{}\"\npage_size = 5\n\n[headers]\nauthorization = \"Token abc\"\n",
            server.url()
        ),
    )
    .unwrap();

    let client = Client::new(ClientConfig::load(&path).unwrap()).unwrap();
    let mut users = client.collection("users").view();
    assert_eq!(users.collect_records().await.unwrap(), vec![json!({"id": "u1"})]);
    mock.assert_async().await;
}
