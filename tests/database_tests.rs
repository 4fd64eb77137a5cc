use locascan::config::ClientOptions;
use locascan::database::{Database, Reference, RestDatabase};
use locascan::error::Error;
use reqwest::Client;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn database_for(server: &MockServer) -> RestDatabase {
    RestDatabase::new(
        Url::parse(&server.uri()).unwrap(),
        Client::new(),
        ClientOptions::default(),
    )
}

fn scans() -> Reference {
    Reference::root().child("product_scans").child("u1")
}

#[tokio::test]
async fn test_push_returns_generated_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/product_scans/u1.json"))
        .and(query_param("auth", "id_token"))
        .and(body_json(json!({"Barcode": "012345"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"name": "-NqA1b2C3d4E5f6G7h8I"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let db = database_for(&mock_server);
    let key = db
        .push(&scans(), json!({"Barcode": "012345"}), "id_token")
        .await
        .unwrap();
    assert_eq!(key, "-NqA1b2C3d4E5f6G7h8I");
}

#[tokio::test]
async fn test_get_missing_node_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/product_scans/u1/nope.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&mock_server)
        .await;

    let db = database_for(&mock_server);
    let node = db.get(&scans().child("nope"), "id_token").await.unwrap();
    assert!(node.is_none());
}

#[tokio::test]
async fn test_children_of_partition() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/locations/u1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "-Nb": {"Name": "Shelf"},
            "-Na": {"Name": "Back room"}
        })))
        .mount(&mock_server)
        .await;

    let db = database_for(&mock_server);
    let children = db
        .children(&Reference::root().child("locations/u1"), "id_token")
        .await
        .unwrap();
    let keys: Vec<&str> = children.iter().map(|(key, _)| key.as_str()).collect();
    assert_eq!(keys, ["-Na", "-Nb"]);
}

#[tokio::test]
async fn test_put_replaces_node() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/product_scans/u1/-Na.json"))
        .and(body_json(json!({"Barcode": "1", "Quantity": 4})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Barcode": "1", "Quantity": 4})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let db = database_for(&mock_server);
    db.put(
        &scans().child("-Na"),
        json!({"Barcode": "1", "Quantity": 4}),
        "id_token",
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_delete_node() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/product_scans/u1/-Na.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let db = database_for(&mock_server);
    db.delete(&scans().child("-Na"), "id_token").await.unwrap();
}

#[tokio::test]
async fn test_rejected_write_is_remote_write_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/product_scans/u1.json"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Permission denied"})),
        )
        .mount(&mock_server)
        .await;

    let db = database_for(&mock_server);
    let result = db.push(&scans(), json!({"Barcode": "1"}), "bad_token").await;
    match result {
        Err(Error::RemoteWrite(message)) => assert!(message.contains("Permission denied")),
        other => panic!("expected RemoteWrite error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_read_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/product_scans/u1.json"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Permission denied"})),
        )
        .mount(&mock_server)
        .await;

    let db = database_for(&mock_server);
    let result = db.get(&scans(), "bad_token").await;
    assert!(matches!(result, Err(Error::Api { status: 401, .. })));
}
