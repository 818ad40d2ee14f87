use httpmock::prelude::*;
use order_fetch::{ApiConfig, EtlEngine, FetchPipeline, LocalStorage};
use serde_json::json;
use tempfile::TempDir;

fn dated(mut config: ApiConfig, start: &str, end: &str) -> ApiConfig {
    config.apply_date_range(start.to_string(), end.to_string());
    config
}

#[tokio::test]
async fn test_end_to_end_paginated_fetch_writes_json_and_csv() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/orders")
            .query_param("page", "1")
            .query_param("since", "2024-01-01");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"results": [
                {"id": 1, "customer": "alice", "total": 12.5},
                {"id": 2, "customer": "bob", "total": 8.0}
            ]}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/orders").query_param("page", "2");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"results": [{"id": 3, "customer": "carol", "total": 3.25}]}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/orders").query_param("page", "3");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"results": []}));
    });

    let config = ApiConfig::from_json_str(&format!(
        r#"{{
            "name": "shop",
            "url": "{}",
            "pagination": "true",
            "params": {{"since": "{{start_date}}"}}
        }}"#,
        server.url("/orders")
    ))
    .unwrap();
    let config = dated(config, "2024-01-01", "2024-01-10");

    let storage = LocalStorage::new(output_path.clone());
    let pipeline = FetchPipeline::new(storage, config);
    let engine = EtlEngine::new(pipeline);

    let output = engine.run().await.unwrap();
    assert_eq!(
        output.as_deref(),
        Some("shop_orders_2024-01-01_to_2024-01-10.json")
    );

    let json_path = temp_dir
        .path()
        .join("shop_orders_2024-01-01_to_2024-01-10.json");
    let csv_path = temp_dir
        .path()
        .join("shop_orders_2024-01-01_to_2024-01-10.csv");
    assert!(json_path.exists());
    assert!(csv_path.exists());

    // all three pages, in page order
    let written = std::fs::read_to_string(&json_path).unwrap();
    let records: Vec<serde_json::Value> = serde_json::from_str(&written).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["id"], json!(1));
    assert_eq!(records[2]["customer"], json!("carol"));

    let csv_content = std::fs::read_to_string(&csv_path).unwrap();
    let mut lines = csv_content.lines();
    assert_eq!(lines.next(), Some("customer,id,total"));
    assert_eq!(lines.clone().count(), 3);
    assert!(csv_content.contains("alice"));
    assert!(csv_content.contains("carol"));
}

#[tokio::test]
async fn test_end_to_end_no_data_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/orders");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!([]));
    });

    let config = ApiConfig::from_json_str(&format!(
        r#"{{"name": "shop", "url": "{}"}}"#,
        server.url("/orders")
    ))
    .unwrap();
    let config = dated(config, "2024-01-01", "2024-01-10");

    let storage = LocalStorage::new(output_path.clone());
    let pipeline = FetchPipeline::new(storage, config);
    let engine = EtlEngine::new(pipeline);

    let output = engine.run().await.unwrap();
    assert!(output.is_none());

    let entries: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_end_to_end_precise_timestamps_yield_safe_filenames() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/orders")
            .query_param("from", "2024-01-01T00:00:00")
            .query_param("to", "2024-01-02T23:59:59");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!([{"id": 1}]));
    });

    let config = ApiConfig::from_json_str(&format!(
        r#"{{
            "name": "shop",
            "url": "{}",
            "precise_timestamp": "true",
            "params": {{"from": "{{start_date}}", "to": "{{end_date}}"}}
        }}"#,
        server.url("/orders")
    ))
    .unwrap();
    let config = dated(config, "2024-01-01T00:00:00", "2024-01-02T23:59:59");

    let storage = LocalStorage::new(output_path.clone());
    let pipeline = FetchPipeline::new(storage, config);
    let engine = EtlEngine::new(pipeline);

    let output = engine.run().await.unwrap().unwrap();
    assert_eq!(
        output,
        "shop_orders_2024-01-01T00_00_00_to_2024-01-02T23_59_59.json"
    );
    assert!(temp_dir.path().join(&output).exists());
}

#[tokio::test]
async fn test_end_to_end_http_error_leaves_no_partial_files() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/orders").query_param("page", "1");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!([{"id": 1}]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/orders").query_param("page", "2");
        then.status(403);
    });

    let config = ApiConfig::from_json_str(&format!(
        r#"{{"name": "shop", "url": "{}", "pagination": "true"}}"#,
        server.url("/orders")
    ))
    .unwrap();
    let config = dated(config, "2024-01-01", "2024-01-10");

    let storage = LocalStorage::new(output_path.clone());
    let pipeline = FetchPipeline::new(storage, config);
    let engine = EtlEngine::new(pipeline);

    let result = engine.run().await;
    assert!(result.is_err());

    // a fatal error after N pages must not persist those N pages
    let entries: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
    assert!(entries.is_empty());
}
