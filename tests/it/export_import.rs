use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::spawn_app;

/// S1 — flat tabular round-trip, no FKs.
#[tokio::test]
async fn s1_flat_tabular_round_trip() {
    let source = MockServer::start().await;
    let target = MockServer::start().await;
    let proxy = spawn_app().await;
    let client = reqwest::Client::new();

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "u1", "email": "a@x"},
            {"id": "u2", "email": "b@x"},
        ])))
        .mount(&source)
        .await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "minted"})))
        .mount(&target)
        .await;

    let export_response = client
        .get(format!(
            "{proxy}/export?url={}/users&type=csv&enrich=false",
            source.uri()
        ))
        .send()
        .await
        .expect("export request to succeed");
    assert!(export_response.status().is_success());
    let csv_body = export_response.bytes().await.expect("csv body");

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(csv_body.to_vec()).file_name("export.csv"),
    );

    let import_response = client
        .post(format!("{proxy}/import?url={}/users&type=csv", target.uri()))
        .multipart(form)
        .send()
        .await
        .expect("import request to succeed");
    assert!(import_response.status().is_success());

    let report: serde_json::Value = import_response.json().await.expect("json report");
    let summary = json!({
        "total": report["total"],
        "successful": report["successful"],
        "failed": report["failed"],
        "auto_resolved": report["auto_resolved"],
        "session_id_map": report["session_id_map"],
    });
    assert_eq!(
        summary,
        json!({
            "total": 2,
            "successful": 2,
            "failed": 0,
            "auto_resolved": 0,
            "session_id_map": {"u1": "minted", "u2": "minted"},
        })
    );
}

/// S3 — ambiguous external FK under the default skip policy: the record
/// still imports, with the field nulled and the ambiguity traced.
#[tokio::test]
async fn s3_ambiguous_external_fk_skip_policy_imports_with_null_field() {
    let target = MockServer::start().await;
    let proxy = spawn_app().await;
    let client = reqwest::Client::new();

    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("email", "j@x"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "u1", "email": "j@x"},
            {"id": "u2", "email": "j@x"},
        ])))
        .mount(&target)
        .await;

    Mock::given(method("POST"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "t1"})))
        .mount(&target)
        .await;

    let body = json!([
        {
            "id": "t1",
            "assigned_to": "u1",
            "_references": {
                "assigned_to": {
                    "resource_type": "users",
                    "original_id": "u1",
                    "lookup_field": "email",
                    "lookup_value": "j@x"
                }
            }
        }
    ]);

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(serde_json::to_vec(&body).unwrap()).file_name("export.json"),
    );

    let response = client
        .post(format!("{proxy}/import?url={}/tasks&type=json", target.uri()))
        .multipart(form)
        .send()
        .await
        .expect("import request to succeed");
    assert!(response.status().is_success());

    let report: serde_json::Value = response.json().await.expect("json report");
    assert_eq!(report["successful"], 1);
    assert_eq!(report["ambiguous"], 1);
    let trace = &report["traces"][0]["fields"][0];
    assert_eq!(trace["outcome"], "ambiguous");
    assert_eq!(trace["candidates"].as_array().unwrap().len(), 2);
}

/// S4 — same ambiguity under the fail policy: the import aborts before
/// issuing any POST, and the report carries a single error.
#[tokio::test]
async fn s4_ambiguous_external_fk_fail_policy_aborts() {
    let target = MockServer::start().await;
    let proxy = spawn_app().await;
    let client = reqwest::Client::new();

    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("email", "j@x"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "u1", "email": "j@x"},
            {"id": "u2", "email": "j@x"},
        ])))
        .mount(&target)
        .await;

    // No POST mock is registered: if the orchestrator issued one anyway,
    // wiremock would answer with its unmatched-request response and the
    // assertions below would catch the resulting non-zero `successful`.

    let body = json!([
        {
            "id": "t1",
            "assigned_to": "u1",
            "_references": {
                "assigned_to": {
                    "resource_type": "users",
                    "original_id": "u1",
                    "lookup_field": "email",
                    "lookup_value": "j@x"
                }
            }
        }
    ]);

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(serde_json::to_vec(&body).unwrap()).file_name("export.json"),
    );

    let response = client
        .post(format!(
            "{proxy}/import?url={}/tasks&type=json&on_ambiguous=fail",
            target.uri()
        ))
        .multipart(form)
        .send()
        .await
        .expect("import request to succeed");
    assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);

    let report: serde_json::Value = response.json().await.expect("json report");
    assert_eq!(report["successful"], 0);
    assert_eq!(report["errors"].as_array().unwrap().len(), 1);
}

/// S5 — a parent-pointer cycle is reported but does not panic; the sorter
/// degrades to input order, and since neither record's self-FK can resolve
/// against an empty target, the target's rejection surfaces as a
/// per-record POST failure for both records.
#[tokio::test]
async fn s5_cycle_degrades_to_input_order_and_fails_each_record() {
    let target = MockServer::start().await;
    let proxy = spawn_app().await;
    let client = reqwest::Client::new();

    Mock::given(method("GET"))
        .and(path("/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&target)
        .await;

    Mock::given(method("POST"))
        .and(path("/categories"))
        .respond_with(ResponseTemplate::new(422))
        .mount(&target)
        .await;

    let body = json!([
        {"_original_id": "a", "parent_id": "b"},
        {"_original_id": "b", "parent_id": "a"},
    ]);

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(serde_json::to_vec(&body).unwrap()).file_name("export.json"),
    );

    let response = client
        .post(format!("{proxy}/import?url={}/categories&type=json", target.uri()))
        .multipart(form)
        .send()
        .await
        .expect("import request to succeed");
    assert!(response.status().is_success());

    let report: serde_json::Value = response.json().await.expect("json report");
    assert_eq!(report["failed"], 2);
    assert_eq!(report["successful"], 0);
}
