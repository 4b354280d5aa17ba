use crate::support::spawn_app;

#[tokio::test]
async fn health_check_works() {
    let addr = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{addr}/health"))
        .send()
        .await
        .expect("request to succeed");

    assert!(response.status().is_success());
}

#[tokio::test]
async fn version_reports_the_crate_name() {
    let addr = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{addr}/version"))
        .send()
        .await
        .expect("request to succeed");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["name"], "migrate-proxy");
}
