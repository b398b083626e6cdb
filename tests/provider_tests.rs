//! Provider hooks against a scripted management server.

use std::sync::Arc;

use checkpoint_provider::testing::{
    assert_error_contains, assert_no_errors, assert_plan_no_changes, MockApiClient,
    ProviderTester,
};
use checkpoint_provider::{CheckpointProvider, ProviderError, ProviderService};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

const HOST: &str = "checkpoint_management_host";
const CLUSTER: &str = "checkpoint_management_simple_cluster";

fn setup() -> (Arc<MockApiClient>, ProviderTester<CheckpointProvider>) {
    let api = Arc::new(MockApiClient::new());
    let tester = ProviderTester::new(CheckpointProvider::with_client(api.clone()));
    (api, tester)
}

#[tokio::test]
async fn test_create_host_sends_renamed_fields_and_defaults() {
    let (api, tester) = setup();
    api.respond_ok("add-host", json!({"uid": "7b2c-host1", "name": "host1"}));
    api.respond_ok(
        "show-host",
        json!({
            "uid": "7b2c-host1",
            "name": "host1",
            "ipv4-address": "1.2.3.4",
            "color": "black",
            "groups": [],
            "nat-settings": {"auto-rule": false}
        }),
    );

    let plan = tester
        .plan_create(HOST, json!({"name": "host1", "ipv4_address": "1.2.3.4"}))
        .await
        .unwrap();
    let state = tester.create(HOST, plan.planned_state).await.unwrap();

    assert_eq!(
        Value::Object(api.payloads("add-host")[0].clone()),
        json!({
            "name": "host1",
            "ipv4-address": "1.2.3.4",
            "color": "black",
            "ignore-warnings": false,
            "ignore-errors": false
        })
    );
    assert_eq!(state["id"], "7b2c-host1");
    assert_eq!(state["ipv4_address"], "1.2.3.4");
    // Server-side default for a block the user never configured.
    assert!(state.get("nat_settings").is_none());
    assert_eq!(api.payloads("show-host")[0]["uid"], "7b2c-host1");
}

#[tokio::test]
async fn test_create_surfaces_server_message_verbatim() {
    let (api, tester) = setup();
    api.respond_err(
        "add-host",
        "err_validation_failed",
        "Validation failed with 1 error: More than one object named 'host1' exists.",
    );

    let err = tester
        .create(HOST, json!({"name": "host1", "color": "black"}))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation failed with 1 error: More than one object named 'host1' exists."
    );
    assert_eq!(api.commands(), vec!["add-host"]);
}

#[tokio::test]
async fn test_create_fails_when_new_object_cannot_be_read() {
    let (api, tester) = setup();
    api.respond_ok("add-host", json!({"uid": "uid-1"}));
    api.respond_err(
        "show-host",
        "generic_err_object_not_found",
        "Requested object [uid-1] not found",
    );

    let err = assert_err!(tester.create(HOST, json!({"name": "host1"})).await);
    assert!(matches!(err, ProviderError::NotFound(_)));
    assert_eq!(api.commands(), vec!["add-host", "show-host"]);
}

#[tokio::test]
async fn test_read_missing_object_clears_id() {
    let (api, tester) = setup();
    api.respond_err(
        "show-host",
        "generic_err_object_not_found",
        "Requested object [7b2c-host1] not found",
    );

    let state = assert_ok!(
        tester
            .read(HOST, json!({"id": "7b2c-host1", "name": "host1"}))
            .await
    );
    assert_eq!(state, json!({"id": ""}));
}

#[tokio::test]
async fn test_read_other_failures_are_errors() {
    let (api, tester) = setup();
    api.respond_err("show-host", "generic_error", "Session expired");

    let err = assert_err!(tester.read(HOST, json!({"id": "7b2c-host1"})).await);
    assert_eq!(err.to_string(), "Session expired");
}

#[tokio::test]
async fn test_read_keeps_user_set_default_and_suppresses_the_rest() {
    let (api, tester) = setup();
    api.respond_ok(
        "show-host",
        json!({
            "uid": "uid-1",
            "name": "host1",
            "color": "black",
            "interfaces": [
                {"name": "eth0", "subnet4": "10.0.0.0", "mask-length4": 24, "color": "black"}
            ]
        }),
    );

    // `color` was never configured, so the server default stays out of state.
    let state = tester
        .read(
            HOST,
            json!({"id": "uid-1", "name": "host1", "interfaces": [{"name": "eth0", "color": "black"}]}),
        )
        .await
        .unwrap();

    assert!(state.get("color").is_none());
    assert_eq!(
        state["interfaces"],
        json!([{"name": "eth0", "subnet4": "10.0.0.0", "mask_length4": 24, "color": "black"}])
    );
}

#[tokio::test]
async fn test_plan_after_read_has_no_changes() {
    let (api, tester) = setup();
    api.respond_ok("add-host", json!({"uid": "uid-1"}));
    api.respond_ok(
        "show-host",
        json!({
            "uid": "uid-1",
            "name": "host1",
            "ipv4-address": "1.2.3.4",
            "color": "black",
            "tags": [],
            "comments": "",
            "nat-settings": {"auto-rule": false},
            "host-servers": {"dns-server": false, "mail-server": false, "web-server": false}
        }),
    );

    let config = json!({"name": "host1", "ipv4_address": "1.2.3.4"});
    let state = tester.lifecycle_create(HOST, config.clone()).await.unwrap();
    let plan = tester.plan_update(HOST, state, config).await.unwrap();

    assert_plan_no_changes(&plan);
}

#[tokio::test]
async fn test_configured_nat_settings_survive_read() {
    let (api, tester) = setup();
    api.respond_ok("add-host", json!({"uid": "uid-1"}));
    api.respond_ok(
        "show-host",
        json!({
            "uid": "uid-1",
            "name": "host1",
            "nat-settings": {"auto-rule": false},
            "host-servers": {"dns-server": false, "mail-server": false, "web-server": false}
        }),
    );

    let config = json!({"name": "host1", "nat_settings": [{"auto_rule": false}]});
    let state = tester.lifecycle_create(HOST, config.clone()).await.unwrap();
    assert_eq!(state["nat_settings"], json!([{"auto_rule": false}]));
    assert!(state.get("host_servers").is_none());

    let plan = tester.plan_update(HOST, state, config).await.unwrap();
    assert_plan_no_changes(&plan);
}

#[tokio::test]
async fn test_update_sends_only_changes_by_uid() {
    let (api, tester) = setup();
    api.respond_ok("set-host", json!({"uid": "uid-1"}));
    api.respond_ok(
        "show-host",
        json!({"uid": "uid-1", "name": "host1", "ipv4-address": "5.6.7.8", "color": "red"}),
    );

    let prior = json!({
        "id": "uid-1",
        "name": "host1",
        "ipv4_address": "1.2.3.4",
        "color": "black",
        "tags": ["web"],
        "ignore_warnings": true
    });
    let planned = json!({
        "id": "uid-1",
        "name": "host1",
        "ipv4_address": "5.6.7.8",
        "color": "red",
        "ignore_warnings": true
    });

    let state = tester.update(HOST, prior, planned).await.unwrap();
    assert_eq!(
        Value::Object(api.payloads("set-host")[0].clone()),
        json!({
            "uid": "uid-1",
            "ipv4-address": "5.6.7.8",
            "color": "red",
            "tags": [],
            "ignore-warnings": true
        })
    );
    assert_eq!(state["color"], "red");
}

#[tokio::test]
async fn test_delete_by_uid_tolerates_missing_object() {
    let (api, tester) = setup();
    api.respond_err(
        "delete-host",
        "generic_err_object_not_found",
        "Requested object [uid-1] not found",
    );

    assert_ok!(tester.delete(HOST, json!({"id": "uid-1", "name": "host1"})).await);
    assert_eq!(api.payloads("delete-host")[0]["uid"], "uid-1");
}

#[tokio::test]
async fn test_simple_cluster_rereads_when_interfaces_are_paged() {
    let (api, tester) = setup();
    let page: Vec<Value> = (0..50)
        .map(|i| json!({"name": format!("eth{}", i)}))
        .collect();
    let all: Vec<Value> = (0..60)
        .map(|i| json!({"name": format!("eth{}", i)}))
        .collect();
    api.respond_ok(
        "show-simple-cluster",
        json!({
            "uid": "cluster-1",
            "name": "cluster1",
            "interfaces": {"objects": page, "from": 1, "to": 50, "total": 60}
        }),
    )
    .respond_ok(
        "show-simple-cluster",
        json!({
            "uid": "cluster-1",
            "name": "cluster1",
            "interfaces": {"objects": all, "from": 1, "to": 60, "total": 60}
        }),
    );

    let state = tester
        .read(CLUSTER, json!({"id": "cluster-1", "name": "cluster1"}))
        .await
        .unwrap();

    let shows = api.payloads("show-simple-cluster");
    assert_eq!(shows.len(), 2);
    assert!(shows[0].get("limit-interfaces").is_none());
    assert_eq!(shows[1]["limit-interfaces"], 60);
    assert_eq!(state["interfaces"].as_array().unwrap().len(), 60);
    assert_eq!(state["interfaces"][59]["name"], "eth59");
}

#[tokio::test]
async fn test_simple_cluster_single_show_when_interfaces_fit() {
    let (api, tester) = setup();
    api.respond_ok(
        "show-simple-cluster",
        json!({
            "uid": "cluster-1",
            "name": "cluster1",
            "hardware": "Open server",
            "os-name": "Gaia",
            "interfaces": {"objects": [{"name": "eth0"}], "from": 1, "to": 1, "total": 1}
        }),
    );

    let state = tester
        .read(CLUSTER, json!({"id": "cluster-1", "name": "cluster1"}))
        .await
        .unwrap();

    assert_eq!(api.commands(), vec!["show-simple-cluster"]);
    assert_eq!(state["interfaces"], json!([{"name": "eth0"}]));
    assert!(state.get("hardware").is_none());
}

#[tokio::test]
async fn test_import_reads_by_uid() {
    let (api, tester) = setup();
    api.respond_ok(
        "show-host",
        json!({"uid": "uid-9", "name": "imported", "ipv4-address": "9.9.9.9"}),
    );

    let imported = tester.import_resource(HOST, "uid-9").await.unwrap();
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].resource_type, HOST);
    assert_eq!(imported[0].state["id"], "uid-9");
    assert_eq!(imported[0].state["ipv4_address"], "9.9.9.9");
}

#[tokio::test]
async fn test_import_missing_object_fails() {
    let (api, tester) = setup();
    api.respond_err("show-host", "generic_err_object_not_found", "not found");

    let err = tester.import_resource(HOST, "uid-9").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_host_data_source_writes_every_field() {
    let (api, tester) = setup();
    api.respond_ok(
        "show-host",
        json!({
            "uid": "uid-1",
            "name": "host1",
            "color": "black",
            "groups": [{"uid": "g-1", "name": "web-servers"}]
        }),
    );

    let state = tester
        .read_data_source("checkpoint_management_data_host", json!({"name": "host1"}))
        .await
        .unwrap();

    assert_eq!(api.payloads("show-host")[0], json!({"name": "host1"}).as_object().cloned().unwrap());
    assert_eq!(state["id"], "uid-1");
    assert_eq!(state["uid"], "uid-1");
    assert_eq!(state["color"], "black");
    assert_eq!(state["groups"], json!(["web-servers"]));
}

#[tokio::test]
async fn test_data_source_requires_name_or_uid() {
    let (_, tester) = setup();
    let diagnostics = tester
        .provider()
        .validate_data_source_config("checkpoint_management_data_time", json!({}))
        .await
        .unwrap();
    assert_error_contains(&diagnostics, "name or uid");

    let err = tester
        .read_data_source("checkpoint_management_data_time", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Validation(_)));
}

#[tokio::test]
async fn test_validate_resource_config() {
    let (_, tester) = setup();
    let provider = tester.provider();

    let diagnostics = provider
        .validate_resource_config(HOST, json!({"name": "host1", "nat_settings": [{"auto_rule": true}]}))
        .await
        .unwrap();
    assert_no_errors(&diagnostics);

    let diagnostics = provider
        .validate_resource_config(HOST, json!({"ipv4_address": "1.2.3.4"}))
        .await
        .unwrap();
    assert_error_contains(&diagnostics, "name");
}

#[tokio::test]
async fn test_unknown_resource_type() {
    let (_, tester) = setup();
    let err = tester
        .create("checkpoint_management_router", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::UnknownResource(_)));
}

#[tokio::test]
async fn test_hooks_require_configuration() {
    let tester = ProviderTester::new(CheckpointProvider::new());
    let err = tester.read(HOST, json!({"id": "uid-1"})).await.unwrap_err();
    assert!(matches!(err, ProviderError::Configuration(_)));
}

#[tokio::test]
async fn test_configure_reports_missing_credentials() {
    // Credentials from the environment would complete the configuration.
    if std::env::var("CHECKPOINT_PASSWORD").is_ok() || std::env::var("CHECKPOINT_API_KEY").is_ok() {
        return;
    }
    let provider = CheckpointProvider::new();
    let diagnostics = provider
        .configure(json!({"server": "192.0.2.10", "username": "admin"}))
        .await
        .unwrap();
    assert_error_contains(&diagnostics, "Missing credentials");
}

#[tokio::test]
async fn test_stop_logs_out() {
    let (_, tester) = setup();
    assert_ok!(tester.stop().await);
    // The session is gone afterwards.
    let err = tester.read(HOST, json!({"id": "uid-1"})).await.unwrap_err();
    assert!(matches!(err, ProviderError::Configuration(_)));
}
