//! Uses the single integration test approach.
//!
//! Every test spawns the `reaper` binary against mock Consul, Nomad and Circonus servers.


use common::{
    Collaborators, ENDED_ALLOC, LIVE_ALLOC, alloc_metric_name, check_bundle, expect_puts,
    mount_check_bundle_metrics, mount_check_bundles, mount_consul_hosts, mount_nomad_nodes,
    put_bodies, report_value, run_reaper,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Consul knows `web-1`, Circonus knows `web-1` and the stale `old-1`.
///
/// `web-1` runs one live allocation; its bundle carries an active metric of an ended
/// allocation and an available metric of the live one.
async fn mount_world(servers: &Collaborators) {
    mount_consul_hosts(&servers.consul, &["web-1", "db-1"]).await;
    mount_nomad_nodes(&servers.nomad, &[("web-1", "node-web-1", &[LIVE_ALLOC])]).await;
    mount_check_bundles(
        &servers.circonus,
        &[check_bundle(1, "web-1"), check_bundle(2, "old-1")],
    )
    .await;
    mount_check_bundle_metrics(
        &servers.circonus,
        1,
        &[
            (alloc_metric_name("web-1", ENDED_ALLOC), "active"),
            (alloc_metric_name("web-1", LIVE_ALLOC), "available"),
            ("cpu`idle".to_string(), "active"),
        ],
    )
    .await;
}

fn args(servers: &Collaborators, extra: &[&str]) -> Vec<String> {
    let mut args = vec!["--mode".to_string(), "consul/nomad".to_string()];
    args.extend(servers.args());
    args.extend(extra.iter().map(ToString::to_string));
    args
}

#[tokio::test]
async fn dry_run_issues_no_writes() {
    let servers = Collaborators::start().await;
    mount_world(&servers).await;
    expect_puts(&servers.circonus, "/check_bundle_metrics/1", 0).await;

    let output = run_reaper(&args(&servers, &["--dry-run"])).await;
    assert!(
        output.status.success(),
        "reaper failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(report_value(&output.stdout, "Metrics To Disable dry-run"), Some(1));
    assert_eq!(report_value(&output.stdout, "Metrics To Enable dry-run"), Some(1));
    assert_eq!(report_value(&output.stdout, "Disabled Metrics dry-run"), Some(0));
    assert_eq!(report_value(&output.stdout, "Targets To Disable dry-run"), Some(1));
    assert_eq!(report_value(&output.stdout, "Number of live allocs"), Some(1));
    assert!(put_bodies(&servers.circonus).await.is_empty(), "no writes");
}

#[tokio::test]
async fn live_run_retoggles_allocation_metrics() {
    let servers = Collaborators::start().await;
    mount_world(&servers).await;
    expect_puts(&servers.circonus, "/check_bundle_metrics/1", 1).await;

    let output = run_reaper(&args(&servers, &[])).await;
    assert!(
        output.status.success(),
        "reaper failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(report_value(&output.stdout, "Disabled Metrics live"), Some(1));
    assert_eq!(report_value(&output.stdout, "Enabled Metrics live"), Some(1));
    // Deleting old-1's bundle is not implemented and only counts as a soft failure.
    assert_eq!(report_value(&output.stdout, "Disabled Targets live"), Some(0));
    assert_eq!(report_value(&output.stdout, "Soft failures"), Some(1));

    let bodies = put_bodies(&servers.circonus).await;
    assert_eq!(bodies.len(), 1);
    let metrics = bodies[0]["metrics"].as_array().expect("metrics array");
    let status_of = |name: &str| {
        metrics
            .iter()
            .find(|m| m["name"] == name)
            .map(|m| m["status"].clone())
    };
    assert_eq!(
        status_of(&alloc_metric_name("web-1", ENDED_ALLOC)),
        Some(json!("available"))
    );
    assert_eq!(
        status_of(&alloc_metric_name("web-1", LIVE_ALLOC)),
        Some(json!("active"))
    );
    assert_eq!(status_of("cpu`idle"), Some(json!("active")));
    assert!(
        metrics.iter().all(|m| m["type"] == "numeric"),
        "unmodelled fields survive the round trip"
    );
}

#[tokio::test]
async fn excluded_hosts_are_left_alone() {
    let servers = Collaborators::start().await;
    mount_world(&servers).await;
    expect_puts(&servers.circonus, "/check_bundle_metrics/1", 0).await;

    let output = run_reaper(&args(
        &servers,
        &["--exclude-target", "old-1", "--exclude-regexp", "^web-"],
    ))
    .await;
    assert!(
        output.status.success(),
        "reaper failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(report_value(&output.stdout, "Excluded Targets live"), Some(2));
    assert_eq!(report_value(&output.stdout, "Targets To Disable live"), Some(0));
    assert_eq!(report_value(&output.stdout, "Soft failures"), Some(0));
}

#[tokio::test]
async fn exclusions_from_config_file_apply() {
    let servers = Collaborators::start().await;
    mount_world(&servers).await;
    expect_puts(&servers.circonus, "/check_bundle_metrics/1", 0).await;

    let config = std::env::temp_dir().join(format!(
        "reaper_integration_{}.toml",
        servers.circonus.address().port()
    ));
    std::fs::write(
        &config,
        r#"
        dry_run = false

        [exclude]
        targets = ["web-1", "old-1"]
        "#,
    )
    .expect("failed to write config");

    let output = run_reaper(&args(
        &servers,
        &["--config", config.to_str().expect("utf-8 temp path")],
    ))
    .await;
    assert!(
        output.status.success(),
        "reaper failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(report_value(&output.stdout, "Excluded Targets live"), Some(2));
}

#[tokio::test]
async fn unreachable_catalog_is_fatal() {
    let servers = Collaborators::start().await;
    mount_world(&servers).await;
    let broken_consul = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/catalog/nodes"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&broken_consul)
        .await;
    expect_puts(&servers.circonus, "/check_bundle_metrics/1", 0).await;

    let output = run_reaper(&[
        "--mode".to_string(),
        "consul/nomad".to_string(),
        "--consul-addr".to_string(),
        broken_consul.uri(),
        "--nomad-addr".to_string(),
        servers.nomad.uri(),
        "--circonus-url".to_string(),
        servers.circonus.uri(),
    ])
    .await;
    assert!(!output.status.success(), "catalog failure must abort the run");
    assert!(output.stdout.is_empty(), "no report on fatal errors");
}

#[tokio::test]
async fn query_mode_silences_matching_metrics() {
    let circonus = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metric"))
        .and(query_param("search", "(metric_name:cpu*)"))
        .and(query_param("size", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "_cid": "/metric/1", "_check_bundle": "/check_bundle/5", "_metric_name": "cpu`user" },
            { "_cid": "/metric/2", "_check_bundle": "/check_bundle/5", "_metric_name": "cpu`idle" },
        ])))
        .mount(&circonus)
        .await;
    Mock::given(method("GET"))
        .and(path("/check_bundle/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_cid": "/check_bundle/5",
            "target": "web-1",
            "period": 60,
            "metrics": [
                { "name": "cpu`user", "status": "active" },
                { "name": "cpu`idle", "status": "available" },
                { "name": "mem`rss", "status": "active" },
            ],
        })))
        .mount(&circonus)
        .await;
    expect_puts(&circonus, "/check_bundle/5", 1).await;

    let output = run_reaper(&[
        "--mode".to_string(),
        "query".to_string(),
        "--query".to_string(),
        "(metric_name:cpu*)".to_string(),
        "--circonus-url".to_string(),
        circonus.uri(),
    ])
    .await;
    assert!(
        output.status.success(),
        "reaper failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(report_value(&output.stdout, "Disabled Metrics live"), Some(1));

    let bodies = put_bodies(&circonus).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["period"], json!(60), "bundle fields are preserved");
    assert_eq!(
        bodies[0]["metrics"],
        json!([
            { "name": "cpu`user", "status": "available" },
            { "name": "cpu`idle", "status": "available" },
            { "name": "mem`rss", "status": "active" },
        ])
    );
}

#[tokio::test]
async fn unknown_mode_is_rejected() {
    let output = run_reaper(&["--mode".to_string(), "consul".to_string()]).await;
    assert!(!output.status.success(), "unknown mode must fail");
}

#[tokio::test]
async fn missing_mode_is_rejected() {
    let output = run_reaper(&[]).await;
    assert!(!output.status.success(), "a mode is required");
    assert!(
        String::from_utf8_lossy(&output.stderr).contains("no mode selected"),
        "error names the problem"
    );
}

#[tokio::test]
async fn query_mode_requires_a_query() {
    let output = run_reaper(&["--mode".to_string(), "query".to_string()]).await;
    assert!(!output.status.success(), "empty query must fail");
}
