//! Integration tests for the monitor runtime entry point.

use std::sync::Arc;
use std::time::Duration;

use vboxmon::{
    CredentialStore, MetricKind, MonitorOptions, SeriesKey, VboxError, VmMonitor,
};
use vboxmon_test_utils::{FakeHypervisor, credentials_from_json};

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn options() -> MonitorOptions {
    MonitorOptions {
        interval: Duration::from_millis(10),
        history_len: 16,
        collect_timeout: Duration::from_millis(50),
        settle_delay: Duration::ZERO,
        ..Default::default()
    }
}

async fn monitor_with(fake: &Arc<FakeHypervisor>) -> VmMonitor {
    VmMonitor::with_parts(options(), fake.manage(), CredentialStore::empty())
        .await
        .expect("Failed to create monitor")
}

// ============================================================================
// INITIALIZATION TESTS
// ============================================================================

#[tokio::test]
async fn initial_discovery_seeds_store() {
    let fake = FakeHypervisor::new();
    fake.add_machine("vm-1", "web-01", "running");
    fake.add_machine("vm-2", "db-01", "poweroff");

    let monitor = monitor_with(&fake).await;

    assert_eq!(monitor.store().machine_ids(), vec!["vm-1", "vm-2"]);
    let cpu = monitor
        .metric_history("vm-2", MetricKind::CpuLoadUser)
        .expect("seeded");
    assert_eq!(cpu.len(), 16);
    assert!(cpu.iter().all(f64::is_nan));
    assert_eq!(
        monitor
            .metric_history("vm-1", SeriesKey::RelativeTime)
            .unwrap()
            .len(),
        16
    );
}

#[tokio::test]
async fn initial_discovery_failure_is_fatal() {
    let fake = FakeHypervisor::new();
    fake.fail_listing(true);

    let result = VmMonitor::with_parts(options(), fake.manage(), CredentialStore::empty()).await;

    assert!(matches!(result, Err(VboxError::Discovery(_))));
}

#[tokio::test]
async fn invalid_options_are_rejected() {
    let fake = FakeHypervisor::new();
    let options = MonitorOptions {
        history_len: 0,
        ..options()
    };

    let result = VmMonitor::with_parts(options, fake.manage(), CredentialStore::empty()).await;

    assert!(matches!(result, Err(VboxError::Config(_))));
    assert!(fake.calls().is_empty());
}

// ============================================================================
// LOOKUP TESTS
// ============================================================================

#[tokio::test]
async fn machine_resolves_by_id_then_name() {
    let fake = FakeHypervisor::new();
    fake.add_machine("vm-1", "web-01", "running");
    fake.add_machine("web-01", "confusing", "running");
    let monitor = monitor_with(&fake).await;

    assert_eq!(monitor.machine("vm-1").await.unwrap().name(), "web-01");
    // An exact id match wins over a name match
    assert_eq!(monitor.machine("web-01").await.unwrap().name(), "confusing");
    assert_eq!(monitor.machine("confusing").await.unwrap().id(), "web-01");

    let missing = monitor.machine("nope").await;
    assert!(matches!(missing, Err(VboxError::NotFound(name)) if name == "nope"));
}

// ============================================================================
// DAEMON CONTROL TESTS
// ============================================================================

#[tokio::test]
async fn daemon_starts_once_and_stops() {
    let fake = FakeHypervisor::new();
    fake.add_machine("vm-1", "web-01", "running");
    fake.set_metric("vm-1", MetricKind::CpuLoadKernel, "3.5%");
    let monitor = monitor_with(&fake).await;

    assert!(monitor.start_daemon());
    assert!(!monitor.start_daemon());
    assert!(monitor.daemon_running());

    tokio::time::sleep(Duration::from_millis(60)).await;
    monitor.stop_daemon().await.expect("clean stop");

    assert!(!monitor.daemon_running());
    assert_eq!(
        monitor.store().latest("vm-1", MetricKind::CpuLoadKernel),
        Some(3.5)
    );

    // Stopping twice is harmless and the daemon can be started again
    monitor.stop_daemon().await.unwrap();
    assert!(monitor.start_daemon());
    monitor.stop_daemon().await.unwrap();
}

#[tokio::test]
async fn dropping_monitor_stops_daemon() {
    let fake = FakeHypervisor::new();
    fake.add_machine("vm-1", "web-01", "running");

    let monitor = monitor_with(&fake).await;
    let clone = monitor.clone();
    assert!(monitor.start_daemon());
    tokio::time::sleep(Duration::from_millis(50)).await;

    drop(monitor);
    tokio::time::sleep(Duration::from_millis(30)).await;
    // A clone keeps the daemon alive
    let ticks = fake.count_calls(&["list", "vms"]);
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(fake.count_calls(&["list", "vms"]) > ticks);

    drop(clone);
    tokio::time::sleep(Duration::from_millis(30)).await;
    let ticks = fake.count_calls(&["list", "vms"]);
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(fake.count_calls(&["list", "vms"]), ticks);
}

#[tokio::test]
async fn stop_daemon_returns_discovery_error() {
    let fake = FakeHypervisor::new();
    fake.add_machine("vm-1", "web-01", "running");
    let monitor = monitor_with(&fake).await;

    fake.fail_listing(true);
    monitor.start_daemon();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!monitor.daemon_running());
    let result = monitor.stop_daemon().await;
    assert!(matches!(result, Err(VboxError::Discovery(_))));
}

#[tokio::test]
async fn lifecycle_through_monitor() {
    let fake = FakeHypervisor::new();
    fake.add_machine("vm-1", "web-01", "poweroff");
    let monitor = monitor_with(&fake).await;

    let machine = monitor.machine("web-01").await.unwrap();
    let outcome = monitor.lifecycle().start(&machine).await.unwrap();

    assert!(outcome.reached());
    assert_eq!(monitor.lifecycle().settle_delay(), Duration::ZERO);
}

// ============================================================================
// GUEST EXECUTION TESTS
// ============================================================================

#[tokio::test]
async fn guest_run_uses_stored_credentials() {
    let fake = FakeHypervisor::new();
    fake.add_machine("vm-1", "web-01", "running");
    let (credentials, _dir) = credentials_from_json(
        r#"{"web-01": [{"username": "ops", "password": "s3cret", "is_admin": true}]}"#,
    );
    let monitor = VmMonitor::with_parts(options(), fake.manage(), credentials)
        .await
        .unwrap();

    let machine = monitor.machine("vm-1").await.unwrap();
    let users = monitor.credentials().users_for(&machine);
    assert_eq!(users.len(), 1);

    let output = machine
        .guest_run(&users[0], "/usr/bin/uptime", &["-p"])
        .await
        .unwrap();

    assert!(output.success());
    assert_eq!(output.stdout_text(), "ran /usr/bin/uptime -- -p\n");
    assert_eq!(
        fake.count_calls(&[
            "guestcontrol",
            "vm-1",
            "run",
            "--username",
            "ops",
            "--password",
            "s3cret",
            "--exe",
            "/usr/bin/uptime",
            "--",
            "-p",
        ]),
        1
    );
}

#[tokio::test]
async fn unknown_machine_has_no_credentials() {
    let fake = FakeHypervisor::new();
    fake.add_machine("vm-1", "web-01", "running");
    let (credentials, _dir) = credentials_from_json(r#"{"other": []}"#);
    let monitor = VmMonitor::with_parts(options(), fake.manage(), credentials)
        .await
        .unwrap();

    let machine = monitor.machine("vm-1").await.unwrap();
    assert!(monitor.credentials().users_for(&machine).is_empty());
}
