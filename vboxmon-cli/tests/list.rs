use predicates::prelude::*;

mod common;

#[test]
fn test_list_shows_machines() {
    let ctx = common::vboxmon();
    ctx.add_machine("1111-aaaa", "web-01", "running");
    ctx.add_machine("2222-bbbb", "db 01", "poweroff");

    ctx.new_cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("web-01"))
        .stdout(predicate::str::contains("1111-aaaa"))
        .stdout(predicate::str::contains("db 01"))
        .stdout(predicate::str::contains("poweroff"))
        .stdout(predicate::str::contains("Ubuntu_64"));
}

#[test]
fn test_list_running_only() {
    let ctx = common::vboxmon();
    ctx.add_machine("1111-aaaa", "web-01", "running");
    ctx.add_machine("2222-bbbb", "db-01", "poweroff");

    ctx.new_cmd()
        .args(["list", "--running", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::eq("1111-aaaa\n"));
}

#[test]
fn test_list_empty() {
    let ctx = common::vboxmon();

    ctx.new_cmd()
        .args(["list", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_list_fails_when_discovery_fails() {
    let ctx = common::vboxmon();
    ctx.break_listing();

    ctx.new_cmd()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("discovery failed"));
}

#[test]
fn test_missing_executable() {
    let ctx = common::vboxmon();

    ctx.new_cmd()
        .env("VBOXMON_VBOXMANAGE", ctx.dir.path().join("does-not-exist"))
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to spawn"));
}

#[test]
fn test_creates_empty_credential_document() {
    let ctx = common::vboxmon();
    ctx.add_machine("1111-aaaa", "web-01", "running");

    ctx.new_cmd().arg("list").assert().success();

    let document = ctx.dir.path().join("config/vboxmon/users.json");
    assert_eq!(std::fs::read_to_string(document).unwrap(), "{}");
}
