use std::os::unix::process::ExitStatusExt;
use std::time::Duration;

use procvisor::{Instance, InstanceCtx, InstanceError, Logger, Signal};

fn env() -> Vec<(std::ffi::OsString, std::ffi::OsString)> {
    std::env::vars_os().collect()
}

fn sleeper() -> Instance {
    Instance::new(
        "sleep",
        InstanceCtx::default().with_args(["30"]),
        env(),
        Logger::discard("sleeper"),
    )
}

#[tokio::test]
async fn test_terminated_instance_reports_signal() {
    let inst = sleeper();
    inst.spawn().unwrap();
    assert!(inst.is_alive());
    assert!(inst.pid().is_some());

    inst.send_signal(Signal::SIGTERM).unwrap();
    let status = tokio::time::timeout(Duration::from_secs(5), inst.wait())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(status.signal(), Some(Signal::SIGTERM as i32));
    assert!(!inst.is_alive());
    assert_eq!(inst.exit_status(), Some(status));
    assert!(matches!(
        inst.send_signal(Signal::SIGTERM),
        Err(InstanceError::NotRunning)
    ));
}

#[tokio::test]
async fn test_spawn_only_once() {
    let inst = sleeper();
    inst.spawn().unwrap();
    assert!(matches!(inst.spawn(), Err(InstanceError::AlreadySpawned)));
    inst.kill().unwrap();
    inst.wait().await.unwrap();
}

#[tokio::test]
async fn test_missing_executable_fails_to_spawn() {
    let inst = Instance::new(
        "/nonexistent/procvisor-test-binary",
        InstanceCtx::default(),
        env(),
        Logger::discard("missing"),
    );
    let err = inst.spawn().unwrap_err();
    assert_eq!(err.as_label(), "instance_spawn_failed");
    assert!(!inst.is_alive());
    assert_eq!(inst.pid(), None);
}

#[tokio::test]
async fn test_operations_before_spawn_report_not_running() {
    let inst = sleeper();
    assert!(!inst.is_alive());
    assert!(matches!(
        inst.send_signal(Signal::SIGINT),
        Err(InstanceError::NotRunning)
    ));
    assert!(matches!(inst.wait().await, Err(InstanceError::NotRunning)));
}

#[tokio::test]
async fn test_env_and_work_dir_reach_child() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = InstanceCtx::default()
        .with_work_dir(dir.path())
        .with_args(["-c", "echo \"$GREETING\" > out.txt"]);
    let inst = Instance::new(
        "sh",
        ctx,
        vec![
            ("PATH".into(), std::env::var_os("PATH").unwrap_or_default()),
            ("GREETING".into(), "hello".into()),
        ],
        Logger::discard("sh"),
    );
    inst.spawn().unwrap();
    let status = inst.wait().await.unwrap();
    assert!(status.success());

    let out = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
    assert_eq!(out.trim(), "hello");
}

#[tokio::test]
async fn test_is_alive_observes_exit_without_wait() {
    let inst = Instance::new("true", InstanceCtx::default(), env(), Logger::discard("true"));
    inst.spawn().unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while inst.is_alive() {
        assert!(tokio::time::Instant::now() < deadline, "exit never observed");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(inst.exit_status().unwrap().success());
}

#[tokio::test]
async fn test_file_logger_captures_output() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("instance.log");
    let inst = Instance::new(
        "sh",
        InstanceCtx::default().with_args(["-c", "echo out; echo err >&2"]),
        env(),
        Logger::file("sh", &log),
    );
    inst.spawn().unwrap();
    inst.wait().await.unwrap();

    let content = std::fs::read_to_string(&log).unwrap();
    assert!(content.contains("out"));
    assert!(content.contains("err"));
}
