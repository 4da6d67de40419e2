#![cfg(all(unix, feature = "cli"))]

use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn unique_socket_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "zsock-cli-{tag}-{}-{}.sock",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ))
}

fn zsock() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_zsock"));
    cmd.arg("--log-level").arg("error");
    cmd
}

fn wait_for_path(path: &PathBuf, timeout: Duration) {
    let start = Instant::now();
    while !path.exists() {
        if start.elapsed() >= timeout {
            panic!("socket {} never appeared", path.display());
        }
        thread::sleep(Duration::from_millis(25));
    }
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().next().expect("one line of output");
    serde_json::from_str(line).expect("output should be json")
}

#[test]
fn recv_prints_message_sent_by_send() {
    let path = unique_socket_path("pushpull");
    let endpoint = format!("ipc://{}", path.display());

    // PULL connects and PUSH binds by default; flip both with sigils.
    let receiver = zsock()
        .args([
            "--format",
            "json",
            "recv",
            &format!("@{endpoint}"),
            "--count",
            "1",
            "--timeout",
            "10s",
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("recv should start");
    wait_for_path(&path, Duration::from_secs(5));

    let status = zsock()
        .args([
            "send",
            &format!(">{endpoint}"),
            "--frame",
            "hello",
            "--frame",
            "world",
        ])
        .status()
        .expect("send should run");
    assert!(status.success());

    let output = receiver.wait_with_output().expect("recv should finish");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let msg = stdout_json(&output);
    assert_eq!(msg["pattern"], "PULL");
    assert_eq!(msg["frame_count"], 2);
    assert_eq!(msg["frames"][0], "hello");
    assert_eq!(msg["frames"][1], "world");
}

#[test]
fn send_waits_for_router_reply() {
    let path = unique_socket_path("router");
    let endpoint = format!("ipc://{}", path.display());

    let responder = thread::spawn({
        let endpoint = endpoint.clone();
        move || {
            let mut router = zsock::new_router(&endpoint).expect("router should bind");
            let mut msg = router.recv_message().expect("request");
            msg.push("pong".into());
            router.send_message(&msg).expect("reply");
            // Keep the socket open until the reply has been read.
            thread::sleep(Duration::from_millis(500));
        }
    });
    wait_for_path(&path, Duration::from_secs(5));

    let output = zsock()
        .args([
            "--format",
            "json",
            "send",
            &endpoint,
            "--pattern",
            "dealer",
            "--identity",
            "cli-client",
            "--data",
            "ping",
            "--wait",
        ])
        .output()
        .expect("send should run");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let msg = stdout_json(&output);
    assert_eq!(msg["frames"][0], "ping");
    assert_eq!(msg["frames"][1], "pong");
    responder.join().expect("responder should not panic");
}

#[test]
fn recv_timeout_returns_124() {
    let path = unique_socket_path("timeout");
    let output = zsock()
        .args(["recv", &format!("ipc://{}", path.display()), "--timeout", "200ms"])
        .output()
        .expect("recv should run");
    assert_eq!(output.status.code(), Some(124));
}

#[test]
fn bad_endpoint_returns_usage() {
    let output = zsock()
        .args(["send", "bogus://nowhere", "--data", "x"])
        .output()
        .expect("send should run");
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_reports_package_version() {
    let output = zsock().arg("version").output().expect("version should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("zsock {}", env!("CARGO_PKG_VERSION")));
}
