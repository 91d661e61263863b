mod common;

use common::TestClient;
use llamacs::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::test]
async fn test_binary_prints_port_and_serves() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_llamacs"))
        .args(["--host", "127.0.0.1"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .expect("spawn llamacs");

    let mut stdout = BufReader::new(child.stdout.take().expect("piped stdout"));
    let mut line = String::new();
    timeout(STARTUP_TIMEOUT, stdout.read_line(&mut line))
        .await
        .expect("port printed before timeout")
        .expect("read port line");

    let port: u16 = line.trim_end().parse().expect("port line is an integer");
    assert_ne!(port, 0);
    assert_eq!(line, format!("{port}\n"));

    let mut client = TestClient::connect(port).await;
    assert_eq!(client.query("ciao").await, Value::string("ciaopolpetteeee"));
    assert_eq!(client.query("").await, Value::string("polpetteeee"));
    drop(client);

    let mut client = TestClient::connect(port).await;
    assert_eq!(client.query("bis").await, Value::string("bispolpetteeee"));

    child.kill().await.expect("kill llamacs");
    let mut rest = String::new();
    stdout.read_to_string(&mut rest).await.expect("drain stdout");
    assert!(rest.is_empty(), "unexpected stdout after port: {rest:?}");
}

#[tokio::test]
async fn test_binary_rejects_invalid_host() {
    let output = Command::new(env!("CARGO_BIN_EXE_llamacs"))
        .args(["--host", "localhost:80"])
        .output()
        .await
        .expect("run llamacs");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}
