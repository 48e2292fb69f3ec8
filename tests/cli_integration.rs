use serde_json::Value;
use tempfile::TempDir;
use tokio::process::Command;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn bmdl() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bmdl"));
    for var in ["HTTP_PROXY", "http_proxy", "HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"] {
        cmd.env_remove(var);
    }
    cmd.env_remove("RAPIDAPI_KEY");
    cmd
}

fn json_lines(stdout: &[u8]) -> Vec<Value> {
    let text = String::from_utf8_lossy(stdout);
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).unwrap_or_else(|e| panic!("stdout 中混入了非 JSON 行 {:?}: {}", line, e))
        })
        .collect()
}

#[tokio::test]
async fn test_json_mode_stdout_is_event_stream_only() {
    let server = MockServer::start().await;
    let body = vec![9u8; 20_000];
    Mock::given(method("GET"))
        .and(path("/f.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = bmdl()
        .arg("--url")
        .arg(format!("{}/f.bin", server.uri()))
        .arg("--direct")
        .arg("--json")
        .arg("--output-dir")
        .arg(dir.path())
        .output()
        .await
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let events = json_lines(&output.stdout);
    assert!(events.len() >= 3);
    assert_eq!(events.first().unwrap()["event"], "started");
    assert_eq!(events.last().unwrap()["event"], "completed");
    assert_eq!(events.last().unwrap()["total_bytes"], 20_000);
    assert!(events.iter().skip(1).take(events.len() - 2).all(|e| e["event"] == "progress"));

    assert_eq!(tokio::fs::read(dir.path().join("f.bin")).await.unwrap(), body);
}

#[tokio::test]
async fn test_json_mode_failure_keeps_stdout_clean() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.bin"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = bmdl()
        .arg("--url")
        .arg(format!("{}/gone.bin", server.uri()))
        .arg("--direct")
        .arg("--json")
        .arg("--output-dir")
        .arg(dir.path())
        .output()
        .await
        .unwrap();

    assert!(!output.status.success());
    let events = json_lines(&output.stdout);
    assert_eq!(events.len(), 2);
    assert_eq!(events[1]["event"], "failed");
    assert_eq!(events[1]["error"]["HttpError"]["status"], 404);
}
