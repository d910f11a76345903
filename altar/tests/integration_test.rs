//! Integration tests for Altar
//!
//! These tests drive the broker through its public API and, at the end, run
//! the real binary and stop it through the admin server.

use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use altar::admin::{ADMIN_PATH, AdminClient, ShutdownHook};
use altar::awtrix::{AppData, DisplayConfig, Overlay};
use altar::broker::Broker;
use altar::device::{DeviceError, DeviceRequest, DeviceResponse, Transport};
use altar::routine::{Application, Notifier, Routine};
use async_trait::async_trait;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::Notify;

/// Records device traffic instead of sending it
#[derive(Default)]
struct CapturingTransport {
    requests: Mutex<Vec<DeviceRequest>>,
}

impl CapturingTransport {
    fn requests_to(&self, path: &str) -> Vec<DeviceRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == path)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Transport for CapturingTransport {
    async fn post(&self, request: DeviceRequest) -> Result<DeviceResponse, DeviceError> {
        self.requests.lock().unwrap().push(request);
        Ok(DeviceResponse::new(200))
    }
}

fn hello_world() -> Box<dyn Routine> {
    Application::from_fn("hello-world", |state, _| {
        state.data.text = Some("Hello, World!".into());
        Ok(())
    })
    .boxed()
}

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    listener.local_addr().expect("No local addr").port()
}

// =============================================================================
// Cycle Tests
// =============================================================================

#[tokio::test]
async fn test_hello_world_cycle() {
    let transport = Arc::new(CapturingTransport::default());
    let broker = Broker::new("192.168.1.20", vec![hello_world()], [])
        .expect("Failed to create broker")
        .with_transport(transport.clone());

    let report = broker.run_cycle().await;
    assert_eq!(report.pushed, vec!["hello-world".to_string()]);

    let pushes = transport.requests_to("/api/custom");
    assert_eq!(pushes.len(), 1);

    let expected = serde_json::to_vec(&AppData {
        text: Some("Hello, World!".into()),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(pushes[0].body.as_deref(), Some(expected.as_slice()));
    assert_eq!(pushes[0].query("name"), Some("hello-world".to_string()));
    assert_eq!(pushes[0].url.host_str(), Some("192.168.1.20"));
}

#[tokio::test]
async fn test_mixed_routines_share_one_settings_push() {
    let transport = Arc::new(CapturingTransport::default());
    let rain = Notifier::from_fn("rain-alert", |state, _| {
        state.data.text = Some("Rain in 2 hours".into());
        state.global_config.overlay = Some(Overlay::Drizzle);
        Ok(())
    });
    let no_clock = Application::from_fn("no-clock", |state, _| {
        state.global_config = DisplayConfig {
            time_app: Some(false),
            ..Default::default()
        };
        Ok(())
    });

    let broker = Broker::new("192.168.1.20", vec![rain.boxed(), no_clock.boxed(), hello_world()], [])
        .expect("Failed to create broker")
        .with_transport(transport.clone());

    let report = broker.run_cycle().await;

    assert_eq!(report.pushed, vec!["rain-alert", "no-clock", "hello-world"]);
    assert!(report.failed.is_empty());
    assert!(report.panicked.is_empty());

    let settings = transport.requests_to("/api/settings");
    assert_eq!(settings.len(), 1);
    let sent: DisplayConfig = serde_json::from_slice(settings[0].body.as_deref().unwrap()).unwrap();
    assert_eq!(sent.time_app, Some(false));
    assert_eq!(sent.overlay, Some(Overlay::Drizzle));
    assert_eq!(sent.battery_app, None);

    assert_eq!(transport.requests_to("/api/notify").len(), 1);
}

// =============================================================================
// Admin Server Tests
// =============================================================================

#[tokio::test]
async fn test_serve_runs_cycles_and_accepts_shutdown() {
    let transport = Arc::new(CapturingTransport::default());
    let shutdown = Arc::new(Notify::new());
    let hook: ShutdownHook = {
        let shutdown = Arc::clone(&shutdown);
        Arc::new(move || shutdown.notify_one())
    };

    let broker = Broker::new("192.168.1.20", vec![hello_world()], [])
        .expect("Failed to create broker")
        .with_debug_mode(true)
        .with_transport(transport.clone())
        .with_shutdown_hook(hook);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(broker.serve(listener));

    // Non-POST requests are rejected and the server keeps running
    let url = format!("http://127.0.0.1:{port}{ADMIN_PATH}");
    let response = reqwest::get(&url).await.expect("Admin server not reachable");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    AdminClient::new("127.0.0.1", port)
        .unwrap()
        .shutdown()
        .await
        .expect("Shutdown request failed");

    tokio::time::timeout(Duration::from_secs(5), shutdown.notified())
        .await
        .expect("Shutdown hook was not called");

    // The first cycle runs as soon as the broker starts
    let deadline = Instant::now() + Duration::from_secs(5);
    while transport.requests_to("/api/custom").is_empty() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(transport.requests_to("/api/custom").len(), 1);
    // Debug mode skips the reboot
    assert!(transport.requests_to("/api/reboot").is_empty());

    server.abort();
}

// =============================================================================
// Process Tests
// =============================================================================

struct KillOnDrop(Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

#[tokio::test]
async fn test_binary_exits_on_shutdown_command() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let admin_port = free_port();
    let device_port = free_port();

    let config_path = temp_dir.path().join("altar.yml");
    let mut config = std::fs::File::create(&config_path).expect("Failed to create config");
    write!(
        config,
        "device:\n  address: 127.0.0.1\n  port: {device_port}\n  timeout-ms: 500\n\
         admin:\n  host: 127.0.0.1\n  port: {admin_port}\n\
         debug: true\n"
    )
    .unwrap();
    drop(config);

    let child = Command::new(env!("CARGO_BIN_EXE_altar"))
        .arg("--config")
        .arg(&config_path)
        .arg("--log-file")
        .arg(temp_dir.path().join("altar.log"))
        .arg("run")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn altar");
    let mut child = KillOnDrop(child);

    // Wait for the admin server to come up
    let url = format!("http://127.0.0.1:{admin_port}{ADMIN_PATH}");
    let deadline = Instant::now() + Duration::from_secs(10);
    let response = loop {
        match reqwest::get(&url).await {
            Ok(response) => break response,
            Err(_) if Instant::now() < deadline => tokio::time::sleep(Duration::from_millis(50)).await,
            Err(e) => panic!("Admin server never came up: {e}"),
        }
    };
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(
        response.text().await.unwrap(),
        "request to admin commands did not use the POST method"
    );
    assert!(child.0.try_wait().unwrap().is_none(), "Broker exited after a GET");

    let client = reqwest::Client::new();
    let response = client.post(&url).body(r#"{"command":"UP"}"#).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    assert!(child.0.try_wait().unwrap().is_none(), "Broker exited after an unknown command");

    AdminClient::new("127.0.0.1", admin_port)
        .unwrap()
        .shutdown()
        .await
        .expect("Shutdown request failed");

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.0.try_wait().unwrap() {
            break status;
        }
        assert!(Instant::now() < deadline, "Broker did not exit after shutdown");
        tokio::time::sleep(Duration::from_millis(50)).await;
    };
    assert!(status.success());

    assert!(temp_dir.path().join("altar.log").exists());
}
